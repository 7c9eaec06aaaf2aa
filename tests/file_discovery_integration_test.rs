use ha_refcheck::file_discovery::FileDiscovery;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "# test\n").unwrap();
}

fn relative_names(root: &Path, files: &[std::path::PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            file.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn home_assistant_layout() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    touch(root, "configuration.yaml");
    touch(root, "automations.yaml");
    touch(root, "scripts.yml");
    touch(root, "secrets.yaml");
    touch(root, "home-assistant.log");
    touch(root, ".storage/core.entity_registry");
    touch(root, "packages/lights.yaml");
    touch(root, "custom_components/hacs/manifest.yaml");
    touch(root, "blueprints/automation/homeassistant/motion_light.yaml");
    touch(root, "blueprints/script/confirmable_notification.yaml");

    temp_dir
}

#[tokio::test]
async fn test_top_level_and_blueprints_only() {
    let temp_dir = home_assistant_layout();
    let files = FileDiscovery::new()
        .discover_files(temp_dir.path())
        .await
        .unwrap();

    assert_eq!(
        relative_names(temp_dir.path(), &files),
        vec![
            "automations.yaml",
            "blueprints/automation/homeassistant/motion_light.yaml",
            "blueprints/script/confirmable_notification.yaml",
            "configuration.yaml",
            "scripts.yml",
            "secrets.yaml",
        ]
    );
}

#[tokio::test]
async fn test_exclude_patterns_are_relative_to_root() {
    let temp_dir = home_assistant_layout();
    let files = FileDiscovery::new()
        .with_exclude_patterns(vec!["blueprints/**".to_string(), "scripts.*".to_string()])
        .unwrap()
        .discover_files(temp_dir.path())
        .await
        .unwrap();

    assert_eq!(
        relative_names(temp_dir.path(), &files),
        vec!["automations.yaml", "configuration.yaml", "secrets.yaml"]
    );
}

#[tokio::test]
async fn test_directory_without_blueprints() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "configuration.yaml");

    let files = FileDiscovery::new()
        .discover_files(temp_dir.path())
        .await
        .unwrap();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileDiscovery::new()
        .discover_files(temp_dir.path())
        .await
        .unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let result = FileDiscovery::new()
        .discover_files(Path::new("/nonexistent/homeassistant/config"))
        .await;
    assert!(result.is_err());
}

#[test]
fn test_invalid_exclude_pattern() {
    let result = FileDiscovery::new().with_exclude_patterns(vec!["[unclosed".to_string()]);
    assert!(result.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_files_and_blueprint_directories() {
    let temp_dir = home_assistant_layout();
    let root = temp_dir.path();
    let shared = TempDir::new().unwrap();
    touch(shared.path(), "ui-lovelace.yaml");
    touch(shared.path(), "community/notify_on_leave.yaml");

    std::os::unix::fs::symlink(shared.path().join("ui-lovelace.yaml"), root.join("ui-lovelace.yaml"))
        .unwrap();
    std::os::unix::fs::symlink(
        shared.path().join("community"),
        root.join("blueprints/automation/community"),
    )
    .unwrap();

    let files = FileDiscovery::new().discover_files(root).await.unwrap();
    let names = relative_names(root, &files);
    assert!(names.contains(&"ui-lovelace.yaml".to_string()));
    assert!(names.contains(&"blueprints/automation/community/notify_on_leave.yaml".to_string()));

    let files = FileDiscovery::new()
        .with_follow_symlinks(false)
        .discover_files(root)
        .await
        .unwrap();
    assert_eq!(files.len(), 6);
}
