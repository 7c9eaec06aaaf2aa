use crate::error::{RefCheckError, Result};
use globset::{GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Subdirectory whose YAML files are searched recursively
pub const BLUEPRINTS_DIR: &str = "blueprints";

/// Async discovery of the YAML documents of a configuration directory
///
/// Only the top level of the directory is scanned, plus everything below
/// `blueprints/`. Package or include directories are reached through
/// `!include` tags, which are not followed.
///
/// Symbolic links are followed by default. A linked directory already
/// visited under another path is scanned only once.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include
    extensions: Vec<String>,
    /// Exclude patterns, matched against the path relative to the root
    exclude_set: Option<GlobSet>,
    /// Follow symbolic links
    follow_symlinks: bool,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            exclude_set: None,
            follow_symlinks: true,
        }
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns)?;
        Ok(self)
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Discover configuration files below `root`, sorted by path
    pub async fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let mut read_dir = fs::read_dir(root).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let entry_path = entry.path();
            if entry_path.is_symlink() && !self.follow_symlinks {
                continue;
            }

            let metadata = match fs::metadata(&entry_path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if metadata.is_file() && self.should_process(root, &entry_path) {
                files.push(entry_path);
            }
        }

        let blueprints = root.join(BLUEPRINTS_DIR);
        let mut visited = HashSet::new();
        if fs::metadata(&blueprints)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
            && let Err(e) = self
                .discover_files_recursive(root, &blueprints, &mut files, &mut visited)
                .await
        {
            warn!(path = %blueprints.display(), error = %e, "error while scanning blueprints");
        }

        files.sort();
        Ok(files)
    }

    /// Recursive helper for discovering files
    fn discover_files_recursive<'a>(
        &'a self,
        root: &'a Path,
        dir: &'a Path,
        files: &'a mut Vec<PathBuf>,
        visited: &'a mut HashSet<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            // Symlink cycles end here
            if !visited.insert(fs::canonicalize(dir).await?) {
                return Ok(());
            }

            let mut read_dir = fs::read_dir(dir).await?;

            while let Some(entry) = read_dir.next_entry().await? {
                let entry_path = entry.path();
                if entry_path.is_symlink() && !self.follow_symlinks {
                    continue;
                }

                let metadata = match fs::metadata(&entry_path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if metadata.is_file() {
                    if self.should_process(root, &entry_path) {
                        files.push(entry_path);
                    }
                } else if metadata.is_dir()
                    && let Err(e) = self
                        .discover_files_recursive(root, &entry_path, files, visited)
                        .await
                {
                    // Keep scanning sibling directories
                    warn!(path = %entry_path.display(), error = %e, "error while scanning directory");
                }
            }

            Ok(())
        })
    }

    /// Check the extension and the exclude patterns of a candidate file
    pub fn should_process(&self, root: &Path, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set {
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(relative) {
                return false;
            }
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| RefCheckError::InvalidPattern {
                pattern: pattern.clone(),
                details: e.to_string(),
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| RefCheckError::InvalidPattern {
        pattern: patterns.join(", "),
        details: e.to_string(),
    })?;
    Ok(Some(set))
}
