//! Shared fixtures: a configuration directory with registry snapshots

#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MOTION_BATTERY_ID: &str = "88a52f17bf43cb276836f06ac5c07444";
pub const DISABLED_SENSOR_ID: &str = "11223344556677889900aabbccddeeff";
pub const NORMAL_SENSOR_ID: &str = "aabbccddeeff00112233445566778899";
pub const UNKNOWN_REGISTRY_ID: &str = "ffffffffffffffffffffffffffffffff";
pub const MOTION_DEVICE_ID: &str = "0c086f69ee6b3fa8411af7194876cbd7";

/// Temporary Home Assistant configuration directory
pub struct TestConfigDir {
    pub temp_dir: TempDir,
}

impl TestConfigDir {
    /// Directory with entity, device and area registries
    pub fn new() -> Self {
        let config = Self::empty();
        config.write_registry("core.entity_registry", entity_registry());
        config.write_registry("core.device_registry", device_registry());
        config.write_registry("core.area_registry", area_registry());
        config
    }

    /// Directory without any registry snapshot
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(".storage")).unwrap();
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_registry(&self, file_name: &str, data: serde_json::Value) {
        fs::write(
            self.path().join(".storage").join(file_name),
            serde_json::to_string_pretty(&data).unwrap(),
        )
        .unwrap();
    }

    /// Write a configuration file relative to the directory
    pub fn write_yaml(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

pub fn entity_registry() -> serde_json::Value {
    json!({
        "version": 1,
        "minor_version": 1,
        "key": "core.entity_registry",
        "data": {
            "entities": [
                {
                    "entity_id": "binary_sensor.test_motion_battery",
                    "id": MOTION_BATTERY_ID,
                    "platform": "test",
                    "unique_id": "test_motion_battery",
                    "device_id": MOTION_DEVICE_ID,
                    "disabled_by": null
                },
                {
                    "entity_id": "sensor.disabled_sensor",
                    "id": DISABLED_SENSOR_ID,
                    "platform": "test",
                    "unique_id": "disabled_sensor",
                    "device_id": "disabled_device_id_123456789012",
                    "disabled_by": "user"
                },
                {
                    "entity_id": "sensor.normal_sensor",
                    "id": NORMAL_SENSOR_ID,
                    "platform": "test",
                    "unique_id": "normal_sensor",
                    "disabled_by": null
                },
                {
                    "entity_id": "sensor.complex",
                    "id": "complexsensoridfortest12345678900",
                    "platform": "test",
                    "unique_id": "complex_sensor",
                    "disabled_by": null
                }
            ]
        }
    })
}

pub fn device_registry() -> serde_json::Value {
    json!({
        "version": 1,
        "minor_version": 1,
        "data": {
            "devices": [
                {
                    "id": MOTION_DEVICE_ID,
                    "name": "Test Motion Sensor",
                    "manufacturer": "Test",
                    "model": "Motion Sensor",
                    "disabled_by": null
                },
                {
                    "id": "disabled_device_id_123456789012",
                    "name": "Disabled Device",
                    "manufacturer": "Test",
                    "model": "Disabled",
                    "disabled_by": "user"
                }
            ]
        }
    })
}

pub fn area_registry() -> serde_json::Value {
    json!({
        "version": 1,
        "minor_version": 1,
        "data": {"areas": [{"id": "living_room", "name": "Living Room"}]}
    })
}
