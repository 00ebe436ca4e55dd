//! Settings management

use gfxbench_core::{BackendType, TestId};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "gfxbench.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("window size {width}x{height} must be non-zero")]
    ZeroWindowSize { width: u32, height: u32 },
}

/// Harness settings
///
/// Every field is optional in the file; anything missing takes its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub benchmark: BenchmarkSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Test Window".to_string(),
            x: 50,
            y: 50,
            width: 1024,
            height: 748,
        }
    }
}

/// What runs first when the window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    pub backend: BackendType,
    pub test: TestId,
    pub vsync: bool,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            backend: BackendType::OpenGl,
            test: TestId::default(),
            vsync: false,
        }
    }
}

impl Settings {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_json::from_str(text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(SettingsError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let WindowSettings { width, height, .. } = self.window;
        if width == 0 || height == 0 {
            return Err(SettingsError::ZeroWindowSize { width, height });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gfxbench-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.window.title, "Test Window");
        assert_eq!((settings.window.x, settings.window.y), (50, 50));
        assert_eq!((settings.window.width, settings.window.height), (1024, 748));
        assert_eq!(settings.benchmark.backend, BackendType::OpenGl);
        assert_eq!(settings.benchmark.test, TestId::CubesDynamicBuffer);
        assert!(!settings.benchmark.vsync);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"{ "benchmark": { "backend": "vulkan", "test": "streaming_vb" } }"#;
        let settings = Settings::from_json(Path::new("inline"), text).unwrap();
        assert_eq!(settings.benchmark.backend, BackendType::Vulkan);
        assert_eq!(settings.benchmark.test, TestId::StreamingVb);
        assert_eq!(settings.window, WindowSettings::default());
    }

    #[test]
    fn test_zero_window_rejected() {
        let text = r#"{ "window": { "width": 0 } }"#;
        let err = Settings::from_json(Path::new("inline"), text).unwrap_err();
        assert!(matches!(err, SettingsError::ZeroWindowSize { width: 0, height: 748 }));
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let text = r#"{ "benchmark": { "backend": "glide" } }"#;
        let err = Settings::from_json(Path::new("inline"), text).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(Settings::load(&path), Err(SettingsError::Read { .. })));
        assert_eq!(Settings::load_or_default(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("round-trip");
        let mut settings = Settings::default();
        settings.window.title = "bench".into();
        settings.benchmark.backend = BackendType::Headless;
        settings.benchmark.vsync = true;
        std::fs::write(&path, settings.to_json()).unwrap();

        let loaded = Settings::load_or_default(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_file_is_not_replaced_by_defaults() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }
}
