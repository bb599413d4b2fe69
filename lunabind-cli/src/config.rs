//! Configuration handling for the lunabind CLI

use anyhow::{Context, Result};
use lunabind_engine::EngineConfig;
use std::path::{Path, PathBuf};

/// Per-user configuration file, used when no path is given
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lunabind").join("config.json"))
}

/// Load configuration from file or use defaults.
///
/// `debug` turns on marshaling and gateway tracing on top of the file.
pub fn load_config(path: Option<&Path>, debug: bool) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => match default_config_path() {
            Some(default_path) if default_path.exists() => EngineConfig::from_file(&default_path)
                .with_context(|| {
                    format!("failed to load configuration from {}", default_path.display())
                })?,
            _ => EngineConfig::default(),
        },
    };

    if debug {
        config.debug.trace_marshaling = true;
        config.debug.log_gateway_calls = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunabind_engine::LibrarySet;

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"libraries": "Minimal", "max_table_depth": 8}"#).unwrap();

        let config = load_config(Some(path.as_path()), false).unwrap();
        assert_eq!(config.libraries, LibrarySet::Minimal);
        assert_eq!(config.max_table_depth, 8);
        assert!(!config.debug.trace_marshaling);
    }

    #[test]
    fn test_debug_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let config = load_config(Some(path.as_path()), true).unwrap();
        assert!(config.debug.trace_marshaling);
        assert!(config.debug.log_gateway_calls);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.json").as_path()), false).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
