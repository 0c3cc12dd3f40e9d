use anyhow::{Context, Result};
use easel_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::path::{Path, PathBuf};

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Script,
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Script => write!(f, "replay script"),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve the configuration for a command
///
/// An explicit `--config` file wins, then a config embedded in the replay
/// script, then `easel.config.json` in the working directory.
pub fn resolve(
    explicit: Option<&Path>,
    embedded: Option<EditorConfig>,
    cwd: &Path,
) -> Result<(EditorConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = EditorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    if let Some(config) = embedded {
        config.validate().context("Invalid config in replay script")?;
        return Ok((config, ConfigSource::Script));
    }

    let default_path = cwd.join(DEFAULT_CONFIG_NAME);
    let config = EditorConfig::load(cwd)
        .with_context(|| format!("Failed to load {}", default_path.display()))?;
    let source = if default_path.exists() {
        ConfigSource::File(default_path)
    } else {
        ConfigSource::Defaults
    };
    Ok((config, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_wins() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.json");
        std::fs::write(&explicit, r#"{ "sync": { "debounceMs": 40 } }"#).unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "sync": { "debounceMs": 90 } }"#,
        )
        .unwrap();

        let (config, source) = resolve(Some(&explicit), None, dir.path()).unwrap();
        assert_eq!(config.sync.debounce_ms, 40);
        assert_eq!(source, ConfigSource::File(explicit));
    }

    #[test]
    fn test_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, source) = resolve(None, None, dir.path()).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn test_embedded_config_is_validated() {
        let dir = TempDir::new().unwrap();
        let mut config = EditorConfig::default();
        config.sync.debounce_ms = 0;
        assert!(resolve(None, Some(config), dir.path()).is_err());
    }
}
