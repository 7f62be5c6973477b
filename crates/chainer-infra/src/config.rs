//! Engine configuration loader.
//!
//! Reads a `chainer.toml` file and deserializes it into [`EngineConfig`].
//! Falls back to defaults when the file is missing or malformed, so a bad
//! config never prevents a run.

use std::path::Path;

use chainer_types::config::EngineConfig;

/// File name looked up by [`load_engine_config_in`].
pub const CONFIG_FILE_NAME: &str = "chainer.toml";

/// Load engine configuration from `path`.
///
/// - Missing file: [`EngineConfig::default()`], logged at debug.
/// - Unreadable or unparsable file: default, logged at warn.
pub async fn load_engine_config(path: &Path) -> EngineConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => {
            tracing::debug!(?config, "loaded engine config from {}", path.display());
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            EngineConfig::default()
        }
    }
}

/// Load `{dir}/chainer.toml`.
pub async fn load_engine_config_in(dir: &Path) -> EngineConfig {
    load_engine_config(&dir.join(CONFIG_FILE_NAME)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_engine_config_in(tmp.path()).await;
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "step_timeout_secs = 30\nannounce_steps = true\n")
            .await
            .unwrap();

        let config = load_engine_config(&path).await;
        assert_eq!(config.step_timeout(), Some(Duration::from_secs(30)));
        assert!(config.announce_steps);
    }

    #[tokio::test]
    async fn partial_toml_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "announce_steps = true\n").await.unwrap();

        let config = load_engine_config(&path).await;
        assert!(config.announce_steps);
        assert!(config.step_timeout().is_none());
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "step_timeout_secs = \"soon\" {{{")
            .await
            .unwrap();

        let config = load_engine_config(&path).await;
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn directory_path_returns_default() {
        let tmp = TempDir::new().unwrap();
        // Reading a directory as a file is an IO error other than NotFound.
        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config, EngineConfig::default());
    }
}
