// Configuration loader
// Reads ~/.seva/config.toml (or an explicit path), then applies environment overrides

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;
use crate::errors;

/// Default config location: ~/.seva/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".seva").join("config.toml"))
}

/// Load configuration from the given file (or the default location) and the
/// process environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with_env(path, default_config_path(), |key| std::env::var(key).ok())
}

/// Load configuration with an injectable environment lookup.
///
/// An explicit `path` must exist; a missing default file just means defaults.
pub fn load_config_with_env<F>(
    path: Option<&Path>,
    default_path: Option<PathBuf>,
    env: F,
) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                bail!(errors::file_not_found_error(&path.display().to_string(), "Config file"));
            }
            read_config_file(path)?
        }
        None => match default_path {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, env);
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!(errors::config_parse_error(&path.display().to_string(), &e.to_string())))?;

    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|value| !value.is_empty());

    if let Some(api_key) = var("ANTHROPIC_API_KEY") {
        config.model.api_key = api_key;
    }
    if let Some(api_url) = var("GRM_API_URL") {
        config.grm.api_url = api_url;
    }
    if let Some(api_token) = var("GRM_API_TOKEN") {
        config.grm.api_token = api_token;
    }
    if let Some(user_id) = var("USER_ID") {
        config.grm.user_id = user_id;
    }
    if let Some(api_url) = var("SCHEME_SEARCH_URL") {
        config.scheme_search.api_url = Some(api_url);
    }
    if let Some(api_key) = var("ELEVENLABS_API_KEY") {
        config.speech.api_key = Some(api_key);
    }
    if let Some(voice_id) = var("ELEVENLABS_VOICE_ID") {
        config.speech.voice_id = voice_id;
    }
    if let Some(bind_address) = var("SEVA_BIND_ADDRESS") {
        config.server.bind_address = bind_address;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FailurePolicy;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            load_config_with_env(None, Some(dir.path().join("config.toml")), no_env).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[model]
api_key = "sk-ant-file"
max_steps = 5

[grm]
api_url = "https://grm.example.gov.in"
api_token = "token"
user_id = "citizen-42"

[speech]
voice_id = "custom-voice"

[speech.voice_settings]
stability = 0.3

[server]
bind_address = "0.0.0.0:8080"
executor_failure = "fail_fast"
"#
        )
        .unwrap();

        let config = load_config_with_env(Some(file.path()), None, no_env).unwrap();
        assert_eq!(config.model.api_key, "sk-ant-file");
        assert_eq!(config.model.max_steps, 5);
        assert_eq!(config.model.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.grm.user_id, "citizen-42");
        assert_eq!(config.speech.voice_id, "custom-voice");
        assert_eq!(config.speech.voice_settings.stability, 0.3);
        assert_eq!(config.speech.voice_settings.similarity_boost, 0.75);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.executor_failure, FailurePolicy::FailFast);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[grm]\napi_url = \"https://file.example\"").unwrap();

        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
            ("GRM_API_URL", "https://env.example"),
            ("ELEVENLABS_API_KEY", "el-key"),
            ("SCHEME_SEARCH_URL", "https://schemes.example/search"),
            ("SEVA_BIND_ADDRESS", ""),
        ]
        .into_iter()
        .collect();

        let config = load_config_with_env(Some(file.path()), None, |key| {
            env.get(key).map(|value| value.to_string())
        })
        .unwrap();

        assert_eq!(config.model.api_key, "sk-ant-env");
        assert_eq!(config.grm.api_url, "https://env.example");
        assert_eq!(config.speech.api_key.as_deref(), Some("el-key"));
        assert_eq!(
            config.scheme_search.api_url.as_deref(),
            Some("https://schemes.example/search")
        );
        // Empty values are ignored
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config_with_env(Some(&missing), None, no_env).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_error_is_friendly() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[model\napi_key = ").unwrap();

        let err = load_config_with_env(Some(file.path()), None, no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
