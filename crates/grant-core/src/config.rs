use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chat::client::usable_key;
use crate::store::STORAGE_KEY;

pub const CONFIG_ENV: &str = "GRANT_TRACKER_CONFIG";
pub const STORE_ENV: &str = "GRANT_TRACKER_STORE";
pub const CHAT_ENDPOINT_ENV: &str = "GRANT_CHAT_ENDPOINT";
pub const CHAT_MODEL_ENV: &str = "GRANT_CHAT_MODEL";
pub const FALLBACK_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Directory name under the platform config/data dirs.
pub const APP_DIR: &str = "grant-tracker";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Environment variable holding the bearer credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Credential stored in the local config file. Never exported.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// `false` when `endpoint` is an intermediary that holds the credential.
    #[serde(default = "default_true")]
    pub require_key: bool,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            api_key: None,
            require_key: default_true(),
            system_prompt: None,
        }
    }
}

/// Where a resolved chat credential came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "name", rename_all = "snake_case")]
pub enum KeySource {
    Env(String),
    ConfigFile,
}

impl ChatConfig {
    /// Apply `GRANT_CHAT_ENDPOINT` / `GRANT_CHAT_MODEL` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = env(CHAT_ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(model) = env(CHAT_MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        self
    }

    /// First usable credential from `api_key_env`, then `OPENAI_API_KEY`,
    /// then the config file. Placeholder keys are skipped.
    #[must_use]
    pub fn resolve_api_key(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<(String, KeySource)> {
        let mut names = vec![self.api_key_env.as_str()];
        if self.api_key_env != FALLBACK_API_KEY_ENV {
            names.push(FALLBACK_API_KEY_ENV);
        }
        for name in names {
            if let Some(key) = env(name).filter(|key| usable_key(key)) {
                return Some((key, KeySource::Env(name.to_string())));
            }
        }
        self.api_key
            .clone()
            .filter(|key| usable_key(key))
            .map(|key| (key, KeySource::ConfigFile))
    }
}

/// Effective settings after files, env, and flags are merged, as shown by
/// `grant config`. The credential itself is never included.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub config_path: Option<PathBuf>,
    pub config_found: bool,
    pub store_path: PathBuf,
    pub output: String,
    pub lock_timeout_ms: u64,
    pub chat: ChatConfig,
    pub api_key: Option<KeySource>,
}

/// `GRANT_TRACKER_CONFIG`, else `<config_dir>/grant-tracker/config.toml`.
#[must_use]
pub fn user_config_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    env(CONFIG_ENV)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml")))
}

/// Load the user config at `path`; a missing file yields defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or is not valid TOML.
pub fn load_user_config(path: Option<&Path>) -> Result<UserConfig> {
    let Some(path) = path else {
        return Ok(UserConfig::default());
    };
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// `<data_dir>/grant-tracker/grant-tracker.v1.json`, or the working directory
/// when the platform has no data dir.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR))
        .join(format!("{STORAGE_KEY}.json"))
}

/// Store path precedence: `--store`, `GRANT_TRACKER_STORE`, config
/// `storage.path`, platform default.
#[must_use]
pub fn resolve_store_path(
    cli: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    config: &UserConfig,
) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Some(path) = env(STORE_ENV).filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(path);
    }
    config
        .storage
        .path
        .clone()
        .unwrap_or_else(default_store_path)
}

/// Canonical output mode name, accepting the `human`/`table` aliases.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

const fn default_true() -> bool {
    true
}

const fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-5-nano".to_string()
}

const fn default_max_tokens() -> u32 {
    500
}

const fn default_temperature() -> f64 {
    0.7
}

fn default_api_key_env() -> String {
    "GRANT_CHAT_API_KEY".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_user_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg, UserConfig::default());
        assert_eq!(cfg.chat.model, "gpt-5-nano");
        assert_eq!(cfg.chat.max_tokens, 500);
        assert!(cfg.chat.require_key);
        assert_eq!(cfg.storage.lock_timeout_ms, 2_000);
        assert_eq!(load_user_config(None).unwrap(), UserConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output = "json"

[storage]
path = "/tmp/tracker.json"

[chat]
endpoint = "https://proxy.example.org/chat"
require_key = false
"#,
        )
        .unwrap();

        let cfg = load_user_config(Some(&path)).unwrap();
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.storage.path, Some(PathBuf::from("/tmp/tracker.json")));
        assert_eq!(cfg.chat.endpoint, "https://proxy.example.org/chat");
        assert!(!cfg.chat.require_key);
        assert_eq!(cfg.chat.model, "gpt-5-nano");
        assert!((cfg.chat.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = [").unwrap();
        let err = load_user_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn store_path_precedence() {
        let config = UserConfig {
            storage: StorageConfig {
                path: Some(PathBuf::from("/from/config.json")),
                ..StorageConfig::default()
            },
            ..UserConfig::default()
        };
        let env = env_from(&[(STORE_ENV, "/from/env.json")]);

        assert_eq!(
            resolve_store_path(Some(Path::new("/from/cli.json")), &env, &config),
            PathBuf::from("/from/cli.json")
        );
        assert_eq!(
            resolve_store_path(None, &env, &config),
            PathBuf::from("/from/env.json")
        );
        assert_eq!(
            resolve_store_path(None, env_from(&[]), &config),
            PathBuf::from("/from/config.json")
        );
        assert!(
            resolve_store_path(None, env_from(&[]), &UserConfig::default())
                .ends_with("grant-tracker.v1.json")
        );
    }

    #[test]
    fn api_key_resolution_skips_placeholders() {
        let chat = ChatConfig {
            api_key: Some("sk-from-file".into()),
            ..ChatConfig::default()
        };

        let env = env_from(&[
            ("GRANT_CHAT_API_KEY", "sk-proj-your-api-key-here"),
            (FALLBACK_API_KEY_ENV, "sk-openai"),
        ]);
        assert_eq!(
            chat.resolve_api_key(&env),
            Some((
                "sk-openai".to_string(),
                KeySource::Env(FALLBACK_API_KEY_ENV.into())
            ))
        );

        assert_eq!(
            chat.resolve_api_key(env_from(&[])),
            Some(("sk-from-file".to_string(), KeySource::ConfigFile))
        );
        assert_eq!(ChatConfig::default().resolve_api_key(env_from(&[])), None);
    }

    #[test]
    fn env_overrides_endpoint_and_model() {
        let chat = ChatConfig::default().with_env_overrides(env_from(&[
            (CHAT_ENDPOINT_ENV, "http://localhost:8787/v1/chat/completions"),
            (CHAT_MODEL_ENV, "gpt-5-mini"),
        ]));
        assert_eq!(chat.endpoint, "http://localhost:8787/v1/chat/completions");
        assert_eq!(chat.model, "gpt-5-mini");
    }

    #[test]
    fn credential_is_never_serialized() {
        let chat = ChatConfig {
            api_key: Some("sk-secret".into()),
            ..ChatConfig::default()
        };
        let rendered = serde_json::to_string(&chat).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(!toml::to_string(&chat).unwrap().contains("sk-secret"));
    }

    #[test]
    fn output_aliases_normalize() {
        assert_eq!(normalize_output_mode(" JSON "), Some("json"));
        assert_eq!(normalize_output_mode("human"), Some("pretty"));
        assert_eq!(normalize_output_mode("table"), Some("text"));
        assert_eq!(normalize_output_mode("yaml"), None);
    }
}
