// Configuration loading: typed YAML sections with environment expansion.
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::env;
use std::fs;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    pub allow_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: None,
            temperature: None,
            timeout_s: None,
        }
    }
}

impl LlmConfig {
    /// The configured credential, if any usable one is present.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/synapse.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Reads the YAML config, expanding `${VAR}` / `${VAR:-default}` placeholders
/// from the environment. A missing or malformed file degrades to defaults so
/// a fresh checkout starts without any setup.
pub fn load_config() -> Config {
    let path =
        env::var("SYNAPSE_CONFIG_PATH").unwrap_or_else(|_| "config/synapse.yaml".to_string());
    let mut value = read_yaml(&path);
    expand_yaml_env(&mut value);
    serde_yaml::from_value::<Config>(value).unwrap_or_else(|err| {
        warn!("config parse failed, falling back to defaults: {err}");
        Config::default()
    })
}

fn read_yaml(path: &str) -> Value {
    // The config file is allowed to be absent on a fresh checkout.
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return Value::Null,
    };
    serde_yaml::from_str(&content).unwrap_or_else(|err| {
        warn!("yaml parse failed: {path}, {err}");
        Value::Null
    })
}

fn expand_yaml_env(value: &mut Value) {
    match value {
        Value::String(text) => {
            *text = expand_env_placeholders(text);
        }
        Value::Sequence(items) => {
            for item in items {
                expand_yaml_env(item);
            }
        }
        Value::Mapping(map) => {
            for (_, value) in map.iter_mut() {
                expand_yaml_env(value);
            }
        }
        _ => {}
    }
}

fn expand_env_placeholders(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        rest = &rest[start + 2..];
        let Some(end) = rest.find('}') else {
            output.push_str("${");
            output.push_str(rest);
            return output;
        };
        let inner = &rest[..end];
        rest = &rest[end + 1..];
        let (name, default_value) = match inner.split_once(":-") {
            Some((name, default_value)) => (name.trim(), Some(default_value)),
            None => (inner.trim(), None),
        };
        if name.is_empty() {
            output.push_str("${");
            output.push_str(inner);
            output.push('}');
            continue;
        }
        let resolved = env::var(name).ok().filter(|value| !value.is_empty());
        match (resolved, default_value) {
            (Some(value), _) => output.push_str(&value),
            (None, Some(default_value)) => output.push_str(default_value),
            (None, None) => {}
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.db_path, "./data/synapse.db");
        assert_eq!(config.observability.log_level, "info");
        assert!(config.llm.api_key().is_none());
    }

    #[test]
    fn blank_api_key_counts_as_unconfigured() {
        let llm = LlmConfig {
            api_key: Some("   ".to_string()),
            ..LlmConfig::default()
        };
        assert!(llm.api_key().is_none());
    }

    #[test]
    fn env_placeholders_expand_with_defaults() {
        std::env::remove_var("SYNAPSE_TEST_PLACEHOLDER");
        assert_eq!(
            expand_env_placeholders("${SYNAPSE_TEST_PLACEHOLDER:-fallback}"),
            "fallback"
        );

        std::env::set_var("SYNAPSE_TEST_PLACEHOLDER", "value");
        assert_eq!(
            expand_env_placeholders("key-${SYNAPSE_TEST_PLACEHOLDER}-suffix"),
            "key-value-suffix"
        );
        std::env::remove_var("SYNAPSE_TEST_PLACEHOLDER");
        assert_eq!(expand_env_placeholders("${SYNAPSE_TEST_PLACEHOLDER}"), "");
    }

    #[test]
    fn yaml_sections_deserialize_partially() {
        let config: Config =
            serde_yaml::from_str("server:\n  host: 127.0.0.1\n  port: 9100\n").expect("parse");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.db_path, "./data/synapse.db");
    }
}
