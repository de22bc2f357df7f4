use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ROSTER_DIR: &str = ".roster";
const CONFIG_ENV: &str = "ROSTER_CONFIG";

pub const DEFAULT_RECORDS_FILE: &str = "base_datos.txt";
pub const DEFAULT_MODEL: &str = "qwen2.5:3b";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Written as `0` when unbounded.
    #[serde(
        serialize_with = "serialize_iteration_bound",
        deserialize_with = "deserialize_iteration_bound"
    )]
    pub max_iterations: Option<usize>,
    pub phase_timeout_secs: Option<u64>,
    /// Retries on a failed model call, applied inside the provider.
    pub max_retries: usize,
    pub records_path: PathBuf,
    pub text_tool_calls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: "ollama".to_string(),
            api_key: String::new(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_iterations: Some(crate::agent::DEFAULT_MAX_ITERATIONS),
            phase_timeout_secs: None,
            max_retries: 0,
            records_path: PathBuf::from(DEFAULT_RECORDS_FILE),
            text_tool_calls: true,
        }
    }
}

impl Config {
    pub fn phase_timeout(&self) -> Option<Duration> {
        self.phase_timeout_secs.map(Duration::from_secs)
    }

    /// Loads the config file if there is one, defaults otherwise.
    pub fn load_or_default() -> Result<Self> {
        let path = get_config_path();
        if path.exists() {
            load_config(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")
    }
}

// TOML has no null, so 0 stands for "no bound"
fn serialize_iteration_bound<S: Serializer>(
    bound: &Option<usize>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(bound.unwrap_or(0) as u64)
}

fn deserialize_iteration_bound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<usize>, D::Error> {
    let bound = usize::deserialize(deserializer)?;
    Ok((bound != 0).then_some(bound))
}

pub fn get_roster_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(ROSTER_DIR)
}

pub fn get_config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => get_roster_dir().join("config.toml"),
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.phase_timeout_secs == Some(0) {
        anyhow::bail!("phase_timeout_secs must be at least 1");
    }

    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, config.to_toml()?)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
