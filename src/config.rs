use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// File the recommendation model is loaded from and saved to
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Snapshot the model to `model_path` when the server shuts down
    #[serde(default = "default_save_on_shutdown")]
    pub save_on_shutdown: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("recommendation_model.json")
}

fn default_save_on_shutdown() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            save_on_shutdown: default_save_on_shutdown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_environment() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, PathBuf::from("recommendation_model.json"));
        assert!(config.save_on_shutdown);
    }

    #[test]
    fn test_environment_overrides() {
        let vars = vec![
            ("PORT".to_string(), "9100".to_string()),
            ("MODEL_PATH".to_string(), "/tmp/recs.json".to_string()),
            ("SAVE_ON_SHUTDOWN".to_string(), "false".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/tmp/recs.json"));
        assert!(!config.save_on_shutdown);
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
    }
}
