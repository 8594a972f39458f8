use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

fn default_backend_url() -> String { "http://localhost:54321".into() }
fn default_api_key() -> String { "development-anon-key".into() }
fn default_history_capacity() -> usize { 10 }
fn default_reply_delay_ms() -> u64 { 1500 }

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("COCOTAS").separator("__"))
            .build()?;
        Ok(config.try_deserialize().unwrap_or_else(|_| Self {
            backend_url: default_backend_url(),
            api_key: default_api_key(),
            history_capacity: default_history_capacity(),
            reply_delay_ms: default_reply_delay_ms(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.backend_url, "http://localhost:54321");
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.reply_delay_ms, 1500);
    }
}
