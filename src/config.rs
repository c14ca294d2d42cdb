use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub base_url: String,
    pub session_id: Option<String>,
    pub lookup_by_id: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub broker: BrokerConfig,
    pub options_path: PathBuf,
    pub record_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("DDNSBROKER_URL").context("DDNSBROKER_URL must be set")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let session_id = lookup("DDNSBROKER_SESSION_ID").filter(|s| !s.trim().is_empty());

        let lookup_by_id = match lookup("DDNSBROKER_LOOKUP_BY_ID") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("DDNSBROKER_LOOKUP_BY_ID is not a boolean: {raw}"))?,
            None => false,
        };

        let options_path = lookup("DDNSBROKER_OPTIONS")
            .map(PathBuf::from)
            .context("DDNSBROKER_OPTIONS must be set")?;
        let record_path = lookup("DDNSBROKER_RECORD")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("record.json"));
        let log_path = lookup("DDNSBROKER_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ddnsbroker-tui.log"));

        Ok(Self {
            broker: BrokerConfig {
                base_url,
                session_id,
                lookup_by_id,
            },
            options_path,
            record_path,
            log_path,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNSBROKER_URL", "https://ddns.example.com/"),
            ("DDNSBROKER_OPTIONS", "options.json"),
        ]))
        .unwrap();

        assert_eq!(config.broker.base_url, "https://ddns.example.com");
        assert_eq!(config.broker.session_id, None);
        assert!(!config.broker.lookup_by_id);
        assert_eq!(config.record_path, PathBuf::from("record.json"));
        assert_eq!(config.log_path, PathBuf::from("ddnsbroker-tui.log"));
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("DDNSBROKER_OPTIONS", "o.json")]))
            .unwrap_err();
        assert!(err.to_string().contains("DDNSBROKER_URL"));
    }

    #[test]
    fn optional_values_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("DDNSBROKER_URL", "http://localhost:8000"),
            ("DDNSBROKER_OPTIONS", "o.json"),
            ("DDNSBROKER_SESSION_ID", "abc123"),
            ("DDNSBROKER_LOOKUP_BY_ID", "Yes"),
            ("DDNSBROKER_RECORD", "/tmp/r.json"),
        ]))
        .unwrap();

        assert_eq!(config.broker.session_id.as_deref(), Some("abc123"));
        assert!(config.broker.lookup_by_id);
        assert_eq!(config.record_path, PathBuf::from("/tmp/r.json"));
    }

    #[test]
    fn bad_flag_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DDNSBROKER_URL", "http://localhost:8000"),
            ("DDNSBROKER_OPTIONS", "o.json"),
            ("DDNSBROKER_LOOKUP_BY_ID", "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DDNSBROKER_LOOKUP_BY_ID"));
    }
}
