use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub records_path: String,
    pub base_currency_level: String,
    pub max_records: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let records_path = env_map
            .get("RECORDS_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RECORDS_PATH".to_string()))?;

        let base_currency_level = env_map
            .get("BASE_CURRENCY_LEVEL")
            .cloned()
            .unwrap_or_else(|| "BaseCurrency".to_string());

        let max_records = match env_map.get("MAX_RECORDS") {
            Some(s) => Some(s.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(
                    "MAX_RECORDS".to_string(),
                    "must be a valid usize".to_string(),
                )
            })?),
            None => None,
        };

        Ok(Config {
            database_path,
            records_path,
            base_currency_level,
            max_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "RECORDS_PATH".to_string(),
            "/tmp/records.json".to_string(),
        );
        map
    }

    #[test]
    fn test_config_from_env_map_with_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.database_path, "/tmp/test.db");
        assert_eq!(config.records_path, "/tmp/records.json");
        assert_eq!(config.base_currency_level, "BaseCurrency");
        assert_eq!(config.max_records, None);
    }

    #[test]
    fn test_config_missing_database_path() {
        let mut map = setup_required_env();
        map.remove("DATABASE_PATH");
        let err = Config::from_env_map(map).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref name) if name == "DATABASE_PATH"));
    }

    #[test]
    fn test_config_missing_records_path() {
        let mut map = setup_required_env();
        map.remove("RECORDS_PATH");
        let err = Config::from_env_map(map).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref name) if name == "RECORDS_PATH"));
    }

    #[test]
    fn test_config_overrides() {
        let mut map = setup_required_env();
        map.insert("BASE_CURRENCY_LEVEL".to_string(), "Currency".to_string());
        map.insert("MAX_RECORDS".to_string(), "250".to_string());
        let config = Config::from_env_map(map).unwrap();
        assert_eq!(config.base_currency_level, "Currency");
        assert_eq!(config.max_records, Some(250));
    }

    #[test]
    fn test_config_invalid_max_records() {
        let mut map = setup_required_env();
        map.insert("MAX_RECORDS".to_string(), "not-a-number".to_string());
        let err = Config::from_env_map(map).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "MAX_RECORDS"));
    }
}
