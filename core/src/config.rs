use serde::{Deserialize, Serialize};

fn default_database_path() -> String {
    "carddemo.db".to_string()
}

fn default_customer_file() -> String {
    "custdata.txt".to_string()
}

fn default_account_file() -> String {
    "acctdata.txt".to_string()
}

fn default_card_file() -> String {
    "carddata.txt".to_string()
}

fn default_cardxref_file() -> String {
    "cardxref.txt".to_string()
}

fn default_transaction_file() -> String {
    "dailytran.txt".to_string()
}

/// Configuration for one import run. Built explicitly and handed to the
/// orchestrator so independent runs (and tests) never share process state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Directory holding the five fixed-width source files.
    pub data_dir: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_customer_file")]
    pub customer_file: String,
    #[serde(default = "default_account_file")]
    pub account_file: String,
    #[serde(default = "default_card_file")]
    pub card_file: String,
    #[serde(default = "default_cardxref_file")]
    pub cardxref_file: String,
    #[serde(default = "default_transaction_file")]
    pub transaction_file: String,
}

impl ImportConfig {
    /// Config pointing at a data directory, with the standard file names.
    pub fn new(data_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
            database_path: default_database_path(),
            customer_file: default_customer_file(),
            account_file: default_account_file(),
            card_file: default_card_file(),
            cardxref_file: default_cardxref_file(),
            transaction_file: default_transaction_file(),
        }
    }

    /// Load from a JSON config file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ImportConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let mut config = Self::new("./data");
        config.database_path = ":memory:".to_string();
        config
    }

    pub fn customer_path(&self) -> String {
        format!("{}/{}", self.data_dir, self.customer_file)
    }

    pub fn account_path(&self) -> String {
        format!("{}/{}", self.data_dir, self.account_file)
    }

    pub fn card_path(&self) -> String {
        format!("{}/{}", self.data_dir, self.card_file)
    }

    pub fn cardxref_path(&self) -> String {
        format!("{}/{}", self.data_dir, self.cardxref_file)
    }

    pub fn transaction_path(&self) -> String {
        format!("{}/{}", self.data_dir, self.transaction_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_in_standard_file_names() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"data_dir": "/srv/exports"}"#).unwrap();
        assert_eq!(config.data_dir, "/srv/exports");
        assert_eq!(config.database_path, "carddemo.db");
        assert_eq!(config.customer_path(), "/srv/exports/custdata.txt");
        assert_eq!(config.transaction_path(), "/srv/exports/dailytran.txt");
    }

    #[test]
    fn test_config_uses_in_memory_database() {
        let config = ImportConfig::default_test();
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.cardxref_path(), "./data/cardxref.txt");
    }

    #[test]
    fn load_rejects_missing_file() {
        assert!(ImportConfig::load("/no/such/config.json").is_err());
    }
}
