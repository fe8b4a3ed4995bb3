//! Configuration file handling
//!
//! `~/.config/dochub/config.toml` (platform config dir) holds processing
//! options and the lookup backend. Missing files fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::lookup::{
    LocalDictionary, LookupBackend, LookupClient, RemoteLookup, RetryPolicy, UsageFields,
};
use crate::processor::ProcessingOptions;

/// Overrides `lookup.endpoint`
pub const ENDPOINT_ENV: &str = "DOCHUB_LOOKUP_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processing: ProcessingOptions,
    pub lookup: LookupConfig,
    /// Backup directory; the platform data dir when unset
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Remote batch endpoint
    pub endpoint: Option<String>,
    /// JSON dictionary used instead of the endpoint when set
    pub local_dictionary: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub user: UsageFields,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            endpoint: None,
            local_dictionary: None,
            timeout_secs: policy.timeout.as_secs(),
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            user: UsageFields::default(),
        }
    }
}

impl LookupConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.local_dictionary.is_some() || self.endpoint.is_some()
    }

    /// Build the client for the configured backend; the local dictionary wins
    pub async fn build_client(&self) -> Result<LookupClient> {
        let backend: Arc<dyn LookupBackend> = match (&self.local_dictionary, &self.endpoint) {
            (Some(path), _) => Arc::new(
                LocalDictionary::load(path)
                    .await
                    .with_context(|| format!("loading dictionary {}", path.display()))?,
            ),
            (None, Some(endpoint)) => {
                Arc::new(RemoteLookup::new(endpoint.as_str()).context("configuring lookup endpoint")?)
            }
            (None, None) => bail!(
                "no lookup backend configured: set lookup.endpoint, lookup.local_dictionary or {ENDPOINT_ENV}"
            ),
        };
        Ok(LookupClient::new(backend, self.retry_policy()).with_usage(self.user.clone()))
    }
}

impl Config {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        let mut config = match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dochub").join("config.toml"))
    }

    /// Write the default configuration, returning where it went
    pub fn init_default(path: Option<&Path>) -> Result<Option<PathBuf>> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::get_config_path) else {
            return Ok(None);
        };
        Config::default().save_to(&path)?;
        Ok(Some(path))
    }

    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.lookup.endpoint = Some(endpoint);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::format::{StyleDefinition, TableSettings};
    use crate::processor::{Operation, OperationAction};

    #[test]
    fn init_default_writes_to_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom").join("dochub.toml");

        let written = Config::init_default(Some(&path)).unwrap();

        assert_eq!(written.as_deref(), Some(path.as_path()));
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.processing.operations = vec![
            Operation::new(OperationAction::FixHyperlinks),
            Operation::new(OperationAction::Tables).with_priority(1),
        ];
        config.processing.styles.insert(
            "Normal".into(),
            StyleDefinition {
                font: Some("Calibri".into()),
                size: Some(11.0),
                ..StyleDefinition::default()
            },
        );
        config.lookup.endpoint = Some("https://lookup.example.com/batch".into());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [processing]
            concurrency = 5

            [processing.tables]
            header_bold = false

            [lookup]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.processing.concurrency, 5);
        assert_eq!(config.processing.reclaim_every, 10);
        assert_eq!(
            config.processing.tables,
            TableSettings {
                header_bold: false,
                ..TableSettings::default()
            }
        );
        assert_eq!(config.lookup.retry_policy().timeout, Duration::from_secs(5));
        assert_eq!(config.lookup.max_attempts, 3);
    }

    #[tokio::test]
    async fn unconfigured_lookup_is_an_error() {
        let err = LookupConfig::default().build_client().await.err().unwrap();
        assert!(err.to_string().contains("no lookup backend configured"));
    }
}
