// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};
use tracing::debug;

use crate::retry::RetryPolicy;

pub const DEFAULT_BUCKET: &str = "dtc_data_lake_stoked-utility-387710";
pub const DEFAULT_SOURCE_BASE_URL: &str =
    "https://github.com/DataTalksClub/nyc-tlc-data/releases/download";
pub const DEFAULT_PROJECT_ID: &str = "stoked-utility-387710";
pub const DEFAULT_DESTINATION_TABLE: &str = "dezoomcamp.rides";

/// Rows per warehouse append call.
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;
pub const DEFAULT_MAX_WORKERS: usize = 4;
/// Retries after the first attempt, so the extractor makes up to four calls.
pub const DEFAULT_EXTRACT_RETRIES: usize = 3;

pub const BUCKET_ENV: &str = "GCP_GCS_BUCKET";
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const CONFIG_PATH_ENV: &str = "TRIPETL_CONFIG";

/// Runtime settings shared by both pipelines.
///
/// Every field has a default matching the hard-coded parameters of the
/// batch jobs; a YAML file named by `TRIPETL_CONFIG` may override any of
/// them, and `GCP_GCS_BUCKET` / `GOOGLE_APPLICATION_CREDENTIALS` win last.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub bucket: String,
    pub source_base_url: String,
    pub local_data_dir: PathBuf,
    pub project_id: String,
    pub destination_table: String,
    pub chunk_size: usize,
    pub max_workers: usize,
    pub extract_retries: usize,
    pub retry_delay_secs: u64,
    pub credentials_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            source_base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            local_data_dir: PathBuf::from("data"),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            destination_table: DEFAULT_DESTINATION_TABLE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            extract_retries: DEFAULT_EXTRACT_RETRIES,
            retry_delay_secs: 0,
            credentials_path: None,
        }
    }
}

impl Settings {
    /// Defaults, then the optional YAML file, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading settings file {}", path))?;
                Self::from_yaml_str(&raw).with_context(|| format!("parsing {}", path))?
            }
            Err(_) => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok());
        debug!(?settings, "loaded settings");
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("deserializing settings")
    }

    /// Apply environment-style overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup(BUCKET_ENV).filter(|b| !b.is_empty()) {
            self.bucket = bucket;
        }
        if let Some(path) = lookup(CREDENTIALS_ENV).filter(|p| !p.is_empty()) {
            self.credentials_path = Some(PathBuf::from(path));
        }
    }

    pub fn extract_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.extract_retries + 1,
            Duration::from_secs(self.retry_delay_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_job_constants() {
        let s = Settings::default();
        assert_eq!(s.bucket, DEFAULT_BUCKET);
        assert_eq!(s.chunk_size, 500_000);
        assert_eq!(s.max_workers, 4);
        assert_eq!(s.extract_retry_policy().max_attempts, 4);
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let s = Settings::from_yaml_str("bucket: other\nmax_workers: 2\n").unwrap();
        assert_eq!(s.bucket, "other");
        assert_eq!(s.max_workers, 2);
        assert_eq!(s.destination_table, DEFAULT_DESTINATION_TABLE);
    }

    #[test]
    fn env_bucket_beats_yaml() {
        let mut s = Settings::from_yaml_str("bucket: from-yaml").unwrap();
        let env: HashMap<&str, &str> = [
            (BUCKET_ENV, "from-env"),
            (CREDENTIALS_ENV, "/keys/sa.json"),
        ]
        .into_iter()
        .collect();
        s.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(s.bucket, "from-env");
        assert_eq!(s.credentials_path, Some(PathBuf::from("/keys/sa.json")));
    }

    #[test]
    fn empty_env_bucket_is_ignored() {
        let mut s = Settings::default();
        s.apply_overrides(|k| (k == BUCKET_ENV).then(String::new));
        assert_eq!(s.bucket, DEFAULT_BUCKET);
    }
}
