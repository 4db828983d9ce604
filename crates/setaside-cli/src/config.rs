//! Pipeline configuration.
//!
//! Values come from an optional TOML file; CLI flags override file values,
//! which override the defaults below.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use setaside_core::{NaicsTable, VETERAN_MARKERS};
use setaside_fetch::SearchParams;
use setaside_store::{Destination, PollPolicy, QueryRequest, analytic_sql, results_location};

/// Top-level pipeline config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    /// NAICS code → label. Empty means the built-in table; a non-empty table
    /// replaces it.
    #[serde(default)]
    pub naics: HashMap<String, String>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Width of the posting-date window, ending today.
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Stop after this many records.
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            keyword: default_keyword(),
            days_back: default_days_back(),
            limit: default_limit(),
            max_records: default_max_records(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    setaside_fetch::DEFAULT_BASE_URL.into()
}
fn default_keyword() -> String {
    "software".into()
}
fn default_days_back() -> u32 {
    5
}
fn default_limit() -> usize {
    100
}
fn default_max_records() -> usize {
    500
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[filter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-sensitive substrings; a record is kept when its set-aside
    /// description contains any of them.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
        }
    }
}

fn default_markers() -> Vec<String> {
    VETERAN_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/tmp/veteran_contracts.parquet")
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket: default_bucket(),
            key: default_key(),
            region: default_region(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_bucket() -> String {
    "cleo-samgov-etl".into()
}
fn default_key() -> String {
    "contracts/veteran_contracts.parquet".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_crawler")]
    pub crawler: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            crawler: default_crawler(),
        }
    }
}

fn default_crawler() -> String {
    "samgov-crawler".into()
}

/// `[query]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_database")]
    pub database: String,

    /// Lowest recency score included in the sample query (1-5).
    #[serde(default = "default_min_score")]
    pub min_score: u8,

    #[serde(default = "default_query_limit")]
    pub limit: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for the query after this long.
    #[serde(default = "default_query_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database: default_database(),
            min_score: default_min_score(),
            limit: default_query_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_database() -> String {
    "samgov_data".into()
}
fn default_min_score() -> u8 {
    4
}
fn default_query_limit() -> u32 {
    10
}
fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_query_timeout_secs() -> u64 {
    300
}

// ---------------------------------------------------------------------------
// Loading and derived values
// ---------------------------------------------------------------------------

impl PipelineConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.limit == 0 {
            bail!("search.limit must be positive");
        }
        if self.search.max_records == 0 {
            bail!("search.max_records must be positive");
        }
        if !(1..=5).contains(&self.query.min_score) {
            bail!(
                "query.min_score must be between 1 and 5, got {}",
                self.query.min_score
            );
        }
        Ok(())
    }

    /// Turn off every remote stage after the local Parquet write.
    pub fn local_only(&mut self) {
        self.publish.enabled = false;
        self.catalog.enabled = false;
        self.query.enabled = false;
    }

    /// Whether any stage needs AWS clients.
    pub fn needs_aws(&self) -> bool {
        self.publish.enabled || self.catalog.enabled || self.query.enabled
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            keyword: self.search.keyword.clone(),
            days_back: self.search.days_back,
            limit: self.search.limit,
            max_records: self.search.max_records,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    pub fn naics_table(&self) -> NaicsTable {
        if self.naics.is_empty() {
            NaicsTable::default()
        } else {
            NaicsTable::from_map(self.naics.clone())
        }
    }

    pub fn destination(&self) -> Destination {
        Destination {
            bucket: self.publish.bucket.clone(),
            key: self.publish.key.clone(),
            region: self.publish.region.clone(),
        }
    }

    pub fn query_request(&self) -> QueryRequest {
        QueryRequest {
            sql: analytic_sql(self.query.min_score, self.query.limit),
            database: self.query.database.clone(),
            output_location: results_location(&self.publish.bucket),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.query.poll_interval_ms),
            timeout: Duration::from_secs(self.query.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_production_deployment() {
        let config = PipelineConfig::default();
        assert_eq!(config.search.keyword, "software");
        assert_eq!(config.search.days_back, 5);
        assert_eq!(config.search.limit, 100);
        assert_eq!(config.search.max_records, 500);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.output.path, PathBuf::from("/tmp/veteran_contracts.parquet"));
        assert_eq!(
            config.destination().uri(),
            "s3://cleo-samgov-etl/contracts/veteran_contracts.parquet"
        );
        assert_eq!(config.catalog.crawler, "samgov-crawler");
        assert_eq!(config.query.database, "samgov_data");
        assert!(config.needs_aws());
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("setaside.toml");
        std::fs::write(
            &path,
            r#"
[search]
keyword = "cloud"
max_records = 50

[naics]
"541330" = "Engineering Services"

[publish]
enabled = false
"#,
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.search.keyword, "cloud");
        assert_eq!(config.search.max_records, 50);
        assert_eq!(config.search.limit, 100);
        assert!(!config.publish.enabled);
        assert!(config.catalog.enabled);
        assert_eq!(config.filter.markers.len(), 2);

        let naics = config.naics_table();
        assert_eq!(naics.describe("541330"), "Engineering Services");
        assert_eq!(naics.describe("541511"), "Other");
    }

    #[test]
    fn no_path_means_defaults() {
        let config = PipelineConfig::load(None).unwrap();
        assert_eq!(config.naics_table(), NaicsTable::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(PipelineConfig::load(Some(Path::new("/nonexistent/setaside.toml"))).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.search.limit = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.search.max_records = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.query.min_score = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn local_only_disables_remote_stages() {
        let mut config = PipelineConfig::default();
        config.local_only();
        assert!(!config.needs_aws());
    }

    #[test]
    fn query_request_from_config() {
        let request = PipelineConfig::default().query_request();
        assert_eq!(request.database, "samgov_data");
        assert_eq!(request.output_location, "s3://cleo-samgov-etl/athena_results/");
        assert!(request.sql.contains("FROM contracts"));
        assert!(request.sql.contains("recencyScore >= 4"));
        assert_eq!(PipelineConfig::default().poll_policy(), PollPolicy::default());
    }
}
