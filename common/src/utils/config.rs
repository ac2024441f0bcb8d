use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Remote,
    Local,
    Memory,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Remote
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,
    #[serde(default = "default_bucket_endpoint")]
    pub bucket_endpoint: String,
    #[serde(default = "default_bucket_region")]
    pub bucket_region: String,
    #[serde(default)]
    pub bucket_access_key: String,
    #[serde(default)]
    pub bucket_secret_key: String,
    #[serde(default)]
    pub file_prefix: String,
    /// Comma-separated allow-list of file extensions, e.g. ".pdf,.docx,.txt".
    #[serde(default = "default_file_extensions")]
    pub file_extensions: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default = "default_vector_db_url")]
    pub vector_db_url: String,
    #[serde(default)]
    pub vector_db_api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default = "default_vector_db_id")]
    pub vector_db_id: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
}

fn default_bucket_name() -> String {
    "documents".to_string()
}

fn default_bucket_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_bucket_region() -> String {
    "us-east-1".to_string()
}

fn default_file_extensions() -> String {
    ".pdf".to_string()
}

fn default_max_files() -> usize {
    100
}

fn default_download_dir() -> String {
    "/tmp/documents".to_string()
}

fn default_vector_db_url() -> String {
    "http://localhost:8321".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_provider_id() -> String {
    "pgvector".to_string()
}

fn default_vector_db_id() -> String {
    "pgvector".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl AppConfig {
    /// Splits the comma-separated extension allow-list into its entries.
    pub fn extension_list(&self) -> Vec<String> {
        parse_extensions(&self.file_extensions)
    }
}

/// Parses a comma-separated extension list, discarding empty entries.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
