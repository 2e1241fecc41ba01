use std::path::PathBuf;

use common::storage::DEFAULT_PRESIGN_EXPIRY_SECS;
use common::storage::s3::S3Settings;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Empty means no cross-origin access.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KvConfig {
    pub namespace: String,
}

/// Cloudflare R2 (or any S3-compatible) bucket binding.
///
/// Every credential field is optional so a partially configured binding can
/// be loaded; storage procedures answer `PRECONDITION_FAILED` until all of
/// `account_id`, `access_key_id`, `secret_access_key` and `bucket_name` are set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct R2Config {
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket_name: Option<String>,
    pub public_domain: Option<String>,
    pub endpoint: Option<String>,
}

impl R2Config {
    pub fn settings(&self) -> Option<S3Settings> {
        fn present(v: &Option<String>) -> Option<String> {
            v.as_ref().filter(|s| !s.trim().is_empty()).cloned()
        }

        Some(S3Settings {
            account_id: present(&self.account_id)?,
            access_key_id: present(&self.access_key_id)?,
            secret_access_key: present(&self.secret_access_key)?,
            bucket_name: present(&self.bucket_name)?,
            public_domain: present(&self.public_domain),
            endpoint: present(&self.endpoint),
        })
    }
}

/// Local object storage served by this server under `/objects`.
#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    pub root: PathBuf,
    /// Base URL clients use to reach this server, e.g. `http://127.0.0.1:4000`.
    pub public_base_url: String,
    pub signing_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Validity of presigned upload URLs in seconds.
    pub presign_expiry_secs: u64,
    /// Upper bound for objects written through the local backend.
    pub max_object_size: u64,
    pub r2: Option<R2Config>,
    pub filesystem: Option<FilesystemStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            max_object_size: 10 * 1024 * 1024,
            r2: None,
            filesystem: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub kv: Option<KvConfig>,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4000)?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.presign_expiry_secs", DEFAULT_PRESIGN_EXPIRY_SECS)?
            .set_default("storage.max_object_size", 10 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., NN_STACK__STORAGE__R2__BUCKET_NAME)
            .add_source(
                Environment::with_prefix("NN_STACK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
