use std::sync::Arc;
use std::time::Duration;

use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::S3ObjectStore;
use common::storage::{ObjectStore, UrlSigner};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::config::{AppConfig, StorageConfig};
use crate::error::AppError;
use crate::kv::KvNamespace;

pub const STORAGE_NOT_CONFIGURED: &str = "R2 Storage is not configured on the server.";
pub const DATABASE_NOT_CONFIGURED: &str = "Database is not configured on the server.";

/// The object storage binding.
#[derive(Clone)]
pub struct StorageBinding {
    pub store: Arc<dyn ObjectStore>,
    /// Set when objects are stored locally and uploaded through `/objects`.
    pub local: Option<Arc<FilesystemObjectStore>>,
    pub presign_expiry: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Option<DatabaseConnection>,
    pub kv: Option<Arc<KvNamespace>>,
    pub storage: Option<StorageBinding>,
}

impl AppState {
    /// Connect every binding named in `config`.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = match &config.database {
            Some(database) => Some(crate::database::init_db(&database.url).await?),
            None => {
                warn!("No database configured; users and todos are unavailable");
                None
            }
        };

        let kv = config
            .kv
            .as_ref()
            .map(|kv| Arc::new(KvNamespace::new(kv.namespace.clone())));

        let storage = init_storage(&config.storage).await?;

        Ok(Self {
            config,
            db,
            kv,
            storage,
        })
    }

    pub fn db(&self) -> Result<&DatabaseConnection, AppError> {
        self.db
            .as_ref()
            .ok_or_else(|| AppError::PreconditionFailed(DATABASE_NOT_CONFIGURED.into()))
    }

    pub fn storage(&self) -> Result<&StorageBinding, AppError> {
        self.storage
            .as_ref()
            .ok_or_else(|| AppError::PreconditionFailed(STORAGE_NOT_CONFIGURED.into()))
    }
}

/// Build the storage binding. An R2 binding takes precedence over local storage.
pub async fn init_storage(config: &StorageConfig) -> anyhow::Result<Option<StorageBinding>> {
    let presign_expiry = Duration::from_secs(config.presign_expiry_secs);

    if let Some(settings) = config.r2.as_ref().and_then(|r2| r2.settings()) {
        info!(bucket = %settings.bucket_name, "Using R2 object storage");
        let store = S3ObjectStore::new(settings)?;
        return Ok(Some(StorageBinding {
            store: Arc::new(store),
            local: None,
            presign_expiry,
        }));
    }

    if let Some(fs) = &config.filesystem {
        info!(root = %fs.root.display(), "Using local object storage");
        let store = Arc::new(
            FilesystemObjectStore::new(
                fs.root.clone(),
                config.max_object_size,
                &fs.public_base_url,
                UrlSigner::new(fs.signing_secret.clone()),
            )
            .await?,
        );
        return Ok(Some(StorageBinding {
            store: store.clone(),
            local: Some(store),
            presign_expiry,
        }));
    }

    warn!("{}", STORAGE_NOT_CONFIGURED);
    Ok(None)
}
