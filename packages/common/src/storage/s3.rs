use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{ObjectInfo, ObjectStore};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Cloudflare account id; selects the R2 endpoint when no `endpoint` is set.
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// Domain serving the bucket publicly, e.g. `pub-xxxx.r2.dev`.
    pub public_domain: Option<String>,
    /// Custom endpoint for S3-compatible stores other than R2.
    pub endpoint: Option<String>,
}

/// Object store backed by an S3-compatible bucket (Cloudflare R2 by default).
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_domain: Option<String>,
}

impl S3ObjectStore {
    pub fn new(settings: S3Settings) -> Result<Self, StorageError> {
        let region = match settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: "auto".to_string(),
                endpoint,
            },
            None => Region::R2 {
                account_id: settings.account_id,
            },
        };

        let credentials = Credentials::new(
            Some(&settings.access_key_id),
            Some(&settings.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid S3 credentials: {e}")))?;

        let bucket = Bucket::new(&settings.bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid bucket settings: {e}")))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_domain: settings.public_domain.filter(|d| !d.is_empty()),
        })
    }
}

fn backend_error(err: s3::error::S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &ObjectKey,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let expiry_secs = u32::try_from(expires_in.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_put(format!("/{key}"), expiry_secs, None, None)
            .await
            .map_err(backend_error)
    }

    async fn list(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(backend_error)?;

        let objects = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|obj| {
                let uploaded_at = DateTime::parse_from_rfc3339(&obj.last_modified)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(|e| {
                        debug!(key = %obj.key, error = %e, "Unparseable last_modified");
                        DateTime::<Utc>::UNIX_EPOCH
                    });
                ObjectInfo {
                    key: obj.key,
                    size: obj.size,
                    uploaded_at,
                }
            })
            .collect();

        Ok(objects)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        let response = self
            .bucket
            .delete_object(format!("/{key}"))
            .await
            .map_err(backend_error)?;

        match response.status_code() {
            200..=299 | 404 => Ok(()),
            status => Err(StorageError::Backend(format!(
                "delete of {key} failed with status {status}"
            ))),
        }
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_domain
            .as_ref()
            .map(|domain| format!("https://{domain}/{key}"))
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
