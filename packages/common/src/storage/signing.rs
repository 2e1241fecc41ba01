use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::StorageError;
use super::key::ObjectKey;

type HmacSha256 = Hmac<Sha256>;

/// Expiry and signature query parameters of a presigned local upload URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpload {
    /// Unix timestamp (seconds) after which the URL is rejected.
    pub expires: i64,
    /// Hex-encoded HMAC-SHA256 over `PUT\n{key}\n{expires}`.
    pub signature: String,
}

/// Signs and verifies upload URLs for the filesystem object store.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, key: &ObjectKey, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Config(format!("invalid signing secret: {e}")))?;
        mac.update(format!("PUT\n{key}\n{expires}").as_bytes());
        Ok(mac)
    }

    /// Sign an upload of `key` valid until `expires`.
    pub fn sign(&self, key: &ObjectKey, expires: i64) -> Result<String, StorageError> {
        let mac = self.mac(key, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Sign an upload of `key` valid for `expires_in` from now.
    pub fn sign_for(
        &self,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> Result<SignedUpload, StorageError> {
        let expires = Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(SignedUpload {
            expires,
            signature: self.sign(key, expires)?,
        })
    }

    /// Verify a signature at time `now` (Unix seconds).
    pub fn verify_at(
        &self,
        key: &ObjectKey,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), StorageError> {
        if now > expires {
            return Err(StorageError::Expired(expires));
        }
        let provided = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
        self.mac(key, expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature)
    }

    /// Verify a signature against the current time.
    pub fn verify(&self, key: &ObjectKey, expires: i64, signature: &str) -> Result<(), StorageError> {
        self.verify_at(key, expires, signature, Utc::now().timestamp())
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}
