use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::key::ObjectKey;
use super::signing::UrlSigner;
use super::traits::{BoxReader, ObjectInfo, ObjectStore};
use crate::procedures::LOCAL_OBJECTS;

/// Filesystem-backed object store for local development.
///
/// Objects live in a flat directory, one file per key:
/// `{root}/{millis}-{uuid}`. Presigned URLs point at the server's own
/// `/objects/{key}` route and carry an HMAC signature checked by
/// [`FilesystemObjectStore::verify_upload`].
pub struct FilesystemObjectStore {
    root: PathBuf,
    max_size: u64,
    public_base_url: String,
    signer: UrlSigner,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store, creating `root` if needed.
    pub async fn new(
        root: PathBuf,
        max_size: u64,
        public_base_url: &str,
        signer: UrlSigner,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            max_size,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    fn object_path(&self, key: &ObjectKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.public_base_url, LOCAL_OBJECTS, key)
    }

    /// Check the `expires` and `signature` query parameters of an upload.
    pub fn verify_upload(
        &self,
        key: &ObjectKey,
        expires: i64,
        signature: &str,
    ) -> Result<(), StorageError> {
        self.signer.verify(key, expires, signature)
    }

    /// Store data from an async reader under `key`, replacing any previous
    /// object. Returns the number of bytes written.
    pub async fn put_stream(
        &self,
        key: &ObjectKey,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, self.object_path(key)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(total_bytes)
    }

    /// Store a byte slice under `key`.
    pub async fn put(&self, key: &ObjectKey, data: &[u8]) -> Result<u64, StorageError> {
        let reader: BoxReader = Box::new(std::io::Cursor::new(data.to_vec()));
        self.put_stream(key, reader).await
    }

    /// Retrieve an object as a streaming async reader.
    pub async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.object_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Retrieve all bytes of an object.
    pub async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn presign_put(
        &self,
        key: &ObjectKey,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let signed = self.signer.sign_for(key, expires_in)?;
        Ok(format!(
            "{}?expires={}&signature={}",
            self.object_url(key.as_str()),
            signed.expires,
            signed.signature
        ))
    }

    async fn list(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Skips `.tmp` and anything not written through this store.
            if ObjectKey::parse(name).is_err() {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            objects.push(ObjectInfo {
                key: name.to_string(),
                size: meta.len(),
                uploaded_at: meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now()),
            });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(self.object_url(key))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FilesystemObjectStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(
            dir.path().join("objects"),
            1024,
            "http://localhost:4000/",
            UrlSigner::new("test-secret"),
        )
        .await
        .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (store, _dir) = temp_store().await;
        let key = ObjectKey::generate();
        assert_eq!(store.put(&key, b"hello world").await.unwrap(), 11);
        assert_eq!(store.get(&key).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn size_limit_enforced_and_temp_cleaned() {
        let (store, dir) = temp_store().await;
        let key = ObjectKey::generate();
        let result = store.put(&key, &[0u8; 2048]).await;
        assert!(matches!(
            result,
            Err(StorageError::SizeLimitExceeded { limit: 1024, .. })
        ));

        let tmp_entries: Vec<_> = std::fs::read_dir(dir.path().join("objects/.tmp"))
            .unwrap()
            .collect();
        assert_eq!(tmp_entries.len(), 0);
        assert!(matches!(
            store.get(&key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_reports_objects_and_skips_foreign_files() {
        let (store, dir) = temp_store().await;
        let a = ObjectKey::generate();
        let b = ObjectKey::generate();
        store.put(&a, b"aaa").await.unwrap();
        store.put(&b, b"bb").await.unwrap();
        std::fs::write(dir.path().join("objects/notes.txt"), b"x").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        let sizes: Vec<_> = listed
            .iter()
            .map(|o| (o.key.clone(), o.size))
            .collect();
        assert!(sizes.contains(&(a.to_string(), 3)));
        assert!(sizes.contains(&(b.to_string(), 2)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _dir) = temp_store().await;
        let key = ObjectKey::generate();
        store.put(&key, b"bye").await.unwrap();

        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn presigned_url_verifies() {
        let (store, _dir) = temp_store().await;
        let key = ObjectKey::generate();
        let url = store
            .presign_put(&key, "image/png", Duration::from_secs(3600))
            .await
            .unwrap();

        let prefix = format!("http://localhost:4000/objects/{key}?expires=");
        assert!(url.starts_with(&prefix), "unexpected url {url}");

        let query = &url[url.find('?').unwrap() + 1..];
        let mut expires = 0;
        let mut signature = "";
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse().unwrap(),
                Some(("signature", v)) => signature = v,
                _ => {}
            }
        }
        assert!(store.verify_upload(&key, expires, signature).is_ok());
        assert!(store.verify_upload(&key, expires + 1, signature).is_err());
    }

    #[tokio::test]
    async fn public_url_points_at_object_route() {
        let (store, _dir) = temp_store().await;
        assert_eq!(
            store.public_url("k").as_deref(),
            Some("http://localhost:4000/objects/k")
        );
    }

    #[tokio::test]
    async fn constructor_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("deep/nested/objects");
        assert!(!base.exists());

        let _store =
            FilesystemObjectStore::new(base.clone(), 1024, "http://x", UrlSigner::new("s"))
                .await
                .unwrap();

        assert!(base.exists());
        assert!(base.join(".tmp").exists());
    }
}
