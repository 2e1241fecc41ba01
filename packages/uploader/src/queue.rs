use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::contract::{PresignRequest, StoredObject};
use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::error::UploadError;
use crate::file::FileHandle;
use crate::policy::{Rejection, SuccessPolicy, UploadPolicy};
use crate::preview::{NoPreviews, Preview, PreviewProvider};
use crate::services::{PresignService, ProgressFn, StorageService, Transfer};

pub type FileId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

impl FileStatus {
    /// Whether a new upload attempt may start from this status.
    pub fn is_eligible(self) -> bool {
        matches!(self, FileStatus::Idle | FileStatus::Error)
    }
}

struct QueuedFile {
    id: FileId,
    file: FileHandle,
    status: FileStatus,
    progress: u8,
    preview: Preview,
}

impl QueuedFile {
    /// Progress only moves forward while a transfer runs.
    fn advance(&mut self, progress: u8) {
        if self.status == FileStatus::Uploading {
            self.progress = self.progress.max(progress.min(100));
        }
    }
}

/// Read-only snapshot of a queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFileView {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub status: FileStatus,
    pub progress: u8,
    pub preview: String,
}

impl From<&QueuedFile> for QueuedFileView {
    fn from(q: &QueuedFile) -> Self {
        Self {
            id: q.id,
            name: q.file.name().to_string(),
            size: q.file.size(),
            content_type: q.file.content_type().to_string(),
            status: q.status,
            progress: q.progress,
            preview: q.preview.handle().to_string(),
        }
    }
}

/// A user-visible message, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }
}

#[derive(Debug, Default)]
pub struct EnqueueOutcome {
    pub accepted: Vec<FileId>,
    pub rejected: Vec<Rejection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueOutcome {
    Removed,
    /// The entry is uploading or already uploaded.
    Blocked(FileStatus),
    NotFound,
}

/// Result of one [`UploadQueue::start_upload`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the stored object list was refetched successfully.
    pub refreshed: bool,
}

/// One file of an in-flight batch, captured when the batch starts.
struct BatchEntry {
    id: FileId,
    file: FileHandle,
    prior: FileStatus,
}

/// Keeps the in-flight batch counter accurate on every exit path.
struct BatchGuard<'a>(&'a AtomicUsize);

impl<'a> BatchGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client-side queue of files awaiting a direct upload.
///
/// Files move `idle → uploading → success | error`; `error` files are retried
/// by the next batch and `success` is terminal. The queue lock is never held
/// across an await: a batch flips its files to `uploading` before the first
/// suspension point, so overlapping batches never pick up the same file.
pub struct UploadQueue {
    files: Arc<Mutex<Vec<QueuedFile>>>,
    batches: AtomicUsize,
    pending_delete: Mutex<Option<String>>,
    policy: UploadPolicy,
    presigner: Arc<dyn PresignService>,
    storage: Arc<dyn StorageService>,
    transfer: Arc<dyn Transfer>,
    previews: Arc<dyn PreviewProvider>,
    cache: Arc<QueryCache>,
    notices: broadcast::Sender<Notice>,
}

impl UploadQueue {
    pub fn new(
        presigner: Arc<dyn PresignService>,
        storage: Arc<dyn StorageService>,
        transfer: Arc<dyn Transfer>,
        cache: Arc<QueryCache>,
    ) -> Self {
        let (notices, _) = broadcast::channel(256);
        Self {
            files: Arc::new(Mutex::new(Vec::new())),
            batches: AtomicUsize::new(0),
            pending_delete: Mutex::new(None),
            policy: UploadPolicy::default(),
            presigner,
            storage,
            transfer,
            previews: Arc::new(NoPreviews),
            cache,
            notices,
        }
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_previews(mut self, previews: Arc<dyn PreviewProvider>) -> Self {
        self.previews = previews;
        self
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Whether a batch is in flight.
    pub fn is_uploading(&self) -> bool {
        self.batches.load(Ordering::SeqCst) > 0
    }

    /// Snapshot of the queue in insertion order.
    pub fn files(&self) -> Vec<QueuedFileView> {
        lock(&self.files).iter().map(QueuedFileView::from).collect()
    }

    pub fn file(&self, id: FileId) -> Option<QueuedFileView> {
        lock(&self.files)
            .iter()
            .find(|q| q.id == id)
            .map(QueuedFileView::from)
    }

    /// The last fetched stored object list.
    pub fn stored_objects(&self) -> Option<Vec<StoredObject>> {
        self.cache.get(QueryKey::StorageList)
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.notices.send(notice);
    }

    /// Admit files that pass the policy. Every rejected file produces exactly
    /// one error notice and never enters the queue.
    pub fn enqueue(&self, files: impl IntoIterator<Item = FileHandle>) -> EnqueueOutcome {
        let mut outcome = EnqueueOutcome::default();
        let mut admitted = Vec::new();

        for file in files {
            if let Err(rejection) = self.policy.check(&file) {
                warn!(file = %rejection.name, "{rejection}");
                self.notify(Notice::Error(rejection.to_string()));
                outcome.rejected.push(rejection);
                continue;
            }
            let id = Uuid::new_v4();
            let preview = Preview::new(self.previews.clone(), &file);
            outcome.accepted.push(id);
            admitted.push(QueuedFile {
                id,
                file,
                status: FileStatus::Idle,
                progress: 0,
                preview,
            });
        }

        lock(&self.files).extend(admitted);
        outcome
    }

    /// Remove a file that is not uploading and not yet uploaded.
    pub fn dequeue(&self, id: FileId) -> DequeueOutcome {
        let removed = {
            let mut files = lock(&self.files);
            let Some(index) = files.iter().position(|q| q.id == id) else {
                return DequeueOutcome::NotFound;
            };
            let status = files[index].status;
            if !status.is_eligible() {
                return DequeueOutcome::Blocked(status);
            }
            files.remove(index)
        };
        // Releases the preview outside the lock.
        drop(removed);
        DequeueOutcome::Removed
    }

    /// Upload every `idle` or `error` file.
    ///
    /// Presigns the whole batch in one call, transfers every file
    /// concurrently, then refetches the stored object list once. A failed
    /// transfer only affects its own file. A failed presign call restores
    /// the batch to its previous statuses and is returned as an error.
    #[instrument(skip(self))]
    pub async fn start_upload(&self) -> Result<UploadReport, UploadError> {
        let batch = self.claim_eligible();
        if batch.is_empty() {
            return Ok(UploadReport::default());
        }
        let _in_flight = BatchGuard::enter(&self.batches);

        let requests: Vec<PresignRequest> = batch
            .iter()
            .map(|entry| PresignRequest {
                filename: entry.file.name().to_string(),
                content_type: entry.file.content_type().to_string(),
            })
            .collect();

        let destinations = match self.presigner.presign(&requests).await {
            Ok(destinations) => destinations,
            Err(e) => {
                self.restore(&batch);
                self.notify(Notice::Error(format!("Failed to prepare upload: {e}")));
                return Err(UploadError::Presign(e));
            }
        };
        if destinations.len() != batch.len() {
            warn!(
                requested = batch.len(),
                received = destinations.len(),
                "Presign answer does not match the request"
            );
        }

        let mut report = UploadReport {
            attempted: batch.len(),
            ..Default::default()
        };

        let mut transfers = Vec::new();
        for (index, entry) in batch.iter().enumerate() {
            match destinations.get(index) {
                Some(destination) => transfers.push(self.transfer_one(entry, &destination.url)),
                None => {
                    warn!(file = %entry.file.name(), "No upload destination");
                    self.finish(entry.id, false);
                    report.failed += 1;
                }
            }
        }

        for ok in join_all(transfers).await {
            if ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.succeeded > 0 {
            self.notify(Notice::Success(format!(
                "Uploaded {} of {} file(s)",
                report.succeeded, report.attempted
            )));
        }
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "Upload batch settled"
        );

        self.cache.invalidate(QueryKey::StorageList);
        report.refreshed = match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                self.notify(Notice::Error(e.to_string()));
                false
            }
        };

        Ok(report)
    }

    /// Flip every eligible file to `uploading` and capture the batch.
    fn claim_eligible(&self) -> Vec<BatchEntry> {
        let mut files = lock(&self.files);
        files
            .iter_mut()
            .filter(|q| q.status.is_eligible())
            .map(|q| {
                let prior = q.status;
                q.status = FileStatus::Uploading;
                q.progress = 0;
                BatchEntry {
                    id: q.id,
                    file: q.file.clone(),
                    prior,
                }
            })
            .collect()
    }

    fn restore(&self, batch: &[BatchEntry]) {
        let mut files = lock(&self.files);
        for entry in batch {
            if let Some(q) = files.iter_mut().find(|q| q.id == entry.id) {
                q.status = entry.prior;
                q.progress = 0;
            }
        }
    }

    async fn transfer_one(&self, entry: &BatchEntry, url: &str) -> bool {
        let files = self.files.clone();
        let id = entry.id;
        let on_progress: ProgressFn = Arc::new(move |progress| {
            if let Some(q) = lock(&files).iter_mut().find(|q| q.id == id) {
                q.advance(progress);
            }
        });

        match self.transfer.put(url, &entry.file, on_progress).await {
            Ok(()) => {
                info!(file = %entry.file.name(), "Uploaded");
                self.finish(id, true);
                true
            }
            Err(e) => {
                warn!(file = %entry.file.name(), "{e}");
                self.notify(Notice::Error(format!(
                    "Upload of {} failed: {e}",
                    entry.file.name()
                )));
                self.finish(id, false);
                false
            }
        }
    }

    fn finish(&self, id: FileId, ok: bool) {
        let pruned = {
            let mut files = lock(&self.files);
            let Some(index) = files.iter().position(|q| q.id == id) else {
                return;
            };
            match (ok, self.policy.on_success) {
                (true, SuccessPolicy::Prune) => Some(files.remove(index)),
                (true, SuccessPolicy::Retain) => {
                    files[index].status = FileStatus::Success;
                    files[index].progress = 100;
                    None
                }
                (false, _) => {
                    files[index].status = FileStatus::Error;
                    None
                }
            }
        };
        drop(pruned);
    }

    /// Refetch the stored object list into the cache.
    pub async fn refresh(&self) -> Result<Vec<StoredObject>, UploadError> {
        let objects = self.storage.list().await.map_err(UploadError::Refresh)?;
        if let Err(e) = self.cache.put(QueryKey::StorageList, &objects) {
            warn!("Failed to cache stored objects: {e}");
        }
        Ok(objects)
    }

    /// Ask to delete a stored object. Nothing happens until confirmed.
    pub fn request_delete(&self, key: impl Into<String>) {
        *lock(&self.pending_delete) = Some(key.into());
    }

    pub fn pending_delete(&self) -> Option<String> {
        lock(&self.pending_delete).clone()
    }

    /// Drop the pending deletion, returning its key.
    pub fn cancel_delete(&self) -> Option<String> {
        lock(&self.pending_delete).take()
    }

    /// Delete the object awaiting confirmation and refetch the list.
    ///
    /// On failure the deletion stays pending. Queued files are never touched.
    #[instrument(skip(self))]
    pub async fn confirm_delete(&self) -> Result<String, UploadError> {
        let key = lock(&self.pending_delete)
            .take()
            .ok_or(UploadError::NoPendingDelete)?;

        if let Err(source) = self.storage.delete(&key).await {
            self.notify(Notice::Error(format!("Failed to delete file: {source}")));
            let mut pending = lock(&self.pending_delete);
            if pending.is_none() {
                *pending = Some(key.clone());
            }
            return Err(UploadError::Delete { key, source });
        }

        info!(%key, "Deleted stored file");
        self.cache.invalidate(QueryKey::StorageList);
        self.notify(Notice::Success("File deleted successfully".into()));
        if let Err(e) = self.refresh().await {
            self.notify(Notice::Error(e.to_string()));
        }
        Ok(key)
    }
}
