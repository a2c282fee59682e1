use chrono::{DateTime, Utc};
use futures::Stream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::model::{UploadOptions, UploadProgress};
use super::store::BlobStore;
use super::thumbnail::{render_thumbnail, THUMBNAIL_EDGE};
use crate::error::UploadError;

/// An upload running in the background.
///
/// Progress is a finite stream that ends once the transfer settles;
/// `finish` yields the durable URL. Cancellation is observed between parts.
pub struct UploadHandle {
    path: String,
    progress: mpsc::UnboundedReceiver<UploadProgress>,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<Result<String, UploadError>>,
}

impl UploadHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn progress(&mut self) -> impl Stream<Item = UploadProgress> + '_ {
        futures::stream::poll_fn(move |cx| self.progress.poll_recv(cx))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub async fn finish(self) -> Result<String, UploadError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(UploadError::Interrupted(format!("upload task failed: {}", e))),
        }
    }
}

/// Stream `bytes` to `path` in parts. Must be called inside a Tokio runtime.
pub fn upload_image(
    store: Arc<dyn BlobStore>,
    bytes: Vec<u8>,
    path: String,
    content_type: String,
    options: UploadOptions,
) -> UploadHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancelled = Arc::new(AtomicBool::new(false));

    let task = tokio::spawn(run_upload(
        store,
        bytes,
        path.clone(),
        content_type,
        options.part_size.max(1),
        cancelled.clone(),
        tx,
    ));

    UploadHandle {
        path,
        progress: rx,
        cancelled,
        task,
    }
}

async fn abort_quietly(store: &dyn BlobStore, path: &str, upload_id: &str) {
    if let Err(e) = store.abort(path, upload_id).await {
        tracing::warn!(path = %path, "failed to abort multipart upload: {}", e);
    }
}

async fn run_upload(
    store: Arc<dyn BlobStore>,
    bytes: Vec<u8>,
    path: String,
    content_type: String,
    part_size: usize,
    cancelled: Arc<AtomicBool>,
    progress: mpsc::UnboundedSender<UploadProgress>,
) -> Result<String, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Rejected("no bytes to upload".to_string()));
    }

    let total_bytes = bytes.len() as u64;
    let upload_id = store.begin(&path, &content_type).await?;

    // Nobody listening is fine, send errors are ignored throughout
    let _ = progress.send(UploadProgress {
        bytes_sent: 0,
        total_bytes,
    });

    let mut parts = Vec::new();
    let mut bytes_sent = 0u64;

    for (index, chunk) in bytes.chunks(part_size).enumerate() {
        if cancelled.load(Ordering::SeqCst) {
            abort_quietly(store.as_ref(), &path, &upload_id).await;
            tracing::info!(path = %path, "upload cancelled");
            return Err(UploadError::Cancelled);
        }

        let part_number = index as i32 + 1;
        match store.put_part(&path, &upload_id, part_number, chunk.to_vec()).await {
            Ok(part) => parts.push(part),
            Err(e) => {
                tracing::error!(path = %path, part_number, "upload part failed: {}", e);
                abort_quietly(store.as_ref(), &path, &upload_id).await;
                return Err(match e {
                    UploadError::Interrupted(_) => e,
                    other => UploadError::Interrupted(other.to_string()),
                });
            }
        }

        bytes_sent += chunk.len() as u64;
        let _ = progress.send(UploadProgress {
            bytes_sent,
            total_bytes,
        });
    }

    if cancelled.load(Ordering::SeqCst) {
        abort_quietly(store.as_ref(), &path, &upload_id).await;
        return Err(UploadError::Cancelled);
    }

    if let Err(e) = store.complete(&path, &upload_id, parts).await {
        abort_quietly(store.as_ref(), &path, &upload_id).await;
        return Err(e);
    }

    tracing::info!(path = %path, total_bytes, "upload complete");
    Ok(store.public_url(&path))
}

pub async fn delete_image(store: &dyn BlobStore, path: &str) -> Result<(), UploadError> {
    store.delete(path).await?;
    tracing::info!(path = %path, "image deleted");
    Ok(())
}

/// Render and store a thumbnail next to the original, returning
/// `(thumbnail_path, thumbnail_url)`. Any failure is logged and yields `None`.
pub async fn store_thumbnail(
    store: Arc<dyn BlobStore>,
    original: Vec<u8>,
    path: &str,
) -> Option<(String, String)> {
    let rendered = tokio::task::spawn_blocking(move || render_thumbnail(&original, THUMBNAIL_EDGE)).await;

    let bytes = match rendered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!(path = %path, "thumbnail skipped: {}", e);
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path, "thumbnail task failed: {}", e);
            return None;
        }
    };

    let thumb_path = thumbnail_path(path);
    let handle = upload_image(
        store,
        bytes,
        thumb_path.clone(),
        "image/jpeg".to_string(),
        UploadOptions::default(),
    );

    match handle.finish().await {
        Ok(url) => Some((thumb_path, url)),
        Err(e) => {
            tracing::warn!(path = %thumb_path, "thumbnail upload failed: {}", e);
            None
        }
    }
}

/// `artworks/{unix_millis}_{name}`. Anything outside `[A-Za-z0-9._-]` is
/// collapsed to `_`, so keys and their public URLs never need escaping.
pub fn storage_path(file_name: &str, now: DateTime<Utc>) -> String {
    let mut clean = String::with_capacity(file_name.len());
    let mut in_gap = false;
    for c in file_name.chars() {
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')) {
            if !in_gap {
                clean.push('_');
            }
            in_gap = true;
        } else {
            clean.push(c);
            in_gap = false;
        }
    }
    format!("artworks/{}_{}", now.timestamp_millis(), clean)
}

/// `artworks/123_sea.png` -> `thumbnails/123_sea.jpg`
pub fn thumbnail_path(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    format!("thumbnails/{}.jpg", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::model::CompletedChunk;
    use crate::memory::InMemoryBlobStore;
    use chrono::TimeZone;
    use futures::StreamExt;

    #[test]
    fn storage_path_collapses_whitespace() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            storage_path("Blue  hour\tstudy.jpg", now),
            "artworks/1700000000123_Blue_hour_study.jpg"
        );
        assert_eq!(storage_path("../x.png", now), "artworks/1700000000123_.._x.png");
    }

    #[test]
    fn storage_path_strips_url_unsafe_characters() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            storage_path("été 50%?#1.png", now),
            "artworks/1700000000123__t_50_1.png"
        );
        assert_eq!(storage_path("a-b_c.jpg", now), "artworks/1700000000123_a-b_c.jpg");
    }

    #[test]
    fn thumbnail_path_swaps_prefix_and_extension() {
        assert_eq!(thumbnail_path("artworks/1_sea.png"), "thumbnails/1_sea.jpg");
        assert_eq!(thumbnail_path("artworks/1_noext"), "thumbnails/1_noext.jpg");
    }

    #[tokio::test]
    async fn reports_progress_per_part_and_resolves_to_url() {
        let store = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let mut handle = upload_image(
            store.clone(),
            vec![7u8; 10],
            "artworks/1_a.png".to_string(),
            "image/png".to_string(),
            UploadOptions { part_size: 4 },
        );

        let seen: Vec<u64> = handle.progress().map(|p| p.bytes_sent).collect().await;
        assert_eq!(seen, vec![0, 4, 8, 10]);

        let url = handle.finish().await.unwrap();
        assert_eq!(url, "https://cdn.example/artworks/1_a.png");
        assert_eq!(store.object("artworks/1_a.png").unwrap(), vec![7u8; 10]);
    }

    #[tokio::test]
    async fn failed_part_interrupts_and_aborts() {
        let store = Arc::new(InMemoryBlobStore::new("https://cdn.example").failing_on_part(2));
        let handle = upload_image(
            store.clone(),
            vec![1u8; 12],
            "artworks/2_b.png".to_string(),
            "image/png".to_string(),
            UploadOptions { part_size: 5 },
        );

        let err = handle.finish().await.unwrap_err();
        assert!(matches!(err, UploadError::Interrupted(_)));
        assert!(store.object("artworks/2_b.png").is_none());
        assert_eq!(store.aborted(), vec!["artworks/2_b.png".to_string()]);
    }

    #[tokio::test]
    async fn cancel_before_first_part_aborts() {
        let store = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let handle = upload_image(
            store.clone(),
            vec![1u8; 12],
            "artworks/3_c.png".to_string(),
            "image/png".to_string(),
            UploadOptions { part_size: 5 },
        );
        handle.cancel();

        assert_eq!(handle.finish().await.unwrap_err(), UploadError::Cancelled);
        assert!(store.object("artworks/3_c.png").is_none());
        assert_eq!(store.aborted().len(), 1);
    }

    /// Holds `put_part` for one part number until released.
    struct GatedBlobStore {
        inner: InMemoryBlobStore,
        gated_part: i32,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl BlobStore for GatedBlobStore {
        async fn begin(&self, path: &str, content_type: &str) -> Result<String, UploadError> {
            self.inner.begin(path, content_type).await
        }

        async fn put_part(
            &self,
            path: &str,
            upload_id: &str,
            part_number: i32,
            chunk: Vec<u8>,
        ) -> Result<CompletedChunk, UploadError> {
            if part_number == self.gated_part {
                self.release.notified().await;
            }
            self.inner.put_part(path, upload_id, part_number, chunk).await
        }

        async fn complete(
            &self,
            path: &str,
            upload_id: &str,
            parts: Vec<CompletedChunk>,
        ) -> Result<(), UploadError> {
            self.inner.complete(path, upload_id, parts).await
        }

        async fn abort(&self, path: &str, upload_id: &str) -> Result<(), UploadError> {
            self.inner.abort(path, upload_id).await
        }

        async fn delete(&self, path: &str) -> Result<(), UploadError> {
            self.inner.delete(path).await
        }

        fn public_url(&self, path: &str) -> String {
            self.inner.public_url(path)
        }
    }

    #[tokio::test]
    async fn cancel_between_parts_aborts_without_storing() {
        let store = Arc::new(GatedBlobStore {
            inner: InMemoryBlobStore::new("https://cdn.example"),
            gated_part: 2,
            release: tokio::sync::Notify::new(),
        });
        let mut handle = upload_image(
            store.clone(),
            vec![3u8; 12],
            "artworks/6_f.png".to_string(),
            "image/png".to_string(),
            UploadOptions { part_size: 4 },
        );

        {
            let mut progress = handle.progress();
            assert_eq!(progress.next().await.map(|p| p.bytes_sent), Some(0));
            assert_eq!(progress.next().await.map(|p| p.bytes_sent), Some(4));
        }

        handle.cancel();
        store.release.notify_one();

        assert_eq!(handle.finish().await.unwrap_err(), UploadError::Cancelled);
        assert!(store.inner.object("artworks/6_f.png").is_none());
        assert_eq!(store.inner.aborted(), vec!["artworks/6_f.png".to_string()]);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let store = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let handle = upload_image(
            store,
            Vec::new(),
            "artworks/4_d.png".to_string(),
            "image/png".to_string(),
            UploadOptions::default(),
        );
        assert!(matches!(handle.finish().await, Err(UploadError::Rejected(_))));
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let store = InMemoryBlobStore::new("https://cdn.example");
        store.insert_object("artworks/5_e.png", vec![1, 2, 3]);
        delete_image(&store, "artworks/5_e.png").await.unwrap();
        assert!(store.object("artworks/5_e.png").is_none());
    }
}
