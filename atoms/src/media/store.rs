use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as S3Client;

use super::model::CompletedChunk;
use crate::error::UploadError;

/// Object storage addressed by path, with multipart uploads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Start a multipart upload and return its upload id.
    async fn begin(&self, path: &str, content_type: &str) -> Result<String, UploadError>;

    async fn put_part(
        &self,
        path: &str,
        upload_id: &str,
        part_number: i32,
        chunk: Vec<u8>,
    ) -> Result<CompletedChunk, UploadError>;

    async fn complete(
        &self,
        path: &str,
        upload_id: &str,
        parts: Vec<CompletedChunk>,
    ) -> Result<(), UploadError>;

    async fn abort(&self, path: &str, upload_id: &str) -> Result<(), UploadError>;

    async fn delete(&self, path: &str) -> Result<(), UploadError>;

    /// Durable URL the object is served from once complete.
    fn public_url(&self, path: &str) -> String;
}

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn begin(&self, path: &str, content_type: &str) -> Result<String, UploadError> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .cache_control("public, max-age=31536000, immutable")
            .send()
            .await
            .map_err(|e| {
                UploadError::Backend(format!("S3 create_multipart_upload error: {}", DisplayErrorContext(&e)))
            })?;

        output
            .upload_id()
            .map(|id| id.to_string())
            .ok_or_else(|| UploadError::Backend("S3 returned no upload id".to_string()))
    }

    async fn put_part(
        &self,
        path: &str,
        upload_id: &str,
        part_number: i32,
        chunk: Vec<u8>,
    ) -> Result<CompletedChunk, UploadError> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(chunk))
            .send()
            .await
            .map_err(|e| {
                UploadError::Interrupted(format!("S3 upload_part {} error: {}", part_number, DisplayErrorContext(&e)))
            })?;

        let etag = output
            .e_tag()
            .ok_or_else(|| UploadError::Backend(format!("S3 returned no ETag for part {}", part_number)))?;

        Ok(CompletedChunk {
            part_number,
            etag: etag.to_string(),
        })
    }

    async fn complete(
        &self,
        path: &str,
        upload_id: &str,
        parts: Vec<CompletedChunk>,
    ) -> Result<(), UploadError> {
        let completed: Vec<CompletedPart> = parts
            .into_iter()
            .map(|p| CompletedPart::builder().part_number(p.part_number).e_tag(p.etag).build())
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(completed)).build())
            .send()
            .await
            .map_err(|e| {
                UploadError::Backend(format!("S3 complete_multipart_upload error: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn abort(&self, path: &str, upload_id: &str) -> Result<(), UploadError> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| {
                UploadError::Backend(format!("S3 abort_multipart_upload error: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), UploadError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| UploadError::Backend(format!("S3 delete_object error: {}", DisplayErrorContext(&e))))?;

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }
}
