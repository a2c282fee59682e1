// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;
pub mod store;
pub mod thumbnail;

pub use http::*;
pub use model::{check_image, CompletedChunk, StoredImage, UploadOptions, UploadProgress, MAX_IMAGE_BYTES};
pub use service::*;
pub use store::{BlobStore, S3BlobStore};
