//! Image storage and the gateway operations built on it.
//!
//! This module reads and writes image files under the resources root and
//! coordinates them with the metadata records kept by the `crud` service.

mod gateway;
mod storage;
mod types;

pub use gateway::{ImageGateway, UPLOADED_FILE_NAME};
pub use storage::{ImageStorage, StoredImage, DEFAULT_SENTINEL};
pub use types::{ImageBytes, ImageBytesBatch, UploadBatch, UploadItem};
