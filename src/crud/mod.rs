//! Client for the metadata (CRUD) service that records which file belongs
//! to which entity.

pub mod client;
pub mod types;

pub use client::{CrudClient, MetadataResolver};
pub use types::{CardImageBatchRequest, CardImageRequest, ImageRecord, ImageRecordBatch, UploadRecord};
