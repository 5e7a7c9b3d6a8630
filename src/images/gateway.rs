//! Image gateway coordinating metadata lookups with filesystem storage.
//!
//! Each operation resolves metadata first, then loads or writes bytes. Within
//! a request everything runs sequentially.

use std::collections::HashSet;
use std::sync::Arc;

use crate::crud::{MetadataResolver, UploadRecord};
use crate::error::{Error, Result};

use super::storage::ImageStorage;
use super::types::{ImageBytes, ImageBytesBatch, UploadItem};

/// File name announced for every upload.
pub const UPLOADED_FILE_NAME: &str = "UploadedImg";

/// Resolve-then-load and store-then-register operations behind the HTTP routes.
pub struct ImageGateway {
    resolver: Arc<dyn MetadataResolver>,
    storage: ImageStorage,
}

impl ImageGateway {
    pub fn new(resolver: Arc<dyn MetadataResolver>, storage: ImageStorage) -> Self {
        Self { resolver, storage }
    }

    pub fn storage(&self) -> &ImageStorage {
        &self.storage
    }

    /// Image for a single card. Fails when no path is recorded.
    pub async fn card_image(&self, entity_id: &str) -> Result<ImageBytes> {
        tracing::info!("Card image requested for entity {}", entity_id);

        let record = self.resolver.card_image(entity_id).await?;
        let bytes = self.storage.load(entity_id, &record.file_path).await?;

        tracing::debug!("Serving {} bytes for entity {}", bytes.len(), entity_id);
        Ok(ImageBytes {
            entity_id: entity_id.to_string(),
            bytes,
        })
    }

    /// One image per requested card.
    ///
    /// A resolved record without a path aborts the whole request, while
    /// entities the metadata service does not return at all are served the
    /// default image.
    pub async fn card_image_batch(&self, entity_ids: &[String]) -> Result<ImageBytesBatch> {
        let mut seen = HashSet::new();
        let requested: Vec<String> = entity_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        tracing::info!("Card images requested for {} entities", requested.len());
        if requested.is_empty() {
            return Ok(ImageBytesBatch::default());
        }

        let records = self.resolver.card_image_batch(&requested).await?;

        let mut images = Vec::with_capacity(requested.len());
        let mut served = HashSet::new();
        for record in &records {
            if record.file_path.is_empty() {
                return Err(Error::image_not_found(&record.entity_id));
            }
            if !served.insert(record.entity_id.as_str()) {
                tracing::debug!("Skipping repeated record for entity {}", record.entity_id);
                continue;
            }
            let bytes = self.storage.load(&record.entity_id, &record.file_path).await?;
            images.push(ImageBytes {
                entity_id: record.entity_id.clone(),
                bytes,
            });
        }

        let mut default_bytes: Option<Vec<u8>> = None;
        for entity_id in &requested {
            if served.contains(entity_id.as_str()) {
                continue;
            }
            let bytes = match &default_bytes {
                Some(bytes) => bytes.clone(),
                None => {
                    let bytes = self.storage.load_default().await?;
                    default_bytes = Some(bytes.clone());
                    bytes
                }
            };
            tracing::debug!("Serving default image for entity {}", entity_id);
            images.push(ImageBytes {
                entity_id: entity_id.clone(),
                bytes,
            });
        }

        Ok(ImageBytesBatch { images })
    }

    /// Every image of an advertisement, in the order the metadata service lists them.
    pub async fn advertisement_images(&self, advertisement_id: &str) -> Result<ImageBytesBatch> {
        tracing::info!("All images requested for advertisement {}", advertisement_id);

        let records = self.resolver.advertisement_images(advertisement_id).await?;

        let mut images = Vec::with_capacity(records.len());
        for record in records {
            let bytes = self.storage.load(&record.entity_id, &record.file_path).await?;
            images.push(ImageBytes {
                entity_id: record.entity_id,
                bytes,
            });
        }

        Ok(ImageBytesBatch { images })
    }

    /// Store one image and register it with the metadata service.
    ///
    /// A registration failure leaves the written file in place.
    pub async fn upload_image(&self, item: &UploadItem) -> Result<UploadRecord> {
        let stored = self.storage.store(&item.entity_id, &item.bytes).await?;

        let record = UploadRecord {
            entity_id: item.entity_id.clone(),
            file_name: UPLOADED_FILE_NAME.to_string(),
            file_path: stored.file_id,
            is_main_image: item.is_main_image,
        };

        self.resolver
            .register_upload(&record)
            .await
            .map_err(|e| Error::UpstreamNotify {
                entity_id: item.entity_id.clone(),
                source: Box::new(e),
            })?;

        tracing::info!("Image written to file system for entity {}", item.entity_id);
        Ok(record)
    }

    /// Store several images in order, stopping at the first failure.
    pub async fn upload_image_batch(&self, items: &[UploadItem]) -> Result<Vec<UploadRecord>> {
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(self.upload_image(item).await?);
        }
        Ok(records)
    }
}
