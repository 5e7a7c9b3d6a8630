use crate::config::CrudConfig;
use crate::crud::types::{CardImageBatchRequest, ImageRecord, ImageRecordBatch, UploadRecord};
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Lookups and registrations against the metadata service.
#[async_trait::async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Resolve the recorded image for a single entity.
    async fn card_image(&self, entity_id: &str) -> Result<ImageRecord>;

    /// Resolve every image belonging to an advertisement.
    async fn advertisement_images(&self, advertisement_id: &str) -> Result<Vec<ImageRecord>>;

    /// Resolve images for several entities at once. Entities without a
    /// record are absent from the result.
    async fn card_image_batch(&self, entity_ids: &[String]) -> Result<Vec<ImageRecord>>;

    /// Announce a newly stored image.
    async fn register_upload(&self, record: &UploadRecord) -> Result<()>;
}

/// HTTP client for the metadata (CRUD) service.
pub struct CrudClient {
    client: Client,
    base_url: String,
}

impl CrudClient {
    pub fn new(config: &CrudConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| Error::UpstreamUnreachable { url, source })?;

        decode(expect_ok(response).await?).await
    }

    async fn post(&self, path: &str, body: &impl serde::Serialize) -> Result<reqwest::Response> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| Error::UpstreamUnreachable { url, source })?;

        expect_ok(response).await
    }
}

/// Treat every status other than 200 as an upstream failure.
async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let message = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Failed to read metadata service error body: {}", e);
            String::new()
        }
    };
    tracing::warn!("Metadata service returned {}: {}", status, message);

    Err(Error::Upstream {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Decode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl MetadataResolver for CrudClient {
    async fn card_image(&self, entity_id: &str) -> Result<ImageRecord> {
        tracing::debug!("Resolving card image for entity {}", entity_id);
        self.get("/cardimage", &[("entityid", entity_id)]).await
    }

    async fn advertisement_images(&self, advertisement_id: &str) -> Result<Vec<ImageRecord>> {
        tracing::debug!("Resolving images for advertisement {}", advertisement_id);
        let batch: ImageRecordBatch = self
            .get(
                "/advertisementimages",
                &[("advertisementid", advertisement_id)],
            )
            .await?;
        Ok(batch.images)
    }

    async fn card_image_batch(&self, entity_ids: &[String]) -> Result<Vec<ImageRecord>> {
        tracing::debug!("Resolving card images for {} entities", entity_ids.len());
        let request = CardImageBatchRequest::from_ids(entity_ids.iter().cloned());
        let response = self.post("/cardimagebatch", &request).await?;
        let batch: ImageRecordBatch = decode(response).await?;
        Ok(batch.images)
    }

    async fn register_upload(&self, record: &UploadRecord) -> Result<()> {
        tracing::debug!(
            "Registering upload {} for entity {}",
            record.file_path,
            record.entity_id
        );
        self.post("/uploadimage", record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_config() {
        let config = CrudConfig {
            host: "crud".into(),
            port: 5000,
            timeout_secs: Some(2),
        };
        let client = CrudClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://crud:5000");
        assert_eq!(client.url("/cardimage"), "http://crud:5000/cardimage");
    }
}
