//! Image retrieval and upload routes.
//!
//! Thin adapters over [`ImageGateway`](crate::images::ImageGateway): they
//! validate parameters, decode bodies and map results to responses.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};

use super::AppContext;
use crate::crud::CardImageBatchRequest;
use crate::error::{Error, Result};
use crate::images::{ImageBytes, ImageBytesBatch, UploadBatch, UploadItem};

/// Create image-related routes.
pub fn image_routes() -> Router<AppContext> {
    Router::new()
        .route("/cardimage", get(get_card_image))
        .route("/cardimagebatch", post(post_card_image_batch))
        .route("/advertisementimages", get(get_advertisement_images))
        .route("/uploadimage", post(upload_image))
        .route("/uploadimagebatch", post(upload_image_batch))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CardImageQuery {
    pub entityid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvertisementQuery {
    pub advertisementid: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /cardimage?entityid=
async fn get_card_image(
    State(ctx): State<AppContext>,
    Query(query): Query<CardImageQuery>,
) -> Result<Json<ImageBytes>> {
    let entity_id = required(query.entityid, "No entity ID provided.")?;
    let image = ctx.gateway.card_image(&entity_id).await?;
    Ok(Json(image))
}

/// POST /cardimagebatch
async fn post_card_image_batch(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<ImageBytesBatch>> {
    let request: CardImageBatchRequest = decode_body(&body)?;
    let entity_ids: Vec<String> = request.cards.into_iter().map(|c| c.entity_id).collect();
    let batch = ctx.gateway.card_image_batch(&entity_ids).await?;
    Ok(Json(batch))
}

/// GET /advertisementimages?advertisementid=
async fn get_advertisement_images(
    State(ctx): State<AppContext>,
    Query(query): Query<AdvertisementQuery>,
) -> Result<Json<ImageBytesBatch>> {
    let advertisement_id = required(query.advertisementid, "No advertisement ID provided.")?;
    let batch = ctx.gateway.advertisement_images(&advertisement_id).await?;
    Ok(Json(batch))
}

/// POST /uploadimage
async fn upload_image(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let item: UploadItem = decode_body(&body)?;
    ctx.gateway.upload_image(&item).await?;
    Ok((StatusCode::OK, "Image has been saved to the file system."))
}

/// POST /uploadimagebatch
async fn upload_image_batch(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let batch: UploadBatch = decode_body(&body)?;
    let records = ctx.gateway.upload_image_batch(&batch.images).await?;
    tracing::info!("Stored {} uploaded images", records.len());
    Ok((StatusCode::OK, "Images have been saved to the file system."))
}

// ============================================================================
// Helpers
// ============================================================================

/// An absent or empty query parameter is rejected with a 400.
fn required(value: Option<String>, message: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(message)),
    }
}

/// Bodies are parsed as JSON whatever their `Content-Type` says.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::MalformedRequest(e.to_string()))
}
