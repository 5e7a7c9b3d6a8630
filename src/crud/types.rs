use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` the same as an absent field. The metadata service writes
/// empty lists and unset strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Image metadata recorded by the metadata service for one entity.
///
/// An empty `file_path` means no image has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageRecord {
    #[serde(rename = "entityid", default, deserialize_with = "null_as_default")]
    pub entity_id: String,

    #[serde(rename = "filepath", default, deserialize_with = "null_as_default")]
    pub file_path: String,

    #[serde(rename = "filename", default, deserialize_with = "null_as_default")]
    pub file_name: String,
}

/// Envelope used by the batch and advertisement lookups.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageRecordBatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ImageRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CardImageRequest {
    #[serde(rename = "entityid", default, deserialize_with = "null_as_default")]
    pub entity_id: String,
}

/// Batch lookup body, accepted from callers and forwarded upstream as-is.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardImageBatchRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<CardImageRequest>,
}

impl CardImageBatchRequest {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cards: ids
                .into_iter()
                .map(|id| CardImageRequest {
                    entity_id: id.into(),
                })
                .collect(),
        }
    }
}

/// Record announced to the metadata service after an upload hits the disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadRecord {
    #[serde(rename = "entityid")]
    pub entity_id: String,

    #[serde(rename = "filename")]
    pub file_name: String,

    #[serde(rename = "filepath")]
    pub file_path: String,

    #[serde(rename = "ismainimage")]
    pub is_main_image: bool,
}
