//! Request and response bodies exchanged with callers.
//!
//! Byte payloads travel as standard padded base64 strings.

use serde::{Deserialize, Serialize};

/// Image content for one entity, either its own file or the default image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageBytes {
    #[serde(rename = "entityid")]
    pub entity_id: String,

    #[serde(rename = "imagebytes", with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageBytesBatch {
    pub images: Vec<ImageBytes>,
}

/// One image submitted for storage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadItem {
    #[serde(rename = "entityid")]
    pub entity_id: String,

    #[serde(rename = "imagebytes", with = "base64_bytes", default)]
    pub bytes: Vec<u8>,

    #[serde(rename = "ismainimage", default)]
    pub is_main_image: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadBatch {
    #[serde(default)]
    pub images: Vec<UploadItem>,
}

/// Serde adapter encoding `Vec<u8>` as a base64 string. `null` decodes to an
/// empty buffer.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
