//! Wire message schema
//!
//! The serializable messages exchanged with clients, plus the binary
//! encode/decode helpers. Every endpoint negotiates between the binary
//! encoding and a JSON projection of the same schema; both sides of the
//! negotiation serialize these exact types, so the two projections always
//! decode field-for-field equal.
//!
//! Field names keep the PascalCase of the legacy schema on the JSON
//! projection.

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Content type of the binary encoding. The label is kept for wire
/// compatibility with legacy clients.
pub const CONTENT_TYPE_BINARY: &str = "application/x-protobuf";

/// Wire `CompressionMethod` code for gzip volume payloads.
pub const COMPRESSION_GZIP: i32 = 0;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode wire message: {0}")]
    Encode(String),

    /// The byte sequence does not parse as the expected message type, or has
    /// the wrong total length.
    #[error("failed to decode wire message: {0}")]
    Decode(String),
}

/// Encodes a wire message to its binary representation.
pub fn to_bytes<T: Serialize>(msg: &T) -> Result<Vec<u8>, WireError> {
    bincode::options()
        .serialize(msg)
        .map_err(|e| WireError::Encode(e.to_string()))
}

/// Decodes a wire message from its binary representation.
///
/// Trailing bytes are rejected, so a payload of the wrong total length fails
/// to decode.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    bincode::options()
        .deserialize(bytes)
        .map_err(|e| WireError::Decode(e.to_string()))
}

// =============================================================================
// Service information
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiInformation {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credits {
    pub total_credits: i64,
    pub display_credits_warning: bool,
    pub credits_warning_message: String,
    pub language_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorStatus {
    pub total_credits: i64,
    pub low_credits_warning_message: String,
    pub client_country_code: String,
    pub segmentation_service_status: i32,
    pub segmentation_service_url: String,
    pub available_segmentation_service_locations: Vec<String>,
    pub vendor_name: String,
    pub vendor_description_html: String,
    pub language_code: String,
}

/// `VendorStatus.segmentation_service_status` value for an available service.
pub const VENDOR_SERVICE_AVAILABLE: i32 = 0;

/// Uniform error body. Details are fixed, non-specific strings; underlying
/// causes go to the log, not the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BadRequestResponse {
    pub error_message: String,
    pub exception_details: String,
}

// =============================================================================
// Volumes
// =============================================================================

/// A compressed 3D scalar array with its declared dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeData3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Gzip-compressed sample bytes, `[z][y][x]` with depth outermost.
    pub data: Vec<u8>,
    pub data_type: i32,
    pub compression_method: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalibratedVolume {
    pub volume: VolumeData3D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelInputChannel {
    pub calibrated_volume: CalibratedVolume,
}

/// Multi-channel segmentation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelInput {
    pub channels: Vec<ModelInputChannel>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Structure {
    pub name: String,
    pub color: Color,
    #[serde(rename = "Type")]
    pub kind: i32,
    #[serde(rename = "FMACode")]
    pub fma_code: i32,
    #[serde(rename = "InputChannelID")]
    pub input_channel_id: String,
    #[serde(rename = "StructureID")]
    pub structure_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelVersionInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub version_description: String,
    pub created_on: DateTime<Utc>,
    pub number_of_credits_required: f64,
    pub major_version: i32,
    pub minor_version: i32,
    pub language_code: String,
    pub structures: Vec<Structure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelsCollection {
    pub models: Vec<ModelVersionInfo>,
}

// =============================================================================
// Segmentation job lifecycle
// =============================================================================

/// Acknowledgement returned by the submit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentationTask {
    #[serde(rename = "SegmentationID")]
    pub segmentation_id: String,
    pub start_time: DateTime<Utc>,
}

/// Derived progress signal. `progress` is always exactly 0 or 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentationProgress {
    pub progress: i32,
    pub errors: String,
    pub error_code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelOutputChannel {
    pub structure: Structure,
    pub volume: VolumeData3D,
}

/// Serialized segmentation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelOutput {
    #[serde(rename = "ModelID")]
    pub model_id: String,
    pub processor_version: String,
    pub language_code: String,
    pub channels: Vec<ModelOutputChannel>,
}

// =============================================================================
// Feedback & telemetry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientInformation {
    pub software_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StructureComment {
    #[serde(rename = "StructureID")]
    pub structure_id: String,
    pub comments: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentationFeedback {
    pub client_information: ClientInformation,
    #[serde(rename = "SegmentationID")]
    pub segmentation_id: String,
    pub segmentation_accepted: bool,
    pub general_comments: String,
    pub general_score: Option<f64>,
    pub structure_comments: Vec<StructureComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentationTelemetry {
    pub client_information: ClientInformation,
    pub upload_time_in_milliseconds: i64,
    pub segmentation_wait_in_milliseconds: i64,
    pub segmentation_download_in_milliseconds: i64,
    pub number_of_retries: i32,
    #[serde(rename = "ModelID")]
    pub model_id: String,
    #[serde(rename = "SegmentationID")]
    pub segmentation_id: String,
    pub client_error: i32,
    pub client_error_information: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> ModelOutput {
        ModelOutput {
            model_id: "phantom-box-v1".to_string(),
            processor_version: "1.0".to_string(),
            language_code: "en-US".to_string(),
            channels: vec![ModelOutputChannel {
                structure: Structure {
                    name: "Phantom Box".to_string(),
                    color: Color { r: 255, g: 0, b: 0 },
                    kind: 1,
                    fma_code: 0,
                    input_channel_id: "CT".to_string(),
                    structure_id: "phantom-box".to_string(),
                },
                volume: VolumeData3D {
                    width: 4,
                    height: 4,
                    depth: 4,
                    data: vec![1, 2, 3, 4],
                    data_type: 0,
                    compression_method: COMPRESSION_GZIP,
                },
            }],
        }
    }

    #[test]
    fn test_binary_round_trip() {
        let msg = sample_output();
        let bytes = to_bytes(&msg).unwrap();
        let decoded: ModelOutput = from_bytes(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_binary_and_json_projections_agree() {
        let msg = sample_output();

        let from_binary: ModelOutput = from_bytes(&to_bytes(&msg).unwrap()).unwrap();
        let from_json: ModelOutput =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();

        assert_eq!(from_binary, from_json);
    }

    #[test]
    fn test_json_projection_keeps_legacy_field_names() {
        let json = serde_json::to_value(&sample_output()).unwrap();
        assert!(json.get("ModelID").is_some());
        assert!(json.get("ProcessorVersion").is_some());
        let structure = &json["Channels"][0]["Structure"];
        assert!(structure.get("FMACode").is_some());
        assert!(structure.get("StructureID").is_some());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let garbage = vec![0xFFu8; 32];
        assert!(from_bytes::<ModelInput>(&garbage).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let msg = SegmentationProgress {
            progress: 100,
            errors: String::new(),
            error_code: 0,
        };
        let mut bytes = to_bytes(&msg).unwrap();
        bytes.push(0);
        assert!(from_bytes::<SegmentationProgress>(&bytes).is_err());
    }
}
