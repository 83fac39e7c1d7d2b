//! Job dispatch pipeline
//!
//! Executes one claimed job end to end: read the stored input payload,
//! decode its channels, run the model's backend, assemble the result
//! message and persist it. Every stage error becomes the job's failure
//! diagnostic.

use segint_core::domain::catalog::{ModelVersion, Structure};
use segint_core::domain::job::SegmentationJob;
use segint_core::storage::{BlobStore, StorageError};
use segint_core::volume::{self, CodecError, ElementKind, VolumeBuffer};
use segint_core::wire::{self, COMPRESSION_GZIP, WireError};
use thiserror::Error;
use tracing::debug;

use crate::backend::{BackendError, Backends};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("wire message error: {0}")]
    Wire(#[from] WireError),

    #[error("input channel rejected: {0}")]
    BadChannel(#[from] CodecError),

    #[error(
        "unsupported channel encoding: data type {data_type}, compression method {compression_method}"
    )]
    UnsupportedEncoding { data_type: i32, compression_method: i32 },

    #[error("backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("blob store failure: {0}")]
    Storage(#[from] StorageError),
}

/// Runs the full pipeline for a claimed job and returns the blob reference
/// of the persisted result.
pub async fn execute(
    job: &SegmentationJob,
    model: &ModelVersion,
    structure: &Structure,
    backends: &Backends,
    blobs: &BlobStore,
) -> Result<String, DispatchError> {
    let payload = blobs.read(&job.input_ref)?;
    let input: wire::ModelInput = wire::from_bytes(&payload)?;

    let channels = decode_channels(&input)?;
    debug!(job_id = %job.id, channels = channels.len(), "input decoded");

    let masks = backends
        .for_kind(model.backend)
        .evaluate(model, &channels)
        .await?;

    let output = build_model_output(model, structure, &masks)?;
    let bytes = wire::to_bytes(&output)?;

    Ok(blobs.write_output(job.id, &bytes)?)
}

/// Decompresses every input channel into a calibrated 16-bit volume.
///
/// Input channels must declare 16-bit samples and gzip compression; any
/// other code combination is rejected with the declared codes in the
/// diagnostic.
fn decode_channels(input: &wire::ModelInput) -> Result<Vec<VolumeBuffer>, DispatchError> {
    input
        .channels
        .iter()
        .map(|channel| {
            let v = &channel.calibrated_volume.volume;
            if v.data_type != ElementKind::Short.wire_code()
                || v.compression_method != COMPRESSION_GZIP
            {
                return Err(DispatchError::UnsupportedEncoding {
                    data_type: v.data_type,
                    compression_method: v.compression_method,
                });
            }
            Ok(volume::decode(
                &v.data,
                ElementKind::Short,
                v.width,
                v.height,
                v.depth,
            )?)
        })
        .collect()
}

/// Assembles the result message: the model's identity echoed back, plus one
/// compressed 8-bit mask per channel.
fn build_model_output(
    model: &ModelVersion,
    structure: &Structure,
    masks: &[VolumeBuffer],
) -> Result<wire::ModelOutput, CodecError> {
    let mut channels = Vec::with_capacity(masks.len());

    for mask in masks {
        let data = volume::encode(mask)?;
        channels.push(wire::ModelOutputChannel {
            structure: structure.to_wire(),
            volume: wire::VolumeData3D {
                width: mask.width,
                height: mask.height,
                depth: mask.depth,
                data,
                data_type: mask.element.wire_code(),
                compression_method: COMPRESSION_GZIP,
            },
        });
    }

    Ok(wire::ModelOutput {
        model_id: model.model_id.clone(),
        processor_version: model.processor_version(),
        language_code: model.language_code.clone(),
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use segint_core::domain::catalog::{BackendKind, StructureKind};

    fn model() -> ModelVersion {
        ModelVersion {
            model_id: "phantom-box-v1".to_string(),
            description: "Synthetic phantom".to_string(),
            backend: BackendKind::Phantom,
            model_artifact: None,
            created_at: Utc::now(),
            credits_required: 0.0,
            major_version: 1,
            minor_version: 3,
            language_code: "en-US".to_string(),
        }
    }

    fn structure() -> Structure {
        Structure {
            name: "Phantom Box".to_string(),
            color_r: 255,
            color_g: 0,
            color_b: 0,
            kind: StructureKind::Organ,
            fma_code: 0,
            input_channel_id: "CT".to_string(),
            structure_id: "phantom-box".to_string(),
        }
    }

    #[test]
    fn test_output_echoes_model_identity() {
        let mask = VolumeBuffer::zeroed(ElementKind::Byte, 8, 8, 8);
        let output = build_model_output(&model(), &structure(), &[mask]).unwrap();

        assert_eq!(output.model_id, "phantom-box-v1");
        assert_eq!(output.processor_version, "1.3");
        assert_eq!(output.language_code, "en-US");
        assert_eq!(output.channels.len(), 1);

        let channel = &output.channels[0];
        assert_eq!(channel.structure.name, "Phantom Box");
        assert_eq!(channel.structure.structure_id, "phantom-box");
        assert_eq!(channel.volume.data_type, ElementKind::Byte.wire_code());
        assert_eq!(channel.volume.compression_method, COMPRESSION_GZIP);
    }

    #[test]
    fn test_output_masks_round_trip() {
        let mut mask = VolumeBuffer::zeroed(ElementKind::Byte, 6, 6, 6);
        let mid = mask.index(3, 3, 3);
        mask.as_bytes_mut()[mid] = 1;

        let output = build_model_output(&model(), &structure(), &[mask.clone()]).unwrap();
        let v = &output.channels[0].volume;

        let decoded =
            volume::decode(&v.data, ElementKind::Byte, v.width, v.height, v.depth).unwrap();
        assert_eq!(decoded, mask);
    }

    #[test]
    fn test_decode_channels_checks_dimensions() {
        let good = VolumeBuffer::zeroed(ElementKind::Short, 4, 4, 4);
        let data = volume::encode(&good).unwrap();

        let input = wire::ModelInput {
            channels: vec![wire::ModelInputChannel {
                calibrated_volume: wire::CalibratedVolume {
                    volume: wire::VolumeData3D {
                        width: 4,
                        height: 4,
                        // Declared depth disagrees with the payload.
                        depth: 5,
                        data,
                        data_type: ElementKind::Short.wire_code(),
                        compression_method: COMPRESSION_GZIP,
                    },
                },
            }],
        };

        assert!(matches!(
            decode_channels(&input),
            Err(DispatchError::BadChannel(CodecError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_decode_channels_rejects_wrong_encoding() {
        let good = VolumeBuffer::zeroed(ElementKind::Short, 4, 4, 4);
        let data = volume::encode(&good).unwrap();

        let input = wire::ModelInput {
            channels: vec![wire::ModelInputChannel {
                calibrated_volume: wire::CalibratedVolume {
                    volume: wire::VolumeData3D {
                        width: 4,
                        height: 4,
                        depth: 4,
                        data,
                        // Input channels never carry 8-bit samples.
                        data_type: ElementKind::Byte.wire_code(),
                        compression_method: COMPRESSION_GZIP,
                    },
                },
            }],
        };

        assert!(matches!(
            decode_channels(&input),
            Err(DispatchError::UnsupportedEncoding {
                data_type: 0,
                compression_method: COMPRESSION_GZIP,
            })
        ));
    }
}
