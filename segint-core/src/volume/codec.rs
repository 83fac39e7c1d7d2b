//! Volume payload codec
//!
//! Pure, stateless transforms between the gzip-compressed byte payloads
//! embedded in wire messages and in-memory [`VolumeBuffer`]s. Decode fails on
//! truncated or malformed streams and on any mismatch between the declared
//! dimensions and the decompressed byte count; encode always recompresses and
//! round-trips losslessly.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;

use super::{ElementKind, VolumeBuffer, expected_len};

#[derive(Debug, Error)]
pub enum CodecError {
    /// The compressed stream is truncated or not a valid gzip stream.
    #[error("corrupt volume payload: {0}")]
    CorruptPayload(String),

    /// The decompressed byte count does not match the declared dimensions.
    #[error("volume length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The declared dimensions describe a volume that cannot exist in memory.
    #[error("declared dimensions {width}x{height}x{depth} exceed addressable memory")]
    OversizedDimensions { width: u32, height: u32, depth: u32 },
}

/// Upper bound on the buffer pre-allocated from wire-declared dimensions.
/// The real length is still checked exactly after decompression.
const PREALLOC_CAP: usize = 1 << 26;

/// Decompresses a volume payload into a [`VolumeBuffer`] with the dimensions
/// declared in the surrounding message.
pub fn decode(
    compressed: &[u8],
    element: ElementKind,
    width: u32,
    height: u32,
    depth: u32,
) -> Result<VolumeBuffer, CodecError> {
    let Some(expected) = expected_len(element, width, height, depth) else {
        return Err(CodecError::OversizedDimensions {
            width,
            height,
            depth,
        });
    };

    // Read at most one byte past the declared size; anything beyond that is
    // a mismatch regardless of how much more the stream inflates to.
    let decoder = GzDecoder::new(compressed);
    let mut raw = Vec::with_capacity(expected.min(PREALLOC_CAP));
    decoder
        .take((expected as u64).saturating_add(1))
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;

    VolumeBuffer::from_raw(element, width, height, depth, raw)
}

/// Compresses a volume's raw samples back into a gzip payload.
///
/// The compression level is not part of the contract; only the decompressed
/// bytes are.
pub fn encode(volume: &VolumeBuffer) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(volume.as_bytes())
        .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CorruptPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_volume(element: ElementKind, width: u32, height: u32, depth: u32) -> VolumeBuffer {
        let len = expected_len(element, width, height, depth).unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        VolumeBuffer::from_raw(element, width, height, depth, data).unwrap()
    }

    #[test]
    fn test_round_trip_short() {
        let v = sample_volume(ElementKind::Short, 16, 12, 8);
        let compressed = encode(&v).unwrap();
        let decoded = decode(&compressed, ElementKind::Short, 16, 12, 8).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn test_round_trip_byte() {
        let v = sample_volume(ElementKind::Byte, 7, 5, 3);
        let compressed = encode(&v).unwrap();
        let decoded = decode(&compressed, ElementKind::Byte, 7, 5, 3).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn test_truncated_stream_is_corrupt() {
        let v = sample_volume(ElementKind::Short, 16, 16, 16);
        let compressed = encode(&v).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        match decode(truncated, ElementKind::Short, 16, 16, 16) {
            Err(CodecError::CorruptPayload(_)) => {}
            other => panic!("expected CorruptPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_stream_is_corrupt() {
        let garbage = vec![0xABu8; 64];
        match decode(&garbage, ElementKind::Byte, 4, 4, 4) {
            Err(CodecError::CorruptPayload(_)) => {}
            other => panic!("expected CorruptPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_declared_dimensions_fail_decode() {
        // Dimensions whose product overflows must error out before any
        // allocation or decompression happens.
        let garbage = vec![0xABu8; 64];
        match decode(&garbage, ElementKind::Short, u32::MAX, u32::MAX, u32::MAX) {
            Err(CodecError::OversizedDimensions { width, .. }) => {
                assert_eq!(width, u32::MAX);
            }
            other => panic!("expected OversizedDimensions, got {:?}", other),
        }
    }

    #[test]
    fn test_overlong_stream_is_length_mismatch() {
        // A stream inflating past the declared size errors without the
        // decoder being drained in full.
        let v = sample_volume(ElementKind::Byte, 8, 8, 8);
        let compressed = encode(&v).unwrap();
        assert!(matches!(
            decode(&compressed, ElementKind::Byte, 4, 4, 4),
            Err(CodecError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let v = sample_volume(ElementKind::Byte, 4, 4, 4);
        let compressed = encode(&v).unwrap();
        // Declared dimensions disagree with the payload.
        match decode(&compressed, ElementKind::Byte, 4, 4, 5) {
            Err(CodecError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, 80);
                assert_eq!(actual, 64);
            }
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
        // Same payload, wrong element width.
        assert!(matches!(
            decode(&compressed, ElementKind::Short, 4, 4, 4),
            Err(CodecError::LengthMismatch { .. })
        ));
    }
}
