//! Phantom backend
//!
//! Deterministic synthetic segmentation for testing client integrations
//! without a deployed inference runtime. Produces a binary mask covering a
//! centered rectangular prism: the middle half of the depth axis crossed
//! with a 60-unit square centered in the height/width plane.

use async_trait::async_trait;
use segint_core::domain::catalog::ModelVersion;
use segint_core::volume::{ElementKind, VolumeBuffer};

use super::{BackendAdapter, BackendError};

/// Half-width of the mask square in the height/width plane.
const HALF_EXTENT: u32 = 30;

pub struct PhantomBackend;

#[async_trait]
impl BackendAdapter for PhantomBackend {
    async fn evaluate(
        &self,
        _model: &ModelVersion,
        channels: &[VolumeBuffer],
    ) -> Result<Vec<VolumeBuffer>, BackendError> {
        channels.iter().map(prism_mask).collect()
    }
}

fn prism_mask(channel: &VolumeBuffer) -> Result<VolumeBuffer, BackendError> {
    let (w, h, d) = (channel.width, channel.height, channel.depth);

    if h < 2 * HALF_EXTENT || w < 2 * HALF_EXTENT || d == 0 {
        return Err(BackendError::DegenerateInput(format!(
            "volume {w}x{h}x{d} cannot hold a {}x{} mask",
            2 * HALF_EXTENT,
            2 * HALF_EXTENT
        )));
    }

    let mut mask = VolumeBuffer::zeroed(ElementKind::Byte, w, h, d);

    let (z0, z1) = (d / 4, 3 * (d / 4));
    let (y0, y1) = (h / 2 - HALF_EXTENT, h / 2 + HALF_EXTENT);
    let (x0, x1) = (w / 2 - HALF_EXTENT, w / 2 + HALF_EXTENT);

    for z in z0..z1 {
        for y in y0..y1 {
            let start = mask.index(z, y, x0);
            let end = mask.index(z, y, x1);
            mask.as_bytes_mut()[start..end].fill(1);
        }
    }

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use segint_core::domain::catalog::BackendKind;

    fn model() -> ModelVersion {
        ModelVersion {
            model_id: "phantom-box-v1".to_string(),
            description: String::new(),
            backend: BackendKind::Phantom,
            model_artifact: None,
            created_at: Utc::now(),
            credits_required: 0.0,
            major_version: 1,
            minor_version: 0,
            language_code: "en-US".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mask_is_exact_centered_prism() {
        let (w, h, d) = (128u32, 120u32, 124u32);
        let input = VolumeBuffer::zeroed(ElementKind::Short, w, h, d);

        let masks = PhantomBackend
            .evaluate(&model(), std::slice::from_ref(&input))
            .await
            .unwrap();
        assert_eq!(masks.len(), 1);

        let mask = &masks[0];
        assert_eq!(mask.element, ElementKind::Byte);
        assert!(mask.same_shape(&input));

        let (z0, z1) = (d / 4, 3 * (d / 4));
        let (y0, y1) = (h / 2 - 30, h / 2 + 30);
        let (x0, x1) = (w / 2 - 30, w / 2 + 30);

        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    let inside =
                        z >= z0 && z < z1 && y >= y0 && y < y1 && x >= x0 && x < x1;
                    let value = mask.as_bytes()[mask.index(z, y, x)];
                    assert_eq!(
                        value,
                        inside as u8,
                        "unexpected mask value at ({z},{y},{x})"
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_one_mask_per_channel_dimensions_preserved() {
        let channels = vec![
            VolumeBuffer::zeroed(ElementKind::Short, 120, 120, 120),
            VolumeBuffer::zeroed(ElementKind::Short, 200, 64, 12),
        ];

        let masks = PhantomBackend.evaluate(&model(), &channels).await.unwrap();

        assert_eq!(masks.len(), channels.len());
        for (mask, channel) in masks.iter().zip(&channels) {
            assert!(mask.same_shape(channel));
        }
    }

    #[tokio::test]
    async fn test_rejects_degenerate_input() {
        let too_small = VolumeBuffer::zeroed(ElementKind::Short, 40, 120, 120);
        let err = PhantomBackend
            .evaluate(&model(), std::slice::from_ref(&too_small))
            .await;
        assert!(matches!(err, Err(BackendError::DegenerateInput(_))));
    }
}
