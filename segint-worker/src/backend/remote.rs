//! Remote inference backend
//!
//! Adapter for the Torch and TensorFlow model runtimes, which run as
//! sidecar HTTP services. The runtime is an opaque, potentially slow,
//! potentially failing black box: the adapter ships correctly-shaped raw
//! samples, identifies the model artifact to load, and checks that what
//! comes back has the channel's exact shape. Every failure surfaces as a
//! job failure, never a worker crash.

use async_trait::async_trait;
use reqwest::Client;
use segint_core::domain::catalog::ModelVersion;
use segint_core::volume::{ElementKind, VolumeBuffer};

use super::{BackendAdapter, BackendError};

pub struct RemoteBackend {
    /// Runtime label used in diagnostics ("torch", "tensorflow").
    label: &'static str,
    base_url: Option<String>,
    client: Client,
}

impl RemoteBackend {
    pub fn new(label: &'static str, base_url: Option<String>) -> RemoteBackend {
        RemoteBackend {
            label,
            base_url,
            client: Client::new(),
        }
    }

    async fn evaluate_channel(
        &self,
        base_url: &str,
        artifact: &str,
        channel: &VolumeBuffer,
    ) -> Result<VolumeBuffer, BackendError> {
        let url = format!("{}/v1/evaluate", base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-model-artifact", artifact)
            .header("x-volume-width", channel.width)
            .header("x-volume-height", channel.height)
            .header("x-volume-depth", channel.depth)
            .body(channel.as_bytes().to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Runtime(format!(
                "{} runtime answered {}",
                self.label,
                response.status()
            )));
        }

        let raw = response.bytes().await?.to_vec();

        // The runtime returns raw i8 mask samples in the channel's shape.
        VolumeBuffer::from_raw(
            ElementKind::Byte,
            channel.width,
            channel.height,
            channel.depth,
            raw,
        )
        .map_err(|e| BackendError::ShapeMismatch(format!("{} runtime: {e}", self.label)))
    }
}

#[async_trait]
impl BackendAdapter for RemoteBackend {
    async fn evaluate(
        &self,
        model: &ModelVersion,
        channels: &[VolumeBuffer],
    ) -> Result<Vec<VolumeBuffer>, BackendError> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            BackendError::Runtime(format!("{} runtime is not deployed", self.label))
        })?;

        let artifact = model.model_artifact.as_deref().ok_or_else(|| {
            BackendError::Runtime(format!(
                "model {} has no artifact for the {} runtime",
                model.model_id, self.label
            ))
        })?;

        // Channels are independent; evaluated sequentially to keep runtime
        // memory pressure bounded.
        let mut masks = Vec::with_capacity(channels.len());
        for channel in channels {
            let mask = self.evaluate_channel(base_url, artifact, channel).await?;
            if !mask.same_shape(channel) {
                return Err(BackendError::ShapeMismatch(format!(
                    "{} runtime altered channel dimensions",
                    self.label
                )));
            }
            masks.push(mask);
        }

        Ok(masks)
    }
}
