//! Computation backends
//!
//! A closed set of adapters behind one uniform contract: given a model
//! descriptor and the decoded input channels, produce one output mask per
//! channel with identical dimensions. Any adapter error fails the job, never
//! the worker process. New backend kinds are added by extending
//! [`BackendKind`] and shipping an adapter here, not by loading code at
//! runtime.

pub mod phantom;
pub mod remote;

use async_trait::async_trait;
use segint_core::domain::catalog::{BackendKind, ModelVersion};
use segint_core::volume::VolumeBuffer;
use thiserror::Error;

use crate::config::Config;
use phantom::PhantomBackend;
use remote::RemoteBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Input channel too small to segment.
    #[error("degenerate input volume: {0}")]
    DegenerateInput(String),

    /// The backend produced an output whose shape differs from its input.
    #[error("backend altered volume dimensions: {0}")]
    ShapeMismatch(String),

    /// The remote inference runtime failed or is not deployed.
    #[error("inference runtime failure: {0}")]
    Runtime(String),

    #[error("inference runtime request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Uniform evaluation contract every backend honors.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Segment each input channel, returning one mask per channel with the
    /// channel's exact dimensions.
    async fn evaluate(
        &self,
        model: &ModelVersion,
        channels: &[VolumeBuffer],
    ) -> Result<Vec<VolumeBuffer>, BackendError>;
}

/// The full adapter set, built once at worker start.
pub struct Backends {
    phantom: PhantomBackend,
    torch: RemoteBackend,
    tensorflow: RemoteBackend,
}

impl Backends {
    pub fn from_config(config: &Config) -> Backends {
        Backends {
            phantom: PhantomBackend,
            torch: RemoteBackend::new("torch", config.torch_runtime_url.clone()),
            tensorflow: RemoteBackend::new("tensorflow", config.tensorflow_runtime_url.clone()),
        }
    }

    /// Select the adapter for a backend kind. Each kind routes to its own
    /// adapter.
    pub fn for_kind(&self, kind: BackendKind) -> &dyn BackendAdapter {
        match kind {
            BackendKind::Phantom => &self.phantom,
            BackendKind::Torch => &self.torch,
            BackendKind::TensorFlow => &self.tensorflow,
        }
    }
}
