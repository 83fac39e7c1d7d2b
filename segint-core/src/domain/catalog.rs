//! Model catalog domain types
//!
//! Read-only descriptors of deployable model versions and the anatomical
//! structures they segment. Owned by the catalog tables; the job pipeline
//! only ever reads them by model id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wire;

/// Computation backend bound to a model version.
///
/// A closed set: new backends are added by extending this enum and shipping a
/// compiled adapter, never by loading code at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Deterministic synthetic segmentation (centered rectangular prism).
    Phantom,
    /// Remote Torch inference runtime.
    Torch,
    /// Remote TensorFlow inference runtime.
    TensorFlow,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Phantom => "Phantom",
            BackendKind::Torch => "Torch",
            BackendKind::TensorFlow => "TensorFlow",
        }
    }

    /// Unknown kinds fall back to the phantom backend.
    pub fn parse(s: &str) -> BackendKind {
        match s {
            "Torch" => BackendKind::Torch,
            "TensorFlow" => BackendKind::TensorFlow,
            _ => BackendKind::Phantom,
        }
    }
}

/// One deployable model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Catalog identifier callers select a model by.
    pub model_id: String,
    pub description: String,
    pub backend: BackendKind,
    /// Path of the model artifact handed to the backend runtime. Unused by
    /// the phantom backend.
    pub model_artifact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub credits_required: f64,
    pub major_version: i32,
    pub minor_version: i32,
    pub language_code: String,
}

impl ModelVersion {
    /// Version string echoed into every `ModelOutput`.
    pub fn processor_version(&self) -> String {
        format!("{}.{}", self.major_version, self.minor_version)
    }
}

/// Anatomical structure segmented by a model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub color_r: i32,
    pub color_g: i32,
    pub color_b: i32,
    pub kind: StructureKind,
    /// Foundational Model of Anatomy code.
    pub fma_code: i32,
    pub input_channel_id: String,
    pub structure_id: String,
}

impl Structure {
    pub fn to_wire(&self) -> wire::Structure {
        wire::Structure {
            name: self.name.clone(),
            color: wire::Color {
                r: self.color_r,
                g: self.color_g,
                b: self.color_b,
            },
            kind: self.kind.as_i32(),
            fma_code: self.fma_code,
            input_channel_id: self.input_channel_id.clone(),
            structure_id: self.structure_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    External,
    Organ,
    Unknown,
}

impl StructureKind {
    pub fn as_i32(self) -> i32 {
        match self {
            StructureKind::External => 0,
            StructureKind::Organ => 1,
            StructureKind::Unknown => 2,
        }
    }

    pub fn from_i32(v: i32) -> StructureKind {
        match v {
            0 => StructureKind::External,
            1 => StructureKind::Organ,
            _ => StructureKind::Unknown,
        }
    }
}
