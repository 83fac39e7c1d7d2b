//! Segint Core
//!
//! Core types and transforms for the segint volumetric segmentation service.
//!
//! This crate contains:
//! - Domain types: Core business entities (SegmentationJob, ModelVersion, etc.)
//! - Wire messages: Serializable schema shared with clients
//! - Volume codec: Compressed 3D array encode/decode
//! - Blob store: File-backed payload storage shared by server and worker

pub mod domain;
pub mod storage;
pub mod volume;
pub mod wire;
