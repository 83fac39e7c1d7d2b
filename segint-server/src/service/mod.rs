//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories, the blob store and the wire
//! schema.

pub mod catalog;
pub mod segmentation;

// Re-export for convenience
pub use catalog as catalog_service;
pub use segmentation as segmentation_service;
