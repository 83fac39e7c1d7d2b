//! Repository Module
//!
//! Data access layer for the server.
//! Each repository handles database operations for a specific domain entity.

pub mod catalog;
pub mod feedback;
pub mod job;
pub mod telemetry;

// Re-export for convenience
pub use catalog as catalog_repository;
pub use feedback as feedback_repository;
pub use job as job_repository;
pub use telemetry as telemetry_repository;
