//! Shared application state

use segint_core::storage::BlobStore;
use sqlx::PgPool;

/// State handed to every handler: the relational store, the payload blob
/// store, and the externally reachable API base URL echoed in vendor status.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub blobs: BlobStore,
    pub service_url: String,
}
