use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::ingest::pipeline::IngestPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every client is constructed once in `main`; nothing here is a module singleton.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestPipeline,
    /// Verifies bearer tokens. Default: Supabase Auth.
    pub identity: Arc<dyn IdentityProvider>,
}
