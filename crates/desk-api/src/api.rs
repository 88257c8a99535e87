//! Entry point for the typed resources.

use desk_http::ApiClient;
use std::sync::Arc;

/// Typed access to the REST resources.
///
/// Each resource module adds its calls as an `impl DeskApi` block. All of them
/// go through the shared [`ApiClient`], so they inherit token refresh.
#[derive(Clone)]
pub struct DeskApi {
    client: Arc<ApiClient>,
}

impl DeskApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}
