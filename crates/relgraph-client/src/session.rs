use std::sync::Arc;

use relgraph_core::{KindRegistry, ResourceRef, Rest};
use relgraph_http::{FetchTransport, HttpTransport};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// One client session: a transport and the engine that owns the caches.
#[derive(Debug, Clone)]
pub struct Session {
    config: ClientConfig,
    rest: Arc<Rest>,
}

impl Session {
    /// A session talking to the configured API over HTTP.
    pub fn new(config: ClientConfig, kinds: KindRegistry) -> ClientResult<Self> {
        let http = Arc::new(FetchTransport::with_config(&config.fetch_config())?);
        Self::with_transport(config, kinds, http)
    }

    pub fn with_transport(
        config: ClientConfig,
        kinds: KindRegistry,
        http: Arc<dyn HttpTransport>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let rest = Rest::new(http, kinds, config.api_root.clone());
        info!(api_root = %config.api_root, kinds = rest.kinds().len(), "session started");
        Ok(Self { config, rest })
    }

    pub fn rest(&self) -> &Arc<Rest> {
        &self.rest
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `api_root + type + "/" + id`.
    pub fn uri(&self, resource_type: &str, id: &str) -> String {
        self.rest.make_uri(resource_type, id)
    }

    /// The resource of `resource_type` with `id`, hydrated as `kind`.
    pub async fn resource(
        &self,
        resource_type: &str,
        id: &str,
        kind: &str,
    ) -> ClientResult<ResourceRef> {
        let url = self.uri(resource_type, id);
        Ok(self.rest.hydrate_from_url(&url, kind).await?)
    }
}
