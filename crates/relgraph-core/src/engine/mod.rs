//! The hydration engine.
//!
//! [`Rest`] owns the URL cache (at most one live node per URL) and the
//! feed-parent cache (which node a feed URL belongs to), and runs every
//! fetch, attach and merge algorithm over them. Nodes keep a weak handle to
//! the engine that created them; the caches are mutated only here.
//!
//! - `mod.rs` — construction, caches, `hydrate_from_url`, `hydrate`
//! - [`child`] — to-one and up-to-one relations
//! - [`collection`] — to-many relations, paging, adding members on the server
//! - [`relationships`] — descriptor-driven fan-out and transitive walks

mod child;
mod collection;
mod relationships;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use relgraph_http::{Cancellable, HttpTransport};
use relgraph_types::{find_link, make_links_from, Link, RelPattern};
use serde_json::Value;
use tracing::debug;

use crate::capability::Hydratable;
use crate::error::{GraphError, GraphResult};
use crate::kind::{KindRegistry, ResourceKind};
use crate::options::HydrateOptions;
use crate::resource::{Resource, ResourceRef};

pub struct Rest {
    http: Arc<dyn HttpTransport>,
    kinds: KindRegistry,
    api_root: String,
    cache: RwLock<HashMap<String, ResourceRef>>,
    feed_parents: RwLock<HashMap<String, ResourceRef>>,
    me: Weak<Rest>,
}

impl Rest {
    /// One engine per client session.
    pub fn new(
        http: Arc<dyn HttpTransport>,
        kinds: KindRegistry,
        api_root: impl Into<String>,
    ) -> Arc<Self> {
        let api_root = api_root.into();
        Arc::new_cyclic(|me| Self {
            http,
            kinds,
            api_root,
            cache: RwLock::new(HashMap::new()),
            feed_parents: RwLock::new(HashMap::new()),
            me: me.clone(),
        })
    }

    pub fn http(&self) -> &Arc<dyn HttpTransport> {
        &self.http
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// `api_root + type + "/" + id`.
    pub fn make_uri(&self, resource_type: &str, id: &str) -> String {
        format!("{}{resource_type}/{id}", self.api_root)
    }

    /// A fresh token for aborting in-flight requests.
    pub fn create_cancellable(&self) -> Cancellable {
        Cancellable::new()
    }

    pub fn cached(&self, url: &str) -> Option<ResourceRef> {
        self.cache.read().expect("lock poisoned").get(url).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().expect("lock poisoned").len()
    }

    /// The node owning the feed or collection at `url`.
    pub fn feed_parent(&self, url: &str) -> Option<ResourceRef> {
        self.feed_parents.read().expect("lock poisoned").get(url).cloned()
    }

    pub(crate) fn record_feed_parent(&self, url: &str, parent: ResourceRef) {
        self.feed_parents
            .write()
            .expect("lock poisoned")
            .insert(url.to_string(), parent);
    }

    /// Cache `node` under `url` unless another node already owns it.
    pub(crate) fn adopt(&self, url: &str, node: ResourceRef) {
        self.cache
            .write()
            .expect("lock poisoned")
            .entry(url.to_string())
            .or_insert(node);
    }

    /// A node of `kind` owned by this engine, not entered in the cache.
    pub fn resource(&self, kind: &str, links: Vec<Link>) -> GraphResult<ResourceRef> {
        let kind = self.kinds.get(kind)?;
        Ok(Resource::bound(kind, links, self.me.clone()))
    }

    /// A node with no links yet, such as an element to create on the server.
    pub fn new_resource(&self, kind: &str) -> GraphResult<ResourceRef> {
        self.resource(kind, Vec::new())
    }

    /// The cached node for the identity of `links`, or a new cached
    /// placeholder of `kind`.
    pub(crate) fn construct_or_reuse(
        &self,
        links: Vec<Link>,
        kind: &Arc<ResourceKind>,
    ) -> GraphResult<ResourceRef> {
        let pattern = RelPattern::identity();
        let Some(url) = find_link(&links, &pattern).map(|l| l.href.clone()) else {
            return Err(GraphError::missing_link(&pattern, &links));
        };
        let mut cache = self.cache.write().expect("lock poisoned");
        if let Some(existing) = cache.get(&url) {
            debug!(url = %url, "reusing cached node");
            return Ok(Arc::clone(existing));
        }
        let node = Resource::bound(Arc::clone(kind), links, self.me.clone());
        cache.insert(url, Arc::clone(&node));
        Ok(node)
    }

    /// The node for `url`, hydrated on first reference.
    ///
    /// A new placeholder is cached before the GET is issued, so concurrent
    /// callers for one URL converge on one node and one request.
    pub async fn hydrate_from_url(&self, url: &str, kind: &str) -> GraphResult<ResourceRef> {
        let kind = self.kinds.get(kind)?;
        let (node, fresh) = {
            let mut cache = self.cache.write().expect("lock poisoned");
            match cache.get(url) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let node = Resource::bound(kind, make_links_from(url), self.me.clone());
                    cache.insert(url.to_string(), Arc::clone(&node));
                    (node, true)
                }
            }
        };
        if !fresh {
            debug!(url, "cache hit");
            return Ok(node);
        }
        debug!(url, "cache miss");
        if let Err(err) = self.hydrate(&*node, &HydrateOptions::default()).await {
            self.evict_placeholder(url, &node);
            return Err(err);
        }
        Ok(node)
    }

    /// Remove `node` from the cache if it still owns `url` and was never
    /// hydrated, so the next reference fetches again.
    fn evict_placeholder(&self, url: &str, node: &ResourceRef) {
        let mut cache = self.cache.write().expect("lock poisoned");
        let owned = cache.get(url).is_some_and(|cached| Arc::ptr_eq(cached, node));
        if owned && !node.is_hydrated() {
            debug!(url, "evicting placeholder after failed fetch");
            cache.remove(url);
        }
    }

    /// GET the node's identity URL and merge it, unless it is already
    /// hydrated and no reload is requested.
    pub async fn hydrate<P>(&self, node: &P, options: &HydrateOptions) -> GraphResult<()>
    where
        P: Hydratable + ?Sized,
    {
        if !options.reload_resource && node.is_hydrated() {
            return Ok(());
        }
        let url = node.url()?;
        let data = self.get(&url, options.cancellable.as_ref()).await?;
        node.merge(&data)
    }

    async fn get(&self, url: &str, cancellable: Option<&Cancellable>) -> GraphResult<Value> {
        debug!(url, "GET");
        Ok(self.http.get(url, cancellable).await?.data)
    }
}

impl Drop for Rest {
    /// Nodes hold their relations strongly, so up-walks form cycles. Cut
    /// them so no node outlives the engine through the graph.
    fn drop(&mut self) {
        let cache = self.cache.get_mut().unwrap_or_else(PoisonError::into_inner);
        let cache = std::mem::take(cache);
        let parents = self.feed_parents.get_mut().unwrap_or_else(PoisonError::into_inner);
        let parents = std::mem::take(parents);
        for node in cache.values().chain(parents.values()) {
            node.release_relations();
        }
    }
}

impl fmt::Debug for Rest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rest")
            .field("api_root", &self.api_root)
            .field("kinds", &self.kinds.names())
            .field("cached", &self.cache_len())
            .finish()
    }
}
