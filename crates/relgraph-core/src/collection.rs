//! Collections: ordered sequences of domain nodes backed by a feed.
//!
//! A collection is attached to its parent once and then refreshed in place:
//! reconciliation clears and refills the item list of the same
//! [`Collection`] instance, so every holder of the [`CollectionRef`] sees the
//! current members. No two items of one collection share an identity URL.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use relgraph_types::{links_from_value, make_links_from, Link};
use serde_json::Value;

use crate::capability::{Attachable, HydrationState, Hydratable, Identified, Relation};
use crate::engine::Rest;
use crate::error::{GraphError, GraphResult};
use crate::feed::{Feed, FeedBody, FeedItem, FeedItems};
use crate::kind::ResourceKind;
use crate::resource::{Resource, ResourceRef};

pub type CollectionRef = Arc<Collection>;

/// Which neighbouring page of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Next,
    Previous,
}

impl Page {
    pub fn rel(self) -> &'static str {
        match self {
            Self::Next => relgraph_types::rels::NEXT,
            Self::Previous => relgraph_types::rels::PREVIOUS,
        }
    }
}

#[derive(Default)]
struct CollectionState {
    links: Vec<Link>,
    hydration: HydrationState,
    items: Vec<ResourceRef>,
    next: Option<CollectionRef>,
    previous: Option<CollectionRef>,
    relations: BTreeMap<String, Relation>,
}

pub struct Collection {
    item_kind: Arc<ResourceKind>,
    rest: Weak<Rest>,
    state: RwLock<CollectionState>,
}

fn item_url(item: &Resource) -> Option<String> {
    item.identity(true).ok().flatten()
}

impl Collection {
    /// A standalone collection, not owned by any engine.
    pub fn new(item_kind: Arc<ResourceKind>, links: Vec<Link>) -> CollectionRef {
        Self::bound(item_kind, links, Weak::new())
    }

    pub fn from_url(item_kind: Arc<ResourceKind>, url: &str) -> CollectionRef {
        Self::new(item_kind, make_links_from(url))
    }

    pub(crate) fn bound(
        item_kind: Arc<ResourceKind>,
        links: Vec<Link>,
        rest: Weak<Rest>,
    ) -> CollectionRef {
        Arc::new(Self {
            item_kind,
            rest,
            state: RwLock::new(CollectionState {
                links,
                ..Default::default()
            }),
        })
    }

    pub fn item_kind(&self) -> &Arc<ResourceKind> {
        &self.item_kind
    }

    pub fn items(&self) -> Vec<ResourceRef> {
        self.state.read().expect("lock poisoned").items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an item. An item whose URL is already present is not added
    /// and `false` is returned.
    pub fn add_item(&self, item: ResourceRef) -> bool {
        let mut state = self.state.write().expect("lock poisoned");
        if let Some(url) = item_url(&item) {
            if state.items.iter().any(|i| item_url(i).as_deref() == Some(url.as_str())) {
                return false;
            }
        }
        state.items.push(item);
        true
    }

    pub fn find_item(&self, url: &str) -> Option<ResourceRef> {
        self.state
            .read()
            .expect("lock poisoned")
            .items
            .iter()
            .find(|i| item_url(i).as_deref() == Some(url))
            .cloned()
    }

    /// Empty the item list in place.
    pub fn clear(&self) {
        self.state.write().expect("lock poisoned").items.clear();
    }

    /// Clear, then add every feed item in feed order, copying the feed's
    /// links onto the collection.
    pub fn replace_all_from_feed<F>(&self, feed: &Feed, factory: F) -> GraphResult<()>
    where
        F: FnMut(Vec<Link>) -> GraphResult<ResourceRef>,
    {
        self.replace_all(Some(feed.links()), &feed.items(), factory)
    }

    fn replace_all<F>(
        &self,
        links: Option<Vec<Link>>,
        items: &[FeedItem],
        mut factory: F,
    ) -> GraphResult<()>
    where
        F: FnMut(Vec<Link>) -> GraphResult<ResourceRef>,
    {
        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            let node = factory(make_links_from(&item.id))?;
            node.set_feed_title(item.title.clone());
            nodes.push(node);
        }
        {
            let mut state = self.state.write().expect("lock poisoned");
            if let Some(links) = links {
                state.links = links;
            }
            state.items.clear();
        }
        for node in nodes {
            self.add_item(node);
        }
        Ok(())
    }

    /// Build a node for a bare feed item and append it, recording the item's
    /// title as feed metadata rather than as a field.
    pub fn add_item_from_feed<F>(&self, item: &FeedItem, mut factory: F) -> GraphResult<ResourceRef>
    where
        F: FnMut(Vec<Link>) -> GraphResult<ResourceRef>,
    {
        let node = factory(make_links_from(&item.id))?;
        node.set_feed_title(item.title.clone());
        self.add_item(Arc::clone(&node));
        Ok(node)
    }

    /// Replace the items with embedded representations, merging each into the
    /// node `factory` returns for its links. The first occurrence of a URL wins.
    pub fn hydrate_embedded_items<F>(&self, items: &[Value], mut factory: F) -> GraphResult<()>
    where
        F: FnMut(Vec<Link>) -> GraphResult<ResourceRef>,
    {
        let mut nodes: Vec<ResourceRef> = Vec::with_capacity(items.len());
        for value in items {
            let links = links_from_value(value)?.ok_or_else(|| {
                GraphError::Malformed(format!("embedded feed item without links: {value}"))
            })?;
            let node = factory(links)?;
            let url = item_url(&node);
            if url.is_some() && nodes.iter().any(|n| item_url(n) == url) {
                continue;
            }
            node.merge(value)?;
            nodes.push(node);
        }
        let mut state = self.state.write().expect("lock poisoned");
        state.items.clear();
        state.items.extend(nodes);
        Ok(())
    }

    pub fn page(&self, page: Page) -> Option<CollectionRef> {
        let state = self.state.read().expect("lock poisoned");
        match page {
            Page::Next => state.next.clone(),
            Page::Previous => state.previous.clone(),
        }
    }

    pub fn next(&self) -> Option<CollectionRef> {
        self.page(Page::Next)
    }

    pub fn previous(&self) -> Option<CollectionRef> {
        self.page(Page::Previous)
    }

    pub(crate) fn set_page(&self, page: Page, collection: CollectionRef) {
        let mut state = self.state.write().expect("lock poisoned");
        match page {
            Page::Next => state.next = Some(collection),
            Page::Previous => state.previous = Some(collection),
        }
    }

    /// Drop items, linked pages and attached relations.
    pub(crate) fn release(&self) {
        let (pages, relations) = {
            let mut state = self.state.write().expect("lock poisoned");
            state.items.clear();
            let pages = [state.next.take(), state.previous.take()];
            (pages, std::mem::take(&mut state.relations))
        };
        for page in pages.into_iter().flatten() {
            page.release();
        }
        for relation in relations.into_values() {
            if let Relation::One(resource) = relation {
                resource.release_relations();
            }
        }
    }

    /// Cache-aware constructor for members: reuses the engine's instance for
    /// a URL when bound, otherwise builds a standalone node.
    fn member(&self, rest: Option<&Arc<Rest>>, links: Vec<Link>) -> GraphResult<ResourceRef> {
        match rest {
            Some(rest) => rest.construct_or_reuse(links, &self.item_kind),
            None => Ok(Resource::new(Arc::clone(&self.item_kind), links)),
        }
    }
}

impl Identified for Collection {
    fn links(&self) -> Vec<Link> {
        self.state.read().expect("lock poisoned").links.clone()
    }

    fn describe(&self) -> String {
        match self.identity(true) {
            Ok(Some(url)) => url,
            _ => format!("collection of {}", self.item_kind.name()),
        }
    }
}

impl Hydratable for Collection {
    fn hydration_state(&self) -> HydrationState {
        self.state.read().expect("lock poisoned").hydration
    }

    fn set_hydrated(&self) {
        self.state.write().expect("lock poisoned").hydration = HydrationState::Hydrated;
    }

    fn replace_links(&self, links: Vec<Link>) {
        self.state.write().expect("lock poisoned").links = links;
    }

    /// Reconcile the collection with a feed body.
    fn merge(&self, remote: &Value) -> GraphResult<()> {
        let body = FeedBody::parse(remote)?;
        let rest = self.rest.upgrade();
        let factory = |links: Vec<Link>| self.member(rest.as_ref(), links);
        match body.items {
            FeedItems::Stubs(items) => self.replace_all(body.links, &items, factory)?,
            FeedItems::Embedded(items) => {
                if let Some(links) = body.links {
                    self.replace_links(links);
                }
                self.hydrate_embedded_items(&items, factory)?;
            }
        }
        self.set_hydrated();
        Ok(())
    }
}

impl Attachable for Collection {
    fn attached(&self, name: &str) -> Option<Relation> {
        self.state.read().expect("lock poisoned").relations.get(name).cloned()
    }

    fn attach(&self, name: &str, relation: Relation) {
        self.state
            .write()
            .expect("lock poisoned")
            .relations
            .insert(name.to_string(), relation);
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("Collection")
            .field("item_kind", &self.item_kind.name())
            .field("links", &state.links)
            .field("hydration", &state.hydration)
            .field("items", &state.items.len())
            .finish()
    }
}
