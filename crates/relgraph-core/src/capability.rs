//! Capability traits shared by every node type.
//!
//! Nodes compose these instead of inheriting from a base node:
//!
//! - [`Identified`] — link set, identity URL, relation lookup
//! - [`Hydratable`] — hydration state and merging a server representation
//! - [`Attachable`] — named relations attached to the node
//! - [`Submittable`] — submitting data through a form

use async_trait::async_trait;
use relgraph_types::{find_link, router_path, Link, RelPattern};
use serde_json::Value;

use crate::collection::CollectionRef;
use crate::error::{GraphError, GraphResult};
use crate::form::{FormData, SubmitOptions, SubmitOutcome};
use crate::resource::ResourceRef;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HydrationState {
    /// Links only; nothing has been merged from the server yet.
    #[default]
    Placeholder,
    Hydrated,
}

/// A relation attached to a node under an attribute name.
#[derive(Clone, Debug)]
pub enum Relation {
    One(ResourceRef),
    Many(CollectionRef),
}

pub trait Identified: Send + Sync {
    fn links(&self) -> Vec<Link>;

    /// Human-readable name used in log lines and errors.
    fn describe(&self) -> String;

    /// The domain node behind this value, if it is one.
    fn as_resource(&self) -> Option<ResourceRef> {
        None
    }

    /// Target of the first link matching `pattern`.
    ///
    /// A missing link is `Ok(None)` when `optional`, otherwise
    /// [`GraphError::MissingLink`] naming the pattern and the full link set.
    fn link(&self, pattern: &RelPattern, optional: bool) -> GraphResult<Option<String>> {
        let links = self.links();
        match find_link(&links, pattern) {
            Some(link) => Ok(Some(link.href.clone())),
            None if optional => Ok(None),
            None => Err(GraphError::missing_link(pattern, &links)),
        }
    }

    fn identity(&self, optional: bool) -> GraphResult<Option<String>> {
        self.link(&RelPattern::identity(), optional)
    }

    fn require_link(&self, pattern: &RelPattern) -> GraphResult<String> {
        let links = self.links();
        find_link(&links, pattern)
            .map(|link| link.href.clone())
            .ok_or_else(|| GraphError::missing_link(pattern, &links))
    }

    /// The identity URL; fails when the node has none.
    fn url(&self) -> GraphResult<String> {
        self.require_link(&RelPattern::identity())
    }

    fn router_path(&self) -> GraphResult<String> {
        Ok(router_path(&self.url()?))
    }
}

pub trait Hydratable: Identified {
    fn hydration_state(&self) -> HydrationState;

    fn is_hydrated(&self) -> bool {
        self.hydration_state() == HydrationState::Hydrated
    }

    fn set_hydrated(&self);

    /// Replace the link set, giving the node a new identity.
    fn replace_links(&self, links: Vec<Link>);

    /// Merge a server representation into the node and mark it hydrated.
    fn merge(&self, remote: &Value) -> GraphResult<()>;
}

pub trait Attachable: Hydratable {
    fn attached(&self, name: &str) -> Option<Relation>;

    fn attach(&self, name: &str, relation: Relation);

    fn attached_resource(&self, name: &str) -> Option<ResourceRef> {
        match self.attached(name) {
            Some(Relation::One(resource)) => Some(resource),
            _ => None,
        }
    }

    fn attached_collection(&self, name: &str) -> Option<CollectionRef> {
        match self.attached(name) {
            Some(Relation::Many(collection)) => Some(collection),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Submittable: Send + Sync {
    async fn submit(
        &self,
        data: &FormData,
        options: SubmitOptions<'_>,
    ) -> GraphResult<SubmitOutcome>;
}
