//! To-one and up-to-one relations.

use std::sync::Arc;

use relgraph_http::Cancellable;
use relgraph_types::{find_link, links_from_value, make_links_from, rels, RelPattern};
use serde_json::Value;
use tracing::debug;

use super::Rest;
use crate::capability::{Attachable, Hydratable, Identified, Relation};
use crate::error::{GraphError, GraphResult};
use crate::options::{ChildOptions, HydrateOptions};
use crate::relationship::Relationship;
use crate::resource::{Resource, ResourceRef};

impl Rest {
    /// Attach the node linked from `parent` by `pattern` under `name`.
    ///
    /// An attached, hydrated child is returned as is unless a reload is
    /// requested, in which case the same instance is refreshed. An unattached
    /// child is taken from the cache when possible, otherwise fetched and
    /// built as `kind`. A missing link resolves `None` when optional.
    pub async fn hydrate_child<P>(
        &self,
        parent: &P,
        name: &str,
        pattern: &RelPattern,
        kind: &str,
        options: &ChildOptions,
    ) -> GraphResult<Option<ResourceRef>>
    where
        P: Attachable + ?Sized,
    {
        let kind = self.kinds.get(kind)?;
        let child_url = parent.link(pattern, options.optional)?;
        let cancellable = options.cancellable.as_ref();

        if let Some(child) = parent.attached_resource(name) {
            if !options.reload_resource && child.is_hydrated() {
                return Ok(Some(child));
            }
            let url = match child_url {
                Some(url) => url,
                None => child.url()?,
            };
            let data = self.get(&url, cancellable).await?;
            child.merge(&data)?;
            return Ok(Some(child));
        }

        let Some(url) = child_url else {
            debug!(parent = %parent.describe(), relation = %pattern, "optional relation absent");
            return Ok(None);
        };

        let cached = self.cached(&url);
        if let Some(cached) = cached {
            if !options.reload_resource {
                debug!(url = %url, name, "attaching cached child");
                parent.attach(name, Relation::One(Arc::clone(&cached)));
                return Ok(Some(cached));
            }
        }

        let data = self.get(&url, cancellable).await?;
        // Another hydration may have attached the child while this GET was
        // in flight.
        if let Some(existing) = parent.attached_resource(name) {
            existing.merge(&data)?;
            return Ok(Some(existing));
        }
        let links = links_from_value(&data)?.unwrap_or_else(|| make_links_from(&url));
        let child = {
            let mut cache = self.cache.write().expect("lock poisoned");
            Arc::clone(
                cache
                    .entry(url.clone())
                    .or_insert_with(|| Resource::bound(kind, links, self.me.clone())),
            )
        };
        child.merge(&data)?;
        parent.attach(name, Relation::One(Arc::clone(&child)));
        Ok(Some(child))
    }

    /// Resolve an up-to-one relation of `node`: the owner of the feed that
    /// lists it.
    ///
    /// An owner already attached under the relationship's name is hydrated
    /// from its own URL if needed and returned. Otherwise the owner is found
    /// in the feed-parent cache when possible, or the feed is fetched and its
    /// own `up` link is hydrated as the relationship's kind.
    pub async fn hydrate_up_through_feed(
        &self,
        node: &Resource,
        relationship: &Relationship,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<ResourceRef> {
        if let Some(parent) = node.attached_resource(&relationship.name) {
            let options = HydrateOptions {
                reload_resource: false,
                cancellable: cancellable.cloned(),
            };
            self.hydrate(&*parent, &options).await?;
            return Ok(parent);
        }
        let pattern = relationship.pattern();

        let feed_url = node.require_link(&pattern)?;
        let known = self.feed_parent(&feed_url);
        if let Some(parent) = known {
            debug!(feed = %feed_url, "feed parent known");
            node.attach(&relationship.name, Relation::One(Arc::clone(&parent)));
            return Ok(parent);
        }

        let feed = self.get(&feed_url, cancellable).await?;
        let links = links_from_value(&feed)?.unwrap_or_default();
        let up_url = find_link(&links, &RelPattern::new(rels::UP)).map(|l| l.href.clone());
        let has_items = feed.get("items").is_some_and(Value::is_array);
        let up_url = match (up_url, has_items) {
            (Some(url), true) => url,
            (up, _) => {
                let reason = if up.is_none() {
                    "the feed has no 'up' link"
                } else {
                    "the response has no items"
                };
                return Err(GraphError::StructuralFeed {
                    relation: pattern.to_string(),
                    node: node.describe(),
                    reason: reason.to_string(),
                });
            }
        };

        let parent = self.hydrate_from_url(&up_url, &relationship.kind).await?;
        self.record_feed_parent(&feed_url, Arc::clone(&parent));
        node.attach(&relationship.name, Relation::One(Arc::clone(&parent)));
        Ok(parent)
    }
}
