//! To-many relations, paging and adding members on the server.

use std::slice;
use std::sync::Arc;

use futures_util::future::try_join_all;
use relgraph_http::Cancellable;
use relgraph_types::{make_links_from, RelPattern};
use tracing::debug;

use super::Rest;
use crate::capability::{Attachable, Hydratable, Identified, Relation};
use crate::collection::{Collection, CollectionRef, Page};
use crate::error::{GraphError, GraphResult};
use crate::form::CreateForm;
use crate::options::{AddElementsOptions, CollectionOptions, HydrateOptions, RelationshipOptions};
use crate::relationship::{Cardinality, Relationship};
use crate::resource::Resource;

impl Rest {
    /// Attach the collection linked from `parent` by `pattern` under `name`
    /// and reconcile it with the feed.
    ///
    /// The collection URL is recorded as owned by `parent` before anything
    /// else, including the already-attached fast path. An optional missing
    /// link yields an empty hydrated collection.
    pub async fn hydrate_collection(
        &self,
        parent: &Resource,
        name: &str,
        pattern: &RelPattern,
        kind: &str,
        options: &CollectionOptions,
    ) -> GraphResult<CollectionRef> {
        let item_kind = self.kinds.get(kind)?;
        let url = parent.link(pattern, options.optional)?;
        if let (Some(url), Some(owner)) = (url.as_deref(), parent.as_resource()) {
            self.record_feed_parent(url, owner);
        }

        let existing = parent.attached_collection(name);
        let collection = match existing {
            Some(collection) if !options.reload_feed => return Ok(collection),
            Some(collection) => collection,
            None => {
                let links = url.as_deref().map(make_links_from).unwrap_or_default();
                let collection = Collection::bound(item_kind, links, self.me.clone());
                parent.attach(name, Relation::Many(Arc::clone(&collection)));
                collection
            }
        };

        let Some(url) = url else {
            debug!(parent = %parent.describe(), relation = %pattern, "optional collection absent");
            collection.set_hydrated();
            return Ok(collection);
        };
        let feed = self.get(&url, options.cancellable.as_ref()).await?;
        collection.merge(&feed)?;

        if options.also_hydrate_children {
            let hydrate = HydrateOptions {
                reload_resource: false,
                cancellable: options.cancellable.clone(),
            };
            self.hydrate_items(&collection, &hydrate).await?;
        }
        Ok(collection)
    }

    async fn hydrate_items(
        &self,
        collection: &Collection,
        options: &HydrateOptions,
    ) -> GraphResult<()> {
        let items = collection.items();
        try_join_all(items.iter().map(|item| self.hydrate(&**item, options))).await?;
        Ok(())
    }

    /// Follow the collection's `next` or `previous` link into a new
    /// collection of the same item kind with its members hydrated.
    ///
    /// Resolves `None` when the collection has no such link.
    pub async fn hydrate_page(
        &self,
        collection: &Collection,
        page: Page,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<Option<CollectionRef>> {
        let Some(url) = collection.link(&RelPattern::new(page.rel()), true)? else {
            return Ok(None);
        };
        if let Some(existing) = collection.page(page) {
            if existing.is_hydrated() && existing.identity(true)?.as_deref() == Some(url.as_str()) {
                return Ok(Some(existing));
            }
        }

        let target = Collection::bound(
            Arc::clone(collection.item_kind()),
            make_links_from(&url),
            self.me.clone(),
        );
        let owner = collection
            .identity(true)?
            .and_then(|current| self.feed_parent(&current));
        if let Some(owner) = owner {
            self.record_feed_parent(&url, owner);
        }

        let feed = self.get(&url, cancellable).await?;
        target.merge(&feed)?;
        let hydrate = HydrateOptions {
            reload_resource: false,
            cancellable: cancellable.cloned(),
        };
        self.hydrate_items(&target, &hydrate).await?;
        collection.set_page(page, Arc::clone(&target));
        Ok(Some(target))
    }

    /// Create every element in `parent`'s to-many relation through the
    /// collection's create form.
    ///
    /// The collection is reloaded once, with its members, after every
    /// submission has completed, unless `reload_feed` is off.
    pub async fn add_elements_to_collection_on_server(
        &self,
        parent: &Resource,
        elements: &[Arc<Resource>],
        relationship: &Relationship,
        options: &AddElementsOptions,
    ) -> GraphResult<()> {
        if elements.is_empty() {
            return Ok(());
        }
        if relationship.cardinality != Cardinality::ToMany {
            return Err(GraphError::InvalidRelationship {
                descriptor: relationship.to_string(),
                node: parent.describe(),
            });
        }

        self.hydrate_relationships(
            parent,
            slice::from_ref(relationship),
            &RelationshipOptions::default(),
        )
        .await?;
        let collection = parent
            .attached_collection(&relationship.name)
            .ok_or_else(|| GraphError::missing_link(&relationship.pattern(), &parent.links()))?;

        let create = Relationship::create_form(&options.create_form_name);
        self.hydrate_relationships(
            &*collection,
            slice::from_ref(&create),
            &RelationshipOptions::default(),
        )
        .await?;
        let form = collection
            .attached_resource(&create.name)
            .map(CreateForm::new)
            .ok_or_else(|| GraphError::missing_link(&create.pattern(), &collection.links()))?;

        debug!(collection = %collection.describe(), count = elements.len(), "creating elements");
        try_join_all(elements.iter().map(|element| form.submit_create(element, None))).await?;

        if options.reload_feed {
            let reload = RelationshipOptions {
                reload_feed: true,
                also_hydrate_children: true,
                ..Default::default()
            };
            self.hydrate_relationships(parent, slice::from_ref(relationship), &reload)
                .await?;
        }
        Ok(())
    }
}
