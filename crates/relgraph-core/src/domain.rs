//! Domain-node operations.
//!
//! Thin delegations from a [`Resource`] to the engine that owns it, plus the
//! mutation paths: saving through the edit form, patching fields and
//! searching a related collection.

use std::slice;
use std::sync::Arc;

use relgraph_http::Cancellable;
use serde_json::{json, Value};
use tracing::debug;

use crate::capability::{Attachable, Identified};
use crate::collection::Collection;
use crate::error::{GraphError, GraphResult};
use crate::feed::Feed;
use crate::form::{EditForm, SearchForm};
use crate::options::{AddElementsOptions, HydrateOptions, RelationshipOptions};
use crate::relationship::Relationship;
use crate::resource::{Resource, ResourceRef};

impl Resource {
    pub async fn hydrate(&self, options: &HydrateOptions) -> GraphResult<()> {
        self.rest()?.hydrate(self, options).await
    }

    pub async fn hydrate_relationships(
        &self,
        relationships: &[Relationship],
        options: &RelationshipOptions,
    ) -> GraphResult<()> {
        self.rest()?
            .hydrate_relationships(self, relationships, options)
            .await
    }

    pub async fn hydrate_up_through_feed(
        &self,
        relationship: &Relationship,
    ) -> GraphResult<ResourceRef> {
        self.rest()?
            .hydrate_up_through_feed(self, relationship, None)
            .await
    }

    /// Submit the node through its edit form if it is dirty.
    ///
    /// A clean node is left alone without any request. The dirty flag is
    /// cleared only once the submission (and the reload, if requested) has
    /// succeeded.
    pub async fn save(&self, options: &HydrateOptions) -> GraphResult<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        let rest = self.rest()?;
        let edit = Relationship::edit_form();
        let relationship_options = RelationshipOptions {
            cancellable: options.cancellable.clone(),
            ..Default::default()
        };
        rest.hydrate_relationships(self, slice::from_ref(&edit), &relationship_options)
            .await?;
        let form = self
            .related(&edit.name)
            .map(EditForm::new)
            .ok_or_else(|| GraphError::missing_link(&edit.pattern(), &self.links()))?;
        form.submit_edit(self, options.cancellable.as_ref()).await?;
        if options.reload_resource {
            rest.hydrate(self, options).await?;
        }
        self.clear_dirty();
        debug!(node = %self.describe(), "saved");
        Ok(())
    }

    /// PATCH the named fields to the node's own URL as JSON-patch
    /// `replace` operations, in the order given.
    pub async fn patch_fields<S: AsRef<str>>(&self, names: &[S]) -> GraphResult<()> {
        let rest = self.rest()?;
        let url = self.url()?;
        let operations: Vec<Value> = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                json!({
                    "op": "replace",
                    "path": format!("/{name}"),
                    "value": self.field(name).unwrap_or(Value::Null),
                })
            })
            .collect();
        rest.http()
            .patch(&url, Value::Array(operations), None)
            .await?;
        Ok(())
    }

    /// Hydrate `relationship` on `target`, a search form, and submit
    /// `pattern` through it.
    pub async fn search<P>(
        &self,
        target: &P,
        relationship: &Relationship,
        pattern: &str,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<Arc<Feed>>
    where
        P: Attachable + ?Sized,
    {
        let rest = self.rest()?;
        let options = RelationshipOptions {
            cancellable: cancellable.cloned(),
            ..Default::default()
        };
        rest.hydrate_relationships(target, slice::from_ref(relationship), &options)
            .await?;
        let form = target
            .attached_resource(&relationship.name)
            .map(SearchForm::new)
            .ok_or_else(|| GraphError::missing_link(&relationship.pattern(), &target.links()))?;
        form.submit_search(pattern, cancellable).await
    }

    /// [`Resource::search`] through the collection's `search` form.
    pub async fn search_collection(
        &self,
        collection: &Collection,
        pattern: &str,
        cancellable: Option<&Cancellable>,
    ) -> GraphResult<Arc<Feed>> {
        self.search(collection, &Relationship::search_form(), pattern, cancellable)
            .await
    }

    pub async fn add_elements_to_collection_on_server(
        &self,
        elements: &[ResourceRef],
        relationship: &Relationship,
        options: &AddElementsOptions,
    ) -> GraphResult<()> {
        self.rest()?
            .add_elements_to_collection_on_server(self, elements, relationship, options)
            .await
    }
}
