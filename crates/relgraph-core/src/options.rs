//! Option sets for engine operations.

use relgraph_http::Cancellable;
use serde::{Deserialize, Serialize};

use crate::kind::kinds;

#[derive(Clone, Debug, Default)]
pub struct HydrateOptions {
    /// GET again even when the node is already hydrated.
    pub reload_resource: bool,
    pub cancellable: Option<Cancellable>,
}

impl HydrateOptions {
    pub fn reload() -> Self {
        Self {
            reload_resource: true,
            cancellable: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChildOptions {
    pub optional: bool,
    pub reload_resource: bool,
    pub cancellable: Option<Cancellable>,
}

#[derive(Clone, Debug, Default)]
pub struct CollectionOptions {
    pub optional: bool,
    /// Hydrate every member before resolving.
    pub also_hydrate_children: bool,
    pub reload_feed: bool,
    pub cancellable: Option<Cancellable>,
}

#[derive(Clone, Debug, Default)]
pub struct RelationshipOptions {
    /// Reload to-many relations that are already attached.
    pub reload_feed: bool,
    /// Reload to-one relations that are already attached.
    pub reload_resource: bool,
    pub also_hydrate_children: bool,
    /// Recursively hydrate each resolved relation's own transitive relations.
    pub transitive: bool,
    pub cancellable: Option<Cancellable>,
}

impl RelationshipOptions {
    pub fn transitive() -> Self {
        Self {
            transitive: true,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddElementsOptions {
    /// Relation name of the collection's create form.
    pub create_form_name: String,
    /// Reload the collection, with its members, after every submission.
    pub reload_feed: bool,
}

impl Default for AddElementsOptions {
    fn default() -> Self {
        Self {
            create_form_name: kinds::CREATE_FORM.to_string(),
            reload_feed: true,
        }
    }
}
