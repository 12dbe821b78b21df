//! Hydration engine for relgraph.
//!
//! A lazily fetched, cached, in-memory graph of hypermedia resources. Nodes
//! are addressed by URL and connected by typed links; the engine fetches a
//! node the first time it is referenced, keeps exactly one live instance per
//! URL, and mutates cached nodes in place so every holder sees one
//! hydration's effects.
//!
//! # Key Types
//!
//! - [`Rest`] — the engine: URL cache, feed-parent cache, every hydration algorithm
//! - [`Resource`] — a domain node: links, merged fields, attached relations, dirty flag
//! - [`Collection`] — ordered members of a to-many relation, reconciled from a feed
//! - [`Feed`] — an uncached listing, such as a search result
//! - [`Form`], [`CreateForm`], [`EditForm`], [`SearchForm`] — submissions
//! - [`Relationship`] — declarative descriptor of one named relation
//! - [`ResourceKind`] / [`KindRegistry`] — per-kind merge schemas, hooks and
//!   transitive relations
//! - [`PagingCollection`] — walks `next`/`previous` pages
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use relgraph_core::{KindRegistry, Relationship, RelationshipOptions, Rest};
//! use relgraph_http::InMemoryTransport;
//!
//! # async fn demo() -> relgraph_core::GraphResult<()> {
//! let http = Arc::new(InMemoryTransport::new());
//! let rest = Rest::new(http, KindRegistry::new(), "http://localhost:3000/");
//! let supplier = rest.hydrate_from_url(&rest.make_uri("supplier", "1"), "resource").await?;
//! let services = [Relationship::to_many("services", "resource")];
//! supplier
//!     .hydrate_relationships(&services, &RelationshipOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod collection;
mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod form;
pub mod kind;
pub mod options;
pub mod paging;
pub mod relationship;
pub mod resource;

#[cfg(test)]
mod fixtures;

pub use capability::{Attachable, Hydratable, HydrationState, Identified, Relation, Submittable};
pub use collection::{Collection, CollectionRef, Page};
pub use engine::Rest;
pub use error::{GraphError, GraphResult};
pub use feed::{Feed, FeedBody, FeedItem, FeedItems};
pub use form::{
    encode_form, CreateForm, EditForm, Form, FormData, SearchForm, SubmitOptions, SubmitOutcome,
    NO_TARGET,
};
pub use kind::{kinds, HydratedHook, KindRegistry, MergeStrategy, ResourceKind};
pub use options::{
    AddElementsOptions, ChildOptions, CollectionOptions, HydrateOptions, RelationshipOptions,
};
pub use paging::PagingCollection;
pub use relationship::{Cardinality, Relationship, RelationshipSpec};
pub use resource::{Resource, ResourceRef};
