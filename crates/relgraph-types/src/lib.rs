//! Foundation types for relgraph.
//!
//! Every resource in the graph is addressed by URL and reached through typed
//! links. This crate holds the link model shared by every other crate.
//!
//! # Key Types
//!
//! - [`Link`] — a typed edge: relation name, target URL, optional media type and title
//! - [`RelPattern`] — a relation-name pattern (one or more alternatives)
//! - [`LinkError`] — malformed link arrays in a representation
//!
//! # Modules
//!
//! - [`link`] — [`Link`], link-set lookup, parsing links out of JSON bodies
//! - [`pattern`] — [`RelPattern`] and the well-known relation names in [`rels`]
//! - [`path`] — router-path derivation from an identity URL

pub mod error;
pub mod link;
pub mod path;
pub mod pattern;

pub use error::{LinkError, Result};
pub use link::{find_link, links_from_value, links_to_json, make_links_from, Link};
pub use path::router_path;
pub use pattern::{rels, RelPattern};
