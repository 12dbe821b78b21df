//! Error types for graph hydration.

use relgraph_http::HttpError;
use relgraph_types::{links_to_json, Link, LinkError, RelPattern};
use thiserror::Error;

/// Errors that can occur while hydrating or mutating the resource graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A required self or relationship link is absent.
    #[error("unable to find '{pattern}' in links: {links}")]
    MissingLink { pattern: String, links: String },

    /// A relationship descriptor cannot be processed.
    #[error("invalid relationship {descriptor} for {node}")]
    InvalidRelationship { descriptor: String, node: String },

    /// The transport reported a failure; passed through unmodified.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// An up-relationship walk reached something that is not a feed.
    #[error("up relationship '{relation}' for {node} does not lead through a feed: {reason}")]
    StructuralFeed {
        relation: String,
        node: String,
        reason: String,
    },

    /// No resource kind is registered under this name.
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    /// A representation does not have the expected shape.
    #[error("malformed representation: {0}")]
    Malformed(String),

    /// The node's hydration engine has been dropped.
    #[error("{0} is not bound to a hydration engine")]
    Unbound(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl GraphError {
    pub fn missing_link(pattern: &RelPattern, links: &[Link]) -> Self {
        Self::MissingLink {
            pattern: pattern.to_string(),
            links: links_to_json(links),
        }
    }
}

/// Convenience type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use relgraph_types::make_links_from;

    #[test]
    fn missing_link_names_pattern_and_links() {
        let links = make_links_from("urlParent");
        let err = GraphError::missing_link(&RelPattern::new("child"), &links);
        assert_eq!(
            err.to_string(),
            r#"unable to find 'child' in links: [{"rel":"self","href":"urlParent"}]"#
        );
    }

    #[test]
    fn transport_errors_pass_through() {
        let http = HttpError::Status {
            method: relgraph_http::HttpMethod::Get,
            url: "u".into(),
            status: 500,
            status_text: "Internal Server Error".into(),
        };
        let text = http.to_string();
        let err: GraphError = http.into();
        assert_eq!(err.to_string(), text);
    }
}
