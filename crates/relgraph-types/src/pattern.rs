//! Relation-name patterns.
//!
//! A [`RelPattern`] matches a link's relation against one or more
//! alternatives. The textual form uses `|` between alternatives, so
//! `"self|canonical"` matches either relation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known relation names.
pub mod rels {
    pub const SELF: &str = "self";
    pub const CANONICAL: &str = "canonical";
    pub const UP: &str = "up";
    pub const NEXT: &str = "next";
    pub const PREVIOUS: &str = "previous";
    pub const EDIT_FORM: &str = "edit-form";
    pub const CREATE_FORM: &str = "create-form";
    pub const SEARCH: &str = "search";
}

/// A relation pattern: matches a relation equal to any of its alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RelPattern {
    alternatives: Vec<String>,
}

impl RelPattern {
    /// Parse a pattern, splitting alternatives on `|`.
    pub fn new(pattern: &str) -> Self {
        let alternatives = pattern
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { alternatives }
    }

    /// The identity pattern: `self|canonical`.
    pub fn identity() -> Self {
        Self {
            alternatives: vec![rels::SELF.into(), rels::CANONICAL.into()],
        }
    }

    pub fn matches(&self, relation: &str) -> bool {
        self.alternatives.iter().any(|alt| alt == relation)
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

impl fmt::Display for RelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alternatives.join("|"))
    }
}

impl From<&str> for RelPattern {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RelPattern {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<RelPattern> for String {
    fn from(p: RelPattern) -> Self {
        p.to_string()
    }
}
