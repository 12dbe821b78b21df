//! Relationship descriptors.
//!
//! A [`Relationship`] declares one named relation of a node: its cardinality,
//! whether it may be absent, the link relation it follows (defaulting to its
//! name) and the kind of node at the other end. [`RelationshipSpec`] is the
//! loose wire shape, with one boolean flag per cardinality.

use std::fmt;

use relgraph_types::{rels, RelPattern};
use serde::{Deserialize, Serialize};

use crate::kind::kinds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    ToOne,
    ToMany,
    /// Reverse pointer to the owner of the feed that lists the node.
    UpToOne,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    /// Attribute the related node (or collection) is attached under.
    pub name: String,
    /// Link relation; `None` means the same as `name`.
    pub relation: Option<String>,
    pub cardinality: Cardinality,
    pub optional: bool,
    /// Kind of the related node(s).
    pub kind: String,
}

impl Relationship {
    pub fn new(name: impl Into<String>, cardinality: Cardinality, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: None,
            cardinality,
            optional: false,
            kind: kind.into(),
        }
    }

    pub fn to_one(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToOne, kind)
    }

    pub fn to_many(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToMany, kind)
    }

    pub fn up_to_one(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, Cardinality::UpToOne, kind)
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn relation_name(&self) -> &str {
        self.relation.as_deref().unwrap_or(&self.name)
    }

    pub fn pattern(&self) -> RelPattern {
        RelPattern::new(self.relation_name())
    }

    /// The edit form of a domain node, attached as `editForm`.
    pub fn edit_form() -> Self {
        Self::to_one("editForm", kinds::EDIT_FORM).with_relation(rels::EDIT_FORM)
    }

    /// The search form of a collection, attached as `search`.
    pub fn search_form() -> Self {
        Self::to_one(rels::SEARCH, kinds::SEARCH_FORM)
    }

    /// A create form held under the same name as its link relation.
    pub fn create_form(name: &str) -> Self {
        Self::to_one(name, kinds::CREATE_FORM).with_relation(name)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name: {}, relationship: {}, cardinality: {:?}, optional: {}, kind: {}}}",
            self.name,
            self.relation_name(),
            self.cardinality,
            self.optional,
            self.kind
        )
    }
}

/// Wire shape of a relationship descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default)]
    pub to_one: bool,
    #[serde(default)]
    pub to_many: bool,
    #[serde(default)]
    pub up_to_one: bool,
    #[serde(default)]
    pub optional: bool,
    /// Kind name the registry resolves into a constructor.
    pub make: String,
}

impl RelationshipSpec {
    /// The typed descriptor, if exactly one cardinality flag is set and the
    /// name and kind are non-empty.
    pub fn resolve(&self) -> Option<Relationship> {
        let cardinality = match (self.to_one, self.to_many, self.up_to_one) {
            (true, false, false) => Cardinality::ToOne,
            (false, true, false) => Cardinality::ToMany,
            (false, false, true) => Cardinality::UpToOne,
            _ => return None,
        };
        if self.name.is_empty() || self.make.is_empty() {
            return None;
        }
        Some(Relationship {
            name: self.name.clone(),
            relation: self.relationship.clone(),
            cardinality,
            optional: self.optional,
            kind: self.make.clone(),
        })
    }
}

impl fmt::Display for RelationshipSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
