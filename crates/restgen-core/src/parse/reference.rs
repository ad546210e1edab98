use serde::{Deserialize, Serialize};

/// A `$ref` to a reusable component. OpenAPI 3.1 lets a reference carry
/// its own `summary` and `description`; both are kept on round trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Reference {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            summary: None,
            description: None,
        }
    }

    /// The name after `#/components/{section}/`, if the reference points
    /// into that section of the same document.
    pub fn component_in(&self, section: &str) -> Option<&str> {
        self.target
            .strip_prefix("#/components/")?
            .strip_prefix(section)?
            .strip_prefix('/')
            .filter(|name| !name.is_empty())
    }
}

/// Either a `$ref` or an inline definition. The reference is tried first,
/// so an object carrying `$ref` never parses as an inline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref(Reference),
    Item(T),
}

impl<T> RefOr<T> {
    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref(_) => None,
        }
    }

    pub fn as_ref_target(&self) -> Option<&str> {
        match self {
            RefOr::Ref(r) => Some(&r.target),
            RefOr::Item(_) => None,
        }
    }
}
