use serde::{Deserialize, Serialize};

use super::content::{Content, preferred_media_type};
use super::extensions::Extensions;
use super::reference::RefOr;
use super::schema::SchemaOrRef;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// A path, query, header or cookie parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    /// Alternative to `schema` for complex serializations.
    #[serde(default, skip_serializing_if = "Content::is_empty")]
    pub content: Content,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required: location == ParameterLocation::Path,
            deprecated: false,
            schema: None,
            content: Content::new(),
            style: None,
            explode: None,
            example: None,
            extensions: Extensions::new(),
        }
    }

    /// Path parameters are always required, whatever the document says.
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }

    /// `schema`, or the schema of the preferred `content` entry.
    pub fn effective_schema(&self) -> Option<&SchemaOrRef> {
        self.schema
            .as_ref()
            .or_else(|| preferred_media_type(&self.content)?.1.schema.as_ref())
    }

    /// Whether the parameter's inline schema admits `null`.
    pub fn is_nullable(&self) -> bool {
        match self.effective_schema() {
            Some(SchemaOrRef::Schema(s)) => s.is_nullable(),
            _ => false,
        }
    }

    /// `(name, in)` identifies a parameter within one operation.
    pub fn key(&self) -> (&str, ParameterLocation) {
        (self.name.as_str(), self.location)
    }
}

pub type ParameterOrRef = RefOr<Parameter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_schema_stands_in_for_schema() {
        let p: Parameter = serde_yaml_ng::from_str(
            "name: filter\nin: query\ncontent:\n  application/json:\n    schema: { type: object }\n",
        )
        .unwrap();
        assert!(p.schema.is_none());
        assert!(matches!(p.effective_schema(), Some(SchemaOrRef::Schema(_))));
        assert!(!p.is_required());
    }

    #[test]
    fn path_parameters_are_required() {
        let mut p = Parameter::new("petId", ParameterLocation::Path);
        p.required = false;
        assert!(p.is_required());
        assert_eq!(p.key(), ("petId", ParameterLocation::Path));
    }
}
