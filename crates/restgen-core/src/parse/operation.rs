use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::extensions::Extensions;
use super::content::{RequestBodyOrRef, ResponseOrRef};
use super::parameter::ParameterOrRef;
use super::security::SecurityRequirement;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Canonical order: the order operations are listed and generated in.
    pub const ALL: [HttpMethod; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// The lowercase key used in a path item.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Upper-case verb, as written in HTTP and in `Map{Verb}` helpers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation under a path item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyOrRef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// `None` inherits the document requirements; `Some(vec![])` opts out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Operation {
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn first_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn has_response(&self, status: &str) -> bool {
        self.responses.contains_key(status)
    }

    /// Declared `2xx` status codes, `2XX` included.
    pub fn success_statuses(&self) -> Vec<&str> {
        self.responses
            .keys()
            .filter(|s| s.starts_with('2'))
            .map(String::as_str)
            .collect()
    }
}

/// The operations and shared parameters declared for one path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        let slot = match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Put => &self.put,
            HttpMethod::Post => &self.post,
            HttpMethod::Delete => &self.delete,
            HttpMethod::Options => &self.options,
            HttpMethod::Head => &self.head,
            HttpMethod::Patch => &self.patch,
            HttpMethod::Trace => &self.trace,
        };
        slot.as_ref()
    }

    /// Declared operations in canonical method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> + '_ {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|m| self.operation(m).map(|op| (m, op)))
    }

    pub fn operation_count(&self) -> usize {
        self.operations().count()
    }
}

/// Merge path-level parameters into an operation's own list. Operation
/// parameters override path parameters with the same `(name, in)`.
/// References are kept as-is; callers resolve them through the document.
pub fn effective_parameters<'a>(
    path_item: &'a PathItem,
    op: &'a Operation,
) -> Vec<&'a ParameterOrRef> {
    let overridden = |inherited: &ParameterOrRef| {
        inherited.as_item().is_some_and(|p| {
            op.parameters
                .iter()
                .filter_map(ParameterOrRef::as_item)
                .any(|own| own.key() == p.key())
        })
    };
    path_item
        .parameters
        .iter()
        .filter(|p| !overridden(*p))
        .chain(&op.parameters)
        .collect()
}

/// Names of the `{param}` placeholders in a path template, in order.
pub fn path_template_params(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|seg| {
            let start = seg.find('{')?;
            let end = seg[start..].find('}')? + start;
            Some(&seg[start + 1..end])
        })
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parameter::{Parameter, ParameterLocation};

    fn param(name: &str, location: ParameterLocation, description: &str) -> ParameterOrRef {
        let mut p = Parameter::new(name, location);
        p.description = Some(description.to_string());
        ParameterOrRef::Item(p)
    }

    #[test]
    fn template_params() {
        assert_eq!(path_template_params("/pets/{petId}"), vec!["petId"]);
        assert_eq!(
            path_template_params("/users/{userId}/files/{name}.{ext}"),
            vec!["userId", "name"]
        );
        assert!(path_template_params("/health").is_empty());
    }

    #[test]
    fn operation_params_override_path_params() {
        let item = PathItem {
            parameters: vec![
                param("petId", ParameterLocation::Path, "from path"),
                param("trace", ParameterLocation::Header, "from path"),
            ],
            ..Default::default()
        };
        let op = Operation {
            parameters: vec![param("petId", ParameterLocation::Path, "from op")],
            ..Default::default()
        };
        let effective = effective_parameters(&item, &op);
        assert_eq!(effective.len(), 2);
        let descriptions: Vec<_> = effective
            .iter()
            .filter_map(|p| p.as_item()?.description.as_deref())
            .collect();
        assert_eq!(descriptions, vec!["from path", "from op"]);
    }

    #[test]
    fn operations_in_canonical_order() {
        let item = PathItem {
            post: Some(Operation::default()),
            get: Some(Operation::default()),
            ..Default::default()
        };
        let methods: Vec<_> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }
}
