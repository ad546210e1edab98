use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::components::{ComponentKind, Components};
use super::extensions::Extensions;
use super::operation::{HttpMethod, Operation, PathItem};
use super::reference::RefOr;
use super::schema::{Schema, SchemaOrRef};
use super::security::SecurityRequirement;
use super::server::Server;

/// Reference chains longer than this are treated as cycles.
const MAX_REF_HOPS: usize = 32;

/// The `info` block. Only the title and version drive generation; the
/// remaining fields survive merge and split untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `termsOfService`, `contact`, `license` and `x-*` entries.
    #[serde(flatten)]
    pub other: Extensions,
}

impl Info {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.version.is_empty()
            && self.summary.is_none()
            && self.description.is_none()
            && self.other.is_empty()
    }
}

/// Accept `version: 1.0` (a YAML float) as the string `"1.0"`.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(serde::de::Error::custom(format!("expected a string, found {other}"))),
    })
}

/// A top-level tag declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub other: Extensions,
}

/// Top-level OpenAPI 3.x document.
///
/// Part files of a multi-part specification may omit `openapi` and `info`,
/// so both default to empty values; the merge engine and validator decide
/// whether their absence is an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenApiSpec {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub openapi: String,

    #[serde(default, skip_serializing_if = "Info::is_empty")]
    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A borrowed view of one operation together with its location.
#[derive(Debug, Clone, Copy)]
pub struct OperationEntry<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub path_item: &'a PathItem,
    pub operation: &'a Operation,
}

impl OperationEntry<'_> {
    /// Diagnostic pointer, e.g. `paths./pets/{petId}.get`.
    pub fn pointer(&self) -> String {
        format!("paths.{}.{}", self.path, self.method.key())
    }

    /// The operationId, or `METHOD /path` when absent.
    pub fn display_name(&self) -> String {
        self.operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}

impl OpenApiSpec {
    /// Every operation under `paths`, in document order.
    pub fn operations(&self) -> impl Iterator<Item = OperationEntry<'_>> + '_ {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations().map(move |(method, operation)| OperationEntry {
                path,
                method,
                path_item: item,
                operation,
            })
        })
    }

    /// Every operation under `webhooks`, keyed by webhook name.
    pub fn webhook_operations(&self) -> impl Iterator<Item = OperationEntry<'_>> + '_ {
        self.webhooks.iter().flat_map(|(name, item)| {
            item.operations().map(move |(method, operation)| OperationEntry {
                path: name,
                method,
                path_item: item,
                operation,
            })
        })
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(PathItem::operation_count).sum()
    }

    pub fn schemas(&self) -> Option<&IndexMap<String, SchemaOrRef>> {
        self.components.as_ref().map(|c| &c.schemas)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas().map_or(0, IndexMap::len)
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaOrRef> {
        self.schemas()?.get(name)
    }

    /// Follow `$ref` chains until an inline schema is reached. Returns
    /// `None` for dangling or cyclic reference chains.
    pub fn resolve_schema<'a>(&'a self, schema: &'a SchemaOrRef) -> Option<&'a Schema> {
        let mut current = schema;
        for _ in 0..MAX_REF_HOPS {
            match current {
                SchemaOrRef::Schema(s) => return Some(s),
                SchemaOrRef::Ref(r) => current = self.schema(r.schema_name()?)?,
            }
        }
        None
    }

    /// Resolve a parameter, request body or response through its
    /// `components` section. Only local references are followed.
    pub fn resolve<'a, T: ComponentKind>(&'a self, node: &'a RefOr<T>) -> Option<&'a T> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            match current {
                RefOr::Item(item) => return Some(item),
                RefOr::Ref(r) => {
                    let name = r.component_in(T::SECTION)?;
                    current = T::registry(self.components.as_ref()?).get(name)?;
                }
            }
        }
        None
    }

    pub fn has_base_metadata(&self) -> bool {
        !self.openapi.is_empty() && !self.info.title.trim().is_empty()
    }
}
