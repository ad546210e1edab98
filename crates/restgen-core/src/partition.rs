//! Work partitioning. Operations are grouped into segments (by first path
//! segment, by tag, or all together) and each component schema is either
//! local to the one segment that reaches it or hoisted into the shared
//! partition.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::config::SubFolderStrategy;
use crate::naming::normalize_name;
use crate::parse::content::content_schemas;
use crate::parse::operation::{HttpMethod, Operation, PathItem, effective_parameters};
use crate::parse::schema::collect_ref_names;
use crate::parse::spec::OpenApiSpec;

pub const DEFAULT_SEGMENT: &str = "Default";

/// Identifies one operation inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub path: String,
    pub method: HttpMethod,
}

/// A group of operations generated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// PascalCase segment name; `None` when partitioning is disabled.
    pub name: Option<String>,
    pub operations: Vec<OperationKey>,
    /// Component schemas reached only from this segment.
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub segments: Vec<Segment>,
    /// Schemas reached from several segments, or from none.
    pub shared_schemas: Vec<String>,
}

impl Partition {
    pub fn segment(&self, name: Option<&str>) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name.as_deref() == name)
    }

    /// The segment a schema lives in: `Some(None)` for shared schemas,
    /// `None` for names the partition does not know.
    pub fn home_of(&self, schema: &str) -> Option<Option<&str>> {
        if self.shared_schemas.iter().any(|s| s == schema) {
            return Some(None);
        }
        self.segments
            .iter()
            .find(|seg| seg.schemas.iter().any(|s| s == schema))
            .map(|seg| seg.name.as_deref())
    }

    /// [`Partition::home_of`] for every known schema at once.
    pub fn homes(&self) -> HashMap<&str, Option<&str>> {
        let mut homes: HashMap<&str, Option<&str>> = self
            .shared_schemas
            .iter()
            .map(|s| (s.as_str(), None))
            .collect();
        for seg in &self.segments {
            for schema in &seg.schemas {
                homes.entry(schema.as_str()).or_insert(seg.name.as_deref());
            }
        }
        homes
    }
}

/// The first path token that names a resource. An `api` prefix, version
/// tokens (`v1`, `v2.1`) and `{param}` templates are skipped.
///
/// `/api/v1/pets/{petId}` → `pets`, `/{tenant}/orders` → `orders`.
pub fn first_meaningful_segment(path: &str) -> Option<&str> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .find(|s| !s.eq_ignore_ascii_case("api") && !is_version(s) && !s.starts_with('{'))
}

fn is_version(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix(['v', 'V']) else {
        return false;
    };
    !rest.is_empty()
        && rest.starts_with(|c: char| c.is_ascii_digit())
        && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn segment_name(strategy: SubFolderStrategy, path: &str, op: &Operation) -> Option<String> {
    let raw = match strategy {
        SubFolderStrategy::None => return None,
        SubFolderStrategy::FirstPathSegment => first_meaningful_segment(path),
        SubFolderStrategy::OpenApiTag => op.first_tag(),
    };
    let name = raw
        .map(|r| normalize_name(r).pascal_case)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_SEGMENT.to_string());
    Some(name)
}

/// Names of the component schemas an operation references directly, via
/// its parameters, request body and responses (component parameters,
/// bodies and responses are followed).
pub fn operation_schema_refs(doc: &OpenApiSpec, item: &PathItem, op: &Operation) -> Vec<String> {
    let mut out = Vec::new();
    let parameters = effective_parameters(item, op)
        .into_iter()
        .filter_map(|p| doc.resolve(p)?.effective_schema());
    let body = op
        .request_body
        .as_ref()
        .and_then(|b| doc.resolve(b))
        .into_iter()
        .flat_map(|b| content_schemas(&b.content).map(|(_, s)| s));
    let responses = op
        .responses
        .values()
        .filter_map(|r| doc.resolve(r))
        .flat_map(|r| content_schemas(&r.content).map(|(_, s)| s));
    for schema in parameters.chain(body).chain(responses) {
        collect_ref_names(schema, &mut out);
    }
    out
}

/// Every component schema transitively reachable from `roots`, in
/// discovery order. Dangling names are dropped.
pub fn reachable_schemas(doc: &OpenApiSpec, roots: impl IntoIterator<Item = String>) -> IndexSet<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut queue: Vec<String> = roots.into_iter().collect();
    queue.reverse();
    while let Some(name) = queue.pop() {
        if seen.contains(&name) {
            continue;
        }
        let Some(schema) = doc.schema(&name) else {
            continue;
        };
        let mut children = Vec::new();
        collect_ref_names(schema, &mut children);
        seen.insert(name);
        queue.extend(children.into_iter().rev());
    }
    seen
}

/// Split a document's operations and schemas into segments.
pub fn partition(doc: &OpenApiSpec, strategy: SubFolderStrategy) -> Partition {
    let mut groups: IndexMap<Option<String>, Vec<OperationKey>> = IndexMap::new();
    let mut roots: IndexMap<Option<String>, Vec<String>> = IndexMap::new();
    for entry in doc.operations() {
        let name = segment_name(strategy, entry.path, entry.operation);
        groups.entry(name.clone()).or_default().push(OperationKey {
            path: entry.path.to_string(),
            method: entry.method,
        });
        roots
            .entry(name)
            .or_default()
            .extend(operation_schema_refs(doc, entry.path_item, entry.operation));
    }

    let reach: Vec<IndexSet<String>> = groups
        .keys()
        .map(|name| reachable_schemas(doc, roots.get(name).cloned().unwrap_or_default()))
        .collect();

    let mut segments: Vec<Segment> = groups
        .into_iter()
        .map(|(name, operations)| Segment {
            name,
            operations,
            schemas: Vec::new(),
        })
        .collect();
    let mut shared_schemas = Vec::new();

    for key in doc.schemas().into_iter().flat_map(|s| s.keys()) {
        let owners: Vec<usize> = reach
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(key))
            .map(|(i, _)| i)
            .collect();
        match owners.as_slice() {
            [only] if strategy != SubFolderStrategy::None => {
                segments[*only].schemas.push(key.clone())
            }
            _ => shared_schemas.push(key.clone()),
        }
    }

    debug!(
        "partitioned {} operations into {} segments ({} shared schemas)",
        doc.operation_count(),
        segments.len(),
        shared_schemas.len()
    );
    Partition {
        segments,
        shared_schemas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: Shop, version: "1" }
paths:
  /api/v1/pets:
    get:
      operationId: listPets
      tags: [animals]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { $ref: '#/components/schemas/Pet' }
  /api/v1/pets/{petId}:
    get:
      operationId: getPet
      tags: [animals]
      responses:
        "200": { $ref: '#/components/responses/PetResponse' }
  /orders:
    post:
      operationId: createOrder
      requestBody:
        content:
          application/json:
            schema: { $ref: '#/components/schemas/Order' }
      responses:
        "201": { description: created }
components:
  responses:
    PetResponse:
      description: ok
      content:
        application/json:
          schema: { $ref: '#/components/schemas/Pet' }
  schemas:
    Pet:
      type: object
      properties:
        owner: { $ref: '#/components/schemas/Owner' }
    Owner:
      type: object
      properties:
        name: { type: string }
    Order:
      type: object
      properties:
        pet: { $ref: '#/components/schemas/Pet' }
        buyer: { $ref: '#/components/schemas/Owner' }
        note: { $ref: '#/components/schemas/Note' }
    Note: { type: string }
    Orphan: { type: string }
"##;

    #[test]
    fn meaningful_segments() {
        assert_eq!(first_meaningful_segment("/pets/{petId}"), Some("pets"));
        assert_eq!(first_meaningful_segment("/api/v2.1/store/inventory"), Some("store"));
        assert_eq!(first_meaningful_segment("/{tenant}/orders"), Some("orders"));
        assert_eq!(first_meaningful_segment("/vendors"), Some("vendors"));
        assert_eq!(first_meaningful_segment("/"), None);
        assert_eq!(first_meaningful_segment("/api/v1"), None);
    }

    #[test]
    fn hoists_schemas_used_by_several_segments() {
        let doc = from_yaml(DOC).unwrap();
        let p = partition(&doc, SubFolderStrategy::FirstPathSegment);
        let names: Vec<_> = p.segments.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Pets"), Some("Orders")]);
        assert_eq!(p.segments[0].operations.len(), 2);
        assert!(p.segments[0].schemas.is_empty());
        assert_eq!(p.segments[1].schemas, vec!["Order", "Note"]);
        assert_eq!(p.shared_schemas, vec!["Pet", "Owner", "Orphan"]);
        assert_eq!(p.home_of("Note"), Some(Some("Orders")));
        assert_eq!(p.home_of("Pet"), Some(None));
        assert_eq!(p.home_of("Missing"), None);

        let homes = p.homes();
        assert_eq!(homes.len(), 5);
        for (schema, home) in &homes {
            assert_eq!(p.home_of(schema), Some(*home));
        }
    }

    #[test]
    fn tag_strategy_defaults_untagged() {
        let doc = from_yaml(DOC).unwrap();
        let p = partition(&doc, SubFolderStrategy::OpenApiTag);
        let names: Vec<_> = p.segments.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Animals"), Some("Default")]);
    }

    #[test]
    fn no_strategy_shares_everything() {
        let doc = from_yaml(DOC).unwrap();
        let p = partition(&doc, SubFolderStrategy::None);
        assert_eq!(p.segments.len(), 1);
        assert_eq!(p.segments[0].name, None);
        assert_eq!(p.segments[0].operations.len(), 3);
        assert_eq!(p.shared_schemas.len(), 5);
    }

    #[test]
    fn reachability_follows_refs() {
        let doc = from_yaml(DOC).unwrap();
        let reached = reachable_schemas(&doc, ["Order".to_string()]);
        let names: Vec<_> = reached.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Order", "Pet", "Owner", "Note"]);
    }
}
