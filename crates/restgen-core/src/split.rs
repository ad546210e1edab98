//! Splitting one document into a base file and `{Base}_{Part}.yaml` parts
//! that the merge engine puts back together.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::info;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::naming::normalize_name;
use crate::parse::components::Components;
use crate::parse::content::content_schemas;
use crate::parse::operation::PathItem;
use crate::parse::reference::RefOr;
use crate::parse::schema::{SchemaOrRef, collect_ref_names};
use crate::parse::spec::OpenApiSpec;
use crate::partition::{DEFAULT_SEGMENT, first_meaningful_segment, operation_schema_refs, reachable_schemas};

pub const MIXED_TAG_PATH: &str = "SPL001";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStrategy {
    #[default]
    ByTag,
    ByPathSegment,
}

/// One output file of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitFile {
    pub file_name: String,
    /// `None` for the base file.
    pub part: Option<String>,
    pub document: OpenApiSpec,
}

impl SplitFile {
    pub fn is_base(&self) -> bool {
        self.part.is_none()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(&self.document)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplitResult {
    /// The base file first, then one file per group in document order.
    pub files: Vec<SplitFile>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SplitResult {
    pub fn base(&self) -> Option<&SplitFile> {
        self.files.iter().find(|f| f.is_base())
    }

    pub fn parts(&self) -> impl Iterator<Item = &SplitFile> {
        self.files.iter().filter(|f| !f.is_base())
    }
}

/// Split `doc` into `{base_name}.yaml` and one part per group.
///
/// A path item goes to the group of its first operation. Schemas used by
/// exactly one group travel with it; schemas used by several groups go to
/// the base when `extract_common` is set and to the first group using them
/// otherwise. Unreferenced schemas and those needed by base-only sections
/// stay in the base.
pub fn split(doc: &OpenApiSpec, base_name: &str, strategy: SplitStrategy, extract_common: bool) -> SplitResult {
    let mut diagnostics = Vec::new();
    let mut groups: IndexMap<String, IndexMap<String, PathItem>> = IndexMap::new();

    for (path, item) in &doc.paths {
        let group = group_of(strategy, path, item);
        if strategy == SplitStrategy::ByTag {
            let tags: IndexSet<Option<&str>> = item.operations().map(|(_, op)| op.first_tag()).collect();
            if tags.len() > 1 {
                let listed: Vec<&str> = tags.iter().map(|t| t.unwrap_or("(none)")).collect();
                diagnostics.push(
                    Diagnostic::info(
                        MIXED_TAG_PATH,
                        format!(
                            "path '{path}' mixes operations tagged {}; the whole path goes to part '{group}'",
                            listed.join(", ")
                        ),
                    )
                    .at(format!("paths.{path}")),
                );
            }
        }
        groups.entry(group).or_default().insert(path.clone(), item.clone());
    }

    let reach: Vec<IndexSet<String>> = groups
        .values()
        .map(|paths| {
            let roots = paths
                .values()
                .flat_map(|item| item.operations().flat_map(move |(_, op)| operation_schema_refs(doc, item, op)));
            reachable_schemas(doc, roots)
        })
        .collect();
    let pinned = reachable_schemas(doc, base_section_refs(doc));

    let mut base_schemas: IndexMap<String, SchemaOrRef> = IndexMap::new();
    let mut part_schemas: Vec<IndexMap<String, SchemaOrRef>> = vec![IndexMap::new(); groups.len()];
    for (key, schema) in doc.schemas().into_iter().flatten() {
        let owners: Vec<usize> = reach
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(key))
            .map(|(i, _)| i)
            .collect();
        let home = match owners.as_slice() {
            _ if pinned.contains(key) => None,
            [] => None,
            [only] => Some(*only),
            [first, ..] => (!extract_common).then_some(*first),
        };
        match home {
            Some(i) => part_schemas[i].insert(key.clone(), schema.clone()),
            None => base_schemas.insert(key.clone(), schema.clone()),
        };
    }

    let mut base = doc.clone();
    base.paths = IndexMap::new();
    if let Some(components) = &mut base.components {
        components.schemas = base_schemas;
    }
    if base.components.as_ref().is_some_and(Components::is_empty) {
        base.components = None;
    }

    let mut files = vec![SplitFile {
        file_name: format!("{base_name}.yaml"),
        part: None,
        document: base,
    }];
    for ((group, paths), schemas) in groups.into_iter().zip(part_schemas) {
        let components = (!schemas.is_empty()).then(|| Components {
            schemas,
            ..Components::default()
        });
        files.push(SplitFile {
            file_name: format!("{base_name}_{group}.yaml"),
            part: Some(group),
            document: OpenApiSpec {
                paths,
                components,
                ..OpenApiSpec::default()
            },
        });
    }

    info!(
        "split '{base_name}' into {} part(s) by {:?}",
        files.len() - 1,
        strategy
    );
    SplitResult { files, diagnostics }
}

fn group_of(strategy: SplitStrategy, path: &str, item: &PathItem) -> String {
    let raw = match strategy {
        SplitStrategy::ByTag => item.operations().next().and_then(|(_, op)| op.first_tag()),
        SplitStrategy::ByPathSegment => first_meaningful_segment(path),
    };
    raw.map(|r| normalize_name(r).pascal_case)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_SEGMENT.to_string())
}

/// Schemas referenced from sections that stay in the base: webhooks and
/// reusable parameters, responses and request bodies.
fn base_section_refs(doc: &OpenApiSpec) -> Vec<String> {
    let mut out = Vec::new();
    for entry in doc.webhook_operations() {
        out.extend(operation_schema_refs(doc, entry.path_item, entry.operation));
    }
    let Some(components) = &doc.components else {
        return out;
    };
    let schemas = components
        .parameters
        .values()
        .filter_map(|p| p.as_item()?.effective_schema())
        .chain(
            components
                .responses
                .values()
                .filter_map(RefOr::as_item)
                .flat_map(|r| content_schemas(&r.content).map(|(_, s)| s)),
        )
        .chain(
            components
                .request_bodies
                .values()
                .filter_map(RefOr::as_item)
                .flat_map(|b| content_schemas(&b.content).map(|(_, s)| s)),
        );
    for schema in schemas {
        collect_ref_names(schema, &mut out);
    }
    let mut seen = HashSet::new();
    out.retain(|name| seen.insert(name.clone()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: Shop, version: "1" }
servers:
  - url: https://api.example.com
tags:
  - name: pets
  - name: orders
paths:
  /api/v1/pets:
    get:
      operationId: listPets
      tags: [pets]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { type: array, items: { $ref: '#/components/schemas/Pet' } }
  /api/v1/pets/{petId}/orders:
    get:
      operationId: listPetOrders
      tags: [orders]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Order' }
    post:
      operationId: createPetOrder
      tags: [pets]
      responses:
        "201": { description: created }
  /api/v1/orders:
    get:
      operationId: listOrders
      tags: [orders]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Order' }
components:
  schemas:
    Pet: { type: object, properties: { owner: { $ref: '#/components/schemas/Owner' } } }
    Order: { type: object, properties: { pet: { $ref: '#/components/schemas/Pet' } } }
    Owner: { type: object }
    Unused: { type: object }
"##;

    fn schema_names(file: &SplitFile) -> Vec<&str> {
        file.document
            .schemas()
            .map(|s| s.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn by_tag_follows_first_operation_and_flags_mixed_paths() {
        let doc = from_yaml(DOC).unwrap();
        let result = split(&doc, "Shop", SplitStrategy::ByTag, true);
        let names: Vec<&str> = result.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["Shop.yaml", "Shop_Pets.yaml", "Shop_Orders.yaml"]);
        let orders = &result.files[2];
        assert!(orders.document.paths.contains_key("/api/v1/pets/{petId}/orders"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, MIXED_TAG_PATH);

        // Pet and Owner are reached from both groups.
        assert_eq!(schema_names(result.base().unwrap()), vec!["Pet", "Owner", "Unused"]);
        assert_eq!(schema_names(orders), vec!["Order"]);
        assert!(result.base().unwrap().document.paths.is_empty());
        assert_eq!(result.base().unwrap().document.servers.len(), 1);
    }

    #[test]
    fn by_segment_without_extraction_keeps_schemas_in_first_user() {
        let doc = from_yaml(DOC).unwrap();
        let result = split(&doc, "Shop", SplitStrategy::ByPathSegment, false);
        let parts: Vec<&SplitFile> = result.parts().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part.as_deref(), Some("Pets"));
        assert_eq!(parts[0].document.paths.len(), 2);
        assert_eq!(schema_names(parts[0]), vec!["Pet", "Order", "Owner"]);
        assert!(schema_names(parts[1]).is_empty());
        assert_eq!(schema_names(result.base().unwrap()), vec!["Unused"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn parts_serialize_without_metadata() {
        let doc = from_yaml(DOC).unwrap();
        let result = split(&doc, "Shop", SplitStrategy::ByTag, true);
        let yaml = result.files[1].to_yaml().unwrap();
        assert!(yaml.contains("/api/v1/pets"));
        assert!(!yaml.contains("openapi"));
        assert!(result.files[0].to_yaml().unwrap().contains("openapi:"));
    }
}
