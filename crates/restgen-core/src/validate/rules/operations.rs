use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToPascalCase};

use crate::diagnostics::Diagnostic;
use crate::naming::{is_plural, pluralize, route_to_name, singularize, split_words};
use crate::parse::content::preferred_media_type;
use crate::parse::operation::{HttpMethod, path_template_params};
use crate::parse::parameter::ParameterLocation;
use crate::parse::schema::SchemaKind;
use crate::parse::spec::{OpenApiSpec, OperationEntry};
use crate::validate::RuleContext;

use super::resolved_parameters;

pub const MISSING_OPERATION_ID: &str = "OPR001";
pub const DUPLICATE_OPERATION_ID: &str = "OPR002";
pub const GET_PREFIX: &str = "OPR003";
pub const POST_PREFIX: &str = "OPR004";
pub const PUT_PREFIX: &str = "OPR005";
pub const PATCH_PREFIX: &str = "OPR006";
pub const DELETE_PREFIX: &str = "OPR007";
pub const PLURAL_RETURNS_OBJECT: &str = "OPR008";
pub const SINGULAR_RETURNS_ARRAY: &str = "OPR009";
pub const UNDECLARED_PATH_PARAM: &str = "OPR010";
pub const UNUSED_PATH_PARAM: &str = "OPR011";
pub const OPTIONAL_PATH_PARAM: &str = "OPR012";

const GET_VERBS: &[&str] = &[
    "get", "list", "search", "find", "count", "check", "is", "has", "export", "download",
];
const POST_VERBS: &[&str] = &[
    "create", "add", "post", "send", "search", "execute", "upload", "import", "start", "stop",
    "set", "register", "login", "logout", "validate", "process", "generate",
];
const PUT_VERBS: &[&str] = &["update", "replace", "set", "put", "upsert", "assign"];
const PATCH_VERBS: &[&str] = &["update", "patch", "modify", "set", "partial"];
const DELETE_VERBS: &[&str] = &["delete", "remove", "clear", "cancel", "revoke", "unassign"];

/// Words that end the noun phrase of an operationId (`getPetById`).
const PREPOSITIONS: &[&str] = &["by", "for", "with", "from", "in", "of", "to", "on", "at"];

pub fn missing_operation_id(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .operations()
        .filter(|e| {
            e.operation
                .operation_id
                .as_deref()
                .is_none_or(|id| id.trim().is_empty())
        })
        .map(|e| {
            Diagnostic::error(
                MISSING_OPERATION_ID,
                format!("{} {} has no operationId", e.method, e.path),
            )
            .at(e.pointer())
            .with_suggestion(route_to_name(e.method, e.path))
        })
        .collect()
}

pub fn duplicate_operation_id(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<&str, String> = HashMap::new();
    let mut out = Vec::new();
    for entry in ctx.document.operations() {
        let Some(id) = entry.operation.operation_id.as_deref() else {
            continue;
        };
        match first_seen.get(id) {
            Some(first) => out.push(
                Diagnostic::error(
                    DUPLICATE_OPERATION_ID,
                    format!("operationId '{id}' is already used by {first}"),
                )
                .at(entry.pointer()),
            ),
            None => {
                first_seen.insert(id, format!("{} {}", entry.method, entry.path));
            }
        }
    }
    out
}

pub fn get_prefix(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    verb_prefix(ctx, HttpMethod::Get, GET_PREFIX, GET_VERBS)
}

pub fn post_prefix(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    verb_prefix(ctx, HttpMethod::Post, POST_PREFIX, POST_VERBS)
}

pub fn put_prefix(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    verb_prefix(ctx, HttpMethod::Put, PUT_PREFIX, PUT_VERBS)
}

pub fn patch_prefix(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    verb_prefix(ctx, HttpMethod::Patch, PATCH_PREFIX, PATCH_VERBS)
}

pub fn delete_prefix(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    verb_prefix(ctx, HttpMethod::Delete, DELETE_PREFIX, DELETE_VERBS)
}

fn verb_prefix(
    ctx: &RuleContext<'_>,
    method: HttpMethod,
    code: &'static str,
    verbs: &[&str],
) -> Vec<Diagnostic> {
    ctx.document
        .operations()
        .filter(|e| e.method == method)
        .filter_map(|e| {
            let id = e.operation.operation_id.as_deref()?;
            let words = split_words(id);
            let first = words.first()?;
            if verbs.contains(&first.as_str()) {
                return None;
            }
            let rest: String = if words.len() > 1 {
                words[1..].join("_").to_pascal_case()
            } else {
                words[0].to_pascal_case()
            };
            Some(
                Diagnostic::warning(
                    code,
                    format!(
                        "{method} operation '{id}' should start with one of: {}",
                        verbs.join(", ")
                    ),
                )
                .at(e.pointer())
                .with_suggestion(format!("{}{rest}", verbs[0])),
            )
        })
        .collect()
}

/// Index into `words` of the noun an operationId acts on: the last word
/// before any preposition, after dropping the leading verb.
fn noun_index(words: &[String]) -> Option<usize> {
    if words.len() < 2 {
        return None;
    }
    let phrase = words[1..]
        .iter()
        .take_while(|w| !PREPOSITIONS.contains(&w.as_str()))
        .count();
    (phrase > 0).then_some(phrase)
}

pub(crate) fn operation_noun(operation_id: &str) -> Option<String> {
    let words = split_words(operation_id);
    noun_index(&words).map(|i| words[i].clone())
}

/// The operationId in camelCase with its noun swapped for `noun`.
fn with_noun(operation_id: &str, noun: &str) -> String {
    let mut words = split_words(operation_id);
    if let Some(i) = noun_index(&words) {
        words[i] = noun.to_string();
    }
    words.join("_").to_lower_camel_case()
}

/// Shape of the first JSON-ish success payload.
fn success_shape(doc: &OpenApiSpec, entry: &OperationEntry<'_>) -> Option<SchemaKind> {
    let (_, response) = entry
        .operation
        .responses
        .iter()
        .find(|(status, _)| status.starts_with('2'))?;
    let response = doc.resolve(response)?;
    let (_, media) = preferred_media_type(&response.content)?;
    let schema = doc.resolve_schema(media.schema.as_ref()?)?;
    match schema.kind() {
        SchemaKind::Composition => Some(SchemaKind::Object),
        other => Some(other),
    }
}

pub fn plural_returns_object(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    shape_mismatch(ctx, true)
}

pub fn singular_returns_array(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    shape_mismatch(ctx, false)
}

fn shape_mismatch(ctx: &RuleContext<'_>, plural: bool) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    for entry in doc.operations() {
        let Some(id) = entry.operation.operation_id.as_deref() else {
            continue;
        };
        let Some(noun) = operation_noun(id) else {
            continue;
        };
        if is_plural(&noun) != Some(plural) {
            continue;
        }
        let Some(shape) = success_shape(doc, &entry) else {
            continue;
        };
        let diag = match (plural, shape) {
            (true, SchemaKind::Object) => Diagnostic::warning(
                PLURAL_RETURNS_OBJECT,
                format!(
                    "operationId '{id}' is plural ('{noun}') but returns a single object"
                ),
            )
            .with_suggestion(with_noun(id, &singularize(&noun))),
            (false, SchemaKind::Array) => Diagnostic::warning(
                SINGULAR_RETURNS_ARRAY,
                format!("operationId '{id}' is singular ('{noun}') but returns an array"),
            )
            .with_suggestion(with_noun(id, &pluralize(&noun))),
            _ => continue,
        };
        out.push(diag.at(entry.pointer()));
    }
    out
}

/// Every `{param}` must be declared as a path parameter by each
/// operation on the path (directly or through the path item). Reported
/// once per placeholder, naming the operations that miss it.
pub fn undeclared_path_params(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    for (path, item) in &doc.paths {
        for placeholder in path_template_params(path) {
            let missing: Vec<String> = item
                .operations()
                .filter(|(_, op)| {
                    !resolved_parameters(doc, item, op)
                        .iter()
                        .any(|p| p.location == ParameterLocation::Path && p.name == placeholder)
                })
                .map(|(method, op)| {
                    op.operation_id
                        .clone()
                        .unwrap_or_else(|| format!("{method} {path}"))
                })
                .collect();
            if missing.is_empty() {
                continue;
            }
            out.push(
                Diagnostic::error(
                    UNDECLARED_PATH_PARAM,
                    format!(
                        "path '{path}' uses '{{{placeholder}}}' but no path parameter '{placeholder}' is declared for {}",
                        missing.join(", ")
                    ),
                )
                .at(format!("paths.{path}"))
                .with_suggestion(format!(
                    "- name: {placeholder}\n  in: path\n  required: true\n  schema:\n    type: string"
                )),
            );
        }
    }
    out
}

pub fn unused_path_params(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    path_param_declarations(ctx.document)
        .into_iter()
        .filter(|d| !path_template_params(d.path).contains(&d.name))
        .map(|d| {
            Diagnostic::error(
                UNUSED_PATH_PARAM,
                format!(
                    "path parameter '{}' does not appear in path '{}'",
                    d.name, d.path
                ),
            )
            .at(d.pointer)
        })
        .collect()
}

pub fn optional_path_params(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    path_param_declarations(ctx.document)
        .into_iter()
        .filter(|d| !d.required || d.nullable)
        .map(|d| {
            let problem = if d.nullable {
                "is nullable"
            } else {
                "is not marked 'required: true'"
            };
            Diagnostic::error(
                OPTIONAL_PATH_PARAM,
                format!("path parameter '{}' {problem}", d.name),
            )
            .at(d.pointer)
            .with_suggestion("required: true")
        })
        .collect()
}

struct PathParamDecl<'a> {
    path: &'a str,
    name: &'a str,
    required: bool,
    nullable: bool,
    pointer: String,
}

/// Every `in: path` declaration, each reported where it is written:
/// once for the path item, once per operation.
fn path_param_declarations(doc: &OpenApiSpec) -> Vec<PathParamDecl<'_>> {
    let mut out = Vec::new();
    for (path, item) in &doc.paths {
        let scopes = std::iter::once((format!("paths.{path}.parameters"), &item.parameters)).chain(
            item.operations()
                .map(|(m, op)| (format!("paths.{path}.{}.parameters", m.key()), &op.parameters)),
        );
        for (pointer, params) in scopes {
            for param in params {
                let Some(p) = doc.resolve(param) else {
                    continue;
                };
                if p.location != ParameterLocation::Path {
                    continue;
                }
                out.push(PathParamDecl {
                    path,
                    name: &p.name,
                    required: p.required,
                    nullable: p.is_nullable(),
                    pointer: format!("{pointer}.{}", p.name),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    fn run(check: fn(&RuleContext<'_>) -> Vec<Diagnostic>, yaml: &str) -> Vec<Diagnostic> {
        let doc = from_yaml(yaml).unwrap();
        check(&RuleContext {
            document: &doc,
            parser_diagnostics: &[],
        })
    }

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: T, version: "1" }
paths:
  /pets:
    get:
      operationId: fetchPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Pet' }
    post:
      responses:
        "201": { description: created }
  /pets/{petId}:
    get:
      operationId: getPetById
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { $ref: '#/components/schemas/Pet' }
    delete:
      operationId: fetchPets
      parameters:
        - { name: petId, in: path, schema: { type: string } }
        - { name: ownerId, in: path, required: true, schema: { type: string } }
      responses:
        "204": { description: gone }
components:
  schemas:
    Pet: { type: object, properties: { name: { type: string } } }
"##;

    #[test]
    fn missing_ids_get_route_suggestion() {
        let diags = run(missing_operation_id, DOC);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].suggestions, vec!["createPets"]);
    }

    #[test]
    fn duplicate_ids() {
        let diags = run(duplicate_operation_id, DOC);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("GET /pets"));
    }

    #[test]
    fn verb_prefixes() {
        let get = run(get_prefix, DOC);
        assert_eq!(get.len(), 1);
        assert_eq!(get[0].suggestions, vec!["getPets"]);
        let delete = run(delete_prefix, DOC);
        assert_eq!(delete.len(), 1);
        assert!(run(post_prefix, DOC).is_empty());
    }

    #[test]
    fn noun_extraction() {
        assert_eq!(operation_noun("getPetById").as_deref(), Some("pet"));
        assert_eq!(operation_noun("listUserPosts").as_deref(), Some("posts"));
        assert_eq!(operation_noun("getPets").as_deref(), Some("pets"));
        assert_eq!(operation_noun("pets"), None);
        assert_eq!(operation_noun("getByName"), None);
    }

    #[test]
    fn noun_swap_handles_every_casing() {
        assert_eq!(with_noun("get-pets", "pet"), "getPet");
        assert_eq!(with_noun("list_user_posts", "post"), "listUserPost");
        assert_eq!(with_noun("getPetById", "pets"), "getPetsById");
    }

    #[test]
    fn plural_and_singular_shapes() {
        let plural = run(plural_returns_object, DOC);
        assert_eq!(plural.len(), 1);
        assert!(plural[0].message.contains("fetchPets"));
        assert_eq!(plural[0].suggestions, vec!["fetchPet"]);

        let singular = run(singular_returns_array, DOC);
        assert_eq!(singular.len(), 1);
        assert!(singular[0].message.contains("getPetById"));
        assert_eq!(singular[0].suggestions, vec!["getPetsById"]);
    }

    #[test]
    fn path_parameter_consistency() {
        let undeclared = run(undeclared_path_params, DOC);
        assert_eq!(undeclared.len(), 1);
        assert!(undeclared[0].message.contains("getPetById"));
        assert!(!undeclared[0].message.contains("fetchPets"));

        let unused = run(unused_path_params, DOC);
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("ownerId"));

        let optional = run(optional_path_params, DOC);
        assert_eq!(optional.len(), 1);
        assert!(optional[0].message.contains("'petId' is not marked"));
    }
}
