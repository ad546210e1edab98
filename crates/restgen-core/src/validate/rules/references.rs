use indexmap::IndexMap;

use crate::diagnostics::Diagnostic;
use crate::parse::components::ComponentKind;
use crate::parse::operation::PathItem;
use crate::parse::reference::RefOr;
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::OpenApiSpec;
use crate::parse::{PARSE_MISSING_METADATA, PARSE_SYNTAX};
use crate::validate::RuleContext;
use crate::validate::walk::for_each_schema;

pub const PARSER: &str = PARSE_SYNTAX;
pub const MISSING_METADATA: &str = PARSE_MISSING_METADATA;
pub const UNRESOLVED_REF: &str = "SCH001";

pub fn parser_passthrough(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.parser_diagnostics.to_vec()
}

pub fn missing_metadata(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    if doc.openapi.trim().is_empty() {
        out.push(
            Diagnostic::error(MISSING_METADATA, "document does not declare an 'openapi' version")
                .at("openapi")
                .with_suggestion("openapi: 3.0.3"),
        );
    }
    if doc.info.title.trim().is_empty() {
        out.push(
            Diagnostic::error(MISSING_METADATA, "document does not declare 'info.title'")
                .at("info.title"),
        );
    }
    out
}

pub fn unresolved_refs(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    let empty = IndexMap::new();
    let schemas = doc.schemas().unwrap_or(&empty);

    for_each_schema(doc, |visit| {
        let SchemaOrRef::Ref(r) = visit.node else {
            return;
        };
        let resolved = r.schema_name().is_some_and(|n| schemas.contains_key(n));
        if !resolved {
            let name = r.schema_name().unwrap_or(r.target.as_str());
            out.push(unresolved(&r.target, visit.pointer, name, schemas.keys()));
        }
    });

    if let Some(components) = &doc.components {
        for (name, param) in &components.parameters {
            check_component(doc, param, &format!("components.parameters.{name}"), &mut out);
        }
    }
    for (pointer, item) in path_items(doc) {
        check_path_item(doc, &pointer, item, &mut out);
    }
    out
}

fn path_items(doc: &OpenApiSpec) -> impl Iterator<Item = (String, &PathItem)> {
    doc.paths
        .iter()
        .map(|(p, item)| (format!("paths.{p}"), item))
        .chain(
            doc.webhooks
                .iter()
                .map(|(n, item)| (format!("webhooks.{n}"), item)),
        )
}

fn check_path_item(doc: &OpenApiSpec, pointer: &str, item: &PathItem, out: &mut Vec<Diagnostic>) {
    for param in &item.parameters {
        check_component(doc, param, &format!("{pointer}.parameters"), out);
    }
    for (method, op) in item.operations() {
        let op_pointer = format!("{pointer}.{}", method.key());
        for param in &op.parameters {
            check_component(doc, param, &format!("{op_pointer}.parameters"), out);
        }
        if let Some(body) = &op.request_body {
            check_component(doc, body, &format!("{op_pointer}.requestBody"), out);
        }
        for (status, response) in &op.responses {
            check_component(doc, response, &format!("{op_pointer}.responses.{status}"), out);
        }
    }
}

/// Report a `$ref` whose target is missing from its `components` section.
/// Only the first hop is checked; the target is reported where it is
/// declared.
fn check_component<T: ComponentKind>(
    doc: &OpenApiSpec,
    node: &RefOr<T>,
    pointer: &str,
    out: &mut Vec<Diagnostic>,
) {
    let RefOr::Ref(reference) = node else {
        return;
    };
    let empty = IndexMap::new();
    let section = doc.components.as_ref().map_or(&empty, T::registry);
    let name = reference.component_in(T::SECTION);
    if name.is_some_and(|n| section.contains_key(n)) {
        return;
    }
    out.push(unresolved(
        &reference.target,
        pointer,
        name.unwrap_or(&reference.target),
        section.keys(),
    ));
}

fn unresolved<'a>(
    ref_path: &str,
    pointer: &str,
    name: &str,
    candidates: impl Iterator<Item = &'a String>,
) -> Diagnostic {
    let mut d = Diagnostic::error(
        UNRESOLVED_REF,
        format!("unresolved reference '{ref_path}'"),
    )
    .at(pointer);
    let target_section = ref_path.rsplit_once('/').map_or("", |(s, _)| s);
    for candidate in candidates {
        if candidate.eq_ignore_ascii_case(name) {
            d = d.with_suggestion(format!("{target_section}/{candidate}"));
        }
    }
    d
}
