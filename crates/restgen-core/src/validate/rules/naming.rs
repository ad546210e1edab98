use crate::diagnostics::Diagnostic;
use crate::naming::{Casing, detect_casing, normalize_name};
use crate::parse::parameter::{Parameter, ParameterLocation, ParameterOrRef};
use crate::parse::schema::ChildSlot;
use crate::validate::RuleContext;
use crate::validate::walk::{SchemaRoot, for_each_schema};

pub const OPERATION_ID_CASING: &str = "NAM001";
pub const SCHEMA_NAME_CASING: &str = "NAM002";
pub const PROPERTY_NAME_CASING: &str = "NAM003";
pub const PARAMETER_NAME_CASING: &str = "NAM004";

pub fn operation_id_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .operations()
        .filter_map(|entry| {
            let id = entry.operation.operation_id.as_deref()?;
            let casing = detect_casing(id);
            if matches!(casing, Casing::Camel | Casing::Kebab) {
                return None;
            }
            Some(
                Diagnostic::warning(
                    OPERATION_ID_CASING,
                    format!(
                        "operationId '{id}' is {}; use camelCase or kebab-case",
                        casing.describe()
                    ),
                )
                .at(entry.pointer())
                .with_suggestion(normalize_name(id).camel_case),
            )
        })
        .collect()
}

pub fn schema_name_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let Some(schemas) = ctx.document.schemas() else {
        return Vec::new();
    };
    schemas
        .keys()
        .filter(|name| detect_casing(name) != Casing::Pascal)
        .map(|name| {
            Diagnostic::warning(
                SCHEMA_NAME_CASING,
                format!(
                    "schema name '{name}' is {}; use PascalCase",
                    detect_casing(name).describe()
                ),
            )
            .at(format!("components.schemas.{name}"))
            .with_suggestion(normalize_name(name).pascal_case)
        })
        .collect()
}

/// Property names inside component schemas, including nested inline
/// schemas.
pub fn property_name_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for_each_schema(ctx.document, |visit| {
        if visit.root != SchemaRoot::Component {
            return;
        }
        let Some(ChildSlot::Property(name)) = visit.slot else {
            return;
        };
        let casing = detect_casing(name);
        if casing != Casing::Camel {
            out.push(
                Diagnostic::warning(
                    PROPERTY_NAME_CASING,
                    format!("property '{name}' is {}; use camelCase", casing.describe()),
                )
                .at(visit.pointer)
                .with_suggestion(normalize_name(name).camel_case),
            );
        }
    });
    out
}

/// Path and query parameter names. Headers and cookies keep their wire
/// spelling.
pub fn parameter_name_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    if let Some(components) = &doc.components {
        for (key, param) in &components.parameters {
            check_parameter(param, &format!("components.parameters.{key}"), &mut out);
        }
    }
    for (path, item) in &doc.paths {
        for param in &item.parameters {
            check_parameter(param, &format!("paths.{path}.parameters"), &mut out);
        }
        for (method, op) in item.operations() {
            for param in &op.parameters {
                check_parameter(
                    param,
                    &format!("paths.{path}.{}.parameters", method.key()),
                    &mut out,
                );
            }
        }
    }
    out
}

fn check_parameter(param: &ParameterOrRef, pointer: &str, out: &mut Vec<Diagnostic>) {
    let ParameterOrRef::Item(Parameter { name, location, .. }) = param else {
        return;
    };
    if !matches!(location, ParameterLocation::Path | ParameterLocation::Query) {
        return;
    }
    let casing = detect_casing(name);
    if casing == Casing::Camel {
        return;
    }
    out.push(
        Diagnostic::warning(
            PARAMETER_NAME_CASING,
            format!(
                "{} parameter '{name}' is {}; use camelCase",
                location.as_str(),
                casing.describe()
            ),
        )
        .at(format!("{pointer}.{name}"))
        .with_suggestion(normalize_name(name).camel_case),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;
    use crate::parse::spec::OpenApiSpec;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: T, version: "1" }
paths:
  /pets/{pet_id}:
    parameters:
      - { name: pet_id, in: path, required: true, schema: { type: string } }
      - { name: X-Request-Id, in: header, schema: { type: string } }
    get:
      operationId: GetPet
      parameters:
        - { name: include-owner, in: query, schema: { type: boolean } }
      responses:
        "200": { description: ok }
    delete:
      operationId: delete-pet
      responses:
        "204": { description: gone }
components:
  schemas:
    pet_record:
      type: object
      properties:
        petName: { type: string }
        created_at: { type: string }
        owner:
          type: object
          properties:
            FullName: { type: string }
"##;

    fn run(check: fn(&RuleContext<'_>) -> Vec<Diagnostic>, doc: &OpenApiSpec) -> Vec<Diagnostic> {
        check(&RuleContext {
            document: doc,
            parser_diagnostics: &[],
        })
    }

    #[test]
    fn operation_ids() {
        let doc = from_yaml(DOC).unwrap();
        let diags = run(operation_id_casing, &doc);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'GetPet' is PascalCase"));
        assert_eq!(diags[0].suggestions, vec!["getPet"]);
    }

    #[test]
    fn schema_names() {
        let doc = from_yaml(DOC).unwrap();
        let diags = run(schema_name_casing, &doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].suggestions, vec!["PetRecord"]);
    }

    #[test]
    fn property_names() {
        let doc = from_yaml(DOC).unwrap();
        let diags = run(property_name_casing, &doc);
        let suggestions: Vec<_> = diags.iter().map(|d| d.suggestions[0].as_str()).collect();
        assert_eq!(suggestions, vec!["createdAt", "fullName"]);
    }

    #[test]
    fn parameter_names_skip_headers() {
        let doc = from_yaml(DOC).unwrap();
        let diags = run(parameter_name_casing, &doc);
        let suggestions: Vec<_> = diags.iter().map(|d| d.suggestions[0].as_str()).collect();
        assert_eq!(suggestions, vec!["petId", "includeOwner"]);
    }
}
