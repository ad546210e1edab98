use heck::ToPascalCase;

use crate::diagnostics::Diagnostic;
use crate::parse::schema::{ChildSlot, Schema, SchemaKind, SchemaOrRef, SchemaType};
use crate::validate::RuleContext;
use crate::validate::walk::{SchemaRoot, SchemaVisit, for_each_schema};

pub const MISSING_TITLE: &str = "SCH002";
pub const TITLE_CASING: &str = "SCH003";
pub const INLINE_PROPERTY_OBJECT: &str = "SCH004";
pub const INLINE_ITEMS_OBJECT: &str = "SCH005";
pub const REF_SIBLINGS: &str = "SCH006";
pub const CONST_KEYWORD: &str = "SCH007";
pub const UNEVALUATED_PROPERTIES: &str = "SCH008";
pub const ARRAY_WITHOUT_ITEMS: &str = "SCH009";
pub const UNDECLARED_REQUIRED: &str = "SCH010";
pub const INLINE_BODY_OBJECT: &str = "SCH011";

/// Keywords that may sit next to `$ref` without changing its meaning.
const ALLOWED_REF_SIBLINGS: &[&str] = &["description", "summary"];

/// Run `check` over every inline schema node and collect what it reports.
fn each_schema(
    ctx: &RuleContext<'_>,
    mut check: impl FnMut(&SchemaVisit<'_>, &Schema) -> Option<Diagnostic>,
) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for_each_schema(ctx.document, |visit| {
        if let SchemaOrRef::Schema(schema) = visit.node
            && let Some(d) = check(visit, &**schema)
        {
            out.push(d);
        }
    });
    out
}

pub fn missing_title(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let Some(schemas) = ctx.document.schemas() else {
        return Vec::new();
    };
    schemas
        .iter()
        .filter_map(|(name, node)| {
            let schema = node.as_schema()?;
            let shaped = matches!(schema.kind(), SchemaKind::Object | SchemaKind::Array);
            if !shaped || schema.title.is_some() {
                return None;
            }
            Some(
                Diagnostic::warning(MISSING_TITLE, format!("schema '{name}' has no title"))
                    .at(format!("components.schemas.{name}"))
                    .with_suggestion(format!("title: {name}")),
            )
        })
        .collect()
}

pub fn title_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        let title = schema.title.as_deref()?;
        if title.starts_with(|c: char| c.is_uppercase()) {
            return None;
        }
        Some(
            Diagnostic::warning(
                TITLE_CASING,
                format!("title '{title}' should start with an uppercase letter"),
            )
            .at(visit.pointer)
            .with_suggestion(title.to_pascal_case()),
        )
    })
}

pub fn inline_property_object(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        let label = match visit.slot? {
            ChildSlot::Property(name) => format!("property '{name}'"),
            ChildSlot::AdditionalProperties => "additionalProperties".to_string(),
            _ => return None,
        };
        schema.is_inline_model().then(|| {
            Diagnostic::error(
                INLINE_PROPERTY_OBJECT,
                format!("{label} declares an inline object; move it to components.schemas"),
            )
            .at(visit.pointer)
        })
    })
}

pub fn inline_items_object(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        (visit.slot == Some(ChildSlot::Items) && schema.is_inline_model()).then(|| {
            Diagnostic::error(
                INLINE_ITEMS_OBJECT,
                "array items declare an inline object; move it to components.schemas",
            )
            .at(visit.pointer)
        })
    })
}

pub fn ref_siblings(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for_each_schema(ctx.document, |visit| {
        let SchemaOrRef::Ref(r) = visit.node else {
            return;
        };
        let extra: Vec<&str> = r
            .siblings
            .keys()
            .map(String::as_str)
            .filter(|k| !ALLOWED_REF_SIBLINGS.contains(k))
            .collect();
        if !extra.is_empty() {
            out.push(
                Diagnostic::warning(
                    REF_SIBLINGS,
                    format!(
                        "keywords next to $ref are ignored: {}",
                        extra.join(", ")
                    ),
                )
                .at(visit.pointer)
                .with_suggestion(format!("allOf:\n  - $ref: '{}'", r.target)),
            );
        }
    });
    out
}

pub fn const_keyword(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        schema.const_value.as_ref().map(|value| {
            Diagnostic::warning(
                CONST_KEYWORD,
                format!("const ({value}) is not supported; use a single-value enum"),
            )
            .at(visit.pointer)
            .with_suggestion(format!("enum: [{value}]"))
        })
    })
}

pub fn unevaluated_properties(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        schema.unevaluated_properties.as_ref().map(|_| {
            Diagnostic::warning(
                UNEVALUATED_PROPERTIES,
                "unevaluatedProperties is not supported; use additionalProperties",
            )
            .at(visit.pointer)
        })
    })
}

pub fn array_without_items(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        let is_array = schema
            .schema_type
            .as_ref()
            .is_some_and(|t| t.contains(SchemaType::Array));
        (is_array && schema.items.is_none() && schema.prefix_items.is_empty()).then(|| {
            Diagnostic::error(ARRAY_WITHOUT_ITEMS, "array schema does not declare items")
                .at(visit.pointer)
                .with_suggestion("items:\n  type: string")
        })
    })
}

/// Composed schemas may inherit the property from an `allOf` member, so
/// they are skipped.
pub fn undeclared_required(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for_each_schema(ctx.document, |visit| {
        let SchemaOrRef::Schema(schema) = visit.node else {
            return;
        };
        if !schema.all_of.is_empty() {
            return;
        }
        for name in &schema.required {
            if !schema.properties.contains_key(name) {
                out.push(
                    Diagnostic::warning(
                        UNDECLARED_REQUIRED,
                        format!("required property '{name}' is not declared in properties"),
                    )
                    .at(visit.pointer),
                );
            }
        }
    });
    out
}

pub fn inline_body_object(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    each_schema(ctx, |visit, schema| {
        let place = match visit.root {
            SchemaRoot::RequestBody => "request body",
            SchemaRoot::Response => "response",
            _ => return None,
        };
        (visit.slot.is_none() && schema.is_inline_model()).then(|| {
            Diagnostic::warning(
                INLINE_BODY_OBJECT,
                format!("{place} declares an inline object; reference a component schema"),
            )
            .at(visit.pointer)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    const DOC: &str = r##"
openapi: 3.1.0
info: { title: T, version: "1" }
paths:
  /pets:
    post:
      operationId: createPet
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name: { type: string }
      responses:
        "201":
          description: created
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Pet' }
components:
  schemas:
    Pet:
      type: object
      title: pet
      required: [name, id]
      properties:
        name: { type: string }
        kind: { const: dog }
        owner:
          type: object
          properties:
            id: { type: string }
        friends:
          type: array
          items:
            type: object
            properties:
              id: { type: string }
        tags: { type: array }
        parent:
          $ref: '#/components/schemas/Pet'
          description: the parent
        sibling:
          $ref: '#/components/schemas/Pet'
          nullable: true
      unevaluatedProperties: false
    PetList:
      type: array
      items: { $ref: '#/components/schemas/Pet' }
    Dog:
      allOf:
        - $ref: '#/components/schemas/Pet'
      required: [name]
"##;

    fn run(check: fn(&RuleContext<'_>) -> Vec<Diagnostic>) -> Vec<Diagnostic> {
        let doc = from_yaml(DOC).unwrap();
        check(&RuleContext {
            document: &doc,
            parser_diagnostics: &[],
        })
    }

    fn pointers(diags: &[Diagnostic]) -> Vec<&str> {
        diags
            .iter()
            .filter_map(|d| d.location.pointer.as_deref())
            .collect()
    }

    #[test]
    fn titles() {
        let missing = run(missing_title);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].suggestions, vec!["title: PetList"]);

        let casing = run(title_casing);
        assert_eq!(casing.len(), 1);
        assert_eq!(casing[0].suggestions, vec!["Pet"]);
    }

    #[test]
    fn inline_objects() {
        assert_eq!(
            pointers(&run(inline_property_object)),
            vec!["components.schemas.Pet.properties.owner"]
        );
        assert_eq!(
            pointers(&run(inline_items_object)),
            vec!["components.schemas.Pet.properties.friends.items"]
        );
        assert_eq!(
            pointers(&run(inline_body_object)),
            vec!["paths./pets.post.requestBody.content.application/json.schema"]
        );
    }

    #[test]
    fn ref_siblings_allow_description() {
        let diags = run(ref_siblings);
        assert_eq!(
            pointers(&diags),
            vec!["components.schemas.Pet.properties.sibling"]
        );
        assert!(diags[0].message.contains("nullable"));
    }

    #[test]
    fn unsupported_keywords() {
        assert_eq!(
            pointers(&run(const_keyword)),
            vec!["components.schemas.Pet.properties.kind"]
        );
        assert_eq!(pointers(&run(unevaluated_properties)), vec!["components.schemas.Pet"]);
        assert_eq!(
            pointers(&run(array_without_items)),
            vec!["components.schemas.Pet.properties.tags"]
        );
    }

    #[test]
    fn required_names_must_exist_unless_composed() {
        let diags = run(undeclared_required);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'id'"));
    }
}
