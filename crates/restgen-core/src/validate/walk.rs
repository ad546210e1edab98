use crate::parse::content::{Content, RequestBodyOrRef, ResponseOrRef, content_schemas};
use crate::parse::operation::PathItem;
use crate::parse::parameter::ParameterOrRef;
use crate::parse::schema::{ChildSlot, SchemaOrRef, for_each_child};
use crate::parse::spec::OpenApiSpec;

/// What kind of definition a top-level schema hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRoot {
    Component,
    Parameter,
    RequestBody,
    Response,
}

/// One schema node reached while walking a document.
#[derive(Debug, Clone, Copy)]
pub struct SchemaVisit<'a> {
    pub root: SchemaRoot,
    pub pointer: &'a str,
    pub node: &'a SchemaOrRef,
    /// Slot in the parent schema; `None` for a root schema.
    pub slot: Option<ChildSlot<'a>>,
}

/// Visit every root schema in document order: component schemas, then
/// reusable parameters, request bodies and responses, then everything
/// under `paths` and `webhooks`.
pub fn for_each_root_schema<'a>(
    doc: &'a OpenApiSpec,
    mut f: impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    if let Some(components) = &doc.components {
        for (name, schema) in &components.schemas {
            f(SchemaRoot::Component, format!("components.schemas.{name}"), schema);
        }
        for (name, param) in &components.parameters {
            parameter_schema(param, format!("components.parameters.{name}"), &mut f);
        }
        for (name, body) in &components.request_bodies {
            body_schemas(body, format!("components.requestBodies.{name}"), &mut f);
        }
        for (name, response) in &components.responses {
            response_schemas(response, format!("components.responses.{name}"), &mut f);
        }
    }
    for (path, item) in &doc.paths {
        path_item_schemas(item, format!("paths.{path}"), &mut f);
    }
    for (name, item) in &doc.webhooks {
        path_item_schemas(item, format!("webhooks.{name}"), &mut f);
    }
}

/// Visit every schema node in the document, roots and inline children.
pub fn for_each_schema(doc: &OpenApiSpec, mut f: impl FnMut(&SchemaVisit<'_>)) {
    for_each_root_schema(doc, |root, pointer, node| {
        walk(root, &pointer, node, None, &mut f);
    });
}

fn walk<'a>(
    root: SchemaRoot,
    pointer: &str,
    node: &'a SchemaOrRef,
    slot: Option<ChildSlot<'a>>,
    f: &mut impl FnMut(&SchemaVisit<'_>),
) {
    f(&SchemaVisit {
        root,
        pointer,
        node,
        slot,
    });
    if let SchemaOrRef::Schema(schema) = node {
        for_each_child(schema, |child_slot, child| {
            let child_pointer = format!("{pointer}.{}", child_slot.pointer());
            walk(root, &child_pointer, child, Some(child_slot), f);
        });
    }
}

fn path_item_schemas<'a>(
    item: &'a PathItem,
    pointer: String,
    f: &mut impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    for param in &item.parameters {
        parameter_schema(param, format!("{pointer}.parameters"), f);
    }
    for (method, op) in item.operations() {
        let op_pointer = format!("{pointer}.{}", method.key());
        for param in &op.parameters {
            parameter_schema(param, format!("{op_pointer}.parameters"), f);
        }
        if let Some(body) = &op.request_body {
            body_schemas(body, format!("{op_pointer}.requestBody"), f);
        }
        for (status, response) in &op.responses {
            response_schemas(response, format!("{op_pointer}.responses.{status}"), f);
        }
    }
}

fn parameter_schema<'a>(
    param: &'a ParameterOrRef,
    pointer: String,
    f: &mut impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    let Some(p) = param.as_item() else {
        return;
    };
    if let Some(schema) = &p.schema {
        f(SchemaRoot::Parameter, format!("{pointer}.{}.schema", p.name), schema);
    }
    media_schemas(&p.content, SchemaRoot::Parameter, &format!("{pointer}.{}", p.name), f);
}

fn body_schemas<'a>(
    body: &'a RequestBodyOrRef,
    pointer: String,
    f: &mut impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    if let Some(b) = body.as_item() {
        media_schemas(&b.content, SchemaRoot::RequestBody, &pointer, f);
    }
}

fn response_schemas<'a>(
    response: &'a ResponseOrRef,
    pointer: String,
    f: &mut impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    if let Some(r) = response.as_item() {
        media_schemas(&r.content, SchemaRoot::Response, &pointer, f);
    }
}

fn media_schemas<'a>(
    content: &'a Content,
    root: SchemaRoot,
    pointer: &str,
    f: &mut impl FnMut(SchemaRoot, String, &'a SchemaOrRef),
) {
    for (media, schema) in content_schemas(content) {
        f(root, format!("{pointer}.content.{media}.schema"), schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    #[test]
    fn visits_nested_and_operation_schemas() {
        let doc = from_yaml(
            r##"
openapi: 3.0.3
info: { title: T, version: "1" }
paths:
  /pets:
    get:
      parameters:
        - name: limit
          in: query
          schema: { type: integer }
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { $ref: '#/components/schemas/Pet' }
components:
  schemas:
    Pet:
      type: object
      properties:
        name: { type: string }
"##,
        )
        .unwrap();
        let mut pointers = Vec::new();
        for_each_schema(&doc, |v| pointers.push(v.pointer.to_string()));
        assert_eq!(
            pointers,
            vec![
                "components.schemas.Pet",
                "components.schemas.Pet.properties.name",
                "paths./pets.get.parameters.limit.schema",
                "paths./pets.get.responses.200.content.application/json.schema",
                "paths./pets.get.responses.200.content.application/json.schema.items",
            ]
        );
    }
}
