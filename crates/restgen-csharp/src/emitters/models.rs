use minijinja::{Environment, context};
use restgen_core::GeneratedFile;
use restgen_core::ir::{GenerationUnit, IrEnumSchema, IrObjectSchema, IrSchema, IrType};
use serde::Serialize;

use super::{MemberNames, render, unit_prefix};
use crate::error::CsharpError;
use crate::type_mapper::TypeMapper;

#[derive(Debug, Serialize)]
struct SchemaView {
    kind: &'static str,
    name: String,
    description: Option<String>,
    fields: Vec<FieldView>,
    additional_type: Option<String>,
    additional_property: Option<String>,
    variants: Vec<VariantView>,
    items: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FieldView {
    json_name: String,
    property: String,
    type_name: String,
    required: bool,
    omit_null: bool,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct VariantView {
    name: String,
    value: String,
}

/// Emit `Models/{Name}.cs` for every object, enum and tuple of the unit.
/// Aliases are inlined where they are used and get no file.
pub fn emit_models(
    env: &Environment<'_>,
    unit: &GenerationUnit,
    mapper: &TypeMapper<'_>,
    partial: bool,
) -> Result<Vec<GeneratedFile>, CsharpError> {
    let prefix = unit_prefix(unit);
    let imports: Vec<String> = unit
        .registry
        .imported_namespaces()
        .into_iter()
        .filter(|ns| *ns != unit.models_namespace)
        .collect();

    let mut files = Vec::with_capacity(unit.schemas.len());
    for schema in &unit.schemas {
        let name = unit
            .registry
            .simple_name(schema.key())
            .map(str::to_string)
            .unwrap_or_else(|| schema.name().pascal_case.clone());
        let view = match schema {
            IrSchema::Object(obj) => object_view(obj, name, mapper)?,
            IrSchema::Enum(e) => enum_view(e, name),
            IrSchema::Tuple(t) => SchemaView {
                items: t.items.iter().map(|i| mapper.map(i)).collect::<Result<_, _>>()?,
                ..empty("tuple", name, t.description.clone())
            },
            IrSchema::Alias(_) => continue,
        };
        let content = render(
            env,
            "model.cs.j2",
            context! {
                namespace => &unit.models_namespace,
                imports => &imports,
                partial => partial,
                schema => &view,
            },
        )?;
        files.push(GeneratedFile::generated(format!("{prefix}Models/{}.cs", view.name), content));
    }
    Ok(files)
}

fn empty(kind: &'static str, name: String, description: Option<String>) -> SchemaView {
    SchemaView {
        kind,
        name,
        description,
        fields: Vec::new(),
        additional_type: None,
        additional_property: None,
        variants: Vec::new(),
        items: Vec::new(),
    }
}

fn object_view(
    obj: &IrObjectSchema,
    name: String,
    mapper: &TypeMapper<'_>,
) -> Result<SchemaView, CsharpError> {
    let mut members = MemberNames::within(&name);
    let mut fields = Vec::with_capacity(obj.fields.len());
    for f in &obj.fields {
        fields.push(FieldView {
            json_name: f.original_name.clone(),
            property: members.claim(&f.name.pascal_case),
            type_name: mapper.map_optional(&f.field_type, !f.required || f.nullable)?,
            required: f.required && !f.read_only,
            omit_null: !f.required,
            description: f.description.clone(),
        });
    }
    // Extension data only binds to JsonElement values.
    let additional_type = obj
        .additional_properties
        .as_ref()
        .map(|_| mapper.map(&IrType::Any))
        .transpose()?;
    let additional_property = additional_type
        .as_ref()
        .map(|_| members.claim("AdditionalProperties"));
    Ok(SchemaView {
        fields,
        additional_type,
        additional_property,
        ..empty("object", name, obj.description.clone())
    })
}

fn enum_view(e: &IrEnumSchema, name: String) -> SchemaView {
    let mut members = MemberNames::within(&name);
    let variants = e
        .variants
        .iter()
        .map(|v| VariantView {
            name: members.claim(&v.name),
            value: v.value.clone(),
        })
        .collect();
    SchemaView {
        variants,
        ..empty("enum", name, e.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use restgen_core::config::SubFolderStrategy;
    use restgen_core::conflicts::{ConflictSet, TypeConflictRegistry};
    use restgen_core::ir::build_shared_unit;
    use restgen_core::parse::from_yaml;
    use restgen_core::partition::partition;

    use super::*;
    use crate::emitters::environment;
    use crate::type_mapper::collect_aliases;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: Zoo, version: "1" }
paths: {}
components:
  schemas:
    Animal:
      type: object
      required: [id, name]
      properties:
        id: { type: integer, format: int64, readOnly: true }
        name: { type: string, description: "Display <name>" }
        animal: { type: string }
        born: { type: string, format: date, nullable: true }
      additionalProperties: { type: string }
    Kind:
      type: string
      enum: [big-cat, bird]
    Point:
      type: array
      prefixItems: [{ type: number }, { type: number }]
    Names: { type: array, items: { type: string } }
"##;

    fn files() -> Vec<GeneratedFile> {
        let doc = from_yaml(DOC).unwrap();
        let parts = partition(&doc, SubFolderStrategy::None);
        let set = Arc::new(ConflictSet::scan(&doc, &parts));
        let keys: Vec<String> = doc.schemas().unwrap().keys().cloned().collect();
        let registry = TypeConflictRegistry::for_segment(&set, "Zoo", None);
        let unit = build_shared_unit(&doc, &keys, registry).unwrap();
        let aliases: HashMap<_, _> = collect_aliases(&doc);
        let mapper = TypeMapper::new(&unit.registry, &aliases);
        emit_models(&environment().unwrap(), &unit, &mapper, true).unwrap()
    }

    #[test]
    fn objects_enums_and_tuples_get_files_aliases_do_not() {
        let files = files();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["Models/Animal.cs", "Models/Kind.cs", "Models/Point.cs"]);
        assert!(files.iter().all(|f| f.content.contains("namespace Zoo.Generated.Models;")));
    }

    #[test]
    fn object_record_shape() {
        let files = files();
        let animal = &files[0].content;
        assert!(animal.contains("public sealed partial record Animal"));
        assert!(animal.contains("[JsonPropertyName(\"id\")]"));
        assert!(animal.contains("public long Id { get; init; }"));
        assert!(animal.contains("public required string Name { get; init; }"));
        assert!(animal.contains("/// <summary>Display &lt;name&gt;</summary>"));
        assert!(animal.contains("public string? AnimalValue { get; init; }"));
        assert!(animal.contains("public DateOnly? Born { get; init; }"));
        assert!(animal.contains("[JsonExtensionData]"));
        assert!(animal.contains("IDictionary<string, JsonElement>? AdditionalProperties"));
    }

    #[test]
    fn enum_members_carry_wire_values() {
        let files = files();
        let kind = &files[1].content;
        assert!(kind.contains("JsonStringEnumConverter<Kind>"));
        assert!(kind.contains("[JsonStringEnumMemberName(\"big-cat\")]\n    BigCat,"));
        let point = &files[2].content;
        assert!(point.contains("record Point(double Item1, double Item2);"));
    }
}
