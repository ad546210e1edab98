use crate::error::GenerateError;
use crate::naming::normalize_name;
use crate::parse::schema::{AdditionalProperties, Schema, SchemaKind, SchemaOrRef};
use crate::parse::spec::OpenApiSpec;

use super::types::NormalizedName;

/// A named component schema, ready for emission.
#[derive(Debug, Clone)]
pub enum IrSchema {
    Object(IrObjectSchema),
    Enum(IrEnumSchema),
    Tuple(IrTupleSchema),
    Alias(IrAliasSchema),
}

impl IrSchema {
    /// The component key the schema was declared under.
    pub fn key(&self) -> &str {
        match self {
            IrSchema::Object(o) => &o.key,
            IrSchema::Enum(e) => &e.key,
            IrSchema::Tuple(t) => &t.key,
            IrSchema::Alias(a) => &a.key,
        }
    }

    pub fn name(&self) -> &NormalizedName {
        match self {
            IrSchema::Object(o) => &o.name,
            IrSchema::Enum(e) => &e.name,
            IrSchema::Tuple(t) => &t.name,
            IrSchema::Alias(a) => &a.name,
        }
    }

    /// Every type mentioned by the schema's members.
    pub fn member_types(&self) -> Vec<&IrType> {
        match self {
            IrSchema::Object(o) => o
                .fields
                .iter()
                .map(|f| &f.field_type)
                .chain(o.additional_properties.as_ref())
                .collect(),
            IrSchema::Enum(_) => Vec::new(),
            IrSchema::Tuple(t) => t.items.iter().collect(),
            IrSchema::Alias(a) => vec![&a.target],
        }
    }
}

/// An object schema; `allOf` members are flattened into `fields`.
#[derive(Debug, Clone)]
pub struct IrObjectSchema {
    pub key: String,
    pub name: NormalizedName,
    pub description: Option<String>,
    pub fields: Vec<IrField>,
    pub additional_properties: Option<IrType>,
}

#[derive(Debug, Clone)]
pub struct IrField {
    pub name: NormalizedName,
    pub original_name: String,
    pub field_type: IrType,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
    pub read_only: bool,
    pub write_only: bool,
}

#[derive(Debug, Clone)]
pub struct IrEnumSchema {
    pub key: String,
    pub name: NormalizedName,
    pub description: Option<String>,
    pub variants: Vec<IrEnumVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrEnumVariant {
    /// PascalCase member name.
    pub name: String,
    /// Wire value.
    pub value: String,
}

/// A fixed-length positional array (`prefixItems`).
#[derive(Debug, Clone)]
pub struct IrTupleSchema {
    pub key: String,
    pub name: NormalizedName,
    pub description: Option<String>,
    pub items: Vec<IrType>,
}

/// A named schema that is another type under a new name: a primitive,
/// an array, a reference or a composition the target cannot express.
#[derive(Debug, Clone)]
pub struct IrAliasSchema {
    pub key: String,
    pub name: NormalizedName,
    pub description: Option<String>,
    pub target: IrType,
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    String,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Uuid,
    Uri,
    Binary,
    Array(Box<IrType>),
    Map(Box<IrType>),
    /// A component schema, by its key.
    Ref(String),
    Any,
}

impl IrType {
    /// The component schema this type ultimately names, looking through
    /// arrays and maps.
    pub fn referenced(&self) -> Option<&str> {
        match self {
            IrType::Ref(name) => Some(name),
            IrType::Array(inner) | IrType::Map(inner) => inner.referenced(),
            _ => None,
        }
    }
}

const MAX_ALL_OF_DEPTH: usize = 16;

/// Convert a schema or reference used in a type position.
pub fn to_ir_type(schema_or_ref: &SchemaOrRef) -> IrType {
    match schema_or_ref {
        SchemaOrRef::Ref(r) => r
            .schema_name()
            .map_or(IrType::Any, |name| IrType::Ref(name.to_string())),
        SchemaOrRef::Schema(schema) => schema_to_ir_type(schema),
    }
}

fn schema_to_ir_type(schema: &Schema) -> IrType {
    if let [single] = schema.all_of.as_slice()
        && schema.properties.is_empty()
    {
        return to_ir_type(single);
    }
    match schema.kind() {
        SchemaKind::Enum | SchemaKind::String => string_format(schema.format.as_deref()),
        SchemaKind::Integer => match schema.format.as_deref() {
            Some("int64") => IrType::Long,
            _ => IrType::Integer,
        },
        SchemaKind::Number => match schema.format.as_deref() {
            Some("float") => IrType::Float,
            Some("decimal") => IrType::Decimal,
            _ => IrType::Double,
        },
        SchemaKind::Boolean => IrType::Boolean,
        SchemaKind::Array => IrType::Array(Box::new(
            schema.items.as_deref().map_or(IrType::Any, to_ir_type),
        )),
        SchemaKind::Tuple => IrType::Array(Box::new(IrType::Any)),
        SchemaKind::Object if schema.properties.is_empty() => match &schema.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => IrType::Map(Box::new(to_ir_type(inner))),
            Some(AdditionalProperties::Bool(true)) => IrType::Map(Box::new(IrType::Any)),
            _ => IrType::Any,
        },
        SchemaKind::Object | SchemaKind::Composition | SchemaKind::Any => IrType::Any,
    }
}

fn string_format(format: Option<&str>) -> IrType {
    match format {
        Some("date-time") => IrType::DateTime,
        Some("date") => IrType::Date,
        Some("uuid") => IrType::Uuid,
        Some("uri" | "url") => IrType::Uri,
        Some("binary" | "byte") => IrType::Binary,
        _ => IrType::String,
    }
}

/// Whether a type position admits `null`. References are never nullable
/// on their own; a `$ref` sibling `nullable: true` is honored.
pub fn is_nullable(schema_or_ref: &SchemaOrRef) -> bool {
    match schema_or_ref {
        SchemaOrRef::Schema(s) => s.is_nullable(),
        SchemaOrRef::Ref(r) => r
            .siblings
            .get("nullable")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
    }
}

/// Convert a named component schema.
pub fn to_ir_schema(
    doc: &OpenApiSpec,
    key: &str,
    schema_or_ref: &SchemaOrRef,
) -> Result<IrSchema, GenerateError> {
    let name = normalize_name(key);
    let schema = match schema_or_ref {
        SchemaOrRef::Ref(_) => {
            return Ok(IrSchema::Alias(IrAliasSchema {
                key: key.to_string(),
                name,
                description: None,
                target: to_ir_type(schema_or_ref),
            }));
        }
        SchemaOrRef::Schema(schema) => schema,
    };
    let description = schema.description.clone();

    let ir = match schema.kind() {
        SchemaKind::Enum => IrSchema::Enum(IrEnumSchema {
            key: key.to_string(),
            name,
            description,
            variants: enum_variants(&schema.enum_values),
        }),
        SchemaKind::Tuple => IrSchema::Tuple(IrTupleSchema {
            key: key.to_string(),
            name,
            description,
            items: schema.prefix_items.iter().map(to_ir_type).collect(),
        }),
        SchemaKind::Object if !schema.properties.is_empty() => {
            IrSchema::Object(object_schema(doc, key, name, schema)?)
        }
        SchemaKind::Composition if !schema.all_of.is_empty() => {
            IrSchema::Object(object_schema(doc, key, name, schema)?)
        }
        _ => IrSchema::Alias(IrAliasSchema {
            key: key.to_string(),
            name,
            description,
            target: schema_to_ir_type(schema),
        }),
    };
    Ok(ir)
}

fn object_schema(
    doc: &OpenApiSpec,
    key: &str,
    name: NormalizedName,
    schema: &Schema,
) -> Result<IrObjectSchema, GenerateError> {
    let mut fields = Vec::new();
    flatten_into(doc, schema, &mut fields, 0)?;
    let additional_properties = match &schema.additional_properties {
        Some(AdditionalProperties::Schema(inner)) => Some(to_ir_type(inner)),
        _ => None,
    };
    Ok(IrObjectSchema {
        key: key.to_string(),
        name,
        description: schema.description.clone(),
        fields,
        additional_properties,
    })
}

/// Collect the properties of `schema` and of every `allOf` member. Later
/// declarations of a property replace earlier ones.
fn flatten_into(
    doc: &OpenApiSpec,
    schema: &Schema,
    fields: &mut Vec<IrField>,
    depth: usize,
) -> Result<(), GenerateError> {
    if depth > MAX_ALL_OF_DEPTH {
        return Err(GenerateError::Other(
            "allOf nesting is too deep or cyclic".to_string(),
        ));
    }
    for member in &schema.all_of {
        let resolved = match member {
            SchemaOrRef::Schema(s) => &**s,
            SchemaOrRef::Ref(r) => {
                let target = r.schema_name().unwrap_or(&r.target);
                doc.resolve_schema(member)
                    .ok_or_else(|| GenerateError::UnknownSchema(target.to_string()))?
            }
        };
        flatten_into(doc, resolved, fields, depth + 1)?;
    }
    for (prop_name, prop) in &schema.properties {
        let resolved = match prop {
            SchemaOrRef::Schema(s) => Some(&**s),
            SchemaOrRef::Ref(_) => None,
        };
        let field = IrField {
            name: normalize_name(prop_name),
            original_name: prop_name.clone(),
            field_type: to_ir_type(prop),
            required: schema.is_required(prop_name),
            nullable: is_nullable(prop),
            description: resolved.and_then(|s| s.description.clone()),
            read_only: resolved.and_then(|s| s.read_only).unwrap_or(false),
            write_only: resolved.and_then(|s| s.write_only).unwrap_or(false),
        };
        match fields.iter_mut().find(|f| f.original_name == *prop_name) {
            Some(existing) => *existing = field,
            None => fields.push(field),
        }
    }
    Ok(())
}

fn enum_variants(values: &[serde_json::Value]) -> Vec<IrEnumVariant> {
    let mut variants: Vec<IrEnumVariant> = Vec::new();
    for (index, value) in values.iter().enumerate() {
        let wire = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => continue,
            other => other.to_string(),
        };
        let mut name = normalize_name(&wire).pascal_case;
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            name = format!("Value{}", if name.is_empty() { index.to_string() } else { name });
        }
        if variants.iter().any(|v| v.name == name) {
            name = format!("{name}{index}");
        }
        variants.push(IrEnumVariant { name, value: wire });
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: T, version: "1" }
paths: {}
components:
  schemas:
    Base:
      type: object
      required: [id]
      properties:
        id: { type: string, format: uuid }
        created: { type: string, format: date-time }
    Pet:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          required: [name]
          properties:
            name: { type: string }
            tags: { type: array, items: { type: string } }
            owner:
              $ref: '#/components/schemas/Owner'
              nullable: true
            scores:
              type: object
              additionalProperties: { type: integer, format: int64 }
    Owner:
      type: object
      properties:
        name: { type: string, nullable: true }
    Status:
      type: string
      enum: [available, on-hold, "1st"]
    Point:
      type: array
      prefixItems:
        - type: number
        - type: number
          format: float
    PetList:
      type: array
      items: { $ref: '#/components/schemas/Pet' }
    Broken:
      allOf:
        - $ref: '#/components/schemas/Missing'
"##;

    fn schema(doc: &OpenApiSpec, key: &str) -> Result<IrSchema, GenerateError> {
        to_ir_schema(doc, key, doc.schema(key).unwrap())
    }

    #[test]
    fn all_of_is_flattened() {
        let doc = from_yaml(DOC).unwrap();
        let IrSchema::Object(pet) = schema(&doc, "Pet").unwrap() else {
            panic!("expected an object");
        };
        let names: Vec<_> = pet.fields.iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, vec!["id", "created", "name", "tags", "owner", "scores"]);
        assert!(pet.fields[0].required);
        assert_eq!(pet.fields[0].field_type, IrType::Uuid);
        assert_eq!(pet.fields[1].field_type, IrType::DateTime);
        assert_eq!(pet.fields[3].field_type, IrType::Array(Box::new(IrType::String)));
        assert_eq!(pet.fields[4].field_type, IrType::Ref("Owner".into()));
        assert!(pet.fields[4].nullable);
        assert_eq!(pet.fields[5].field_type, IrType::Map(Box::new(IrType::Long)));
    }

    #[test]
    fn enums_tuples_and_aliases() {
        let doc = from_yaml(DOC).unwrap();
        let IrSchema::Enum(status) = schema(&doc, "Status").unwrap() else {
            panic!("expected an enum");
        };
        let names: Vec<_> = status.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Available", "OnHold", "Value1st"]);
        assert_eq!(status.variants[1].value, "on-hold");

        let IrSchema::Tuple(point) = schema(&doc, "Point").unwrap() else {
            panic!("expected a tuple");
        };
        assert_eq!(point.items, vec![IrType::Double, IrType::Float]);

        let IrSchema::Alias(list) = schema(&doc, "PetList").unwrap() else {
            panic!("expected an alias");
        };
        assert_eq!(list.target.referenced(), Some("Pet"));
    }

    #[test]
    fn dangling_all_of_member_is_an_error() {
        let doc = from_yaml(DOC).unwrap();
        let err = schema(&doc, "Broken").unwrap_err();
        assert!(matches!(err, GenerateError::UnknownSchema(name) if name == "Missing"));
    }
}
