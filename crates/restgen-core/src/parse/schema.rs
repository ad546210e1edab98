use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::extensions::Extensions;

/// A JSON Schema type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    /// The first non-null type in the set.
    pub fn primary(&self) -> Option<SchemaType> {
        match self {
            TypeSet::Single(t) => Some(*t),
            TypeSet::Multiple(types) => types.iter().copied().find(|t| *t != SchemaType::Null),
        }
    }

    pub fn contains(&self, ty: SchemaType) -> bool {
        match self {
            TypeSet::Single(t) => *t == ty,
            TypeSet::Multiple(types) => types.contains(&ty),
        }
    }
}

/// A `$ref` node. Sibling keywords are kept so they can be reported; code
/// generation ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRef {
    #[serde(rename = "$ref")]
    pub target: String,

    #[serde(flatten)]
    pub siblings: IndexMap<String, serde_json::Value>,
}

impl SchemaRef {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            siblings: IndexMap::new(),
        }
    }

    /// The component name this reference points at, when it targets
    /// `#/components/schemas/`.
    pub fn schema_name(&self) -> Option<&str> {
        schema_ref_name(&self.target)
    }
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref(SchemaRef),
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn reference(name: &str) -> Self {
        SchemaOrRef::Ref(SchemaRef::new(format!("#/components/schemas/{name}")))
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(s) => Some(s),
            SchemaOrRef::Ref(_) => None,
        }
    }

    pub fn ref_name(&self) -> Option<&str> {
        match self {
            SchemaOrRef::Ref(r) => r.schema_name(),
            SchemaOrRef::Schema(_) => None,
        }
    }
}

/// The shape a schema takes for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    Tuple,
    Enum,
    String,
    Number,
    Integer,
    Boolean,
    Composition,
    Any,
}

/// A JSON Schema object. The keywords that shape generated types are
/// modelled; validation constraints, annotations such as `default` and
/// `example`, and vendor extensions stay in `extensions` so merged and split
/// documents keep them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// OpenAPI 3.0 spelling; 3.1 lists `null` in `type` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unevaluated_properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Schema {
    /// Derive the generation kind from the keywords present.
    pub fn kind(&self) -> SchemaKind {
        if !self.enum_values.is_empty() {
            return SchemaKind::Enum;
        }
        if !self.prefix_items.is_empty() {
            return SchemaKind::Tuple;
        }
        if !self.all_of.is_empty() || !self.one_of.is_empty() || !self.any_of.is_empty() {
            return SchemaKind::Composition;
        }
        match self.schema_type.as_ref().and_then(TypeSet::primary) {
            Some(SchemaType::Object) => SchemaKind::Object,
            Some(SchemaType::Array) => SchemaKind::Array,
            Some(SchemaType::String) => SchemaKind::String,
            Some(SchemaType::Number) => SchemaKind::Number,
            Some(SchemaType::Integer) => SchemaKind::Integer,
            Some(SchemaType::Boolean) => SchemaKind::Boolean,
            Some(SchemaType::Null) => SchemaKind::Any,
            None if !self.properties.is_empty() => SchemaKind::Object,
            None if self.items.is_some() => SchemaKind::Array,
            None => SchemaKind::Any,
        }
    }

    pub fn is_object(&self) -> bool {
        self.kind() == SchemaKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == SchemaKind::Array
    }

    /// An object schema with at least one declared property. Empty objects
    /// map to free-form dictionaries and are never treated as inline models.
    pub fn is_inline_model(&self) -> bool {
        self.is_object() && !self.properties.is_empty()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
            || self
                .schema_type
                .as_ref()
                .is_some_and(|t| t.contains(SchemaType::Null))
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// Extract the schema name from `#/components/schemas/{name}`.
pub fn schema_ref_name(ref_path: &str) -> Option<&str> {
    ref_path
        .strip_prefix("#/components/schemas/")
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

/// Visit every direct child schema of `schema` (properties, items,
/// prefixItems, compositions and additionalProperties), in document order.
pub fn for_each_child<'a>(schema: &'a Schema, mut f: impl FnMut(ChildSlot<'a>, &'a SchemaOrRef)) {
    for (name, prop) in &schema.properties {
        f(ChildSlot::Property(name), prop);
    }
    if let Some(items) = &schema.items {
        f(ChildSlot::Items, items);
    }
    for item in &schema.prefix_items {
        f(ChildSlot::PrefixItem, item);
    }
    for sub in schema.all_of.iter().chain(&schema.one_of).chain(&schema.any_of) {
        f(ChildSlot::Composition, sub);
    }
    if let Some(AdditionalProperties::Schema(inner)) = &schema.additional_properties {
        f(ChildSlot::AdditionalProperties, inner);
    }
}

/// Where a child schema sits inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot<'a> {
    Property(&'a str),
    Items,
    PrefixItem,
    Composition,
    AdditionalProperties,
}

impl ChildSlot<'_> {
    /// Pointer segment for diagnostics, e.g. `properties.name` or `items`.
    pub fn pointer(&self) -> String {
        match self {
            ChildSlot::Property(name) => format!("properties.{name}"),
            ChildSlot::Items => "items".to_string(),
            ChildSlot::PrefixItem => "prefixItems".to_string(),
            ChildSlot::Composition => "composition".to_string(),
            ChildSlot::AdditionalProperties => "additionalProperties".to_string(),
        }
    }
}

/// Collect the names of every schema referenced from `schema_or_ref`,
/// recursing through inline children but not following references.
pub fn collect_ref_names(schema_or_ref: &SchemaOrRef, out: &mut Vec<String>) {
    match schema_or_ref {
        SchemaOrRef::Ref(r) => {
            if let Some(name) = r.schema_name()
                && !out.iter().any(|n| n == name)
            {
                out.push(name.to_string());
            }
        }
        SchemaOrRef::Schema(schema) => {
            for_each_child(schema, |_, child| collect_ref_names(child, out));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SchemaOrRef {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn ref_keeps_siblings() {
        let s = parse("$ref: '#/components/schemas/Pet'\ndescription: a pet\nnullable: true\n");
        match s {
            SchemaOrRef::Ref(r) => {
                assert_eq!(r.schema_name(), Some("Pet"));
                assert_eq!(r.siblings.len(), 2);
            }
            _ => panic!("expected a reference"),
        }
    }

    #[test]
    fn kind_detection() {
        let tuple = parse("type: array\nprefixItems:\n  - type: string\n  - type: integer\n");
        assert_eq!(tuple.as_schema().unwrap().kind(), SchemaKind::Tuple);

        let e = parse("type: string\nenum: [a, b]\n");
        assert_eq!(e.as_schema().unwrap().kind(), SchemaKind::Enum);

        let implicit = parse("properties:\n  id:\n    type: integer\n");
        assert_eq!(implicit.as_schema().unwrap().kind(), SchemaKind::Object);
    }

    #[test]
    fn nullable_via_type_list() {
        let s = parse("type: [string, 'null']\n");
        assert!(s.as_schema().unwrap().is_nullable());
    }

    #[test]
    fn collects_nested_refs_once() {
        let s = parse(
            r##"
type: object
properties:
  owner:
    $ref: '#/components/schemas/Owner'
  tags:
    type: array
    items:
      $ref: '#/components/schemas/Tag'
  previousOwner:
    $ref: '#/components/schemas/Owner'
"##,
        );
        let mut names = Vec::new();
        collect_ref_names(&s, &mut names);
        assert_eq!(names, vec!["Owner", "Tag"]);
    }

    #[test]
    fn ref_name_requires_schema_section() {
        assert_eq!(schema_ref_name("#/components/schemas/Pet"), Some("Pet"));
        assert_eq!(schema_ref_name("#/components/parameters/Pet"), None);
        assert_eq!(schema_ref_name("other.yaml#/Pet"), None);
    }
}
