pub mod operations;
pub mod schemas;
pub mod types;

pub use operations::*;
pub use schemas::*;
pub use types::{GenerationUnit, NormalizedName};

use crate::conflicts::TypeConflictRegistry;
use crate::error::GenerateError;
use crate::naming::normalize_name;
use crate::parse::spec::OpenApiSpec;
use crate::partition::Segment;

/// Build the generation view of one segment: its operations (deprecated
/// ones dropped unless requested) and the schemas local to it.
pub fn build_unit(
    doc: &OpenApiSpec,
    segment: &Segment,
    registry: TypeConflictRegistry,
    include_deprecated: bool,
) -> Result<GenerationUnit, GenerateError> {
    let mut operations = Vec::with_capacity(segment.operations.len());
    for key in &segment.operations {
        let item = doc
            .paths
            .get(&key.path)
            .ok_or_else(|| GenerateError::Other(format!("path {} is not in the document", key.path)))?;
        let Some(op) = item.operation(key.method) else {
            continue;
        };
        if op.is_deprecated() && !include_deprecated {
            continue;
        }
        operations.push(to_ir_operation(doc, &key.path, key.method, item, op)?);
    }
    let schemas = build_schemas(doc, &segment.schemas)?;

    let unit = GenerationUnit {
        segment: segment.name.as_deref().map(normalize_name),
        shared: false,
        namespace: registry.namespace(),
        models_namespace: registry.models_namespace(),
        operations,
        schemas,
        registry,
    };
    check_references(doc, &unit)?;
    Ok(unit)
}

/// Build the unit holding the schemas every segment may use.
pub fn build_shared_unit(
    doc: &OpenApiSpec,
    shared_schemas: &[String],
    registry: TypeConflictRegistry,
) -> Result<GenerationUnit, GenerateError> {
    let unit = GenerationUnit {
        segment: None,
        shared: true,
        namespace: registry.namespace(),
        models_namespace: registry.models_namespace(),
        operations: Vec::new(),
        schemas: build_schemas(doc, shared_schemas)?,
        registry,
    };
    check_references(doc, &unit)?;
    Ok(unit)
}

fn build_schemas(doc: &OpenApiSpec, keys: &[String]) -> Result<Vec<IrSchema>, GenerateError> {
    keys.iter()
        .map(|key| {
            let node = doc
                .schema(key)
                .ok_or_else(|| GenerateError::UnknownSchema(key.clone()))?;
            to_ir_schema(doc, key, node)
        })
        .collect()
}

fn check_references(doc: &OpenApiSpec, unit: &GenerationUnit) -> Result<(), GenerateError> {
    let types = unit
        .operations
        .iter()
        .flat_map(IrOperation::signature_types)
        .chain(unit.schemas.iter().flat_map(IrSchema::member_types));
    for ty in types {
        if let Some(name) = ty.referenced()
            && doc.schema(name).is_none()
        {
            return Err(GenerateError::UnknownSchema(name.to_string()));
        }
    }
    Ok(())
}
