use std::fmt;

use crate::conflicts::TypeConflictRegistry;

use super::operations::IrOperation;
use super::schemas::IrSchema;

/// A document name together with the C# casings derived from it.
/// Displays as the name written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    /// Type, member and namespace segment form.
    pub pascal_case: String,
    /// Parameter and local form.
    pub camel_case: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Everything one generator invocation needs for a segment, or for the
/// shared models when `shared` is set.
#[derive(Debug, Clone)]
pub struct GenerationUnit {
    /// `None` for the shared unit and when partitioning is disabled.
    pub segment: Option<NormalizedName>,
    pub shared: bool,
    /// Namespace of the unit's endpoints, handlers and records.
    pub namespace: String,
    /// Namespace the unit's own models are emitted into.
    pub models_namespace: String,
    pub operations: Vec<IrOperation>,
    pub schemas: Vec<IrSchema>,
    pub registry: TypeConflictRegistry,
}

impl GenerationUnit {
    /// Human-readable name used in diagnostics and logs.
    pub fn label(&self) -> &str {
        match (&self.segment, self.shared) {
            (_, true) => "Shared",
            (Some(name), false) => &name.pascal_case,
            (None, false) => "Default",
        }
    }

    /// Output directory of the unit relative to the generation root.
    pub fn directory(&self) -> String {
        match &self.segment {
            Some(name) if !self.shared => name.pascal_case.clone(),
            _ => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.schemas.is_empty()
    }
}
