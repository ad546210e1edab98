use std::collections::HashMap;

use restgen_core::conflicts::TypeConflictRegistry;
use restgen_core::ir::{IrSchema, IrType, to_ir_schema};
use restgen_core::parse::spec::OpenApiSpec;

use crate::error::CsharpError;

const MAX_ALIAS_DEPTH: usize = 16;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

/// Prefix C# keywords with `@` so they can be used as identifiers.
pub fn escape_identifier(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

/// Component schemas that are only another name for a type. C# has no
/// type aliases that cross files, so references to them are inlined.
pub fn collect_aliases(doc: &OpenApiSpec) -> HashMap<String, IrType> {
    doc.schemas()
        .into_iter()
        .flatten()
        .filter_map(|(key, node)| match to_ir_schema(doc, key, node) {
            Ok(IrSchema::Alias(alias)) => Some((key.clone(), alias.target)),
            _ => None,
        })
        .collect()
}

/// Spells IR types as C# types from one unit's point of view.
pub struct TypeMapper<'a> {
    registry: &'a TypeConflictRegistry,
    aliases: &'a HashMap<String, IrType>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(registry: &'a TypeConflictRegistry, aliases: &'a HashMap<String, IrType>) -> Self {
        Self { registry, aliases }
    }

    pub fn registry(&self) -> &TypeConflictRegistry {
        self.registry
    }

    pub fn map(&self, ty: &IrType) -> Result<String, CsharpError> {
        self.map_at(ty, 0)
    }

    /// `map` with a trailing `?` when the value may be missing or null.
    pub fn map_optional(&self, ty: &IrType, optional: bool) -> Result<String, CsharpError> {
        let mapped = self.map(ty)?;
        Ok(if optional { format!("{mapped}?") } else { mapped })
    }

    /// Spelling for a bound request parameter: collections bind as arrays.
    pub fn map_parameter(&self, ty: &IrType, optional: bool) -> Result<String, CsharpError> {
        let mapped = match self.resolve(ty) {
            Some(IrType::Array(inner)) => format!("{}[]", self.map(inner)?),
            _ => self.map(ty)?,
        };
        Ok(if optional { format!("{mapped}?") } else { mapped })
    }

    /// Whether the type resolves to a collection after alias inlining.
    pub fn is_collection(&self, ty: &IrType) -> bool {
        matches!(self.resolve(ty), Some(IrType::Array(_)))
    }

    pub fn is_binary(&self, ty: &IrType) -> bool {
        matches!(self.resolve(ty), Some(IrType::Binary))
    }

    fn resolve<'t>(&'t self, mut ty: &'t IrType) -> Option<&'t IrType> {
        for _ in 0..MAX_ALIAS_DEPTH {
            match ty {
                IrType::Ref(key) => match self.aliases.get(key) {
                    Some(target) => ty = target,
                    None => return Some(ty),
                },
                other => return Some(other),
            }
        }
        None
    }

    fn map_at(&self, ty: &IrType, depth: usize) -> Result<String, CsharpError> {
        let builtin = |name: &str| self.registry.builtin_reference(name);
        Ok(match ty {
            IrType::String => "string".to_string(),
            IrType::Integer => "int".to_string(),
            IrType::Long => "long".to_string(),
            IrType::Float => "float".to_string(),
            IrType::Double => "double".to_string(),
            IrType::Decimal => "decimal".to_string(),
            IrType::Boolean => "bool".to_string(),
            IrType::DateTime => builtin("DateTimeOffset"),
            IrType::Date => builtin("DateOnly"),
            IrType::Uuid => builtin("Guid"),
            IrType::Uri => builtin("Uri"),
            IrType::Binary => "byte[]".to_string(),
            IrType::Any => builtin("JsonElement"),
            IrType::Array(inner) => format!("IReadOnlyList<{}>", self.map_at(inner, depth)?),
            IrType::Map(inner) => format!("IReadOnlyDictionary<string, {}>", self.map_at(inner, depth)?),
            IrType::Ref(key) => match self.aliases.get(key) {
                Some(_) if depth >= MAX_ALIAS_DEPTH => return Err(CsharpError::AliasCycle(key.clone())),
                Some(target) => self.map_at(target, depth + 1)?,
                None => self.registry.type_reference(key),
            },
        })
    }
}
