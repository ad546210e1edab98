pub mod cache;
pub mod components;
pub mod content;
pub mod extensions;
pub mod operation;
pub mod parameter;
pub mod reference;
pub mod schema;
pub mod security;
pub mod server;
pub mod spec;

use std::sync::Arc;

use serde_yaml_ng::{Mapping, Value};

use crate::diagnostics::Diagnostic;
use crate::error::ParseError;
use spec::OpenApiSpec;

pub use cache::ParseCache;

pub const PARSE_SYNTAX: &str = "PAR001";
pub const PARSE_UNSUPPORTED_VERSION: &str = "PAR002";
pub const PARSE_MISSING_METADATA: &str = "PAR003";

/// Outcome of parsing one document text. `document` is `None` when the
/// text could not be turned into a model; `diagnostics` then explains why.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpec {
    pub document: Option<Arc<OpenApiSpec>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse an OpenAPI document from YAML (JSON is accepted as YAML).
pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let raw: Value = serde_yaml_ng::from_str(input)?;
    let spec = to_spec(raw)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_json::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse into a model plus diagnostics. Never fails: malformed input
/// produces a `None` document and a `PAR00x` diagnostic.
pub fn parse_document(input: &str) -> ParsedSpec {
    match from_yaml(input) {
        Ok(spec) => ParsedSpec {
            document: Some(Arc::new(spec)),
            diagnostics: Vec::new(),
        },
        Err(err) => ParsedSpec {
            document: None,
            diagnostics: vec![error_to_diagnostic(&err)],
        },
    }
}

fn error_to_diagnostic(err: &ParseError) -> Diagnostic {
    match err {
        ParseError::UnsupportedVersion(v) => Diagnostic::error(
            PARSE_UNSUPPORTED_VERSION,
            format!("unsupported OpenAPI version '{v}', only 3.x documents are supported"),
        )
        .at("openapi"),
        ParseError::Yaml(e) => {
            let mut d = Diagnostic::error(PARSE_SYNTAX, format!("malformed document: {e}"));
            if let Some(loc) = e.location() {
                d = d.at(format!("line {}, column {}", loc.line(), loc.column()));
            }
            d
        }
        other => Diagnostic::error(PARSE_SYNTAX, format!("malformed document: {other}")),
    }
}

fn to_spec(raw: Value) -> Result<OpenApiSpec, ParseError> {
    let Value::Mapping(root) = raw else {
        return Err(ParseError::NotAMapping);
    };
    if let Some(swagger) = root.get("swagger") {
        let version = scalar_to_string(swagger).unwrap_or_else(|| "2.x".to_string());
        return Err(ParseError::UnsupportedVersion(version));
    }
    let normalized = normalize_keys(Value::Mapping(root));
    Ok(serde_yaml_ng::from_value(normalized)?)
}

fn validate_version(spec: &OpenApiSpec) -> Result<(), ParseError> {
    if !spec.openapi.is_empty() && !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}

/// YAML allows non-string mapping keys (`200:` is an integer). The model
/// keys everything by string, so scalar keys are stringified first.
fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                let key = match scalar_to_string(&k) {
                    Some(s) => Value::String(s),
                    None => k,
                };
                out.insert(key, normalize_keys(v));
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize_keys).collect()),
        Value::Tagged(tagged) => normalize_keys(tagged.value),
        other => other,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
