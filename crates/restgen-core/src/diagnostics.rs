use std::fmt;

use serde::Serialize;

/// How serious a diagnostic is. Only `Error` blocks generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Where a diagnostic points: a source file and an approximate path inside
/// the document (`paths./pets.get`, `components.schemas.Pet`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.pointer) {
            (Some(file), Some(pointer)) => write!(f, "{file}#{pointer}"),
            (Some(file), None) => f.write_str(file),
            (None, Some(pointer)) => f.write_str(pointer),
            (None, None) => f.write_str("<document>"),
        }
    }
}

/// A structured finding produced by the parser, the merge engine, a
/// validator rule or the generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            suggestions: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    /// Set the in-document pointer.
    pub fn at(mut self, pointer: impl Into<String>) -> Self {
        self.location.pointer = Some(pointer.into());
        self
    }

    /// Set the source file. Path separators are normalized to `/`.
    pub fn in_file(mut self, file: impl AsRef<str>) -> Self {
        self.location.file = Some(normalize_path(file.as_ref()));
        self
    }

    /// Add a directly substitutable fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}]: {}",
            self.severity, self.code, self.location, self.message
        )?;
        for suggestion in &self.suggestions {
            write!(f, "\n  suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Normalize Windows and POSIX separators so diagnostics compare equal.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

pub fn count_by_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_separators_are_normalized() {
        let a = Diagnostic::error("PAR001", "bad").in_file(r"specs\api\Pets.yaml");
        let b = Diagnostic::error("PAR001", "bad").in_file("specs/api/Pets.yaml");
        assert_eq!(a, b);
        assert_eq!(a.location.file.as_deref(), Some("specs/api/Pets.yaml"));
    }

    #[test]
    fn display_includes_location_and_suggestions() {
        let d = Diagnostic::warning("NAM001", "operationId 'GetPets' is PascalCase")
            .in_file("api.yaml")
            .at("paths./pets.get")
            .with_suggestion("getPets");
        let text = d.to_string();
        assert!(text.starts_with("warning NAM001 [api.yaml#paths./pets.get]"));
        assert!(text.contains("suggestion: getPets"));
    }

    #[test]
    fn severity_counts() {
        let diags = vec![
            Diagnostic::error("A", "a"),
            Diagnostic::warning("B", "b"),
            Diagnostic::warning("C", "c"),
        ];
        assert!(has_errors(&diags));
        assert_eq!(count_by_severity(&diags, Severity::Warning), 2);
    }
}
