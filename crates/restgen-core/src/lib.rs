pub mod config;
pub mod conflicts;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod merge;
pub mod naming;
pub mod parse;
pub mod partition;
pub mod pipeline;
pub mod source;
pub mod split;
pub mod validate;

use config::Target;
use error::GenerateError;
use ir::GenerationUnit;
use pipeline::GenerationContext;
use pipeline::signature::ExpectedSignature;

/// What the emitter may do with a file that already exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// Owned by the generator; rewritten whenever its content changes.
    Generated,
    /// Created once for the user to edit. Later runs only reconcile the
    /// handler method signature.
    Scaffold(ExpectedSignature),
}

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory, `/`-separated.
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

impl GeneratedFile {
    pub fn generated(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: FileKind::Generated,
        }
    }

    pub fn scaffold(path: impl Into<String>, content: impl Into<String>, signature: ExpectedSignature) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: FileKind::Scaffold(signature),
        }
    }

    pub fn is_scaffold(&self) -> bool {
        matches!(self.kind, FileKind::Scaffold(_))
    }
}

/// A target-language backend. Units are generated concurrently, so
/// implementations must be shareable across threads.
pub trait CodeGenerator: Sync {
    fn target(&self) -> Target;

    /// Files for one unit: a segment, or the shared models when
    /// `unit.shared` is set.
    fn generate_unit(
        &self,
        unit: &GenerationUnit,
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<GeneratedFile>, GenerateError>;

    /// Project-wide files that depend on every unit (registration, DI
    /// wiring). Runs after all units succeeded or failed.
    fn generate_shared(
        &self,
        _ctx: &GenerationContext<'_>,
        _units: &[GenerationUnit],
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        Ok(Vec::new())
    }
}
