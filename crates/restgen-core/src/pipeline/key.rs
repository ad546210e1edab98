use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::config::Target;

use super::summary::CompilationSummary;

/// Everything a generation result depends on. Two runs with equal keys
/// produce the same output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationKey {
    target: Target,
    project: Option<String>,
    /// `(path, text)`, sorted by path.
    specs: Vec<(String, Arc<str>)>,
    marker: Arc<str>,
    summary: CompilationSummary,
}

impl GenerationKey {
    pub fn new(
        target: Target,
        project: Option<String>,
        specs: impl IntoIterator<Item = (String, Arc<str>)>,
        marker: Arc<str>,
        summary: CompilationSummary,
    ) -> Self {
        let mut specs: Vec<(String, Arc<str>)> = specs.into_iter().collect();
        specs.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            target,
            project,
            specs,
            marker,
            summary,
        }
    }

    /// Hex SHA-256 over every field, stable across processes. Lists are
    /// prefixed with their length so an entry cannot move between lists
    /// without changing the hash.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        let count = |n: usize| (n as u64).to_le_bytes();
        field(self.target.as_str().as_bytes());
        field(self.project.as_deref().unwrap_or_default().as_bytes());
        field(&count(self.specs.len()));
        for (path, text) in &self.specs {
            field(path.as_bytes());
            field(text.as_bytes());
        }
        field(self.marker.as_bytes());
        field(&[u8::from(self.summary.has_framework_reference)]);
        field(&count(self.summary.handlers.len()));
        for h in &self.summary.handlers {
            field(h.namespace.as_bytes());
            field(h.name.as_bytes());
        }
        field(&count(self.summary.validators.len()));
        for v in &self.summary.validators {
            field(v.as_bytes());
        }
        field(&count(self.summary.interface_namespaces.len()));
        for ns in &self.summary.interface_namespaces {
            field(ns.as_bytes());
        }
        hex(&hasher.finalize())
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex SHA-256 of some content.
pub fn content_hash(content: &str) -> String {
    hex(&Sha256::digest(content.as_bytes()))
}
