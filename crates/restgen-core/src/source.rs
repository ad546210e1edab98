use std::sync::Arc;

use crate::diagnostics::{Diagnostic, normalize_path};
use crate::parse::spec::OpenApiSpec;
use crate::parse::{ParseCache, ParsedSpec};

/// One specification source: its text, its identity and its parse result.
///
/// Immutable once built. The parsed document is shared with the parse
/// cache, so two files with identical text point at the same model.
#[derive(Debug, Clone)]
pub struct SpecificationFile {
    path: String,
    stem: String,
    text: Arc<str>,
    parsed: Arc<ParsedSpec>,
    part_name: Option<String>,
}

impl SpecificationFile {
    /// Parse `text` through `cache`. The role is guessed from the name
    /// (`Base_Part.yaml` is a part); discovery may reassign it.
    pub fn new(path: &str, text: impl Into<Arc<str>>, cache: &ParseCache) -> Self {
        let text = text.into();
        let parsed = cache.parse(&text);
        let path = normalize_path(path);
        let stem = file_stem(&path).to_string();
        let part_name = stem.split_once('_').map(|(_, part)| part.to_string());
        Self {
            path,
            stem,
            text,
            parsed,
            part_name,
        }
    }

    /// Build with the process-wide parse cache.
    pub fn parse(path: &str, text: impl Into<Arc<str>>) -> Self {
        Self::new(path, text, ParseCache::global())
    }

    /// This file, treated as a base document.
    pub fn as_base(mut self) -> Self {
        self.part_name = None;
        self
    }

    /// This file, treated as a part of `base_stem`. The part name is what
    /// follows `{base_stem}_`.
    pub fn as_part_of(mut self, base_stem: &str) -> Self {
        let part = self
            .stem
            .strip_prefix(base_stem)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(str::to_string)
            .or_else(|| self.stem.split_once('_').map(|(_, p)| p.to_string()))
            .unwrap_or_else(|| self.stem.clone());
        self.part_name = Some(part);
        self
    }

    /// Normalized path with `/` separators.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without the `.yaml` / `.yml` extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn part_name(&self) -> Option<&str> {
        self.part_name.as_deref()
    }

    pub fn is_part(&self) -> bool {
        self.part_name.is_some()
    }

    pub fn is_base(&self) -> bool {
        self.part_name.is_none()
    }

    pub fn parsed(&self) -> &Arc<ParsedSpec> {
        &self.parsed
    }

    pub fn document(&self) -> Option<&Arc<OpenApiSpec>> {
        self.parsed.document.as_ref()
    }

    /// Parse diagnostics with this file's path attached.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.parsed
            .diagnostics
            .iter()
            .cloned()
            .map(|d| d.in_file(&self.path))
            .collect()
    }
}

/// Whether `path` names a YAML specification.
pub fn is_spec_file_name(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".yaml") {
        &name[..name.len() - 5]
    } else if lower.ends_with(".yml") {
        &name[..name.len() - 4]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "openapi: 3.0.3\ninfo: { title: Pets, version: '1' }\npaths: {}\n";

    #[test]
    fn identity_from_windows_path() {
        let cache = ParseCache::new();
        let f = SpecificationFile::new(r"specs\Api_Pets.yaml", DOC, &cache);
        assert_eq!(f.path(), "specs/Api_Pets.yaml");
        assert_eq!(f.file_name(), "Api_Pets.yaml");
        assert_eq!(f.stem(), "Api_Pets");
        assert_eq!(f.part_name(), Some("Pets"));
        assert!(f.is_part());
    }

    #[test]
    fn role_reassignment() {
        let cache = ParseCache::new();
        let f = SpecificationFile::new("Api_V2_Pets.yml", DOC, &cache);
        assert_eq!(f.clone().as_part_of("Api_V2").part_name(), Some("Pets"));
        assert_eq!(f.clone().as_part_of("Api").part_name(), Some("V2_Pets"));
        assert!(f.as_base().is_base());
    }

    #[test]
    fn identical_text_shares_document() {
        let cache = ParseCache::new();
        let a = SpecificationFile::new("a.yaml", DOC, &cache);
        let b = SpecificationFile::new("b.yaml", DOC, &cache);
        assert!(Arc::ptr_eq(a.parsed(), b.parsed()));
    }

    #[test]
    fn diagnostics_carry_file() {
        let cache = ParseCache::new();
        let f = SpecificationFile::new(r"dir\bad.yaml", "openapi: 2.0\n", &cache);
        let diags = f.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].location.file.as_deref(), Some("dir/bad.yaml"));
        assert!(cache.parse("openapi: 2.0\n").diagnostics[0].location.file.is_none());
    }

    #[test]
    fn spec_file_names() {
        assert!(is_spec_file_name("a/B.YAML"));
        assert!(is_spec_file_name("b.yml"));
        assert!(!is_spec_file_name("b.json"));
    }
}
