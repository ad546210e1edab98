pub mod discovery;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::config::{MergeStrategy, MultiPartConfiguration};
use crate::diagnostics::{Diagnostic, has_errors};
use crate::parse::spec::{OpenApiSpec, Tag};
use crate::source::SpecificationFile;

pub use discovery::{Discovery, FileGroup, discover, discover_explicit, discover_with};

pub const MULTIPART_PART_SERVERS: &str = "MPT001";
pub const MULTIPART_PART_SECURITY_SCHEMES: &str = "MPT002";
pub const MULTIPART_DUPLICATE_PATH: &str = "MPT003";
pub const MULTIPART_DUPLICATE_SCHEMA: &str = "MPT004";
pub const MULTIPART_CONFLICTING_COMPONENT: &str = "MPT005";
pub const MULTIPART_DUPLICATE_TAG: &str = "MPT006";
pub const MULTIPART_PART_UNPARSABLE: &str = "MPT007";
pub const MULTIPART_BASE_METADATA: &str = "MPT008";
pub const MULTIPART_AMBIGUOUS_BASE: &str = "MPT009";
pub const MULTIPART_MISSING_PART: &str = "MPT010";
pub const MULTIPART_DUPLICATE_WEBHOOK: &str = "MPT011";

/// Outcome of merging a base document with its parts.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub success: bool,
    /// `None` whenever an error diagnostic was produced.
    pub document: Option<Arc<OpenApiSpec>>,
    pub diagnostics: Vec<Diagnostic>,
    pub source_files: Vec<String>,
    pub total_paths: usize,
    pub total_operations: usize,
    pub total_schemas: usize,
}

impl MergeResult {
    fn failed(diagnostics: Vec<Diagnostic>, source_files: Vec<String>) -> Self {
        Self {
            success: false,
            document: None,
            diagnostics,
            source_files,
            total_paths: 0,
            total_operations: 0,
            total_schemas: 0,
        }
    }
}

/// Merge a discovered group.
pub fn merge_group(group: &FileGroup, config: &MultiPartConfiguration) -> MergeResult {
    merge(&group.base, &group.parts, config)
}

/// Combine `base` with `parts` into one document.
///
/// Parts are applied in order. Sections that only belong in the base
/// (`servers`, `components.securitySchemes`) are reported and dropped from
/// parts. Counts are taken from the merged document, so a key contributed
/// by several files counts once.
pub fn merge(
    base: &SpecificationFile,
    parts: &[SpecificationFile],
    config: &MultiPartConfiguration,
) -> MergeResult {
    let source_files: Vec<String> = std::iter::once(base)
        .chain(parts)
        .map(|f| f.path().to_string())
        .collect();
    let mut diagnostics = base.diagnostics();

    let Some(base_doc) = base.document() else {
        return MergeResult::failed(diagnostics, source_files);
    };

    if !parts.is_empty() && !base_doc.has_base_metadata() {
        diagnostics.push(
            Diagnostic::error(
                MULTIPART_BASE_METADATA,
                format!(
                    "base file '{}' must declare 'openapi' and 'info.title'",
                    base.file_name()
                ),
            )
            .in_file(base.path())
            .at("info"),
        );
    }

    let mut merged: OpenApiSpec = (**base_doc).clone();
    let mut origins = Origins::seeded(&merged, base.path());

    for part in parts {
        let Some(doc) = part.document() else {
            let reason = part
                .parsed()
                .diagnostics
                .first()
                .map(|d| d.message.clone())
                .unwrap_or_else(|| "unknown parse failure".to_string());
            diagnostics.push(
                Diagnostic::error(
                    MULTIPART_PART_UNPARSABLE,
                    format!("part file '{}' could not be parsed: {reason}", part.file_name()),
                )
                .in_file(part.path()),
            );
            continue;
        };
        merge_part(&mut merged, &mut origins, part, doc, config, &mut diagnostics);
    }

    let total_paths = merged.paths.len();
    let total_operations = merged.operation_count();
    let total_schemas = merged.schema_count();

    if has_errors(&diagnostics) {
        info!(
            "merge of '{}' failed with {} diagnostic(s)",
            base.file_name(),
            diagnostics.len()
        );
        return MergeResult::failed(diagnostics, source_files);
    }

    info!(
        "merged {} file(s) into '{}': {total_paths} paths, {total_operations} operations, {total_schemas} schemas",
        source_files.len(),
        base.file_name()
    );

    MergeResult {
        success: true,
        document: Some(Arc::new(merged)),
        diagnostics,
        source_files,
        total_paths,
        total_operations,
        total_schemas,
    }
}

/// Which file contributed each key, per section.
#[derive(Default)]
struct Origins {
    paths: HashMap<String, String>,
    webhooks: HashMap<String, String>,
    schemas: HashMap<String, String>,
    parameters: HashMap<String, String>,
    responses: HashMap<String, String>,
    request_bodies: HashMap<String, String>,
    tags: HashMap<String, String>,
}

impl Origins {
    fn seeded(doc: &OpenApiSpec, file: &str) -> Self {
        fn keys<V>(map: &IndexMap<String, V>, file: &str) -> HashMap<String, String> {
            map.keys().map(|k| (k.clone(), file.to_string())).collect()
        }
        let mut origins = Origins {
            paths: keys(&doc.paths, file),
            webhooks: keys(&doc.webhooks, file),
            tags: doc
                .tags
                .iter()
                .map(|t| (t.name.clone(), file.to_string()))
                .collect(),
            ..Default::default()
        };
        if let Some(c) = &doc.components {
            origins.schemas = keys(&c.schemas, file);
            origins.parameters = keys(&c.parameters, file);
            origins.responses = keys(&c.responses, file);
            origins.request_bodies = keys(&c.request_bodies, file);
        }
        origins
    }
}

/// How duplicates in one section are reported.
struct Section<'a> {
    code: &'static str,
    label: &'static str,
    pointer: &'static str,
    strategy: MergeStrategy,
    file: &'a str,
}

fn merge_part(
    merged: &mut OpenApiSpec,
    origins: &mut Origins,
    part: &SpecificationFile,
    doc: &OpenApiSpec,
    config: &MultiPartConfiguration,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let file = part.path();
    debug!("merging part '{file}'");

    if !doc.servers.is_empty() {
        diagnostics.push(
            Diagnostic::warning(
                MULTIPART_PART_SERVERS,
                format!(
                    "part file '{}' declares 'servers'; servers belong in the base file and are ignored here",
                    part.file_name()
                ),
            )
            .in_file(file)
            .at("servers"),
        );
    }

    let section = |code, label, pointer, strategy| Section {
        code,
        label,
        pointer,
        strategy,
        file,
    };

    merge_map(
        &mut merged.paths,
        &mut origins.paths,
        &doc.paths,
        &section(
            MULTIPART_DUPLICATE_PATH,
            "path",
            "paths",
            config.paths_merge_strategy,
        ),
        diagnostics,
    );
    merge_map(
        &mut merged.webhooks,
        &mut origins.webhooks,
        &doc.webhooks,
        &section(
            MULTIPART_DUPLICATE_WEBHOOK,
            "webhook",
            "webhooks",
            config.webhooks_merge_strategy,
        ),
        diagnostics,
    );

    let mut tags: IndexMap<String, Tag> = merged
        .tags
        .drain(..)
        .map(|t| (t.name.clone(), t))
        .collect();
    let incoming: IndexMap<String, Tag> =
        doc.tags.iter().map(|t| (t.name.clone(), t.clone())).collect();
    merge_map(
        &mut tags,
        &mut origins.tags,
        &incoming,
        &section(
            MULTIPART_DUPLICATE_TAG,
            "tag",
            "tags",
            config.tags_merge_strategy,
        ),
        diagnostics,
    );
    merged.tags = tags.into_values().collect();

    let Some(components) = &doc.components else {
        return;
    };

    if !components.security_schemes.is_empty() {
        diagnostics.push(
            Diagnostic::warning(
                MULTIPART_PART_SECURITY_SCHEMES,
                format!(
                    "part file '{}' declares 'components.securitySchemes'; security schemes belong in the base file and are ignored here",
                    part.file_name()
                ),
            )
            .in_file(file)
            .at("components.securitySchemes"),
        );
    }

    let target = merged.components.get_or_insert_with(Default::default);
    merge_map(
        &mut target.schemas,
        &mut origins.schemas,
        &components.schemas,
        &section(
            MULTIPART_DUPLICATE_SCHEMA,
            "schema",
            "components.schemas",
            config.schemas_merge_strategy,
        ),
        diagnostics,
    );
    merge_map(
        &mut target.parameters,
        &mut origins.parameters,
        &components.parameters,
        &section(
            MULTIPART_CONFLICTING_COMPONENT,
            "parameter",
            "components.parameters",
            config.parameters_merge_strategy,
        ),
        diagnostics,
    );
    merge_map(
        &mut target.responses,
        &mut origins.responses,
        &components.responses,
        &section(
            MULTIPART_CONFLICTING_COMPONENT,
            "response",
            "components.responses",
            config.responses_merge_strategy,
        ),
        diagnostics,
    );
    merge_map(
        &mut target.request_bodies,
        &mut origins.request_bodies,
        &components.request_bodies,
        &section(
            MULTIPART_CONFLICTING_COMPONENT,
            "request body",
            "components.requestBodies",
            config.request_bodies_merge_strategy,
        ),
        diagnostics,
    );
    for (key, value) in &components.other {
        target.other.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

fn merge_map<V: Clone + PartialEq>(
    target: &mut IndexMap<String, V>,
    origins: &mut HashMap<String, String>,
    incoming: &IndexMap<String, V>,
    section: &Section<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (key, value) in incoming {
        let Some(existing) = target.get(key) else {
            target.insert(key.clone(), value.clone());
            origins.insert(key.clone(), section.file.to_string());
            continue;
        };
        let origin = origins
            .get(key)
            .cloned()
            .unwrap_or_else(|| "an earlier file".to_string());
        let identical = existing == value;
        let pointer = format!("{}.{key}", section.pointer);

        match section.strategy {
            MergeStrategy::ErrorOnDuplicate => diagnostics.push(
                Diagnostic::error(
                    section.code,
                    format!(
                        "duplicate {} '{key}' in '{}': already declared in '{origin}'",
                        section.label, section.file
                    ),
                )
                .in_file(section.file)
                .at(pointer),
            ),
            MergeStrategy::MergeIfIdentical if identical => {}
            MergeStrategy::MergeIfIdentical => diagnostics.push(
                Diagnostic::error(
                    section.code,
                    format!(
                        "conflicting {} '{key}' in '{}': differs from the definition in '{origin}'",
                        section.label, section.file
                    ),
                )
                .in_file(section.file)
                .at(pointer),
            ),
            MergeStrategy::FirstWins | MergeStrategy::LastWins if identical => {}
            MergeStrategy::FirstWins => diagnostics.push(
                Diagnostic::warning(
                    section.code,
                    format!(
                        "{} '{key}' in '{}' differs from '{origin}'; keeping the first definition",
                        section.label, section.file
                    ),
                )
                .in_file(section.file)
                .at(pointer),
            ),
            MergeStrategy::LastWins => {
                diagnostics.push(
                    Diagnostic::warning(
                        section.code,
                        format!(
                            "{} '{key}' in '{}' replaces the definition from '{origin}'",
                            section.label, section.file
                        ),
                    )
                    .in_file(section.file)
                    .at(pointer),
                );
                target.insert(key.clone(), value.clone());
                origins.insert(key.clone(), section.file.to_string());
            }
        }
    }
}
