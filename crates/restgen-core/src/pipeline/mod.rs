//! The incremental generation pipeline: specs and a marker in, files and
//! diagnostics out, recomputed only when an input changed.

pub mod emit;
pub mod key;
pub mod signature;
pub mod summary;

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::config::{MarkerConfig, Target, TriState};
use crate::conflicts::{ConflictSet, TypeConflictRegistry};
use crate::diagnostics::{Diagnostic, has_errors};
use crate::error::GenerateError;
use crate::ir::{GenerationUnit, build_shared_unit, build_unit};
use crate::merge::{discover_with, merge_group};
use crate::naming::normalize_name;
use crate::parse::ParseCache;
use crate::parse::spec::OpenApiSpec;
use crate::partition::{Segment, partition};
use crate::source::SpecificationFile;
use crate::validate::validate;
use crate::{CodeGenerator, GeneratedFile};

pub use emit::{EmitReport, Emitter};
pub use key::GenerationKey;
pub use summary::{CompilationSummary, HandlerDescriptor, HostEnvironment};

pub const GENERATION_DISABLED: &str = "GEN001";
pub const MISSING_FRAMEWORK_REFERENCE: &str = "GEN002";
pub const MISSING_VALIDATOR: &str = "GEN003";
pub const INVALID_MARKER: &str = "GEN004";
pub const UNIT_FAILED: &str = "GEN010";

/// Everything one run reads.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    /// `(path, text)` of every specification file.
    pub specs: Vec<(String, Arc<str>)>,
    /// Marker text; `None` when the target's marker file is absent.
    pub marker: Option<Arc<str>>,
    pub summary: CompilationSummary,
    /// Root namespace override; the marker's `namespace` wins over it.
    pub project: Option<String>,
}

/// Host capabilities resolved against the marker's switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub minimal_api_package: bool,
    pub validation_filter: bool,
    pub global_error_handler: bool,
}

/// Read-only view handed to generators.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub document: &'a OpenApiSpec,
    pub config: &'a MarkerConfig,
    pub summary: &'a CompilationSummary,
    /// Root namespace of generated code.
    pub project: &'a str,
    pub features: Features,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
    /// Fingerprint of the key that produced this output. `None` when no
    /// marker was present.
    pub fingerprint: Option<String>,
}

impl GenerationOutput {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    fn halted(diagnostics: Vec<Diagnostic>, fingerprint: String) -> Self {
        Self {
            files: Vec::new(),
            diagnostics,
            fingerprint: Some(fingerprint),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub output: Arc<GenerationOutput>,
    /// The previous output was returned without recomputation.
    pub reused: bool,
}

/// Runs generation for one target and remembers the last result.
#[derive(Debug, Default)]
pub struct IncrementalPipeline {
    cache: ParseCache,
    last: Mutex<Option<(GenerationKey, Arc<GenerationOutput>)>>,
    computations: AtomicU64,
}

impl IncrementalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many runs did real work.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn parse_cache(&self) -> &ParseCache {
        &self.cache
    }

    /// Generate, or return the previous output when nothing changed. Never
    /// fails: every problem becomes a diagnostic.
    pub fn run(&self, inputs: &PipelineInputs, generator: &dyn CodeGenerator) -> PipelineRun {
        let Some(marker) = &inputs.marker else {
            debug!("no {} marker; nothing to generate", generator.target().as_str());
            return PipelineRun {
                output: Arc::new(GenerationOutput::default()),
                reused: false,
            };
        };
        let key = GenerationKey::new(
            generator.target(),
            inputs.project.clone(),
            inputs.specs.iter().cloned(),
            Arc::clone(marker),
            inputs.summary.clone(),
        );
        if let Some((last_key, output)) = self.last.lock().as_ref()
            && *last_key == key
        {
            debug!("{} inputs unchanged; reusing previous output", generator.target().as_str());
            return PipelineRun {
                output: Arc::clone(output),
                reused: true,
            };
        }

        self.computations.fetch_add(1, Ordering::Relaxed);
        let output = Arc::new(self.compute(inputs, marker, key.fingerprint(), generator));
        info!(
            "{}: {} file(s), {} diagnostic(s)",
            generator.target().as_str(),
            output.files.len(),
            output.diagnostics.len()
        );
        *self.last.lock() = Some((key, Arc::clone(&output)));
        PipelineRun {
            output,
            reused: false,
        }
    }

    fn compute(
        &self,
        inputs: &PipelineInputs,
        marker: &str,
        fingerprint: String,
        generator: &dyn CodeGenerator,
    ) -> GenerationOutput {
        let config = match MarkerConfig::from_json(marker) {
            Ok(config) => config,
            Err(e) => {
                let d = Diagnostic::error(INVALID_MARKER, format!("marker file is not valid JSON: {e}"))
                    .in_file(generator.target().marker_file_name());
                return GenerationOutput::halted(vec![d], fingerprint);
            }
        };
        if !config.generate {
            let d = Diagnostic::info(
                GENERATION_DISABLED,
                format!("generation is disabled by {}", generator.target().marker_file_name()),
            );
            return GenerationOutput::halted(vec![d], fingerprint);
        }

        let (features, mut diagnostics) = resolve_features(generator.target(), &config, &inputs.summary);
        if has_errors(&diagnostics) {
            return GenerationOutput::halted(diagnostics, fingerprint);
        }

        let files: Vec<SpecificationFile> = inputs
            .specs
            .iter()
            .map(|(path, text)| SpecificationFile::new(path, Arc::clone(text), &self.cache))
            .collect();
        let discovery = discover_with(&files, &config.multi_part_configuration);
        diagnostics.extend(discovery.diagnostics);
        if has_errors(&diagnostics) {
            return GenerationOutput::halted(diagnostics, fingerprint);
        }

        let several = discovery.groups.len() > 1;
        let mut out = Vec::new();
        for group in &discovery.groups {
            let merged = merge_group(group, &config.multi_part_configuration);
            diagnostics.extend(merged.diagnostics);
            let Some(doc) = merged.document else {
                continue;
            };
            let found = validate(
                config.validate_specification_strategy,
                &doc,
                &[],
                Some(group.base.path()),
            );
            let blocked = has_errors(&found);
            diagnostics.extend(found);
            if blocked {
                warn!("'{}' has validation errors; skipping generation", group.base.file_name());
                continue;
            }

            let root = project_name(&config, inputs.project.as_deref(), &doc);
            let (project, prefix) = if several {
                let stem = normalize_name(group.base.stem()).pascal_case;
                (format!("{root}.{stem}"), format!("{stem}/"))
            } else {
                (root, String::new())
            };
            let ctx = GenerationContext {
                document: &doc,
                config: &config,
                summary: &inputs.summary,
                project: &project,
                features,
            };
            let (files, failures) = generate_document(&ctx, generator);
            diagnostics.extend(failures.into_iter().map(|d| d.in_file(group.base.path())));
            out.extend(files.into_iter().map(|mut f| {
                f.path = format!("{prefix}{}", f.path);
                f
            }));
        }

        if has_errors(&diagnostics) && out.is_empty() {
            return GenerationOutput::halted(diagnostics, fingerprint);
        }
        GenerationOutput {
            files: out,
            diagnostics,
            fingerprint: Some(fingerprint),
        }
    }
}

/// Check explicit switches against the host and resolve `Auto` ones.
fn resolve_features(
    target: Target,
    config: &MarkerConfig,
    summary: &CompilationSummary,
) -> (Features, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    if target == Target::Client {
        return (Features::default(), diagnostics);
    }
    if config.use_minimal_api_package == TriState::Enabled && !summary.has_framework_reference {
        diagnostics.push(
            Diagnostic::error(
                MISSING_FRAMEWORK_REFERENCE,
                "useMinimalApiPackage is enabled but the project does not reference the minimal API framework",
            )
            .in_file(target.marker_file_name()),
        );
    }
    if config.use_validation_filter == TriState::Enabled && !summary.has_validators() {
        diagnostics.push(
            Diagnostic::error(
                MISSING_VALIDATOR,
                "useValidationFilter is enabled but no validator implementation was found",
            )
            .in_file(target.marker_file_name()),
        );
    }
    let features = Features {
        minimal_api_package: config
            .use_minimal_api_package
            .resolve(summary.has_framework_reference),
        validation_filter: config.use_validation_filter.resolve(summary.has_validators()),
        global_error_handler: config.use_global_error_handler.resolve(true),
    };
    (features, diagnostics)
}

fn project_name(config: &MarkerConfig, project: Option<&str>, doc: &OpenApiSpec) -> String {
    config
        .namespace
        .as_deref()
        .or(project)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let name = normalize_name(&doc.info.title).pascal_case;
            if name.is_empty() { "Api".to_string() } else { name }
        })
}

/// Partition the document, generate every unit on its own thread and then
/// the project-wide files. A failing unit is reported and skipped.
fn generate_document(
    ctx: &GenerationContext<'_>,
    generator: &dyn CodeGenerator,
) -> (Vec<GeneratedFile>, Vec<Diagnostic>) {
    let doc = ctx.document;
    let parts = partition(doc, ctx.config.sub_folder_strategy);
    let set = Arc::new(ConflictSet::scan(doc, &parts));
    let include_deprecated = ctx.config.include_deprecated;

    let results: Vec<(String, Result<(GenerationUnit, Vec<GeneratedFile>), String>)> =
        std::thread::scope(|s| {
            let shared = {
                let set = &set;
                let shared_schemas = &parts.shared_schemas;
                s.spawn(move || {
                    let registry = TypeConflictRegistry::for_segment(set, ctx.project, None);
                    let unit = build_shared_unit(doc, shared_schemas, registry)?;
                    run_unit(generator, unit, ctx)
                })
            };
            let segments: Vec<_> = parts
                .segments
                .iter()
                .map(|segment| {
                    let set = &set;
                    let handle = s.spawn(move || {
                        let registry =
                            TypeConflictRegistry::for_segment(set, ctx.project, segment_label(segment));
                        let unit = build_unit(doc, segment, registry, include_deprecated)?;
                        run_unit(generator, unit, ctx)
                    });
                    (segment_label(segment).unwrap_or("Default").to_string(), handle)
                })
                .collect();

            std::iter::once(("Shared".to_string(), shared))
                .chain(segments)
                .map(|(label, handle)| {
                    let result = match handle.join() {
                        Ok(Ok(done)) => Ok(done),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(payload) => Err(format!("panicked: {}", panic_message(&*payload))),
                    };
                    (label, result)
                })
                .collect()
        });

    let mut files = Vec::new();
    let mut units = Vec::new();
    let mut diagnostics = Vec::new();
    for (label, result) in results {
        match result {
            Ok((unit, generated)) => {
                debug!("unit {label}: {} file(s)", generated.len());
                files.extend(generated);
                units.push(unit);
            }
            Err(reason) => {
                warn!("unit {label} failed: {reason}");
                diagnostics.push(unit_failed(&label, &reason));
            }
        }
    }

    match generator.generate_shared(ctx, &units) {
        Ok(generated) => files.extend(generated),
        Err(e) => diagnostics.push(unit_failed("project", &e.to_string())),
    }
    (files, diagnostics)
}

fn run_unit(
    generator: &dyn CodeGenerator,
    unit: GenerationUnit,
    ctx: &GenerationContext<'_>,
) -> Result<(GenerationUnit, Vec<GeneratedFile>), GenerateError> {
    if unit.is_empty() {
        return Ok((unit, Vec::new()));
    }
    let files = generator.generate_unit(&unit, ctx)?;
    Ok((unit, files))
}

/// Segment name as used in namespaces and folders.
fn segment_label(segment: &Segment) -> Option<&str> {
    segment.name.as_deref()
}

fn unit_failed(label: &str, reason: &str) -> Diagnostic {
    Diagnostic::error(UNIT_FAILED, format!("generation of segment '{label}' failed: {reason}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
