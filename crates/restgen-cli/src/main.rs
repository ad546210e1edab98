mod host;
mod specs;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;

use restgen_core::config::{
    self, CONFIG_FILE_NAME, MultiPartConfiguration, ProjectConfig, SubFolderStrategy, Target,
    ValidationStrategy,
};
use restgen_core::conflicts::{ConflictSet, TypeConflictRegistry};
use restgen_core::diagnostics::{Diagnostic, Severity, count_by_severity, has_errors};
use restgen_core::merge::{discover_with, merge_group};
use restgen_core::naming::normalize_name;
use restgen_core::parse::{self, ParseCache, spec::OpenApiSpec};
use restgen_core::partition::partition;
use restgen_core::pipeline::{CompilationSummary, Emitter, IncrementalPipeline, PipelineInputs};
use restgen_core::source::SpecificationFile;
use restgen_core::split::{SplitStrategy, split};
use restgen_core::validate::validate;
use restgen_csharp::generator_for;

use host::FileSystemHost;

/// Handlers run first so the server's registrations see freshly created
/// scaffolds.
const GENERATION_ORDER: [Target; 3] = [Target::Handlers, Target::Server, Target::Client];

#[derive(Parser)]
#[command(name = "restgen", about = "OpenAPI to ASP.NET Core minimal API generator", version)]
struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for every target with a marker file
    Generate {
        /// Only these targets
        #[arg(short, long, value_enum)]
        target: Vec<TargetArg>,

        /// Leave existing handler files untouched
        #[arg(long)]
        no_reconcile: bool,
    },

    /// Parse, merge and lint specifications
    Validate {
        /// Specification files or directories; defaults to the configured specs
        #[arg(short, long)]
        input: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "strict")]
        strategy: StrategyArg,
    },

    /// Merge multi-part specifications into single documents
    Merge {
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Output directory; stdout when omitted and there is one document
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split one specification into a base file and parts
    Split {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "tag")]
        by: SplitBy,

        /// Keep schemas used by several parts in those parts
        #[arg(long)]
        no_extract_common: bool,

        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show how a specification is partitioned and named
    Inspect {
        #[arg(short, long)]
        input: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "first-path-segment")]
        sub_folders: SubFolders,

        /// Root namespace; defaults to the API title
        #[arg(long)]
        project: Option<String>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a restgen configuration and marker files
    Init {
        /// Marker files to create
        #[arg(short, long, value_enum)]
        target: Vec<TargetArg>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    Server,
    Handlers,
    Client,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Server => Target::Server,
            TargetArg::Handlers => Target::Handlers,
            TargetArg::Client => Target::Client,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    None,
    Standard,
    Strict,
}

impl From<StrategyArg> for ValidationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::None => ValidationStrategy::None,
            StrategyArg::Standard => ValidationStrategy::Standard,
            StrategyArg::Strict => ValidationStrategy::Strict,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitBy {
    Tag,
    Segment,
}

#[derive(Clone, Copy, ValueEnum)]
enum SubFolders {
    None,
    FirstPathSegment,
    OpenApiTag,
}

impl From<SubFolders> for SubFolderStrategy {
    fn from(arg: SubFolders) -> Self {
        match arg {
            SubFolders::None => SubFolderStrategy::None,
            SubFolders::FirstPathSegment => SubFolderStrategy::FirstPathSegment,
            SubFolders::OpenApiTag => SubFolderStrategy::OpenApiTag,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            target,
            no_reconcile,
        } => cmd_generate(&cli.config, &target, no_reconcile),

        Commands::Validate { input, strategy } => cmd_validate(&cli.config, &input, strategy.into()),

        Commands::Merge { input, output } => cmd_merge(&cli.config, &input, output.as_deref()),

        Commands::Split {
            input,
            by,
            no_extract_common,
            output,
        } => cmd_split(&input, by, !no_extract_common, &output),

        Commands::Inspect {
            input,
            sub_folders,
            project,
            format,
        } => cmd_inspect(&cli.config, &input, sub_folders.into(), project, format),

        Commands::Init { target, force } => cmd_init(&cli.config, &target, force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "restgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// The project config (defaults when the file is absent) and the directory
/// its relative paths are resolved against.
fn load_project(config_path: &Path) -> Result<(PathBuf, ProjectConfig)> {
    let cfg = config::load_config(config_path)?.unwrap_or_default();
    let base = config_path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((base, cfg))
}

/// Specs named on the command line, or the configured ones.
fn input_specs(config_path: &Path, input: &[PathBuf]) -> Result<Vec<(String, Arc<str>)>> {
    let specs = if input.is_empty() {
        let (base, cfg) = load_project(config_path)?;
        specs::collect(&base, &cfg.specs)?
    } else {
        let entries: Vec<String> = input.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        specs::collect(Path::new(""), &entries)?
    };
    if specs.is_empty() {
        bail!("no specification files found");
    }
    Ok(specs)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("  {d}");
    }
}

/// Group, merge and return each merged document with the path of its base.
fn merged_documents(
    specs: &[(String, Arc<str>)],
) -> (Vec<(String, Arc<OpenApiSpec>)>, Vec<Diagnostic>) {
    let cache = ParseCache::new();
    let files: Vec<SpecificationFile> = specs
        .iter()
        .map(|(path, text)| SpecificationFile::new(path, Arc::clone(text), &cache))
        .collect();
    let config = MultiPartConfiguration::default();
    let discovery = discover_with(&files, &config);
    let mut diagnostics = discovery.diagnostics;
    let mut documents = Vec::new();
    for group in &discovery.groups {
        let merged = merge_group(group, &config);
        diagnostics.extend(merged.diagnostics);
        if let Some(doc) = merged.document {
            documents.push((group.base.path().to_string(), doc));
        }
    }
    (documents, diagnostics)
}

fn cmd_generate(config_path: &Path, targets: &[TargetArg], no_reconcile: bool) -> Result<()> {
    let (base, cfg) = load_project(config_path)?;
    let specs = specs::collect(&base, &cfg.specs)?;
    if specs.is_empty() {
        bail!("no specification files found in {:?}", cfg.specs);
    }

    let emitter = Emitter {
        skip_reconcile: no_reconcile,
    };
    let mut ran = 0;
    let mut errors = 0;
    for target in GENERATION_ORDER {
        if !targets.is_empty() && !targets.iter().any(|t| Target::from(*t) == target) {
            continue;
        }
        let marker_path = base.join(&cfg.markers).join(target.marker_file_name());
        if !marker_path.exists() {
            debug!("{} not found; skipping {}", marker_path.display(), target.as_str());
            continue;
        }
        let marker = fs::read_to_string(&marker_path)
            .with_context(|| format!("failed to read {}", marker_path.display()))?;
        // Rescanned per target: earlier targets may have added handlers.
        let summary = match &cfg.host {
            Some(host) => CompilationSummary::from_host(&FileSystemHost::scan(&base.join(host))?),
            None => CompilationSummary::default(),
        };
        let inputs = PipelineInputs {
            specs: specs.clone(),
            marker: Some(Arc::from(marker)),
            summary,
            project: cfg.project.clone(),
        };

        let output_dir = base.join(&cfg.output).join(target.as_str());
        eprintln!("Generating {} → {}", target.as_str(), output_dir.display());
        let generator = generator_for(target);
        let run = IncrementalPipeline::new().run(&inputs, generator.as_ref());
        ran += 1;
        print_diagnostics(&run.output.diagnostics);
        errors += count_by_severity(&run.output.diagnostics, Severity::Error);
        if run.output.files.is_empty() {
            eprintln!("  nothing generated");
            continue;
        }

        let report = emitter
            .emit(&run.output, &output_dir)
            .with_context(|| format!("failed to write {}", output_dir.display()))?;
        if report.up_to_date {
            eprintln!("  up to date");
        } else {
            eprintln!(
                "  {} written, {} unchanged, {} removed, {} handler(s) created, {} reconciled",
                report.written.len(),
                report.unchanged.len(),
                report.removed.len(),
                report.scaffolds_created.len(),
                report.scaffolds_reconciled.len()
            );
        }
        for (path, reason) in &report.scaffolds_kept {
            debug!("kept {path}: {reason}");
        }
    }

    if ran == 0 {
        eprintln!(
            "No marker files in {}. Run `restgen init` to create one.",
            base.join(&cfg.markers).display()
        );
    }
    if errors > 0 {
        bail!("generation reported {errors} error(s)");
    }
    Ok(())
}

fn cmd_validate(config_path: &Path, input: &[PathBuf], strategy: ValidationStrategy) -> Result<()> {
    let specs = input_specs(config_path, input)?;
    let cache = ParseCache::new();
    let files: Vec<SpecificationFile> = specs
        .iter()
        .map(|(path, text)| SpecificationFile::new(path, Arc::clone(text), &cache))
        .collect();
    let config = MultiPartConfiguration::default();
    let discovery = discover_with(&files, &config);
    let mut diagnostics = discovery.diagnostics;
    for group in &discovery.groups {
        let merged = merge_group(group, &config);
        diagnostics.extend(merged.diagnostics.iter().cloned());
        let Some(doc) = &merged.document else {
            continue;
        };
        eprintln!(
            "{}: OpenAPI {} \"{}\" ({} part file(s))",
            group.base.path(),
            doc.openapi,
            doc.info.title,
            group.parts.len()
        );
        eprintln!("  Paths: {}", merged.total_paths);
        eprintln!("  Operations: {}", merged.total_operations);
        eprintln!("  Schemas: {}", merged.total_schemas);
        diagnostics.extend(validate(strategy, doc, &[], Some(group.base.path())));
    }

    print_diagnostics(&diagnostics);
    let errors = count_by_severity(&diagnostics, Severity::Error);
    let warnings = count_by_severity(&diagnostics, Severity::Warning);
    if errors > 0 {
        bail!("validation failed: {errors} error(s), {warnings} warning(s)");
    }
    eprintln!("Validation successful ({warnings} warning(s)).");
    Ok(())
}

fn cmd_merge(config_path: &Path, input: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let specs = input_specs(config_path, input)?;
    let (documents, diagnostics) = merged_documents(&specs);
    print_diagnostics(&diagnostics);
    if has_errors(&diagnostics) {
        bail!("merge failed");
    }

    match output {
        None if documents.len() == 1 => {
            let (_, doc) = &documents[0];
            print!("{}", serde_yaml_ng::to_string(doc.as_ref())?);
        }
        None => bail!("{} merged documents; pass --output to write them to a directory", documents.len()),
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
            for (base, doc) in &documents {
                let name = base.rsplit('/').next().unwrap_or(base);
                let path = dir.join(name);
                fs::write(&path, serde_yaml_ng::to_string(doc.as_ref())?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("  wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn cmd_split(input: &Path, by: SplitBy, extract_common: bool, output: &Path) -> Result<()> {
    let content =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let doc = parse::from_yaml(&content).with_context(|| format!("failed to parse {}", input.display()))?;
    let base_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("input has no file name")?;
    let strategy = match by {
        SplitBy::Tag => SplitStrategy::ByTag,
        SplitBy::Segment => SplitStrategy::ByPathSegment,
    };

    let result = split(&doc, base_name, strategy, extract_common);
    print_diagnostics(&result.diagnostics);
    fs::create_dir_all(output).with_context(|| format!("failed to create {}", output.display()))?;
    for file in &result.files {
        let path = output.join(&file.file_name);
        fs::write(&path, file.to_yaml()?).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    eprintln!("Split into {} file(s).", result.files.len());
    Ok(())
}

fn cmd_inspect(
    config_path: &Path,
    input: &[PathBuf],
    strategy: SubFolderStrategy,
    project: Option<String>,
    format: InspectFormat,
) -> Result<()> {
    let specs = input_specs(config_path, input)?;
    let (documents, diagnostics) = merged_documents(&specs);
    print_diagnostics(&diagnostics);

    let summaries: Vec<serde_json::Value> = documents
        .iter()
        .map(|(base, doc)| build_inspect_summary(base, doc, strategy, project.as_deref()))
        .collect();
    let summary = match summaries.len() {
        1 => summaries.into_iter().next().unwrap_or_default(),
        _ => serde_json::Value::Array(summaries),
    };

    match format {
        InspectFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&summary)?),
        InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn build_inspect_summary(
    base: &str,
    doc: &OpenApiSpec,
    strategy: SubFolderStrategy,
    project: Option<&str>,
) -> serde_json::Value {
    let project = project
        .map(str::to_string)
        .unwrap_or_else(|| normalize_name(&doc.info.title).pascal_case);
    let parts = partition(doc, strategy);
    let set = Arc::new(ConflictSet::scan(doc, &parts));

    let segments: Vec<serde_json::Value> = parts
        .segments
        .iter()
        .map(|segment| {
            let registry = TypeConflictRegistry::for_segment(&set, &project, segment.name.as_deref());
            let operations: Vec<String> = segment
                .operations
                .iter()
                .map(|op| format!("{} {}", op.method.as_str(), op.path))
                .collect();
            let schemas: Vec<&str> = segment
                .schemas
                .iter()
                .map(|key| registry.simple_name(key).unwrap_or(key))
                .collect();
            serde_json::json!({
                "name": segment.name,
                "namespace": registry.namespace(),
                "operations": operations,
                "schemas": schemas,
            })
        })
        .collect();

    let shared = TypeConflictRegistry::for_segment(&set, &project, None);
    let shared_schemas: Vec<&str> = parts
        .shared_schemas
        .iter()
        .map(|key| shared.simple_name(key).unwrap_or(key))
        .collect();
    let collisions: Vec<serde_json::Value> = set
        .collisions()
        .into_iter()
        .map(|(name, count)| serde_json::json!({ "name": name, "namespaces": count }))
        .collect();

    serde_json::json!({
        "source": base,
        "info": {
            "title": doc.info.title,
            "version": doc.info.version,
        },
        "project": project,
        "segments": segments,
        "shared": {
            "namespace": shared.models_namespace(),
            "schemas": shared_schemas,
        },
        "collisions": collisions,
    })
}

fn cmd_init(config_path: &Path, targets: &[TargetArg], force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite.", config_path.display());
    }
    fs::write(config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());

    let base = config_path.parent().unwrap_or(Path::new(""));
    let targets: Vec<Target> = if targets.is_empty() {
        vec![Target::Server, Target::Handlers]
    } else {
        targets.iter().map(|t| Target::from(*t)).collect()
    };
    for target in targets {
        let path = base.join(target.marker_file_name());
        if path.exists() && !force {
            eprintln!("Kept existing {}", path.display());
            continue;
        }
        fs::write(&path, config::default_marker_content())
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Created {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"openapi: 3.0.3
info: { title: Vet Clinic, version: "1" }
paths:
  /patients/{patientId}:
    get:
      operationId: getPatient
      parameters:
        - { name: patientId, in: path, required: true, schema: { type: string } }
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Patient' }
components:
  schemas:
    Patient:
      type: object
      properties:
        name: { type: string }
"#;

    const MARKER: &str = r#"{ "namespace": "Clinic", "validateSpecificationStrategy": "None" }"#;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join(CONFIG_FILE_NAME),
            "specs: [api]\noutput: Generated\nmarkers: .\nhost: .\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("api/clinic.yaml"), SPEC).unwrap();
        for target in Target::ALL {
            fs::write(root.join(target.marker_file_name()), MARKER).unwrap();
        }
        dir
    }

    #[test]
    fn generate_wires_fresh_scaffolds_and_is_stable() {
        let dir = project();
        let root = dir.path();
        let config = root.join(CONFIG_FILE_NAME);
        cmd_generate(&config, &[], false).unwrap();

        let scaffold = root.join("Generated/handlers/Patients/Handlers/GetPatientHandler.cs");
        assert!(scaffold.exists());
        let wiring =
            fs::read_to_string(root.join("Generated/server/GeneratedApiExtensions.cs")).unwrap();
        assert!(wiring.contains(
            "services.AddScoped<global::Clinic.Generated.Patients.IGetPatientHandler, global::Clinic.Generated.Patients.GetPatientHandler>();"
        ));
        assert!(root.join("Generated/client/Patients/PatientsClient.cs").exists());

        fs::write(&scaffold, "// mine\n").unwrap();
        cmd_generate(&config, &[TargetArg::Handlers], false).unwrap();
        assert_eq!(fs::read_to_string(&scaffold).unwrap(), "// mine\n");
    }

    #[test]
    fn marker_errors_fail_the_command() {
        let dir = project();
        let root = dir.path();
        fs::write(root.join(Target::Server.marker_file_name()), "{ not json").unwrap();
        let err = cmd_generate(&root.join(CONFIG_FILE_NAME), &[TargetArg::Server], false).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }

    #[test]
    fn split_then_validate_the_parts() {
        let dir = project();
        let root = dir.path();
        let out = root.join("split");
        cmd_split(&root.join("api/clinic.yaml"), SplitBy::Segment, true, &out).unwrap();
        assert!(out.join("clinic.yaml").exists());

        let inputs = vec![out.clone()];
        cmd_validate(Path::new(CONFIG_FILE_NAME), &inputs, ValidationStrategy::None).unwrap();
        cmd_merge(Path::new(CONFIG_FILE_NAME), &inputs, Some(&root.join("merged"))).unwrap();
        let merged = fs::read_to_string(root.join("merged/clinic.yaml")).unwrap();
        assert!(merged.contains("/patients/{patientId}"));
    }

    #[test]
    fn inspect_summary_names_segments_and_namespaces() {
        let doc = parse::from_yaml(SPEC).unwrap();
        let summary = build_inspect_summary("clinic.yaml", &doc, SubFolderStrategy::FirstPathSegment, None);
        assert_eq!(summary["project"], "VetClinic");
        assert_eq!(summary["segments"][0]["name"], "Patients");
        assert_eq!(summary["segments"][0]["namespace"], "VetClinic.Generated.Patients");
        assert_eq!(summary["segments"][0]["operations"][0], "GET /patients/{patientId}");
        assert_eq!(summary["segments"][0]["schemas"][0], "Patient");
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(CONFIG_FILE_NAME);
        cmd_init(&config, &[TargetArg::Client], false).unwrap();
        assert!(dir.path().join("restgen.client.json").exists());
        assert!(!dir.path().join("restgen.server.json").exists());
        assert!(cmd_init(&config, &[], false).is_err());
    }
}
