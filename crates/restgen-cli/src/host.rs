//! Discovery of what the host project already provides, by scanning its
//! C# sources and project files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use restgen_core::pipeline::{HandlerDescriptor, HostEnvironment};
use walkdir::{DirEntry, WalkDir};

const GENERATED_HEADER: &str = "// <auto-generated />";
const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git", ".vs", "node_modules"];

/// The declarations the scan looks for.
struct Patterns {
    namespace: Regex,
    class: Regex,
    handler_interface: Regex,
    framework_reference: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            namespace: Regex::new(r"(?m)^\s*namespace\s+([\w.]+)")?,
            class: Regex::new(r"\bclass\s+(\w+)(?:\s*<[^>{]*>)?(?:\s*\([^)]*\))?\s*:\s*([^{;]+)")?,
            handler_interface: Regex::new(r"\binterface\s+(I\w+)[^{]*\{[^}]*\bHandleAsync\s*\(")?,
            framework_reference: Regex::new(
                r#"<(?:PackageReference|FrameworkReference)\s+Include\s*=\s*"Microsoft\.AspNetCore\.OpenApi""#,
            )?,
        })
    }
}

/// What a scan of one source tree found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSystemHost {
    framework_reference: bool,
    handlers: Vec<HandlerDescriptor>,
    validators: Vec<String>,
    interface_namespaces: Vec<String>,
}

impl FileSystemHost {
    /// Scan every `.cs` and `.csproj` file under `root`. Build output
    /// directories are skipped; generated sources only count for the
    /// handler interfaces they declare.
    pub fn scan(root: &Path) -> Result<Self> {
        let patterns = Patterns::new().context("invalid scan pattern")?;
        let mut host = Self::default();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("cs") => host.add_source(&patterns, &read(path)?),
                Some("csproj") => {
                    host.framework_reference |= patterns.framework_reference.is_match(&read(path)?)
                }
                _ => {}
            }
        }
        debug!(
            "scanned {}: {} handler(s), {} validator(s), framework reference: {}",
            root.display(),
            host.handlers.len(),
            host.validators.len(),
            host.framework_reference
        );
        Ok(host)
    }

    fn add_source(&mut self, patterns: &Patterns, source: &str) {
        let namespace = patterns
            .namespace
            .captures(source)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        for caps in patterns.handler_interface.captures_iter(source) {
            debug!("found handler interface {}", &caps[1]);
            self.interface_namespaces.push(namespace.clone());
        }
        if source.trim_start().starts_with(GENERATED_HEADER) {
            return;
        }
        for caps in patterns.class.captures_iter(source) {
            let class = &caps[1];
            let interface = format!("I{class}");
            let bases: Vec<&str> = caps[2].split(',').map(str::trim).collect();
            if bases.iter().any(|b| type_name(b) == interface) {
                self.handlers.push(HandlerDescriptor::new(class, namespace.as_str()));
            }
            if bases
                .iter()
                .any(|b| b.contains('<') && type_name(b) == "IRequestValidator")
            {
                self.validators.push(qualify(&namespace, class));
            }
        }
    }
}

impl HostEnvironment for FileSystemHost {
    fn has_framework_reference(&self) -> bool {
        self.framework_reference
    }

    fn handlers(&self) -> Vec<HandlerDescriptor> {
        self.handlers.clone()
    }

    fn validators(&self) -> Vec<String> {
        self.validators.clone()
    }

    fn interface_namespaces(&self) -> Vec<String> {
        self.interface_namespaces.clone()
    }
}

/// Simple name of a base type: no namespace, no type arguments.
fn type_name(base: &str) -> &str {
    let base = base.split('<').next().unwrap_or(base).trim();
    base.rsplit(['.', ':']).next().unwrap_or(base)
}

fn qualify(namespace: &str, class: &str) -> String {
    if namespace.is_empty() {
        class.to_string()
    } else {
        format!("{namespace}.{class}")
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use restgen_core::pipeline::CompilationSummary;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_handlers_validators_and_package() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "Api.csproj",
            r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <ItemGroup>
    <PackageReference Include="Microsoft.AspNetCore.OpenApi" Version="9.0.0" />
  </ItemGroup>
</Project>"#,
        );
        write(
            root,
            "Patients/GetPatientHandler.cs",
            "namespace Clinic.Api.Patients;\n\npublic sealed class GetPatientHandler(IClock clock) : global::Clinic.Generated.Patients.IGetPatientHandler\n{\n}\n",
        );
        write(
            root,
            "Tasks/Handlers.cs",
            "namespace Clinic.Api.Tasks\n{\n    public class ListTasksHandler : IListTasksHandler, IDisposable { }\n    public class Helper : IDisposable { }\n}\n",
        );
        write(
            root,
            "Validation/PatientValidator.cs",
            "namespace Clinic.Api;\npublic sealed class PatientValidator : IRequestValidator<CreatePatientParameters>\n{\n}\n",
        );
        write(
            root,
            "Generated/Patients/Operations/GetPatient.cs",
            "// <auto-generated />\nnamespace Clinic.Generated.Patients;\npublic interface IGetPatientHandler\n{\n    Task<GetPatientResult> HandleAsync(GetPatientParameters parameters, CancellationToken cancellationToken);\n}\npublic sealed class Decoy : IDecoy { }\n",
        );
        write(root, "obj/Stale.cs", "namespace Old;\npublic class OldHandler : IOldHandler { }\n");

        let host = FileSystemHost::scan(root).unwrap();
        let summary = CompilationSummary::from_host(&host);
        assert!(summary.has_framework_reference);
        assert_eq!(
            summary.handlers,
            vec![
                HandlerDescriptor::new("GetPatientHandler", "Clinic.Api.Patients"),
                HandlerDescriptor::new("ListTasksHandler", "Clinic.Api.Tasks"),
            ]
        );
        assert_eq!(summary.validators, vec!["Clinic.Api.PatientValidator"]);
        assert_eq!(summary.interface_namespaces, vec!["Clinic.Generated.Patients"]);
    }

    #[test]
    fn empty_tree_provides_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileSystemHost::scan(dir.path()).unwrap();
        assert_eq!(CompilationSummary::from_host(&host), CompilationSummary::default());
    }
}
