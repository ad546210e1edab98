use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A generation target. Each target is switched on by its own marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Server,
    Handlers,
    Client,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Server, Target::Handlers, Target::Client];

    pub fn marker_file_name(&self) -> &'static str {
        match self {
            Target::Server => "restgen.server.json",
            Target::Handlers => "restgen.handlers.json",
            Target::Client => "restgen.client.json",
        }
    }

    /// Which target a marker file enables, matched on the file name alone.
    pub fn from_marker_file(path: &str) -> Option<Target> {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        Target::ALL
            .into_iter()
            .find(|t| t.marker_file_name().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Server => "server",
            Target::Handlers => "handlers",
            Target::Client => "client",
        }
    }
}

/// How generated sources are grouped into sub-folders and namespaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubFolderStrategy {
    None,
    #[default]
    FirstPathSegment,
    OpenApiTag,
}

/// Which validator rules run before generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationStrategy {
    None,
    Standard,
    #[default]
    Strict,
}

/// Conflict resolution for one mergeable section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// Any key contributed by more than one file is an error.
    ErrorOnDuplicate,
    /// Duplicates are allowed when structurally equal.
    MergeIfIdentical,
    /// The first file to declare a key keeps it.
    FirstWins,
    /// The last file to declare a key replaces earlier ones.
    LastWins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscoveryMode {
    /// Parts are found by the `{Base}_{Part}.yaml` naming convention.
    #[default]
    Auto,
    /// Parts are exactly the files listed in `partFiles`.
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiPartConfiguration {
    pub enabled: bool,
    pub discovery: DiscoveryMode,
    pub part_files: Vec<String>,
    pub paths_merge_strategy: MergeStrategy,
    pub schemas_merge_strategy: MergeStrategy,
    pub parameters_merge_strategy: MergeStrategy,
    pub responses_merge_strategy: MergeStrategy,
    pub request_bodies_merge_strategy: MergeStrategy,
    pub tags_merge_strategy: MergeStrategy,
    pub webhooks_merge_strategy: MergeStrategy,
}

impl Default for MultiPartConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            discovery: DiscoveryMode::Auto,
            part_files: Vec::new(),
            paths_merge_strategy: MergeStrategy::ErrorOnDuplicate,
            schemas_merge_strategy: MergeStrategy::ErrorOnDuplicate,
            parameters_merge_strategy: MergeStrategy::MergeIfIdentical,
            responses_merge_strategy: MergeStrategy::MergeIfIdentical,
            request_bodies_merge_strategy: MergeStrategy::MergeIfIdentical,
            tags_merge_strategy: MergeStrategy::FirstWins,
            webhooks_merge_strategy: MergeStrategy::ErrorOnDuplicate,
        }
    }
}

/// Client shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMode {
    /// One typed client class per segment.
    #[default]
    TypedClient,
    /// One static request method per operation.
    EndpointPerOperation,
}

/// An on/off switch that can defer to what the host provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriState {
    Enabled,
    Disabled,
    #[default]
    Auto,
}

impl TriState {
    /// Resolve against what was detected in the host project.
    pub fn resolve(&self, detected: bool) -> bool {
        match self {
            TriState::Enabled => true,
            TriState::Disabled => false,
            TriState::Auto => detected,
        }
    }
}

/// Options read from a `restgen.*.json` marker file. Unknown keys are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerConfig {
    pub generate: bool,
    pub namespace: Option<String>,
    pub include_deprecated: bool,
    pub generate_partial_models: bool,
    pub handler_suffix: String,
    pub sub_folder_strategy: SubFolderStrategy,
    pub validate_specification_strategy: ValidationStrategy,
    pub multi_part_configuration: MultiPartConfiguration,
    pub generation_mode: GenerationMode,
    pub use_minimal_api_package: TriState,
    pub use_validation_filter: TriState,
    pub use_global_error_handler: TriState,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            generate: true,
            namespace: None,
            include_deprecated: false,
            generate_partial_models: false,
            handler_suffix: "Handler".to_string(),
            sub_folder_strategy: SubFolderStrategy::default(),
            validate_specification_strategy: ValidationStrategy::default(),
            multi_part_configuration: MultiPartConfiguration::default(),
            generation_mode: GenerationMode::default(),
            use_minimal_api_package: TriState::Auto,
            use_validation_filter: TriState::Auto,
            use_global_error_handler: TriState::Auto,
        }
    }
}

impl MarkerConfig {
    /// Parse marker JSON. An empty or whitespace-only marker means
    /// "all defaults".
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text)
    }

    pub fn handler_suffix(&self) -> &str {
        let trimmed = self.handler_suffix.trim();
        if trimmed.is_empty() { "Handler" } else { trimmed }
    }
}

/// Load a marker file from disk.
pub fn load_marker(path: &Path) -> Result<MarkerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    MarkerConfig::from_json(&content).map_err(|source| ConfigError::Marker {
        path: path.display().to_string(),
        source,
    })
}

/// Project-level configuration loaded from `.restgen.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Specification files or directories holding them.
    pub specs: Vec<String>,
    pub output: String,
    /// Root namespace for generated code. Defaults to the API title.
    pub project: Option<String>,
    /// Directory holding the `restgen.*.json` marker files.
    pub markers: String,
    /// Source tree scanned for existing handlers and validators.
    pub host: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            specs: vec!["openapi.yaml".to_string()],
            output: "Generated".to_string(),
            project: None,
            markers: ".".to_string(),
            host: None,
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".restgen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: ProjectConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Project {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# restgen configuration
specs:
  - openapi.yaml      # files or directories; Base_Part.yaml files are merged
output: Generated
# project: PetStore   # root namespace, defaults to the API title
markers: .            # directory holding restgen.server.json / restgen.handlers.json / restgen.client.json
# host: src           # source tree scanned for existing handlers and validators
"#
}

/// Default marker content written by `restgen init`.
pub fn default_marker_content() -> &'static str {
    r#"{
  "generate": true,
  "subFolderStrategy": "FirstPathSegment",
  "validateSpecificationStrategy": "Strict",
  "multiPartConfiguration": {
    "enabled": true,
    "discovery": "Auto"
  }
}
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_marker() {
        let config = MarkerConfig::default();
        assert!(config.generate);
        assert_eq!(config.handler_suffix(), "Handler");
        assert_eq!(config.validate_specification_strategy, ValidationStrategy::Strict);
        assert_eq!(
            config.multi_part_configuration.paths_merge_strategy,
            MergeStrategy::ErrorOnDuplicate
        );
        assert_eq!(
            config.multi_part_configuration.parameters_merge_strategy,
            MergeStrategy::MergeIfIdentical
        );
        assert_eq!(
            config.multi_part_configuration.tags_merge_strategy,
            MergeStrategy::FirstWins
        );
    }

    #[test]
    fn test_parse_marker_json() {
        let json = r#"{
            "generate": false,
            "namespace": "Acme.Api",
            "includeDeprecated": true,
            "handlerSuffix": "Service",
            "subFolderStrategy": "OpenApiTag",
            "validateSpecificationStrategy": "Standard",
            "multiPartConfiguration": {
                "discovery": "Explicit",
                "partFiles": ["Api_Pets.yaml"],
                "schemasMergeStrategy": "LastWins"
            },
            "generationMode": "EndpointPerOperation",
            "useMinimalApiPackage": "Enabled",
            "someFutureOption": 42
        }"#;
        let config = MarkerConfig::from_json(json).unwrap();
        assert!(!config.generate);
        assert_eq!(config.namespace.as_deref(), Some("Acme.Api"));
        assert!(config.include_deprecated);
        assert_eq!(config.handler_suffix(), "Service");
        assert_eq!(config.sub_folder_strategy, SubFolderStrategy::OpenApiTag);
        assert_eq!(config.validate_specification_strategy, ValidationStrategy::Standard);
        let mp = &config.multi_part_configuration;
        assert!(mp.enabled);
        assert_eq!(mp.discovery, DiscoveryMode::Explicit);
        assert_eq!(mp.part_files, vec!["Api_Pets.yaml"]);
        assert_eq!(mp.schemas_merge_strategy, MergeStrategy::LastWins);
        assert_eq!(mp.paths_merge_strategy, MergeStrategy::ErrorOnDuplicate);
        assert_eq!(config.generation_mode, GenerationMode::EndpointPerOperation);
        assert_eq!(config.use_minimal_api_package, TriState::Enabled);
        assert_eq!(config.use_validation_filter, TriState::Auto);
    }

    #[test]
    fn test_empty_marker_is_default() {
        assert_eq!(MarkerConfig::from_json("  \n").unwrap(), MarkerConfig::default());
        assert_eq!(MarkerConfig::from_json("{}").unwrap(), MarkerConfig::default());
    }

    #[test]
    fn test_malformed_marker() {
        assert!(MarkerConfig::from_json("{ generate: ").is_err());
    }

    #[test]
    fn test_target_from_marker() {
        assert_eq!(
            Target::from_marker_file("src/Api/restgen.server.json"),
            Some(Target::Server)
        );
        assert_eq!(
            Target::from_marker_file(r"src\Api\restgen.client.json"),
            Some(Target::Client)
        );
        assert_eq!(Target::from_marker_file("appsettings.json"), None);
    }

    #[test]
    fn test_tristate() {
        assert!(TriState::Enabled.resolve(false));
        assert!(!TriState::Disabled.resolve(true));
        assert!(TriState::Auto.resolve(true));
        assert!(!TriState::Auto.resolve(false));
    }

    #[test]
    fn test_parse_project_config() {
        let yaml = "specs: [api]\noutput: out\nproject: PetStore\n";
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.specs, vec!["api"]);
        assert_eq!(config.project.as_deref(), Some("PetStore"));
        assert_eq!(config.markers, ".");
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: ProjectConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config, ProjectConfig::default());
        let marker = MarkerConfig::from_json(default_marker_content()).unwrap();
        assert!(marker.generate);
    }
}
