use thiserror::Error;

/// Why a document text could not become an `OpenApiSpec`.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("OpenAPI {0} is not supported")]
    UnsupportedVersion(String),

    #[error("expected a mapping at the document root")]
    NotAMapping,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse marker {path}: {source}")]
    Marker {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Project {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Failure of a single generation unit. The pipeline converts these into
/// diagnostics so sibling units still run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("rendering failed: {0}")]
    Template(String),

    #[error("'{0}' does not resolve to a definition")]
    UnknownSchema(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("invalid state file {path}: {source}")]
    State {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
