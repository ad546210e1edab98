use restgen_core::error::GenerateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsharpError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("alias chain through '{0}' does not end in a concrete type")]
    AliasCycle(String),
}

impl From<CsharpError> for GenerateError {
    fn from(err: CsharpError) -> Self {
        match err {
            CsharpError::Template(e) => GenerateError::Template(e.to_string()),
            other => GenerateError::Other(other.to_string()),
        }
    }
}
