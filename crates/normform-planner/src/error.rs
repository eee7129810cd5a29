use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("document parse: {0}")]
    Parse(String),

    #[error("invalid document: {0}")]
    Invalid(String),

    #[error(transparent)]
    Core(#[from] normform_core::error::Error),
}

impl From<serde_yaml::Error> for PlanError {
    fn from(e: serde_yaml::Error) -> Self {
        PlanError::Parse(e.to_string())
    }
}
