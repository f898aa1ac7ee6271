use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by the stats, scoring and comparison engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("upstream profile source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("only {resolved} of {requested} profiles could be resolved; at least 2 are required")]
    InsufficientProfiles { resolved: usize, requested: usize },
}

impl EngineError {
    /// HTTP status an API boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::ProfileNotFound(_) => 404,
            EngineError::UpstreamUnavailable(_) => 502,
            EngineError::InsufficientProfiles { .. } => 400,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::UpstreamUnavailable(err.to_string())
    }
}
