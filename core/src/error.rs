use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurifierError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid sample: {field} = {value} is outside [{min}, {max}]")]
    InvalidSample {
        field: &'static str,
        value: f64,
        min:   f64,
        max:   f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed history export at line {line}: {reason}")]
    MalformedExport { line: usize, reason: String },

    #[error("Prerequisites incomplete: {missing} not available yet")]
    MissingPrerequisiteState { missing: String },

    #[error("Optional feature '{feature}' is not available in this build")]
    OptionalDependencyUnavailable { feature: &'static str },

    #[error("Chart '{chart}' could not be rasterized: {reason}")]
    ChartRasterization { chart: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PurifierError {
    /// Advisory errors are recovered locally: the requested feature does
    /// not proceed, everything else in the session stays usable.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::MissingPrerequisiteState { .. } | Self::OptionalDependencyUnavailable { .. }
        )
    }
}

pub type SimResult<T> = Result<T, PurifierError>;
