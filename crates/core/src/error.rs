/// Result alias that carries the custom [`DesignerError`] type.
pub type Result<T> = std::result::Result<T, DesignerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    /// A tuner was asked for a prediction before all of its collaborators
    /// were wired in, or with an instrument or environment its calculator
    /// does not model. The payload names the offending collaborator.
    #[error("tuner has no matching {0}")]
    Configuration(&'static str),
    /// No resonance could be located for a fingering.
    #[error("no resonance found for fingering `{fingering}`: {reason}")]
    ConvergenceFailure { fingering: String, reason: String },
    /// The instrument geometry, or a fingering paired with it, is inconsistent.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// An intermediate acoustic quantity was not finite.
    #[error("numeric instability at {frequency} Hz: {detail}")]
    NumericInstability { frequency: f64, detail: &'static str },
    /// The ambient conditions describe air that cannot exist.
    #[error("invalid physical parameters: {0}")]
    InvalidParameters(String),
    /// A document parsed but does not follow the instrument or tuning schema.
    #[error("malformed document: {0}")]
    Document(String),
    #[error("{0}")]
    Xml(#[from] roxmltree::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DesignerError {
    pub fn geometry<T: Into<String>>(msg: T) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    pub fn document<T: Into<String>>(msg: T) -> Self {
        Self::Document(msg.into())
    }

    pub fn convergence<F: Into<String>, R: Into<String>>(fingering: F, reason: R) -> Self {
        Self::ConvergenceFailure {
            fingering: fingering.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures to locate a resonance.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailure { .. })
    }
}
