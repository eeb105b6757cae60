use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised by the ingest → view → chart → insight pipeline.
///
/// The session controller is the boundary that turns these into status
/// messages; only the one-shot `report` command lets them reach `main`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Bad bytes, missing `timestamp` column, or an unparseable date.
    #[error("{0}")]
    Ingest(String),
    /// A non-numeric cell hit while formatting a view or projecting a chart.
    #[error("{0}")]
    Format(String),
    #[error("No stock data available for analysis.")]
    NoData,
    /// Network, serialization or service failure during an insight request.
    #[error("{0}")]
    Analysis(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Ingest(_) => 2,
            PipelineError::Format(_) | PipelineError::NoData => 3,
            PipelineError::Analysis(_) => 4,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
