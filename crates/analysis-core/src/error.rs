use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient history: need {required} bars, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Fundamentals unavailable: {0}")]
    FundamentalsUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Data source error: {0}")]
    DataSource(String),
}

impl AnalysisError {
    /// True for errors that exclude a symbol from every strategy rather than just one.
    pub fn excludes_symbol(&self) -> bool {
        matches!(
            self,
            AnalysisError::InsufficientHistory { .. } | AnalysisError::InvalidData(_)
        )
    }
}
