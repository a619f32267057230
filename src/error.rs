use thiserror::Error;

#[derive(Debug, Error)]
pub enum CstError {
    /// Malformed parameter declaration.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-empty input without a single data block.
    #[error("No data: {0}")]
    NoData(String),

    #[error("Empty input: no frequency samples")]
    EmptyInput,

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CstError {
    /// True for errors caused by the structure of the input text.
    pub fn is_structural(&self) -> bool {
        matches!(self, CstError::Parse(_) | CstError::NoData(_))
    }
}

pub type Result<T> = std::result::Result<T, CstError>;
