use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("Required column '{0}' was not found in the sheet")]
    MissingColumn(String),

    #[error("Failed to parse workbook: {0}")]
    ParseFailure(String),

    #[error("Sheet '{0}' was not found in the workbook")]
    SheetNotFound(String),

    #[error("Workbook contains no sheets")]
    EmptyWorkbook,

    #[error("Invalid day count {0}: must be at least 1")]
    InvalidDayCount(usize),

    #[error("Failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<calamine::Error> for SplitterError {
    fn from(err: calamine::Error) -> Self {
        SplitterError::ParseFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SplitterError>;
