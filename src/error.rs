use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpendError {
    #[error("Could not read the file: {0}")]
    Parse(String),

    #[error("CSV must contain 'Date', 'Category', and 'Amount' columns (missing: {})", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("No data found for selected filters")]
    EmptyResult,

    #[error("Cannot average an empty selection")]
    DivideByZero,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SpendError>;
