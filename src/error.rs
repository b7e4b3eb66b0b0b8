use thiserror::Error;

#[derive(Error, Debug)]
pub enum PinebarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown sort order: {0}")]
    UnknownSort(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, PinebarError>;
