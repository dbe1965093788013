use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Bronze table is missing expected column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
