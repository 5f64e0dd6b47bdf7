use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file not found: {0}")]
    CsvNotFound(std::path::PathBuf),

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("column {0} has an unexpected type")]
    ColumnType(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
