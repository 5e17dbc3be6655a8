use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("unsupported file format `{extension}`: expected .xlsx, .xlsm, .xls, .ods or .csv")]
    UnsupportedFormat { extension: String },

    #[error("sheet `{sheet}` not found in {}", path.display())]
    MissingSheet { sheet: String, path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("expected {expected} columns, found {found}")]
    ColumnLayout { expected: usize, found: usize },

    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
