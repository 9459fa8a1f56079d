use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("required files not found in {folder} (missing: {missing})")]
    MissingInputs { folder: PathBuf, missing: String },

    #[error("invalid Excel file: {path} ({details})")]
    InvalidExcel { path: PathBuf, details: String },

    #[error("sheet \"{name}\" not found (available: {available})")]
    SheetNotFound { name: String, available: String },

    #[error("none of the mapped columns were found in the sheet header")]
    NoMappedColumns,

    #[error("no valid mapped data found in {0}")]
    NoSourceRows(PathBuf),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::FileNotFound(_) => 1,
            Error::MissingInputs { .. } => 1,
            Error::InvalidExcel { .. } => 2,
            Error::UnsupportedFormat(_) => 2,
            Error::Config { .. } => 2,
            Error::SheetNotFound { .. } => 3,
            Error::NoMappedColumns => 3,
            Error::NoSourceRows(_) => 3,
            Error::Csv(_) => 4,
            Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
