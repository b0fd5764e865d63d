use std::time::Duration;

use thiserror::Error;

/// Failures that abort a whole report. Nothing is returned when one of these is raised.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Missing mandatory field: {0}")]
    MissingField(String),
    #[error("Invalid inspection record: {0}")]
    InvalidRecord(String),
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Failed to generate QR code: {0}")]
    QrError(String),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("Invalid date format: {0}")]
    DateError(String),
    #[error("Report generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Report generation worker failed: {0}")]
    WorkerError(String),
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single photo could not be used. Recovered by drawing a placeholder.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("photo data is empty")]
    Empty,
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to fetch photo: {0}")]
    Fetch(String),
}

/// Failures raised by external collaborators (blob store, record store, email).
#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode record: {0}")]
    Encoding(String),
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

impl From<serde_json::Error> for BoundaryError {
    fn from(e: serde_json::Error) -> Self {
        BoundaryError::Encoding(e.to_string())
    }
}
