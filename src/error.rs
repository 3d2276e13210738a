use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid GEO series accession: {0}")]
    InvalidExpressionAccession(String),

    #[error("missing config file kira-geo.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("GEO request failed: {0}")]
    GeoHttp(String),

    #[error("GEO returned status {status}: {message}")]
    GeoStatus { status: u16, message: String },

    #[error("failed to decompress series matrix: {0}")]
    #[diagnostic(help("the file must be a gzip-compressed GEO series matrix"))]
    Decompression(String),

    #[error("malformed series matrix ({context}): {message}")]
    MalformedDirective { context: String, message: String },

    #[error("failed to write table: {0}")]
    TableWrite(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KiraError {
    pub fn malformed_at(line_no: usize, message: impl Into<String>) -> Self {
        KiraError::MalformedDirective {
            context: format!("line {line_no}"),
            message: message.into(),
        }
    }

    pub fn malformed_record(message: impl Into<String>) -> Self {
        KiraError::MalformedDirective {
            context: "end of input".to_string(),
            message: message.into(),
        }
    }

    pub fn is_retrieval(&self) -> bool {
        matches!(self, KiraError::GeoHttp(_) | KiraError::GeoStatus { .. })
    }
}
