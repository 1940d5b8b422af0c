//! Errors raised while reading a properties source

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("Failed to read properties file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Properties file {path} is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error("Malformed \\uxxxx encoding at line {line}")]
    MalformedEscape { line: usize },
}
