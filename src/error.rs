//! Error types shared across the crate.
//!
//! Messages of `DataError` are shown to readers of the site, so they are
//! written in Japanese like the rest of the rendered output.

use thiserror::Error;

/// Errors raised while reading a workbook from disk
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path} at line {line}: {reason}")]
    Csv {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unsupported workbook location: {0}")]
    Unsupported(String),
}

/// Errors raised while turning sheets into search data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("シート「{0}」が見つかりません。")]
    SheetNotFound(String),

    #[error("シート「{sheet}」に必要なヘッダー「{header}」がありません。")]
    MissingHeader { sheet: String, header: String },

    #[error("{0}")]
    Load(#[from] LoadError),
}

/// Errors raised by the cache codec
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to encode cache payload: {0}")]
    Encode(String),

    #[error("Failed to decode cache payload: {0}")]
    Decode(String),
}

/// Errors raised while building the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Errors raised by the remote client
#[cfg(feature = "web")]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Unexpected response body: {0}")]
    Body(String),
}
