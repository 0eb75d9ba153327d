//
//  error.rs
//  Archlint
//
//  Created by hak (tharun)
//

use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by the archlint library.
#[derive(Debug, Error)]
pub enum ArchlintError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported source language: {}", .0.display())]
    UnsupportedLanguage(PathBuf),

    #[error("failed to initialize parser for {}: {}", .0.display(), .1)]
    ParserInit(PathBuf, String),

    #[error("failed to parse {}", .0.display())]
    ParseFailed(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("file discovery failed: {0}")]
    Discovery(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArchlintError>;
