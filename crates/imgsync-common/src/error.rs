//! Unified error types for the imgsync workspace.
//!
//! Every library crate returns [`ImgsyncError`] through the [`Result`] alias;
//! the CLI wraps it in `anyhow` at the top level.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ImgsyncError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path (or program name) where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A background resolution task panicked or was cancelled.
    #[error("background task failed: {message}")]
    Task {
        /// Join error description.
        message: String,
    },

    /// A source reference could not be classified.
    #[error("malformed image reference: {reference}")]
    MalformedReference {
        /// The offending reference.
        reference: String,
    },

    /// A tag filter pattern failed to compile.
    #[error("invalid tag pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// Pattern as configured.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// A semantic-version range expression could not be parsed.
    #[error("invalid version range {range:?}: {message}")]
    InvalidRange {
        /// Range as configured.
        range: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The tag-listing collaborator reported a failure.
    #[error("failed to list tags of {image}: {diagnostic}")]
    TagListingFailed {
        /// Repository that was queried.
        image: String,
        /// Raw diagnostic text from the collaborator.
        diagnostic: String,
    },

    /// Resolution produced no source images for a configured key.
    #[error("image {image} not found")]
    ImageNotFound {
        /// Configuration key that resolved to nothing.
        image: String,
    },

    /// A credential template could not be tokenized.
    #[error("template error at position {position}: {kind}")]
    Lex {
        /// What went wrong.
        kind: LexErrorKind,
        /// Character offset of the offending character.
        position: usize,
    },

    /// Copying one pair failed.
    #[error("sync {source_image} to {destination} failed: {diagnostic}")]
    CopyFailed {
        /// Normalized source reference.
        source_image: String,
        /// Normalized destination reference.
        destination: String,
        /// Diagnostic output of the copy tool.
        diagnostic: String,
    },

    /// Registry login was rejected.
    #[error("login to {registry} failed: {diagnostic}")]
    LoginFailed {
        /// Registry host.
        registry: String,
        /// Diagnostic output of the login tool.
        diagnostic: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A YAML document did not match the expected shape.
    #[error("invalid YAML in {path}: {message}")]
    Yaml {
        /// File the document was read from.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Failure categories of the template lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Strict mode: a second opening bracket differs from the first.
    BracketMismatch {
        /// Opener established by the first bracket.
        expected: char,
        /// Opener actually found.
        found: char,
    },
    /// Fewer closing brackets than opening brackets follow the identifier.
    Unterminated {
        /// Character found where a closer was required, `None` at end of input.
        found: Option<char>,
    },
    /// Strict mode: a closing bracket does not pair with the opener.
    ClosingMismatch {
        /// Closer paired with the opener.
        expected: char,
        /// Closer actually found.
        found: char,
    },
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BracketMismatch { expected, found } => {
                write!(f, "invalid bracket, expected opener {expected} found {found}")
            }
            Self::Unterminated { found: Some(c) } => {
                write!(f, "sentence not valid, unterminated reference (found {c})")
            }
            Self::Unterminated { found: None } => {
                write!(f, "sentence not valid, unterminated reference (end of input)")
            }
            Self::ClosingMismatch { expected, found } => {
                write!(
                    f,
                    "invalid corresponding bracket, expected {expected} found {found}"
                )
            }
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ImgsyncError>;
