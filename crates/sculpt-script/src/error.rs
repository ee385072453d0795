//! Error types for script parsing

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the script crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a parse
#[derive(Error, Debug)]
pub enum Error {
    /// A statement could not be compiled
    #[error("Parse error at line {line}:\n    {text}\nwhy?\n    {kind}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// The offending line as read, without its line terminator
        text: String,
        kind: ParseErrorKind,
    },

    /// The input held only blank lines and comments
    #[error("Script contains no statements")]
    Empty,

    /// A script file could not be opened or read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The line source failed mid-stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// What went wrong, for parse errors.
    pub fn kind(&self) -> Option<&ParseErrorKind> {
        match self {
            Error::Parse { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Line of the failing statement, for parse errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// The cause of a [`Error::Parse`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// No `=`, `+=` or `-=` after the node name
    #[error("Expected '=', '+=' or '-=' after the node name.")]
    MissingOperator,

    /// A mutation appeared before any assignment
    #[error("First edit must be an assignment.")]
    FirstEditNotAssignment,

    /// The name was never bound
    #[error("Cannot find node named \"{0}\".")]
    UnknownName(String),

    /// The name was bound once but has been used as an operand since
    #[error("Cannot modify node \"{0}\" because it was already consumed.")]
    ConsumedName(String),

    /// A primitive keyword was used as a node name
    #[error("\"{0}\" is a primitive and cannot be used as a node name.")]
    ReservedName(String),

    /// A shape keyword that is not `sphere` or `cube`
    #[error("Unknown primitive \"{0}\". Expected sphere or cube.")]
    UnknownPrimitive(String),

    /// Nothing follows the operator
    #[error("Expected primitive or node name after the operator.")]
    MissingOperand,

    /// `a += a`
    #[error("Node \"{0}\" cannot be combined with itself.")]
    SelfReference(String),

    /// A token in number position is not a finite number
    #[error("Expected a number. Found: \"{0}\".")]
    InvalidNumber(String),

    /// A primitive call ended early
    #[error("Primitive \"{primitive}\" takes {expected} numbers, found {found}.")]
    MissingParameters {
        primitive: &'static str,
        expected: usize,
        found: usize,
    },

    /// A `"` without its closing partner
    #[error("Unterminated quoted string.")]
    UnterminatedString,

    /// Tokens left over after a complete statement
    #[error("Unexpected input after statement: \"{0}\".")]
    TrailingInput(String),
}
