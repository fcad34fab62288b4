//! Error types for SnipCSS.
//!
//! Only [`SnipError`] ever reaches a caller. The others are recovered inside
//! the used-CSS collector: an unreadable sheet is skipped, a selector that
//! fails to match is a non-match, and an enumeration failure becomes a
//! placeholder comment.

use std::io;
use thiserror::Error;

/// Why a stylesheet's rules cannot be read.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The sheet lives on another origin and its rules are not readable.
    #[error("cross-origin stylesheet {href} is not readable")]
    CrossOrigin { href: String },

    #[error("failed to read stylesheet {href}: {source}")]
    Io {
        href: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse stylesheet {href}: {message}")]
    Parse { href: String, message: String },
}

/// A selector the matcher cannot evaluate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected {found:?} at offset {offset} in selector")]
    Unexpected { found: char, offset: usize },

    #[error("unterminated {0} in selector")]
    Unterminated(&'static str),

    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
}

/// The stylesheet list itself could not be produced.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct EnumerationError(pub String);

/// Errors surfaced by the snippet API.
#[derive(Error, Debug)]
pub enum SnipError {
    #[error("no element matches {0:?}")]
    NoMatch(String),

    #[error("document has no elements")]
    EmptyDocument,

    #[error(transparent)]
    Selector(#[from] SelectorError),
}
