//! Parse error records.

use common::SourceLoc;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The grammar could not match; the location is the furthest position
    /// any branch reached before failing.
    Syntax,
    /// The grammar matched but input remained, and no branch failed past
    /// the matched prefix.
    InvalidEof,
}

/// A parse error with its source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub begin: SourceLoc,
    pub end: SourceLoc,
}

impl ParseError {
    pub fn new(kind: ErrorKind, begin: SourceLoc, end: SourceLoc) -> Self {
        Self { kind, begin, end }
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::InvalidEof => "expected end of input",
        }
    }
}
