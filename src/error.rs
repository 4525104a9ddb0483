use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::block::BlockId;

/// Errors raised by the compiler, the tree operations and the JSON boundary.
///
/// The parser never produces these; see [`Diagnostic`] for what it reports.
#[derive(Error, Debug)]
pub enum Error {
    #[error("conditional '{id}' is marked elif but its else branch is not exactly one conditional")]
    MalformedElif { id: BlockId },

    #[error("conditional '{id}' has no else clause but carries else statements")]
    StrayElseBody { id: BlockId },

    #[error("block id '{0}' appears more than once in the tree")]
    DuplicateId(BlockId),

    #[error("no block with id '{0}'")]
    BlockNotFound(String),

    #[error("block '{0}' has no body to append to")]
    NotAContainer(BlockId),

    #[error("block '{0}' is not a conditional")]
    NotAConditional(BlockId),

    #[error("the elif branch of '{0}' already holds its conditional")]
    ElifBranchOccupied(BlockId),

    #[error("unknown block kind '{0}'")]
    UnknownBlockKind(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal finding from the parser, tied to a source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 0-based line number
    pub line: usize,
    /// Machine-readable code: `unrecognized-statement` or `malformed-header`.
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn unrecognized(line: usize, text: &str) -> Self {
        Diagnostic {
            line,
            code: "unrecognized-statement",
            message: format!("skipped unrecognized statement `{}`", text),
        }
    }

    pub fn malformed_header(line: usize, keyword: &str, text: &str) -> Self {
        Diagnostic {
            line,
            code: "malformed-header",
            message: format!(
                "could not read `{}` header `{}`, using defaults",
                keyword, text
            ),
        }
    }
}

impl Diagnostic {
    /// The diagnostic with the offending line of `source` and a caret
    /// underline beneath its text.
    pub fn render(&self, source: &str) -> String {
        let line_text = source.lines().nth(self.line).unwrap_or("");
        let start_col = line_text.chars().take_while(|c| c.is_whitespace()).count();
        let width = line_text.trim().chars().count().max(1);
        format!(
            "WARNING AT LINE {}:\n{}\n{}^{}\n{}",
            self.line + 1,
            line_text,
            " ".repeat(start_col),
            "_".repeat(width - 1),
            self
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.line + 1, self.message, self.code)
    }
}
