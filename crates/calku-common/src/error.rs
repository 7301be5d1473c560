//! Error kinds shared by the lexer, value parser, and evaluator.
//!
//! - **Syntax** — the lexer (or a property path) rejected the source text.
//! - **Evaluation** — an operator/function application failed at runtime.
//! - **Definition** — a catalog entry (operator/function spec) is malformed;
//!   this is a programmer error and always propagates (never caught).

use std::error::Error;
use std::fmt;

/// The three error kinds CalKu distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum CalkuErrorKind {
    Syntax,
    Evaluation,
    Definition,
}

impl fmt::Display for CalkuErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "SyntaxError",
            Self::Evaluation => "EvaluationError",
            Self::Definition => "DefinitionError",
        })
    }
}

/// A CalKu error. Lexer errors additionally carry the offending source index.
#[derive(Debug, Clone, PartialEq)]
pub struct CalkuError {
    pub kind: CalkuErrorKind,
    pub message: String,
    pub index: Option<usize>,
}

impl CalkuError {
    pub fn syntax<S: Into<String>>(message: S) -> Self {
        Self {
            kind: CalkuErrorKind::Syntax,
            message: message.into(),
            index: None,
        }
    }

    pub fn syntax_at<S: Into<String>>(message: S, index: usize) -> Self {
        Self {
            kind: CalkuErrorKind::Syntax,
            message: message.into(),
            index: Some(index),
        }
    }

    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        Self {
            kind: CalkuErrorKind::Evaluation,
            message: message.into(),
            index: None,
        }
    }

    /// A malformed catalog entry (unknown operator/function key reaching a
    /// dispatch site, a structural token escaping tree-building, ...).
    /// Definition errors are programmer errors, never user input, so they
    /// must not be representable as an ordinary `Result::Err` a caller could
    /// catch and return as a value — this panics immediately instead of
    /// constructing a value to propagate.
    pub fn definition_bug<S: Into<String>>(message: S) -> ! {
        let err = Self {
            kind: CalkuErrorKind::Definition,
            message: message.into(),
            index: None,
        };
        panic!("{err}");
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for CalkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(idx) = self.index {
            write!(f, " (at index {idx})")?;
        }
        Ok(())
    }
}

impl Error for CalkuError {}
