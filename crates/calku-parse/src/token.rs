//! The CalKu token tree.
//!
//! Mirrors `formualizer_parse::tokenizer::Token` in spirit (every token
//! carries a `value`/span for error messages) but is a tagged tree rather
//! than a flat stream with a separate `TokenType`/`TokenSubType` pair —
//! CalKu's grouping/function delimiters are structural, not operand
//! subtypes, so the nesting is baked into the type instead of reconstructed
//! by a second pass over flags.

use std::fmt::{self, Display};

use calku_common::Value;

/// Whether a `Literal` token was written as a quoted string or a bare
/// (naked) lexeme. Quoted literals are never re-typed by the value parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralStyle {
    Quoted,
    Naked,
}

/// A node in the CalKu token tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    GroupStart {
        start: usize,
        end: usize,
    },
    GroupEnd {
        start: usize,
        end: usize,
    },
    FuncArgsStart {
        start: usize,
        end: usize,
    },
    FuncArgsEnd {
        start: usize,
        end: usize,
    },
    FuncArgsSeparator {
        start: usize,
        end: usize,
    },
    /// A parenthesised sub-expression, post-processed from a matched
    /// GroupStart/GroupEnd pair.
    Group {
        start: usize,
        end: usize,
        children: Vec<Token>,
    },
    /// A function call; `children` are the comma-separated argument
    /// expressions (each is effectively a `Group` for evaluation purposes).
    Func {
        start: usize,
        end: usize,
        name: String,
        children: Vec<Token>,
    },
    /// Reference into the operator catalog (`calku_eval::operators`).
    Operator {
        start: usize,
        end: usize,
        op_key: String,
    },
    /// A scalar literal, already promoted to a typed `Value` by the value
    /// parser.
    Literal {
        start: usize,
        end: usize,
        value: Value,
        style: LiteralStyle,
    },
    /// A dot/colon-notated property path, e.g. `{a.b:0}`.
    PropertyRef {
        start: usize,
        end: usize,
        path: String,
    },
    /// A `//` line comment. Kept in the tree, ignored by the evaluator.
    Comment {
        start: usize,
        end: usize,
        text: String,
    },
}

impl Token {
    pub fn start(&self) -> usize {
        match self {
            Token::GroupStart { start, .. }
            | Token::GroupEnd { start, .. }
            | Token::FuncArgsStart { start, .. }
            | Token::FuncArgsEnd { start, .. }
            | Token::FuncArgsSeparator { start, .. }
            | Token::Group { start, .. }
            | Token::Func { start, .. }
            | Token::Operator { start, .. }
            | Token::Literal { start, .. }
            | Token::PropertyRef { start, .. }
            | Token::Comment { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Token::GroupStart { end, .. }
            | Token::GroupEnd { end, .. }
            | Token::FuncArgsStart { end, .. }
            | Token::FuncArgsEnd { end, .. }
            | Token::FuncArgsSeparator { end, .. }
            | Token::Group { end, .. }
            | Token::Func { end, .. }
            | Token::Operator { end, .. }
            | Token::Literal { end, .. }
            | Token::PropertyRef { end, .. }
            | Token::Comment { end, .. } => *end,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment { .. })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Token::FuncArgsSeparator { .. })
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::GroupStart { .. } => write!(f, "("),
            Token::GroupEnd { .. } => write!(f, ")"),
            Token::FuncArgsStart { .. } => write!(f, "("),
            Token::FuncArgsEnd { .. } => write!(f, ")"),
            Token::FuncArgsSeparator { .. } => write!(f, ","),
            Token::Group { children, .. } => {
                write!(f, "(")?;
                for c in children {
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
            Token::Func { name, children, .. } => {
                write!(f, "{name}(")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
            Token::Operator { op_key, .. } => write!(f, "<op {op_key}>"),
            Token::Literal { value, .. } => write!(f, "{value}"),
            Token::PropertyRef { path, .. } => write!(f, "{{{path}}}"),
            Token::Comment { text, .. } => write!(f, "//{text}"),
        }
    }
}
