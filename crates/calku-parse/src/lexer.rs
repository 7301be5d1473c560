//! Single-pass lexer + tree builder.
//!
//! Grounded on `formualizer_parse::tokenizer::Tokenizer`'s shape (one open
//! token plus a grouping stack walked left to right) but CalKu's grammar is
//! simpler than Excel's — there is no array literal, no range operator, no
//! prefix/postfix operator distinction — so the state machine collapses to
//! a handful of absorb states.

use calku_common::{CalkuError, ResolvedTimeZone};

use crate::matcher::{FunctionMatcher, OperatorMatcher};
use crate::token::{LiteralStyle, Token};
use crate::value_parser;

/// What the lexer is currently absorbing characters into.
enum Open {
    PropertyRef { start: usize, buf: String },
    Comment { start: usize, buf: String },
    Literal { start: usize, buf: String, style: LiteralStyle },
}

/// Marks which bracket kind a stack frame was opened by, so `)` can be
/// disambiguated into `GroupEnd` vs `FuncArgsEnd`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Frame {
    Group,
    FuncArgs,
}

/// Flat, pre-tree token emitted by the first pass.
enum Flat {
    GroupStart { start: usize, end: usize },
    GroupEnd { start: usize, end: usize },
    FuncArgsStart { start: usize, end: usize },
    FuncArgsEnd { start: usize, end: usize },
    FuncArgsSeparator { start: usize, end: usize },
    FuncName { start: usize, end: usize, name: String },
    Operator { start: usize, end: usize, op_key: String },
    RawLiteral { start: usize, end: usize, text: String, style: LiteralStyle },
    PromotedLiteral { start: usize, end: usize, value: calku_common::Value, style: LiteralStyle },
    PropertyRef { start: usize, end: usize, path: String },
    Comment { start: usize, end: usize, text: String },
}

const LITERAL_ENDERS: &str = "()[]{}";

pub struct Lexer<'a> {
    chars: Vec<char>,
    operators: &'a dyn OperatorMatcher,
    functions: &'a dyn FunctionMatcher,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, operators: &'a dyn OperatorMatcher, functions: &'a dyn FunctionMatcher) -> Self {
        Self {
            chars: source.chars().collect(),
            operators,
            functions,
        }
    }

    /// Runs the full lexer: flat scan, literal promotion, then tree build.
    pub fn tokenize(&self, tz: &ResolvedTimeZone) -> Result<Vec<Token>, CalkuError> {
        let flat = self.scan()?;
        let promoted = promote_literals(flat, tz);
        build_tree(promoted)
    }

    fn scan(&self) -> Result<Vec<Flat>, CalkuError> {
        let chars = &self.chars;
        let len = chars.len();
        let mut out = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut open: Option<Open> = None;
        let mut pos = 0usize;

        while pos < len {
            let c = chars[pos];

            // State 1: PropertyRef absorbing.
            if let Some(Open::PropertyRef { start, buf }) = &mut open {
                if c == '\\' && pos + 1 < len && chars[pos + 1] == '}' {
                    buf.push('}');
                    pos += 2;
                    continue;
                }
                if c == '}' {
                    out.push(Flat::PropertyRef {
                        start: *start,
                        end: pos + 1,
                        path: buf.clone(),
                    });
                    open = None;
                    pos += 1;
                    continue;
                }
                buf.push(c);
                pos += 1;
                continue;
            }

            // State 2: Comment absorbing.
            if let Some(Open::Comment { start, buf }) = &mut open {
                if c == '\n' {
                    out.push(Flat::Comment {
                        start: *start,
                        end: pos,
                        text: buf.clone(),
                    });
                    open = None;
                    pos += 1;
                    continue;
                }
                buf.push(c);
                pos += 1;
                continue;
            }

            // State 3: Literal absorbing.
            if let Some(Open::Literal { start, buf, style }) = &mut open {
                if *style == LiteralStyle::Quoted && c == '\\' && pos + 1 < len && chars[pos + 1] == '"' {
                    buf.push('"');
                    pos += 2;
                    continue;
                }

                if *style == LiteralStyle::Naked {
                    if let Some(after_paren) = paren_after_spaces(chars, pos) {
                        let name = buf.clone();
                        if !self.functions.is_known(&name) {
                            return Err(CalkuError::syntax_at(
                                format!("unknown function '{name}'"),
                                *start,
                            ));
                        }
                        out.push(Flat::FuncName {
                            start: *start,
                            end: pos,
                            name,
                        });
                        out.push(Flat::FuncArgsStart {
                            start: pos,
                            end: after_paren,
                        });
                        stack.push(Frame::FuncArgs);
                        open = None;
                        pos = after_paren;
                        continue;
                    }

                    if c.is_whitespace() || LITERAL_ENDERS.contains(c) {
                        out.push(Flat::RawLiteral {
                            start: *start,
                            end: pos,
                            text: buf.clone(),
                            style: *style,
                        });
                        open = None;
                        continue; // reprocess current char
                    }

                    if c == ',' && stack.last() == Some(&Frame::FuncArgs) {
                        out.push(Flat::RawLiteral {
                            start: *start,
                            end: pos,
                            text: buf.clone(),
                            style: *style,
                        });
                        out.push(Flat::FuncArgsSeparator { start: pos, end: pos + 1 });
                        open = None;
                        pos += 1;
                        continue;
                    }
                } else if c == '"' {
                    out.push(Flat::RawLiteral {
                        start: *start,
                        end: pos + 1,
                        text: buf.clone(),
                        style: *style,
                    });
                    open = None;
                    pos += 1;
                    continue;
                }

                buf.push(c);
                pos += 1;
                continue;
            }

            // State 4: no open token.
            match c {
                '(' => {
                    out.push(Flat::GroupStart { start: pos, end: pos + 1 });
                    stack.push(Frame::Group);
                    pos += 1;
                }
                ')' => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| CalkuError::syntax_at("unmatched ')'", pos))?;
                    match frame {
                        Frame::Group => out.push(Flat::GroupEnd { start: pos, end: pos + 1 }),
                        Frame::FuncArgs => out.push(Flat::FuncArgsEnd { start: pos, end: pos + 1 }),
                    }
                    pos += 1;
                }
                '{' => {
                    open = Some(Open::PropertyRef {
                        start: pos,
                        buf: String::new(),
                    });
                    pos += 1;
                }
                ',' if stack.last() == Some(&Frame::FuncArgs) => {
                    out.push(Flat::FuncArgsSeparator { start: pos, end: pos + 1 });
                    pos += 1;
                }
                _ if c.is_whitespace() => {
                    pos += 1;
                }
                '/' if pos + 1 < len && chars[pos + 1] == '/' => {
                    open = Some(Open::Comment {
                        start: pos,
                        buf: String::new(),
                    });
                    pos += 2;
                }
                _ => {
                    if let Some((op_key, consumed)) = self.operators.match_at(chars, pos) {
                        out.push(Flat::Operator {
                            start: pos,
                            end: pos + consumed,
                            op_key,
                        });
                        pos += consumed;
                    } else if c == '"' {
                        open = Some(Open::Literal {
                            start: pos,
                            buf: String::new(),
                            style: LiteralStyle::Quoted,
                        });
                        pos += 1;
                    } else {
                        open = Some(Open::Literal {
                            start: pos,
                            buf: String::from(c),
                            style: LiteralStyle::Naked,
                        });
                        pos += 1;
                    }
                }
            }
        }

        match open {
            Some(Open::Literal { start, buf, style: LiteralStyle::Quoted }) => {
                let _ = buf;
                return Err(CalkuError::syntax_at("unterminated quoted literal", start));
            }
            Some(Open::PropertyRef { start, .. }) => {
                return Err(CalkuError::syntax_at("unterminated property reference", start));
            }
            Some(Open::Literal { start, buf, style: LiteralStyle::Naked }) => {
                out.push(Flat::RawLiteral {
                    start,
                    end: len,
                    text: buf,
                    style: LiteralStyle::Naked,
                });
            }
            Some(Open::Comment { start, buf }) => {
                let _ = buf;
                return Err(CalkuError::syntax_at("unterminated comment", start));
            }
            None => {}
        }

        if !stack.is_empty() {
            return Err(CalkuError::syntax("unclosed grouping at end of input"));
        }

        Ok(out)
    }
}

/// Looks ahead from `pos`, skipping only whitespace, for a `(`. Returns the
/// index just past that `(` if found, else `None` (any other character seen
/// first means this isn't a function-call name).
fn paren_after_spaces(chars: &[char], pos: usize) -> Option<usize> {
    let mut i = pos;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '(' {
        Some(i + 1)
    } else {
        None
    }
}

fn promote_literals(flat: Vec<Flat>, tz: &ResolvedTimeZone) -> Vec<Flat> {
    flat.into_iter()
        .map(|t| match t {
            Flat::RawLiteral { start, end, text, style } => {
                let value = value_parser::promote(&text, style, tz);
                Flat::PromotedLiteral { start, end, value, style }
            }
            other => other,
        })
        .collect()
}

/// Second pass: builds the nested `Token` tree from the flat stream.
fn build_tree(flat: Vec<Flat>) -> Result<Vec<Token>, CalkuError> {
    enum OpenFrame {
        Group { start: usize, children: Vec<Token> },
        Func { start: usize, name: String, children: Vec<Token> },
    }

    let mut stack: Vec<OpenFrame> = Vec::new();
    let mut root: Vec<Token> = Vec::new();
    let mut pending_name: Option<(usize, String)> = None;

    for t in flat {
        let tok: Option<Token> = match t {
            Flat::GroupStart { start, .. } => {
                stack.push(OpenFrame::Group { start, children: Vec::new() });
                None
            }
            Flat::GroupEnd { end, .. } => match stack.pop() {
                Some(OpenFrame::Group { start, children }) => Some(Token::Group { start, end, children }),
                _ => return Err(CalkuError::syntax_at("mismatched group close", end)),
            },
            Flat::FuncName { start, name, .. } => {
                // Stashed until the FuncArgsStart that always follows
                // immediately (the lexer emits them as a pair).
                pending_name = Some((start, name));
                None
            }
            Flat::FuncArgsStart { .. } => {
                let (start, name) = pending_name.take().expect("FuncArgsStart must follow FuncName");
                stack.push(OpenFrame::Func { start, name, children: Vec::new() });
                None
            }
            Flat::FuncArgsEnd { end, .. } => match stack.pop() {
                Some(OpenFrame::Func { start, name, children }) => {
                    Some(Token::Func { start, end, name, children })
                }
                _ => return Err(CalkuError::syntax_at("mismatched function-call close", end)),
            },
            Flat::FuncArgsSeparator { start, end } => Some(Token::FuncArgsSeparator { start, end }),
            Flat::Operator { start, end, op_key } => Some(Token::Operator { start, end, op_key }),
            Flat::PromotedLiteral { start, end, value, style } => {
                Some(Token::Literal { start, end, value, style })
            }
            Flat::PropertyRef { start, end, path } => Some(Token::PropertyRef { start, end, path }),
            Flat::Comment { start, end, text } => Some(Token::Comment { start, end, text }),
            Flat::RawLiteral { .. } => unreachable!("promoted before tree-building"),
        };

        if let Some(tok) = tok {
            match stack.last_mut() {
                Some(OpenFrame::Group { children, .. }) => children.push(tok),
                Some(OpenFrame::Func { children, .. }) => children.push(tok),
                None => root.push(tok),
            }
        }
    }

    if !stack.is_empty() {
        return Err(CalkuError::syntax("unclosed grouping while building token tree"));
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calku_common::CalkuErrorKind;

    struct StubOperators;

    impl OperatorMatcher for StubOperators {
        fn match_at(&self, chars: &[char], pos: usize) -> Option<(String, usize)> {
            const SYMBOLS: &[(&str, &str)] = &[("+", "ADDITION"), ("-", "SUBTRACTION"), ("&", "CONCATENATE")];
            for (sym, key) in SYMBOLS {
                let sym_chars: Vec<char> = sym.chars().collect();
                if chars[pos..].starts_with(&sym_chars[..]) {
                    let after = pos + sym_chars.len();
                    let boundary_ok = after >= chars.len() || chars[after].is_whitespace() || chars[after] == '(';
                    if boundary_ok {
                        return Some((key.to_string(), sym_chars.len()));
                    }
                }
            }
            None
        }
    }

    struct StubFunctions;

    impl FunctionMatcher for StubFunctions {
        fn is_known(&self, name: &str) -> bool {
            matches!(name.to_ascii_uppercase().as_str(), "SUM" | "IF" | "HELLOWORLD")
        }
    }

    fn lex(src: &str) -> Vec<Token> {
        let ops = StubOperators;
        let funcs = StubFunctions;
        Lexer::new(src, &ops, &funcs).tokenize(&ResolvedTimeZone::utc()).unwrap()
    }

    #[test]
    fn lexes_simple_addition() {
        let toks = lex("1 + 2");
        assert_eq!(toks.len(), 3);
        assert!(matches!(toks[0], Token::Literal { .. }));
        assert!(matches!(toks[1], Token::Operator { .. }));
        assert!(matches!(toks[2], Token::Literal { .. }));
    }

    #[test]
    fn lexes_function_call_with_args() {
        let toks = lex("SUM(1, 2, 3)");
        assert_eq!(toks.len(), 1);
        match &toks[0] {
            Token::Func { name, children, .. } => {
                assert_eq!(name, "SUM");
                let literal_count = children.iter().filter(|t| matches!(t, Token::Literal { .. })).count();
                assert_eq!(literal_count, 3);
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_name_is_a_syntax_error() {
        let ops = StubOperators;
        let funcs = StubFunctions;
        let err = Lexer::new("NOPE(1)", &ops, &funcs)
            .tokenize(&ResolvedTimeZone::utc())
            .unwrap_err();
        assert_eq!(err.kind, CalkuErrorKind::Syntax);
    }

    #[test]
    fn unmatched_close_paren_is_a_syntax_error() {
        let ops = StubOperators;
        let funcs = StubFunctions;
        assert!(Lexer::new(")", &ops, &funcs).tokenize(&ResolvedTimeZone::utc()).is_err());
    }

    #[test]
    fn parses_property_ref_and_comment() {
        let toks = lex("{a.b} // trailing note\n");
        assert!(matches!(toks[0], Token::PropertyRef { .. }));
        assert!(matches!(toks[1], Token::Comment { .. }));
    }

    #[test]
    fn comment_unterminated_at_eof_is_a_syntax_error() {
        let ops = StubOperators;
        let funcs = StubFunctions;
        let err = Lexer::new("{a.b} // trailing note", &ops, &funcs)
            .tokenize(&ResolvedTimeZone::utc())
            .unwrap_err();
        assert_eq!(err.kind, CalkuErrorKind::Syntax);
    }

    #[test]
    fn nested_group_builds_tree() {
        let toks = lex("(1 + 2)");
        assert_eq!(toks.len(), 1);
        match &toks[0] {
            Token::Group { children, .. } => assert_eq!(children.len(), 3),
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn quoted_literal_keeps_escaped_quote() {
        let toks = lex("\"a\\\"b\"");
        match &toks[0] {
            Token::Literal { value, .. } => {
                assert_eq!(value.to_string(), "a\"b");
            }
            other => panic!("expected Literal, got {other:?}"),
        }
    }
}
