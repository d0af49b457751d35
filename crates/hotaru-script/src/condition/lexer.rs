//! Lexer for condition expressions.

use std::fmt;

use logos::Logos;
use thiserror::Error;

/// A lex or parse error with its source span.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConditionError {
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
}

/// Token type for condition expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal.
    Int(i64),
    /// Affinity flag reference, name only (`f.yurina` lexes as `yurina`).
    Flag(String),
    /// `true` literal.
    True,
    /// `false` literal.
    False,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `>=`
    GreaterEq,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{n}"),
            Token::Flag(name) => write!(f, "f.{name}"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::GreaterEq => write!(f, ">="),
            Token::LessEq => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::Less => write!(f, "<"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Internal logos token, converted to an owned `Token` after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"f\.[a-zA-Z0-9_]+")]
    Flag,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("!=")]
    NotEq,

    #[token("!")]
    Bang,

    #[token("==")]
    EqEq,

    #[token(">=")]
    GreaterEq,

    #[token("<=")]
    LessEq,

    #[token(">")]
    Greater,

    #[token("<")]
    Less,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

/// Lex a condition source into `(Token, Span)` pairs.
///
/// Conditions are single expressions, so the first bad character aborts
/// the lex; there is nothing useful to recover into.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, ConditionError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(raw) => {
                let token = match raw {
                    RawToken::Int => {
                        let slice = lexer.slice();
                        match slice.parse::<i64>() {
                            Ok(n) => Token::Int(n),
                            Err(_) => {
                                return Err(ConditionError {
                                    span,
                                    message: format!("integer literal out of range: {slice}"),
                                });
                            }
                        }
                    }
                    RawToken::Flag => Token::Flag(lexer.slice()[2..].to_string()),
                    RawToken::True => Token::True,
                    RawToken::False => Token::False,
                    RawToken::AndAnd => Token::AndAnd,
                    RawToken::OrOr => Token::OrOr,
                    RawToken::NotEq => Token::NotEq,
                    RawToken::Bang => Token::Bang,
                    RawToken::EqEq => Token::EqEq,
                    RawToken::GreaterEq => Token::GreaterEq,
                    RawToken::LessEq => Token::LessEq,
                    RawToken::Greater => Token::Greater,
                    RawToken::Less => Token::Less,
                    RawToken::Plus => Token::Plus,
                    RawToken::Minus => Token::Minus,
                    RawToken::Star => Token::Star,
                    RawToken::Slash => Token::Slash,
                    RawToken::Percent => Token::Percent,
                    RawToken::LParen => Token::LParen,
                    RawToken::RParen => Token::RParen,
                };
                tokens.push((token, span));
            }
            Err(()) => {
                return Err(ConditionError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span]),
                });
            }
        }
    }

    Ok(tokens)
}
