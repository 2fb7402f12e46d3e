//! Scanner for the wamon language.
//!
//! Source text is matched against a fixed set of patterns, longest spelling
//! first; identifiers are resolved against the keyword table afterwards.

mod token;

pub use token::*;

use std::{error::Error, fmt::Display};

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{} ({}:{})",
            self.message, self.line, self.col
        ))
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \r\n\t]+").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//[^\n]*").unwrap());
static DOUBLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)\.[0-9]*").unwrap());
static BYTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0X[0-9A-F]{2}").unwrap());
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)").unwrap());
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap());
static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"(\\.|[^"\\])*""#).unwrap());

/// Fixed spellings, longest first so that `->` wins over `-` and `==` over `=`.
static FIXED_TOKENS: Lazy<Vec<(&'static str, Token)>> = Lazy::new(|| {
    vec![
        ("->", Token::Arrow),
        ("::", Token::Scope),
        ("==", Token::Compare),
        ("&&", Token::And),
        ("||", Token::Or),
        ("<=", Token::Lte),
        (">=", Token::Gte),
        ("(", Token::LeftParen),
        (")", Token::RightParen),
        ("[", Token::LeftBracket),
        ("]", Token::RightBracket),
        ("{", Token::LeftBrace),
        ("}", Token::RightBrace),
        (";", Token::Semicolon),
        (":", Token::Colon),
        (".", Token::MemberAccess),
        (",", Token::Comma),
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Multiply),
        ("/", Token::Divide),
        ("!", Token::Not),
        ("=", Token::Assign),
        ("<", Token::Lt),
        (">", Token::Gt),
        ("&", Token::AddressOf),
    ]
});

#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan(&self, src: &str) -> LexResult<Vec<PositionedToken>> {
        let mut tokens = vec![];
        let mut rest = src;
        let mut line = 1usize;
        let mut col = 1usize;

        while !rest.is_empty() {
            if let Some(m) = WHITESPACE_RE.find(rest) {
                advance(&mut rest, &mut line, &mut col, m.end());
                continue;
            }
            if let Some(m) = COMMENT_RE.find(rest) {
                advance(&mut rest, &mut line, &mut col, m.end());
                continue;
            }

            let (start_line, start_col) = (line, col);
            let token = self.next_token(rest, start_line, start_col)?;
            advance(&mut rest, &mut line, &mut col, token.0);
            tokens.push(PositionedToken {
                token: token.1,
                line: start_line,
                col: start_col,
            });
        }

        tokens.push(PositionedToken {
            token: Token::Eof,
            line,
            col,
        });
        Ok(tokens)
    }

    fn next_token(&self, rest: &str, line: usize, col: usize) -> LexResult<(usize, Token)> {
        if let Some(m) = DOUBLE_RE.find(rest) {
            let value = m.as_str().parse::<f64>().map_err(|_| LexError {
                message: format!("failed to lex double literal '{}'", m.as_str()),
                line,
                col,
            })?;
            return Ok((m.end(), Token::DoubleLiteral(value)));
        }
        if let Some(m) = BYTE_RE.find(rest) {
            let value = u8::from_str_radix(&m.as_str()[2..], 16).map_err(|_| LexError {
                message: format!("failed to lex byte literal '{}'", m.as_str()),
                line,
                col,
            })?;
            return Ok((m.end(), Token::ByteLiteral(value)));
        }
        if let Some(m) = INT_RE.find(rest) {
            let value = m.as_str().parse::<i64>().map_err(|_| LexError {
                message: format!("failed to lex int literal '{}'", m.as_str()),
                line,
                col,
            })?;
            return Ok((m.end(), Token::IntLiteral(value)));
        }
        if let Some(m) = ID_RE.find(rest) {
            let id = m.as_str();
            let token = match KEY_WORDS.get(id) {
                Some(keyword) => keyword.clone(),
                None => Token::Id(id.to_string()),
            };
            return Ok((m.end(), token));
        }
        if let Some(m) = STRING_RE.find(rest) {
            let inner = &m.as_str()[1..m.as_str().len() - 1];
            let value = unescape::unescape(inner).ok_or_else(|| LexError {
                message: format!("invalid escape sequence in string literal '{inner}'"),
                line,
                col,
            })?;
            return Ok((m.end(), Token::StringLiteral(value)));
        }
        for (spelling, token) in FIXED_TOKENS.iter() {
            if rest.starts_with(spelling) {
                return Ok((spelling.len(), token.clone()));
            }
        }
        Err(LexError {
            message: format!(
                "failed to lex '{}'",
                rest.chars().take(8).collect::<String>()
            ),
            line,
            col,
        })
    }
}

fn advance(rest: &mut &str, line: &mut usize, col: &mut usize, len: usize) {
    for c in rest[..len].chars() {
        if c == '\n' {
            *line += 1;
            *col = 1;
        } else {
            *col += 1;
        }
    }
    *rest = &rest[len..];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(src: &str) -> Vec<Token> {
        Scanner::new()
            .scan(src)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_scan_let() {
        assert_eq!(
            tokens_of("let foo : int = (42);"),
            vec![
                Token::Let,
                Token::Id("foo".into()),
                Token::Colon,
                Token::Int,
                Token::Assign,
                Token::LeftParen,
                Token::IntLiteral(42),
                Token::RightParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_scan_operators() {
        assert_eq!(
            tokens_of("a == b && c <= -d"),
            vec![
                Token::Id("a".into()),
                Token::Compare,
                Token::Id("b".into()),
                Token::And,
                Token::Id("c".into()),
                Token::Lte,
                Token::Minus,
                Token::Id("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_scan_literals() {
        assert_eq!(
            tokens_of(r#"3.14 0XAB 17 "he\nllo" true"#),
            vec![
                Token::DoubleLiteral(3.14),
                Token::ByteLiteral(0xAB),
                Token::IntLiteral(17),
                Token::StringLiteral("he\nllo".into()),
                Token::True,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_scan_qualified_name() {
        assert_eq!(
            tokens_of("call wamon::my_func:(s)"),
            vec![
                Token::Call,
                Token::Id("wamon".into()),
                Token::Scope,
                Token::Id("my_func".into()),
                Token::Colon,
                Token::LeftParen,
                Token::Id("s".into()),
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_scan_comment_and_position() {
        let tokens = Scanner::new().scan("// comment\nlet a").unwrap();
        assert_eq!(tokens[0].token, Token::Let);
        assert_eq!((tokens[0].line, tokens[0].col), (2, 1));
        assert_eq!(tokens[1].token, Token::Id("a".into()));
        assert_eq!((tokens[1].line, tokens[1].col), (2, 5));
    }

    #[test]
    fn test_scan_error() {
        let result = Scanner::new().scan("let a = @;");
        assert!(result.is_err());
    }
}
