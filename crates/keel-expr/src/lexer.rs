//! Tokenizer for the expression language.

use keel_core::ConfigValue;

use crate::error::{ExprResult, ExpressionError};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// String, number, boolean or null literal.
    Literal(ConfigValue),
    Ident(String),
    Dot,
    Comma,
    Colon,
    Question,
    Pipe,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

/// A token and the byte offset it starts at.
pub(crate) type Spanned = (usize, Token);

/// Splits `source` into tokens.
pub(crate) fn tokenize(source: &str) -> ExprResult<Vec<Spanned>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let two = bytes.get(pos + 1).copied();
        let token = match (c, two) {
            (b'=', Some(b'=')) => {
                pos += 2;
                Token::EqEq
            }
            (b'!', Some(b'=')) => {
                pos += 2;
                Token::NotEq
            }
            (b'<', Some(b'=')) => {
                pos += 2;
                Token::Le
            }
            (b'>', Some(b'=')) => {
                pos += 2;
                Token::Ge
            }
            (b'&', Some(b'&')) => {
                pos += 2;
                Token::AndAnd
            }
            (b'|', Some(b'|')) => {
                pos += 2;
                Token::OrOr
            }
            (b'\'' | b'"', _) => {
                let (text, next) = read_string(source, pos)?;
                pos = next;
                Token::Literal(ConfigValue::String(text))
            }
            (b'0'..=b'9', _) => {
                let (value, next) = read_number(source, pos)?;
                pos = next;
                Token::Literal(value)
            }
            (c, _) if is_ident_start(c) => {
                while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                    pos += 1;
                }
                match &source[start..pos] {
                    "true" => Token::Literal(ConfigValue::Bool(true)),
                    "false" => Token::Literal(ConfigValue::Bool(false)),
                    "null" => Token::Literal(ConfigValue::Null),
                    ident => Token::Ident(ident.to_string()),
                }
            }
            _ => {
                pos += 1;
                match c {
                    b'.' => Token::Dot,
                    b',' => Token::Comma,
                    b':' => Token::Colon,
                    b'?' => Token::Question,
                    b'|' => Token::Pipe,
                    b'(' => Token::LParen,
                    b')' => Token::RParen,
                    b'[' => Token::LBracket,
                    b']' => Token::RBracket,
                    b'+' => Token::Plus,
                    b'-' => Token::Minus,
                    b'*' => Token::Star,
                    b'/' => Token::Slash,
                    b'%' => Token::Percent,
                    b'!' => Token::Bang,
                    b'<' => Token::Lt,
                    b'>' => Token::Gt,
                    _ => {
                        let ch = source[start..].chars().next().unwrap_or('?');
                        return Err(ExpressionError::syntax(
                            source,
                            start,
                            format!("unexpected character `{ch}`"),
                        ));
                    }
                }
            }
        };
        tokens.push((start, token));
    }

    Ok(tokens)
}

const fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

const fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn read_string(source: &str, start: usize) -> ExprResult<(String, usize)> {
    let mut chars = source[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(ExpressionError::syntax(source, start, "expected string"));
    };
    let mut out = String::new();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            }
            ch if ch == quote => return Ok((out, start + offset + ch.len_utf8())),
            ch => out.push(ch),
        }
    }
    Err(ExpressionError::syntax(
        source,
        start,
        "unterminated string literal",
    ))
}

fn read_number(source: &str, start: usize) -> ExprResult<(ConfigValue, usize)> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut is_float = false;
    if pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit() {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }

    let text = &source[start..pos];
    let value = if is_float {
        text.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(ConfigValue::Number)
    } else {
        text.parse::<i64>().ok().map(ConfigValue::from)
    };
    value
        .map(|v| (v, pos))
        .ok_or_else(|| ExpressionError::syntax(source, start, format!("invalid number `{text}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(_, t)| t)
            .collect()
    }

    #[test]
    fn test_path_and_pipe() {
        assert_eq!(
            kinds("server.port | default(80)"),
            vec![
                Token::Ident("server".into()),
                Token::Dot,
                Token::Ident("port".into()),
                Token::Pipe,
                Token::Ident("default".into()),
                Token::LParen,
                Token::Literal(json!(80)),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("a == b || c != d && e >= 1"),
            vec![
                Token::Ident("a".into()),
                Token::EqEq,
                Token::Ident("b".into()),
                Token::OrOr,
                Token::Ident("c".into()),
                Token::NotEq,
                Token::Ident("d".into()),
                Token::AndAnd,
                Token::Ident("e".into()),
                Token::Ge,
                Token::Literal(json!(1)),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b""#),
            vec![
                Token::Literal(json!("it's")),
                Token::Literal(json!("a\"b")),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5"),
            vec![Token::Literal(json!(1)), Token::Literal(json!(2.5))]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("  a+b").unwrap();
        assert_eq!(tokens[0].0, 2);
        assert_eq!(tokens[1].0, 3);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("'abc"),
            Err(ExpressionError::Syntax { .. })
        ));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a # b").unwrap_err();
        assert!(err.to_string().contains('#'));
    }
}
