//! Splitting strings into literal text and `${ ... }` expressions.

use crate::error::{ExprResult, ExpressionError};
use crate::parser::{parse as parse_expression, Expr};

/// Marker that opens an embedded expression.
pub const OPEN: &str = "${";

/// A piece of a template string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Part {
    Literal(String),
    Expr(Expr),
}

/// Returns whether `text` contains an embedded expression.
///
/// # Example
///
/// ```
/// use keel_expr::has_expression;
///
/// assert!(has_expression("http://${host}:${port}"));
/// assert!(!has_expression("plain"));
/// ```
#[must_use]
pub fn has_expression(text: &str) -> bool {
    text.contains(OPEN)
}

/// Parses `text` into literal and expression parts.
pub(crate) fn parse(text: &str) -> ExprResult<Vec<Part>> {
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            parts.push(Part::Literal(rest[..start].to_string()));
        }
        let body = &rest[start + OPEN.len()..];
        let end = find_close(body).ok_or_else(|| ExpressionError::unterminated(text))?;
        parts.push(Part::Expr(parse_expression(&body[..end])?));
        rest = &body[end + 1..];
    }

    if !rest.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    Ok(parts)
}

/// Finds the `}` closing an expression body, skipping quoted text.
fn find_close(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for (index, ch) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(index),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            parse("hello").unwrap(),
            vec![Part::Literal("hello".into())]
        );
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_single_expression() {
        let parts = parse("${ port }").unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(parts[0], Part::Expr(Expr::Identifier(ref n)) if n == "port"));
    }

    #[test]
    fn test_mixed() {
        let parts = parse("http://${host}:${port}/").unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], Part::Literal("http://".into()));
        assert_eq!(parts[2], Part::Literal(":".into()));
        assert_eq!(parts[4], Part::Literal("/".into()));
    }

    #[test]
    fn test_brace_inside_string() {
        let parts = parse("${ '}' + a }").unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(
            parse("x ${ a"),
            Err(ExpressionError::UnterminatedTemplate { .. })
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert!(matches!(parse("${}"), Err(ExpressionError::Syntax { .. })));
    }
}
