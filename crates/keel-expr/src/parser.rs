//! Recursive-descent parser for the expression language.
//!
//! Precedence, lowest first:
//!
//! ```text
//! c ? a : b
//! ||
//! &&
//! ==  !=
//! <  <=  >  >=
//! +  -
//! *  /  %
//! !x  -x
//! a.b  a[b]  a | transform(args)
//! ```
//!
//! Nesting (parentheses, arrays, prefix operators and operator chains) is
//! limited to [`MAX_NESTING`] levels so hostile input fails with
//! [`ExpressionError::DepthExceeded`] rather than exhausting the stack.

use keel_core::ConfigValue;

use crate::error::{ExprResult, ExpressionError};
use crate::lexer::{tokenize, Spanned, Token};

/// Deepest syntax tree the parser builds.
pub const MAX_NESTING: usize = 128;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(ConfigValue),
    Array(Vec<Expr>),
    Identifier(String),
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Transform {
        name: String,
        input: Box<Expr>,
        args: Vec<Expr>,
    },
}

/// Parses a complete expression.
pub(crate) fn parse(source: &str) -> ExprResult<Expr> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::syntax(source, 0, "empty expression"));
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.conditional()?;
    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(ExpressionError::syntax(
            source,
            *offset,
            format!("unexpected token {token:?}"),
        ));
    }
    Ok(expr)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(offset, _)| *offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> ExprResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::syntax(self.source, self.offset(), message)
    }

    /// Goes one level deeper. Callers restore `depth` once their subtree is
    /// built.
    fn descend(&mut self) -> ExprResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(ExpressionError::DepthExceeded {
                max_depth: MAX_NESTING,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn conditional(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        self.descend()?;
        let test = self.binary(0)?;
        let expr = if self.eat(&Token::Question) {
            let consequent = self.conditional()?;
            self.expect(&Token::Colon, "`:` in conditional")?;
            let alternate = self.conditional()?;
            Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            }
        } else {
            test
        };
        self.depth = depth;
        Ok(expr)
    }

    /// Precedence climbing over the binary operator table.
    fn binary(&mut self, min_level: u8) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.unary()?;
        while let Some((op, level)) = self.peek().and_then(binary_op) {
            if level < min_level {
                break;
            }
            self.pos += 1;
            self.descend()?;
            let right = self.binary(level + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> ExprResult<Expr> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Some(Token::Dot | Token::LBracket | Token::Pipe)) {
                self.descend()?;
            }
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let property = match self.advance() {
                        Some(Token::Ident(name)) => ConfigValue::String(name),
                        Some(Token::Literal(ConfigValue::Number(n))) if n.is_u64() => {
                            ConfigValue::Number(n)
                        }
                        _ => {
                            self.pos -= 1;
                            return Err(self.error("expected property name after `.`"));
                        }
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::Literal(property)),
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let property = self.conditional()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                    };
                }
                Some(Token::Pipe) => {
                    self.pos += 1;
                    let Some(Token::Ident(name)) = self.advance() else {
                        return Err(self.error("expected transform name after `|`"));
                    };
                    let args = if self.eat(&Token::LParen) {
                        self.list(&Token::RParen, "`)`")?
                    } else {
                        Vec::new()
                    };
                    expr = Expr::Transform {
                        name,
                        input: Box::new(expr),
                        args,
                    };
                }
                _ => {
                    self.depth = depth;
                    return Ok(expr);
                }
            }
        }
    }

    fn primary(&mut self) -> ExprResult<Expr> {
        match self.advance() {
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(Token::Ident(name)) => Ok(Expr::Identifier(name)),
            Some(Token::LParen) => {
                let inner = self.conditional()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::LBracket) => Ok(Expr::Array(self.list(&Token::RBracket, "`]`")?)),
            Some(_) => {
                self.pos -= 1;
                Err(self.error("expected operand"))
            }
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn list(&mut self, close: &Token, what: &str) -> ExprResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.conditional()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma, &format!("`,` or {what}"))?;
        }
    }
}

const fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    Some(match token {
        Token::OrOr => (BinaryOp::Or, 0),
        Token::AndAnd => (BinaryOp::And, 1),
        Token::EqEq => (BinaryOp::Eq, 2),
        Token::NotEq => (BinaryOp::NotEq, 2),
        Token::Lt => (BinaryOp::Lt, 3),
        Token::Le => (BinaryOp::Le, 3),
        Token::Gt => (BinaryOp::Gt, 3),
        Token::Ge => (BinaryOp::Ge, 3),
        Token::Plus => (BinaryOp::Add, 4),
        Token::Minus => (BinaryOp::Sub, 4),
        Token::Star => (BinaryOp::Mul, 5),
        Token::Slash => (BinaryOp::Div, 5),
        Token::Percent => (BinaryOp::Rem, 5),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.to_string()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a + b * 2").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: Box::new(Expr::Literal(json!(2))),
                }),
            }
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse("10 - 4 - 3").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn test_member_chain() {
        let expr = parse("a.b['c'][0]").unwrap();
        let Expr::Member { object, property } = expr else {
            panic!("expected member");
        };
        assert_eq!(*property, Expr::Literal(json!(0)));
        assert!(matches!(*object, Expr::Member { .. }));
    }

    #[test]
    fn test_transform_binds_tighter_than_plus() {
        let expr = parse("'x' + name | upper").unwrap();
        let Expr::Binary { right, .. } = expr else {
            panic!("expected binary");
        };
        assert!(matches!(*right, Expr::Transform { ref name, .. } if name == "upper"));
    }

    #[test]
    fn test_transform_args() {
        let expr = parse("port | default(80, 'x')").unwrap();
        let Expr::Transform { args, .. } = expr else {
            panic!("expected transform");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_conditional_nests_right() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Conditional { alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*alternate, Expr::Conditional { .. }));
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(
            parse("[1, 'a']").unwrap(),
            Expr::Array(vec![Expr::Literal(json!(1)), Expr::Literal(json!("a"))])
        );
        assert_eq!(parse("[]").unwrap(), Expr::Array(vec![]));
    }

    #[test]
    fn test_nesting_limit() {
        let within = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse(&within).unwrap(), Expr::Literal(json!(1)));

        let limit = Err(ExpressionError::DepthExceeded {
            max_depth: MAX_NESTING,
        });
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&parens), limit);
        let arrays = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(parse(&arrays), limit);
        assert_eq!(parse(&format!("{}x", "!".repeat(10_000))), limit);
        assert_eq!(parse(&vec!["1"; 10_000].join(" + ")), limit);
        assert_eq!(parse(&format!("a{}", ".b".repeat(10_000))), limit);
    }

    #[test]
    fn test_long_flat_expressions_parse() {
        assert!(parse(&vec!["n"; 60].join(" + ")).is_ok());
        assert!(parse(&format!("a{}", ".b".repeat(60))).is_ok());
        assert!(parse(&format!("{}x", "!".repeat(60))).is_ok());
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("a +").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("a | 3").is_err());
        assert!(parse("a ? b").is_err());
        assert!(parse("a.").is_err());
    }
}
