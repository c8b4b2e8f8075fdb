//! Precedence-climbing expression parser, fed tokens by `ExpressionLexer`.
//!
//! Precedence (lowest to highest): or -> and -> not (prefix) -> comparisons
//! -> additive -> multiplicative -> unary minus -> postfix (`.name`, `(args)`)
//! -> primary.

use crate::ast::{BinaryOp, CompareOp, Expr, ListItem, Literal, UnaryOp};
use crate::error::{DslError, SourceLocation};
use crate::lexer::{ExpressionLexer, Token, TokenKind};

pub struct ExpressionParser<'a> {
    tokens: Vec<Token>,
    index: usize,
    line: usize,
    source_line: &'a str,
    base_column: usize,
}

impl<'a> ExpressionParser<'a> {
    pub fn parse_str(text: &'a str, line: usize, source_line: &'a str, base_column: usize) -> Result<Expr, DslError> {
        let tokens = ExpressionLexer::new(text, base_column, line, source_line).tokenize()?;
        let mut parser = ExpressionParser {
            tokens,
            index: 0,
            line,
            source_line,
            base_column,
        };
        parser.parse()
    }

    fn parse(&mut self) -> Result<Expr, DslError> {
        let expr = self.parse_or()?;
        let token = self.current();
        if token.kind != TokenKind::Eof {
            return Err(self.error(format!("Unexpected token '{}'", display_token(token)), token));
        }
        Ok(expr)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn peek(&self, n: usize) -> &Token {
        let idx = self.index + n;
        if idx >= self.tokens.len() {
            self.tokens.last().unwrap()
        } else {
            &self.tokens[idx]
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        tok
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.current().kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, DslError> {
        if self.current().kind != kind {
            let tok = self.current().clone();
            return Err(self.error(message, &tok));
        }
        Ok(self.advance())
    }

    fn error(&self, message: impl Into<String>, token: &Token) -> DslError {
        DslError::syntax(message, self.line, self.base_column + token.column, self.source_line)
    }

    fn loc(&self, token: &Token) -> SourceLocation {
        SourceLocation::new(self.line, self.base_column + token.column)
    }

    fn parse_or(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_and()?;
        while let Some(token) = self.matches(&[TokenKind::Or]) {
            let loc = self.loc(&token);
            let right = self.parse_and()?;
            expr = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                loc,
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_not()?;
        while let Some(token) = self.matches(&[TokenKind::And]) {
            let loc = self.loc(&token);
            let right = self.parse_not()?;
            expr = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                loc,
            };
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, DslError> {
        if let Some(token) = self.matches(&[TokenKind::Not]) {
            let loc = self.loc(&token);
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                loc,
            });
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_add()?;
        loop {
            let Some(token) = self.matches(&[
                TokenKind::EqEq,
                TokenKind::Neq,
                TokenKind::Lt,
                TokenKind::Lte,
                TokenKind::Gt,
                TokenKind::Gte,
            ]) else {
                break;
            };
            let op = match token.kind {
                TokenKind::EqEq => CompareOp::Eq,
                TokenKind::Neq => CompareOp::Neq,
                TokenKind::Lt => CompareOp::Lt,
                TokenKind::Lte => CompareOp::Lte,
                TokenKind::Gt => CompareOp::Gt,
                TokenKind::Gte => CompareOp::Gte,
                _ => unreachable!(),
            };
            let loc = self.loc(&token);
            let right = self.parse_add()?;
            expr = Expr::Compare {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                loc,
            };
        }
        Ok(expr)
    }

    fn parse_add(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_mul()?;
        loop {
            let Some(token) = self.matches(&[TokenKind::Plus, TokenKind::Minus]) else {
                break;
            };
            let op = if token.kind == TokenKind::Plus { BinaryOp::Add } else { BinaryOp::Sub };
            let loc = self.loc(&token);
            let right = self.parse_mul()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                loc,
            };
        }
        Ok(expr)
    }

    fn parse_mul(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_unary()?;
        loop {
            let Some(token) = self.matches(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent]) else {
                break;
            };
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => unreachable!(),
            };
            let loc = self.loc(&token);
            let right = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                loc,
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, DslError> {
        if let Some(token) = self.matches(&[TokenKind::Minus]) {
            let loc = self.loc(&token);
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                loc,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, DslError> {
        let mut expr = self.parse_primary()?;
        loop {
            if let Some(token) = self.matches(&[TokenKind::Dot]) {
                let name_token = self.expect(TokenKind::Name, "Expected attribute name after '.'")?;
                let loc = self.loc(&token);
                expr = Expr::Attr {
                    obj: Box::new(expr),
                    name: name_token.value,
                    loc,
                };
                continue;
            }
            if self.current().kind == TokenKind::LParen {
                expr = self.parse_call(expr)?;
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, DslError> {
        let lparen = self.expect(TokenKind::LParen, "Expected '('")?;
        let loc = self.loc(&lparen);
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        let mut seen_keyword = false;
        if self.current().kind != TokenKind::RParen {
            loop {
                if self.current().kind == TokenKind::Name && self.peek(1).kind == TokenKind::Eq {
                    seen_keyword = true;
                    let key_token = self.advance();
                    self.advance(); // '='
                    let value = self.parse_or()?;
                    if kwargs.iter().any(|(existing, _)| existing == &key_token.value) {
                        return Err(self.error(
                            format!("Duplicate keyword argument '{}'", key_token.value),
                            &key_token,
                        ));
                    }
                    kwargs.push((key_token.value, value));
                } else {
                    if seen_keyword {
                        let tok = self.current().clone();
                        return Err(self.error("Positional arguments cannot follow keyword arguments", &tok));
                    }
                    args.push(self.parse_or()?);
                }

                if self.matches(&[TokenKind::Comma]).is_some() {
                    if self.current().kind == TokenKind::RParen {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "Expected ')' to close function call")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            kwargs,
            loc,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, DslError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: i64 = token
                    .value
                    .parse()
                    .map_err(|_| self.error("Invalid integer literal", &token))?;
                Ok(Expr::Literal {
                    value: Literal::Int(value),
                    loc: self.loc(&token),
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Str(token.value.clone()),
                    loc: self.loc(&token),
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(true),
                    loc: self.loc(&token),
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(false),
                    loc: self.loc(&token),
                })
            }
            TokenKind::Name => {
                self.advance();
                Ok(Expr::Name {
                    id: token.value.clone(),
                    loc: self.loc(&token),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBrack => self.parse_list(),
            _ => Err(self.error("Expected expression", &token)),
        }
    }

    fn parse_list(&mut self) -> Result<Expr, DslError> {
        let lbrack = self.expect(TokenKind::LBrack, "Expected '['")?;
        let loc = self.loc(&lbrack);
        let mut items = Vec::new();
        if self.current().kind != TokenKind::RBrack {
            loop {
                let item = self.parse_or()?;
                if let Some(colon) = self.matches(&[TokenKind::Colon]) {
                    let range_loc = self.loc(&colon);
                    let end = self.parse_or()?;
                    items.push(ListItem::Range {
                        start: item,
                        end,
                        loc: range_loc,
                    });
                } else {
                    items.push(ListItem::Item(item));
                }

                if self.matches(&[TokenKind::Comma]).is_some() {
                    if self.current().kind == TokenKind::RBrack {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RBrack, "Expected ']' to close list")?;
        Ok(Expr::List { items, loc })
    }
}

fn display_token(token: &Token) -> String {
    if token.value.is_empty() {
        format!("{:?}", token.kind)
    } else {
        token.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Expr {
        ExpressionParser::parse_str(text, 1, text, 1).unwrap()
    }

    #[test]
    fn parses_list_with_range() {
        let expr = parse("[1, 5:8, 15]");
        match expr {
            Expr::List { items, .. } => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn stray_colon_outside_list_is_error() {
        assert!(ExpressionParser::parse_str("1:2", 1, "1:2", 1).is_err());
    }

    #[test]
    fn duplicate_keyword_arg_is_error() {
        assert!(ExpressionParser::parse_str("f(a=1, a=2)", 1, "f(a=1, a=2)", 1).is_err());
    }

    #[test]
    fn positional_after_keyword_is_error() {
        assert!(ExpressionParser::parse_str("f(a=1, 2)", 1, "f(a=1, 2)", 1).is_err());
    }
}
