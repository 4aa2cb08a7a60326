//! Recursive-descent rule parser
//!
//! Grammar:
//!
//! ```text
//! expression := term ( (AND|OR) term )*
//! term       := '(' expression ')' | comparison
//! comparison := FIELD COMP_OP LITERAL
//! ```
//!
//! `AND` and `OR` share one precedence level and fold strictly left to
//! right: `a AND b OR c` is `(a AND b) OR c`.

use crate::error::ParseError;
use crate::rule::ast::{AstNode, Comparison, ComparisonOp, Literal, LogicalOp, MAX_DEPTH};
use crate::rule::token::{tokenize, Token};

/// Parse a rule string into an AST
pub fn parse_rule(rule: &str) -> Result<AstNode, ParseError> {
    let tokens = tokenize(rule)?;
    let mut parser = Parser::new(&tokens);
    let (ast, _) = parser.parse_expression()?;

    if let Some(rest) = parser.remaining() {
        return Err(ParseError::MalformedComparison(format!(
            "unexpected input after complete rule: '{}'",
            rest
        )));
    }

    Ok(ast)
}

/// Cursor over one token sequence; lives for a single parse call
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Open parentheses around the current position
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<&'a Token, ParseError> {
        let token = self.tokens.get(self.pos).ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    /// Unconsumed tokens rendered for an error message
    fn remaining(&self) -> Option<String> {
        let rest = &self.tokens[self.pos.min(self.tokens.len())..];
        if rest.is_empty() {
            return None;
        }
        Some(
            rest.iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    /// Returns the subtree together with its depth
    fn parse_expression(&mut self) -> Result<(AstNode, usize), ParseError> {
        let (mut node, mut depth) = self.parse_term()?;

        loop {
            let operator = match self.peek() {
                Some(Token::And) => LogicalOp::And,
                Some(Token::Or) => LogicalOp::Or,
                _ => break,
            };
            self.pos += 1;
            let (right, right_depth) = self.parse_term()?;

            depth = 1 + depth.max(right_depth);
            if depth > MAX_DEPTH {
                return Err(ParseError::NestingTooDeep(MAX_DEPTH));
            }
            node = AstNode::operator(operator, node, right);
        }

        Ok((node, depth))
    }

    fn parse_term(&mut self) -> Result<(AstNode, usize), ParseError> {
        if let Some(Token::OpenParen) = self.peek() {
            if self.nesting >= MAX_DEPTH {
                return Err(ParseError::NestingTooDeep(MAX_DEPTH));
            }
            self.pos += 1;
            self.nesting += 1;
            let parsed = self.parse_expression()?;
            self.nesting -= 1;

            return match self.peek() {
                Some(Token::CloseParen) => {
                    self.pos += 1;
                    Ok(parsed)
                }
                _ => Err(ParseError::MissingClosingParen),
            };
        }

        Ok((self.parse_comparison()?, 1))
    }

    fn parse_comparison(&mut self) -> Result<AstNode, ParseError> {
        let field = match self.advance()? {
            Token::Identifier(name) => name.clone(),
            other => {
                return Err(ParseError::MalformedComparison(format!(
                    "expected field name, found '{}'",
                    other
                )))
            }
        };

        let operator = match self.advance()? {
            Token::Operator(symbol) => ComparisonOp::from_symbol(symbol),
            other => {
                return Err(ParseError::MalformedComparison(format!(
                    "expected comparison operator after '{}', found '{}'",
                    field, other
                )))
            }
        };

        let value = match self.advance()? {
            Token::Number(n) => Literal::Number(*n),
            Token::Str(text) | Token::Identifier(text) => Literal::coerce(text),
            other => {
                return Err(ParseError::MalformedComparison(format!(
                    "expected value after '{} {}', found '{}'",
                    field,
                    operator.symbol(),
                    other
                )))
            }
        };

        Ok(AstNode::Operand(Comparison {
            field,
            operator,
            value,
        }))
    }
}
