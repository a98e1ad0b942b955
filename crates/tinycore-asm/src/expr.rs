//! A small recursive-descent evaluator for constant-expression token lists.
//!
//! Operators, loosest to tightest binding (the spec's "C-like precedence"):
//! `|`, `&`, binary `+ -`, `* /`, unary `- ~`, and `( )` grouping. Operands
//! are either integer literals (decimal, `0x…` hex, `0b…` binary, underscores
//! allowed as digit separators) or previously defined symbol names.

use crate::error::{AsmError, Result};
use crate::symbol::SymbolTable;

/// A deferred integer expression: a token list captured at parse time,
/// evaluated only once its symbols are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    tokens: Vec<String>,
}

impl Expression {
    /// Capture a token slice as an unevaluated expression.
    #[must_use]
    pub fn new(tokens: &[String]) -> Self {
        Self {
            tokens: tokens.to_vec(),
        }
    }

    /// An expression that is already a known integer constant.
    #[must_use]
    pub fn constant(value: i64) -> Self {
        Self {
            tokens: vec![value.to_string()],
        }
    }

    /// Evaluate against a symbol table. The table need not have every symbol
    /// resolved already; only symbols this expression actually references.
    pub fn resolve(&self, table: &SymbolTable) -> Result<i64> {
        let mut parser = Parser {
            tokens: &self.tokens,
            pos: 0,
            table,
        };
        let value = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(AsmError::Syntax(format!(
                "unexpected token '{}' in expression",
                parser.tokens[parser.pos]
            )));
        }
        Ok(value)
    }
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
    table: &'a SymbolTable,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn bump(&mut self) -> Option<&str> {
        let tok = self.tokens.get(self.pos).map(String::as_str);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // `|` — loosest.
    fn parse_or(&mut self) -> Result<i64> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some("|") {
            self.bump();
            lhs |= self.parse_and()?;
        }
        Ok(lhs)
    }

    // `&`.
    fn parse_and(&mut self) -> Result<i64> {
        let mut lhs = self.parse_additive()?;
        while self.peek() == Some("&") {
            self.bump();
            lhs &= self.parse_additive()?;
        }
        Ok(lhs)
    }

    // `+ -`.
    fn parse_additive(&mut self) -> Result<i64> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            match self.peek() {
                Some("+") => {
                    self.bump();
                    lhs += self.parse_multiplicative()?;
                }
                Some("-") => {
                    self.bump();
                    lhs -= self.parse_multiplicative()?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // `* /`.
    fn parse_multiplicative(&mut self) -> Result<i64> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some("*") => {
                    self.bump();
                    lhs *= self.parse_unary()?;
                }
                Some("/") => {
                    self.bump();
                    let rhs = self.parse_unary()?;
                    if rhs == 0 {
                        return Err(AsmError::Syntax("division by zero".to_string()));
                    }
                    lhs /= rhs;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // Unary `-` and `~`, tightest binding besides grouping.
    fn parse_unary(&mut self) -> Result<i64> {
        match self.peek() {
            Some("-") => {
                self.bump();
                Ok(-self.parse_unary()?)
            }
            Some("~") => {
                self.bump();
                Ok(!self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<i64> {
        match self.bump() {
            Some("(") => {
                let value = self.parse_or()?;
                match self.bump() {
                    Some(")") => Ok(value),
                    _ => Err(AsmError::Syntax("missing closing ')'".to_string())),
                }
            }
            Some(tok) => parse_operand(tok, self.table),
            None => Err(AsmError::Syntax("expression ended unexpectedly".to_string())),
        }
    }
}

fn parse_operand(tok: &str, table: &SymbolTable) -> Result<i64> {
    if let Some(value) = parse_literal(tok) {
        return Ok(value);
    }
    table
        .lookup(tok)
        .ok_or_else(|| AsmError::UnresolvedSymbol(vec![tok.to_string()]))
}

fn parse_literal(tok: &str) -> Option<i64> {
    let stripped = tok.replace('_', "");
    if let Some(hex) = stripped.strip_prefix("0x").or_else(|| stripped.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = stripped.strip_prefix("0b").or_else(|| stripped.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    stripped.parse::<i64>().ok()
}
