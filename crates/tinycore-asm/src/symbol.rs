//! The symbol table: an ordered mapping from name to either an already-known
//! integer or a deferred [`Expression`], resolved by fix-point iteration.

use crate::error::{AsmError, Result};
use crate::expr::Expression;
use std::collections::HashMap;

/// Ordered mapping from symbol name to its (possibly still unresolved)
/// definition. Symbols are added by `.def` and by labels during pass 1, then
/// resolved to integers before word emission.
#[derive(Debug, Default)]
pub struct SymbolTable {
    order: Vec<String>,
    defs: HashMap<String, Expression>,
    resolved: HashMap<String, i64>,
}

impl SymbolTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `expr`. The expression need not yet be resolvable.
    pub fn define(&mut self, name: &str, expr: Expression) -> Result<()> {
        if self.defs.contains_key(name) {
            return Err(AsmError::DuplicateSymbol(name.to_string()));
        }
        self.order.push(name.to_string());
        self.defs.insert(name.to_string(), expr);
        Ok(())
    }

    /// The resolved value of `name`, if resolution has already reached it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.resolved.get(name).copied()
    }

    /// Repeat until no table entry changes: attempt to evaluate every
    /// not-yet-resolved symbol against the resolved set so far; a pass that
    /// makes no progress with unresolved symbols remaining is an error.
    pub fn resolve_all(&mut self) -> Result<()> {
        loop {
            let mut progressed = false;
            for name in &self.order {
                if self.resolved.contains_key(name) {
                    continue;
                }
                let expr = &self.defs[name];
                if let Ok(value) = expr.resolve(self) {
                    self.resolved.insert(name.clone(), value);
                    progressed = true;
                }
            }
            let remaining: Vec<String> = self
                .order
                .iter()
                .filter(|n| !self.resolved.contains_key(*n))
                .cloned()
                .collect();
            if remaining.is_empty() {
                log::debug!("symbol table fully resolved ({} symbols)", self.order.len());
                return Ok(());
            }
            if !progressed {
                return Err(AsmError::UnresolvedSymbol(remaining));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_reference_resolves_via_fixpoint() {
        let tokens_a = vec!["B".to_string(), "+".to_string(), "1".to_string()];
        let tokens_b = vec!["1".to_string(), "+".to_string(), "1".to_string()];
        let mut table = SymbolTable::new();
        table.define("A", Expression::new(&tokens_a)).unwrap();
        table.define("B", Expression::new(&tokens_b)).unwrap();
        table.resolve_all().unwrap();
        assert_eq!(table.lookup("A"), Some(3));
        assert_eq!(table.lookup("B"), Some(2));
    }

    #[test]
    fn order_independence() {
        let tokens_a = vec!["B".to_string(), "+".to_string(), "1".to_string()];
        let tokens_b = vec!["1".to_string(), "+".to_string(), "1".to_string()];

        let mut forward = SymbolTable::new();
        forward.define("A", Expression::new(&tokens_a)).unwrap();
        forward.define("B", Expression::new(&tokens_b)).unwrap();
        forward.resolve_all().unwrap();

        let mut backward = SymbolTable::new();
        backward.define("B", Expression::new(&tokens_b)).unwrap();
        backward.define("A", Expression::new(&tokens_a)).unwrap();
        backward.resolve_all().unwrap();

        assert_eq!(forward.lookup("A"), backward.lookup("A"));
        assert_eq!(forward.lookup("B"), backward.lookup("B"));
    }

    #[test]
    fn genuinely_unresolvable_symbol_is_reported() {
        let tokens = vec!["NOPE".to_string()];
        let mut table = SymbolTable::new();
        table.define("A", Expression::new(&tokens)).unwrap();
        let err = table.resolve_all().unwrap_err();
        assert_eq!(err, AsmError::UnresolvedSymbol(vec!["A".to_string()]));
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let mut table = SymbolTable::new();
        table.define("A", Expression::constant(1)).unwrap();
        assert_eq!(
            table.define("A", Expression::constant(2)),
            Err(AsmError::DuplicateSymbol("A".to_string()))
        );
    }
}
