use crate::types::Expression;
use std::collections::HashMap;
use std::f64::consts::PI;
use thiserror::Error;

// --- Environment Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("unbound symbol '{0}'")]
    UnboundVariable(String),
}

// --- Environment Definition ---

/// The single global namespace of an interpreter session. There is no
/// scoping: `set` on an existing name replaces its binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Expression>,
}

impl Environment {
    /// Creates the global environment with the built-in constants bound.
    pub fn new() -> Self {
        let mut env = Environment::empty();
        env.set("pi", Expression::Number(PI));
        env
    }

    /// Creates an environment with no bindings at all.
    pub fn empty() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Result<Expression, EnvError> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::UnboundVariable(name.to_string()))
    }

    pub fn set(&mut self, name: impl Into<String>, value: Expression) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Gets all identifiers currently bound
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_binds_pi() {
        let env = Environment::new();
        assert_eq!(env.get("pi"), Ok(Expression::Number(PI)));
        assert!(Environment::empty().get("pi").is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut env = Environment::empty();
        env.set("x", Expression::Number(10.0));
        assert_eq!(env.get("x"), Ok(Expression::Number(10.0)));
        assert!(env.contains("x"));
    }

    #[test]
    fn test_get_unbound() {
        let env = Environment::new();
        let result = env.get("y");
        assert!(matches!(result, Err(EnvError::UnboundVariable(s)) if s == "y"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut env = Environment::new();
        env.set("x", Expression::Bool(true));
        env.set("x", Expression::symbol("y-value"));
        assert_eq!(env.get("x"), Ok(Expression::symbol("y-value")));
    }

    #[test]
    fn test_get_returns_a_copy() {
        let mut env = Environment::empty();
        env.set("l", Expression::List(vec![Expression::None]));
        let mut copy = env.get("l").unwrap();
        if let Expression::List(children) = &mut copy {
            children.push(Expression::Bool(false));
        }
        assert_eq!(env.get("l"), Ok(Expression::List(vec![Expression::None])));
    }

    #[test]
    fn test_identifiers() {
        let mut env = Environment::new();
        env.set("answer", Expression::Number(42.0));
        let mut ids: Vec<&str> = env.identifiers().collect();
        ids.sort();
        assert_eq!(ids, vec!["answer", "pi"]);
    }
}
