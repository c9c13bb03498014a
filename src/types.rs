use std::fmt; // For custom display formatting

/// A vtscript value. The same type is used for the parsed program and for
/// the results of evaluating it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    None,
    Bool(bool),
    Number(f64),
    Symbol(String),
    List(Vec<Expression>),
}

impl Expression {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expression::Symbol(name.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Expression::None => "none",
            Expression::Bool(_) => "boolean",
            Expression::Number(_) => "number",
            Expression::Symbol(_) => "symbol",
            Expression::List(_) => "list",
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expression::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::None => write!(f, "None"),
            Expression::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Symbol(s) => write!(f, "{}", s),
            Expression::List(children) => {
                write!(f, "(")?;
                let mut first = true;
                for child in children {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}
