//! Scalar expression trees used for dynamic keyframe values and controller parameters.
//!
//! Trees are validated when they are built (function arity, function names), so evaluating
//! a tree never fails. Variables are shared handles: rebinding a variable is visible to
//! every tree that references it.

mod function;
mod parser;
mod variable;

pub use function::*;
pub use variable::*;

use std::fmt;
use std::sync::Arc;

use crate::Error;

const EQUALITY_EPSILON: f64 = 1.0e-5;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::And => "&&",
            Self::Or => "||",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Mod => a % b,
            Self::Pow => a.powf(b),
            Self::And => bool_value(a != 0.0 && b != 0.0),
            Self::Or => bool_value(a != 0.0 || b != 0.0),
            Self::Less => bool_value(a < b),
            Self::LessEqual => bool_value(a <= b),
            Self::Greater => bool_value(a > b),
            Self::GreaterEqual => bool_value(a >= b),
            Self::Equal => bool_value((a - b).abs() < EQUALITY_EPSILON),
            Self::NotEqual => bool_value((a - b).abs() >= EQUALITY_EPSILON),
        }
    }
}

fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[derive(Clone, Debug)]
pub enum Expression {
    Constant(f64),
    Variable(Arc<Variable>),
    Ternary {
        condition: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
    Function(Function),
    Binary {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    pub fn variable(variable: Arc<Variable>) -> Self {
        Self::Variable(variable)
    }

    pub fn ternary(condition: Expression, if_true: Expression, if_false: Expression) -> Self {
        Self::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn binary(op: Operator, left: Expression, right: Expression) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Builds a call to a registered function, validating the name and argument count.
    pub fn function(
        registry: &FunctionRegistry,
        name: &str,
        args: Vec<Expression>,
    ) -> Result<Self, Error> {
        registry.build(name, args).map(Self::Function)
    }

    /// Parses molang-style source text, e.g. `query.is_moving ? math.sin(query.anim_time * 90) : 0`.
    ///
    /// Unknown variables are created in `scope` with a value of zero.
    pub fn parse(
        source: &str,
        scope: &mut VariableScope,
        registry: &FunctionRegistry,
    ) -> Result<Self, Error> {
        parser::parse(source, scope, registry)
    }

    pub fn evaluate(&self) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Variable(variable) => variable.get(),
            Self::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                if condition.evaluate() != 0.0 {
                    if_true.evaluate()
                } else {
                    if_false.evaluate()
                }
            }
            Self::Function(function) => function.evaluate(),
            Self::Binary { op, left, right } => {
                let a = left.evaluate();
                // Logical operators never evaluate the right side when the left decides.
                match op {
                    Operator::And if a == 0.0 => 0.0,
                    Operator::Or if a != 0.0 => 1.0,
                    _ => op.apply(a, right.evaluate()),
                }
            }
            Self::Negate(inner) => -inner.evaluate(),
            Self::Not(inner) => bool_value(inner.evaluate() == 0.0),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Variable(variable) => f.write_str(variable.name()),
            Self::Ternary {
                condition,
                if_true,
                if_false,
            } => write!(f, "{condition} ? {if_true} : {if_false}"),
            Self::Function(function) => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in function.args().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Negate(inner) => write!(f, "-{inner}"),
            Self::Not(inner) => write!(f, "!{inner}"),
        }
    }
}


#[cfg(test)]
mod parser_tests;
