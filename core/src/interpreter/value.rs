use super::scope::Env;
use crate::ast::{BinaryOperator, FunctionLiteral, Param};
use crate::error::RuntimeError;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
    Function(Function),
}

/// A function value: the shared literal plus the scope it closed over.
#[derive(Clone)]
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub env: Env,
}

impl Function {
    pub fn new(literal: Rc<FunctionLiteral>, env: Env) -> Self {
        Self { literal, env }
    }

    pub fn name(&self) -> &str {
        self.literal
            .name
            .as_ref()
            .map(|ident| ident.name.as_str())
            .unwrap_or("<anonymous>")
    }

    pub fn params(&self) -> &[Param] {
        &self.literal.params
    }
}

// The captured scope usually contains this function, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("signature", &self.literal.signature())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.literal, &other.literal) && Rc::ptr_eq(&self.env, &other.env)
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Null => "null",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Function(_) => true,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn negate(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Integer(i) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| RuntimeError::IntegerOverflow("-".to_string())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(RuntimeError::UnsupportedPrefix {
                operator: "-".to_string(),
                operand: other.type_name().to_string(),
            }),
        }
    }

    /// Applies a binary operator to two evaluated operands.
    ///
    /// `&&` and `||` reach here only when both sides were already evaluated;
    /// the evaluator short-circuits them itself.
    pub fn binary_op(&self, op: BinaryOperator, rhs: &Value) -> Result<Value, RuntimeError> {
        let span = tracing::trace_span!(
            "binary_op",
            op = %op,
            lhs = %self.type_name(),
            rhs = %rhs.type_name()
        );
        let _enter = span.enter();

        match op {
            BinaryOperator::And => return Ok(Value::Boolean(self.is_truthy() && rhs.is_truthy())),
            BinaryOperator::Or => return Ok(Value::Boolean(self.is_truthy() || rhs.is_truthy())),
            BinaryOperator::EqualEqual => return Ok(Value::Boolean(self.loosely_equals(rhs))),
            BinaryOperator::NotEqual => return Ok(Value::Boolean(!self.loosely_equals(rhs))),
            _ => {}
        }

        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => integer_op(op, *a, *b),
            (Value::String(a), Value::String(b)) if is_relational(op) => {
                Ok(Value::Boolean(compare(op, a, b)))
            }
            (Value::String(_), _) | (_, Value::String(_)) if op == BinaryOperator::Add => {
                Ok(Value::String(format!("{}{}", self, rhs)))
            }
            _ => match (self.as_float(), rhs.as_float()) {
                (Some(a), Some(b)) => float_op(op, a, b),
                _ => Err(self.unsupported(op, rhs)),
            },
        }
    }

    /// Equality with cross-kind pairs compared by their rendered form.
    fn loosely_equals(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            _ if self.is_numeric() && rhs.is_numeric() => self.as_float() == rhs.as_float(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => self.to_string() == rhs.to_string(),
        }
    }

    fn unsupported(&self, op: BinaryOperator, rhs: &Value) -> RuntimeError {
        RuntimeError::UnsupportedOperands {
            operator: op.to_string(),
            left: self.type_name().to_string(),
            right: rhs.type_name().to_string(),
        }
    }
}

fn is_relational(op: BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEq
            | BinaryOperator::GreaterEq
    )
}

fn compare<T: PartialOrd + ?Sized>(op: BinaryOperator, a: &T, b: &T) -> bool {
    match op {
        BinaryOperator::Less => a < b,
        BinaryOperator::Greater => a > b,
        BinaryOperator::LessEq => a <= b,
        BinaryOperator::GreaterEq => a >= b,
        _ => false,
    }
}

fn integer_op(op: BinaryOperator, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::IntegerOverflow(op.to_string());
    let result = match op {
        BinaryOperator::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOperator::Subtract => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOperator::Multiply => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOperator::Divide => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.checked_div(b).ok_or_else(overflow)?
        }
        BinaryOperator::Modulo => {
            if b == 0 {
                return Err(RuntimeError::ModuloByZero);
            }
            a.checked_rem(b).ok_or_else(overflow)?
        }
        op if is_relational(op) => return Ok(Value::Boolean(compare(op, &a, &b))),
        _ => {
            return Err(Value::Integer(a).unsupported(op, &Value::Integer(b)));
        }
    };
    Ok(Value::Integer(result))
}

fn float_op(op: BinaryOperator, a: f64, b: f64) -> Result<Value, RuntimeError> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a / b
        }
        BinaryOperator::Modulo => {
            if b == 0.0 {
                return Err(RuntimeError::ModuloByZero);
            }
            a % b
        }
        op if is_relational(op) => return Ok(Value::Boolean(compare(op, &a, &b))),
        _ => return Err(Value::Float(a).unsupported(op, &Value::Float(b))),
    };
    Ok(Value::Float(result))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
            Value::Function(func) => {
                let params = func
                    .params()
                    .iter()
                    .map(|p| p.name.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn {}({}) {{ ... }}", func.name(), params)
            }
        }
    }
}
