//! Declaration-time type inference and call-time argument checking.
//!
//! Inference is purely syntactic: only literal-shaped initializers produce a type.
//! Argument checks compare a parameter's declared type name against the runtime
//! value's type tag.

use crate::ast::{Expression, TypeAnnotation};
use crate::interpreter::Value;

pub const INT: &str = "int";
pub const FLOAT: &str = "float";
pub const STRING: &str = "string";
pub const BOOLEAN: &str = "boolean";
pub const VOID: &str = "void";
pub const ANY: &str = "any";
pub const OBJECT: &str = "object";

/// Infers the type of a literal-shaped expression, or `None` for anything else.
pub fn infer_literal_type(expr: &Expression) -> Option<TypeAnnotation> {
    let name = match expr {
        Expression::IntegerLiteral { .. } => INT.to_string(),
        Expression::FloatLiteral { .. } => FLOAT.to_string(),
        Expression::StringLiteral { .. } => STRING.to_string(),
        Expression::BooleanLiteral { .. } => BOOLEAN.to_string(),
        Expression::Function(literal) => literal.signature(),
        _ => return None,
    };
    Some(TypeAnnotation::new(expr.token().clone(), name))
}

/// Resolves the type recorded on a `var`/`const` declaration.
///
/// `kind` names the declaration ("variable" or "constant") for messages.
pub fn resolve_declaration(
    kind: &str,
    name: &str,
    annotation: Option<TypeAnnotation>,
    value: Option<&Expression>,
) -> Result<Option<TypeAnnotation>, String> {
    match (annotation, value) {
        (Some(annotation), Some(value)) => match infer_literal_type(value) {
            Some(inferred) if inferred.name != annotation.name => Err(format!(
                "Type mismatch for {} '{}'. Explicitly typed as '{}' but initializer is of inferred type '{}'.",
                kind, name, annotation.name, inferred.name
            )),
            _ => Ok(Some(annotation)),
        },
        (Some(annotation), None) => Ok(Some(annotation)),
        (None, Some(value)) => Ok(infer_literal_type(value)),
        (None, None) => Err(format!(
            "Variable '{}' must have a type annotation or an initializer.",
            name
        )),
    }
}

/// Checks an argument against a declared parameter type.
///
/// Returns the value to bind, or `None` on a mismatch. `any` and `object` accept
/// everything; a `float` parameter promotes an integer argument. No other
/// conversion happens, so a float passed to an `int` parameter is rejected.
pub fn coerce_argument(declared: &str, value: Value) -> Option<Value> {
    match (declared, value) {
        (ANY | OBJECT, value) => Some(value),
        (FLOAT, Value::Integer(i)) => Some(Value::Float(i as f64)),
        (declared, value) if declared == value.type_name() => Some(value),
        _ => None,
    }
}
