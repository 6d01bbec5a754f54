pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

use std::io::Write;

use error::{Result, RubricError};
use interpreter::{Environment, Interpreter, Value};

/// Parses and runs `source` in a fresh root scope, sending `display` output to `output`.
///
/// Any parse diagnostic aborts before evaluation starts.
pub fn run_source<W: Write>(source: &str, output: W) -> Result<Value> {
    let (program, errors) = parser::parse_program(source);
    if !errors.is_empty() {
        return Err(RubricError::Parse(errors));
    }

    let mut interpreter = Interpreter::with_output(output);
    let value = interpreter.run(&program, &Environment::root())?;
    Ok(value)
}
