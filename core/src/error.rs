use thiserror::Error;

/// A parser diagnostic anchored at the token where the problem was noticed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}:{column}] {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("identifier not found: {0}")]
    UndefinedIdentifier(String),

    #[error("Identifier '{0}' has already been declared in this scope.")]
    AlreadyDeclared(String),

    #[error("Assignment to constant variable '{0}'.")]
    ConstantAssignment(String),

    #[error("Identifier '{0}' not found for assignment.")]
    UndefinedAssignment(String),

    #[error("unsupported operand types for {operator}: {left} and {right}")]
    UnsupportedOperands {
        operator: String,
        left: String,
        right: String,
    },

    #[error("unsupported operand type for prefix {operator}: {operand}")]
    UnsupportedPrefix { operator: String, operand: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("integer overflow in {0}")]
    IntegerOverflow(String),

    #[error("Function '{function}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Type mismatch for parameter '{param}' in function '{function}': expected {expected}, got {actual}"
    )]
    ArgumentType {
        param: String,
        function: String,
        expected: String,
        actual: String,
    },

    #[error("Cannot call non-function type: {0}")]
    NotCallable(String),

    #[error("operator {0} requires an identifier operand")]
    InvalidUpdateTarget(String),

    #[error("operator {operator} requires a numeric operand, got {actual}")]
    NonNumericUpdate { operator: String, actual: String },

    #[error("failed to write output: {0}")]
    Output(String),
}

/// Everything that can stop a program from running to completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RubricError {
    #[error("Parser error: {}", join_diagnostics(.0))]
    Parse(Vec<ParseError>),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

fn join_diagnostics(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RubricError>;
