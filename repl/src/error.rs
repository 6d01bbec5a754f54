use rubric_core::error::{ParseError, RubricError, RuntimeError};
use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplError {
    #[error("Parser error:\n{}", render_all(.0))]
    Parse(Vec<DiagnosticWithContext>),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ReplError {
    /// Attaches source context to every parse diagnostic.
    pub fn from_parse_errors(source: &str, errors: Vec<ParseError>) -> Self {
        ReplError::Parse(
            errors
                .into_iter()
                .map(|error| {
                    let context = ErrorContext::locate(source, &error);
                    DiagnosticWithContext { error, context }
                })
                .collect(),
        )
    }

    pub fn from_rubric(source: &str, error: RubricError) -> Self {
        match error {
            RubricError::Parse(errors) => Self::from_parse_errors(source, errors),
            RubricError::Runtime(err) => ReplError::Runtime(err),
        }
    }
}

fn render_all(diagnostics: &[DiagnosticWithContext]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ErrorContext {
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

impl ErrorContext {
    pub fn locate(source: &str, error: &ParseError) -> Option<Self> {
        let index = (error.line as usize).checked_sub(1)?;
        let source_line = source.lines().nth(index)?;
        Some(Self {
            line: error.line as usize,
            column: error.column as usize,
            source_line: source_line.to_string(),
        })
    }
}

pub struct DiagnosticWithContext {
    pub error: ParseError,
    pub context: Option<ErrorContext>,
}

impl fmt::Display for DiagnosticWithContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => {
                let ptr = " ".repeat(ctx.column.saturating_sub(1)) + "^";
                write!(
                    f,
                    "{}\nLine {}, column {}:\n{}\n{}",
                    self.error.message, ctx.line, ctx.column, ctx.source_line, ptr
                )
            }
            None => write!(f, "{}", self.error),
        }
    }
}

impl fmt::Debug for DiagnosticWithContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
