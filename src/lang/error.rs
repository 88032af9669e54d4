use std::io;

use thiserror::Error;

use crate::lang::ast::Identifier;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot create a new variable named '{0}' because that name is already in use")]
    NameConflict(Identifier),
    #[error("Unknown variable: {0}")]
    UndefinedVariable(Identifier),
    #[error("'{function}()' takes {expected} argument(s), {found} supplied")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },
    #[error("Malformed expression: {0}")]
    ExpressionSyntax(String),
    #[error("'{0}' is not a number")]
    NumberFormat(String),
    #[error("No more input to read")]
    InputExhausted,
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn arity(function: impl ToString, expected: impl ToString, found: usize) -> Self {
        Error::Arity {
            function: function.to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An `Error` annotated with where in the program it happened
#[derive(Debug, Error)]
#[error("line {line}: {kind}\n    {text}")]
pub struct ExecutionError {
    pub line: usize,
    pub text: String,
    #[source]
    pub kind: Error,
}

impl ExecutionError {
    pub fn new(line: usize, text: impl Into<String>, kind: Error) -> Self {
        Self {
            line,
            text: text.into(),
            kind,
        }
    }
}

#[test]
fn test_execution_error_display() {
    let err = ExecutionError::new(3, "b = 5", Error::UndefinedVariable("b".into()));
    assert_eq!(err.to_string(), "line 3: Unknown variable: b\n    b = 5");

    let err = ExecutionError::new(1, "print()", Error::arity("print", 1, 0));
    assert_eq!(
        err.to_string(),
        "line 1: 'print()' takes 1 argument(s), 0 supplied\n    print()"
    );
}
