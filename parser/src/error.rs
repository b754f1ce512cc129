use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Error on line {line}. Expected {expected}, but found '{found}'.")]
    Format {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("Error on line {line}. Unexpected end of input while expecting {expected}.")]
    EndOfInput { line: usize, expected: String },

    #[error("Error on line {line}. Formula nesting exceeds {limit} levels.")]
    TooDeep { line: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn format(line: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        ParseError::Format {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn end_of_input(line: usize, expected: impl Into<String>) -> Self {
        ParseError::EndOfInput {
            line,
            expected: expected.into(),
        }
    }

    /// The 1-based line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Format { line, .. }
            | ParseError::EndOfInput { line, .. }
            | ParseError::TooDeep { line, .. } => Some(*line),
            ParseError::Io(_) => None,
        }
    }
}
