use thiserror::Error;

#[derive(Error, Debug)]
pub enum CqbfError {
    #[error("CQBF parse error on line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("gate variables used but never defined: {0:?}")]
    DanglingReference(Vec<usize>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl CqbfError {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        CqbfError::Format {
            line,
            message: message.into(),
        }
    }
}
