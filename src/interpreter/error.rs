use std::{error::Error, fmt::Display};

/// A violated precondition detected while executing: index out of range,
/// pointer to a destroyed object, missing method, and the like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("runtime error : {}", self.message))
    }
}

impl Error for RuntimeError {}

pub type RResult<T> = Result<T, RuntimeError>;
