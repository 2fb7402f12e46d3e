use std::{error::Error, fmt::Display};

/// Semantic analysis failures. `Check` carries what was being checked and why
/// it was rejected; `DeterministicReturn` names the offending function or
/// method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    Check { context: String, reason: String },
    DeterministicReturn { name: String },
}

impl TypeError {
    pub fn check(context: impl Into<String>, reason: impl Into<String>) -> Self {
        TypeError::Check {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeError::Check { context, reason } => {
                f.write_fmt(format_args!("type check error : {context} : {reason}"))
            }
            TypeError::DeterministicReturn { name } => f.write_fmt(format_args!(
                "deterministic return error : {name} may not return on every path"
            )),
        }
    }
}

impl Error for TypeError {}

pub type TResult<T> = Result<T, TypeError>;
