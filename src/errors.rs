use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A configuration or request field violates its documented constraint.
    #[error("{0}")]
    Validation(String),
    /// The series itself cannot be turned into a model input.
    #[error("{0}")]
    Input(String),
    /// Fit or predict failed inside the engine.
    #[error("{0}")]
    Engine(String),
    #[error("forecast did not finish within {0:?}")]
    Timeout(Duration),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Input(_) => "input",
            Error::Engine(_) => "engine",
            Error::Timeout(_) => "timeout",
        }
    }
}

impl From<crate::engine::EngineError> for Error {
    fn from(e: crate::engine::EngineError) -> Error {
        Error::Engine(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Error {
        Error::Engine(e.to_string())
    }
}
