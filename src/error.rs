// Top-level error type and its mapping to process exit codes.

use crate::api::DispatchError;
use crate::config::ConfigError;
use crate::request::RequestError;
use thiserror::Error;

/// Every way an invocation can fail before a response is printed.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("HTTP request to {target} failed: {source}")]
    Transport {
        target: String,
        source: DispatchError,
    },

    #[error("Malformed response from {target}: {source}")]
    MalformedResponse {
        target: String,
        source: DispatchError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Classify a dispatcher failure for the request to `target`.
    pub fn dispatch(target: &str, source: DispatchError) -> Self {
        let target = target.to_string();
        match source {
            DispatchError::Transport(_) => CliError::Transport { target, source },
            DispatchError::MalformedResponse(_) => CliError::MalformedResponse { target, source },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(ConfigError::MissingCredentials { .. }) => 3,
            CliError::Config(ConfigError::InvalidUsername(_)) => 4,
            CliError::Config(ConfigError::InvalidSecret) => 5,
            CliError::Config(ConfigError::Unreadable(_)) => 1,
            CliError::Request(RequestError::InvalidJsonParameter(_)) => 3,
            CliError::Request(_) => 1,
            CliError::Transport { .. } | CliError::MalformedResponse { .. } => 6,
            CliError::Other(_) => 1,
        }
    }
}
