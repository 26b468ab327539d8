//! Top-level error type and its mapping onto process exit codes.

use thiserror::Error;

use crate::{commands::ops::NoPathsSpecified, config::ConfigError, network::NetworkError};

/// Exit code for usage errors and anything not covered by a dedicated code.
pub const EXIT_USAGE: i32 = 1;

#[derive(Debug, Error)]
pub enum QbError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    NoPaths(#[from] NoPathsSpecified),

    // Alternate form prints the whole context chain.
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl QbError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(e) => e.exit_code(),
            Self::Network(e) => e.exit_code(),
            Self::NoPaths(e) => e.exit_code(),
            Self::Other(_) => EXIT_USAGE,
        }
    }
}
