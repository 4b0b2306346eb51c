use sluice_core::ConfigError;

/// Errors crossing the input boundary.
///
/// Only construction failures and the two read outcomes (`Cancelled`,
/// `EndOfInput`) are ever returned. Socket failures after startup are
/// logged and counted, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("invalid input config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },
    #[error("{address} did not resolve to any socket address")]
    NoAddress { address: String },
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("input is closed")]
    Closed,
    #[error("read cancelled")]
    Cancelled,
    #[error("end of input")]
    EndOfInput,
}

impl InputError {
    /// No further messages will ever be produced.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T, E = InputError> = std::result::Result<T, E>;
