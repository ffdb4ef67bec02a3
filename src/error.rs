//! Errors

use thiserror::Error;

use crate::address::Address;

/// Failure of one remote lookup.
///
/// Cloneable because a single in-flight request may be awaited by several
/// callers, and each of them receives the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be completed (connect, TLS, body read).
    #[error("request to {address} failed: {message}")]
    Network { address: Address, message: String },
    /// The server answered with a non-2xx status.
    #[error("request to {address} returned HTTP {status}")]
    Status { address: Address, status: u16 },
    /// The body was not JSON, or not the JSON record that was expected.
    #[error("malformed response from {address}: {message}")]
    Malformed { address: Address, message: String },
}

impl FetchError {
    pub fn address(&self) -> &Address {
        match self {
            FetchError::Network { address, .. }
            | FetchError::Status { address, .. }
            | FetchError::Malformed { address, .. } => address,
        }
    }

    /// Network failure in the broad sense: transport error or HTTP error status.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. } | FetchError::Status { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::Malformed { .. })
    }
}

/// The main error type of a session
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The user address resolved to `null`.
    #[error("no such user: {0}")]
    UnknownUser(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
