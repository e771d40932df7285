//! Error types for the PetFriends client and scenario suite.
//!
//! # Design
//! HTTP statuses are never errors here: a 403 or 400 is data returned in an
//! `ApiResponse` for the caller to assert on. `ApiError` only covers calls
//! that never produced a status (transport failures, unreadable photo files)
//! and typed views over a body that lacks the expected shape.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the client and transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed: connection, TLS, or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A photo file could not be read from disk.
    #[error("cannot read photo {}: {source}", path.display())]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The response body does not have the shape a typed accessor expects.
    #[error("unexpected body for HTTP {status}: {reason}")]
    UnexpectedBody { status: u16, reason: String },
}

/// Errors produced while running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An expectation about status or body did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// A scenario needed an owned pet and the account has none.
    #[error("There is no my pets")]
    NoOwnPets,
}

/// Errors from loading `Settings`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("cannot load env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}
