//! Error types.

use trust_dns_proto::error::ProtoError;

/// Error enumerates the possible DNS standalone solver error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned at startup when a required environment variable is unset or empty.
    #[error("{0} must be specified")]
    MissingConfig(&'static str),

    /// Returned at startup when an environment variable holds a value that can't be used, e.g.
    /// a non-numeric `PORT` or a hostname that isn't a valid DNS name.
    #[error("invalid value for {key}: \"{value}\"")]
    InvalidConfig { key: &'static str, value: String },

    /// Returned when [`Solver::initialize`][crate::solver::Solver::initialize] is called more
    /// than once for the same solver.
    #[error("solver is already initialized")]
    AlreadyInitialized,

    /// Returned when the [webhook API][crate::api] receives a request for a group or solver
    /// name this process doesn't serve.
    #[error("no solver \"{solver}\" registered for group \"{group}\"")]
    UnknownSolver { group: String, solver: String },

    /// Returned when the [webhook API][crate::api] receives a challenge payload without a
    /// `request` object.
    #[error("challenge payload is missing a request")]
    MissingChallengeRequest,

    /// Returned when a generic IO error occurs, e.g. the DNS listener fails to bind.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when the DNS server encounters a generic DNS protocol error, or a synthesized
    /// record name fails to parse.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),
}
