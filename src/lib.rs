//! DNS Standalone
//!
//! A single-purpose DNS server for solving [RFC-8555][RFC-8555] [DNS-01] challenges.
//!
//! A certificate controller [presents][crate::solver::Solver::present] challenge values through
//! the [webhook API][crate::api] and they're served as `TXT` records at
//! `_acme-challenge.<domain>` by the built-in [UDP DNS server][crate::dns] until they are
//! [cleaned up][crate::solver::Solver::clean_up]. Optionally the server acts as the
//! authoritative nameserver for a zone, so parent zones can delegate challenge lookups to it
//! with `NS` or `CNAME` records.
//!
//! Nothing is persisted: challenge values only live for one validation cycle.
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod dns;
pub mod error;
pub mod solver;
pub mod txt_store;

pub use config::{Config, Shared};
pub use solver::{ChallengeAction, ChallengeRequest, Solver, StandaloneSolver};
pub use txt_store::{DynTxtStore, InMemoryTxtStore, TxtStore};
