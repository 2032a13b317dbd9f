//! Pending challenge record storage.
//!
//! Maps a normalized FQDN (lower-cased, with a trailing dot) to the single [RFC-8555][RFC-8555]
//! [DNS-01] challenge response value that should be served for it. Records only live as long as
//! one validation cycle: they're added by [`present`][crate::solver::Solver::present], removed by
//! [`clean_up`][crate::solver::Solver::clean_up] and never persisted.
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4

use std::sync::Arc;

pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryTxtStore;

/// `DynTxtStore` is a type alias for a [`TxtStore`] shared between the DNS listener and the
/// solver lifecycle calls. Implementations do their own locking.
#[allow(clippy::module_name_repetitions)]
pub type DynTxtStore = Arc<dyn TxtStore + Send + Sync>;

/// An async trait describing storage of challenge response values, keyed by the FQDN they
/// should be served for in the [DNS server][crate::dns].
///
/// Every method normalizes its `fqdn` argument with [`normalize_fqdn`] before touching the
/// underlying storage. None of them can fail.
#[async_trait::async_trait]
pub trait TxtStore {
    /// Store `value` for `fqdn`, replacing any prior value.
    async fn put(&self, fqdn: &str, value: String);

    /// Remove the value for `fqdn`. Removing an absent key is a no-op.
    async fn delete(&self, fqdn: &str);

    /// The current value for `fqdn` (if any).
    async fn lookup(&self, fqdn: &str) -> Option<String>;
}

/// Lower-case `name` and make sure it ends in exactly one trailing dot.
#[must_use]
pub fn normalize_fqdn(name: &str) -> String {
    format!("{}.", name.trim().trim_end_matches('.').to_ascii_lowercase())
}
