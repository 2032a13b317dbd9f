//! Challenge solver lifecycle.
//!
//! A certificate controller drives a [`Solver`] through one validation cycle at a time:
//! [`initialize`][Solver::initialize] once at startup, then [`present`][Solver::present] to
//! publish a challenge value and [`clean_up`][Solver::clean_up] once the ACME server has
//! validated it. [`StandaloneSolver`] serves the presented values from its own
//! [DNS server][crate::dns].

use crate::config::{Config, Shared};
use crate::dns;
use crate::dns::classify::{classify, Classification, ACME_CHALLENGE_PREFIX};
use crate::dns::server::UdpServer;
use crate::error::Error;
use crate::txt_store::{normalize_fqdn, DynTxtStore};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The name [`StandaloneSolver`] registers under with the webhook host.
pub const SOLVER_NAME: &str = "dns-standalone";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeAction {
    Present,
    CleanUp,
}

/// One challenge, as sent by the certificate controller.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub uid: String,
    pub action: ChallengeAction,
    #[serde(rename = "type", default)]
    pub challenge_type: String,
    #[serde(default)]
    pub dns_name: String,
    /// The challenge response value to serve.
    pub key: String,
    /// The name the value should be served for, e.g. `_acme-challenge.example.com.`.
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    #[serde(default)]
    pub resolved_zone: String,
}

/// `DynSolver` is a type alias for a [`Solver`] shared with the [webhook API][crate::api].
#[allow(clippy::module_name_repetitions)]
pub type DynSolver = Arc<dyn Solver + Send + Sync>;

#[async_trait::async_trait]
pub trait Solver {
    /// Identifier the webhook host routes requests by.
    fn name(&self) -> &'static str;

    /// Publish the challenge value. It is visible to every DNS query handled after this returns.
    async fn present(&self, ch: &ChallengeRequest) -> Result<(), Error>;

    /// Withdraw the challenge value for the request's name, whatever the value is.
    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), Error>;

    /// Start serving in the background and return. Serving stops once `stop` resolves.
    async fn initialize(&self, stop: oneshot::Receiver<()>) -> Result<(), Error>;
}

/// The key challenge values for `fqdn` are stored under, which is the key a query for `fqdn`
/// is answered from.
///
/// That is the lower-cased FQDN with an `_acme-challenge.` prefix, unless it already has one.
/// A name under the authoritative zone, as reached by following a `CNAME`, is stored under its
/// rewritten key with the zone removed.
#[must_use]
pub fn challenge_key(fqdn: &str, config: &Config) -> String {
    let fqdn = normalize_fqdn(fqdn);
    match classify(&fqdn, config) {
        Classification::AcmeChallenge { key } | Classification::DelegatedUnderZone { key } => key,
        Classification::ZoneApex | Classification::OutOfScope => {
            format!("{ACME_CHALLENGE_PREFIX}{}", fqdn.trim_start_matches('.'))
        }
    }
}

/// A [`Solver`] that answers challenge lookups from its own UDP DNS server.
#[allow(clippy::module_name_repetitions)]
pub struct StandaloneSolver {
    config: Shared,
    txt_store: DynTxtStore,
    dns_addr: OnceLock<SocketAddr>,
    serving: OnceLock<watch::Receiver<()>>,
    shutdown: Mutex<Option<JoinHandle<()>>>,
}

impl StandaloneSolver {
    #[must_use]
    pub fn new(config: Shared, txt_store: DynTxtStore) -> Self {
        StandaloneSolver {
            config,
            txt_store,
            dns_addr: OnceLock::new(),
            serving: OnceLock::new(),
            shutdown: Mutex::default(),
        }
    }

    /// The address the DNS server is bound to, once [`Solver::initialize`] has succeeded.
    pub fn dns_addr(&self) -> Option<SocketAddr> {
        self.dns_addr.get().copied()
    }

    /// Resolves once the DNS server has stopped serving, whether it was told to stop or failed.
    /// Resolves immediately if the solver was never initialized.
    pub async fn serve_finished(&self) {
        if let Some(serving) = self.serving.get() {
            wait_until_closed(serving.clone()).await;
        }
    }

    /// Wait for the DNS server to stop after the stop signal passed to [`Solver::initialize`]
    /// resolves. Returns immediately if the solver was never initialized.
    pub async fn wait_for_shutdown(&self) {
        let handle = self.shutdown.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("DNS shutdown task failed: {err}");
            }
        }
    }
}

#[async_trait::async_trait]
impl Solver for StandaloneSolver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn present(&self, ch: &ChallengeRequest) -> Result<(), Error> {
        let key = challenge_key(&ch.resolved_fqdn, &self.config);
        self.txt_store.put(&key, ch.key.clone()).await;
        info!("presenting {key}");
        Ok(())
    }

    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), Error> {
        let key = challenge_key(&ch.resolved_fqdn, &self.config);
        self.txt_store.delete(&key).await;
        info!("cleaned up {key}");
        Ok(())
    }

    async fn initialize(&self, stop: oneshot::Receiver<()>) -> Result<(), Error> {
        let mut shutdown = self.shutdown.lock().await;
        if self.dns_addr.get().is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let server = dns::new(self.config.clone(), self.txt_store.clone()).await?;
        let addr = server.local_addr()?;
        self.dns_addr
            .set(addr)
            .map_err(|_| Error::AlreadyInitialized)?;
        info!("DNS listening on UDP {addr}");

        let (serve_tx, serve_rx) = oneshot::channel();
        let (serve_handle, serving) = spawn_serve(server, serve_rx);
        // Only one caller gets past the `dns_addr` check above.
        let _ = self.serving.set(serving);

        *shutdown = Some(tokio::spawn(async move {
            // Resolves when stopped explicitly or when the sender is dropped.
            let _ = stop.await;
            info!("shutting down DNS listener");
            // The server may have already exited on its own, in which case nobody is listening.
            let _ = serve_tx.send(());
            if let Err(err) = serve_handle.await {
                error!("DNS server task failed: {err}");
            }
            info!("DNS listener shut down");
        }));
        Ok(())
    }
}

/// Serve on a background task. The returned receiver's sender lives inside the task, so it
/// closes when the task ends for any reason.
fn spawn_serve(
    server: UdpServer,
    stop: oneshot::Receiver<()>,
) -> (JoinHandle<()>, watch::Receiver<()>) {
    let (serving_tx, serving_rx) = watch::channel(());
    let handle = tokio::spawn(async move {
        let _serving = serving_tx;
        if let Err(err) = server.serve(stop).await {
            error!("DNS server stopped: {err}");
        }
    });
    (handle, serving_rx)
}

async fn wait_until_closed(mut serving: watch::Receiver<()>) {
    while serving.changed().await.is_ok() {}
}
