use crate::config::Shared;
use crate::dns::handlers::Handler;
use crate::error::Error;
use crate::txt_store::DynTxtStore;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use trust_dns_proto::op::Message;

/// Receive buffer size. Larger than the 512 byte plain DNS limit so oversized datagrams are
/// read whole and fail to decode rather than being truncated.
const MAX_RECV_SIZE: usize = 4096;

/// A bound DNS UDP listener that hasn't started serving yet.
#[allow(clippy::module_name_repetitions)]
pub struct UdpServer {
    socket: UdpSocket,
    handler: Handler,
}

/// Bind the UDP socket at [`Config::dns_udp_bind_addr`][crate::config::Config::dns_udp_bind_addr].
///
/// # Errors
///
/// Returns [`Error::IO`] if the socket can't be bound.
pub async fn new(config: Shared, txt_store: DynTxtStore) -> Result<UdpServer, Error> {
    let socket = UdpSocket::bind(config.dns_udp_bind_addr).await?;
    Ok(UdpServer {
        socket,
        handler: Handler::new(config, txt_store),
    })
}

impl UdpServer {
    /// The address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the socket address can't be read.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    /// Answer datagrams until `shutdown` resolves, either because a value was sent or because
    /// the sender was dropped. A datagram that has already been received is answered before
    /// shutdown is checked again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if receiving from the socket fails for a reason other than an
    /// error reported for a single peer, such as an ICMP port unreachable for an earlier reply.
    pub async fn serve(self, mut shutdown: oneshot::Receiver<()>) -> Result<(), Error> {
        let mut buf = vec![0u8; MAX_RECV_SIZE];
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(()),
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, peer)) => self.respond(&buf[..len], peer).await,
                        Err(err) if is_transient(&err) => {
                            debug!("ignoring receive error: {err}");
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
    }

    async fn respond(&self, datagram: &[u8], peer: SocketAddr) {
        let request = match Message::from_vec(datagram) {
            Ok(request) => request,
            Err(err) => {
                debug!("dropping undecodable datagram from {peer}: {err}");
                return;
            }
        };

        let Some(response) = self.handler.handle_message(&request).await else {
            return;
        };

        let response = match response.to_vec() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("failed to encode response for {peer}: {err}");
                return;
            }
        };
        if let Err(err) = self.socket.send_to(&response, peer).await {
            warn!("failed to send response to {peer}: {err}");
        }
    }
}

/// Receive errors that concern a single datagram or peer and leave the socket usable.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
