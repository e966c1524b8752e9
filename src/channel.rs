//! Transport seam for the authentication negotiator.

use async_trait::async_trait;
use bytes::Bytes;

/// A byte-oriented request/response channel to the server.
///
/// Implementations own framing, sequence ids, TLS and timeouts; the
/// negotiator only ever sees whole packet payloads, one blocking round trip
/// at a time. Closing the underlying stream must unblock a pending `recv`
/// and surface as an I/O error.
#[async_trait]
pub trait Channel: Send {
    /// Send one packet payload.
    async fn send(&mut self, payload: Bytes) -> std::io::Result<()>;

    /// Receive the next packet payload.
    async fn recv(&mut self) -> std::io::Result<Bytes>;
}
