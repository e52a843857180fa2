//! Local network address resolution.
//!
//! Collaborator boundary for the listener's `complete` event: a
//! best-effort, synchronous lookup of the machine's reachable address
//! with no failure mode. When resolution is impossible the placeholder
//! [`FALLBACK_ADDRESS`] is returned instead, since the server core
//! defines no error path for address resolution.

use std::net::UdpSocket;

/// Placeholder returned when no reachable address can be determined.
pub const FALLBACK_ADDRESS: &str = "127.0.0.1";

/// Returns the local machine's best-effort reachable IP address.
///
/// Opens a UDP socket and "connects" it to a public address, which
/// selects the outbound interface without sending any packets, then
/// reads the socket's local address. Any failure along the way yields
/// [`FALLBACK_ADDRESS`].
#[must_use]
pub fn local_ip() -> String {
    resolve().unwrap_or_else(|| FALLBACK_ADDRESS.to_string())
}

fn resolve() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let addr = socket.local_addr().ok()?;
    Some(addr.ip().to_string())
}
