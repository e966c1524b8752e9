//! Auth-phase packet payloads.
//!
//! Packet framing (3-byte length + sequence id), compression and TLS belong
//! to the transport layer; these types classify the payloads the negotiator
//! exchanges during the handshake.

use crate::error::{WireError, WireResult};

/// First byte of an OK packet.
pub const OK_HEADER: u8 = 0x00;
/// First byte of an extra-auth-data packet.
pub const MORE_DATA_HEADER: u8 = 0x01;
/// First byte of an auth-switch request.
pub const AUTH_SWITCH_HEADER: u8 = 0xfe;
/// First byte of an ERR packet.
pub const ERR_HEADER: u8 = 0xff;

/// Server-advertised mechanism plus its initial challenge data, taken from
/// the connection greeting (or an auth-switch request) by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub plugin_name: String,
    pub data: Vec<u8>,
}

impl AuthChallenge {
    pub fn new(plugin_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            data: data.into(),
        }
    }
}

/// A classified auth-phase packet from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPacket {
    /// Authentication accepted.
    Ok,
    /// Explicit refusal, with server error code and message.
    Err { code: u16, message: String },
    /// Switch to a different mechanism.
    Switch(AuthChallenge),
    /// Additional challenge data for the current plugin. Dialog prompts
    /// arrive as bare payloads; other plugins get a `0x01`-prefixed packet
    /// whose prefix is stripped here.
    MoreData(Vec<u8>),
}

impl AuthPacket {
    /// Classify one packet payload received during the auth phase.
    pub fn parse(payload: &[u8]) -> WireResult<Self> {
        match payload.first() {
            None => Err(WireError::Protocol("empty auth packet".to_string())),
            Some(&OK_HEADER) => Ok(AuthPacket::Ok),
            Some(&ERR_HEADER) => {
                if payload.len() < 3 {
                    return Err(WireError::Protocol("truncated ERR packet".to_string()));
                }
                let code = u16::from_le_bytes([payload[1], payload[2]]);
                let mut rest = &payload[3..];
                // Optional '#' + 5-byte SQL state marker.
                if rest.first() == Some(&b'#') && rest.len() >= 6 {
                    rest = &rest[6..];
                }
                Ok(AuthPacket::Err {
                    code,
                    message: String::from_utf8_lossy(rest).to_string(),
                })
            }
            Some(&AUTH_SWITCH_HEADER) => {
                let mut buf = &payload[1..];
                let name = read_null_string(&mut buf);
                let mut data = buf.to_vec();
                // The challenge often carries a trailing NUL.
                while data.last() == Some(&0) {
                    data.pop();
                }
                Ok(AuthPacket::Switch(AuthChallenge {
                    plugin_name: String::from_utf8_lossy(&name).to_string(),
                    data,
                }))
            }
            Some(&MORE_DATA_HEADER) => Ok(AuthPacket::MoreData(payload[1..].to_vec())),
            Some(_) => Ok(AuthPacket::MoreData(payload.to_vec())),
        }
    }
}

/// Read a null-terminated string, advancing the buffer past the terminator.
pub fn read_null_string(buf: &mut &[u8]) -> Vec<u8> {
    let mut result = Vec::new();
    while !buf.is_empty() && buf[0] != 0 {
        result.push(buf[0]);
        *buf = &buf[1..];
    }
    if !buf.is_empty() {
        *buf = &buf[1..]; // skip null byte
    }
    result
}
