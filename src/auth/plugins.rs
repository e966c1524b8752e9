//! Client-side authentication plugins.
//!
//! Each plugin implements one server mechanism's challenge-response rules.
//! Native-password, clear-password and socket auth are stateless and
//! single-round; [`Dialog`] conducts an interactive prompt loop through an
//! application-supplied [`DialogHandler`] with a fixed round budget.

use bytes::{BufMut, Bytes, BytesMut};

use super::scramble::{scramble_native, scramble_sha256};

/// Dialog prompt type for a password-style question (input not echoed).
pub const PASSWORD_QUESTION: u8 = 0x02;
/// Dialog prompt type for an ordinary question (input echoed).
pub const ORDINARY_QUESTION: u8 = 0x03;

/// caching_sha2 more-data byte: cached credentials matched.
const FAST_AUTH_OK: u8 = 0x03;
/// caching_sha2 more-data byte: server wants the full exchange.
const FULL_AUTH_REQUIRED: u8 = 0x04;

/// What a plugin wants done with a server challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOutcome {
    /// Send these bytes and await the next packet.
    Respond(Bytes),
    /// Nothing further to send; await the server's verdict.
    Done,
    /// Give up; the negotiator reports this as a rejection.
    Fail(String),
}

/// A client-side authentication mechanism.
pub trait AuthPlugin: Send {
    /// Mechanism name, as matched against the server-advertised one.
    fn name(&self) -> &str;

    /// Response sent proactively on selection, before any explicit
    /// challenge. `None` means wait for the server to speak first.
    fn initial_response(&mut self) -> Option<Bytes> {
        None
    }

    /// React to a server challenge.
    fn next(&mut self, challenge: &[u8]) -> PluginOutcome;

    /// Remaining interactive rounds, if this plugin is budgeted.
    ///
    /// The negotiator treats a challenge arriving with zero rounds left as
    /// terminal exhaustion.
    fn rounds_remaining(&self) -> Option<u32> {
        None
    }
}

/// mysql_native_password: single SHA1 scramble of the greeting nonce.
pub struct NativePassword {
    response: Bytes,
}

impl NativePassword {
    pub fn new(password: &[u8], nonce: &[u8]) -> Self {
        Self {
            response: Bytes::from(scramble_native(password, nonce)),
        }
    }
}

impl AuthPlugin for NativePassword {
    fn name(&self) -> &str {
        "mysql_native_password"
    }

    fn initial_response(&mut self) -> Option<Bytes> {
        Some(self.response.clone())
    }

    fn next(&mut self, _challenge: &[u8]) -> PluginOutcome {
        PluginOutcome::Done
    }
}

/// caching_sha2_password: SHA256 scramble, then either the fast-auth
/// confirmation or a full-auth request for the cleartext password.
///
/// Sending the cleartext password assumes the transport collaborator has
/// secured the channel.
pub struct CachingSha2 {
    password: Vec<u8>,
    response: Bytes,
}

impl CachingSha2 {
    pub fn new(password: &[u8], nonce: &[u8]) -> Self {
        Self {
            password: password.to_vec(),
            response: Bytes::from(scramble_sha256(password, nonce)),
        }
    }
}

impl AuthPlugin for CachingSha2 {
    fn name(&self) -> &str {
        "caching_sha2_password"
    }

    fn initial_response(&mut self) -> Option<Bytes> {
        Some(self.response.clone())
    }

    fn next(&mut self, challenge: &[u8]) -> PluginOutcome {
        match challenge.first() {
            Some(&FAST_AUTH_OK) => PluginOutcome::Done,
            Some(&FULL_AUTH_REQUIRED) => {
                let mut buf = BytesMut::with_capacity(self.password.len() + 1);
                buf.put_slice(&self.password);
                buf.put_u8(0);
                PluginOutcome::Respond(buf.freeze())
            }
            other => PluginOutcome::Fail(format!(
                "unexpected caching_sha2 challenge byte {other:?}"
            )),
        }
    }
}

/// mysql_clear_password: the cleartext password, NUL-terminated. Also used
/// for PAM servers running in cleartext mode.
pub struct ClearPassword {
    response: Bytes,
}

impl ClearPassword {
    pub fn new(password: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(password.len() + 1);
        buf.put_slice(password);
        buf.put_u8(0);
        Self {
            response: buf.freeze(),
        }
    }
}

impl AuthPlugin for ClearPassword {
    fn name(&self) -> &str {
        "mysql_clear_password"
    }

    fn initial_response(&mut self) -> Option<Bytes> {
        Some(self.response.clone())
    }

    fn next(&mut self, _challenge: &[u8]) -> PluginOutcome {
        PluginOutcome::Done
    }
}

/// unix_socket / auth_socket: the server authenticates from peer
/// credentials; the client answers with an empty payload.
pub struct SocketAuth;

impl AuthPlugin for SocketAuth {
    fn name(&self) -> &str {
        "unix_socket"
    }

    fn initial_response(&mut self) -> Option<Bytes> {
        Some(Bytes::new())
    }

    fn next(&mut self, _challenge: &[u8]) -> PluginOutcome {
        PluginOutcome::Done
    }
}

/// Interactive callback supplied by the application for dialog prompts.
///
/// May be stateful across calls. Returning `None` abandons the handshake.
pub trait DialogHandler: Send {
    /// Answer one prompt. `echo` tells whether the user's input would be
    /// echoed on screen (an ordinary question rather than a password).
    fn prompt(&mut self, echo: bool, text: &str) -> Option<Vec<u8>>;
}

impl<F> DialogHandler for F
where
    F: FnMut(bool, &str) -> Option<Vec<u8>> + Send,
{
    fn prompt(&mut self, echo: bool, text: &str) -> Option<Vec<u8>> {
        self(echo, text)
    }
}

/// dialog: interactive prompt loop with a fixed round budget.
///
/// Each challenge is one flag byte ([`PASSWORD_QUESTION`] or
/// [`ORDINARY_QUESTION`], low bit set means echo) followed by UTF-8 prompt
/// text. The plugin only does round bookkeeping and forwarding; answer
/// content belongs to the handler.
pub struct Dialog {
    handler: Box<dyn DialogHandler>,
    max_rounds: u32,
    rounds_used: u32,
}

impl Dialog {
    pub fn new(handler: Box<dyn DialogHandler>, max_rounds: u32) -> Self {
        Self {
            handler,
            max_rounds,
            rounds_used: 0,
        }
    }
}

impl AuthPlugin for Dialog {
    fn name(&self) -> &str {
        "dialog"
    }

    fn next(&mut self, challenge: &[u8]) -> PluginOutcome {
        self.rounds_used += 1;
        let Some((&flag, text)) = challenge.split_first() else {
            return PluginOutcome::Fail("empty dialog prompt".to_string());
        };
        let echo = flag & 0x01 == 0x01;
        let text = String::from_utf8_lossy(text);
        match self.handler.prompt(echo, &text) {
            Some(answer) => PluginOutcome::Respond(Bytes::from(answer)),
            None => PluginOutcome::Fail(format!("no answer for prompt {text:?}")),
        }
    }

    fn rounds_remaining(&self) -> Option<u32> {
        Some(self.max_rounds.saturating_sub(self.rounds_used))
    }
}
