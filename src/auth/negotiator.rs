//! Handshake negotiation state machine.
//!
//! Runs once per connection attempt, before any query: selects a plugin for
//! the server-advertised mechanism, drives challenge/response rounds one
//! blocking round trip at a time, honors at most one auth-switch, and turns
//! round-budget exhaustion into a terminal outcome distinct from an
//! explicit rejection. Terminal failures are never retried here; the
//! connection layer owns that decision.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::channel::Channel;
use crate::error::{WireError, WireResult};
use crate::protocol::{AuthChallenge, AuthPacket};

use super::plugins::{
    AuthPlugin, CachingSha2, ClearPassword, Dialog, DialogHandler, NativePassword, PluginOutcome,
    SocketAuth,
};

/// Interactive round budget used when the application does not set one.
pub const DEFAULT_DIALOG_ROUNDS: u32 = 10;

/// Application-registered factory producing a plugin for a mechanism name.
pub type PluginFactory =
    Box<dyn FnMut(&AuthChallenge, &Credentials) -> Box<dyn AuthPlugin> + Send>;

/// Account credentials for the handshake.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Per-connection-attempt authentication options.
///
/// Owned by one connection; nothing here is shared.
pub struct AuthOptions {
    pub credentials: Credentials,
    dialog: Option<Box<dyn DialogHandler>>,
    dialog_rounds: u32,
    plugins: HashMap<String, PluginFactory>,
}

impl AuthOptions {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                user: user.into(),
                password: password.into(),
            },
            dialog: None,
            dialog_rounds: DEFAULT_DIALOG_ROUNDS,
            plugins: HashMap::new(),
        }
    }

    /// Enable the dialog plugin with this interactive handler.
    pub fn with_dialog_handler(mut self, handler: impl DialogHandler + 'static) -> Self {
        self.dialog = Some(Box::new(handler));
        self
    }

    /// Cap the dialog plugin's interactive rounds.
    pub fn with_dialog_rounds(mut self, rounds: u32) -> Self {
        self.dialog_rounds = rounds;
        self
    }

    /// Register a custom plugin for a mechanism name. Consulted before the
    /// built-in table, so this can also override a built-in mechanism.
    pub fn with_plugin(mut self, name: impl Into<String>, factory: PluginFactory) -> Self {
        self.plugins.insert(name.into(), factory);
        self
    }
}

/// Per-connection-attempt handshake state. Created when negotiation starts
/// and discarded in full on any terminal outcome.
struct AuthSession {
    plugin: Box<dyn AuthPlugin>,
    switched: bool,
}

/// Drive the handshake to a terminal outcome.
///
/// `greeting` is the mechanism and nonce the transport extracted from the
/// server greeting. Returns `Ok(())` once the server accepts; every other
/// outcome is a [`WireError`]: [`WireError::UnsupportedAuthPlugin`] (before
/// any round trip), [`WireError::Rejected`], or
/// [`WireError::ExhaustedAttempts`].
pub async fn authenticate<C>(
    channel: &mut C,
    greeting: &AuthChallenge,
    options: &mut AuthOptions,
) -> WireResult<()>
where
    C: Channel + ?Sized,
{
    let plugin = select_plugin(greeting, options)?;
    debug!(plugin = plugin.name(), user = %options.credentials.user, "auth plugin selected");
    let mut session = AuthSession {
        plugin,
        switched: false,
    };

    // Plugins that can answer the greeting nonce do so without waiting for
    // an explicit challenge, keeping the common case to one round trip.
    if let Some(response) = session.plugin.initial_response() {
        channel.send(response).await?;
    }

    loop {
        let payload = channel.recv().await?;
        match AuthPacket::parse(&payload)? {
            AuthPacket::Ok => {
                debug!(plugin = session.plugin.name(), "authenticated");
                return Ok(());
            }
            AuthPacket::Err { code, message } => {
                warn!(code, "server rejected credentials");
                return Err(WireError::Rejected(message));
            }
            AuthPacket::Switch(challenge) => {
                if session.switched {
                    return Err(WireError::Protocol(
                        "server requested a second auth switch".to_string(),
                    ));
                }
                debug!(plugin = %challenge.plugin_name, "auth switch requested");
                session.plugin = select_plugin(&challenge, options)?;
                session.switched = true;
                if let Some(response) = session.plugin.initial_response() {
                    channel.send(response).await?;
                }
            }
            AuthPacket::MoreData(challenge) => {
                if session.plugin.rounds_remaining() == Some(0) {
                    warn!(plugin = session.plugin.name(), "round budget exhausted");
                    return Err(WireError::ExhaustedAttempts);
                }
                match session.plugin.next(&challenge) {
                    PluginOutcome::Respond(response) => channel.send(response).await?,
                    PluginOutcome::Done => {}
                    PluginOutcome::Fail(reason) => return Err(WireError::Rejected(reason)),
                }
            }
        }
    }
}

fn select_plugin(
    challenge: &AuthChallenge,
    options: &mut AuthOptions,
) -> WireResult<Box<dyn AuthPlugin>> {
    if let Some(factory) = options.plugins.get_mut(&challenge.plugin_name) {
        return Ok(factory(challenge, &options.credentials));
    }
    let password = options.credentials.password.as_bytes();
    match challenge.plugin_name.as_str() {
        "mysql_native_password" => Ok(Box::new(NativePassword::new(password, &challenge.data))),
        "caching_sha2_password" => Ok(Box::new(CachingSha2::new(password, &challenge.data))),
        // PAM in cleartext mode; interactive PAM goes through "dialog".
        "mysql_clear_password" | "pam" => Ok(Box::new(ClearPassword::new(password))),
        "unix_socket" | "auth_socket" => Ok(Box::new(SocketAuth)),
        "dialog" => {
            let handler = options
                .dialog
                .take()
                .ok_or_else(|| WireError::UnsupportedAuthPlugin("dialog".to_string()))?;
            Ok(Box::new(Dialog::new(handler, options.dialog_rounds)))
        }
        other => Err(WireError::UnsupportedAuthPlugin(other.to_string())),
    }
}
