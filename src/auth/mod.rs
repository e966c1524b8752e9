//! Authentication: scramble math, client-side plugins, and the handshake
//! negotiator.

mod negotiator;
mod plugins;
mod scramble;

pub use negotiator::{
    AuthOptions, Credentials, DEFAULT_DIALOG_ROUNDS, PluginFactory, authenticate,
};
pub use plugins::{
    AuthPlugin, CachingSha2, ClearPassword, Dialog, DialogHandler, NativePassword,
    ORDINARY_QUESTION, PASSWORD_QUESTION, PluginOutcome, SocketAuth,
};
pub use scramble::{scramble_native, scramble_sha256};
