//! # mywire
//!
//! Core of a MySQL wire-protocol client: a pluggable, multi-round-trip
//! authentication negotiator and an injection-safe value-escaping engine.
//!
//! The crate deliberately stops at the packet-payload boundary. Framing,
//! compression, TLS and timeouts belong to the transport, which implements
//! [`channel::Channel`] and hands the negotiator whole payloads; the
//! encoder performs no I/O at all.
//!
//! ## Escaping a value
//!
//! ```
//! use mywire::encode::{encode, EncodedValue, EncoderRegistry};
//! use mywire::escape::QuotingMode;
//! use mywire::value::Value;
//!
//! let registry = EncoderRegistry::with_builtins();
//! let literal = encode(&Value::from("foo'bar"), &registry, QuotingMode::Standard).unwrap();
//! assert_eq!(literal, EncodedValue::Literal("'foo\\'bar'".to_string()));
//! ```
//!
//! ## Authenticating
//!
//! ```rust,ignore
//! use mywire::auth::{authenticate, AuthOptions};
//!
//! let mut options = AuthOptions::new("app", "secret");
//! authenticate(&mut channel, &greeting, &mut options).await?;
//! ```

pub mod auth;
pub mod channel;
pub mod encode;
pub mod error;
pub mod escape;
pub mod protocol;
pub mod value;

pub use error::{WireError, WireResult};

pub mod prelude {
    pub use crate::auth::{AuthOptions, AuthPlugin, DialogHandler, authenticate};
    pub use crate::channel::Channel;
    pub use crate::encode::{Encoded, EncodedValue, EncoderRegistry, encode, encode_literal};
    pub use crate::error::{WireError, WireResult};
    pub use crate::escape::{QuotingMode, escape_string, quote};
    pub use crate::protocol::AuthChallenge;
    pub use crate::value::{TypeKey, Value};
}
