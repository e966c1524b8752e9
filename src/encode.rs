//! Value encoding: registry resolution, recursive composite encoding, and
//! application of the quoting policy.
//!
//! Resolution order is exact type first, then the registered text encoder
//! for text-like values, otherwise [`WireError::Unencodable`]. Registries
//! layer per-connection overrides over an immutable shared seed of built-in
//! encoders; registering for an already-known type replaces it.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{NaiveTime, Timelike};

use crate::error::{WireError, WireResult};
use crate::escape::{QuotingMode, quote};
use crate::value::{TypeKey, Value};

/// What a type encoder produced.
pub enum Encoded {
    /// Raw text that still needs the quoting policy applied.
    Text(String),
    /// A finished literal; embedded as-is, never re-quoted.
    Literal(String),
}

/// A type-specific encoding function.
pub type EncodeFn = Arc<dyn Fn(&Value, &EncoderRegistry) -> WireResult<Encoded> + Send + Sync>;

/// Result of [`encode`]: one literal, or a per-key map of literals for
/// substitution by placeholder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
    Literal(String),
    Map(HashMap<String, String>),
}

impl EncodedValue {
    /// The single-literal form, if this is one.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            EncodedValue::Literal(s) => Some(s),
            EncodedValue::Map(_) => None,
        }
    }
}

/// Type-to-encoder mapping with copy-on-write layering.
///
/// The built-in encoders live in a process-wide immutable seed shared by
/// reference; [`EncoderRegistry::register`] writes into a local override
/// layer, so deriving a modified registry never mutates the seed or any
/// other registry cloned from it.
#[derive(Clone)]
pub struct EncoderRegistry {
    seed: Option<Arc<HashMap<TypeKey, EncodeFn>>>,
    overrides: HashMap<TypeKey, EncodeFn>,
}

impl EncoderRegistry {
    /// Registry seeded with the built-in scalar, date and time encoders.
    pub fn with_builtins() -> Self {
        Self {
            seed: Some(builtins()),
            overrides: HashMap::new(),
        }
    }

    /// Registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            seed: None,
            overrides: HashMap::new(),
        }
    }

    /// Register (or replace) the encoder for `key`. Last write wins.
    pub fn register<F>(&mut self, key: TypeKey, f: F)
    where
        F: Fn(&Value, &EncoderRegistry) -> WireResult<Encoded> + Send + Sync + 'static,
    {
        self.overrides.insert(key, Arc::new(f));
    }

    /// Look up the encoder for `key`: local overrides first, then the seed.
    pub fn resolve(&self, key: TypeKey) -> Option<&EncodeFn> {
        self.overrides
            .get(&key)
            .or_else(|| self.seed.as_ref().and_then(|seed| seed.get(&key)))
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Encode `value` into literal text safe to substitute into a statement.
///
/// Sequences collapse to one tuple literal; maps encode each value
/// independently and keep their keys. Everything else goes through the
/// registry, and raw-text results are quoted for `mode`.
pub fn encode(
    value: &Value,
    registry: &EncoderRegistry,
    mode: QuotingMode,
) -> WireResult<EncodedValue> {
    match value {
        Value::Map(entries) => {
            let mut out = HashMap::with_capacity(entries.len());
            for (key, v) in entries {
                out.insert(key.clone(), encode_literal(v, registry, mode)?);
            }
            Ok(EncodedValue::Map(out))
        }
        other => Ok(EncodedValue::Literal(encode_literal(other, registry, mode)?)),
    }
}

/// Encode a value that must collapse to a single literal.
///
/// Fails with [`WireError::Unencodable`] for maps (they have no
/// single-literal form) and for types with no registry entry or fallback.
pub fn encode_literal(
    value: &Value,
    registry: &EncoderRegistry,
    mode: QuotingMode,
) -> WireResult<String> {
    if let Value::List(items) = value {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(encode_literal(item, registry, mode)?);
        }
        return Ok(format!("({})", parts.join(",")));
    }
    let Some(key) = value.type_key() else {
        return Err(WireError::Unencodable(value.type_name()));
    };
    let encoder = registry
        .resolve(key)
        .or_else(|| {
            // No exact entry: text-like values may fall back to the
            // registered text encoder.
            if value.as_text().is_some() {
                registry.resolve(TypeKey::Text)
            } else {
                None
            }
        })
        .ok_or_else(|| WireError::Unencodable(value.type_name()))?;
    match encoder(value, registry)? {
        Encoded::Text(raw) => Ok(quote(&raw, mode)),
        Encoded::Literal(lit) => Ok(lit),
    }
}

static BUILTINS: OnceLock<Arc<HashMap<TypeKey, EncodeFn>>> = OnceLock::new();

fn builtins() -> Arc<HashMap<TypeKey, EncodeFn>> {
    BUILTINS
        .get_or_init(|| {
            let mut seed: HashMap<TypeKey, EncodeFn> = HashMap::new();
            seed.insert(TypeKey::Null, Arc::new(encode_null));
            seed.insert(TypeKey::Bool, Arc::new(encode_bool));
            seed.insert(TypeKey::Int, Arc::new(encode_int));
            seed.insert(TypeKey::UInt, Arc::new(encode_uint));
            seed.insert(TypeKey::Float, Arc::new(encode_float));
            seed.insert(TypeKey::Text, Arc::new(encode_text));
            seed.insert(TypeKey::Bytes, Arc::new(encode_bytes));
            seed.insert(TypeKey::Date, Arc::new(encode_date));
            seed.insert(TypeKey::Time, Arc::new(encode_time));
            seed.insert(TypeKey::DateTime, Arc::new(encode_datetime));
            Arc::new(seed)
        })
        .clone()
}

fn mismatch(value: &Value) -> WireError {
    WireError::InvalidValue(format!(
        "encoder invoked with mismatched value of type '{}'",
        value.type_name()
    ))
}

fn encode_null(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Null => Ok(Encoded::Literal("NULL".to_string())),
        other => Err(mismatch(other)),
    }
}

fn encode_bool(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Bool(b) => Ok(Encoded::Literal(if *b { "1" } else { "0" }.to_string())),
        other => Err(mismatch(other)),
    }
}

fn encode_int(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Int(i) => Ok(Encoded::Literal(itoa::Buffer::new().format(*i).to_string())),
        other => Err(mismatch(other)),
    }
}

fn encode_uint(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::UInt(u) => Ok(Encoded::Literal(itoa::Buffer::new().format(*u).to_string())),
        other => Err(mismatch(other)),
    }
}

fn encode_float(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Float(f) if f.is_finite() => {
            Ok(Encoded::Literal(ryu::Buffer::new().format(*f).to_string()))
        }
        Value::Float(_) => Err(WireError::InvalidValue(
            "non-finite float has no SQL literal".to_string(),
        )),
        other => Err(mismatch(other)),
    }
}

fn encode_text(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value.as_text() {
        Some(s) => Ok(Encoded::Text(s.to_string())),
        None => Err(mismatch(value)),
    }
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn encode_bytes(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Bytes(bytes) => {
            // Hex literal: a String cannot carry arbitrary bytes through the
            // quoting policy without corrupting them.
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for b in bytes {
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0f) as usize] as char);
            }
            out.push('\'');
            Ok(Encoded::Literal(out))
        }
        other => Err(mismatch(other)),
    }
}

fn encode_date(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Date(d) => Ok(Encoded::Text(d.format("%Y-%m-%d").to_string())),
        other => Err(mismatch(other)),
    }
}

fn encode_time(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::Time(t) => Ok(Encoded::Text(format_hms(t))),
        other => Err(mismatch(other)),
    }
}

fn encode_datetime(value: &Value, _: &EncoderRegistry) -> WireResult<Encoded> {
    match value {
        Value::DateTime(dt) => Ok(Encoded::Text(format!(
            "{} {}",
            dt.format("%Y-%m-%d"),
            format_hms(&dt.time())
        ))),
        other => Err(mismatch(other)),
    }
}

fn format_hms(t: &NaiveTime) -> String {
    let micros = t.nanosecond() / 1_000;
    if micros == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", t.format("%H:%M:%S"), micros)
    }
}
