//! Scalar unmarshallers keyed by target type.
//!
//! Two registries exist, one per format family. The JSON family (text JSON
//! and CBOR) coerces text into typed scalars because JSON has no native
//! bytes or timestamps; the Ion family requires the native Ion types for
//! blobs and timestamps.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::DecodeError;
use crate::value::scaled_decimal;
use crate::{WireFormat, WireValue};

/// Per-read information handed to every scalar unmarshaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderContext {
    pub format: WireFormat,
}

/// Decodes one parsed leaf into `T`.
pub type ScalarFn<T> = fn(&WireValue, ReaderContext) -> Result<T, DecodeError>;

struct Entry {
    type_name: &'static str,
    decode: Box<dyn Any + Send + Sync>,
}

/// Lookup table from target type to its [`ScalarFn`].
///
/// Lookup is by exact type: registering `i64` does not make `i32` readable.
pub struct ScalarUnmarshallerRegistry {
    family: &'static str,
    entries: HashMap<TypeId, Entry>,
}

impl std::fmt::Debug for ScalarUnmarshallerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        types.sort_unstable();
        f.debug_struct("ScalarUnmarshallerRegistry")
            .field("family", &self.family)
            .field("types", &types)
            .finish()
    }
}

impl ScalarUnmarshallerRegistry {
    pub fn empty(family: &'static str) -> Self {
        Self {
            family,
            entries: HashMap::new(),
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Registers (or replaces) the unmarshaller for `T`.
    pub fn register<T: 'static>(&mut self, decode: ScalarFn<T>) -> &mut Self {
        self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: type_name::<T>(),
                decode: Box::new(decode),
            },
        );
        self
    }

    pub fn get<T: 'static>(&self) -> Option<ScalarFn<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.decode.downcast_ref::<ScalarFn<T>>())
            .copied()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn decode<T: 'static>(
        &self,
        node: &WireValue,
        cx: ReaderContext,
    ) -> Result<T, DecodeError> {
        let decode = self
            .get::<T>()
            .ok_or(DecodeError::UnregisteredType(type_name::<T>()))?;
        decode(node, cx)
    }

    /// Shared registry for text JSON and CBOR.
    pub fn json() -> Arc<Self> {
        static JSON: OnceLock<Arc<ScalarUnmarshallerRegistry>> = OnceLock::new();
        JSON.get_or_init(|| Arc::new(Self::build_json())).clone()
    }

    /// Shared registry for both Ion encodings.
    pub fn ion() -> Arc<Self> {
        static ION: OnceLock<Arc<ScalarUnmarshallerRegistry>> = OnceLock::new();
        ION.get_or_init(|| Arc::new(Self::build_ion())).clone()
    }

    pub fn for_format(format: WireFormat) -> Arc<Self> {
        if format.is_ion() {
            Self::ion()
        } else {
            Self::json()
        }
    }

    fn register_common(&mut self) -> &mut Self {
        self.register::<String>(read_string)
            .register::<bool>(read_bool)
            .register::<i8>(read_int::<i8>)
            .register::<i16>(read_int::<i16>)
            .register::<i32>(read_int::<i32>)
            .register::<i64>(read_int::<i64>)
            .register::<i128>(read_int::<i128>)
            .register::<u8>(read_int::<u8>)
            .register::<u16>(read_int::<u16>)
            .register::<u32>(read_int::<u32>)
            .register::<u64>(read_int::<u64>)
            .register::<f32>(read_f32)
            .register::<f64>(read_f64)
            .register::<Decimal>(read_decimal)
    }

    fn build_json() -> Self {
        let mut registry = Self::empty("json");
        registry
            .register_common()
            .register::<Vec<u8>>(read_bytes_or_base64)
            .register::<Bytes>(|node, cx| read_bytes_or_base64(node, cx).map(Bytes::from))
            .register::<DateTime<Utc>>(read_timestamp_coerced);
        registry
    }

    fn build_ion() -> Self {
        let mut registry = Self::empty("ion");
        registry
            .register_common()
            .register::<Vec<u8>>(read_native_bytes)
            .register::<Bytes>(|node, cx| read_native_bytes(node, cx).map(Bytes::from))
            .register::<DateTime<Utc>>(read_native_timestamp);
        registry
    }
}

fn read_string(node: &WireValue, _: ReaderContext) -> Result<String, DecodeError> {
    match node {
        WireValue::Str(s) => Ok(s.clone()),
        other => Err(DecodeError::mismatch("string", other)),
    }
}

fn read_bool(node: &WireValue, _: ReaderContext) -> Result<bool, DecodeError> {
    match node {
        WireValue::Bool(b) => Ok(*b),
        WireValue::Str(s) if s == "true" => Ok(true),
        WireValue::Str(s) if s == "false" => Ok(false),
        other => Err(DecodeError::mismatch("boolean", other)),
    }
}

fn parse_i128(text: &str) -> Result<i128, DecodeError> {
    text.trim()
        .parse::<i128>()
        .map_err(|_| DecodeError::InvalidNumber(text.to_owned()))
}

fn integer_value(node: &WireValue) -> Result<i128, DecodeError> {
    match node {
        WireValue::Integer(i) => Ok(i128::from(*i)),
        WireValue::UInteger(u) => Ok(i128::from(*u)),
        WireValue::BigInt(i) => Ok(*i),
        WireValue::Number(lexeme) | WireValue::Str(lexeme) => parse_i128(lexeme),
        WireValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e38 => Ok(*f as i128),
        WireValue::Decimal(d) if d.fract().is_zero() => d
            .to_i128()
            .ok_or_else(|| DecodeError::InvalidNumber(d.to_string())),
        other => Err(DecodeError::mismatch("integer", other)),
    }
}

fn read_int<T>(node: &WireValue, _: ReaderContext) -> Result<T, DecodeError>
where
    T: TryFrom<i128> + 'static,
{
    let value = integer_value(node)?;
    T::try_from(value).map_err(|_| DecodeError::OutOfRange {
        target: type_name::<T>(),
        value: value.to_string(),
    })
}

fn parse_f64(text: &str) -> Result<f64, DecodeError> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => text
            .trim()
            .parse::<f64>()
            .map_err(|_| DecodeError::InvalidNumber(text.to_owned())),
    }
}

fn read_f64(node: &WireValue, _: ReaderContext) -> Result<f64, DecodeError> {
    match node {
        WireValue::Float(f) => Ok(*f),
        WireValue::Integer(i) => Ok(*i as f64),
        WireValue::UInteger(u) => Ok(*u as f64),
        WireValue::BigInt(i) => Ok(*i as f64),
        WireValue::Decimal(d) => d
            .to_f64()
            .ok_or_else(|| DecodeError::InvalidNumber(d.to_string())),
        WireValue::Number(lexeme) | WireValue::Str(lexeme) => parse_f64(lexeme),
        other => Err(DecodeError::mismatch("float", other)),
    }
}

fn read_f32(node: &WireValue, cx: ReaderContext) -> Result<f32, DecodeError> {
    let value = read_f64(node, cx)?;
    let narrowed = value as f32;
    if value.is_finite() && narrowed.is_infinite() {
        return Err(DecodeError::OutOfRange {
            target: "f32",
            value: value.to_string(),
        });
    }
    Ok(narrowed)
}

fn parse_decimal(text: &str) -> Result<Decimal, DecodeError> {
    let text = text.trim();
    let invalid = || DecodeError::InvalidNumber(text.to_owned());
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (
            &text[..at],
            text[at + 1..].parse::<i128>().map_err(|_| invalid())?,
        ),
        None => (text, 0),
    };
    let mantissa = Decimal::from_str(mantissa).map_err(|_| invalid())?;
    let exponent = exponent
        .checked_sub(i128::from(mantissa.scale()))
        .ok_or_else(invalid)?;
    scaled_decimal(mantissa.mantissa(), exponent).ok_or_else(invalid)
}

fn read_decimal(node: &WireValue, _: ReaderContext) -> Result<Decimal, DecodeError> {
    match node {
        WireValue::Decimal(d) => Ok(*d),
        WireValue::Integer(i) => Ok(Decimal::from(*i)),
        WireValue::UInteger(u) => Ok(Decimal::from(*u)),
        WireValue::BigInt(i) => Decimal::try_from_i128_with_scale(*i, 0).map_err(|_| {
            DecodeError::OutOfRange {
                target: "Decimal",
                value: i.to_string(),
            }
        }),
        WireValue::Float(f) => Decimal::try_from(*f).map_err(|_| DecodeError::OutOfRange {
            target: "Decimal",
            value: f.to_string(),
        }),
        WireValue::Number(lexeme) | WireValue::Str(lexeme) => parse_decimal(lexeme),
        other => Err(DecodeError::mismatch("decimal", other)),
    }
}

fn read_bytes_or_base64(node: &WireValue, _: ReaderContext) -> Result<Vec<u8>, DecodeError> {
    match node {
        WireValue::Bytes(bytes) => Ok(bytes.clone()),
        WireValue::Str(text) => Ok(STANDARD.decode(text)?),
        other => Err(DecodeError::mismatch("blob", other)),
    }
}

fn read_native_bytes(node: &WireValue, _: ReaderContext) -> Result<Vec<u8>, DecodeError> {
    match node {
        WireValue::Bytes(bytes) => Ok(bytes.clone()),
        other => Err(DecodeError::mismatch("blob", other)),
    }
}

/// Epoch seconds with up to millisecond precision.
fn from_epoch_seconds(seconds: Decimal) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || DecodeError::InvalidTimestamp(seconds.to_string());
    let millis = seconds
        .checked_mul(Decimal::ONE_THOUSAND)
        .ok_or_else(invalid)?
        .round()
        .to_i64()
        .ok_or_else(invalid)?;
    Utc.timestamp_millis_opt(millis).single().ok_or_else(invalid)
}

/// Parses an ISO-8601 / RFC 3339 date-time, an HTTP date, or epoch seconds.
fn parse_timestamp_text(text: &str) -> Result<DateTime<Utc>, DecodeError> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    match parse_decimal(text) {
        Ok(seconds) => from_epoch_seconds(seconds),
        Err(_) => Err(DecodeError::InvalidTimestamp(text.to_owned())),
    }
}

fn read_timestamp_coerced(
    node: &WireValue,
    cx: ReaderContext,
) -> Result<DateTime<Utc>, DecodeError> {
    match node {
        WireValue::Timestamp(ts) => Ok(*ts),
        WireValue::Str(text) => parse_timestamp_text(text),
        WireValue::Integer(_)
        | WireValue::UInteger(_)
        | WireValue::BigInt(_)
        | WireValue::Float(_)
        | WireValue::Decimal(_)
        | WireValue::Number(_) => from_epoch_seconds(read_decimal(node, cx)?),
        other => Err(DecodeError::mismatch("timestamp", other)),
    }
}

fn read_native_timestamp(
    node: &WireValue,
    _: ReaderContext,
) -> Result<DateTime<Utc>, DecodeError> {
    match node {
        WireValue::Timestamp(ts) => Ok(*ts),
        other => Err(DecodeError::mismatch("timestamp", other)),
    }
}
