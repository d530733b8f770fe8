//! Format-independent parsed node produced by every wire decoder.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A decoded structured value.
///
/// JSON, CBOR and Ion decoders all produce this tree so that the scalar
/// unmarshallers and the error-shape matcher never look at raw bytes.
/// Objects keep their wire order; duplicate keys are kept and lookups return
/// the first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Integer(i64),
    UInteger(u64),
    /// Integers outside the 64-bit range (CBOR bignums, large Ion ints).
    BigInt(i128),
    Float(f64),
    Decimal(Decimal),
    /// Numeric lexeme kept verbatim, converted per target type on read.
    Number(String),
    Str(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Array(Vec<WireValue>),
    Object(Vec<(String, WireValue)>),
}

impl Default for WireValue {
    fn default() -> Self {
        WireValue::empty_object()
    }
}

impl WireValue {
    pub fn empty_object() -> Self {
        WireValue::Object(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// Looks up `key` when `self` is an object.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, WireValue)]> {
        match self {
            WireValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the first present string among `keys`.
    pub fn first_str<'a, I, S>(&'a self, keys: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .find_map(|key| self.get(key.as_ref()).and_then(WireValue::as_str))
    }

    /// Short name of the node kind, used in decode error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "boolean",
            WireValue::Integer(_) | WireValue::UInteger(_) | WireValue::BigInt(_) => "integer",
            WireValue::Float(_) => "float",
            WireValue::Decimal(_) => "decimal",
            WireValue::Number(_) => "number",
            WireValue::Str(_) => "string",
            WireValue::Bytes(_) => "blob",
            WireValue::Timestamp(_) => "timestamp",
            WireValue::Array(_) => "array",
            WireValue::Object(_) => "object",
        }
    }
}

/// Largest scale a `Decimal` carries. It also bounds positive exponents:
/// any non-zero coefficient times `10^29` overflows the 96-bit mantissa.
const MAX_DECIMAL_SCALE: u32 = 28;

/// `coefficient * 10^exponent` as a `Decimal`, or `None` when it does not fit.
///
/// Exponents arrive straight off the wire, so the cost must not depend on
/// their size. A zero coefficient is zero at every exponent.
pub(crate) fn scaled_decimal(coefficient: i128, exponent: i128) -> Option<Decimal> {
    let magnitude = exponent.unsigned_abs();
    if coefficient == 0 {
        let scale = if exponent < 0 {
            magnitude.min(u128::from(MAX_DECIMAL_SCALE))
        } else {
            0
        };
        return Decimal::try_from_i128_with_scale(0, u32::try_from(scale).ok()?).ok();
    }
    let magnitude = u32::try_from(magnitude)
        .ok()
        .filter(|m| *m <= MAX_DECIMAL_SCALE)?;
    if exponent <= 0 {
        return Decimal::try_from_i128_with_scale(coefficient, magnitude).ok();
    }
    let base = Decimal::try_from_i128_with_scale(coefficient, 0).ok()?;
    let factor = Decimal::try_from_i128_with_scale(10i128.pow(magnitude), 0).ok()?;
    base.checked_mul(factor)
}
