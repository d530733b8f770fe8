//! CBOR bytes to [`WireValue`].

use chrono::{TimeZone, Utc};
use structured_protocol_buffers::Reader;

use super::constants::*;
use super::CborError;
use crate::value::scaled_decimal;
use crate::WireValue;

/// Maximum container nesting accepted from the wire.
pub const MAX_DEPTH: usize = 256;

/// Decodes one CBOR data item into a [`WireValue`].
///
/// Understands the tags the generator emits (epoch date/time, bignums,
/// decimal fractions) and the self-describe tag; other tags are dropped and
/// their content kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborDecoder;

/// Decodes a complete CBOR payload.
pub fn decode(bytes: &[u8]) -> Result<WireValue, CborError> {
    CborDecoder::new().decode(bytes)
}

enum Head {
    Item(u64),
    Indefinite,
}

impl CborDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes exactly one item; trailing bytes are an error.
    pub fn decode(&self, bytes: &[u8]) -> Result<WireValue, CborError> {
        let mut reader = Reader::new(bytes);
        let value = self.read_any(&mut reader, 0)?;
        if !reader.is_empty() {
            return Err(CborError::TrailingBytes(reader.size()));
        }
        Ok(value)
    }

    fn read_head(&self, reader: &mut Reader<'_>, minor: u8) -> Result<Head, CborError> {
        Ok(match minor {
            0..=23 => Head::Item(u64::from(minor)),
            24 => Head::Item(u64::from(reader.u8()?)),
            25 => Head::Item(u64::from(reader.u16()?)),
            26 => Head::Item(u64::from(reader.u32()?)),
            27 => Head::Item(reader.u64()?),
            MINOR_INDEFINITE => Head::Indefinite,
            _ => return Err(CborError::UnexpectedMinor(minor)),
        })
    }

    fn read_arg(&self, reader: &mut Reader<'_>, minor: u8) -> Result<u64, CborError> {
        match self.read_head(reader, minor)? {
            Head::Item(arg) => Ok(arg),
            Head::Indefinite => Err(CborError::UnexpectedMinor(minor)),
        }
    }

    fn read_len(&self, arg: u64) -> Result<usize, CborError> {
        usize::try_from(arg).map_err(|_| CborError::InvalidSize(arg))
    }

    fn at_break(&self, reader: &mut Reader<'_>) -> Result<bool, CborError> {
        if reader.peek()? == CBOR_END {
            reader.u8()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn read_any(&self, reader: &mut Reader<'_>, depth: usize) -> Result<WireValue, CborError> {
        if depth > MAX_DEPTH {
            return Err(CborError::TooDeep(MAX_DEPTH));
        }
        let octet = reader.u8()?;
        let major = octet >> 5;
        let minor = octet & MINOR_MASK;
        match major {
            MAJOR_UIN => {
                let uint = self.read_arg(reader, minor)?;
                Ok(match i64::try_from(uint) {
                    Ok(int) => WireValue::Integer(int),
                    Err(_) => WireValue::UInteger(uint),
                })
            }
            MAJOR_NIN => {
                let uint = self.read_arg(reader, minor)?;
                Ok(match i64::try_from(uint) {
                    Ok(int) => WireValue::Integer(-1 - int),
                    Err(_) => WireValue::BigInt(-1 - i128::from(uint)),
                })
            }
            MAJOR_BIN => Ok(WireValue::Bytes(self.read_bytes(reader, MAJOR_BIN, minor)?)),
            MAJOR_STR => {
                let bytes = self.read_bytes(reader, MAJOR_STR, minor)?;
                String::from_utf8(bytes)
                    .map(WireValue::Str)
                    .map_err(|_| CborError::InvalidUtf8)
            }
            MAJOR_ARR => {
                let mut items = Vec::new();
                match self.read_head(reader, minor)? {
                    Head::Item(len) => {
                        for _ in 0..len {
                            items.push(self.read_any(reader, depth + 1)?);
                        }
                    }
                    Head::Indefinite => {
                        while !self.at_break(reader)? {
                            items.push(self.read_any(reader, depth + 1)?);
                        }
                    }
                }
                Ok(WireValue::Array(items))
            }
            MAJOR_MAP => {
                let mut fields = Vec::new();
                match self.read_head(reader, minor)? {
                    Head::Item(len) => {
                        for _ in 0..len {
                            fields.push(self.read_field(reader, depth)?);
                        }
                    }
                    Head::Indefinite => {
                        while !self.at_break(reader)? {
                            fields.push(self.read_field(reader, depth)?);
                        }
                    }
                }
                Ok(WireValue::Object(fields))
            }
            MAJOR_TAG => {
                let tag = self.read_arg(reader, minor)?;
                let inner = self.read_any(reader, depth + 1)?;
                self.apply_tag(tag, inner)
            }
            _ => self.read_token(reader, minor),
        }
    }

    fn read_field(
        &self,
        reader: &mut Reader<'_>,
        depth: usize,
    ) -> Result<(String, WireValue), CborError> {
        let key = match self.read_any(reader, depth + 1)? {
            WireValue::Str(key) => key,
            _ => return Err(CborError::UnexpectedObjKey),
        };
        let value = self.read_any(reader, depth + 1)?;
        Ok((key, value))
    }

    fn read_bytes(
        &self,
        reader: &mut Reader<'_>,
        major: u8,
        minor: u8,
    ) -> Result<Vec<u8>, CborError> {
        match self.read_head(reader, minor)? {
            Head::Item(len) => Ok(reader.buf(self.read_len(len)?)?.to_vec()),
            Head::Indefinite => {
                let mut out = Vec::new();
                while !self.at_break(reader)? {
                    let octet = reader.u8()?;
                    if octet >> 5 != major {
                        return Err(CborError::UnexpectedChunkMajor(octet >> 5));
                    }
                    let len = self.read_arg(reader, octet & MINOR_MASK)?;
                    out.extend_from_slice(reader.buf(self.read_len(len)?)?);
                }
                Ok(out)
            }
        }
    }

    fn read_token(&self, reader: &mut Reader<'_>, minor: u8) -> Result<WireValue, CborError> {
        Ok(match minor {
            20 => WireValue::Bool(false),
            21 => WireValue::Bool(true),
            22 | 23 => WireValue::Null,
            24 => {
                reader.u8()?;
                WireValue::Null
            }
            25 => WireValue::Float(reader.f16()?),
            26 => WireValue::Float(f64::from(reader.f32()?)),
            27 => WireValue::Float(reader.f64()?),
            MINOR_INDEFINITE => return Err(CborError::UnexpectedBreak),
            0..=19 => WireValue::Null,
            _ => return Err(CborError::UnexpectedMinor(minor)),
        })
    }

    fn apply_tag(&self, tag: u64, inner: WireValue) -> Result<WireValue, CborError> {
        match (tag, inner) {
            (TAG_EPOCH_DATETIME, WireValue::Integer(secs)) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(WireValue::Timestamp)
                .ok_or(CborError::InvalidTimestamp),
            (TAG_EPOCH_DATETIME, WireValue::Float(secs)) if secs.is_finite() => Utc
                .timestamp_millis_opt((secs * 1000.0).round() as i64)
                .single()
                .map(WireValue::Timestamp)
                .ok_or(CborError::InvalidTimestamp),
            (TAG_EPOCH_DATETIME, _) => Err(CborError::InvalidTimestamp),
            (TAG_POSITIVE_BIGNUM, WireValue::Bytes(bytes)) => {
                let magnitude =
                    i128::try_from(bignum(&bytes)?).map_err(|_| CborError::BignumTooLarge)?;
                Ok(bignum_value(magnitude))
            }
            (TAG_NEGATIVE_BIGNUM, WireValue::Bytes(bytes)) => {
                let magnitude =
                    i128::try_from(bignum(&bytes)?).map_err(|_| CborError::BignumTooLarge)?;
                Ok(bignum_value(-1 - magnitude))
            }
            (TAG_DECIMAL_FRACTION, WireValue::Array(parts)) => decimal_fraction(&parts),
            (_, inner) => Ok(inner),
        }
    }
}

fn bignum(bytes: &[u8]) -> Result<u128, CborError> {
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if significant.len() > 16 {
        return Err(CborError::BignumTooLarge);
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

fn bignum_value(int: i128) -> WireValue {
    match i64::try_from(int) {
        Ok(small) => WireValue::Integer(small),
        Err(_) => WireValue::BigInt(int),
    }
}

fn decimal_fraction(parts: &[WireValue]) -> Result<WireValue, CborError> {
    let as_i128 = |value: &WireValue| match value {
        WireValue::Integer(i) => Some(i128::from(*i)),
        WireValue::UInteger(u) => Some(i128::from(*u)),
        WireValue::BigInt(i) => Some(*i),
        _ => None,
    };
    let (exponent, mantissa) = match parts {
        [e, m] => (
            as_i128(e).ok_or(CborError::DecimalOutOfRange)?,
            as_i128(m).ok_or(CborError::DecimalOutOfRange)?,
        ),
        _ => return Err(CborError::DecimalOutOfRange),
    };
    let decimal = scaled_decimal(mantissa, exponent).ok_or(CborError::DecimalOutOfRange)?;
    Ok(WireValue::Decimal(decimal))
}
