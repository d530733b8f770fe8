//! Ion binary decoder.
//!
//! Reads the first user value of a stream into a [`WireValue`]. Local symbol
//! tables and NOP pads before it are consumed; annotations are only kept on
//! the root value.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use structured_protocol_buffers::Reader;

use super::constants::{Type, ION_BVM, L_NULL, L_VARLEN, SID_ION_SYMBOL_TABLE};
use super::primitives::{read_int, read_uint, read_var_int, read_var_uint};
use super::symbols::SymbolTable;
use super::{IonDocument, IonError};
use crate::value::scaled_decimal;
use crate::WireValue;

const MAX_DEPTH: usize = 256;

/// A value as read from the stream; `Pad` is a NOP padding entry.
enum Item {
    Pad,
    Value {
        annotations: Vec<usize>,
        value: WireValue,
    },
}

#[derive(Debug, Default)]
pub struct IonBinaryDecoder {
    symbols: SymbolTable,
}

impl IonBinaryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Result<IonDocument, IonError> {
        if !bytes.starts_with(&ION_BVM) {
            return Err(IonError::InvalidBvm);
        }
        self.symbols.reset();
        let mut reader = Reader::new(bytes);
        reader.skip(ION_BVM.len())?;
        while !reader.is_empty() {
            if reader.peek()? == ION_BVM[0] && reader.uint8[reader.x..].starts_with(&ION_BVM) {
                reader.skip(ION_BVM.len())?;
                self.symbols.reset();
                continue;
            }
            let Item::Value { annotations, value } = self.read_item(&mut reader, 0)? else {
                continue;
            };
            if annotations.first() == Some(&SID_ION_SYMBOL_TABLE) {
                if let WireValue::Object(fields) = value {
                    self.install_symbol_table(fields);
                    continue;
                }
            }
            let annotations = annotations
                .into_iter()
                .map(|sid| self.symbols.resolve(sid))
                .collect::<Result<_, _>>()?;
            return Ok(IonDocument { annotations, value });
        }
        Err(IonError::NoValue)
    }

    fn install_symbol_table(&mut self, fields: Vec<(String, WireValue)>) {
        let mut append = false;
        let mut symbols = Vec::new();
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("imports", WireValue::Str(import)) => append = import == "$ion_symbol_table",
                ("symbols", WireValue::Array(items)) => {
                    symbols = items
                        .into_iter()
                        .map(|item| match item {
                            WireValue::Str(text) => Some(text),
                            _ => None,
                        })
                        .collect();
                }
                _ => {}
            }
        }
        self.symbols.install(symbols, append);
    }

    fn read_item(&self, reader: &mut Reader<'_>, depth: usize) -> Result<Item, IonError> {
        if depth > MAX_DEPTH {
            return Err(IonError::TooDeep(MAX_DEPTH));
        }
        let td = reader.u8()?;
        let (ty, l) = (td >> 4, td & 0x0f);
        if ty == Type::ANNO {
            if l == L_NULL || l < 3 {
                return Err(IonError::InvalidTypeDescriptor(td));
            }
            let len = read_length(reader, l)?;
            let mut body = reader.cut(len)?;
            let annot_len = read_var_uint(&mut body)? as usize;
            let mut annot = body.cut(annot_len)?;
            let mut annotations = Vec::new();
            while !annot.is_empty() {
                annotations.push(read_var_uint(&mut annot)? as usize);
            }
            return match self.read_item(&mut body, depth)? {
                Item::Pad => Err(IonError::InvalidTypeDescriptor(td)),
                Item::Value { value, .. } => Ok(Item::Value { annotations, value }),
            };
        }
        if ty == Type::NULL && l != L_NULL {
            let len = read_length(reader, l)?;
            reader.skip(len)?;
            return Ok(Item::Pad);
        }
        let value = self.read_value(reader, td, depth)?;
        Ok(Item::Value {
            annotations: Vec::new(),
            value,
        })
    }

    fn read_value(
        &self,
        reader: &mut Reader<'_>,
        td: u8,
        depth: usize,
    ) -> Result<WireValue, IonError> {
        let (ty, l) = (td >> 4, td & 0x0f);
        if l == L_NULL {
            return if ty <= Type::STRU {
                Ok(WireValue::Null)
            } else {
                Err(IonError::InvalidTypeDescriptor(td))
            };
        }
        match ty {
            Type::BOOL => match l {
                0 => Ok(WireValue::Bool(false)),
                1 => Ok(WireValue::Bool(true)),
                _ => Err(IonError::InvalidTypeDescriptor(td)),
            },
            Type::UINT => {
                let len = read_length(reader, l)?;
                let body = reader.buf(len)?;
                integer(i128::try_from(read_uint(body)?).map_err(|_| IonError::IntTooLarge)?)
            }
            Type::NINT => {
                let len = read_length(reader, l)?;
                let body = reader.buf(len)?;
                let magnitude = read_uint(body)?;
                if magnitude == 0 {
                    return Err(IonError::NegativeZero);
                }
                let magnitude = i128::try_from(magnitude).map_err(|_| IonError::IntTooLarge)?;
                integer(-magnitude)
            }
            Type::FLOT => {
                let len = read_length(reader, l)?;
                match len {
                    0 => Ok(WireValue::Float(0.0)),
                    4 => Ok(WireValue::Float(f64::from(reader.f32()?))),
                    8 => Ok(WireValue::Float(reader.f64()?)),
                    _ => Err(IonError::InvalidTypeDescriptor(td)),
                }
            }
            Type::DECI => {
                let len = read_length(reader, l)?;
                let mut body = reader.cut(len)?;
                if body.is_empty() {
                    return Ok(WireValue::Decimal(Decimal::ZERO));
                }
                let exponent = read_var_int(&mut body)?.unwrap_or(0);
                let coefficient = read_int(body.buf(body.size())?)?;
                decimal(coefficient, exponent).map(WireValue::Decimal)
            }
            Type::TIME => {
                let len = read_length(reader, l)?;
                timestamp(&mut reader.cut(len)?).map(WireValue::Timestamp)
            }
            Type::SYMB => {
                let len = read_length(reader, l)?;
                let body = reader.buf(len)?;
                let sid = usize::try_from(read_uint(body)?).map_err(|_| IonError::IntTooLarge)?;
                self.symbols.resolve(sid).map(WireValue::Str)
            }
            Type::STRI => {
                let len = read_length(reader, l)?;
                Ok(WireValue::Str(reader.utf8(len)?.to_owned()))
            }
            Type::CLOB | Type::BINA => {
                let len = read_length(reader, l)?;
                Ok(WireValue::Bytes(reader.buf(len)?.to_vec()))
            }
            Type::LIST | Type::SEXP => {
                let len = read_length(reader, l)?;
                let mut body = reader.cut(len)?;
                let mut items = Vec::new();
                while !body.is_empty() {
                    if let Item::Value { value, .. } = self.read_item(&mut body, depth + 1)? {
                        items.push(value);
                    }
                }
                Ok(WireValue::Array(items))
            }
            Type::STRU => {
                // L=1 marks a sorted struct whose length follows as a VarUInt.
                let len = if l == 1 {
                    read_var_uint(reader)? as usize
                } else {
                    read_length(reader, l)?
                };
                let mut body = reader.cut(len)?;
                let mut fields = Vec::new();
                while !body.is_empty() {
                    let sid = read_var_uint(&mut body)? as usize;
                    if let Item::Value { value, .. } = self.read_item(&mut body, depth + 1)? {
                        fields.push((self.symbols.resolve(sid)?, value));
                    }
                }
                Ok(WireValue::Object(fields))
            }
            _ => Err(IonError::InvalidTypeDescriptor(td)),
        }
    }
}

fn read_length(reader: &mut Reader<'_>, l: u8) -> Result<usize, IonError> {
    if l == L_VARLEN {
        Ok(read_var_uint(reader)? as usize)
    } else {
        Ok(usize::from(l))
    }
}

pub(crate) fn integer(value: i128) -> Result<WireValue, IonError> {
    if let Ok(int) = i64::try_from(value) {
        Ok(WireValue::Integer(int))
    } else if let Ok(uint) = u64::try_from(value) {
        Ok(WireValue::UInteger(uint))
    } else {
        Ok(WireValue::BigInt(value))
    }
}

pub(crate) fn decimal(coefficient: i128, exponent: i64) -> Result<Decimal, IonError> {
    scaled_decimal(coefficient, i128::from(exponent)).ok_or(IonError::DecimalOutOfRange)
}

/// Components after the offset are optional; missing ones default to the
/// start of the period.
fn timestamp(body: &mut Reader<'_>) -> Result<DateTime<Utc>, IonError> {
    let invalid = |what: &str| IonError::InvalidTimestamp(what.to_owned());
    let _offset = read_var_int(body)?;
    let year = read_var_uint(body)?;
    let mut parts = [1u64, 1, 0, 0, 0];
    for part in parts.iter_mut() {
        if body.is_empty() {
            break;
        }
        *part = read_var_uint(body)?;
    }
    let mut nanos: u32 = 0;
    if !body.is_empty() {
        let exponent = read_var_int(body)?.unwrap_or(0);
        let coefficient = read_int(body.buf(body.size())?)?;
        let fraction = decimal(coefficient, exponent).map_err(|_| invalid("fraction"))?;
        let scaled = fraction
            .checked_mul(Decimal::from(1_000_000_000u32))
            .ok_or_else(|| invalid("fraction"))?;
        nanos = scaled
            .trunc()
            .to_u32()
            .filter(|n| *n < 1_000_000_000)
            .ok_or_else(|| invalid("fraction"))?;
    }
    let narrow = |v: u64| u32::try_from(v).map_err(|_| invalid("component"));
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).map_err(|_| invalid("year"))?,
        narrow(parts[0])?,
        narrow(parts[1])?,
    )
    .ok_or_else(|| invalid("date"))?;
    let time = date
        .and_hms_nano_opt(narrow(parts[2])?, narrow(parts[3])?, narrow(parts[4])?, nanos)
        .ok_or_else(|| invalid("time"))?;
    Ok(time.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn decode(bytes: &[u8]) -> Result<IonDocument, IonError> {
        IonBinaryDecoder::new().decode(bytes)
    }

    fn with_bvm(body: &[u8]) -> Vec<u8> {
        let mut out = ION_BVM.to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn reads_struct_through_local_symbols() {
        let bytes = with_bvm(&[
            0xe7, 0x81, 0x83, 0xd4, 0x87, 0xb2, 0x81, b'a', // symbol table
            0xd3, 0x8a, 0x21, 0x01,
        ]);
        let doc = decode(&bytes).unwrap();
        assert!(doc.annotations.is_empty());
        assert_eq!(
            doc.value,
            WireValue::Object(vec![("a".into(), WireValue::Integer(1))])
        );
    }

    #[test]
    fn keeps_root_annotations() {
        // symbols: ["aws-type:Boom"]; value: 'aws-type:Boom'::{}
        let mut bytes = with_bvm(&[0xee, 0x95, 0x81, 0x83, 0xde, 0x91, 0x87, 0xbe, 0x8e, 0x8d]);
        bytes.extend_from_slice(b"aws-type:Boom");
        bytes.extend_from_slice(&[0xe3, 0x81, 0x8a, 0xd0]);
        let doc = decode(&bytes).unwrap();
        assert_eq!(doc.annotations, vec!["aws-type:Boom".to_owned()]);
        assert_eq!(doc.value, WireValue::empty_object());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(decode(&[0x01]), Err(IonError::InvalidBvm));
        assert_eq!(decode(&with_bvm(&[])), Err(IonError::NoValue));
        assert_eq!(decode(&with_bvm(&[0x30])), Err(IonError::NegativeZero));
        assert_eq!(decode(&with_bvm(&[0x82, b'a'])), Err(IonError::EndOfInput));
        assert_eq!(decode(&with_bvm(&[0x71, 0x0b])), Err(IonError::UnknownSymbol(11)));
    }

    #[test]
    fn skips_padding_and_reads_scalars() {
        let doc = decode(&with_bvm(&[0x01, 0x00, 0x32, 0x01, 0x2c])).unwrap();
        assert_eq!(doc.value, WireValue::Integer(-300));
        let ts = decode(&with_bvm(&[
            0x6a, 0x80, 0x0f, 0xe4, 0x81, 0x82, 0x83, 0x84, 0x85, 0xc3, 0x07,
        ]))
        .unwrap();
        assert_eq!(
            ts.value,
            WireValue::Timestamp(
                Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
                    + chrono::Duration::milliseconds(7)
            )
        );
    }
}
