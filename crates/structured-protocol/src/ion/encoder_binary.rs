//! Ion binary encoder.
//!
//! Every container is buffered until it is closed, because the type
//! descriptor carries the byte length of the body. Field names are interned
//! into a local symbol table which is written ahead of the user values when
//! the stream is finished.

use chrono::{Datelike, Timelike};

use super::constants::{Type, ION_BVM, SID_ION_SYMBOL_TABLE, SID_SYMBOLS};
use super::generator::{IonContainer, IonEncoder, IonScalar};
use super::primitives::{int_bytes, uint_bytes, write_td, write_var_int, write_var_uint};
use super::symbols::LocalSymbols;
use crate::WireFormat;

#[derive(Debug)]
struct OpenContainer {
    container: IonContainer,
    field: Option<usize>,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct IonBinaryEncoder {
    symbols: LocalSymbols,
    stack: Vec<OpenContainer>,
    values: Vec<u8>,
}

impl IonBinaryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn out(&mut self) -> &mut Vec<u8> {
        match self.stack.last_mut() {
            Some(open) => &mut open.body,
            None => &mut self.values,
        }
    }

    fn field_sid(&mut self, field: Option<&str>) -> Option<usize> {
        field.map(|name| self.symbols.intern(name))
    }

    fn emit(&mut self, field: Option<usize>, encoded: &[u8]) {
        let out = self.out();
        if let Some(sid) = field {
            write_var_uint(out, sid as u64);
        }
        out.extend_from_slice(encoded);
    }

    fn symbol_table(&self) -> Vec<u8> {
        let mut list = Vec::new();
        for symbol in self.symbols.symbols() {
            encode_scalar(&mut list, IonScalar::String(symbol));
        }
        let mut fields = Vec::new();
        write_var_uint(&mut fields, SID_SYMBOLS as u64);
        write_td(&mut fields, Type::LIST, list.len());
        fields.extend_from_slice(&list);

        let mut wrapped = Vec::new();
        write_var_uint(&mut wrapped, 1);
        write_var_uint(&mut wrapped, SID_ION_SYMBOL_TABLE as u64);
        write_td(&mut wrapped, Type::STRU, fields.len());
        wrapped.extend_from_slice(&fields);

        let mut out = Vec::new();
        write_td(&mut out, Type::ANNO, wrapped.len());
        out.extend_from_slice(&wrapped);
        out
    }
}

impl IonEncoder for IonBinaryEncoder {
    fn format(&self) -> WireFormat {
        WireFormat::IonBinary
    }

    fn step_in(&mut self, container: IonContainer, field: Option<&str>) {
        let field = self.field_sid(field);
        self.stack.push(OpenContainer {
            container,
            field,
            body: Vec::new(),
        });
    }

    fn step_out(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let ty = match open.container {
            IonContainer::Struct => Type::STRU,
            IonContainer::List => Type::LIST,
        };
        let mut encoded = Vec::with_capacity(open.body.len() + 4);
        write_td(&mut encoded, ty, open.body.len());
        encoded.extend_from_slice(&open.body);
        self.emit(open.field, &encoded);
    }

    fn write_scalar(&mut self, field: Option<&str>, value: IonScalar<'_>) {
        let field = self.field_sid(field);
        let mut encoded = Vec::new();
        encode_scalar(&mut encoded, value);
        self.emit(field, &encoded);
    }

    fn finish(&mut self) -> Vec<u8> {
        let mut out = ION_BVM.to_vec();
        if !self.symbols.is_empty() {
            out.extend_from_slice(&self.symbol_table());
        }
        out.append(&mut self.values);
        self.symbols.clear();
        self.stack.clear();
        out
    }
}

fn encode_scalar(out: &mut Vec<u8>, value: IonScalar<'_>) {
    match value {
        IonScalar::Null => out.push(0x0f),
        IonScalar::Bool(b) => out.push((Type::BOOL << 4) | u8::from(b)),
        IonScalar::Int(int) => {
            let ty = if int < 0 { Type::NINT } else { Type::UINT };
            let magnitude = uint_bytes(int.unsigned_abs());
            write_td(out, ty, magnitude.len());
            out.extend_from_slice(&magnitude);
        }
        IonScalar::Float(float) => {
            write_td(out, Type::FLOT, 8);
            out.extend_from_slice(&float.to_be_bytes());
        }
        IonScalar::Float32(float) => {
            write_td(out, Type::FLOT, 4);
            out.extend_from_slice(&float.to_be_bytes());
        }
        IonScalar::Decimal(decimal) => {
            let mantissa = decimal.mantissa();
            let scale = decimal.scale();
            if mantissa == 0 && scale == 0 {
                out.push(Type::DECI << 4);
                return;
            }
            let mut body = Vec::new();
            write_var_int(&mut body, -i64::from(scale));
            body.extend_from_slice(&int_bytes(mantissa));
            write_td(out, Type::DECI, body.len());
            out.extend_from_slice(&body);
        }
        IonScalar::String(s) => {
            write_td(out, Type::STRI, s.len());
            out.extend_from_slice(s.as_bytes());
        }
        IonScalar::Blob(bytes) => {
            write_td(out, Type::BINA, bytes.len());
            out.extend_from_slice(bytes);
        }
        IonScalar::Timestamp(ts) => {
            let mut body = Vec::new();
            write_var_int(&mut body, 0);
            write_var_uint(&mut body, ts.year() as u64);
            for component in [ts.month(), ts.day(), ts.hour(), ts.minute(), ts.second()] {
                write_var_uint(&mut body, u64::from(component));
            }
            let millis = ts.timestamp_subsec_millis();
            if millis != 0 {
                write_var_int(&mut body, -3);
                body.extend_from_slice(&int_bytes(i128::from(millis)));
            }
            write_td(out, Type::TIME, body.len());
            out.extend_from_slice(&body);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn scalar(value: IonScalar<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        encode_scalar(&mut out, value);
        out
    }

    #[test]
    fn scalar_layouts() {
        assert_eq!(scalar(IonScalar::Null), vec![0x0f]);
        assert_eq!(scalar(IonScalar::Bool(true)), vec![0x11]);
        assert_eq!(scalar(IonScalar::Int(0)), vec![0x20]);
        assert_eq!(scalar(IonScalar::Int(-300)), vec![0x32, 0x01, 0x2c]);
        assert_eq!(scalar(IonScalar::String("hi")), vec![0x82, b'h', b'i']);
        assert_eq!(scalar(IonScalar::Blob(&[1, 2])), vec![0xa2, 1, 2]);
        assert_eq!(
            scalar(IonScalar::Decimal(&Decimal::new(-15, 1))),
            vec![0x52, 0xc1, 0x8f]
        );
        assert_eq!(scalar(IonScalar::Decimal(&Decimal::ZERO)), vec![0x50]);
    }

    #[test]
    fn timestamp_layout() {
        let ts = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            scalar(IonScalar::Timestamp(&ts)),
            vec![0x68, 0x80, 0x0f, 0xe4, 0x81, 0x82, 0x83, 0x84, 0x85]
        );
    }

    #[test]
    fn struct_with_symbol_table() {
        let mut encoder = IonBinaryEncoder::new();
        encoder.step_in(IonContainer::Struct, None);
        encoder.write_scalar(Some("a"), IonScalar::Int(1));
        encoder.step_out();
        let bytes = encoder.finish();
        assert_eq!(&bytes[..4], &ION_BVM);
        // $ion_symbol_table::{symbols:["a"]}
        assert_eq!(
            &bytes[4..12],
            &[0xe7, 0x81, 0x83, 0xd4, 0x87, 0xb2, 0x81, b'a']
        );
        assert_eq!(&bytes[12..], &[0xd3, 0x8a, 0x21, 0x01]);
    }
}
