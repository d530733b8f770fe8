//! Streaming CBOR generator.
//!
//! Objects and arrays are written as indefinite-length items so that no
//! member count is needed up front; scalars use the shortest definite header.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use structured_protocol_buffers::Writer;

use super::constants::*;
use crate::error::{EncodeCause, EncodingFailure};
use crate::generator::{Nesting, StructuredGenerator};
use crate::WireFormat;

#[derive(Debug, Default)]
pub struct CborGenerator {
    writer: Writer,
    nesting: Nesting,
}

impl CborGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(cause: EncodeCause) -> EncodingFailure {
        EncodingFailure::new(WireFormat::Cbor, cause)
    }

    fn begin_value(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.value().map(|_| ()).map_err(Self::fail)
    }

    /// Writes a major type with the shortest argument encoding.
    fn write_hdr(&mut self, major: u8, arg: u64) {
        let overlay = major << 5;
        let w = &mut self.writer;
        if arg <= 23 {
            w.u8(overlay | arg as u8);
        } else if arg <= 0xff {
            w.u8(overlay | 24);
            w.u8(arg as u8);
        } else if arg <= 0xffff {
            w.u8(overlay | 25);
            w.u16(arg as u16);
        } else if arg <= 0xffff_ffff {
            w.u8(overlay | 26);
            w.u32(arg as u32);
        } else {
            w.u8(overlay | 27);
            w.u64(arg);
        }
    }

    fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_hdr(MAJOR_UIN, int as u64);
        } else {
            self.write_hdr(MAJOR_NIN, (-1i64).wrapping_sub(int) as u64);
        }
    }

    fn write_big(&mut self, int: i128) {
        if let Ok(small) = i64::try_from(int) {
            self.write_integer(small);
        } else if let Ok(uint) = u64::try_from(int) {
            self.write_hdr(MAJOR_UIN, uint);
        } else if int < 0 && -1 - int <= i128::from(u64::MAX) {
            self.write_hdr(MAJOR_NIN, (-1 - int) as u64);
        } else {
            let (tag, magnitude) = if int >= 0 {
                (TAG_POSITIVE_BIGNUM, int as u128)
            } else {
                (TAG_NEGATIVE_BIGNUM, (-1 - int) as u128)
            };
            let bytes = magnitude.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            self.write_hdr(MAJOR_TAG, tag);
            self.write_hdr(MAJOR_BIN, (bytes.len() - skip) as u64);
            self.writer.buf(&bytes[skip..]);
        }
    }

    fn write_float(&mut self, float: f64) {
        if is_f32_roundtrip(float) {
            self.writer.u8f32(CBOR_F32, float as f32);
        } else {
            self.writer.u8f64(CBOR_F64, float);
        }
    }

    fn write_text(&mut self, s: &str) {
        self.write_hdr(MAJOR_STR, s.len() as u64);
        self.writer.utf8(s);
    }
}

impl StructuredGenerator for CborGenerator {
    fn format(&self) -> WireFormat {
        WireFormat::Cbor
    }

    fn write_start_object(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.start_object().map_err(Self::fail)?;
        self.writer.u8(CBOR_START_MAP);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_object().map_err(Self::fail)?;
        self.writer.u8(CBOR_END);
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.start_array().map_err(Self::fail)?;
        self.writer.u8(CBOR_START_ARR);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_array().map_err(Self::fail)?;
        self.writer.u8(CBOR_END);
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), EncodingFailure> {
        self.nesting.field_name().map_err(Self::fail)?;
        self.write_text(name);
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.writer.u8(CBOR_NULL);
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_text(value);
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.writer.u8(if value { CBOR_TRUE } else { CBOR_FALSE });
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_integer(value);
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_hdr(MAJOR_UIN, value);
        Ok(())
    }

    fn write_big_int(&mut self, value: i128) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_big(value);
        Ok(())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.writer.u8f32(CBOR_F32, value);
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_float(value);
        Ok(())
    }

    fn write_decimal(&mut self, value: &Decimal) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_hdr(MAJOR_TAG, TAG_DECIMAL_FRACTION);
        self.write_hdr(MAJOR_ARR, 2);
        self.write_integer(-i64::from(value.scale()));
        self.write_big(value.mantissa());
        Ok(())
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_hdr(MAJOR_BIN, value.len() as u64);
        self.writer.buf(value);
        Ok(())
    }

    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.write_hdr(MAJOR_TAG, TAG_EPOCH_DATETIME);
        let millis = value.timestamp_millis();
        if millis % 1000 == 0 {
            self.write_integer(millis / 1000);
        } else {
            self.writer.u8f64(CBOR_F64, millis as f64 / 1000.0);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Bytes, EncodingFailure> {
        self.nesting.finish().map_err(Self::fail)?;
        Ok(Bytes::from(self.writer.flush()))
    }
}
