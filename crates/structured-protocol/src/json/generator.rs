//! Streaming RFC 8259 generator.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{EncodeCause, EncodingFailure};
use crate::generator::{Nesting, Slot, StructuredGenerator};
use crate::WireFormat;

/// Writes JSON text directly into an output buffer.
///
/// Blobs become base64 strings, timestamps epoch seconds with a millisecond
/// fraction, and non-finite floats the strings `"NaN"`, `"Infinity"` and
/// `"-Infinity"`.
#[derive(Debug, Default)]
pub struct JsonGenerator {
    out: Vec<u8>,
    nesting: Nesting,
}

impl JsonGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(cause: impl Into<EncodeCause>) -> EncodingFailure {
        EncodingFailure::new(WireFormat::PlainJson, cause)
    }

    fn begin_value(&mut self) -> Result<(), EncodingFailure> {
        let slot = self.nesting.value().map_err(Self::fail)?;
        self.separate(slot);
        Ok(())
    }

    fn separate(&mut self, slot: Slot) {
        match slot {
            Slot::Item(index) | Slot::Root(index) if index > 0 => self.out.push(b','),
            _ => {}
        }
    }

    fn raw(&mut self, text: &str) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.out.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn quoted(&mut self, text: &str) -> Result<(), EncodingFailure> {
        serde_json::to_writer(&mut self.out, text).map_err(Self::fail)
    }
}

/// Epoch seconds with up to millisecond precision, e.g. `1577836800.123`.
pub(crate) fn epoch_seconds(value: &DateTime<Utc>) -> String {
    let millis = value.timestamp_millis();
    let sign = if millis < 0 { "-" } else { "" };
    let abs = millis.unsigned_abs();
    let (secs, frac) = (abs / 1000, abs % 1000);
    if frac == 0 {
        format!("{sign}{secs}")
    } else {
        let frac = format!("{frac:03}");
        format!("{sign}{secs}.{}", frac.trim_end_matches('0'))
    }
}

impl StructuredGenerator for JsonGenerator {
    fn format(&self) -> WireFormat {
        WireFormat::PlainJson
    }

    fn write_start_object(&mut self) -> Result<(), EncodingFailure> {
        let slot = self.nesting.start_object().map_err(Self::fail)?;
        self.separate(slot);
        self.out.push(b'{');
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_object().map_err(Self::fail)?;
        self.out.push(b'}');
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), EncodingFailure> {
        let slot = self.nesting.start_array().map_err(Self::fail)?;
        self.separate(slot);
        self.out.push(b'[');
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_array().map_err(Self::fail)?;
        self.out.push(b']');
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), EncodingFailure> {
        let index = self.nesting.field_name().map_err(Self::fail)?;
        if index > 0 {
            self.out.push(b',');
        }
        self.quoted(name)?;
        self.out.push(b':');
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), EncodingFailure> {
        self.raw("null")
    }

    fn write_str(&mut self, value: &str) -> Result<(), EncodingFailure> {
        self.begin_value()?;
        self.quoted(value)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodingFailure> {
        self.raw(if value { "true" } else { "false" })
    }

    fn write_i64(&mut self, value: i64) -> Result<(), EncodingFailure> {
        self.raw(&value.to_string())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), EncodingFailure> {
        self.raw(&value.to_string())
    }

    fn write_big_int(&mut self, value: i128) -> Result<(), EncodingFailure> {
        self.raw(&value.to_string())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), EncodingFailure> {
        if !value.is_finite() {
            return self.write_f64(f64::from(value));
        }
        self.begin_value()?;
        serde_json::to_writer(&mut self.out, &value).map_err(Self::fail)
    }

    fn write_f64(&mut self, value: f64) -> Result<(), EncodingFailure> {
        if value.is_nan() {
            return self.write_str("NaN");
        }
        if value.is_infinite() {
            return self.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
        }
        self.begin_value()?;
        serde_json::to_writer(&mut self.out, &value).map_err(Self::fail)
    }

    fn write_decimal(&mut self, value: &Decimal) -> Result<(), EncodingFailure> {
        self.raw(&value.to_string())
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodingFailure> {
        self.write_str(&STANDARD.encode(value))
    }

    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> Result<(), EncodingFailure> {
        self.raw(&epoch_seconds(value))
    }

    fn finish(&mut self) -> Result<Bytes, EncodingFailure> {
        self.nesting.finish().map_err(Self::fail)?;
        Ok(Bytes::from(std::mem::take(&mut self.out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encode(f: impl FnOnce(&mut JsonGenerator) -> Result<(), EncodingFailure>) -> String {
        let mut generator = JsonGenerator::new();
        f(&mut generator).unwrap();
        String::from_utf8(generator.finish().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn nested_containers_get_separators() {
        let text = encode(|g| {
            g.write_start_object()?;
            g.write_field_name("a")?;
            g.write_start_array()?;
            g.write_i64(1)?;
            g.write_str("x\"y")?;
            g.write_start_object()?;
            g.write_end_object()?;
            g.write_end_array()?;
            g.write_field_name("b")?;
            g.write_null()?;
            g.write_end_object()
        });
        assert_eq!(text, r#"{"a":[1,"x\"y",{}],"b":null}"#);
    }

    #[test]
    fn special_scalars() {
        let text = encode(|g| {
            g.write_start_array()?;
            g.write_f64(f64::NAN)?;
            g.write_f64(f64::NEG_INFINITY)?;
            g.write_f64(1.5)?;
            g.write_bytes(b"hi")?;
            g.write_decimal(&Decimal::new(-12345, 3))?;
            g.write_big_int(i128::from(u64::MAX) + 1)?;
            g.write_end_array()
        });
        assert_eq!(
            text,
            r#"["NaN","-Infinity",1.5,"aGk=",-12.345,18446744073709551616]"#
        );
    }

    #[test]
    fn timestamps_as_epoch_seconds() {
        let whole = Utc.timestamp_millis_opt(1_577_836_800_000).unwrap();
        let fractional = Utc.timestamp_millis_opt(1_577_836_800_120).unwrap();
        let negative = Utc.timestamp_millis_opt(-1_500).unwrap();
        assert_eq!(epoch_seconds(&whole), "1577836800");
        assert_eq!(epoch_seconds(&fractional), "1577836800.12");
        assert_eq!(epoch_seconds(&negative), "-1.5");
    }

    #[test]
    fn unbalanced_payload_is_rejected() {
        let mut generator = JsonGenerator::new();
        generator.write_start_object().unwrap();
        let err = generator.finish().unwrap_err();
        assert!(matches!(err.cause, EncodeCause::UnbalancedContainers(1)));
    }
}
