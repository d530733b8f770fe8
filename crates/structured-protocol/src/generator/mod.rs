//! Format-agnostic push API for emitting a structured value tree.
//!
//! The writer never builds an intermediate document: every call is encoded
//! straight into the output buffer of the active format. [`StructuredWriter`]
//! is the closed set of writers a [`crate::ProtocolFactory`] can hand out.

mod nesting;
mod scalar;

pub(crate) use nesting::{Nesting, Slot};
pub use scalar::WireScalar;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::cbor::CborGenerator;
use crate::error::{EncodeCause, EncodingFailure};
use crate::ion::IonGenerator;
use crate::json::JsonGenerator;
use crate::WireFormat;

/// One concrete encoding of the structured value tree.
pub trait StructuredGenerator {
    fn format(&self) -> WireFormat;

    fn write_start_object(&mut self) -> Result<(), EncodingFailure>;
    fn write_end_object(&mut self) -> Result<(), EncodingFailure>;
    fn write_start_array(&mut self) -> Result<(), EncodingFailure>;
    fn write_end_array(&mut self) -> Result<(), EncodingFailure>;
    fn write_field_name(&mut self, name: &str) -> Result<(), EncodingFailure>;
    fn write_null(&mut self) -> Result<(), EncodingFailure>;

    fn write_str(&mut self, value: &str) -> Result<(), EncodingFailure>;
    fn write_bool(&mut self, value: bool) -> Result<(), EncodingFailure>;
    fn write_i64(&mut self, value: i64) -> Result<(), EncodingFailure>;
    fn write_u64(&mut self, value: u64) -> Result<(), EncodingFailure>;
    /// Arbitrary-precision integer.
    fn write_big_int(&mut self, value: i128) -> Result<(), EncodingFailure>;
    fn write_f32(&mut self, value: f32) -> Result<(), EncodingFailure>;
    fn write_f64(&mut self, value: f64) -> Result<(), EncodingFailure>;
    fn write_decimal(&mut self, value: &Decimal) -> Result<(), EncodingFailure>;
    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodingFailure>;
    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> Result<(), EncodingFailure>;

    /// Finalizes the payload. Any write afterwards is rejected.
    fn finish(&mut self) -> Result<Bytes, EncodingFailure>;
}

/// Writer used when the operation carries no payload: accepts and drops
/// every call and produces an empty body.
#[derive(Debug)]
pub struct NoopGenerator {
    format: WireFormat,
    finished: bool,
}

impl NoopGenerator {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            finished: false,
        }
    }

    fn accept(&mut self) -> Result<(), EncodingFailure> {
        if self.finished {
            return Err(EncodingFailure::new(self.format, EncodeCause::WriterFinished));
        }
        Ok(())
    }
}

impl StructuredGenerator for NoopGenerator {
    fn format(&self) -> WireFormat {
        self.format
    }

    fn write_start_object(&mut self) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_end_object(&mut self) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_start_array(&mut self) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_end_array(&mut self) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_field_name(&mut self, _: &str) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_null(&mut self) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_str(&mut self, _: &str) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_bool(&mut self, _: bool) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_i64(&mut self, _: i64) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_u64(&mut self, _: u64) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_big_int(&mut self, _: i128) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_f32(&mut self, _: f32) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_f64(&mut self, _: f64) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_decimal(&mut self, _: &Decimal) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_bytes(&mut self, _: &[u8]) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn write_timestamp(&mut self, _: &DateTime<Utc>) -> Result<(), EncodingFailure> {
        self.accept()
    }

    fn finish(&mut self) -> Result<Bytes, EncodingFailure> {
        self.accept()?;
        self.finished = true;
        Ok(Bytes::new())
    }
}

/// The writer handed to the shape-marshalling layer.
///
/// Every method returns the writer again so calls can be chained:
///
/// ```
/// use structured_protocol::{StructuredWriter, WireFormat};
///
/// let mut writer = StructuredWriter::for_format(WireFormat::PlainJson);
/// writer
///     .write_start_object()?
///     .write_field_name("Name")?
///     .write_value("table")?
///     .write_end_object()?;
/// assert_eq!(&writer.bytes()?[..], br#"{"Name":"table"}"#);
/// # Ok::<(), structured_protocol::EncodingFailure>(())
/// ```
#[derive(Debug)]
pub enum StructuredWriter {
    Noop(NoopGenerator),
    Json(JsonGenerator),
    Cbor(CborGenerator),
    Ion(IonGenerator),
}

impl StructuredWriter {
    /// Creates the concrete writer for `format`.
    pub fn for_format(format: WireFormat) -> Self {
        match format {
            WireFormat::PlainJson => StructuredWriter::Json(JsonGenerator::new()),
            WireFormat::Cbor => StructuredWriter::Cbor(CborGenerator::new()),
            WireFormat::IonText => StructuredWriter::Ion(IonGenerator::text()),
            WireFormat::IonBinary => StructuredWriter::Ion(IonGenerator::binary()),
        }
    }

    pub fn noop(format: WireFormat) -> Self {
        StructuredWriter::Noop(NoopGenerator::new(format))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, StructuredWriter::Noop(_))
    }

    pub fn format(&self) -> WireFormat {
        self.generator().format()
    }

    fn generator(&self) -> &dyn StructuredGenerator {
        match self {
            StructuredWriter::Noop(g) => g,
            StructuredWriter::Json(g) => g,
            StructuredWriter::Cbor(g) => g,
            StructuredWriter::Ion(g) => g,
        }
    }

    /// The underlying generator, for code written against the trait.
    pub fn generator_mut(&mut self) -> &mut dyn StructuredGenerator {
        match self {
            StructuredWriter::Noop(g) => g,
            StructuredWriter::Json(g) => g,
            StructuredWriter::Cbor(g) => g,
            StructuredWriter::Ion(g) => g,
        }
    }

    pub fn write_start_object(&mut self) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_start_object()?;
        Ok(self)
    }

    pub fn write_end_object(&mut self) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_end_object()?;
        Ok(self)
    }

    pub fn write_start_array(&mut self) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_start_array()?;
        Ok(self)
    }

    pub fn write_end_array(&mut self) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_end_array()?;
        Ok(self)
    }

    pub fn write_field_name(&mut self, name: &str) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_field_name(name)?;
        Ok(self)
    }

    pub fn write_null(&mut self) -> Result<&mut Self, EncodingFailure> {
        self.generator_mut().write_null()?;
        Ok(self)
    }

    /// Writes any supported scalar; `None` writes null.
    pub fn write_value<T: WireScalar>(&mut self, value: T) -> Result<&mut Self, EncodingFailure> {
        value.write_to(self.generator_mut())?;
        Ok(self)
    }

    /// Takes the encoded payload. The writer rejects every later call.
    pub fn bytes(&mut self) -> Result<Bytes, EncodingFailure> {
        self.generator_mut().finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_writer_produces_empty_body() {
        let mut writer = StructuredWriter::noop(WireFormat::Cbor);
        writer
            .write_start_object()
            .unwrap()
            .write_field_name("x")
            .unwrap()
            .write_value(1i32)
            .unwrap();
        assert!(writer.bytes().unwrap().is_empty());
        let err = writer.write_null().unwrap_err();
        assert!(matches!(err.cause, EncodeCause::WriterFinished));
        assert_eq!(err.format, WireFormat::Cbor);
    }

    #[test]
    fn for_format_matches_requested_format() {
        for format in WireFormat::ALL {
            assert_eq!(StructuredWriter::for_format(format).format(), format);
        }
    }
}
