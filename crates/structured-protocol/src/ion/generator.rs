//! Ion writer shared by the text and binary encodings.
//!
//! Ion containers are entered and left explicitly and a field name is not
//! written on its own: it travels with the next value. [`IonGenerator`] turns
//! the flat writer calls into that model and delegates the bytes to an
//! [`IonEncoder`].

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{IonBinaryEncoder, IonTextEncoder};
use crate::error::{EncodeCause, EncodingFailure};
use crate::generator::{Nesting, StructuredGenerator};
use crate::WireFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IonContainer {
    Struct,
    List,
}

/// A scalar in Ion's own type system.
#[derive(Debug, Clone, Copy)]
pub enum IonScalar<'a> {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Float32(f32),
    Decimal(&'a Decimal),
    String(&'a str),
    Blob(&'a [u8]),
    Timestamp(&'a DateTime<Utc>),
}

/// Byte-level Ion encoding driven by [`IonGenerator`].
///
/// Calls arrive well-formed: the generator has already validated nesting and
/// paired every struct member with its field name.
pub trait IonEncoder: fmt::Debug + Send {
    fn format(&self) -> WireFormat;
    fn step_in(&mut self, container: IonContainer, field: Option<&str>);
    fn step_out(&mut self);
    fn write_scalar(&mut self, field: Option<&str>, value: IonScalar<'_>);
    /// Returns the complete stream and resets the encoder.
    fn finish(&mut self) -> Vec<u8>;
}

#[derive(Debug)]
pub struct IonGenerator {
    encoder: Box<dyn IonEncoder>,
    nesting: Nesting,
    pending_field: Option<String>,
}

impl IonGenerator {
    pub fn with_encoder(encoder: Box<dyn IonEncoder>) -> Self {
        Self {
            encoder,
            nesting: Nesting::default(),
            pending_field: None,
        }
    }

    pub fn text() -> Self {
        Self::with_encoder(Box::new(IonTextEncoder::new()))
    }

    pub fn binary() -> Self {
        Self::with_encoder(Box::new(IonBinaryEncoder::new()))
    }

    fn fail(&self, cause: EncodeCause) -> EncodingFailure {
        EncodingFailure::new(self.encoder.format(), cause)
    }

    fn scalar(&mut self, value: IonScalar<'_>) -> Result<(), EncodingFailure> {
        self.nesting.value().map_err(|cause| self.fail(cause))?;
        let field = self.pending_field.take();
        self.encoder.write_scalar(field.as_deref(), value);
        Ok(())
    }

    fn step_in(&mut self, container: IonContainer) -> Result<(), EncodingFailure> {
        let started = match container {
            IonContainer::Struct => self.nesting.start_object(),
            IonContainer::List => self.nesting.start_array(),
        };
        started.map_err(|cause| self.fail(cause))?;
        let field = self.pending_field.take();
        self.encoder.step_in(container, field.as_deref());
        Ok(())
    }
}

impl StructuredGenerator for IonGenerator {
    fn format(&self) -> WireFormat {
        self.encoder.format()
    }

    fn write_start_object(&mut self) -> Result<(), EncodingFailure> {
        self.step_in(IonContainer::Struct)
    }

    fn write_end_object(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_object().map_err(|cause| self.fail(cause))?;
        self.encoder.step_out();
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), EncodingFailure> {
        self.step_in(IonContainer::List)
    }

    fn write_end_array(&mut self) -> Result<(), EncodingFailure> {
        self.nesting.end_array().map_err(|cause| self.fail(cause))?;
        self.encoder.step_out();
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), EncodingFailure> {
        self.nesting.field_name().map_err(|cause| self.fail(cause))?;
        self.pending_field = Some(name.to_owned());
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Null)
    }

    fn write_str(&mut self, value: &str) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::String(value))
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Bool(value))
    }

    fn write_i64(&mut self, value: i64) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Int(i128::from(value)))
    }

    fn write_u64(&mut self, value: u64) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Int(i128::from(value)))
    }

    fn write_big_int(&mut self, value: i128) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Int(value))
    }

    fn write_f32(&mut self, value: f32) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Float32(value))
    }

    fn write_f64(&mut self, value: f64) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Float(value))
    }

    fn write_decimal(&mut self, value: &Decimal) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Decimal(value))
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Blob(value))
    }

    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> Result<(), EncodingFailure> {
        self.scalar(IonScalar::Timestamp(value))
    }

    fn finish(&mut self) -> Result<Bytes, EncodingFailure> {
        self.nesting.finish().map_err(|cause| self.fail(cause))?;
        Ok(Bytes::from(self.encoder.finish()))
    }
}
