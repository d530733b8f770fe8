//! Scalar types accepted by [`super::StructuredWriter::write_value`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::StructuredGenerator;
use crate::error::EncodingFailure;

/// A leaf value that every generator knows how to encode.
pub trait WireScalar {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure>;
}

impl<T: WireScalar + ?Sized> WireScalar for &T {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        (**self).write_to(generator)
    }
}

impl<T: WireScalar> WireScalar for Option<T> {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        match self {
            Some(value) => value.write_to(generator),
            None => generator.write_null(),
        }
    }
}

impl WireScalar for str {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_str(self)
    }
}

impl WireScalar for String {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_str(self)
    }
}

impl WireScalar for bool {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_bool(*self)
    }
}

macro_rules! signed_scalar {
    ($($ty:ty),*) => {$(
        impl WireScalar for $ty {
            fn write_to(
                &self,
                generator: &mut dyn StructuredGenerator,
            ) -> Result<(), EncodingFailure> {
                generator.write_i64(i64::from(*self))
            }
        }
    )*};
}

macro_rules! unsigned_scalar {
    ($($ty:ty),*) => {$(
        impl WireScalar for $ty {
            fn write_to(
                &self,
                generator: &mut dyn StructuredGenerator,
            ) -> Result<(), EncodingFailure> {
                generator.write_u64(u64::from(*self))
            }
        }
    )*};
}

signed_scalar!(i8, i16, i32, i64);
unsigned_scalar!(u8, u16, u32, u64);

impl WireScalar for i128 {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_big_int(*self)
    }
}

impl WireScalar for f32 {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_f32(*self)
    }
}

impl WireScalar for f64 {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_f64(*self)
    }
}

impl WireScalar for Decimal {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_decimal(self)
    }
}

impl WireScalar for [u8] {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_bytes(self)
    }
}

impl WireScalar for Vec<u8> {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_bytes(self)
    }
}

impl WireScalar for Bytes {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_bytes(self)
    }
}

impl WireScalar for DateTime<Utc> {
    fn write_to(&self, generator: &mut dyn StructuredGenerator) -> Result<(), EncodingFailure> {
        generator.write_timestamp(self)
    }
}
