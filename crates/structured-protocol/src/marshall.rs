use bytes::Bytes;

use crate::error::EncodingFailure;
use crate::generator::StructuredWriter;

/// A request shape that can write its payload members.
///
/// Implementations only emit members; the surrounding root object is opened
/// and closed by [`RequestMarshaller`].
pub trait Marshall {
    fn marshall(&self, writer: &mut StructuredWriter) -> Result<(), EncodingFailure>;
}

/// An encoded request body and the `Content-Type` it was encoded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalledRequest {
    pub content_type: String,
    pub body: Bytes,
}

/// Wraps one request's writer together with its content type.
#[derive(Debug)]
pub struct RequestMarshaller {
    writer: StructuredWriter,
    content_type: String,
}

impl RequestMarshaller {
    pub fn new(writer: StructuredWriter, content_type: impl Into<String>) -> Self {
        Self {
            writer,
            content_type: content_type.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn writer(&self) -> &StructuredWriter {
        &self.writer
    }

    pub fn marshall<M: Marshall + ?Sized>(
        mut self,
        input: &M,
    ) -> Result<MarshalledRequest, EncodingFailure> {
        self.writer.write_start_object()?;
        input.marshall(&mut self.writer)?;
        self.writer.write_end_object()?;
        Ok(MarshalledRequest {
            content_type: self.content_type,
            body: self.writer.bytes()?,
        })
    }
}
