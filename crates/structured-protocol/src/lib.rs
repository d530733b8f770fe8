//! Structured wire-format codec layer.
//!
//! Turns typed requests into bytes on one of four interchangeable encodings
//! (JSON text, CBOR, Ion text, Ion binary) and reads HTTP responses, error
//! responses included, back into typed values.
//!
//! A [`ProtocolFactory`] picks the encoding once from [`FeatureFlags`] and
//! hands out everything bound to it:
//!
//! - [`StructuredWriter`] / [`RequestMarshaller`] for request bodies, paired
//!   with the matching `Content-Type`
//! - [`SuccessResponseReader`] for 2xx responses
//! - [`ErrorResponseReader`] for everything else, which matches the response
//!   against an ordered [`ErrorShapeTable`] and decodes a
//!   [`ModeledException`]
//!
//! # Example
//!
//! ```
//! use structured_protocol::{
//!     FeatureSettings, Marshall, OperationInfo, Protocol, ProtocolConfig, ProtocolFactory,
//!     StructuredWriter, EncodingFailure,
//! };
//!
//! struct ListTables {
//!     limit: i32,
//! }
//!
//! impl Marshall for ListTables {
//!     fn marshall(&self, writer: &mut StructuredWriter) -> Result<(), EncodingFailure> {
//!         writer.write_field_name("Limit")?.write_value(self.limit)?;
//!         Ok(())
//!     }
//! }
//!
//! let factory = ProtocolFactory::new(ProtocolConfig::default(), FeatureSettings::default());
//! let operation = OperationInfo::new(Protocol::AwsJson, "1.0");
//! let request = factory
//!     .create_request_marshaller(&operation)
//!     .marshall(&ListTables { limit: 10 })?;
//! assert_eq!(request.content_type, "application/x-amz-json-1.0");
//! assert_eq!(&request.body[..], br#"{"Limit":10}"#);
//! # Ok::<(), EncodingFailure>(())
//! ```

pub mod cbor;
pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod exception;
pub mod factory;
pub mod generator;
pub mod http;
pub mod ion;
pub mod json;
pub mod marshall;
pub mod unmarshall;
pub mod value;

pub use config::{FeatureSettings, ProtocolConfig, ProtocolConfigBuilder};
pub use constants::WireFormat;
pub use content::{parse_body, ParsedBody, RawContent};
pub use error::{DecodeError, EncodeCause, EncodingFailure, ResponseDecodeFailure};
pub use exception::{
    sanitize_error_code, DecodeStrategy, ErrorCodeExtractor, ErrorMessageParser, ErrorMetadata,
    ErrorResponseReader, ErrorShape, ErrorShapeTable, ExceptionBuilder, ExceptionKind,
    ModeledException, ServiceException,
};
pub use factory::{ErrorResponseMetadata, FeatureFlags, ProtocolBinding, ProtocolFactory};
pub use generator::{StructuredGenerator, StructuredWriter, WireScalar};
pub use http::{HttpResponse, OperationInfo, Protocol, ResponseShape};
pub use marshall::{Marshall, MarshalledRequest, RequestMarshaller};
pub use unmarshall::{
    ReaderContext, ScalarFn, ScalarUnmarshallerRegistry, SuccessResponseReader, Unmarshall,
    UnmarshallContext,
};
pub use value::WireValue;
