//! Crate-level error types.
//!
//! Writer-side problems surface as [`EncodingFailure`], reader-side problems as
//! [`DecodeError`] (per node) and [`ResponseDecodeFailure`] (per response).
//! Nothing here is retried or logged; callers decide what is retryable.

use thiserror::Error;

use crate::cbor::CborError;
use crate::ion::IonError;
use crate::WireFormat;

/// Why a write call was rejected.
#[derive(Debug, Error)]
pub enum EncodeCause {
    #[error("writer already produced its bytes")]
    WriterFinished,
    #[error("field name written outside of an object")]
    FieldNameOutsideObject,
    #[error("value written inside an object without a field name")]
    MissingFieldName,
    #[error("field name written while another field name is pending")]
    UnexpectedFieldName,
    #[error("end marker does not match the open container")]
    MismatchedEnd,
    #[error("{0} container(s) left open")]
    UnbalancedContainers(usize),
    #[error("json serialization: {0}")]
    Json(#[from] serde_json::Error),
}

/// Any failure inside a structured writer.
#[derive(Debug, Error)]
#[error("failed to encode {format} payload: {cause}")]
pub struct EncodingFailure {
    pub format: WireFormat,
    #[source]
    pub cause: EncodeCause,
}

impl EncodingFailure {
    pub fn new(format: WireFormat, cause: impl Into<EncodeCause>) -> Self {
        Self {
            format,
            cause: cause.into(),
        }
    }
}

/// Failure to turn a parsed node (or raw bytes) into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CBOR: {0}")]
    Cbor(#[from] CborError),
    #[error("invalid Ion: {0}")]
    Ion(#[from] IonError),
    #[error("no scalar unmarshaller registered for `{0}`")]
    UnregisteredType(&'static str),
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("value `{value}` out of range for {target}")]
    OutOfRange { target: &'static str, value: String },
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error("missing required field `{0}`")]
    MissingField(String),
}

impl DecodeError {
    pub(crate) fn mismatch(expected: &'static str, found: &crate::WireValue) -> Self {
        DecodeError::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }
}

/// A response body could not be decoded into the shape it was matched to.
///
/// Distinct from "no error shape matched", which cannot happen because the
/// base exception kind always matches.
#[derive(Debug, Error)]
#[error("failed to decode {target} from HTTP {status_code} response: {source}")]
pub struct ResponseDecodeFailure {
    pub target: String,
    pub status_code: u16,
    #[source]
    pub source: DecodeError,
}
