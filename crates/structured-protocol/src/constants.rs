//! Wire-format identifiers and fixed protocol strings.

use std::fmt;

/// The concrete byte-level encoding used by a protocol factory.
///
/// Exactly one variant is active per factory; see
/// [`crate::FeatureFlags::select_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    PlainJson,
    Cbor,
    IonText,
    IonBinary,
}

impl WireFormat {
    pub const ALL: [WireFormat; 4] = [
        WireFormat::PlainJson,
        WireFormat::Cbor,
        WireFormat::IonText,
        WireFormat::IonBinary,
    ];

    /// `Content-Type` prefix; the protocol version is appended to it.
    pub fn content_type_prefix(self) -> &'static str {
        match self {
            WireFormat::PlainJson => "application/x-amz-json-",
            WireFormat::Cbor => "application/x-amz-cbor-",
            WireFormat::IonText => "text/x-amz-ion-",
            WireFormat::IonBinary => "application/x-amz-ion-",
        }
    }

    pub fn is_ion(self) -> bool {
        matches!(self, WireFormat::IonText | WireFormat::IonBinary)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, WireFormat::Cbor | WireFormat::IonBinary)
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireFormat::PlainJson => "json",
            WireFormat::Cbor => "cbor",
            WireFormat::IonText => "ion-text",
            WireFormat::IonBinary => "ion-binary",
        })
    }
}

/// Environment variable that turns CBOR off process-wide.
pub const CBOR_DISABLE_ENV: &str = "AWS_CBOR_DISABLE";
/// Environment variable that makes Ion clients fall back to Ion text.
pub const ION_BINARY_DISABLE_ENV: &str = "AWS_ION_BINARY_DISABLE";

/// Header carrying the error code when the body does not.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-ErrorType";
/// Headers carrying the service request id, in lookup order.
pub const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-RequestId", "x-amz-request-id"];

/// Ion annotation prefix naming the error type on the root value.
pub const ION_ERROR_TYPE_ANNOTATION_PREFIX: &str = "aws-type:";

/// Body fields scanned for the error code, in order.
pub const DEFAULT_ERROR_CODE_FIELDS: [&str; 2] = ["code", "__type"];
/// Body fields scanned for the error message, in order.
pub const DEFAULT_ERROR_MESSAGE_FIELDS: [&str; 3] = ["message", "Message", "errorMessage"];
