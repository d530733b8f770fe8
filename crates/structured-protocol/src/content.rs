//! Response bodies and their lazily parsed tree.

use std::cell::OnceCell;

use bytes::Bytes;
use tracing::debug;

use crate::error::DecodeError;
use crate::{cbor, ion, json, WireFormat, WireValue};

/// A parsed body: the root value and, for Ion, its annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedBody {
    pub value: WireValue,
    pub annotations: Vec<String>,
}

/// Parses a complete body in `format`. An absent or empty body is an empty
/// object; anything else must be a well-formed document.
pub fn parse_body(format: WireFormat, bytes: Option<&[u8]>) -> Result<ParsedBody, DecodeError> {
    let bytes = match bytes {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Ok(ParsedBody::default()),
    };
    match format {
        WireFormat::PlainJson => Ok(ParsedBody {
            value: json::parse(bytes)?,
            annotations: Vec::new(),
        }),
        WireFormat::Cbor => Ok(ParsedBody {
            value: cbor::decode(bytes)?,
            annotations: Vec::new(),
        }),
        // The server may answer in either Ion encoding.
        WireFormat::IonText | WireFormat::IonBinary => {
            let document = ion::decode(bytes)?;
            Ok(ParsedBody {
                value: document.value,
                annotations: document.annotations,
            })
        }
    }
}

/// The raw bytes of a response together with a tree parsed on first use.
///
/// Parsing never fails from the caller's point of view: a body that is
/// missing, empty or malformed reads as an empty object, so error-shape
/// matching always has something to look at.
#[derive(Debug)]
pub struct RawContent {
    format: WireFormat,
    raw_bytes: Option<Bytes>,
    parsed: OnceCell<ParsedBody>,
}

impl RawContent {
    pub fn new(format: WireFormat, raw_bytes: Option<Bytes>) -> Self {
        Self {
            format,
            raw_bytes,
            parsed: OnceCell::new(),
        }
    }

    pub fn raw_bytes(&self) -> Option<&Bytes> {
        self.raw_bytes.as_ref()
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    fn body(&self) -> &ParsedBody {
        self.parsed.get_or_init(|| {
            parse_body(self.format, self.raw_bytes.as_deref()).unwrap_or_else(|err| {
                debug!(
                    format = %self.format,
                    error = %err,
                    "unparseable response body, reading as empty object"
                );
                ParsedBody::default()
            })
        })
    }

    pub fn parsed(&self) -> &WireValue {
        &self.body().value
    }

    /// Annotations on the root value; only Ion bodies carry any.
    pub fn annotations(&self) -> &[String] {
        &self.body().annotations
    }
}
