//! The narrow view of operations and HTTP responses this crate works with.

use bytes::Bytes;

/// Request serialization protocol of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// RPC style: every request carries a structured body, at least `{}`.
    AwsJson,
    /// REST style: members may bind to the URI, headers or the body.
    RestJson,
}

impl Protocol {
    /// Whether an operation without payload members still sends an object.
    pub fn wraps_empty_payload(self) -> bool {
        matches!(self, Protocol::AwsJson)
    }
}

/// What the factory needs to know about an operation to pick its writer
/// and content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    /// At least one input member binds to the body.
    pub has_payload_members: bool,
    pub protocol: Protocol,
    /// Appended to the format's content-type prefix, e.g. `1.1`.
    pub protocol_version: String,
}

impl OperationInfo {
    /// An operation with payload members; see
    /// [`OperationInfo::with_payload_members`] for bodiless ones.
    pub fn new(protocol: Protocol, protocol_version: impl Into<String>) -> Self {
        Self {
            has_payload_members: true,
            protocol,
            protocol_version: protocol_version.into(),
        }
    }

    pub fn with_payload_members(mut self, has_payload_members: bool) -> Self {
        self.has_payload_members = has_payload_members;
        self
    }
}

/// How an operation's success response body is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// The success body is a stream handed to the caller untouched.
    pub has_streaming_success_response: bool,
    /// The success body is a structured document to parse.
    pub is_payload_structured: bool,
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self {
            has_streaming_success_response: false,
            is_payload_structured: true,
        }
    }
}

/// A downloaded HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    headers: Vec<(String, String)>,
    /// `None` when the response carried no body at all.
    pub body: Option<Bytes>,
}

impl HttpResponse {
    /// A response with no headers and no body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// Appends a header; repeated names are kept in order.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive lookup; the first header with that name wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers in the order they were added.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Status in `200..300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse::new(400)
            .with_header("X-Amzn-RequestId", "abc")
            .with_header("x-amzn-requestid", "def");
        assert_eq!(response.header("x-amzn-RequestId"), Some("abc"));
        assert_eq!(response.header("missing"), None);
        assert!(!response.is_success());
        assert!(HttpResponse::new(204).is_success());
    }
}
