//! Error code and message extraction from error responses.

use crate::constants::{
    DEFAULT_ERROR_CODE_FIELDS, DEFAULT_ERROR_MESSAGE_FIELDS, ERROR_TYPE_HEADER,
    ION_ERROR_TYPE_ANNOTATION_PREFIX,
};
use crate::content::RawContent;
use crate::http::HttpResponse;
use crate::WireFormat;

/// Reduces a raw error identifier to the bare code: the text after the last
/// `#` and before the first `:`.
///
/// ```
/// use structured_protocol::sanitize_error_code;
///
/// assert_eq!(sanitize_error_code("com.example#ResourceNotFound"), "ResourceNotFound");
/// assert_eq!(sanitize_error_code("Throttling:http://internal/"), "Throttling");
/// ```
pub fn sanitize_error_code(raw: &str) -> String {
    let after_hash = raw.rsplit('#').next().unwrap_or(raw);
    let code = after_hash.split(':').next().unwrap_or(after_hash);
    code.trim().to_owned()
}

/// How the error code is found in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCodeExtractor {
    /// The first string among `fields` of the root object.
    FieldScan { fields: Vec<String> },
    /// An `aws-type:` annotation on the root value, then a field scan.
    IonComposite { fields: Vec<String> },
}

impl ErrorCodeExtractor {
    /// A configured custom field replaces the default `code`, `__type` scan.
    pub fn for_format(format: WireFormat, custom_field: Option<&str>) -> Self {
        let fields = match custom_field {
            Some(field) => vec![field.to_owned()],
            None => DEFAULT_ERROR_CODE_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
        };
        if format.is_ion() {
            ErrorCodeExtractor::IonComposite { fields }
        } else {
            ErrorCodeExtractor::FieldScan { fields }
        }
    }

    fn from_body(&self, content: &RawContent) -> Option<String> {
        match self {
            ErrorCodeExtractor::FieldScan { fields } => {
                content.parsed().first_str(fields).map(str::to_owned)
            }
            ErrorCodeExtractor::IonComposite { fields } => content
                .annotations()
                .iter()
                .find_map(|a| a.strip_prefix(ION_ERROR_TYPE_ANNOTATION_PREFIX))
                .or_else(|| content.parsed().first_str(fields))
                .map(str::to_owned),
        }
    }

    /// The sanitized error code from the body, else from the
    /// `x-amzn-ErrorType` header.
    pub fn extract(&self, content: &RawContent, response: &HttpResponse) -> Option<String> {
        self.from_body(content)
            .or_else(|| response.header(ERROR_TYPE_HEADER).map(str::to_owned))
            .map(|raw| sanitize_error_code(&raw))
            .filter(|code| !code.is_empty())
    }
}

/// Finds the human-readable message of an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessageParser {
    fields: Vec<String>,
}

impl Default for ErrorMessageParser {
    fn default() -> Self {
        Self::with_fields(DEFAULT_ERROR_MESSAGE_FIELDS)
    }
}

impl ErrorMessageParser {
    /// Searches exactly `fields`, in order.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn parse(&self, content: &RawContent) -> Option<String> {
        content.parsed().first_str(&self.fields).map(str::to_owned)
    }
}
