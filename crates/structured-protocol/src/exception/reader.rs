use std::sync::Arc;

use tracing::debug;

use super::{ErrorCodeExtractor, ErrorMessageParser, ErrorShapeTable, ModeledException};
use crate::constants::REQUEST_ID_HEADERS;
use crate::content::RawContent;
use crate::error::ResponseDecodeFailure;
use crate::http::HttpResponse;
use crate::unmarshall::{ScalarUnmarshallerRegistry, UnmarshallContext};
use crate::WireFormat;

/// Turns a non-2xx response into the best-matching modeled exception.
#[derive(Debug, Clone)]
pub struct ErrorResponseReader {
    format: WireFormat,
    registry: Arc<ScalarUnmarshallerRegistry>,
    table: ErrorShapeTable,
    code_extractor: ErrorCodeExtractor,
    message_parser: ErrorMessageParser,
}

impl ErrorResponseReader {
    pub fn new(
        format: WireFormat,
        registry: Arc<ScalarUnmarshallerRegistry>,
        table: ErrorShapeTable,
        code_extractor: ErrorCodeExtractor,
        message_parser: ErrorMessageParser,
    ) -> Self {
        Self {
            format,
            registry,
            table,
            code_extractor,
            message_parser,
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn table(&self) -> &ErrorShapeTable {
        &self.table
    }

    /// Matches and decodes the exception for `response`.
    ///
    /// A body that does not parse reads as an empty object, so some
    /// exception is always produced; only a matched shape rejecting the
    /// node is an error.
    pub fn read(
        &self,
        response: &HttpResponse,
    ) -> Result<Box<dyn ModeledException>, ResponseDecodeFailure> {
        let content = RawContent::new(self.format, response.body.clone());
        let error_code = self.code_extractor.extract(&content, response);
        let kind = self.table.resolve(error_code.as_deref(), response.status_code);

        let json_registry = ScalarUnmarshallerRegistry::json();
        let cx = UnmarshallContext::new(&self.registry, &json_registry, self.format, response);
        let mut exception = kind
            .decode(&cx, content.parsed())
            .map_err(|source| ResponseDecodeFailure {
                target: kind.name().to_owned(),
                status_code: response.status_code,
                source,
            })?;

        let metadata = exception.metadata_mut();
        metadata.error_code = error_code;
        metadata.message = self.message_parser.parse(&content);
        metadata.status_code = response.status_code;
        metadata.exception_name = kind.name().to_owned();
        metadata.request_id = REQUEST_ID_HEADERS
            .iter()
            .find_map(|name| response.header(name))
            .map(str::to_owned);
        debug!(
            exception = kind.name(),
            error_code = ?metadata.error_code,
            status_code = response.status_code,
            "decoded error response"
        );
        Ok(exception)
    }
}
