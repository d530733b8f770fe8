use std::any::type_name;
use std::sync::Arc;

use super::{ScalarUnmarshallerRegistry, Unmarshall, UnmarshallContext};
use crate::content::parse_body;
use crate::error::ResponseDecodeFailure;
use crate::http::{HttpResponse, ResponseShape};
use crate::{WireFormat, WireValue};

/// Reads a 2xx response into its output shape.
#[derive(Debug, Clone)]
pub struct SuccessResponseReader {
    shape: ResponseShape,
    format: WireFormat,
    registry: Arc<ScalarUnmarshallerRegistry>,
}

impl SuccessResponseReader {
    pub fn new(
        shape: ResponseShape,
        format: WireFormat,
        registry: Arc<ScalarUnmarshallerRegistry>,
    ) -> Self {
        Self {
            shape,
            format,
            registry,
        }
    }

    pub fn shape(&self) -> ResponseShape {
        self.shape
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Decodes `response` into `T`.
    ///
    /// A streamed or unstructured body is left to the caller: the shape is
    /// read from an empty object and can still pick up headers and the
    /// status code. A structured body must parse.
    pub fn read<T: Unmarshall>(
        &self,
        response: &HttpResponse,
    ) -> Result<T, ResponseDecodeFailure> {
        let failure = |source| ResponseDecodeFailure {
            target: type_name::<T>().to_owned(),
            status_code: response.status_code,
            source,
        };
        let skip_body =
            self.shape.has_streaming_success_response || !self.shape.is_payload_structured;
        let node = if skip_body {
            WireValue::empty_object()
        } else {
            parse_body(self.format, response.body.as_deref())
                .map_err(failure)?
                .value
        };
        let json_registry = ScalarUnmarshallerRegistry::json();
        let cx = UnmarshallContext::new(&self.registry, &json_registry, self.format, response);
        T::unmarshall(&cx, &node).map_err(failure)
    }
}
