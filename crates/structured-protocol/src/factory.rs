//! Wire format selection and the per-request and per-response objects bound
//! to it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{FeatureSettings, ProtocolConfig};
use crate::exception::{
    ErrorCodeExtractor, ErrorMessageParser, ErrorResponseReader, ErrorShape, ErrorShapeTable,
};
use crate::generator::StructuredWriter;
use crate::http::{OperationInfo, ResponseShape};
use crate::marshall::RequestMarshaller;
use crate::unmarshall::{ScalarUnmarshallerRegistry, SuccessResponseReader};
use crate::WireFormat;

/// The orthogonal switches the wire format is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureFlags {
    /// The client supports CBOR and it is not disabled process-wide.
    pub cbor: bool,
    /// The client supports Ion.
    pub ion: bool,
    /// Ion is used in its binary encoding. Never set without `ion`.
    pub ion_binary: bool,
}

impl FeatureFlags {
    /// Combines what the client supports with the process-wide settings.
    pub fn resolve(config: &ProtocolConfig, settings: &FeatureSettings) -> Self {
        let ion = config.supports_ion();
        Self {
            cbor: config.supports_cbor() && settings.cbor_enabled,
            ion,
            ion_binary: ion && settings.ion_binary_enabled,
        }
    }

    /// CBOR wins over Ion; Ion binary is used unless disabled.
    ///
    /// ```
    /// use structured_protocol::{FeatureFlags, WireFormat};
    ///
    /// let flags = FeatureFlags { cbor: false, ion: true, ion_binary: false };
    /// assert_eq!(flags.select_format(), WireFormat::IonText);
    /// ```
    pub fn select_format(self) -> WireFormat {
        if self.cbor {
            WireFormat::Cbor
        } else if self.ion && self.ion_binary {
            WireFormat::IonBinary
        } else if self.ion {
            WireFormat::IonText
        } else {
            WireFormat::PlainJson
        }
    }

    /// Eligible for both CBOR and Ion; CBOR is used.
    pub fn is_ambiguous(self) -> bool {
        self.cbor && self.ion
    }
}

/// Everything that must agree on the wire format, chosen together.
#[derive(Debug, Clone)]
pub struct ProtocolBinding {
    format: WireFormat,
    content_type_prefix: &'static str,
    code_extractor: ErrorCodeExtractor,
    registry: Arc<ScalarUnmarshallerRegistry>,
}

impl ProtocolBinding {
    /// Derives every format-dependent collaborator from `format`.
    pub fn new(format: WireFormat, custom_error_code_field: Option<&str>) -> Self {
        Self {
            format,
            content_type_prefix: format.content_type_prefix(),
            code_extractor: ErrorCodeExtractor::for_format(format, custom_error_code_field),
            registry: ScalarUnmarshallerRegistry::for_format(format),
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// The `Content-Type` up to, but excluding, the protocol version.
    pub fn content_type_prefix(&self) -> &'static str {
        self.content_type_prefix
    }

    /// Reads error codes the way this format carries them.
    pub fn code_extractor(&self) -> &ErrorCodeExtractor {
        &self.code_extractor
    }

    /// Scalar unmarshallers for bodies in this format.
    pub fn registry(&self) -> &Arc<ScalarUnmarshallerRegistry> {
        &self.registry
    }
}

/// Error shapes declared by one operation. They are tried before the
/// service-level shapes.
#[derive(Debug, Clone, Default)]
pub struct ErrorResponseMetadata {
    error_shapes: Vec<ErrorShape>,
}

impl ErrorResponseMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shape; earlier shapes take precedence.
    pub fn with_error_shape(mut self, shape: ErrorShape) -> Self {
        self.error_shapes.push(shape);
        self
    }

    pub fn error_shapes(&self) -> &[ErrorShape] {
        &self.error_shapes
    }
}

/// Builds writers and readers for one client, all bound to the same wire
/// format for the factory's lifetime.
#[derive(Debug, Clone)]
pub struct ProtocolFactory {
    config: ProtocolConfig,
    flags: FeatureFlags,
    binding: ProtocolBinding,
    message_parser: ErrorMessageParser,
}

impl ProtocolFactory {
    /// Selects the wire format once. Logs a warning when the client supports
    /// both CBOR and Ion.
    pub fn new(config: ProtocolConfig, settings: FeatureSettings) -> Self {
        let flags = FeatureFlags::resolve(&config, &settings);
        let format = flags.select_format();
        if flags.is_ambiguous() {
            warn!(%format, "client supports both CBOR and Ion, using CBOR");
        }
        debug!(
            %format,
            cbor = flags.cbor,
            ion = flags.ion,
            ion_binary = flags.ion_binary,
            "selected wire format"
        );
        let binding = ProtocolBinding::new(format, config.custom_error_code_field());
        let message_parser = match config.error_message_fields() {
            Some(fields) => ErrorMessageParser::with_fields(fields.iter().cloned()),
            None => ErrorMessageParser::default(),
        };
        Self {
            config,
            flags,
            binding,
            message_parser,
        }
    }

    /// Uses the process environment for the feature settings.
    pub fn from_env(config: ProtocolConfig) -> Self {
        Self::new(config, FeatureSettings::from_env())
    }

    /// The wire format every writer and reader from this factory uses.
    pub fn format(&self) -> WireFormat {
        self.binding.format
    }

    /// The flags the format was selected from.
    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn binding(&self) -> &ProtocolBinding {
        &self.binding
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// A writer for the request body, or a no-op writer when the operation
    /// sends none.
    pub fn create_request_writer(&self, operation: &OperationInfo) -> StructuredWriter {
        if operation.has_payload_members || operation.protocol.wraps_empty_payload() {
            StructuredWriter::for_format(self.binding.format)
        } else {
            StructuredWriter::noop(self.binding.format)
        }
    }

    /// The configured override, or the format prefix followed by the
    /// operation's protocol version.
    pub fn resolve_content_type(&self, operation: &OperationInfo) -> String {
        match self.config.content_type_override() {
            Some(content_type) => content_type.to_owned(),
            None => format!(
                "{}{}",
                self.binding.content_type_prefix, operation.protocol_version
            ),
        }
    }

    /// A marshaller pairing the request writer with its content type.
    pub fn create_request_marshaller(&self, operation: &OperationInfo) -> RequestMarshaller {
        RequestMarshaller::new(
            self.create_request_writer(operation),
            self.resolve_content_type(operation),
        )
    }

    /// A reader for 2xx responses of an operation with `shape`.
    pub fn create_success_reader(&self, shape: ResponseShape) -> SuccessResponseReader {
        SuccessResponseReader::new(shape, self.binding.format, self.binding.registry.clone())
    }

    /// A reader matching error responses against the operation's shapes,
    /// then the service shapes, then the base exception.
    pub fn create_error_reader(&self, metadata: &ErrorResponseMetadata) -> ErrorResponseReader {
        let table = ErrorShapeTable::layered(
            metadata.error_shapes(),
            self.config.error_shapes(),
            self.config.base_exception(),
        );
        ErrorResponseReader::new(
            self.binding.format,
            self.binding.registry.clone(),
            table,
            self.binding.code_extractor.clone(),
            self.message_parser.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Protocol;

    fn factory(cbor: bool, ion: bool, settings: FeatureSettings) -> ProtocolFactory {
        let config = ProtocolConfig::builder()
            .supports_cbor(cbor)
            .supports_ion(ion)
            .build();
        ProtocolFactory::new(config, settings)
    }

    #[test]
    fn settings_gate_binary_formats() {
        let no_cbor = FeatureSettings {
            cbor_enabled: false,
            ..FeatureSettings::default()
        };
        assert_eq!(factory(true, false, no_cbor).format(), WireFormat::PlainJson);
        assert_eq!(factory(true, true, no_cbor).format(), WireFormat::IonBinary);
        let no_ion_binary = FeatureSettings {
            ion_binary_enabled: false,
            ..FeatureSettings::default()
        };
        assert_eq!(factory(false, true, no_ion_binary).format(), WireFormat::IonText);
        assert_eq!(factory(true, true, FeatureSettings::default()).format(), WireFormat::Cbor);
    }

    #[test]
    fn writer_and_content_type() {
        let factory = factory(true, false, FeatureSettings::default());
        let rest = OperationInfo::new(Protocol::RestJson, "1.1").with_payload_members(false);
        assert!(factory.create_request_writer(&rest).is_noop());
        let rpc = OperationInfo::new(Protocol::AwsJson, "1.1").with_payload_members(false);
        assert_eq!(factory.create_request_writer(&rpc).format(), WireFormat::Cbor);
        assert_eq!(factory.resolve_content_type(&rpc), "application/x-amz-cbor-1.1");
    }

    #[test]
    fn content_type_override_wins() {
        let config = ProtocolConfig::builder()
            .content_type_override("application/json")
            .build();
        let factory = ProtocolFactory::new(config, FeatureSettings::default());
        let operation = OperationInfo::new(Protocol::RestJson, "1.0");
        assert_eq!(factory.resolve_content_type(&operation), "application/json");
    }

    #[test]
    fn factory_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolFactory>();
        assert_send_sync::<ErrorResponseReader>();
        assert_send_sync::<SuccessResponseReader>();
    }
}
