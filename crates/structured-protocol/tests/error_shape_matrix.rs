//! Error-shape precedence, fallbacks and metadata extraction across formats.

use bytes::Bytes;
use structured_protocol::{
    DecodeError, ErrorMetadata, ErrorResponseMetadata, ErrorShape, ExceptionBuilder,
    ExceptionKind, FeatureSettings, HttpResponse, ModeledException, ProtocolConfig,
    ProtocolConfigBuilder, ProtocolFactory, ServiceException, StructuredWriter, Unmarshall,
    UnmarshallContext, WireFormat, WireValue,
};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Modeled exceptions
// ---------------------------------------------------------------------------

macro_rules! modeled {
    ($name:ident { $($field:ident: $ty:ty),* }) => {
        #[derive(Debug, Default, Error)]
        #[error("{metadata}")]
        struct $name {
            metadata: ErrorMetadata,
            $($field: $ty,)*
        }

        impl ModeledException for $name {
            fn metadata(&self) -> &ErrorMetadata {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut ErrorMetadata {
                &mut self.metadata
            }
        }
    };
}

modeled!(ThrottlingException {});
modeled!(OperationThrottled {});
modeled!(InternalFailure {});
modeled!(ConflictException {});
modeled!(ResourceNotFound { resource_name: Option<String>, retry_after: Option<i64> });

impl Unmarshall for ThrottlingException {
    fn unmarshall(_: &UnmarshallContext<'_>, _: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self::default())
    }
}

impl Unmarshall for OperationThrottled {
    fn unmarshall(_: &UnmarshallContext<'_>, _: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self::default())
    }
}

impl Unmarshall for InternalFailure {
    fn unmarshall(_: &UnmarshallContext<'_>, _: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self::default())
    }
}

impl Unmarshall for ConflictException {
    fn unmarshall(_: &UnmarshallContext<'_>, _: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self::default())
    }
}

#[derive(Default)]
struct ResourceNotFoundBuilder {
    resource_name: Option<String>,
    retry_after: Option<i64>,
}

impl Unmarshall for ResourceNotFoundBuilder {
    fn unmarshall(cx: &UnmarshallContext<'_>, node: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self {
            resource_name: cx.field(node, "resourceName")?,
            retry_after: cx.header_value("Retry-After")?,
        })
    }
}

impl ExceptionBuilder for ResourceNotFoundBuilder {
    type Output = ResourceNotFound;

    fn build(self) -> ResourceNotFound {
        ResourceNotFound {
            resource_name: self.resource_name,
            retry_after: self.retry_after,
            ..ResourceNotFound::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn service_config() -> ProtocolConfigBuilder {
    ProtocolConfig::builder()
        .error_shape(
            ErrorShape::new(ExceptionKind::direct::<ThrottlingException>())
                .with_code("ThrottlingException"),
        )
        .error_shape(
            ErrorShape::new(ExceptionKind::builder::<ResourceNotFoundBuilder>())
                .with_code("ResourceNotFound"),
        )
        .error_shape(
            ErrorShape::new(ExceptionKind::direct::<ConflictException>())
                .with_code("ConflictException")
                .with_status(409),
        )
        .error_shape(ErrorShape::new(ExceptionKind::direct::<InternalFailure>()).with_status(500))
}

fn factory(format: WireFormat, config: ProtocolConfigBuilder) -> ProtocolFactory {
    let config = match format {
        WireFormat::PlainJson => config,
        WireFormat::Cbor => config.supports_cbor(true),
        WireFormat::IonText | WireFormat::IonBinary => config.supports_ion(true),
    };
    let settings = FeatureSettings {
        cbor_enabled: true,
        ion_binary_enabled: format == WireFormat::IonBinary,
    };
    let factory = ProtocolFactory::new(config.build(), settings);
    assert_eq!(factory.format(), format);
    factory
}

fn body(format: WireFormat, fields: &[(&str, &str)]) -> Bytes {
    let mut writer = StructuredWriter::for_format(format);
    writer.write_start_object().unwrap();
    for (name, value) in fields {
        writer.write_field_name(name).unwrap().write_value(*value).unwrap();
    }
    writer.write_end_object().unwrap();
    writer.bytes().unwrap()
}

fn read(
    factory: &ProtocolFactory,
    operation: &ErrorResponseMetadata,
    response: &HttpResponse,
) -> Box<dyn ModeledException> {
    factory.create_error_reader(operation).read(response).unwrap()
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[test]
fn operation_overrides_then_service_then_base() {
    let overrides = ErrorResponseMetadata::new().with_error_shape(
        ErrorShape::new(ExceptionKind::direct::<OperationThrottled>())
            .with_code("ThrottlingException"),
    );
    let none = ErrorResponseMetadata::new();
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let throttled = HttpResponse::new(400)
            .with_body(body(format, &[("__type", "com.example#ThrottlingException")]));

        let exception = read(&factory, &overrides, &throttled);
        assert!(exception.is::<OperationThrottled>(), "{format}");
        assert_eq!(exception.metadata().exception_name, "OperationThrottled");

        let exception = read(&factory, &none, &throttled);
        assert!(exception.is::<ThrottlingException>(), "{format}");
        assert_eq!(
            exception.metadata().error_code.as_deref(),
            Some("ThrottlingException")
        );

        let unknown = HttpResponse::new(400).with_body(body(format, &[("code", "Nope")]));
        let exception = read(&factory, &overrides, &unknown);
        assert!(exception.is::<ServiceException>(), "{format}");
        assert_eq!(exception.metadata().error_code.as_deref(), Some("Nope"));
    }
}

#[test]
fn status_is_an_additional_filter() {
    let none = ErrorResponseMetadata::new();
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let conflict = |status| {
            HttpResponse::new(status).with_body(body(format, &[("code", "ConflictException")]))
        };
        assert!(read(&factory, &none, &conflict(409)).is::<ConflictException>());
        assert!(read(&factory, &none, &conflict(400)).is::<ServiceException>());
        assert!(read(&factory, &none, &conflict(500)).is::<InternalFailure>());
    }
}

#[test]
fn first_matching_service_shape_wins() {
    let config = ProtocolConfig::builder()
        .error_shape(ErrorShape::new(ExceptionKind::direct::<InternalFailure>()).with_status(500))
        .error_shape(
            ErrorShape::new(ExceptionKind::direct::<ThrottlingException>())
                .with_code("ThrottlingException"),
        );
    let factory = factory(WireFormat::PlainJson, config);
    let response = HttpResponse::new(500)
        .with_body(body(WireFormat::PlainJson, &[("code", "ThrottlingException")]));
    let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
    assert!(exception.is::<InternalFailure>());
}

#[test]
fn code_shape_declared_first_beats_status_shape() {
    let config = ProtocolConfig::builder()
        .error_shape(ErrorShape::new(ExceptionKind::direct::<ThrottlingException>()).with_code("A"))
        .error_shape(ErrorShape::new(ExceptionKind::direct::<InternalFailure>()).with_status(404));
    for format in WireFormat::ALL {
        let factory = factory(format, config.clone());
        let response = HttpResponse::new(404).with_body(body(format, &[("code", "A")]));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert!(exception.is::<ThrottlingException>(), "{format}");
        assert_eq!(exception.metadata().status_code, 404);

        let other = HttpResponse::new(404).with_body(body(format, &[("code", "B")]));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &other);
        assert!(exception.is::<InternalFailure>(), "{format}");
    }
}

#[test]
fn custom_base_exception() {
    let config = service_config().base_exception(ExceptionKind::direct::<ConflictException>());
    let factory = factory(WireFormat::Cbor, config);
    let exception = read(&factory, &ErrorResponseMetadata::new(), &HttpResponse::new(418));
    assert!(exception.is::<ConflictException>());
    assert_eq!(exception.metadata().status_code, 418);
}

// ---------------------------------------------------------------------------
// Builder decoding and metadata
// ---------------------------------------------------------------------------

#[test]
fn builder_shape_reads_body_and_headers() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let response = HttpResponse::new(404)
            .with_header("Retry-After", "30")
            .with_header("x-amzn-RequestId", "abc-123")
            .with_body(body(
                format,
                &[
                    ("__type", "ResourceNotFound:http://internal.amazon.com/"),
                    ("message", "no such table"),
                    ("resourceName", "orders"),
                ],
            ));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        let not_found = exception.downcast_ref::<ResourceNotFound>().unwrap();
        assert_eq!(not_found.resource_name.as_deref(), Some("orders"), "{format}");
        assert_eq!(not_found.retry_after, Some(30));
        assert_eq!(
            exception.metadata(),
            &ErrorMetadata {
                error_code: Some("ResourceNotFound".into()),
                message: Some("no such table".into()),
                status_code: 404,
                exception_name: "ResourceNotFound".into(),
                request_id: Some("abc-123".into()),
            }
        );
        assert_eq!(
            exception.to_string(),
            "ResourceNotFound (status 404, code ResourceNotFound, request id abc-123): \
             no such table"
        );
    }
}

#[test]
fn matched_shape_decode_failure_is_not_masked() {
    let factory = factory(WireFormat::PlainJson, service_config());
    let response = HttpResponse::new(404).with_body(Bytes::from_static(
        br#"{"code":"ResourceNotFound","resourceName":{"nested":true}}"#,
    ));
    let failure = factory
        .create_error_reader(&ErrorResponseMetadata::new())
        .read(&response)
        .unwrap_err();
    assert_eq!(failure.target, "ResourceNotFound");
    assert!(matches!(failure.source, DecodeError::TypeMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Error code sources
// ---------------------------------------------------------------------------

#[test]
fn code_field_precedes_type_field() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let response = HttpResponse::new(400).with_body(body(
            format,
            &[("__type", "ResourceNotFound"), ("code", "ThrottlingException")],
        ));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert!(exception.is::<ThrottlingException>(), "{format}");
    }
}

#[test]
fn custom_code_field_replaces_defaults() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config().custom_error_code_field("errorType"));
        let response = HttpResponse::new(400).with_body(body(
            format,
            &[("code", "ThrottlingException"), ("errorType", "ResourceNotFound")],
        ));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert!(exception.is::<ResourceNotFound>(), "{format}");
    }
}

#[test]
fn header_supplies_missing_code() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let response = HttpResponse::new(400)
            .with_header("X-Amzn-ErrorType", "ThrottlingException:http://internal/")
            .with_body(body(format, &[("message", "slow down")]));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert!(exception.is::<ThrottlingException>(), "{format}");
        assert_eq!(exception.metadata().message.as_deref(), Some("slow down"));
    }
}

#[test]
fn ion_type_annotation_precedes_fields() {
    for format in [WireFormat::IonText, WireFormat::IonBinary] {
        let factory = factory(format, service_config());
        let response = HttpResponse::new(400).with_body(Bytes::from_static(
            b"'aws-type:com.example#ThrottlingException'::{code:\"ResourceNotFound\"}",
        ));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert!(exception.is::<ThrottlingException>(), "{format}");
        assert_eq!(
            exception.metadata().error_code.as_deref(),
            Some("ThrottlingException")
        );
    }
}

#[test]
fn annotations_ignored_outside_ion() {
    let factory = factory(WireFormat::PlainJson, service_config());
    let response = HttpResponse::new(400).with_body(Bytes::from_static(
        b"'aws-type:ThrottlingException'::{code:\"ResourceNotFound\"}",
    ));
    let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
    assert!(exception.is::<ServiceException>());
    assert_eq!(exception.metadata().error_code, None);
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[test]
fn message_search_order() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        let message = |fields: &[(&str, &str)]| {
            let response = HttpResponse::new(400).with_body(body(format, fields));
            read(&factory, &ErrorResponseMetadata::new(), &response)
                .metadata()
                .message
                .clone()
        };
        assert_eq!(
            message(&[("errorMessage", "third"), ("Message", "second"), ("message", "first")]),
            Some("first".into())
        );
        assert_eq!(
            message(&[("errorMessage", "third"), ("Message", "second")]),
            Some("second".into())
        );
        assert_eq!(message(&[("errorMessage", "third")]), Some("third".into()));
        assert_eq!(message(&[("detail", "ignored")]), None);
    }
}

#[test]
fn custom_message_fields_replace_defaults() {
    for format in WireFormat::ALL {
        let config = service_config().error_message_fields(["detail", "errorMessage"]);
        let factory = factory(format, config);
        let response = HttpResponse::new(400).with_body(body(
            format,
            &[("message", "default"), ("errorMessage", "custom")],
        ));
        let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
        assert_eq!(exception.metadata().message.as_deref(), Some("custom"), "{format}");
    }
}

// ---------------------------------------------------------------------------
// Empty and malformed bodies
// ---------------------------------------------------------------------------

#[test]
fn empty_body_falls_back() {
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        for response in [
            HttpResponse::new(400),
            HttpResponse::new(400).with_body(Bytes::new()),
        ] {
            let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
            assert!(exception.is::<ServiceException>(), "{format}");
            assert_eq!(exception.metadata().message, None);
            assert_eq!(exception.metadata().error_code, None);
        }
        let exception = read(&factory, &ErrorResponseMetadata::new(), &HttpResponse::new(500));
        assert!(exception.is::<InternalFailure>(), "{format}");
    }
}

#[test]
fn malformed_body_is_isolated() {
    let garbage: [&[u8]; 4] = [
        b"<html><body>Bad Gateway</body></html>",
        b"{\"code\":\"ThrottlingException\"",
        &[0xbf, 0x64, b'c', b'o'],
        &[0xe0, 0x01, 0x00, 0xea, 0xd4, 0x81],
    ];
    for format in WireFormat::ALL {
        let factory = factory(format, service_config());
        for bytes in garbage {
            let response = HttpResponse::new(502)
                .with_header("x-amz-request-id", "req-9")
                .with_body(Bytes::copy_from_slice(bytes));
            let exception = read(&factory, &ErrorResponseMetadata::new(), &response);
            assert!(exception.is::<ServiceException>(), "{format} {bytes:?}");
            assert_eq!(exception.metadata().status_code, 502);
            assert_eq!(exception.metadata().request_id.as_deref(), Some("req-9"));
        }
    }
}

#[test]
fn huge_decimal_exponents_decode_promptly() {
    let bodies: [(WireFormat, &'static [u8]); 3] = [
        (WireFormat::IonText, b"0d9223372036854775807"),
        (
            WireFormat::IonBinary,
            &[
                0xe0, 0x01, 0x00, 0xea, 0x59, 0x3f, 0x7f, 0x7f, 0x7f, 0x7f, 0x7f, 0x7f, 0x7f, 0xff,
            ],
        ),
        (WireFormat::Cbor, &[0xc4, 0x82, 0x1a, 0xee, 0x6b, 0x28, 0x00, 0x00]),
    ];
    for (format, bytes) in bodies {
        let reader = factory(format, service_config())
            .create_error_reader(&ErrorResponseMetadata::new());
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let response = HttpResponse::new(400).with_body(Bytes::from_static(bytes));
            let outcome = reader.read(&response).map(|e| e.is::<ServiceException>());
            let _ = tx.send(outcome);
        });
        let outcome = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap_or_else(|_| panic!("{format} error read did not finish"));
        assert!(outcome.unwrap(), "{format}");
    }
}
