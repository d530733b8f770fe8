//! Feature flags to wire format: the writer and the content type must always
//! agree.

use structured_protocol::{
    parse_body, EncodingFailure, FeatureSettings, Marshall, OperationInfo, Protocol,
    ProtocolConfig, ProtocolFactory, StructuredWriter, WireFormat, WireValue,
};

struct Describe<'a> {
    table: &'a str,
}

impl Marshall for Describe<'_> {
    fn marshall(&self, writer: &mut StructuredWriter) -> Result<(), EncodingFailure> {
        writer.write_field_name("TableName")?.write_value(self.table)?;
        Ok(())
    }
}

fn factory(supports_cbor: bool, supports_ion: bool, ion_binary_enabled: bool) -> ProtocolFactory {
    let config = ProtocolConfig::builder()
        .supports_cbor(supports_cbor)
        .supports_ion(supports_ion)
        .build();
    let settings = FeatureSettings {
        cbor_enabled: true,
        ion_binary_enabled,
    };
    ProtocolFactory::new(config, settings)
}

const MATRIX: [(bool, bool, bool, WireFormat); 8] = [
    (false, false, false, WireFormat::PlainJson),
    (false, false, true, WireFormat::PlainJson),
    (false, true, false, WireFormat::IonText),
    (false, true, true, WireFormat::IonBinary),
    (true, false, false, WireFormat::Cbor),
    (true, false, true, WireFormat::Cbor),
    (true, true, false, WireFormat::Cbor),
    (true, true, true, WireFormat::Cbor),
];

#[test]
fn flags_select_exactly_one_format() {
    for (cbor, ion, ion_binary, expected) in MATRIX {
        let factory = factory(cbor, ion, ion_binary);
        assert_eq!(
            factory.format(),
            expected,
            "cbor={cbor} ion={ion} ion_binary={ion_binary}"
        );
        assert_eq!(factory.flags().select_format(), expected);
        assert_eq!(factory.binding().format(), expected);
    }
}

#[test]
fn writer_and_content_type_move_together() {
    let operation = OperationInfo::new(Protocol::AwsJson, "1.1");
    for (cbor, ion, ion_binary, expected) in MATRIX {
        let factory = factory(cbor, ion, ion_binary);
        let writer = factory.create_request_writer(&operation);
        assert_eq!(writer.format(), expected);
        let content_type = factory.resolve_content_type(&operation);
        assert_eq!(content_type, format!("{}1.1", expected.content_type_prefix()));

        let request = factory
            .create_request_marshaller(&operation)
            .marshall(&Describe { table: "orders" })
            .unwrap();
        assert_eq!(request.content_type, content_type);
        let parsed = parse_body(expected, Some(&request.body[..])).unwrap();
        assert_eq!(
            parsed.value.get("TableName"),
            Some(&WireValue::Str("orders".into())),
            "{expected}"
        );
    }
}

#[test]
fn content_type_prefixes() {
    let operation = OperationInfo::new(Protocol::RestJson, "1.0");
    let expected = [
        (WireFormat::PlainJson, "application/x-amz-json-1.0"),
        (WireFormat::Cbor, "application/x-amz-cbor-1.0"),
        (WireFormat::IonText, "text/x-amz-ion-1.0"),
        (WireFormat::IonBinary, "application/x-amz-ion-1.0"),
    ];
    for (format, content_type) in expected {
        let (cbor, ion, ion_binary, _) = MATRIX
            .into_iter()
            .find(|row| row.3 == format)
            .unwrap();
        assert_eq!(
            factory(cbor, ion, ion_binary).resolve_content_type(&operation),
            content_type
        );
    }
}

#[test]
fn binary_payload_markers() {
    let operation = OperationInfo::new(Protocol::AwsJson, "1.1");
    let body = |cbor, ion, ion_binary| {
        factory(cbor, ion, ion_binary)
            .create_request_marshaller(&operation)
            .marshall(&Describe { table: "t" })
            .unwrap()
            .body
    };
    assert_eq!(body(false, false, false)[0], b'{');
    assert_eq!(body(true, false, false)[0], 0xbf);
    assert_eq!(&body(false, true, true)[..4], &[0xe0, 0x01, 0x00, 0xea]);
    assert_ne!(body(false, true, false)[0], 0xe0);
}

#[test]
fn cbor_disabled_by_settings() {
    let config = ProtocolConfig::builder()
        .supports_cbor(true)
        .supports_ion(true)
        .build();
    let settings = FeatureSettings {
        cbor_enabled: false,
        ion_binary_enabled: false,
    };
    let factory = ProtocolFactory::new(config, settings);
    assert_eq!(factory.format(), WireFormat::IonText);
    assert!(!factory.flags().cbor);
}

#[test]
fn payloadless_operations() {
    let factory = factory(false, true, true);
    let rest = OperationInfo::new(Protocol::RestJson, "1.0").with_payload_members(false);
    let request = factory
        .create_request_marshaller(&rest)
        .marshall(&Describe { table: "ignored" })
        .unwrap();
    assert!(request.body.is_empty());
    assert_eq!(request.content_type, "application/x-amz-ion-1.0");

    let rpc = OperationInfo::new(Protocol::AwsJson, "1.0").with_payload_members(false);
    assert!(!factory.create_request_writer(&rpc).is_noop());
}
