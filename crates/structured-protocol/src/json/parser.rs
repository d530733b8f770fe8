//! JSON text to [`WireValue`].

use crate::error::DecodeError;
use crate::WireValue;

/// Parses a JSON document.
///
/// Numbers keep their lexeme (`WireValue::Number`) so that integers, doubles
/// and decimals are each converted exactly by their own unmarshaller.
pub fn parse(bytes: &[u8]) -> Result<WireValue, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(WireValue::from(value))
}

impl From<serde_json::Value> for WireValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => WireValue::Null,
            serde_json::Value::Bool(b) => WireValue::Bool(b),
            serde_json::Value::Number(n) => WireValue::Number(n.to_string()),
            serde_json::Value::String(s) => WireValue::Str(s),
            serde_json::Value::Array(items) => {
                WireValue::Array(items.into_iter().map(WireValue::from).collect())
            }
            serde_json::Value::Object(map) => WireValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, WireValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_number_lexemes_and_order() {
        let value = parse(br#"{"z":0.10,"a":[123456789012345678901234567890,true]}"#).unwrap();
        assert_eq!(
            value,
            WireValue::Object(vec![
                ("z".into(), WireValue::Number("0.10".into())),
                (
                    "a".into(),
                    WireValue::Array(vec![
                        WireValue::Number("123456789012345678901234567890".into()),
                        WireValue::Bool(true),
                    ])
                ),
            ])
        );
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(parse(b"{\"a\":"), Err(DecodeError::Json(_))));
    }
}
