//! Client protocol configuration and process-wide feature settings.

use serde::Deserialize;

use crate::constants::{CBOR_DISABLE_ENV, ION_BINARY_DISABLE_ENV};
use crate::exception::{ErrorShape, ExceptionKind};

/// Per-client protocol configuration, fixed once a factory is built from it.
#[derive(Debug, Clone, Default)]
pub struct ProtocolConfig {
    supports_cbor: bool,
    supports_ion: bool,
    content_type_override: Option<String>,
    base_exception: ExceptionKind,
    error_shapes: Vec<ErrorShape>,
    custom_error_code_field: Option<String>,
    error_message_fields: Option<Vec<String>>,
}

impl ProtocolConfig {
    pub fn builder() -> ProtocolConfigBuilder {
        ProtocolConfigBuilder::default()
    }

    pub fn supports_cbor(&self) -> bool {
        self.supports_cbor
    }

    pub fn supports_ion(&self) -> bool {
        self.supports_ion
    }

    pub fn content_type_override(&self) -> Option<&str> {
        self.content_type_override.as_deref()
    }

    pub fn base_exception(&self) -> ExceptionKind {
        self.base_exception
    }

    /// Service-level error shapes, in match order.
    pub fn error_shapes(&self) -> &[ErrorShape] {
        &self.error_shapes
    }

    pub fn custom_error_code_field(&self) -> Option<&str> {
        self.custom_error_code_field.as_deref()
    }

    pub fn error_message_fields(&self) -> Option<&[String]> {
        self.error_message_fields.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolConfigBuilder {
    config: ProtocolConfig,
}

impl ProtocolConfigBuilder {
    pub fn supports_cbor(mut self, supports_cbor: bool) -> Self {
        self.config.supports_cbor = supports_cbor;
        self
    }

    pub fn supports_ion(mut self, supports_ion: bool) -> Self {
        self.config.supports_ion = supports_ion;
        self
    }

    pub fn content_type_override(mut self, content_type: impl Into<String>) -> Self {
        self.config.content_type_override = Some(content_type.into());
        self
    }

    /// The kind every unmatched error response decodes into.
    pub fn base_exception(mut self, kind: ExceptionKind) -> Self {
        self.config.base_exception = kind;
        self
    }

    /// Appends one service-level shape; earlier shapes take precedence.
    pub fn error_shape(mut self, shape: ErrorShape) -> Self {
        self.config.error_shapes.push(shape);
        self
    }

    pub fn error_shapes(mut self, shapes: impl IntoIterator<Item = ErrorShape>) -> Self {
        self.config.error_shapes.extend(shapes);
        self
    }

    /// Reads the error code from this body field only.
    pub fn custom_error_code_field(mut self, field: impl Into<String>) -> Self {
        self.config.custom_error_code_field = Some(field.into());
        self
    }

    /// Replaces the default `message`, `Message`, `errorMessage` search order.
    pub fn error_message_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.error_message_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> ProtocolConfig {
        self.config
    }
}

/// Process-wide switches that can turn binary encodings off regardless of
/// what a client supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub cbor_enabled: bool,
    pub ion_binary_enabled: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            cbor_enabled: true,
            ion_binary_enabled: true,
        }
    }
}

impl FeatureSettings {
    /// Reads `AWS_CBOR_DISABLE` and `AWS_ION_BINARY_DISABLE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`FeatureSettings::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            cbor_enabled: !disabled(lookup(CBOR_DISABLE_ENV)),
            ion_binary_enabled: !disabled(lookup(ION_BINARY_DISABLE_ENV)),
        }
    }
}

/// Any value except `false` or `0` counts as set.
fn disabled(value: Option<String>) -> bool {
    match value {
        None => false,
        Some(value) => {
            let value = value.trim();
            !(value.eq_ignore_ascii_case("false") || value == "0")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::exception::ServiceException;

    fn settings(vars: &[(&str, &str)]) -> FeatureSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        FeatureSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn env_switches() {
        assert_eq!(settings(&[]), FeatureSettings::default());
        let off = settings(&[(CBOR_DISABLE_ENV, "true"), (ION_BINARY_DISABLE_ENV, "")]);
        assert!(!off.cbor_enabled);
        assert!(!off.ion_binary_enabled);
        let kept = settings(&[(CBOR_DISABLE_ENV, "FALSE"), (ION_BINARY_DISABLE_ENV, "0")]);
        assert_eq!(kept, FeatureSettings::default());
    }

    #[test]
    fn deserializes_with_defaults() {
        let parsed: FeatureSettings = serde_json::from_str(r#"{"cbor_enabled":false}"#).unwrap();
        assert!(!parsed.cbor_enabled);
        assert!(parsed.ion_binary_enabled);
    }

    #[test]
    fn builder_keeps_shape_order() {
        let config = ProtocolConfig::builder()
            .supports_ion(true)
            .error_shape(ErrorShape::new(ExceptionKind::default().named("A")).with_code("A"))
            .error_shapes([ErrorShape::new(ExceptionKind::default().named("B")).with_status(500)])
            .error_message_fields(["detail"])
            .build();
        assert!(config.supports_ion());
        assert!(!config.supports_cbor());
        let names: Vec<_> = config.error_shapes().iter().map(|s| s.exception.name()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(config.error_message_fields(), Some(&["detail".to_owned()][..]));
        assert_eq!(config.base_exception(), ExceptionKind::direct::<ServiceException>());
    }
}
