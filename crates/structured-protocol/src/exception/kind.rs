//! Modeled exceptions and how each kind is decoded.

use std::any::{type_name, Any};
use std::fmt;

use thiserror::Error;

use crate::error::DecodeError;
use crate::unmarshall::{Unmarshall, UnmarshallContext};
use crate::WireValue;

/// Fields every modeled exception carries, filled in by the error reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMetadata {
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub status_code: u16,
    pub exception_name: String,
    pub request_id: Option<String>,
}

impl fmt::Display for ErrorMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {}", self.exception_name, self.status_code)?;
        if let Some(code) = &self.error_code {
            write!(f, ", code {code}")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, ", request id {request_id}")?;
        }
        f.write_str(")")?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An error response decoded into a service-specific type.
pub trait ModeledException: std::error::Error + AsAny + Send + Sync + 'static {
    fn metadata(&self) -> &ErrorMetadata;
    fn metadata_mut(&mut self) -> &mut ErrorMetadata;
}

impl dyn ModeledException {
    pub fn downcast_ref<E: ModeledException>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn is<E: ModeledException>(&self) -> bool {
        self.as_any().is::<E>()
    }
}

/// Catch-all exception used when no modeled shape is more specific.
#[derive(Debug, Clone, Default, Error)]
#[error("{metadata}")]
pub struct ServiceException {
    pub metadata: ErrorMetadata,
}

impl Unmarshall for ServiceException {
    fn unmarshall(_: &UnmarshallContext<'_>, _: &WireValue) -> Result<Self, DecodeError> {
        Ok(Self::default())
    }
}

impl ModeledException for ServiceException {
    fn metadata(&self) -> &ErrorMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ErrorMetadata {
        &mut self.metadata
    }
}

/// Builder-style exception decoding: members are read into the builder,
/// then `build` produces the exception.
pub trait ExceptionBuilder: Unmarshall {
    type Output: ModeledException;

    fn build(self) -> Self::Output;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Builder,
    Direct,
}

type DecodeFn =
    fn(&UnmarshallContext<'_>, &WireValue) -> Result<Box<dyn ModeledException>, DecodeError>;

fn decode_builder<B>(
    cx: &UnmarshallContext<'_>,
    node: &WireValue,
) -> Result<Box<dyn ModeledException>, DecodeError>
where
    B: ExceptionBuilder,
{
    Ok(Box::new(B::unmarshall(cx, node)?.build()))
}

fn decode_direct<E>(
    cx: &UnmarshallContext<'_>,
    node: &WireValue,
) -> Result<Box<dyn ModeledException>, DecodeError>
where
    E: ModeledException + Unmarshall,
{
    Ok(Box::new(E::unmarshall(cx, node)?))
}

fn short_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// One decodable exception type, registered explicitly.
#[derive(Clone, Copy)]
pub struct ExceptionKind {
    name: &'static str,
    strategy: DecodeStrategy,
    decode: DecodeFn,
}

impl fmt::Debug for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionKind")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl PartialEq for ExceptionKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.strategy == other.strategy
    }
}

impl ExceptionKind {
    pub fn builder<B: ExceptionBuilder>() -> Self {
        Self {
            name: short_name::<B::Output>(),
            strategy: DecodeStrategy::Builder,
            decode: decode_builder::<B>,
        }
    }

    pub fn direct<E: ModeledException + Unmarshall>() -> Self {
        Self {
            name: short_name::<E>(),
            strategy: DecodeStrategy::Direct,
            decode: decode_direct::<E>,
        }
    }

    /// Overrides the exception name reported in [`ErrorMetadata`].
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn strategy(&self) -> DecodeStrategy {
        self.strategy
    }

    pub fn decode(
        &self,
        cx: &UnmarshallContext<'_>,
        node: &WireValue,
    ) -> Result<Box<dyn ModeledException>, DecodeError> {
        (self.decode)(cx, node)
    }
}

impl Default for ExceptionKind {
    fn default() -> Self {
        Self::direct::<ServiceException>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Error)]
    #[error("limit exceeded")]
    struct LimitExceeded {
        metadata: ErrorMetadata,
        limit: Option<i64>,
    }

    impl ModeledException for LimitExceeded {
        fn metadata(&self) -> &ErrorMetadata {
            &self.metadata
        }

        fn metadata_mut(&mut self) -> &mut ErrorMetadata {
            &mut self.metadata
        }
    }

    #[derive(Default)]
    struct LimitExceededBuilder {
        limit: Option<i64>,
    }

    impl Unmarshall for LimitExceededBuilder {
        fn unmarshall(cx: &UnmarshallContext<'_>, node: &WireValue) -> Result<Self, DecodeError> {
            Ok(Self {
                limit: cx.field(node, "limit")?,
            })
        }
    }

    impl ExceptionBuilder for LimitExceededBuilder {
        type Output = LimitExceeded;

        fn build(self) -> LimitExceeded {
            LimitExceeded {
                limit: self.limit,
                ..LimitExceeded::default()
            }
        }
    }

    #[test]
    fn builder_kind_decodes_through_builder() {
        let kind = ExceptionKind::builder::<LimitExceededBuilder>();
        assert_eq!(kind.name(), "LimitExceeded");
        assert_eq!(kind.strategy(), DecodeStrategy::Builder);

        let registry = crate::unmarshall::ScalarUnmarshallerRegistry::json();
        let response = crate::HttpResponse::new(400);
        let cx = UnmarshallContext::new(
            &registry,
            &registry,
            crate::WireFormat::PlainJson,
            &response,
        );
        let node = WireValue::Object(vec![("limit".into(), WireValue::Integer(5))]);
        let exception = kind.decode(&cx, &node).unwrap();
        let limit = exception.downcast_ref::<LimitExceeded>().unwrap();
        assert_eq!(limit.limit, Some(5));
        assert!(!exception.is::<ServiceException>());
    }

    #[test]
    fn default_kind_is_service_exception() {
        let kind = ExceptionKind::default();
        assert_eq!(kind.name(), "ServiceException");
        assert_eq!(kind.strategy(), DecodeStrategy::Direct);
        assert_eq!(kind.named("Base").name(), "Base");
    }

    #[test]
    fn metadata_display() {
        let metadata = ErrorMetadata {
            error_code: Some("Throttling".into()),
            message: Some("slow down".into()),
            status_code: 400,
            exception_name: "ServiceException".into(),
            request_id: None,
        };
        assert_eq!(
            metadata.to_string(),
            "ServiceException (status 400, code Throttling): slow down"
        );
    }
}
