use indexmap::IndexMap;

use super::registry::{ReaderContext, ScalarUnmarshallerRegistry};
use crate::error::DecodeError;
use crate::http::HttpResponse;
use crate::{WireFormat, WireValue};

/// A shape that can be read from a parsed node.
///
/// Generated response and exception shapes implement this against an
/// [`UnmarshallContext`], which resolves scalars through the registry of the
/// active format.
pub trait Unmarshall: Sized {
    fn unmarshall(cx: &UnmarshallContext<'_>, node: &WireValue) -> Result<Self, DecodeError>;
}

/// Everything a shape needs while reading one response.
#[derive(Debug, Clone, Copy)]
pub struct UnmarshallContext<'a> {
    registry: &'a ScalarUnmarshallerRegistry,
    header_registry: &'a ScalarUnmarshallerRegistry,
    reader: ReaderContext,
    response: &'a HttpResponse,
}

impl<'a> UnmarshallContext<'a> {
    pub fn new(
        registry: &'a ScalarUnmarshallerRegistry,
        header_registry: &'a ScalarUnmarshallerRegistry,
        format: WireFormat,
        response: &'a HttpResponse,
    ) -> Self {
        Self {
            registry,
            header_registry,
            reader: ReaderContext { format },
            response,
        }
    }

    pub fn format(&self) -> WireFormat {
        self.reader.format
    }

    pub fn response(&self) -> &'a HttpResponse {
        self.response
    }

    pub fn status_code(&self) -> u16 {
        self.response.status_code
    }

    pub fn scalar<T: 'static>(&self, node: &WireValue) -> Result<T, DecodeError> {
        self.registry.decode(node, self.reader)
    }

    /// An optional scalar member; absent and null both read as `None`.
    pub fn field<T: 'static>(
        &self,
        node: &WireValue,
        name: &str,
    ) -> Result<Option<T>, DecodeError> {
        match node.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(value) => self.scalar(value).map(Some),
        }
    }

    pub fn required_field<T: 'static>(
        &self,
        node: &WireValue,
        name: &str,
    ) -> Result<T, DecodeError> {
        self.field(node, name)?
            .ok_or_else(|| DecodeError::MissingField(name.to_owned()))
    }

    /// A nested structure member.
    pub fn structure<T: Unmarshall>(
        &self,
        node: &WireValue,
        name: &str,
    ) -> Result<Option<T>, DecodeError> {
        match node.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(value @ WireValue::Object(_)) => T::unmarshall(self, value).map(Some),
            Some(other) => Err(DecodeError::mismatch("object", other)),
        }
    }

    /// A list member whose items are read with `item`, e.g.
    /// `UnmarshallContext::scalar::<String>` or `Shape::unmarshall`.
    pub fn list<T, F>(
        &self,
        node: &WireValue,
        name: &str,
        item: F,
    ) -> Result<Option<Vec<T>>, DecodeError>
    where
        F: Fn(&Self, &WireValue) -> Result<T, DecodeError>,
    {
        match node.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Array(items)) => items
                .iter()
                .map(|value| item(self, value))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(DecodeError::mismatch("array", other)),
        }
    }

    /// A map member; entries keep their wire order.
    pub fn map<T, F>(
        &self,
        node: &WireValue,
        name: &str,
        entry: F,
    ) -> Result<Option<IndexMap<String, T>>, DecodeError>
    where
        F: Fn(&Self, &WireValue) -> Result<T, DecodeError>,
    {
        match node.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Object(fields)) => fields
                .iter()
                .map(|(key, value)| entry(self, value).map(|decoded| (key.clone(), decoded)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Some),
            Some(other) => Err(DecodeError::mismatch("object", other)),
        }
    }

    /// A member bound to a response header. Header values are text in every
    /// format, so they are read with text coercions.
    pub fn header_value<T: 'static>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        match self.response.header(name) {
            None => Ok(None),
            Some(text) => self
                .header_registry
                .decode(&WireValue::Str(text.to_owned()), self.reader)
                .map(Some),
        }
    }
}
