use tracing::trace;

use super::ExceptionKind;

/// Maps an error code and/or HTTP status to an exception kind. A `None`
/// predicate matches anything along its axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorShape {
    pub error_code: Option<String>,
    pub http_status_code: Option<u16>,
    pub exception: ExceptionKind,
}

impl ErrorShape {
    pub fn new(exception: ExceptionKind) -> Self {
        Self {
            error_code: None,
            http_status_code: None,
            exception,
        }
    }

    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn with_status(mut self, http_status_code: u16) -> Self {
        self.http_status_code = Some(http_status_code);
        self
    }

    pub fn matches(&self, error_code: Option<&str>, status_code: u16) -> bool {
        let code_matches = match &self.error_code {
            None => true,
            Some(expected) => error_code == Some(expected.as_str()),
        };
        let status_matches = self.http_status_code.map_or(true, |s| s == status_code);
        code_matches && status_matches
    }
}

/// Ordered candidate shapes plus the base kind, which always matches last.
#[derive(Debug, Clone)]
pub struct ErrorShapeTable {
    shapes: Vec<ErrorShape>,
    base: ExceptionKind,
}

impl ErrorShapeTable {
    pub fn new(shapes: Vec<ErrorShape>, base: ExceptionKind) -> Self {
        Self { shapes, base }
    }

    /// Operation-scoped shapes first, then service shapes in configuration
    /// order.
    pub fn layered(operation: &[ErrorShape], service: &[ErrorShape], base: ExceptionKind) -> Self {
        let shapes = operation.iter().chain(service).cloned().collect();
        Self::new(shapes, base)
    }

    pub fn shapes(&self) -> &[ErrorShape] {
        &self.shapes
    }

    pub fn base(&self) -> ExceptionKind {
        self.base
    }

    /// The first matching kind; the base kind when nothing else matches.
    pub fn resolve(&self, error_code: Option<&str>, status_code: u16) -> ExceptionKind {
        match self
            .shapes
            .iter()
            .position(|shape| shape.matches(error_code, status_code))
        {
            Some(index) => {
                let kind = self.shapes[index].exception;
                trace!(
                    ?error_code,
                    status_code,
                    index,
                    exception = kind.name(),
                    "error shape matched"
                );
                kind
            }
            None => {
                trace!(
                    ?error_code,
                    status_code,
                    exception = self.base.name(),
                    "falling back to base exception"
                );
                self.base
            }
        }
    }
}
