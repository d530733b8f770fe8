//! Error-shape matching and modeled exception decoding.

mod code;
mod kind;
mod reader;
mod table;

pub use code::{sanitize_error_code, ErrorCodeExtractor, ErrorMessageParser};
pub use kind::{
    AsAny, DecodeStrategy, ErrorMetadata, ExceptionBuilder, ExceptionKind, ModeledException,
    ServiceException,
};
pub use reader::ErrorResponseReader;
pub use table::{ErrorShape, ErrorShapeTable};
