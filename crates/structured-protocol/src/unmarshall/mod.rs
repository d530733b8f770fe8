//! Response unmarshalling: scalar registries, the shape-reading context and
//! the success reader.

mod context;
mod reader;
mod registry;

pub use context::{Unmarshall, UnmarshallContext};
pub use reader::SuccessResponseReader;
pub use registry::{ReaderContext, ScalarFn, ScalarUnmarshallerRegistry};
