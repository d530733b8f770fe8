//! Amazon Ion: one generator over text and binary encoders, plus decoders.

pub mod constants;
mod decoder;
mod encoder_binary;
mod encoder_text;
mod error;
mod generator;
mod parser_text;
mod primitives;
mod symbols;

pub use decoder::IonBinaryDecoder;
pub use encoder_binary::IonBinaryEncoder;
pub use encoder_text::IonTextEncoder;
pub use error::IonError;
pub use generator::{IonContainer, IonEncoder, IonGenerator, IonScalar};
pub use parser_text::IonTextParser;

use crate::WireValue;

/// The first user value of an Ion stream together with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct IonDocument {
    pub annotations: Vec<String>,
    pub value: WireValue,
}

/// Decodes an Ion payload, picking binary or text from the version marker.
pub fn decode(bytes: &[u8]) -> Result<IonDocument, IonError> {
    if bytes.starts_with(&constants::ION_BVM) {
        IonBinaryDecoder::new().decode(bytes)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|_| IonError::InvalidUtf8)?;
        IonTextParser::new(text).parse_document()
    }
}
