//! CBOR (RFC 8949): streaming generator and decoder.

pub mod constants;
mod decoder;
mod error;
mod generator;

pub use decoder::{decode, CborDecoder};
pub use error::CborError;
pub use generator::CborGenerator;
