use structured_protocol_buffers::BufferError;
use thiserror::Error;

/// Error type for CBOR decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("truncated cbor payload")]
    Truncated,
    #[error("unexpected minor value {0}")]
    UnexpectedMinor(u8),
    #[error("unexpected major type {0} inside indefinite-length chunk")]
    UnexpectedChunkMajor(u8),
    #[error("map key is not a text string")]
    UnexpectedObjKey,
    #[error("unexpected break stop code")]
    UnexpectedBreak,
    #[error("invalid utf-8 in text string")]
    InvalidUtf8,
    #[error("length {0} does not fit in memory")]
    InvalidSize(u64),
    #[error("bignum wider than 128 bits")]
    BignumTooLarge,
    #[error("decimal fraction out of range")]
    DecimalOutOfRange,
    #[error("invalid epoch timestamp")]
    InvalidTimestamp,
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("{0} trailing byte(s) after the top-level item")]
    TrailingBytes(usize),
}

impl From<BufferError> for CborError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => CborError::Truncated,
            BufferError::InvalidUtf8 => CborError::InvalidUtf8,
        }
    }
}
