use structured_protocol_buffers::BufferError;
use thiserror::Error;

/// Error type for Ion binary decoding and Ion text parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IonError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid Ion binary version marker")]
    InvalidBvm,
    #[error("invalid type descriptor 0x{0:02x}")]
    InvalidTypeDescriptor(u8),
    #[error("negative zero integer")]
    NegativeZero,
    #[error("integer wider than 128 bits")]
    IntTooLarge,
    #[error("variable-length integer overflow")]
    VarIntOverflow,
    #[error("unknown symbol id {0}")]
    UnknownSymbol(usize),
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("decimal out of range")]
    DecimalOutOfRange,
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("stream holds no user value")]
    NoValue,
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

impl From<BufferError> for IonError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => IonError::EndOfInput,
            BufferError::InvalidUtf8 => IonError::InvalidUtf8,
        }
    }
}
