//! CBOR constants.

// MAJOR type values (bits 7-5 of the initial byte)
pub const MAJOR_UIN: u8 = 0b000;
pub const MAJOR_NIN: u8 = 0b001;
pub const MAJOR_BIN: u8 = 0b010;
pub const MAJOR_STR: u8 = 0b011;
pub const MAJOR_ARR: u8 = 0b100;
pub const MAJOR_MAP: u8 = 0b101;
pub const MAJOR_TAG: u8 = 0b110;
pub const MAJOR_TKN: u8 = 0b111;

pub const MINOR_MASK: u8 = 0b11111;
/// Minor value announcing an indefinite-length item.
pub const MINOR_INDEFINITE: u8 = 31;

pub const CBOR_FALSE: u8 = 0xf4;
pub const CBOR_TRUE: u8 = 0xf5;
pub const CBOR_NULL: u8 = 0xf6;
pub const CBOR_UNDEFINED: u8 = 0xf7;
pub const CBOR_F32: u8 = 0xfa;
pub const CBOR_F64: u8 = 0xfb;
pub const CBOR_START_ARR: u8 = 0x9f;
pub const CBOR_START_MAP: u8 = 0xbf;
/// CBOR "break" stop code.
pub const CBOR_END: u8 = 0xff;

/// Epoch-based date/time.
pub const TAG_EPOCH_DATETIME: u64 = 1;
pub const TAG_POSITIVE_BIGNUM: u64 = 2;
pub const TAG_NEGATIVE_BIGNUM: u64 = 3;
/// `[exponent, mantissa]` base-10 decimal fraction.
pub const TAG_DECIMAL_FRACTION: u64 = 4;
pub const TAG_SELF_DESCRIBE: u64 = 55799;

/// Returns `true` if `f` can be losslessly represented as an `f32`.
#[inline]
pub fn is_f32_roundtrip(f: f64) -> bool {
    (f as f32) as f64 == f
}
