//! Ion binary format constants.
#![allow(non_snake_case)]

/// Ion binary type identifiers (high 4 bits of type descriptor byte).
pub mod Type {
    pub const NULL: u8 = 0b0000;
    pub const BOOL: u8 = 0b0001;
    pub const UINT: u8 = 0b0010;
    pub const NINT: u8 = 0b0011;
    pub const FLOT: u8 = 0b0100;
    pub const DECI: u8 = 0b0101;
    pub const TIME: u8 = 0b0110;
    pub const SYMB: u8 = 0b0111;
    pub const STRI: u8 = 0b1000;
    pub const CLOB: u8 = 0b1001;
    pub const BINA: u8 = 0b1010;
    pub const LIST: u8 = 0b1011;
    pub const SEXP: u8 = 0b1100;
    pub const STRU: u8 = 0b1101;
    pub const ANNO: u8 = 0b1110;
}

/// Length nibble announcing a VarUInt length after the type descriptor.
pub const L_VARLEN: u8 = 14;
/// Length nibble marking a typed null.
pub const L_NULL: u8 = 15;

/// Ion Binary Version Marker (IVM): 4 bytes 0xe0 0x01 0x00 0xea.
pub const ION_BVM: [u8; 4] = [0xe0, 0x01, 0x00, 0xea];

/// System symbol table (1-indexed; index 0 unused).
pub const SYSTEM_SYMBOLS: &[&str] = &[
    "",                         // 0: unused
    "$ion",                     // 1
    "$ion_1_0",                 // 2
    "$ion_symbol_table",        // 3
    "name",                     // 4
    "version",                  // 5
    "imports",                  // 6
    "symbols",                  // 7
    "max_id",                   // 8
    "$ion_shared_symbol_table", // 9
];

/// System symbol ID for '$ion_symbol_table'.
pub const SID_ION_SYMBOL_TABLE: usize = 3;
/// System symbol ID for 'imports'.
pub const SID_IMPORTS: usize = 6;
/// System symbol ID for 'symbols'.
pub const SID_SYMBOLS: usize = 7;
