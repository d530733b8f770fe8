//! Ion binary primitive fields: VarUInt, VarInt, UInt and Int.

use structured_protocol_buffers::Reader;

use super::constants::L_VARLEN;
use super::IonError;

/// Writes a type descriptor with its length (inline nibble or VarUInt).
pub fn write_td(out: &mut Vec<u8>, ty: u8, len: usize) {
    if len < L_VARLEN as usize {
        out.push((ty << 4) | len as u8);
    } else {
        out.push((ty << 4) | L_VARLEN);
        write_var_uint(out, len as u64);
    }
}

/// Seven bits per byte, high bit set on the last byte.
pub fn write_var_uint(out: &mut Vec<u8>, mut n: u64) {
    let mut groups = vec![(n & 0x7f) as u8 | 0x80];
    n >>= 7;
    while n > 0 {
        groups.push((n & 0x7f) as u8);
        n >>= 7;
    }
    out.extend(groups.iter().rev());
}

/// Like VarUInt, with a sign bit in the first byte.
pub fn write_var_int(out: &mut Vec<u8>, value: i64) {
    let mut magnitude = value.unsigned_abs();
    let mut groups = vec![(magnitude & 0x7f) as u8];
    magnitude >>= 7;
    while magnitude > 0 {
        groups.push((magnitude & 0x7f) as u8);
        magnitude >>= 7;
    }
    if groups[groups.len() - 1] & 0x40 != 0 {
        groups.push(0);
    }
    groups[0] |= 0x80;
    let last = groups.len() - 1;
    if value < 0 {
        groups[last] |= 0x40;
    }
    out.extend(groups.iter().rev());
}

/// Minimal big-endian magnitude; zero is empty.
pub fn uint_bytes(magnitude: u128) -> Vec<u8> {
    let bytes = magnitude.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

/// Sign-and-magnitude fixed integer; positive zero is empty.
pub fn int_bytes(value: i128) -> Vec<u8> {
    let mut bytes = uint_bytes(value.unsigned_abs());
    if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        bytes.insert(0, 0);
    }
    if value < 0 {
        if bytes.is_empty() {
            bytes.push(0);
        }
        bytes[0] |= 0x80;
    }
    bytes
}

pub fn read_var_uint(reader: &mut Reader<'_>) -> Result<u64, IonError> {
    let mut value: u64 = 0;
    for _ in 0..10 {
        let byte = reader.u8()?;
        if value > (u64::MAX >> 7) {
            return Err(IonError::VarIntOverflow);
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 != 0 {
            return Ok(value);
        }
    }
    Err(IonError::VarIntOverflow)
}

/// Reads a VarInt; `None` is negative zero (used for unknown offsets).
pub fn read_var_int(reader: &mut Reader<'_>) -> Result<Option<i64>, IonError> {
    let first = reader.u8()?;
    let negative = first & 0x40 != 0;
    let mut magnitude = u64::from(first & 0x3f);
    let mut done = first & 0x80 != 0;
    let mut read = 1;
    while !done {
        if read >= 10 || magnitude > (u64::MAX >> 7) {
            return Err(IonError::VarIntOverflow);
        }
        let byte = reader.u8()?;
        magnitude = (magnitude << 7) | u64::from(byte & 0x7f);
        done = byte & 0x80 != 0;
        read += 1;
    }
    let magnitude = i64::try_from(magnitude).map_err(|_| IonError::VarIntOverflow)?;
    Ok(match (negative, magnitude) {
        (true, 0) => None,
        (true, m) => Some(-m),
        (false, m) => Some(m),
    })
}

pub fn read_uint(bytes: &[u8]) -> Result<u128, IonError> {
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if significant.len() > 16 {
        return Err(IonError::IntTooLarge);
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

pub fn read_int(bytes: &[u8]) -> Result<i128, IonError> {
    let Some((first, rest)) = bytes.split_first() else {
        return Ok(0);
    };
    let negative = first & 0x80 != 0;
    let mut magnitude = vec![first & 0x7f];
    magnitude.extend_from_slice(rest);
    let magnitude = i128::try_from(read_uint(&magnitude)?).map_err(|_| IonError::IntTooLarge)?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_uint_layout() {
        let mut out = Vec::new();
        write_var_uint(&mut out, 0);
        write_var_uint(&mut out, 127);
        write_var_uint(&mut out, 128);
        assert_eq!(out, vec![0x80, 0xff, 0x01, 0x80]);
        let mut reader = Reader::new(&out);
        assert_eq!(read_var_uint(&mut reader), Ok(0));
        assert_eq!(read_var_uint(&mut reader), Ok(127));
        assert_eq!(read_var_uint(&mut reader), Ok(128));
    }

    #[test]
    fn var_int_layout() {
        let mut out = Vec::new();
        write_var_int(&mut out, -3);
        write_var_int(&mut out, 63);
        write_var_int(&mut out, 64);
        write_var_int(&mut out, -200);
        assert_eq!(out, vec![0xc3, 0xbf, 0x00, 0xc0, 0x41, 0xc8]);
        let mut reader = Reader::new(&out);
        assert_eq!(read_var_int(&mut reader), Ok(Some(-3)));
        assert_eq!(read_var_int(&mut reader), Ok(Some(63)));
        assert_eq!(read_var_int(&mut reader), Ok(Some(64)));
        assert_eq!(read_var_int(&mut reader), Ok(Some(-200)));
        assert_eq!(read_var_int(&mut Reader::new(&[0xc0])), Ok(None));
    }

    #[test]
    fn int_sign_and_magnitude() {
        assert_eq!(int_bytes(0), Vec::<u8>::new());
        assert_eq!(int_bytes(-1), vec![0x81]);
        assert_eq!(int_bytes(128), vec![0x00, 0x80]);
        assert_eq!(int_bytes(-128), vec![0x80, 0x80]);
        for value in [0, 1, -1, 127, 128, -128, i128::from(i64::MIN), i128::MAX] {
            assert_eq!(read_int(&int_bytes(value)), Ok(value));
        }
    }
}
