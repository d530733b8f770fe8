//! Ion text parser.
//!
//! Covers the Ion 1.0 text grammar as far as response documents use it:
//! structs, lists, s-expressions, every scalar type, annotations and both
//! comment styles. Symbol tables in text streams are skipped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::decoder::{decimal, integer};
use super::symbols::{symbol_id, SymbolTable};
use super::{IonDocument, IonError};
use crate::WireValue;

const MAX_DEPTH: usize = 256;

const OPERATOR_CHARS: &[u8] = b"!#%&*+-./;<=>?@^`|~";

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[derive(Debug)]
pub struct IonTextParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> IonTextParser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Parses up to the first user value of the stream.
    pub fn parse_document(&mut self) -> Result<IonDocument, IonError> {
        loop {
            self.skip_ws()?;
            if self.peek().is_none() {
                return Err(IonError::NoValue);
            }
            if self.eat_version_marker() {
                continue;
            }
            let (annotations, value) = self.annotated(0)?;
            let is_symbol_table = annotations.first().map(String::as_str)
                == Some("$ion_symbol_table")
                && matches!(value, WireValue::Object(_));
            if is_symbol_table {
                continue;
            }
            return Ok(IonDocument { annotations, value });
        }
    }

    fn syntax(&self, message: impl Into<String>) -> IonError {
        IonError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), IonError> {
        if self.starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{token}'")))
        }
    }

    fn skip_ws(&mut self) -> Result<(), IonError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    match self.src[self.pos..].find('\n') {
                        Some(end) => self.pos += end + 1,
                        None => self.pos = self.src.len(),
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    match self.src[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += end + 4,
                        None => return Err(self.syntax("unterminated comment")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn eat_version_marker(&mut self) -> bool {
        const MARKER: &str = "$ion_1_0";
        let follows_ident = self
            .src
            .as_bytes()
            .get(self.pos + MARKER.len())
            .is_some_and(|c| is_ident_char(*c));
        if self.starts_with(MARKER) && !follows_ident {
            self.pos += MARKER.len();
            return true;
        }
        false
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// An unquoted symbol. `$<digits>` names a symbol id and resolves against
    /// the system table, since text streams carry no local symbols here.
    fn symbol(&mut self) -> Result<String, IonError> {
        let text = self.identifier();
        match symbol_id(text) {
            Some(sid) => SymbolTable::default().resolve(sid),
            None => Ok(text.to_owned()),
        }
    }

    /// A value with any `symbol::` annotations in front of it.
    fn annotated(&mut self, depth: usize) -> Result<(Vec<String>, WireValue), IonError> {
        if depth > MAX_DEPTH {
            return Err(IonError::TooDeep(MAX_DEPTH));
        }
        let mut annotations = Vec::new();
        loop {
            self.skip_ws()?;
            let save = self.pos;
            let symbol = match self.peek() {
                Some(b'\'') if !self.starts_with("'''") => Some(self.quoted(b'\'')?),
                Some(c) if is_ident_start(c) => Some(self.symbol()?),
                _ => None,
            };
            if let Some(symbol) = symbol {
                self.skip_ws()?;
                if self.starts_with("::") {
                    self.pos += 2;
                    annotations.push(symbol);
                    continue;
                }
            }
            self.pos = save;
            break;
        }
        let value = self.value(depth)?;
        Ok((annotations, value))
    }

    fn value(&mut self, depth: usize) -> Result<WireValue, IonError> {
        self.skip_ws()?;
        let Some(c) = self.peek() else {
            return Err(self.syntax("expected a value"));
        };
        match c {
            b'{' if self.starts_with("{{") => self.lob(),
            b'{' => self.structure(depth),
            b'[' => self.list(depth),
            b'(' => self.sexp(depth),
            b'"' => self.quoted(b'"').map(WireValue::Str),
            b'\'' if self.starts_with("'''") => self.long_string().map(WireValue::Str),
            b'\'' => self.quoted(b'\'').map(WireValue::Str),
            b'+' if self.starts_with("+inf") => {
                self.pos += 4;
                Ok(WireValue::Float(f64::INFINITY))
            }
            b'-' if self.starts_with("-inf") => {
                self.pos += 4;
                Ok(WireValue::Float(f64::NEG_INFINITY))
            }
            c if c.is_ascii_digit() || c == b'-' => self.number(),
            c if is_ident_start(c) => self.keyword_or_symbol(),
            c => Err(self.syntax(format!("unexpected character '{}'", c as char))),
        }
    }

    fn keyword_or_symbol(&mut self) -> Result<WireValue, IonError> {
        let save = self.pos;
        Ok(match self.identifier() {
            "null" => {
                // Typed nulls such as `null.string`.
                if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(is_ident_start) {
                    self.pos += 1;
                    self.identifier();
                }
                WireValue::Null
            }
            "true" => WireValue::Bool(true),
            "false" => WireValue::Bool(false),
            "nan" => WireValue::Float(f64::NAN),
            _ => {
                self.pos = save;
                WireValue::Str(self.symbol()?)
            }
        })
    }

    fn structure(&mut self, depth: usize) -> Result<WireValue, IonError> {
        self.pos += 1;
        let mut fields = Vec::new();
        loop {
            self.skip_ws()?;
            if self.eat(b'}') {
                break;
            }
            let name = self.field_name()?;
            self.skip_ws()?;
            if !self.eat(b':') {
                return Err(self.syntax("expected ':' after field name"));
            }
            let (_, value) = self.annotated(depth + 1)?;
            fields.push((name, value));
            self.skip_ws()?;
            if self.eat(b',') {
                continue;
            }
            if self.eat(b'}') {
                break;
            }
            return Err(self.syntax("expected ',' or '}' in struct"));
        }
        Ok(WireValue::Object(fields))
    }

    fn field_name(&mut self) -> Result<String, IonError> {
        match self.peek() {
            Some(b'"') => self.quoted(b'"'),
            Some(b'\'') if self.starts_with("'''") => self.long_string(),
            Some(b'\'') => self.quoted(b'\''),
            Some(c) if is_ident_start(c) => self.symbol(),
            _ => Err(self.syntax("expected a field name")),
        }
    }

    fn list(&mut self, depth: usize) -> Result<WireValue, IonError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws()?;
            if self.eat(b']') {
                break;
            }
            let (_, value) = self.annotated(depth + 1)?;
            items.push(value);
            self.skip_ws()?;
            if self.eat(b',') {
                continue;
            }
            if self.eat(b']') {
                break;
            }
            return Err(self.syntax("expected ',' or ']' in list"));
        }
        Ok(WireValue::Array(items))
    }

    fn sexp(&mut self, depth: usize) -> Result<WireValue, IonError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws()?;
            if self.eat(b')') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.syntax("unterminated s-expression"));
            }
            if let Some(operator) = self.operator() {
                items.push(WireValue::Str(operator.to_owned()));
                continue;
            }
            let (_, value) = self.annotated(depth + 1)?;
            items.push(value);
        }
        Ok(WireValue::Array(items))
    }

    fn operator(&mut self) -> Option<&'a str> {
        let c = self.peek()?;
        if !OPERATOR_CHARS.contains(&c) {
            return None;
        }
        let signed_number = matches!(c, b'-' | b'+')
            && (self.peek_at(1).is_some_and(|n| n.is_ascii_digit())
                || self.src[self.pos + 1..].starts_with("inf"));
        if signed_number {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| OPERATOR_CHARS.contains(&c)) {
            self.pos += 1;
        }
        Some(&self.src[start..self.pos])
    }

    fn next_char(&mut self) -> Result<char, IonError> {
        let c = self.src[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| self.syntax("unexpected end of input"))?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn hex_escape(&mut self, digits: usize) -> Result<u32, IonError> {
        let hex = self
            .src
            .get(self.pos..self.pos + digits)
            .ok_or_else(|| self.syntax("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.syntax("invalid hex escape"))?;
        self.pos += digits;
        Ok(code)
    }

    /// Decodes the escape after a backslash; `None` is a line continuation.
    fn escape(&mut self) -> Result<Option<char>, IonError> {
        let c = self.next_char()?;
        let code = match c {
            'n' => return Ok(Some('\n')),
            'r' => return Ok(Some('\r')),
            't' => return Ok(Some('\t')),
            '0' => return Ok(Some('\0')),
            'a' => return Ok(Some('\x07')),
            'b' => return Ok(Some('\x08')),
            'f' => return Ok(Some('\x0c')),
            'v' => return Ok(Some('\x0b')),
            '"' | '\'' | '\\' | '/' | '?' => return Ok(Some(c)),
            '\n' => return Ok(None),
            '\r' => {
                self.eat(b'\n');
                return Ok(None);
            }
            'x' => self.hex_escape(2)?,
            'u' => {
                let high = self.hex_escape(4)?;
                if (0xd800..0xdc00).contains(&high) && self.starts_with("\\u") {
                    self.pos += 2;
                    let low = self.hex_escape(4)?;
                    0x10000 + ((high - 0xd800) << 10) + (low.wrapping_sub(0xdc00) & 0x3ff)
                } else {
                    high
                }
            }
            'U' => self.hex_escape(8)?,
            other => return Err(self.syntax(format!("invalid escape '\\{other}'"))),
        };
        char::from_u32(code)
            .map(Some)
            .ok_or_else(|| self.syntax("escape is not a valid code point"))
    }

    /// A single-line string or quoted symbol delimited by `quote`.
    fn quoted(&mut self, quote: u8) -> Result<String, IonError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.next_char()? {
                c if c as u32 == u32::from(quote) => return Ok(out),
                '\\' => out.extend(self.escape()?),
                '\n' => return Err(self.syntax("newline in quoted text")),
                c => out.push(c),
            }
        }
    }

    /// One or more adjacent `'''` segments, concatenated.
    fn long_string(&mut self) -> Result<String, IonError> {
        let mut out = String::new();
        while self.starts_with("'''") {
            self.pos += 3;
            loop {
                if self.starts_with("'''") {
                    self.pos += 3;
                    break;
                }
                match self.next_char()? {
                    '\\' => out.extend(self.escape()?),
                    c => out.push(c),
                }
            }
            self.skip_ws()?;
        }
        Ok(out)
    }

    fn skip_lob_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// `{{ base64 }}` blobs and `{{ "text" }}` clobs.
    fn lob(&mut self) -> Result<WireValue, IonError> {
        self.pos += 2;
        self.skip_lob_ws();
        let text = match self.peek() {
            Some(b'"') => Some(self.quoted(b'"')?),
            Some(b'\'') if self.starts_with("'''") => Some(self.long_string()?),
            _ => None,
        };
        if let Some(text) = text {
            self.skip_lob_ws();
            self.expect("}}")?;
            let bytes = text
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| self.syntax("clob character above 0xff")))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(WireValue::Bytes(bytes));
        }
        let end = self.src[self.pos..]
            .find("}}")
            .ok_or_else(|| self.syntax("unterminated blob"))?;
        let encoded: String = self.src[self.pos..self.pos + end]
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|err| self.syntax(format!("invalid blob: {err}")))?;
        self.pos += end + 2;
        Ok(WireValue::Bytes(bytes))
    }

    fn number(&mut self) -> Result<WireValue, IonError> {
        let start = self.pos;
        self.eat(b'-');
        let lexeme_byte =
            |c: u8| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'+' | b'-' | b':');
        while self.peek().is_some_and(lexeme_byte) {
            self.pos += 1;
        }
        let token = &self.src[start..self.pos];
        let invalid = |what: &str| IonError::Syntax {
            offset: start,
            message: format!("invalid {what} '{token}'"),
        };
        if looks_like_timestamp(token) {
            return parse_timestamp(token).map(WireValue::Timestamp);
        }
        let cleaned = token.replace('_', "");
        let (negative, unsigned) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let radix = if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
            Some(16)
        } else if unsigned.starts_with("0b") || unsigned.starts_with("0B") {
            Some(2)
        } else {
            None
        };
        if let Some(radix) = radix {
            let magnitude =
                i128::from_str_radix(&unsigned[2..], radix).map_err(|_| invalid("integer"))?;
            return integer(if negative { -magnitude } else { magnitude });
        }
        if unsigned.contains(['e', 'E']) {
            return cleaned
                .parse::<f64>()
                .map(WireValue::Float)
                .map_err(|_| invalid("float"));
        }
        if unsigned.contains(['d', 'D', '.']) {
            return parse_decimal(&cleaned)
                .map(WireValue::Decimal)
                .ok_or_else(|| invalid("decimal"));
        }
        let int = cleaned.parse::<i128>().map_err(|_| invalid("integer"))?;
        integer(int)
    }
}

fn parse_decimal(text: &str) -> Option<rust_decimal::Decimal> {
    let (mantissa, exponent) = match text.find(['d', 'D']) {
        Some(at) => (&text[..at], text[at + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_part}{frac_part}");
    let coefficient = digits.parse::<i128>().ok()?;
    let exponent = exponent.checked_sub(i64::try_from(frac_part.len()).ok()?)?;
    decimal(coefficient, exponent).ok()
}

fn looks_like_timestamp(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() >= 5 && bytes[..4].iter().all(u8::is_ascii_digit) && matches!(bytes[4], b'-' | b'T')
}

/// Parses `YYYY[-MM[-DD]]T`, `YYYY-MM-DD` and the full date-time forms with
/// minute, second or fractional precision and a `Z` or `±hh:mm` offset.
fn parse_timestamp(token: &str) -> Result<DateTime<Utc>, IonError> {
    let invalid = || IonError::InvalidTimestamp(token.to_owned());
    let bytes = token.as_bytes();
    let field = |from: usize, to: usize| -> Result<u32, IonError> {
        token
            .get(from..to)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    };
    let at = |i: usize, c: u8| bytes.get(i) == Some(&c);
    let year = i32::try_from(field(0, 4)?).map_err(|_| invalid())?;
    let date_only = |month: u32, day: u32| {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(invalid)
    };
    if token.len() == 5 && at(4, b'T') {
        return date_only(1, 1);
    }
    if !at(4, b'-') {
        return Err(invalid());
    }
    let month = field(5, 7)?;
    if token.len() == 8 && at(7, b'T') {
        return date_only(month, 1);
    }
    if !at(7, b'-') {
        return Err(invalid());
    }
    let day = field(8, 10)?;
    if token.len() == 10 || (token.len() == 11 && at(10, b'T')) {
        return date_only(month, day);
    }
    if !at(10, b'T') || !at(13, b':') {
        return Err(invalid());
    }
    let hour = field(11, 13)?;
    let minute = field(14, 16)?;
    let mut i = 16;
    let mut second = 0;
    let mut nanos = 0;
    if at(i, b':') {
        second = field(17, 19)?;
        i = 19;
        if at(i, b'.') {
            let digits = token[i + 1..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            if digits == 0 {
                return Err(invalid());
            }
            let fraction = &token[i + 1..i + 1 + digits];
            let padded = format!("{:0<9}", &fraction[..digits.min(9)]);
            nanos = padded.parse().map_err(|_| invalid())?;
            i += 1 + digits;
        }
    }
    let offset_minutes = match &token[i..] {
        "Z" | "z" => 0,
        offset if offset.len() == 6 && at(i + 3, b':') => {
            let sign = match bytes[i] {
                b'+' => 1,
                b'-' => -1,
                _ => return Err(invalid()),
            };
            let hours = field(i + 1, i + 3)?;
            let minutes = field(i + 4, i + 6)?;
            sign * i64::from(hours * 60 + minutes)
        }
        _ => return Err(invalid()),
    };
    let local = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(invalid)?;
    Ok(local.and_utc() - Duration::minutes(offset_minutes))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn parse(text: &str) -> Result<IonDocument, IonError> {
        IonTextParser::new(text).parse_document()
    }

    fn value(text: &str) -> WireValue {
        parse(text).unwrap().value
    }

    #[test]
    fn parses_struct_with_comments_and_annotations() {
        let doc = parse(
            "$ion_1_0 // marker\n'aws-type:Boom'::{ /* c */ message: \"bad\", 'quoted key': [1, 2.5, 3e0], }",
        )
        .unwrap();
        assert_eq!(doc.annotations, vec!["aws-type:Boom".to_owned()]);
        assert_eq!(doc.value.get("message").and_then(WireValue::as_str), Some("bad"));
        assert_eq!(
            doc.value.get("quoted key"),
            Some(&WireValue::Array(vec![
                WireValue::Integer(1),
                WireValue::Decimal(Decimal::new(25, 1)),
                WireValue::Float(3.0),
            ]))
        );
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(value("-0x1F"), WireValue::Integer(-31));
        assert_eq!(value("0b101"), WireValue::Integer(5));
        assert_eq!(value("1_000"), WireValue::Integer(1000));
        assert_eq!(value("27315d-2"), WireValue::Decimal(Decimal::new(27315, 2)));
        assert_eq!(value("1.5d1"), WireValue::Decimal(Decimal::new(15, 0)));
        assert_eq!(value("18446744073709551615"), WireValue::UInteger(u64::MAX));
        assert_eq!(value("-inf"), WireValue::Float(f64::NEG_INFINITY));
        assert!(matches!(value("nan"), WireValue::Float(f) if f.is_nan()));
    }

    #[test]
    fn parses_strings_and_lobs() {
        assert_eq!(value(r#""aé\n""#), WireValue::Str("a\u{e9}\n".into()));
        assert_eq!(value("'''ab''' '''cd'''"), WireValue::Str("abcd".into()));
        assert_eq!(value("{{ aGk= }}"), WireValue::Bytes(b"hi".to_vec()));
        assert_eq!(value("{{\"hi\"}}"), WireValue::Bytes(b"hi".to_vec()));
        assert_eq!(value("null.string"), WireValue::Null);
        assert_eq!(value("some_symbol"), WireValue::Str("some_symbol".into()));
    }

    #[test]
    fn parses_timestamps() {
        let base = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(value("2020-01-02T03:04:05Z"), WireValue::Timestamp(base));
        assert_eq!(
            value("2020-01-02T04:04:05.250+01:00"),
            WireValue::Timestamp(base + Duration::milliseconds(250))
        );
        assert_eq!(
            value("2020T"),
            WireValue::Timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(matches!(
            parse("2020-13-01"),
            Err(IonError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn parses_sexp_operators() {
        assert_eq!(
            value("(+ 1 -2)"),
            WireValue::Array(vec![
                WireValue::Str("+".into()),
                WireValue::Integer(1),
                WireValue::Integer(-2),
            ])
        );
    }

    #[test]
    fn resolves_symbol_ids() {
        assert_eq!(
            value("{$4:1,'$4':2}"),
            WireValue::Object(vec![
                ("name".into(), WireValue::Integer(1)),
                ("$4".into(), WireValue::Integer(2)),
            ])
        );
        assert_eq!(value("$1"), WireValue::Str("$ion".into()));
        assert_eq!(parse("$4::5").unwrap().annotations, vec!["name".to_owned()]);
        assert_eq!(parse("$10"), Err(IonError::UnknownSymbol(10)));
        assert_eq!(parse("{$0:1}"), Err(IonError::UnknownSymbol(0)));
    }

    #[test]
    fn reports_errors() {
        assert_eq!(parse("  // nothing\n"), Err(IonError::NoValue));
        assert!(matches!(parse("{a 1}"), Err(IonError::Syntax { .. })));
        assert!(matches!(parse("[1, 2"), Err(IonError::Syntax { .. })));
        assert!(matches!(parse("\"open"), Err(IonError::Syntax { .. })));
    }
}
