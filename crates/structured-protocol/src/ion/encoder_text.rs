//! Ion text encoder.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::SecondsFormat;

use super::generator::{IonContainer, IonEncoder, IonScalar};
use super::symbols::symbol_id;
use crate::WireFormat;

/// Identifiers that must be quoted when used as a field name.
const KEYWORDS: &[&str] = &["null", "true", "false", "nan"];

#[derive(Debug)]
struct Frame {
    container: IonContainer,
    first: bool,
}

#[derive(Debug, Default)]
pub struct IonTextEncoder {
    out: String,
    stack: Vec<Frame>,
    roots: usize,
}

impl IonTextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the separator and the field name that precede a value.
    fn prefix(&mut self, field: Option<&str>) {
        match self.stack.last_mut() {
            Some(frame) => {
                if !frame.first {
                    self.out.push(',');
                }
                frame.first = false;
            }
            None => {
                if self.roots > 0 {
                    self.out.push(' ');
                }
                self.roots += 1;
            }
        }
        if let Some(name) = field {
            write_symbol(&mut self.out, name);
            self.out.push(':');
        }
    }
}

impl IonEncoder for IonTextEncoder {
    fn format(&self) -> WireFormat {
        WireFormat::IonText
    }

    fn step_in(&mut self, container: IonContainer, field: Option<&str>) {
        self.prefix(field);
        self.out.push(match container {
            IonContainer::Struct => '{',
            IonContainer::List => '[',
        });
        self.stack.push(Frame {
            container,
            first: true,
        });
    }

    fn step_out(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.out.push(match frame.container {
                IonContainer::Struct => '}',
                IonContainer::List => ']',
            });
        }
    }

    fn write_scalar(&mut self, field: Option<&str>, value: IonScalar<'_>) {
        self.prefix(field);
        write_scalar(&mut self.out, value);
    }

    fn finish(&mut self) -> Vec<u8> {
        self.stack.clear();
        self.roots = 0;
        std::mem::take(&mut self.out).into_bytes()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !KEYWORDS.contains(&name)
        && symbol_id(name).is_none()
}

fn write_symbol(out: &mut String, name: &str) {
    if is_identifier(name) {
        out.push_str(name);
        return;
    }
    out.push('\'');
    for c in name.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn write_float(out: &mut String, float: f64) {
    if float.is_nan() {
        out.push_str("nan");
    } else if float.is_infinite() {
        out.push_str(if float > 0.0 { "+inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{float:e}");
    }
}

fn write_scalar(out: &mut String, value: IonScalar<'_>) {
    match value {
        IonScalar::Null => out.push_str("null"),
        IonScalar::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        IonScalar::Int(int) => {
            let _ = write!(out, "{int}");
        }
        IonScalar::Float(float) => write_float(out, float),
        IonScalar::Float32(float) => {
            if float.is_finite() {
                let _ = write!(out, "{float:e}");
            } else {
                write_float(out, f64::from(float));
            }
        }
        IonScalar::Decimal(decimal) => {
            let _ = write!(out, "{}d{}", decimal.mantissa(), -i64::from(decimal.scale()));
        }
        IonScalar::String(s) => match serde_json::to_string(s) {
            Ok(quoted) => out.push_str(&quoted),
            Err(_) => out.push_str("\"\""),
        },
        IonScalar::Blob(bytes) => {
            out.push_str("{{");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("}}");
        }
        IonScalar::Timestamp(ts) => {
            let format = if ts.timestamp_subsec_millis() == 0 {
                SecondsFormat::Secs
            } else {
                SecondsFormat::Millis
            };
            out.push_str(&ts.to_rfc3339_opts(format, true));
        }
    }
}
