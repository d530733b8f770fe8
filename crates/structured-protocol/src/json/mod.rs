//! Text JSON: streaming generator and `serde_json`-backed parser.

mod generator;
mod parser;

pub use generator::JsonGenerator;
pub use parser::parse;
