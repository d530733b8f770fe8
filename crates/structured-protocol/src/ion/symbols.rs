//! Symbol tables for the Ion binary encoding.

use std::collections::HashMap;

use super::constants::SYSTEM_SYMBOLS;
use super::IonError;

/// Parses `$<digits>`, the text spelling of a symbol id. Ids too large for
/// `usize` come back as `usize::MAX` so that they fail to resolve.
pub fn symbol_id(text: &str) -> Option<usize> {
    let digits = text.strip_prefix('$')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(usize::MAX))
}

/// Local symbols collected while encoding, numbered after the system table.
#[derive(Debug, Default)]
pub struct LocalSymbols {
    ids: HashMap<String, usize>,
    symbols: Vec<String>,
}

impl LocalSymbols {
    /// Returns the symbol id of `text`, adding it when new. System symbols
    /// resolve to their fixed id.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(sid) = SYSTEM_SYMBOLS.iter().skip(1).position(|s| *s == text) {
            return sid + 1;
        }
        if let Some(sid) = self.ids.get(text) {
            return *sid;
        }
        let sid = SYSTEM_SYMBOLS.len() + self.symbols.len();
        self.ids.insert(text.to_owned(), sid);
        self.symbols.push(text.to_owned());
        sid
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.symbols.clear();
    }
}

/// Symbol table in effect while decoding a binary stream.
#[derive(Debug, Default)]
pub struct SymbolTable {
    local: Vec<Option<String>>,
}

impl SymbolTable {
    pub fn reset(&mut self) {
        self.local.clear();
    }

    /// Installs a new local table; `append` keeps the current local symbols
    /// (an `imports: $ion_symbol_table` declaration).
    pub fn install(&mut self, symbols: Vec<Option<String>>, append: bool) {
        if !append {
            self.local.clear();
        }
        self.local.extend(symbols);
    }

    pub fn resolve(&self, sid: usize) -> Result<String, IonError> {
        if sid == 0 {
            return Err(IonError::UnknownSymbol(sid));
        }
        if let Some(text) = SYSTEM_SYMBOLS.get(sid) {
            return Ok((*text).to_owned());
        }
        match self.local.get(sid - SYSTEM_SYMBOLS.len()) {
            Some(Some(text)) => Ok(text.clone()),
            _ => Err(IonError::UnknownSymbol(sid)),
        }
    }
}
