//! # Plugin Symbols
//!
//! Enumerates the symbols a plugin module exports and turns them into
//! [`PluginSymbol`] records.
//!
//! Both the static and the dynamic symbol tables are read, so stripped shared
//! objects still list their exports. Only defined, named code and data symbols
//! are kept; the result is sorted by address and free of duplicates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use regview_core::symbols::load_plugin_symbols;
//!
//! let symbols = load_plugin_symbols("plugins/libfasloader.so")?;
//! for symbol in &symbols {
//!     println!("{symbol}");
//! }
//! # Ok::<(), regview_core::RegviewError>(())
//! ```

pub mod demangle;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use object::{Object, ObjectSymbol, SymbolKind};
use tracing::{debug, info};

use crate::error::{RegviewError, RegviewResult};
use crate::types::PluginSymbol;

/// Read a plugin image from disk and enumerate its symbols.
///
/// # Errors
///
/// `RegviewError::Io` when the file cannot be read, `RegviewError::SymbolParse`
/// when it is not an object file.
pub fn load_plugin_symbols(path: impl AsRef<Path>) -> RegviewResult<Vec<PluginSymbol>>
{
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let symbols = parse_plugin_symbols(&bytes)
        .map_err(|err| RegviewError::SymbolParse(format!("{}: {err}", path.display())))?;
    info!("Loaded {} symbols from {}", symbols.len(), path.display());
    Ok(symbols)
}

/// Enumerate the symbols of an in-memory object file.
///
/// # Errors
///
/// `RegviewError::SymbolParse` when the bytes are not an object file.
pub fn parse_plugin_symbols(data: &[u8]) -> RegviewResult<Vec<PluginSymbol>>
{
    let file = object::File::parse(data).map_err(|err| RegviewError::SymbolParse(err.to_string()))?;

    let mut seen = BTreeSet::new();
    for symbol in file.symbols().chain(file.dynamic_symbols()) {
        if !symbol.is_definition() || !matches!(symbol.kind(), SymbolKind::Text | SymbolKind::Data) {
            continue;
        }
        let Ok(name) = symbol.name() else {
            debug!("Skipping symbol with unreadable name at 0x{:x}", symbol.address());
            continue;
        };
        if name.is_empty() {
            continue;
        }
        seen.insert((symbol.address(), name.to_string(), byte_size(symbol.size())));
    }

    Ok(seen
        .into_iter()
        .map(|(address, name, size)| PluginSymbol::new(address, name, size))
        .collect())
}

/// Symbol size as a byte count, `0` when it does not fit in a `u8`.
fn byte_size(size: u64) -> u8
{
    u8::try_from(size).unwrap_or(0)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_byte_size_saturates_to_unsized()
    {
        assert_eq!(byte_size(8), 8);
        assert_eq!(byte_size(255), 255);
        assert_eq!(byte_size(256), 0);
    }

    #[test]
    fn test_garbage_is_a_parse_error()
    {
        let result = parse_plugin_symbols(b"definitely not an object file");
        assert!(matches!(result, Err(RegviewError::SymbolParse(_))));
    }
}
