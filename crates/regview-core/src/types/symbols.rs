//! Plugin symbol records.

use std::fmt;

/// A symbol exported by a loaded plugin module
///
/// Plain value object: an address, a name and a byte size. Records are
/// immutable once constructed and are produced by symbol enumeration
/// ([`crate::symbols::parse_plugin_symbols`]) for whatever consumes the
/// symbol table.
///
/// ## Size
///
/// `size` is the byte width of the symbol. Symbols whose size does not fit in
/// a byte (large functions, tables) are recorded with size `0`, meaning
/// "unsized".
///
/// ## Example
///
/// ```rust
/// use regview_core::types::PluginSymbol;
///
/// let sym = PluginSymbol::new(0x40_1000, "counter", 4);
/// assert_eq!(sym.address(), 0x40_1000);
/// assert_eq!(sym.name(), "counter");
/// assert_eq!(sym.size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginSymbol
{
    address: u64,
    name: String,
    size: u8,
}

impl PluginSymbol
{
    /// Construct a record.
    pub fn new(address: u64, name: impl Into<String>, size: u8) -> Self
    {
        Self {
            address,
            name: name.into(),
            size,
        }
    }

    /// Address of the symbol.
    #[must_use]
    pub fn address(&self) -> u64
    {
        self.address
    }

    /// Raw (possibly mangled) symbol name.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Byte width, `0` when unknown or larger than 255.
    #[must_use]
    pub fn size(&self) -> u8
    {
        self.size
    }
}

impl fmt::Display for PluginSymbol
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x} {:>3} {}", self.address, self.size, self.name)
    }
}
