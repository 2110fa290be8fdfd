//! Symbol demangling utilities.
//!
//! Plugin symbol records keep the raw linkage name. These helpers produce the
//! human-readable form for listings.
//!
//! - **Rust**: legacy (`_ZN...E`) and v0 (`_R...`) mangling via `rustc_demangle`
//! - **C / unmangled**: returned as-is

use rustc_demangle::try_demangle;

/// Demangled form of a raw symbol name, if it is a mangled Rust name.
///
/// ## Example
///
/// ```rust
/// use regview_core::symbols::demangle::demangled_name;
///
/// assert_eq!(
///     demangled_name("_ZN4core3fmt5write17h0123456789abcdefE").as_deref(),
///     Some("core::fmt::write")
/// );
/// assert_eq!(demangled_name("plugin_init"), None);
/// ```
#[must_use]
pub fn demangled_name(raw: &str) -> Option<String>
{
    // `{:#}` drops the trailing hash
    try_demangle(raw).ok().map(|name| format!("{name:#}"))
}

/// Preferred presentation: demangled with a fallback to the raw name.
#[must_use]
pub fn display_name(raw: &str) -> String
{
    demangled_name(raw).unwrap_or_else(|| raw.to_string())
}
