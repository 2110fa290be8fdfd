//! # Error Types
//!
//! Errors raised by the register model and the symbol loader.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Field operations themselves never fail loudly: a mutation that does not
//! apply to a cell is skipped (see [`crate::mutation::Skip`]). The variants
//! below cover the cases where the model refuses a write or a plugin image
//! cannot be read.

use thiserror::Error;

use crate::types::CellRef;

/// Main error type for register model and symbol operations
///
/// ## Error Categories
///
/// 1. **Model errors**: UnknownCell, ReadOnly, WidthMismatch
/// 2. **Value errors**: InvalidValue
/// 3. **Symbol errors**: SymbolParse
/// 4. **I/O errors**: Io (reading plugin images from disk)
#[derive(Error, Debug)]
pub enum RegviewError
{
    /// The cell reference does not point at a node of this model
    ///
    /// This happens when a `CellRef` from one model is used with another,
    /// or when a field outlives the model it was built for.
    #[error("Unknown register cell: {0}")]
    UnknownCell(CellRef),

    /// The cell has no storage of its own
    ///
    /// Categories, bit fields and SIMD lanes derive their value from a parent
    /// register. Writes must go to the register that owns the bytes.
    #[error("Register cell {0} is read-only")]
    ReadOnly(CellRef),

    /// A raw write did not match the register width
    ///
    /// Raw writes always replace the whole register, so the buffer length must
    /// equal the register's byte width.
    #[error("Width mismatch for {cell}: expected {expected} bytes, got {actual}")]
    WidthMismatch
    {
        /// Register that rejected the write
        cell: CellRef,
        /// Width of the register in bytes
        expected: usize,
        /// Length of the rejected buffer
        actual: usize,
    },

    /// A textual value could not be parsed or does not fit the target
    ///
    /// Produced by editors when the user confirms input that cannot be
    /// represented in the register or lane being edited.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The plugin image is not an object file we understand
    #[error("Failed to parse plugin symbols: {0}")]
    SymbolParse(String),

    /// I/O error (reading plugin images, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, RegviewError>`
///
/// ```rust
/// use regview_core::error::RegviewResult;
/// fn foo() -> RegviewResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type RegviewResult<T> = std::result::Result<T, RegviewError>;
