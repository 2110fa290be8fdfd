//! # Register Value Mutation
//!
//! Bit- and byte-level edits a value field applies to its register:
//!
//! - integer transforms on general-purpose registers (increment, decrement,
//!   invert, zero, set to one)
//! - toggling a single-bit field inside its parent register
//! - moving the x87 stack pointer (TOP) in the FPU status word
//!
//! Every operation follows the same pattern: read raw bytes from the model,
//! stage them in a `u64`, transform, write the same number of bytes back.
//!
//! ## Skips are not errors
//!
//! An operation that does not apply to the cell (wrong category, empty
//! buffer, wrong kind) returns [`Mutation::Skipped`] and leaves the model
//! untouched. Only a write the model refuses is an `Err`.
//!
//! Buffers wider than the 8-byte staging integer are a caller bug: they trip a
//! `debug_assert!` and are skipped in release builds, never truncated.

use std::fmt;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::RegviewResult;
use crate::model::x86_64::{FSR_NAME, FSR_TOP_MASK, FSR_TOP_OFFSET, GPR_CATEGORY_NAME};
use crate::model::RegisterModel;
use crate::types::{CellKind, CellRef, RawBytes};

/// Why an operation left the model untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip
{
    /// The cell's parent is not the general-purpose category
    NotGeneralPurpose,
    /// The model returned no bytes
    EmptyBuffer,
    /// More bytes than the staging integer holds
    Oversized(usize),
    /// The cell is not a bit field one bit wide
    NotSingleBit,
    /// The bit field has no parent register
    NoParent,
    /// The bit lies outside the parent register
    BitOutOfRange
    {
        /// Bit offset of the field
        offset: u8,
        /// Register width in bytes
        width: usize,
    },
    /// The cell is not the FPU status word
    NotStatusWord,
    /// The status word is not two bytes wide
    StatusWordWidth(usize),
}

impl fmt::Display for Skip
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Skip::NotGeneralPurpose => write!(f, "not a general-purpose register"),
            Skip::EmptyBuffer => write!(f, "no value"),
            Skip::Oversized(len) => write!(f, "{len} bytes do not fit in 64 bits"),
            Skip::NotSingleBit => write!(f, "not a single-bit field"),
            Skip::NoParent => write!(f, "bit field without register"),
            Skip::BitOutOfRange { offset, width } => write!(f, "bit {offset} outside {width}-byte register"),
            Skip::NotStatusWord => write!(f, "not the FPU status word"),
            Skip::StatusWordWidth(len) => write!(f, "status word is {len} bytes"),
        }
    }
}

/// Result of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation
{
    /// The model was written
    Applied
    {
        /// Staged value before the transform
        before: u64,
        /// Staged value written back
        after: u64,
    },
    /// Nothing was written
    Skipped(Skip),
}

impl Mutation
{
    /// Whether the model was written.
    #[must_use]
    pub const fn is_applied(self) -> bool
    {
        matches!(self, Mutation::Applied { .. })
    }
}

/// Integer transforms for general-purpose registers
///
/// Arithmetic wraps at 64 bits; the write-back then keeps only the register's
/// own width, so an 8-bit register wraps at 8 bits.
///
/// ## Example
///
/// ```rust
/// use regview_core::mutation::GprOp;
///
/// assert_eq!(GprOp::Increment.apply(u64::MAX), 0);
/// assert_eq!(GprOp::Decrement.apply(0), u64::MAX);
/// assert_eq!(GprOp::Invert.apply(0xff), !0xff);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GprOp
{
    /// `v + 1`
    Increment,
    /// `v - 1`
    Decrement,
    /// `!v`
    Invert,
    /// `0`
    Zero,
    /// `1`
    One,
}

impl GprOp
{
    /// Apply the transform to a staged value.
    #[must_use]
    pub const fn apply(self, value: u64) -> u64
    {
        match self {
            GprOp::Increment => value.wrapping_add(1),
            GprOp::Decrement => value.wrapping_sub(1),
            GprOp::Invert => !value,
            GprOp::Zero => 0,
            GprOp::One => 1,
        }
    }
}

impl fmt::Display for GprOp
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            GprOp::Increment => "increment",
            GprOp::Decrement => "decrement",
            GprOp::Invert => "invert",
            GprOp::Zero => "zero",
            GprOp::One => "set to one",
        };
        write!(f, "{label}")
    }
}

/// Stage little-endian bytes in a `u64`.
///
/// # Errors
///
/// `Skip::EmptyBuffer` for no bytes, `Skip::Oversized` for more than 8 (after
/// a failed `debug_assert!`).
pub fn stage(bytes: &[u8]) -> Result<u64, Skip>
{
    if bytes.is_empty() {
        return Err(Skip::EmptyBuffer);
    }
    debug_assert!(bytes.len() <= 8, "{} raw bytes do not fit the 64-bit staging integer", bytes.len());
    if bytes.len() > 8 {
        return Err(Skip::Oversized(bytes.len()));
    }
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(u64::from_le_bytes(word))
}

/// Low `width` bytes of a staged value, little-endian.
#[must_use]
pub fn unstage(value: u64, width: usize) -> RawBytes
{
    SmallVec::from_slice(&value.to_le_bytes()[..width.min(8)])
}

/// Whether `cell` is a register of the general-purpose category.
pub fn is_general_purpose<M: RegisterModel + ?Sized>(model: &M, cell: CellRef) -> bool
{
    model.category_name(cell) == Some(GPR_CATEGORY_NAME)
}

/// Whether `cell` is the FPU status word.
pub fn is_status_word<M: RegisterModel + ?Sized>(model: &M, cell: CellRef) -> bool
{
    model.name(cell) == Some(FSR_NAME)
}

/// Current staged value of a general-purpose register.
///
/// `None` for other cells and for empty buffers.
pub fn gpr_value<M: RegisterModel + ?Sized>(model: &M, cell: CellRef) -> Option<u64>
{
    if !is_general_purpose(model, cell) {
        return None;
    }
    stage(&model.raw_bytes(cell)).ok()
}

/// Apply an integer transform to a general-purpose register.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn apply_gpr<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef, op: GprOp) -> RegviewResult<Mutation>
{
    if !is_general_purpose(model, cell) {
        return Ok(Mutation::Skipped(Skip::NotGeneralPurpose));
    }
    let bytes = model.raw_bytes(cell);
    let before = match stage(&bytes) {
        Ok(value) => value,
        Err(skip) => return Ok(Mutation::Skipped(skip)),
    };
    let after = op.apply(before);
    model.set_raw_bytes(cell, &unstage(after, bytes.len()))?;
    debug!(
        "{} {}: 0x{:x} -> 0x{:x}",
        op,
        model.name(cell).unwrap_or("?"),
        before,
        after
    );
    Ok(Mutation::Applied { before, after })
}

/// `v + 1` on a general-purpose register.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn increment<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    apply_gpr(model, cell, GprOp::Increment)
}

/// `v - 1` on a general-purpose register.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn decrement<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    apply_gpr(model, cell, GprOp::Decrement)
}

/// `!v` on a general-purpose register.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn invert<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    apply_gpr(model, cell, GprOp::Invert)
}

/// Zero a general-purpose register.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn set_zero<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    apply_gpr(model, cell, GprOp::Zero)
}

/// Set a general-purpose register to 1.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn set_to_one<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    apply_gpr(model, cell, GprOp::One)
}

/// Flip a single-bit field inside its parent register.
///
/// The parent's bytes are staged whole, the bit at the field's offset is
/// XORed, and the same width is written back to the parent.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn toggle_bit<M: RegisterModel + ?Sized>(model: &mut M, field: CellRef) -> RegviewResult<Mutation>
{
    let CellKind::BitField { offset, length: 1 } = model.kind(field) else {
        return Ok(Mutation::Skipped(Skip::NotSingleBit));
    };
    let Some(register) = model.parent(field) else {
        return Ok(Mutation::Skipped(Skip::NoParent));
    };
    let bytes = model.raw_bytes(register);
    let before = match stage(&bytes) {
        Ok(value) => value,
        Err(skip) => return Ok(Mutation::Skipped(skip)),
    };
    if usize::from(offset) >= bytes.len() * 8 {
        return Ok(Mutation::Skipped(Skip::BitOutOfRange {
            offset,
            width: bytes.len(),
        }));
    }
    let after = before ^ (1u64 << offset);
    model.set_raw_bytes(register, &unstage(after, bytes.len()))?;
    debug!(
        "toggle {}.{}: 0x{:x} -> 0x{:x}",
        model.name(register).unwrap_or("?"),
        model.name(field).unwrap_or("?"),
        before,
        after
    );
    Ok(Mutation::Applied { before, after })
}

/// Add `delta` to the TOP field of an FPU status word, modulo 8.
///
/// ## Example
///
/// ```rust
/// use regview_core::mutation::add_to_top;
///
/// assert_eq!(add_to_top(0x0000, -1), 0x3800); // push from TOP=0
/// assert_eq!(add_to_top(0x3800, 1), 0x0000); // pop from TOP=7
/// assert_eq!(add_to_top(0x4100, 1), 0x4900); // other bits untouched
/// ```
#[must_use]
pub fn add_to_top(word: u16, delta: i8) -> u16
{
    let top = i16::try_from((word & FSR_TOP_MASK) >> FSR_TOP_OFFSET).unwrap_or(0);
    let moved = (top + i16::from(delta)).rem_euclid(8);
    #[allow(clippy::cast_sign_loss)]
    let moved = moved as u16;
    (word & !FSR_TOP_MASK) | (moved << FSR_TOP_OFFSET)
}

/// Direction of an x87 stack operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpuStack
{
    /// TOP - 1
    Push,
    /// TOP + 1
    Pop,
}

impl FpuStack
{
    /// Signed change applied to TOP.
    #[must_use]
    pub const fn delta(self) -> i8
    {
        match self {
            FpuStack::Push => -1,
            FpuStack::Pop => 1,
        }
    }
}

/// Push or pop the x87 stack by moving TOP in the status word `cell`.
///
/// # Errors
///
/// Propagates a refused model write.
pub fn adjust_fpu_top<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef, op: FpuStack) -> RegviewResult<Mutation>
{
    if !is_status_word(model, cell) {
        return Ok(Mutation::Skipped(Skip::NotStatusWord));
    }
    let bytes = model.raw_bytes(cell);
    if bytes.is_empty() {
        return Ok(Mutation::Skipped(Skip::EmptyBuffer));
    }
    debug_assert_eq!(bytes.len(), 2, "FPU status word must be 2 bytes");
    if bytes.len() != 2 {
        return Ok(Mutation::Skipped(Skip::StatusWordWidth(bytes.len())));
    }
    let before = u16::from_le_bytes([bytes[0], bytes[1]]);
    let after = add_to_top(before, op.delta());
    model.set_raw_bytes(cell, &after.to_le_bytes())?;
    debug!("{:?} FPU stack: FSR 0x{:04x} -> 0x{:04x}", op, before, after);
    Ok(Mutation::Applied {
        before: u64::from(before),
        after: u64::from(after),
    })
}

/// Push the x87 stack (TOP - 1).
///
/// # Errors
///
/// Propagates a refused model write.
pub fn push_fpu_stack<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    adjust_fpu_top(model, cell, FpuStack::Push)
}

/// Pop the x87 stack (TOP + 1).
///
/// # Errors
///
/// Propagates a refused model write.
pub fn pop_fpu_stack<M: RegisterModel + ?Sized>(model: &mut M, cell: CellRef) -> RegviewResult<Mutation>
{
    adjust_fpu_top(model, cell, FpuStack::Pop)
}
