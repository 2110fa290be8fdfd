//! # Register Model
//!
//! The capability interface value fields use to read and write register
//! state, plus an in-memory implementation.
//!
//! A model is a tree of cells. Categories ("General Purpose", "FPU", "SSE")
//! sit at the top, registers below them, and bit fields or SIMD lanes below
//! the registers. Fields never own cells: they hold a [`CellRef`] and ask the
//! model for everything else.
//!
//! ## Example
//!
//! ```rust
//! use regview_core::model::{x86_64, RegisterModel};
//!
//! let model = x86_64::sample();
//! let rax = model.find("RAX").expect("preset has RAX");
//! assert_eq!(model.raw_bytes(rax).len(), 8);
//! ```

pub mod memory;
pub mod x86_64;

pub use memory::{format_lane, InMemoryModel, ModelBuilder};

use crate::error::RegviewResult;
use crate::types::{CellKind, CellRef, FlagKind, RawBytes, RegisterValue};

/// Typed access to a hierarchical register model
///
/// This is the only seam between value fields and register storage. The
/// methods mirror what a field needs: raw bytes for integer mutations, kinds
/// and flags for dispatch, names for guards, and a typed value for editors.
///
/// Reads never fail: an unknown cell reads as empty bytes, `Other` kind and
/// no name. Writes return an error when the model refuses them.
pub trait RegisterModel
{
    /// Top-level cells (categories) in display order.
    fn roots(&self) -> Vec<CellRef>;

    /// Kind tag of the cell.
    fn kind(&self, cell: CellRef) -> CellKind;

    /// Parent of the cell, `None` for top-level categories.
    fn parent(&self, cell: CellRef) -> Option<CellRef>;

    /// Children in display order.
    fn children(&self, cell: CellRef) -> Vec<CellRef>;

    /// Display name (register or category name).
    fn name(&self, cell: CellRef) -> Option<&str>;

    /// Raw little-endian bytes of the cell; empty when it has no value.
    fn raw_bytes(&self, cell: CellRef) -> RawBytes;

    /// Replace the raw bytes of a register cell.
    ///
    /// # Errors
    ///
    /// Fails when the cell is unknown, has no storage of its own, or the
    /// buffer length differs from the register width.
    fn set_raw_bytes(&mut self, cell: CellRef, bytes: &[u8]) -> RegviewResult<()>;

    /// Text for the value column, before any field formatting.
    fn text(&self, cell: CellRef) -> String;

    /// Whether the value differs from the sample taken at the last step.
    ///
    /// `None` when the cell is unknown.
    fn changed(&self, cell: CellRef) -> Option<bool>;

    /// Typed value of a register cell.
    fn register_value(&self, cell: CellRef) -> Option<RegisterValue>;

    /// Store a typed value into a register cell.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RegisterModel::set_raw_bytes`].
    fn set_register_value(&mut self, cell: CellRef, value: &RegisterValue) -> RegviewResult<()>
    {
        self.set_raw_bytes(cell, value.bytes())
    }

    /// Mark the register the user is working with.
    fn set_active(&mut self, cell: Option<CellRef>);

    /// Register marked by the last [`RegisterModel::set_active`] call.
    fn active(&self) -> Option<CellRef>;

    /// Answer a boolean role query.
    ///
    /// x87 data registers own their bytes, so they answer both
    /// [`FlagKind::NormalRegister`] and [`FlagKind::FpuRegister`].
    fn flag(&self, cell: CellRef, flag: FlagKind) -> bool
    {
        match flag {
            FlagKind::NormalRegister => matches!(self.kind(cell), CellKind::NormalRegister | CellKind::FpuRegister),
            FlagKind::BitField => matches!(self.kind(cell), CellKind::BitField { .. }),
            FlagKind::SimdElement => matches!(self.kind(cell), CellKind::SimdElement { .. }),
            FlagKind::FpuRegister => self.kind(cell) == CellKind::FpuRegister,
            FlagKind::RegisterChanged => self.changed(cell).unwrap_or(false),
        }
    }

    /// Name of the parent cell, which for registers is the category name.
    fn category_name(&self, cell: CellRef) -> Option<&str>
    {
        self.parent(cell).and_then(|parent| self.name(parent))
    }
}
