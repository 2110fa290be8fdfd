//! # Types
//!
//! Value types shared by the register model, the mutation algorithms and the
//! views built on top of them.

pub mod cell;
pub mod registers;
pub mod symbols;

// Re-export all public types
pub use cell::{CellKind, CellRef, ElementSize, FlagKind, NumberFormat};
pub use registers::{RawBytes, RegisterType, RegisterValue};
pub use symbols::PluginSymbol;
