//! # regview-core
//!
//! Register model, value mutation and plugin symbol records for regview.
//!
//! This crate provides the logic behind the register view, independent of
//! any terminal or GUI toolkit:
//! - A typed register model interface ([`RegisterModel`]) and an in-memory
//!   implementation with an x86-64 preset
//! - Bit/byte-level value mutation (increment, invert, bit toggle, FPU TOP)
//! - Plugin symbol records and their enumeration from object files
//!
//! ## Example
//!
//! ```rust
//! use regview_core::model::{x86_64, RegisterModel};
//! use regview_core::mutation;
//!
//! let mut model = x86_64::sample();
//! let rax = model.find("RAX").unwrap();
//! mutation::increment(&mut model, rax)?;
//! assert_eq!(model.text(rax), "0000000000000001");
//! # Ok::<(), regview_core::RegviewError>(())
//! ```

pub mod error;
pub mod model;
pub mod mutation;
pub mod prelude;
pub mod symbols;
pub mod types;

// Re-export commonly used types
pub use error::{RegviewError, RegviewResult};
pub use model::{InMemoryModel, RegisterModel};
pub use types::{CellKind, CellRef, PluginSymbol};
