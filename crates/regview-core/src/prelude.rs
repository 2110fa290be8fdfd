//! Common module for library exports

pub use crate::error::{RegviewError, RegviewResult};
pub use crate::model::x86_64::{FSR_NAME, GPR_CATEGORY_NAME};
pub use crate::model::{InMemoryModel, ModelBuilder, RegisterModel};
pub use crate::mutation::{FpuStack, GprOp, Mutation, Skip};
pub use crate::types::{
    CellKind, CellRef, ElementSize, FlagKind, NumberFormat, PluginSymbol, RawBytes, RegisterType, RegisterValue,
};
