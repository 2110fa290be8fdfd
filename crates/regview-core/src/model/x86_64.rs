//! x86-64 register file layout.
//!
//! Category and register names the value fields key their guards on, and a
//! sample register file used by the terminal view and the tests.
//!
//! ## Layout
//!
//! - **General Purpose**: RAX-R15, RIP, RFLAGS (+ status flag bit fields)
//! - **FPU**: R0-R7 (80-bit, with float views), FCW, FSR (+ condition codes,
//!   TOP), FTW
//! - **SSE**: XMM0-XMM7 (with 32-bit float lanes), MXCSR

use super::memory::{InMemoryModel, ModelBuilder};
use crate::types::registers::f64_to_x87;
use crate::types::{ElementSize, NumberFormat, RegisterType};

/// Name of the general-purpose register category.
///
/// Integer mutations (increment, zero, ...) only apply to its registers.
pub const GPR_CATEGORY_NAME: &str = "General Purpose";

/// Name of the x87 category.
pub const FPU_CATEGORY_NAME: &str = "FPU";

/// Name of the SSE category.
pub const SSE_CATEGORY_NAME: &str = "SSE";

/// Name of the x87 status word register.
///
/// Push/pop of the FPU stack is offered only for the cell with this name.
pub const FSR_NAME: &str = "FSR";

/// Bit offset of the TOP field inside the FPU status word.
pub const FSR_TOP_OFFSET: u8 = 11;

/// Mask of the TOP field inside the FPU status word.
pub const FSR_TOP_MASK: u16 = 0x3800;

const GPR_NAMES: [&str; 16] = [
    "RAX", "RBX", "RCX", "RDX", "RSI", "RDI", "RBP", "RSP", "R8", "R9", "R10", "R11", "R12", "R13", "R14", "R15",
];

/// RFLAGS status and control bits: (name, offset)
const RFLAGS_BITS: [(&str, u8); 9] = [
    ("CF", 0),
    ("PF", 2),
    ("AF", 4),
    ("ZF", 6),
    ("SF", 7),
    ("TF", 8),
    ("IF", 9),
    ("DF", 10),
    ("OF", 11),
];

/// FSR single-bit fields: (name, offset)
const FSR_BITS: [(&str, u8); 13] = [
    ("IE", 0),
    ("DE", 1),
    ("ZE", 2),
    ("OE", 3),
    ("UE", 4),
    ("PE", 5),
    ("SF", 6),
    ("ES", 7),
    ("C0", 8),
    ("C1", 9),
    ("C2", 10),
    ("C3", 14),
    ("B", 15),
];

/// Build a sample x86-64 register file
///
/// Values are arbitrary but stable, so tests can rely on them:
///
/// - `RAX` = 0, `RBX` = 1, other GPRs hold small distinct values
/// - `RFLAGS` = 0x246 (PF, ZF, IF set)
/// - `FSR` = 0x3800 (TOP = 7, one value pushed)
/// - `R7` holds 1.0, other x87 registers are empty
/// - `XMM0` lanes hold 1.0, 2.0, 3.0, 4.0
#[must_use]
pub fn sample() -> InMemoryModel
{
    let mut builder = ModelBuilder::new();

    let gpr = builder.category(GPR_CATEGORY_NAME);
    for (index, name) in GPR_NAMES.iter().enumerate() {
        let value: u64 = match *name {
            "RAX" => 0,
            "RBX" => 1,
            "RSP" => 0x7ffd_e4a0_1f20,
            "RBP" => 0x7ffd_e4a0_1f60,
            _ => 0x10 * index as u64,
        };
        builder.register(gpr, name, RegisterType::GeneralPurpose, &value.to_le_bytes());
    }
    builder.register(gpr, "RIP", RegisterType::GeneralPurpose, &0x5555_5555_5149u64.to_le_bytes());
    let rflags = builder.register(gpr, "RFLAGS", RegisterType::GeneralPurpose, &0x246u64.to_le_bytes());
    for (name, offset) in RFLAGS_BITS {
        builder.bit_field(rflags, name, offset, 1);
    }

    let fpu = builder.category(FPU_CATEGORY_NAME);
    for index in 0..8 {
        let value = if index == 7 { f64_to_x87(1.0) } else { f64_to_x87(0.0) };
        builder.fpu_register(fpu, &format!("R{index}"), &value);
    }
    builder.register(fpu, "FCW", RegisterType::Other, &0x037fu16.to_le_bytes());
    let fsr = builder.register(fpu, FSR_NAME, RegisterType::Other, &0x3800u16.to_le_bytes());
    for (name, offset) in FSR_BITS {
        builder.bit_field(fsr, name, offset, 1);
    }
    builder.bit_field(fsr, "TOP", FSR_TOP_OFFSET, 3);
    builder.register(fpu, "FTW", RegisterType::Other, &0x3fffu16.to_le_bytes());

    let sse = builder.category(SSE_CATEGORY_NAME);
    for index in 0..8u8 {
        let mut bytes = [0u8; 16];
        if index == 0 {
            for (lane, value) in [1.0f32, 2.0, 3.0, 4.0].iter().enumerate() {
                bytes[lane * 4..lane * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
        } else {
            bytes[0] = index;
        }
        let xmm = builder.register(sse, &format!("XMM{index}"), RegisterType::Simd, &bytes);
        builder.lanes(xmm, ElementSize::Dword, NumberFormat::Float);
    }
    builder.register(sse, "MXCSR", RegisterType::Other, &0x1f80u32.to_le_bytes());

    builder.build()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::RegisterModel;
    use crate::types::{CellKind, FlagKind};

    const ROLES: [FlagKind; 5] = [
        FlagKind::NormalRegister,
        FlagKind::BitField,
        FlagKind::SimdElement,
        FlagKind::FpuRegister,
        FlagKind::RegisterChanged,
    ];

    fn roles(model: &InMemoryModel, name: &str) -> Vec<FlagKind>
    {
        let cell = model.find(name).unwrap();
        ROLES.into_iter().filter(|flag| model.flag(cell, *flag)).collect()
    }

    #[test]
    fn test_sample_layout()
    {
        let model = sample();
        let roots = model.roots();
        assert_eq!(roots.len(), 3);
        assert_eq!(model.name(roots[0]), Some(GPR_CATEGORY_NAME));

        let fsr = model.find(FSR_NAME).unwrap();
        assert_eq!(model.raw_bytes(fsr).as_slice(), &[0x00, 0x38]);
        let top = model.find("TOP").unwrap();
        assert_eq!(model.kind(top), CellKind::BitField { offset: 11, length: 3 });
        assert_eq!(model.text(top), "7");

        let r7_value = model.find("R7.value").unwrap();
        assert_eq!(model.text(r7_value), "1");
        let lane = model.find("XMM0[2]").unwrap();
        assert_eq!(model.text(lane), "3");
    }

    #[test]
    fn test_role_flags()
    {
        let mut model = sample();
        assert_eq!(roles(&model, "RAX"), vec![FlagKind::NormalRegister]);
        assert_eq!(roles(&model, "ZF"), vec![FlagKind::BitField]);
        assert_eq!(roles(&model, "XMM0[1]"), vec![FlagKind::SimdElement]);
        assert_eq!(roles(&model, "R0"), vec![FlagKind::NormalRegister, FlagKind::FpuRegister]);
        assert!(roles(&model, "R0.value").is_empty());
        assert!(roles(&model, FPU_CATEGORY_NAME).is_empty());

        let rflags = model.find("RFLAGS").unwrap();
        model.set_raw_bytes(rflags, &0x206u64.to_le_bytes()).unwrap();
        assert_eq!(roles(&model, "ZF"), vec![FlagKind::BitField, FlagKind::RegisterChanged]);
        assert_eq!(roles(&model, "RFLAGS"), vec![FlagKind::NormalRegister, FlagKind::RegisterChanged]);
        assert_eq!(roles(&model, "CF"), vec![FlagKind::BitField]);

        model.sample_step();
        assert_eq!(roles(&model, "ZF"), vec![FlagKind::BitField]);
    }
}
