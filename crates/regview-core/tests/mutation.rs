//! Tests for register value mutation against the in-memory model

use regview_core::model::x86_64::{sample, FSR_NAME};
use regview_core::model::{ModelBuilder, RegisterModel};
use regview_core::mutation::{
    self, decrement, increment, invert, pop_fpu_stack, push_fpu_stack, set_to_one, set_zero, toggle_bit, Mutation, Skip,
};
use regview_core::types::RegisterType;
use regview_core::{CellRef, InMemoryModel, RegviewResult};

fn gpr_model(value: u64) -> (InMemoryModel, CellRef)
{
    let mut builder = ModelBuilder::new();
    let gpr = builder.category("General Purpose");
    let rax = builder.register(gpr, "RAX", RegisterType::GeneralPurpose, &value.to_le_bytes());
    (builder.build(), rax)
}

fn value_of(model: &InMemoryModel, cell: CellRef) -> u64
{
    mutation::stage(&model.raw_bytes(cell)).unwrap()
}

#[test]
fn test_increment_wraps()
{
    let (mut model, rax) = gpr_model(u64::MAX);
    let result = increment(&mut model, rax).unwrap();
    assert_eq!(result, Mutation::Applied { before: u64::MAX, after: 0 });
    assert_eq!(value_of(&model, rax), 0);
}

#[test]
fn test_decrement_wraps()
{
    let (mut model, rax) = gpr_model(0);
    decrement(&mut model, rax).unwrap();
    assert_eq!(value_of(&model, rax), u64::MAX);
}

#[test]
fn test_invert_complements()
{
    let (mut model, rax) = gpr_model(0x0f0f_0000_ffff_1234);
    invert(&mut model, rax).unwrap();
    assert_eq!(value_of(&model, rax), !0x0f0f_0000_ffff_1234u64);
}

#[test]
fn test_zero_one_increment_yields_two()
{
    let (mut model, rax) = gpr_model(0xdead_beef);
    set_zero(&mut model, rax).unwrap();
    assert_eq!(value_of(&model, rax), 0);
    set_to_one(&mut model, rax).unwrap();
    assert_eq!(value_of(&model, rax), 1);
    increment(&mut model, rax).unwrap();
    assert_eq!(value_of(&model, rax), 2);
}

#[test]
fn test_narrow_register_keeps_width()
{
    let mut builder = ModelBuilder::new();
    let gpr = builder.category("General Purpose");
    let al = builder.register(gpr, "AL", RegisterType::GeneralPurpose, &[0xff]);
    let mut model = builder.build();

    increment(&mut model, al).unwrap();
    assert_eq!(model.raw_bytes(al).as_slice(), &[0x00]);
}

#[test]
fn test_non_gpr_mutations_are_noops()
{
    let mut model = sample();
    let fsr = model.find(FSR_NAME).unwrap();
    let xmm1 = model.find("XMM1").unwrap();

    for cell in [fsr, xmm1] {
        let before = model.raw_bytes(cell);
        let ops: [fn(&mut InMemoryModel, CellRef) -> RegviewResult<Mutation>; 5] =
            [increment, decrement, invert, set_zero, set_to_one];
        for op in ops {
            let result = op(&mut model, cell).unwrap();
            assert_eq!(result, Mutation::Skipped(Skip::NotGeneralPurpose));
        }
        assert_eq!(model.raw_bytes(cell), before);
    }
}

#[test]
fn test_bit_field_is_not_a_gpr()
{
    let mut model = sample();
    let zf = model.find("ZF").unwrap();
    let result = increment(&mut model, zf).unwrap();
    assert!(!result.is_applied());
}

#[test]
fn test_empty_buffer_is_noop()
{
    let mut builder = ModelBuilder::new();
    let gpr = builder.category("General Purpose");
    let empty = builder.register(gpr, "EMPTY", RegisterType::GeneralPurpose, &[]);
    let flag = builder.bit_field(empty, "F", 0, 1);
    let mut model = builder.build();

    assert_eq!(increment(&mut model, empty).unwrap(), Mutation::Skipped(Skip::EmptyBuffer));
    assert_eq!(toggle_bit(&mut model, flag).unwrap(), Mutation::Skipped(Skip::EmptyBuffer));
    assert!(model.raw_bytes(empty).is_empty());
}

#[test]
fn test_toggle_single_bit()
{
    let mut builder = ModelBuilder::new();
    let other = builder.category("Misc");
    let byte = builder.register(other, "B", RegisterType::Other, &[0x00]);
    let bit0 = builder.bit_field(byte, "B0", 0, 1);
    let mut model = builder.build();

    toggle_bit(&mut model, bit0).unwrap();
    assert_eq!(model.raw_bytes(byte).as_slice(), &[0x01]);
    toggle_bit(&mut model, bit0).unwrap();
    assert_eq!(model.raw_bytes(byte).as_slice(), &[0x00]);
}

#[test]
fn test_toggle_rejects_wide_fields()
{
    let mut model = sample();
    let top = model.find("TOP").unwrap();
    let fsr = model.find(FSR_NAME).unwrap();
    let before = model.raw_bytes(fsr);

    assert_eq!(toggle_bit(&mut model, top).unwrap(), Mutation::Skipped(Skip::NotSingleBit));
    assert_eq!(model.raw_bytes(fsr), before);
}

#[test]
fn test_toggle_rflags_bit()
{
    let mut model = sample();
    let zf = model.find("ZF").unwrap();
    let rflags = model.find("RFLAGS").unwrap();

    toggle_bit(&mut model, zf).unwrap();
    assert_eq!(mutation::stage(&model.raw_bytes(rflags)).unwrap(), 0x206);
    assert_eq!(model.text(zf), "0");
}

#[test]
fn test_fpu_push_pop()
{
    let mut builder = ModelBuilder::new();
    let fpu = builder.category("FPU");
    let fsr = builder.register(fpu, FSR_NAME, RegisterType::Other, &0x0000u16.to_le_bytes());
    let mut model = builder.build();

    push_fpu_stack(&mut model, fsr).unwrap();
    assert_eq!(model.raw_bytes(fsr).as_slice(), &0x3800u16.to_le_bytes());
    pop_fpu_stack(&mut model, fsr).unwrap();
    assert_eq!(model.raw_bytes(fsr).as_slice(), &0x0000u16.to_le_bytes());
}

#[test]
fn test_fpu_top_cycles_modulo_eight()
{
    let mut model = sample();
    let fsr = model.find(FSR_NAME).unwrap();
    let top = model.find("TOP").unwrap();

    for _ in 0..8 {
        pop_fpu_stack(&mut model, fsr).unwrap();
    }
    assert_eq!(model.text(top), "7");
    pop_fpu_stack(&mut model, fsr).unwrap();
    assert_eq!(model.text(top), "0");
    push_fpu_stack(&mut model, fsr).unwrap();
    assert_eq!(model.text(top), "7");
}

#[test]
fn test_fpu_stack_needs_status_word()
{
    let mut model = sample();
    let rax = model.find("RAX").unwrap();
    assert_eq!(push_fpu_stack(&mut model, rax).unwrap(), Mutation::Skipped(Skip::NotStatusWord));
    assert_eq!(model.text(rax), "0000000000000000");
}
