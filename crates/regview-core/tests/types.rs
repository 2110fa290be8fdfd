//! Tests for value types

use regview_core::types::{CellKind, CellRef, ElementSize, NumberFormat, PluginSymbol, RegisterType, RegisterValue};

#[test]
fn test_plugin_symbol_new()
{
    let symbol = PluginSymbol::new(0x1000, "fas_counter", 4);
    assert_eq!(symbol.address(), 0x1000);
    assert_eq!(symbol.name(), "fas_counter");
    assert_eq!(symbol.size(), 4);
}

#[test]
fn test_plugin_symbol_equality()
{
    let a = PluginSymbol::new(0x1000, "a", 1);
    let b = PluginSymbol::new(0x1000, "a", 1);
    let c = PluginSymbol::new(0x1000, "a", 2);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.clone(), a);
}

#[test]
fn test_plugin_symbol_display()
{
    let symbol = PluginSymbol::new(0x40_1000, "main", 0);
    assert_eq!(symbol.to_string(), "0x0000000000401000   0 main");
}

#[test]
fn test_cell_ref_ordering()
{
    assert!(CellRef::new(1) < CellRef::new(2));
    assert_eq!(CellRef::new(7).index(), 7);
}

#[test]
fn test_single_bit_kind()
{
    assert!(CellKind::BitField { offset: 3, length: 1 }.is_single_bit());
    assert!(!CellKind::BitField { offset: 11, length: 3 }.is_single_bit());
    assert!(!CellKind::NormalRegister.is_single_bit());
}

#[test]
fn test_element_size_widths()
{
    assert_eq!(ElementSize::Byte.bytes(), 1);
    assert_eq!(ElementSize::Qword.bits(), 64);
    assert_eq!(NumberFormat::Float.to_string(), "float");
}

#[test]
fn test_register_value_bytes_mut()
{
    let mut value = RegisterValue::from_u64("RCX", RegisterType::GeneralPurpose, 0, 8);
    value.bytes_mut()[0] = 0x2a;
    assert_eq!(value.as_u64(), Some(0x2a));
    assert_eq!(value.name(), "RCX");
    assert_eq!(value.register_type(), RegisterType::GeneralPurpose);
}
