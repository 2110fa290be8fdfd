//! Tests for plugin symbol enumeration

use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};
use regview_core::symbols::{load_plugin_symbols, parse_plugin_symbols};
use regview_core::RegviewError;

fn add_symbol(obj: &mut Object<'_>, name: &str, kind: SymbolKind, data: &[u8])
{
    let section = match kind {
        SymbolKind::Text => obj.section_id(StandardSection::Text),
        _ => obj.section_id(StandardSection::Data),
    };
    let id = obj.add_symbol(Symbol {
        name: name.as_bytes().to_vec(),
        value: 0,
        size: 0,
        kind,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.add_symbol_data(id, section, data, 1);
}

fn plugin_image() -> Vec<u8>
{
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    add_symbol(&mut obj, "fas_counter", SymbolKind::Data, &[0; 4]);
    add_symbol(&mut obj, "fas_table", SymbolKind::Data, &[0; 300]);
    add_symbol(&mut obj, "fas_entry", SymbolKind::Text, &[0xc3]);
    obj.write().unwrap()
}

#[test]
fn test_enumerates_defined_symbols()
{
    let symbols = parse_plugin_symbols(&plugin_image()).unwrap();
    let names: Vec<&str> = symbols.iter().map(|s| s.name()).collect();

    assert!(names.contains(&"fas_counter"));
    assert!(names.contains(&"fas_table"));
    assert!(names.contains(&"fas_entry"));
}

#[test]
fn test_sizes_fit_a_byte()
{
    let symbols = parse_plugin_symbols(&plugin_image()).unwrap();
    let size_of = |name: &str| symbols.iter().find(|s| s.name() == name).map(|s| s.size());

    assert_eq!(size_of("fas_counter"), Some(4));
    assert_eq!(size_of("fas_entry"), Some(1));
    // 300 bytes do not fit in a u8
    assert_eq!(size_of("fas_table"), Some(0));
}

#[test]
fn test_missing_file_is_io_error()
{
    let result = load_plugin_symbols("/nonexistent/plugin.so");
    assert!(matches!(result, Err(RegviewError::Io(_))));
}
