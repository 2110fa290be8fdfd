//! Value editing requests
//!
//! A field's default action on a register does not edit anything by itself:
//! it produces an [`EditRequest`] describing which register to write and how
//! the user's text is interpreted. The app shows a popup for it and either
//! calls [`EditRequest::confirm_text`] or drops the request, which cancels the
//! edit without touching the model.

use regview_core::model::{format_lane, RegisterModel};
use regview_core::types::registers::{f64_to_x87, x87_to_f64, X87_EXTENDED_BYTES};
use regview_core::types::{CellKind, ElementSize, NumberFormat, RegisterType, RegisterValue};
use regview_core::{CellRef, RegviewError, RegviewResult};
use regview_utils::{debug, info};

/// Which editor a request needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope
{
    /// Integer register up to 64 bits, hex or decimal input
    General,
    /// One lane of a vector register
    Simd
    {
        size: ElementSize,
        format: NumberFormat,
        element: usize,
    },
    /// x87 register, float input stored as 80-bit extended
    Fpu,
}

/// Pending edit of one register
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest
{
    target: CellRef,
    value: RegisterValue,
    scope: EditScope,
}

impl EditRequest
{
    /// Request for editing `target`, scoped by the `clicked` cell.
    ///
    /// `clicked` is the cell the user acted on; for SIMD registers a clicked
    /// lane selects the lane being edited. Returns `None` when the target has
    /// no typed value or no editor fits it.
    pub fn for_cell<M: RegisterModel + ?Sized>(model: &M, target: CellRef, clicked: CellRef) -> Option<Self>
    {
        let value = model.register_value(target)?;
        let scope = match value.register_type() {
            RegisterType::Simd => {
                let (size, format, element) = lane_scope(model, target, clicked);
                EditScope::Simd { size, format, element }
            }
            _ if value.bit_size() <= 64 => EditScope::General,
            RegisterType::Fpu => EditScope::Fpu,
            _ => {
                debug!("No editor for {} ({} bits)", value.name(), value.bit_size());
                return None;
            }
        };
        Some(Self { target, value, scope })
    }

    #[must_use]
    pub fn target(&self) -> CellRef
    {
        self.target
    }

    /// Register value when the request was made.
    #[must_use]
    pub fn value(&self) -> &RegisterValue
    {
        &self.value
    }

    #[must_use]
    pub fn scope(&self) -> EditScope
    {
        self.scope
    }

    /// Popup title.
    #[must_use]
    pub fn title(&self) -> String
    {
        let name = self.value.name();
        match self.scope {
            EditScope::General => format!("Modify {name}"),
            EditScope::Simd { size, format, element } => format!("Modify {name}[{element}] ({size} {format})"),
            EditScope::Fpu => format!("Modify {name} (x87)"),
        }
    }

    /// Current value rendered the way the editor parses it.
    #[must_use]
    pub fn initial_text(&self) -> String
    {
        let bytes = self.value.bytes();
        match self.scope {
            EditScope::General => {
                let digits = bytes.len() * 2;
                format!("0x{:0digits$x}", self.value.as_u64().unwrap_or(0))
            }
            EditScope::Simd { size, format, element } => {
                let start = element * size.bytes();
                bytes
                    .get(start..start + size.bytes())
                    .map(|lane| format_lane(lane, size, format))
                    .unwrap_or_default()
            }
            EditScope::Fpu => x87_to_f64(bytes).map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    /// Parse user input into the value to store.
    ///
    /// # Errors
    ///
    /// `RegviewError::InvalidValue` when the text does not parse or does not
    /// fit the register (or lane) width.
    pub fn parse(&self, input: &str) -> RegviewResult<RegisterValue>
    {
        let mut value = self.value.clone();
        match self.scope {
            EditScope::General => {
                let width = value.bytes().len();
                let bits = u32::try_from(width * 8).unwrap_or(64);
                let parsed = parse_integer(input, bits, Signedness::Either)?;
                value.bytes_mut().copy_from_slice(&parsed.to_le_bytes()[..width]);
            }
            EditScope::Simd { size, format, element } => {
                let lane = parse_lane(input, size, format)?;
                let start = element * size.bytes();
                let target = value
                    .bytes_mut()
                    .get_mut(start..start + size.bytes())
                    .ok_or_else(|| RegviewError::InvalidValue(format!("lane {element} outside register")))?;
                target.copy_from_slice(&lane.to_le_bytes()[..size.bytes()]);
            }
            EditScope::Fpu => {
                if value.bytes().len() != X87_EXTENDED_BYTES {
                    return Err(RegviewError::InvalidValue(format!(
                        "{} is not an 80-bit register",
                        value.name()
                    )));
                }
                let float: f64 = input
                    .trim()
                    .parse()
                    .map_err(|e| RegviewError::InvalidValue(format!("'{}': {e}", input.trim())))?;
                value.bytes_mut().copy_from_slice(&f64_to_x87(float));
            }
        }
        Ok(value)
    }

    /// Write `value` to the target register, consuming the request.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn confirm<M: RegisterModel + ?Sized>(self, model: &mut M, value: &RegisterValue) -> RegviewResult<()>
    {
        model.set_register_value(self.target, value)?;
        info!("{} set to {:02x?}", value.name(), value.bytes());
        Ok(())
    }

    /// Parse `input` and write it, consuming the request.
    ///
    /// # Errors
    ///
    /// Parse errors from [`EditRequest::parse`] or a refused model write.
    pub fn confirm_text<M: RegisterModel + ?Sized>(self, model: &mut M, input: &str) -> RegviewResult<()>
    {
        let value = self.parse(input)?;
        self.confirm(model, &value)
    }
}

/// Lane size, format and index to edit in a SIMD register.
fn lane_scope<M: RegisterModel + ?Sized>(model: &M, register: CellRef, clicked: CellRef) -> (ElementSize, NumberFormat, usize)
{
    if let CellKind::SimdElement { size, format, index } = model.kind(clicked) {
        return (size, format, index);
    }
    // Register itself was clicked: use the view of its first lane container
    model
        .children(register)
        .into_iter()
        .flat_map(|container| model.children(container))
        .find_map(|lane| match model.kind(lane) {
            CellKind::SimdElement { size, format, .. } => Some((size, format, 0)),
            _ => None,
        })
        .unwrap_or((ElementSize::Dword, NumberFormat::Hex, 0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signedness
{
    Unsigned,
    Signed,
    /// Unsigned range or a negative two's complement value
    Either,
}

/// Parse a hex (`0x`) or decimal integer that fits in `bits`.
///
/// Negative input is stored as two's complement. Underscores are ignored.
fn parse_integer(input: &str, bits: u32, signedness: Signedness) -> RegviewResult<u64>
{
    let invalid = |reason: String| RegviewError::InvalidValue(format!("'{}': {reason}", input.trim()));

    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid("empty input".to_string()));
    }
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    let magnitude = u64::from_str_radix(digits, radix).map_err(|e| invalid(e.to_string()))?;

    let bits = bits.clamp(1, 64);
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let sign_limit = 1u64 << (bits - 1);

    if negative {
        if signedness == Signedness::Unsigned {
            return Err(invalid("negative value for an unsigned field".to_string()));
        }
        if magnitude > sign_limit {
            return Err(invalid(format!("does not fit in {bits} bits")));
        }
        return Ok(magnitude.wrapping_neg() & mask);
    }

    let max = if signedness == Signedness::Signed { sign_limit - 1 } else { mask };
    if magnitude > max {
        return Err(invalid(format!("does not fit in {bits} bits")));
    }
    Ok(magnitude)
}

/// Parse one lane in `format`, returned in the low bits of a `u64`.
fn parse_lane(input: &str, size: ElementSize, format: NumberFormat) -> RegviewResult<u64>
{
    let text = input.trim();
    match format {
        NumberFormat::Hex => {
            let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
            parse_integer(&format!("0x{digits}"), size.bits(), Signedness::Unsigned)
        }
        NumberFormat::Unsigned => parse_integer(text, size.bits(), Signedness::Unsigned),
        NumberFormat::Signed => parse_integer(text, size.bits(), Signedness::Signed),
        NumberFormat::Float => {
            let invalid = |e: std::num::ParseFloatError| RegviewError::InvalidValue(format!("'{text}': {e}"));
            match size {
                ElementSize::Dword => Ok(u64::from(text.parse::<f32>().map_err(invalid)?.to_bits())),
                ElementSize::Qword => Ok(text.parse::<f64>().map_err(invalid)?.to_bits()),
                ElementSize::Byte | ElementSize::Word => Err(RegviewError::InvalidValue(format!(
                    "float input needs 32- or 64-bit lanes, not {size}"
                ))),
            }
        }
    }
}
