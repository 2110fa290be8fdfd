//! Typed register values.

use std::fmt;

use smallvec::SmallVec;

/// Raw little-endian register bytes
///
/// Most registers fit in 16 bytes (XMM, x87), so the buffer stays inline.
pub type RawBytes = SmallVec<[u8; 16]>;

/// Width of an x87 extended precision value in bytes.
pub const X87_EXTENDED_BYTES: usize = 10;

/// Broad register class, used to pick an editor
///
/// ## Classes
///
/// - `GeneralPurpose`: integer registers (RAX, RFLAGS, segment registers)
/// - `Simd`: vector registers (XMM, YMM, NEON V)
/// - `Fpu`: x87 data registers holding 80-bit extended values
/// - `Other`: control and status words, anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterType
{
    /// Integer register
    GeneralPurpose,
    /// Vector register
    Simd,
    /// x87 data register
    Fpu,
    /// Anything else
    Other,
}

impl fmt::Display for RegisterType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            RegisterType::GeneralPurpose => "gpr",
            RegisterType::Simd => "simd",
            RegisterType::Fpu => "fpu",
            RegisterType::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// A register value together with its name and class
///
/// This is the typed accessor counterpart of the raw byte interface: editors
/// receive a `RegisterValue`, change its bytes, and hand it back to the model.
///
/// ## Example
///
/// ```rust
/// use regview_core::types::{RegisterType, RegisterValue};
///
/// let rax = RegisterValue::from_u64("RAX", RegisterType::GeneralPurpose, 0x1234, 8);
/// assert_eq!(rax.bit_size(), 64);
/// assert_eq!(rax.as_u64(), Some(0x1234));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue
{
    name: String,
    register_type: RegisterType,
    bytes: RawBytes,
}

impl RegisterValue
{
    /// Build from raw little-endian bytes.
    pub fn new(name: impl Into<String>, register_type: RegisterType, bytes: &[u8]) -> Self
    {
        Self {
            name: name.into(),
            register_type,
            bytes: SmallVec::from_slice(bytes),
        }
    }

    /// Build an integer register of `width` bytes (at most 8).
    ///
    /// Bits of `value` above the register width are dropped.
    pub fn from_u64(name: impl Into<String>, register_type: RegisterType, value: u64, width: usize) -> Self
    {
        let width = width.min(8);
        Self::new(name, register_type, &value.to_le_bytes()[..width])
    }

    /// Register name as shown in the view.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Register class.
    #[must_use]
    pub fn register_type(&self) -> RegisterType
    {
        self.register_type
    }

    /// Raw little-endian bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8]
    {
        &self.bytes
    }

    /// Mutable access to the raw bytes; the width cannot change.
    pub fn bytes_mut(&mut self) -> &mut [u8]
    {
        &mut self.bytes
    }

    /// Register width in bits.
    #[must_use]
    pub fn bit_size(&self) -> usize
    {
        self.bytes.len() * 8
    }

    /// Integer view for registers of at most 64 bits.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64>
    {
        if self.bytes.len() > 8 {
            return None;
        }
        let mut word = [0u8; 8];
        word[..self.bytes.len()].copy_from_slice(&self.bytes);
        Some(u64::from_le_bytes(word))
    }
}

/// Convert an `f64` to x87 80-bit extended precision (little-endian).
///
/// The conversion is exact: every `f64` is representable as an extended
/// value, including subnormals, infinities and NaNs.
///
/// ## Example
///
/// ```rust
/// use regview_core::types::registers::f64_to_x87;
///
/// assert_eq!(f64_to_x87(1.0), [0, 0, 0, 0, 0, 0, 0, 0x80, 0xff, 0x3f]);
/// ```
#[must_use]
pub fn f64_to_x87(value: f64) -> [u8; X87_EXTENDED_BYTES]
{
    let bits = value.to_bits();
    let sign = u16::from(bits >> 63 == 1) << 15;
    let exponent = (bits >> 52) & 0x7ff;
    let fraction = bits & ((1u64 << 52) - 1);

    let (exponent, mantissa): (u16, u64) = match exponent {
        0 if fraction == 0 => (0, 0),
        0 => {
            // Subnormal: normalize so the explicit integer bit is set.
            let shift = fraction.leading_zeros();
            (15372 - shift as u16, fraction << shift)
        }
        0x7ff => (0x7fff, (1 << 63) | (fraction << 11)),
        _ => (exponent as u16 + (16383 - 1023), (1 << 63) | (fraction << 11)),
    };

    let mut out = [0u8; X87_EXTENDED_BYTES];
    out[..8].copy_from_slice(&mantissa.to_le_bytes());
    out[8..].copy_from_slice(&(sign | exponent).to_le_bytes());
    out
}

/// Convert x87 80-bit extended precision bytes to the nearest `f64`.
///
/// Returns `None` when the buffer is not exactly 10 bytes long.
#[must_use]
pub fn x87_to_f64(bytes: &[u8]) -> Option<f64>
{
    if bytes.len() != X87_EXTENDED_BYTES {
        return None;
    }
    let mut mantissa = [0u8; 8];
    mantissa.copy_from_slice(&bytes[..8]);
    let mantissa = u64::from_le_bytes(mantissa);
    let sign_exponent = u16::from_le_bytes([bytes[8], bytes[9]]);
    let negative = sign_exponent & 0x8000 != 0;
    let exponent = i32::from(sign_exponent & 0x7fff);

    let magnitude = if exponent == 0x7fff {
        if mantissa << 1 == 0 {
            f64::INFINITY
        } else {
            f64::NAN
        }
    } else if mantissa == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        scale_by_power_of_two(mantissa as f64, exponent - 16383 - 63)
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Multiply by 2^exp in steps that never overflow or flush early.
fn scale_by_power_of_two(mut value: f64, mut exp: i32) -> f64
{
    const STEP: i32 = 1000;
    while exp > STEP {
        value *= 2f64.powi(STEP);
        exp -= STEP;
    }
    while exp < -STEP {
        value *= 2f64.powi(-STEP);
        exp += STEP;
    }
    value * 2f64.powi(exp)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_from_u64_truncates_to_width()
    {
        let al = RegisterValue::from_u64("AL", RegisterType::GeneralPurpose, 0x1ff, 1);
        assert_eq!(al.bytes(), &[0xff]);
        assert_eq!(al.as_u64(), Some(0xff));
    }

    #[test]
    fn test_as_u64_rejects_wide_registers()
    {
        let xmm = RegisterValue::new("XMM0", RegisterType::Simd, &[0; 16]);
        assert_eq!(xmm.as_u64(), None);
        assert_eq!(xmm.bit_size(), 128);
    }

    #[test]
    fn test_x87_known_encodings()
    {
        assert_eq!(f64_to_x87(0.0), [0; 10]);
        assert_eq!(f64_to_x87(-2.0), [0, 0, 0, 0, 0, 0, 0, 0x80, 0x00, 0xc0]);
        assert_eq!(f64_to_x87(f64::INFINITY), [0, 0, 0, 0, 0, 0, 0, 0x80, 0xff, 0x7f]);
    }

    #[test]
    fn test_x87_back_to_f64()
    {
        for value in [1.0, -2.5, 1.5e-3, 1e-310, 6.02e23] {
            assert_eq!(x87_to_f64(&f64_to_x87(value)), Some(value));
        }
        assert!(x87_to_f64(&f64_to_x87(f64::NAN)).is_some_and(f64::is_nan));
        assert_eq!(x87_to_f64(&[0; 8]), None);
    }
}
