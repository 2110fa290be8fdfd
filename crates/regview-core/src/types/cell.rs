//! Register model cells: references, kinds and flags.

use std::fmt;

/// Reference to one cell of a register model
///
/// A `CellRef` is a lookup key, not an owner: fields store it and ask the
/// model for everything else (name, parent, value). References are only
/// meaningful for the model that produced them.
///
/// ## Example
///
/// ```rust
/// use regview_core::types::CellRef;
///
/// let cell = CellRef::new(3);
/// assert_eq!(cell.index(), 3);
/// assert_eq!(cell.to_string(), "#3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef(usize);

impl CellRef
{
    /// Create a reference from a raw node index.
    #[must_use]
    pub const fn new(index: usize) -> Self
    {
        CellRef(index)
    }

    /// Raw node index inside the owning model.
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0
    }
}

impl fmt::Display for CellRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Width of one SIMD lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementSize
{
    /// 8-bit lanes
    Byte,
    /// 16-bit lanes
    Word,
    /// 32-bit lanes
    Dword,
    /// 64-bit lanes
    Qword,
}

impl ElementSize
{
    /// Lane width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize
    {
        match self {
            ElementSize::Byte => 1,
            ElementSize::Word => 2,
            ElementSize::Dword => 4,
            ElementSize::Qword => 8,
        }
    }

    /// Lane width in bits.
    #[must_use]
    pub const fn bits(self) -> u32
    {
        self.bytes() as u32 * 8
    }
}

impl fmt::Display for ElementSize
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            ElementSize::Byte => "byte",
            ElementSize::Word => "word",
            ElementSize::Dword => "dword",
            ElementSize::Qword => "qword",
        };
        write!(f, "{label}")
    }
}

/// How a SIMD lane is presented and parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat
{
    /// Zero-padded hexadecimal
    Hex,
    /// Two's complement signed decimal
    Signed,
    /// Unsigned decimal
    Unsigned,
    /// IEEE 754 float (only for 32- and 64-bit lanes)
    Float,
}

impl fmt::Display for NumberFormat
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            NumberFormat::Hex => "hex",
            NumberFormat::Signed => "signed",
            NumberFormat::Unsigned => "unsigned",
            NumberFormat::Float => "float",
        };
        write!(f, "{label}")
    }
}

/// What a model cell is
///
/// Field behavior is chosen by matching on this tag:
///
/// - `NormalRegister`: a whole register that owns raw bytes (RAX, FSR, XMM0)
/// - `BitField`: a bit range of its parent register (CF, TOP)
/// - `SimdElement`: one lane of a vector register two levels up
/// - `FpuRegister`: an x87 data register (R0-R7); its children show its value
/// - `Other`: categories, lane containers and derived cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind
{
    /// Register that owns its raw bytes
    NormalRegister,
    /// Bit range inside the parent register
    BitField
    {
        /// Offset of the lowest bit
        offset: u8,
        /// Number of bits
        length: u8,
    },
    /// Lane of the register two levels up
    SimdElement
    {
        /// Lane width currently chosen for display
        size: ElementSize,
        /// Number format currently chosen for display
        format: NumberFormat,
        /// Lane index, lane 0 holds the least significant bytes
        index: usize,
    },
    /// x87 data register
    FpuRegister,
    /// Anything else
    Other,
}

impl CellKind
{
    /// Whether this is a bit field exactly one bit wide.
    #[must_use]
    pub const fn is_single_bit(self) -> bool
    {
        matches!(self, CellKind::BitField { length: 1, .. })
    }
}

/// Boolean role flags a model answers for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind
{
    /// Cell is a register owning raw bytes
    NormalRegister,
    /// Cell is a bit field of its parent
    BitField,
    /// Cell is a SIMD lane
    SimdElement,
    /// Cell is an x87 data register
    FpuRegister,
    /// Value differs from the sample taken at the last step
    RegisterChanged,
}
