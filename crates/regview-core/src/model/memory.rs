//! In-memory register model.
//!
//! Nodes live in an arena indexed by [`CellRef`]. Only register nodes own
//! bytes; bit fields, SIMD lanes and FPU value views derive theirs from an
//! ancestor, so writing the register updates every view of it at once.

use std::fmt::Write as _;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::RegisterModel;
use crate::error::{RegviewError, RegviewResult};
use crate::types::registers::x87_to_f64;
use crate::types::{CellKind, CellRef, ElementSize, NumberFormat, RawBytes, RegisterType, RegisterValue};

/// Bytes owned by a register node
#[derive(Debug, Clone)]
struct Storage
{
    register_type: RegisterType,
    current: RawBytes,
    /// Value at the last step, used for the "changed" flag
    sampled: RawBytes,
}

/// Where a node's value comes from
#[derive(Debug, Clone)]
enum Source
{
    /// Categories and containers
    Empty,
    /// Register owning its bytes
    Owned(Storage),
    /// Bit range of the parent (offset/length live in the kind)
    ParentBits,
    /// Lane of the grandparent (size/format/index live in the kind)
    GrandparentLane,
    /// Parent's x87 bytes shown as a float
    ParentExtended,
    /// Lane removed by a lane view change
    Detached,
}

#[derive(Debug, Clone)]
struct Node
{
    name: String,
    parent: Option<CellRef>,
    children: Vec<CellRef>,
    kind: CellKind,
    source: Source,
}

/// Register model backed by plain memory
///
/// Used by the terminal view, the headless dump and the tests. Build one with
/// [`ModelBuilder`] or take the [`super::x86_64::sample`] preset.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModel
{
    nodes: Vec<Node>,
    /// Detached lane slots, reused by the next lane view change
    free: Vec<CellRef>,
    active: Option<CellRef>,
}

impl InMemoryModel
{
    /// Find the first attached cell with the given name, depth first.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<CellRef>
    {
        let mut stack: Vec<CellRef> = self.roots().into_iter().rev().collect();
        while let Some(cell) = stack.pop() {
            let node = &self.nodes[cell.index()];
            if node.name == name {
                return Some(cell);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Number of cell slots, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.nodes.len()
    }

    /// Whether the model has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.nodes.is_empty()
    }

    /// Take a new sample of every register: nothing is "changed" afterwards.
    ///
    /// Called when the debuggee single-steps.
    pub fn sample_step(&mut self)
    {
        for node in &mut self.nodes {
            if let Source::Owned(storage) = &mut node.source {
                storage.sampled.clone_from(&storage.current);
            }
        }
        debug!("Sampled register state");
    }

    /// Replace the lanes of a SIMD lane container with a new size and format.
    ///
    /// Lane cells are recycled: new lanes take over the old slots first, and
    /// slots left over are detached until a later change reuses them. Fields
    /// bound to the old lanes must be rebuilt.
    ///
    /// # Errors
    ///
    /// Fails when `container` is unknown or its parent is not a register with
    /// bytes.
    pub fn set_lane_view(&mut self, container: CellRef, size: ElementSize, format: NumberFormat) -> RegviewResult<()>
    {
        let node = self.nodes.get(container.index()).ok_or(RegviewError::UnknownCell(container))?;
        let register = node.parent.ok_or(RegviewError::ReadOnly(container))?;
        let width = match &self.nodes[register.index()].source {
            Source::Owned(storage) => storage.current.len(),
            _ => return Err(RegviewError::ReadOnly(register)),
        };
        let register_name = self.nodes[register.index()].name.clone();

        let detached = std::mem::take(&mut self.nodes[container.index()].children);
        for cell in &detached {
            self.nodes[cell.index()].parent = None;
            self.nodes[cell.index()].source = Source::Detached;
        }
        // Reversed so lane 0 takes the old lane 0 slot
        self.free.extend(detached.into_iter().rev());

        for index in 0..width / size.bytes() {
            let name = format!("{register_name}[{index}]");
            let kind = CellKind::SimdElement { size, format, index };
            match self.free.pop() {
                Some(cell) => {
                    self.nodes[cell.index()] = Node {
                        name,
                        parent: Some(container),
                        children: Vec::new(),
                        kind,
                        source: Source::GrandparentLane,
                    };
                    self.nodes[container.index()].children.push(cell);
                }
                None => {
                    push_node(&mut self.nodes, Some(container), &name, kind, Source::GrandparentLane);
                }
            }
        }
        trace!("{} detached lane slots", self.free.len());
        debug!("Lane view of {} set to {} {}", register_name, size, format);
        Ok(())
    }

    /// Current lane size and format of a lane container, if it has lanes.
    #[must_use]
    pub fn lane_view(&self, container: CellRef) -> Option<(ElementSize, NumberFormat)>
    {
        let first = *self.nodes.get(container.index())?.children.first()?;
        match self.nodes[first.index()].kind {
            CellKind::SimdElement { size, format, .. } => Some((size, format)),
            _ => None,
        }
    }

    fn node(&self, cell: CellRef) -> Option<&Node>
    {
        self.nodes.get(cell.index())
    }

    fn storage(&self, cell: Option<CellRef>) -> Option<&Storage>
    {
        match &self.node(cell?)?.source {
            Source::Owned(storage) => Some(storage),
            _ => None,
        }
    }

    /// Value of `cell` as it is now, or as it was at the last sample.
    fn value_of(&self, cell: CellRef, sampled: bool) -> RawBytes
    {
        let Some(node) = self.node(cell) else {
            return RawBytes::new();
        };
        let pick = |storage: &Storage| -> RawBytes {
            if sampled {
                storage.sampled.clone()
            } else {
                storage.current.clone()
            }
        };

        match (&node.source, node.kind) {
            (Source::Owned(storage), _) => pick(storage),
            (Source::ParentBits, CellKind::BitField { offset, length }) => self
                .storage(node.parent)
                .map(|storage| extract_bits(&pick(storage), offset, length))
                .unwrap_or_default(),
            (Source::GrandparentLane, CellKind::SimdElement { size, index, .. }) => {
                let register = node.parent.and_then(|lanes| self.node(lanes)?.parent);
                self.storage(register)
                    .and_then(|storage| {
                        let bytes = pick(storage);
                        let start = index * size.bytes();
                        bytes.get(start..start + size.bytes()).map(SmallVec::from_slice)
                    })
                    .unwrap_or_default()
            }
            (Source::ParentExtended, _) => self.storage(node.parent).map(pick).unwrap_or_default(),
            _ => RawBytes::new(),
        }
    }
}

impl RegisterModel for InMemoryModel
{
    fn roots(&self) -> Vec<CellRef>
    {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none() && !matches!(node.source, Source::Detached))
            .map(|(index, _)| CellRef::new(index))
            .collect()
    }

    fn kind(&self, cell: CellRef) -> CellKind
    {
        self.node(cell).map_or(CellKind::Other, |node| node.kind)
    }

    fn parent(&self, cell: CellRef) -> Option<CellRef>
    {
        self.node(cell)?.parent
    }

    fn children(&self, cell: CellRef) -> Vec<CellRef>
    {
        self.node(cell).map(|node| node.children.clone()).unwrap_or_default()
    }

    fn name(&self, cell: CellRef) -> Option<&str>
    {
        self.node(cell).map(|node| node.name.as_str())
    }

    fn raw_bytes(&self, cell: CellRef) -> RawBytes
    {
        self.value_of(cell, false)
    }

    fn set_raw_bytes(&mut self, cell: CellRef, bytes: &[u8]) -> RegviewResult<()>
    {
        let node = self.nodes.get_mut(cell.index()).ok_or(RegviewError::UnknownCell(cell))?;
        let Source::Owned(storage) = &mut node.source else {
            return Err(RegviewError::ReadOnly(cell));
        };
        if storage.current.len() != bytes.len() {
            return Err(RegviewError::WidthMismatch {
                cell,
                expected: storage.current.len(),
                actual: bytes.len(),
            });
        }
        storage.current = SmallVec::from_slice(bytes);
        trace!("{} <- {:02x?}", node.name, bytes);
        Ok(())
    }

    fn text(&self, cell: CellRef) -> String
    {
        let Some(node) = self.node(cell) else {
            return String::new();
        };
        let bytes = self.raw_bytes(cell);
        match (&node.source, node.kind) {
            (Source::Empty | Source::Detached, _) => String::new(),
            (Source::ParentBits, CellKind::BitField { length, .. }) => {
                let value = le_to_u64(&bytes);
                if length <= 4 {
                    value.to_string()
                } else {
                    format!("{value:x}")
                }
            }
            (Source::GrandparentLane, CellKind::SimdElement { size, format, .. }) => format_lane(&bytes, size, format),
            (Source::ParentExtended, _) => x87_to_f64(&bytes).map(|value| format!("{value}")).unwrap_or_default(),
            _ => hex_string(&bytes),
        }
    }

    fn changed(&self, cell: CellRef) -> Option<bool>
    {
        self.node(cell)?;
        Some(self.value_of(cell, false) != self.value_of(cell, true))
    }

    fn register_value(&self, cell: CellRef) -> Option<RegisterValue>
    {
        let node = self.node(cell)?;
        match &node.source {
            Source::Owned(storage) => Some(RegisterValue::new(
                node.name.clone(),
                storage.register_type,
                &storage.current,
            )),
            _ => None,
        }
    }

    fn set_active(&mut self, cell: Option<CellRef>)
    {
        self.active = cell;
    }

    fn active(&self) -> Option<CellRef>
    {
        self.active
    }
}

/// Builds an [`InMemoryModel`] top-down
///
/// ## Example
///
/// ```rust
/// use regview_core::model::{ModelBuilder, RegisterModel};
/// use regview_core::types::RegisterType;
///
/// let mut builder = ModelBuilder::new();
/// let gpr = builder.category("General Purpose");
/// let rax = builder.register(gpr, "RAX", RegisterType::GeneralPurpose, &42u64.to_le_bytes());
/// let model = builder.build();
/// assert_eq!(model.text(rax), "000000000000002a");
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder
{
    nodes: Vec<Node>,
}

impl ModelBuilder
{
    /// Start an empty model.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add a top-level category.
    pub fn category(&mut self, name: &str) -> CellRef
    {
        push_node(&mut self.nodes, None, name, CellKind::Other, Source::Empty)
    }

    /// Add a register owning `bytes`.
    pub fn register(&mut self, parent: CellRef, name: &str, register_type: RegisterType, bytes: &[u8]) -> CellRef
    {
        let storage = Storage {
            register_type,
            current: SmallVec::from_slice(bytes),
            sampled: SmallVec::from_slice(bytes),
        };
        push_node(&mut self.nodes, Some(parent), name, CellKind::NormalRegister, Source::Owned(storage))
    }

    /// Add an x87 data register and the float view below it.
    ///
    /// Returns `(register, value_view)`.
    pub fn fpu_register(&mut self, parent: CellRef, name: &str, bytes: &[u8]) -> (CellRef, CellRef)
    {
        let storage = Storage {
            register_type: RegisterType::Fpu,
            current: SmallVec::from_slice(bytes),
            sampled: SmallVec::from_slice(bytes),
        };
        let register = push_node(&mut self.nodes, Some(parent), name, CellKind::FpuRegister, Source::Owned(storage));
        let view = push_node(
            &mut self.nodes,
            Some(register),
            &format!("{name}.value"),
            CellKind::Other,
            Source::ParentExtended,
        );
        (register, view)
    }

    /// Add a bit field of `register`.
    pub fn bit_field(&mut self, register: CellRef, name: &str, offset: u8, length: u8) -> CellRef
    {
        push_node(
            &mut self.nodes,
            Some(register),
            name,
            CellKind::BitField { offset, length },
            Source::ParentBits,
        )
    }

    /// Add a lane container below a SIMD register and fill it with lanes.
    pub fn lanes(&mut self, register: CellRef, size: ElementSize, format: NumberFormat) -> CellRef
    {
        let (register_name, width) = {
            let node = &self.nodes[register.index()];
            let width = match &node.source {
                Source::Owned(storage) => storage.current.len(),
                _ => 0,
            };
            (node.name.clone(), width)
        };
        let container = push_node(
            &mut self.nodes,
            Some(register),
            &format!("{register_name}.lanes"),
            CellKind::Other,
            Source::Empty,
        );
        push_lanes(&mut self.nodes, container, &register_name, width, size, format);
        container
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> InMemoryModel
    {
        InMemoryModel {
            nodes: self.nodes,
            free: Vec::new(),
            active: None,
        }
    }
}

fn push_node(nodes: &mut Vec<Node>, parent: Option<CellRef>, name: &str, kind: CellKind, source: Source) -> CellRef
{
    let cell = CellRef::new(nodes.len());
    nodes.push(Node {
        name: name.to_string(),
        parent,
        children: Vec::new(),
        kind,
        source,
    });
    if let Some(parent) = parent {
        nodes[parent.index()].children.push(cell);
    }
    cell
}

fn push_lanes(
    nodes: &mut Vec<Node>,
    container: CellRef,
    register_name: &str,
    width: usize,
    size: ElementSize,
    format: NumberFormat,
)
{
    for index in 0..width / size.bytes() {
        push_node(
            nodes,
            Some(container),
            &format!("{register_name}[{index}]"),
            CellKind::SimdElement { size, format, index },
            Source::GrandparentLane,
        );
    }
}

/// Little-endian bytes of at most 8 bytes as an integer.
fn le_to_u64(bytes: &[u8]) -> u64
{
    let mut word = [0u8; 8];
    let len = bytes.len().min(8);
    word[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(word)
}

fn extract_bits(bytes: &[u8], offset: u8, length: u8) -> RawBytes
{
    if bytes.len() > 8 || u32::from(offset) + u32::from(length) > 64 {
        return RawBytes::new();
    }
    let mask = if length >= 64 { u64::MAX } else { (1u64 << length) - 1 };
    let value = (le_to_u64(bytes) >> offset) & mask;
    let width = usize::from(length).div_ceil(8).max(1);
    SmallVec::from_slice(&value.to_le_bytes()[..width])
}

/// Most significant byte first, two digits per byte.
fn hex_string(bytes: &[u8]) -> String
{
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter().rev() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Text of one SIMD lane in the given format.
///
/// Empty when `bytes` is not exactly one lane wide. Float is only meaningful
/// for dword and qword lanes; narrower lanes fall back to hex.
#[must_use]
pub fn format_lane(bytes: &[u8], size: ElementSize, format: NumberFormat) -> String
{
    if bytes.len() != size.bytes() {
        return String::new();
    }
    let raw = le_to_u64(bytes);
    match format {
        NumberFormat::Hex => hex_string(bytes),
        NumberFormat::Unsigned => raw.to_string(),
        NumberFormat::Signed => {
            let shift = 64 - size.bits();
            #[allow(clippy::cast_possible_wrap)]
            let signed = ((raw << shift) as i64) >> shift;
            signed.to_string()
        }
        NumberFormat::Float => match size {
            #[allow(clippy::cast_possible_truncation)]
            ElementSize::Dword => f32::from_bits(raw as u32).to_string(),
            ElementSize::Qword => f64::from_bits(raw).to_string(),
            ElementSize::Byte | ElementSize::Word => hex_string(bytes),
        },
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn small_model() -> (InMemoryModel, CellRef, CellRef, CellRef)
    {
        let mut builder = ModelBuilder::new();
        let gpr = builder.category("General Purpose");
        let rax = builder.register(gpr, "RAX", RegisterType::GeneralPurpose, &0x10u64.to_le_bytes());
        let flags = builder.register(gpr, "RFLAGS", RegisterType::GeneralPurpose, &0x202u64.to_le_bytes());
        let zf = builder.bit_field(flags, "ZF", 6, 1);
        (builder.build(), rax, flags, zf)
    }

    #[test]
    fn test_bit_field_reads_parent()
    {
        let (mut model, _, flags, zf) = small_model();
        assert_eq!(model.raw_bytes(zf).as_slice(), &[0]);
        model.set_raw_bytes(flags, &0x242u64.to_le_bytes()).unwrap();
        assert_eq!(model.raw_bytes(zf).as_slice(), &[1]);
        assert_eq!(model.text(zf), "1");
        assert_eq!(model.changed(zf), Some(true));
    }

    #[test]
    fn test_write_rejections()
    {
        let (mut model, rax, _, zf) = small_model();
        assert!(matches!(
            model.set_raw_bytes(rax, &[1, 2]),
            Err(RegviewError::WidthMismatch { expected: 8, actual: 2, .. })
        ));
        assert!(matches!(model.set_raw_bytes(zf, &[1]), Err(RegviewError::ReadOnly(_))));
        assert!(matches!(
            model.set_raw_bytes(CellRef::new(999), &[1]),
            Err(RegviewError::UnknownCell(_))
        ));
    }

    #[test]
    fn test_sample_step_clears_changed()
    {
        let (mut model, rax, _, _) = small_model();
        assert_eq!(model.changed(rax), Some(false));
        model.set_raw_bytes(rax, &0x11u64.to_le_bytes()).unwrap();
        assert_eq!(model.changed(rax), Some(true));
        model.sample_step();
        assert_eq!(model.changed(rax), Some(false));
        assert_eq!(model.changed(CellRef::new(999)), None);
    }

    #[test]
    fn test_lane_formats()
    {
        let mut builder = ModelBuilder::new();
        let sse = builder.category("SSE");
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&1.5f32.to_le_bytes());
        bytes[4..8].copy_from_slice(&(-2i32).to_le_bytes());
        let xmm0 = builder.register(sse, "XMM0", RegisterType::Simd, &bytes);
        let lanes = builder.lanes(xmm0, ElementSize::Dword, NumberFormat::Float);
        let mut model = builder.build();

        let lane0 = model.children(lanes)[0];
        assert_eq!(model.text(lane0), "1.5");
        assert_eq!(model.children(lanes).len(), 4);

        model.set_lane_view(lanes, ElementSize::Dword, NumberFormat::Signed).unwrap();
        let lane1 = model.children(lanes)[1];
        assert_eq!(model.text(lane1), "-2");
        assert_eq!(model.children(lanes)[0], lane0);
        assert_eq!(model.roots(), vec![sse]);
        assert_eq!(model.lane_view(lanes), Some((ElementSize::Dword, NumberFormat::Signed)));
    }

    #[test]
    fn test_lane_view_changes_reuse_slots()
    {
        let mut builder = ModelBuilder::new();
        let sse = builder.category("SSE");
        let xmm0 = builder.register(sse, "XMM0", RegisterType::Simd, &[0xab; 16]);
        let lanes = builder.lanes(xmm0, ElementSize::Dword, NumberFormat::Hex);
        let mut model = builder.build();

        model.set_lane_view(lanes, ElementSize::Byte, NumberFormat::Hex).unwrap();
        let widest = model.len();
        let byte15 = model.find("XMM0[15]").unwrap();

        model.set_lane_view(lanes, ElementSize::Qword, NumberFormat::Hex).unwrap();
        assert_eq!(model.children(lanes).len(), 2);
        assert_eq!(model.parent(byte15), None);
        assert_eq!(model.find("XMM0[15]"), None);
        assert_eq!(model.text(byte15), "");
        assert_eq!(model.roots(), vec![sse]);

        for _ in 0..20 {
            model.set_lane_view(lanes, ElementSize::Byte, NumberFormat::Unsigned).unwrap();
            model.set_lane_view(lanes, ElementSize::Word, NumberFormat::Signed).unwrap();
            model.set_lane_view(lanes, ElementSize::Dword, NumberFormat::Float).unwrap();
        }
        assert_eq!(model.len(), widest);
        assert_eq!(model.children(lanes).len(), 4);
        let lane3 = model.find("XMM0[3]").unwrap();
        assert_eq!(model.text(lane3), f32::from_bits(0xabab_abab).to_string());
    }

    #[test]
    fn test_find_and_category()
    {
        let (model, rax, _, zf) = small_model();
        assert_eq!(model.find("RAX"), Some(rax));
        assert_eq!(model.find("ZF"), Some(zf));
        assert_eq!(model.category_name(rax), Some("General Purpose"));
        assert_eq!(model.find("XMM9"), None);
    }
}
