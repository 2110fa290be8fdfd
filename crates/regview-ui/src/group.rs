//! # Field Group
//!
//! The container side of value fields. Fields do not point back at their
//! container; instead every field operation that needs it (menus, the
//! clipboard, neighbor lookup, selection notification) receives a
//! [`FieldGroup`].
//!
//! [`RegisterView`] is the group used by the terminal app. It lays the fields
//! of a register model out on a character grid: one header line per
//! category, one line per register, and extra lines for bit fields and SIMD
//! lanes. Categories can be collapsed, which hides their fields from drawing
//! and from navigation.

use crossterm::event::{KeyEvent, MouseButton};
use ratatui::layout::{Position, Rect};
use regview_core::model::RegisterModel;
use regview_core::types::NumberFormat;
use regview_core::{CellKind, CellRef, RegviewResult};
use regview_utils::{debug, info, HexCase};

use crate::actions::{self, ActionKind, MenuAction};
use crate::field::{FieldId, Formatter, Outcome, ValueField};
use crate::navigation::{Direction, FieldPos};
use crate::palette::Palette;

/// Width of the register name column
const NAME_WIDTH: u16 = 8;
/// Bit fields shown per line
const BITS_PER_LINE: usize = 8;
/// Room for float text such as `-1.2345678e-10`
const FLOAT_WIDTH: u16 = 14;

/// What a field needs from the container it lives in
pub trait FieldGroup
{
    /// Visible fields and their positions, for navigation.
    fn visible_fields(&self) -> Vec<(FieldId, FieldPos)>;

    /// Position of one field; `None` when it is hidden or unknown.
    fn field_pos(&self, id: FieldId) -> Option<FieldPos>;

    /// A field became selected.
    fn field_selected(&mut self, id: FieldId);

    /// Show `actions` of `field` as a context menu at screen `position`.
    fn show_menu(&mut self, field: FieldId, position: Position, actions: Vec<MenuAction>);

    /// Store `text` on the clipboard.
    fn copy_to_clipboard(&mut self, text: String);
}

/// Something drawn on a view line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item
{
    Label
    {
        text: String,
        /// Category header
        header: bool,
    },
    Field(FieldId),
}

/// Item with its column and width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed
{
    pub x: u16,
    pub width: u16,
    pub item: Item,
}

/// One line of the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine
{
    /// Index of the category the line belongs to
    pub category: usize,
    /// Whether this is the category header, which stays visible when collapsed
    pub header: bool,
    pub items: Vec<Placed>,
}

/// Open context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu
{
    pub field: FieldId,
    pub position: Position,
    /// Visible actions only
    pub actions: Vec<MenuAction>,
    pub highlighted: usize,
}

impl ContextMenu
{
    /// Screen area of the menu, kept inside `bounds`.
    #[must_use]
    pub fn rect(&self, bounds: Rect) -> Rect
    {
        let widest = self
            .actions
            .iter()
            .map(|action| {
                let shortcut = action.shortcut.map_or(0, |s| s.to_string().chars().count() + 2);
                action.text().chars().count() + shortcut
            })
            .max()
            .unwrap_or(0);
        let width = u16::try_from(widest + 4).unwrap_or(u16::MAX).min(bounds.width);
        let height = u16::try_from(self.actions.len() + 2).unwrap_or(u16::MAX).min(bounds.height);

        let right = bounds.x.saturating_add(bounds.width);
        let bottom = bounds.y.saturating_add(bounds.height);
        let x = self.position.x.clamp(bounds.x, right.saturating_sub(width));
        let y = self.position.y.clamp(bounds.y, bottom.saturating_sub(height));
        Rect::new(x, y, width, height)
    }

    /// Action under a screen position, if the position is on an entry.
    #[must_use]
    pub fn entry_at(&self, bounds: Rect, column: u16, row: u16) -> Option<usize>
    {
        let rect = self.rect(bounds);
        let inner_top = rect.y + 1;
        if column <= rect.x || column + 1 >= rect.x + rect.width || row < inner_top {
            return None;
        }
        let index = usize::from(row - inner_top);
        (index < self.actions.len()).then_some(index)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot
{
    line: usize,
    x: u16,
    width: u16,
    /// `None` while hidden
    pos: Option<FieldPos>,
}

/// Layout and group state of a [`RegisterView`], kept apart from the fields
/// so a field can be borrowed mutably while it talks to its group.
#[derive(Debug, Default)]
struct Surface
{
    lines: Vec<ViewLine>,
    collapsed: Vec<bool>,
    slots: Vec<Slot>,
    selected: Option<FieldId>,
    menu: Option<ContextMenu>,
    clipboard: Option<String>,
}

impl Surface
{
    fn line_visible(&self, line: &ViewLine) -> bool
    {
        line.header || !self.collapsed.get(line.category).copied().unwrap_or(false)
    }

    /// Recompute field positions after a collapse change.
    fn relayout(&mut self)
    {
        for slot in &mut self.slots {
            slot.pos = None;
        }
        let mut y = 0;
        for (index, line) in self.lines.iter().enumerate() {
            if !self.line_visible(line) {
                continue;
            }
            for placed in &line.items {
                if let Item::Field(id) = placed.item {
                    if let Some(slot) = self.slots.get_mut(id.index()) {
                        debug_assert_eq!(slot.line, index);
                        slot.pos = Some(FieldPos::new(i32::from(placed.x), y));
                    }
                }
            }
            y += 1;
        }
    }
}

impl FieldGroup for Surface
{
    fn visible_fields(&self) -> Vec<(FieldId, FieldPos)>
    {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.pos.map(|pos| (FieldId::new(index), pos)))
            .collect()
    }

    fn field_pos(&self, id: FieldId) -> Option<FieldPos>
    {
        self.slots.get(id.index())?.pos
    }

    fn field_selected(&mut self, id: FieldId)
    {
        self.selected = Some(id);
    }

    fn show_menu(&mut self, field: FieldId, position: Position, actions: Vec<MenuAction>)
    {
        let actions: Vec<MenuAction> = actions.into_iter().filter(|action| action.visible).collect();
        if actions.is_empty() {
            return;
        }
        self.menu = Some(ContextMenu {
            field,
            position,
            actions,
            highlighted: 0,
        });
    }

    fn copy_to_clipboard(&mut self, text: String)
    {
        info!("Copied '{}' to clipboard", text);
        self.clipboard = Some(text);
    }
}

/// Builds lines and fields from a model
struct LayoutBuilder<'m, M: RegisterModel + ?Sized>
{
    model: &'m M,
    palette: Palette,
    hex_case: HexCase,
    fields: Vec<ValueField>,
    slots: Vec<Slot>,
    lines: Vec<ViewLine>,
}

/// Items of the line being built
struct LineItems
{
    items: Vec<Placed>,
    cursor: u16,
}

impl LineItems
{
    fn indented(indent: u16) -> Self
    {
        Self {
            items: Vec::new(),
            cursor: indent,
        }
    }

    fn push(&mut self, item: Item, width: u16)
    {
        self.items.push(Placed {
            x: self.cursor,
            width,
            item,
        });
        self.cursor = self.cursor.saturating_add(width + 1);
    }

    fn label(&mut self, text: String, header: bool)
    {
        let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        self.push(Item::Label { text, header }, width);
    }
}

impl<M: RegisterModel + ?Sized> LayoutBuilder<'_, M>
{
    fn add_field(&mut self, line: &mut LineItems, cell: CellRef)
    {
        let id = FieldId::new(self.fields.len());
        let kind = self.model.kind(cell);
        let formatter = formatter_for(kind, self.hex_case);
        let text_width = u16::try_from(formatter(self.model.text(cell).as_str()).chars().count()).unwrap_or(u16::MAX);
        let width = text_width.max(min_width(kind)).max(1);

        self.slots.push(Slot {
            line: self.lines.len(),
            x: line.cursor,
            width,
            pos: None,
        });
        self.fields
            .push(ValueField::new(self.model, id, cell, width, formatter, self.palette));
        line.push(Item::Field(id), width);
    }

    fn finish_line(&mut self, line: LineItems, category: usize, header: bool)
    {
        self.lines.push(ViewLine {
            category,
            header,
            items: line.items,
        });
    }

    fn category(&mut self, index: usize, category: CellRef)
    {
        let mut header = LineItems::indented(0);
        header.label(self.model.name(category).unwrap_or("?").to_string(), true);
        self.finish_line(header, index, true);

        for register in self.model.children(category) {
            self.register(index, register);
        }
    }

    fn register(&mut self, category: usize, register: CellRef)
    {
        let model = self.model;
        let mut line = LineItems::indented(0);
        let name = model.name(register).unwrap_or("?");
        line.label(format!("{name:<width$}", width = usize::from(NAME_WIDTH)), false);
        self.add_field(&mut line, register);

        let mut bits = Vec::new();
        let mut lane_groups = Vec::new();
        for child in model.children(register) {
            if matches!(model.kind(child), CellKind::BitField { .. }) {
                bits.push(child);
                continue;
            }
            let lanes = model.children(child);
            if lanes.is_empty() {
                // Derived view of the register itself, e.g. an x87 value as float
                self.add_field(&mut line, child);
            } else {
                lane_groups.push(lanes);
            }
        }
        self.finish_line(line, category, false);

        for chunk in bits.chunks(BITS_PER_LINE) {
            let mut line = LineItems::indented(2);
            for bit in chunk {
                line.label(model.name(*bit).unwrap_or("?").to_string(), false);
                self.add_field(&mut line, *bit);
            }
            self.finish_line(line, category, false);
        }
        for lanes in lane_groups {
            let mut line = LineItems::indented(NAME_WIDTH + 1);
            for lane in lanes {
                self.add_field(&mut line, lane);
            }
            self.finish_line(line, category, false);
        }
    }
}

/// Formatter for the text of a `kind` cell: hexadecimal text in the
/// configured case, other text as is.
#[must_use]
pub fn formatter_for(kind: CellKind, hex_case: HexCase) -> Formatter
{
    let hex = match kind {
        CellKind::NormalRegister | CellKind::FpuRegister => true,
        CellKind::BitField { length, .. } => length > 4,
        CellKind::SimdElement { format, .. } => format == NumberFormat::Hex,
        CellKind::Other => false,
    };
    if hex && hex_case == HexCase::Upper {
        Box::new(|text: &str| text.to_uppercase())
    } else {
        Box::new(str::to_string)
    }
}

/// Width a field keeps however its text changes.
fn min_width(kind: CellKind) -> u16
{
    match kind {
        CellKind::SimdElement { size, format, .. } => match format {
            NumberFormat::Float => FLOAT_WIDTH,
            // Digits of the widest value, plus a sign for signed lanes
            NumberFormat::Signed | NumberFormat::Unsigned => {
                let digits: u16 = match size.bytes() {
                    1 => 3,
                    2 => 5,
                    4 => 10,
                    _ => 20,
                };
                digits + u16::from(format == NumberFormat::Signed)
            }
            NumberFormat::Hex => u16::try_from(size.bytes() * 2).unwrap_or(16),
        },
        CellKind::Other => FLOAT_WIDTH,
        _ => 1,
    }
}

/// Register view: value fields laid out on a grid plus group state
#[derive(Debug)]
pub struct RegisterView
{
    fields: Vec<ValueField>,
    surface: Surface,
    scroll: usize,
    area: Rect,
}

impl RegisterView
{
    /// Build fields for every register of `model`.
    pub fn new<M: RegisterModel + ?Sized>(model: &M, palette: Palette, hex_case: HexCase) -> Self
    {
        let mut builder = LayoutBuilder {
            model,
            palette,
            hex_case,
            fields: Vec::new(),
            slots: Vec::new(),
            lines: Vec::new(),
        };
        let roots = model.roots();
        for (index, category) in roots.iter().enumerate() {
            builder.category(index, *category);
        }

        let mut surface = Surface {
            lines: builder.lines,
            collapsed: vec![false; roots.len()],
            slots: builder.slots,
            ..Surface::default()
        };
        surface.relayout();
        debug!("Register view built: {} fields on {} lines", builder.fields.len(), surface.lines.len());

        Self {
            fields: builder.fields,
            surface,
            scroll: 0,
            area: Rect::default(),
        }
    }

    /// Take over the view state of `previous`, a view of the same model
    /// before it was rebuilt: collapsed categories, scroll, area and
    /// clipboard. Selection and menu are not carried over.
    pub fn carry_over(&mut self, previous: RegisterView)
    {
        if previous.surface.collapsed.len() == self.surface.collapsed.len() {
            self.surface.collapsed = previous.surface.collapsed;
            self.surface.relayout();
        }
        self.surface.clipboard = previous.surface.clipboard;
        self.scroll = previous.scroll;
        self.area = previous.area;
    }

    #[must_use]
    pub fn fields(&self) -> &[ValueField]
    {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&ValueField>
    {
        self.fields.get(id.index())
    }

    /// Field bound to `cell`, if any.
    #[must_use]
    pub fn field_by_cell(&self, cell: CellRef) -> Option<FieldId>
    {
        self.fields.iter().find(|field| field.cell() == cell).map(ValueField::id)
    }

    #[must_use]
    pub fn selected(&self) -> Option<FieldId>
    {
        self.surface.selected
    }

    #[must_use]
    pub fn selected_field(&self) -> Option<&ValueField>
    {
        self.surface.selected.and_then(|id| self.field(id))
    }

    #[must_use]
    pub fn menu(&self) -> Option<&ContextMenu>
    {
        self.surface.menu.as_ref()
    }

    /// Text of the last copy.
    #[must_use]
    pub fn clipboard(&self) -> Option<&str>
    {
        self.surface.clipboard.as_deref()
    }

    /// Reload every field from the model.
    pub fn refresh<M: RegisterModel + ?Sized>(&mut self, model: &M)
    {
        for field in &mut self.fields {
            field.adjust_to_data(model);
        }
        // An open menu follows the refreshed action set
        if let Some(menu) = self.surface.menu.take() {
            if let Some(field) = self.fields.get(menu.field.index()) {
                field.show_menu(&mut self.surface, menu.position);
            }
            if let Some(refreshed) = &mut self.surface.menu {
                refreshed.highlighted = menu.highlighted.min(refreshed.actions.len() - 1);
            }
        }
    }

    /// Select field `id`, unselecting the previous one.
    pub fn select<M: RegisterModel + ?Sized>(&mut self, model: &mut M, id: FieldId)
    {
        let Self { fields, surface, .. } = self;
        if let Some(field) = fields.get_mut(id.index()) {
            field.select(model, surface);
        }
        self.sync_selection();
    }

    /// Select by bound cell.
    pub fn select_cell<M: RegisterModel + ?Sized>(&mut self, model: &mut M, cell: CellRef) -> bool
    {
        match self.field_by_cell(cell) {
            Some(id) => {
                self.select(model, id);
                true
            }
            None => false,
        }
    }

    fn sync_selection(&mut self)
    {
        let selected = self.surface.selected;
        for field in &mut self.fields {
            if Some(field.id()) != selected {
                field.unselect();
            }
        }
    }

    /// Move the selection. Without a selection, select the first visible field.
    ///
    /// Returns whether the selection moved.
    pub fn navigate<M: RegisterModel + ?Sized>(&mut self, model: &mut M, direction: Direction) -> bool
    {
        let next = match self.selected_field() {
            Some(field) => field.neighbor(&self.surface, direction),
            None => self.surface.visible_fields().first().map(|(id, _)| *id),
        };
        match next {
            Some(id) => {
                self.select(model, id);
                true
            }
            None => false,
        }
    }

    /// Remember where the view was drawn, for hit testing.
    pub fn set_area(&mut self, area: Rect)
    {
        self.area = area;
    }

    #[must_use]
    pub fn area(&self) -> Rect
    {
        self.area
    }

    #[must_use]
    pub fn scroll(&self) -> usize
    {
        self.scroll
    }

    /// Scroll so the selected field is inside a window of `height` lines.
    pub fn scroll_to_selection(&mut self, height: usize)
    {
        let Some(y) = self
            .surface
            .selected
            .and_then(|id| self.surface.field_pos(id))
            .and_then(|pos| usize::try_from(pos.y).ok())
        else {
            return;
        };
        if y < self.scroll {
            self.scroll = y;
        } else if height > 0 && y >= self.scroll + height {
            self.scroll = y + 1 - height;
        }
    }

    /// Lines not hidden by a collapsed category, top to bottom.
    #[must_use]
    pub fn visible_lines(&self) -> Vec<&ViewLine>
    {
        self.surface
            .lines
            .iter()
            .filter(|line| self.surface.line_visible(line))
            .collect()
    }

    /// Whether a category is collapsed.
    #[must_use]
    pub fn is_collapsed(&self, category: usize) -> bool
    {
        self.surface.collapsed.get(category).copied().unwrap_or(false)
    }

    /// Collapse or expand the category of the selected field.
    ///
    /// Without a selection every category is expanded. A field hidden by the
    /// collapse loses the selection.
    pub fn toggle_collapse<M: RegisterModel + ?Sized>(&mut self, model: &mut M)
    {
        match self.surface.selected.and_then(|id| self.surface.slots.get(id.index()).copied()) {
            Some(slot) => {
                let category = self.surface.lines[slot.line].category;
                if let Some(flag) = self.surface.collapsed.get_mut(category) {
                    *flag = !*flag;
                }
            }
            None => self.surface.collapsed.iter_mut().for_each(|flag| *flag = false),
        }
        self.surface.relayout();

        if let Some(id) = self.surface.selected {
            if self.surface.field_pos(id).is_none() {
                self.surface.selected = None;
                self.sync_selection();
                model.set_active(None);
            }
        }
    }

    /// Field under a screen position.
    #[must_use]
    pub fn field_at(&self, column: u16, row: u16) -> Option<FieldId>
    {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        let x = column - self.area.x;
        let y = i32::try_from(usize::from(row - self.area.y) + self.scroll).ok()?;
        self.surface
            .slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.pos.is_some_and(|pos| pos.y == y) && x >= slot.x && x < slot.x + slot.width)
            .map(|(index, _)| FieldId::new(index))
    }

    /// Screen position of a visible field, as of the last draw.
    #[must_use]
    pub fn screen_position(&self, id: FieldId) -> Option<Position>
    {
        let pos = self.surface.field_pos(id)?;
        let row = usize::try_from(pos.y).ok()?.checked_sub(self.scroll)?;
        let x = self.area.x.saturating_add(u16::try_from(pos.x).ok()?);
        let y = self.area.y.saturating_add(u16::try_from(row).ok()?);
        Some(Position::new(x, y))
    }

    /// Track the pointer: hover the field under it, leave the others.
    pub fn hover(&mut self, column: u16, row: u16)
    {
        let hit = self.field_at(column, row);
        for field in &mut self.fields {
            let over = Some(field.id()) == hit;
            if over && !field.is_hovered() {
                field.enter();
            } else if !over && field.is_hovered() {
                field.leave();
            }
        }
    }

    /// Handle a mouse press on the view.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write from a double-click action.
    pub fn press<M: RegisterModel + ?Sized>(
        &mut self,
        model: &mut M,
        button: MouseButton,
        column: u16,
        row: u16,
        double_click: bool,
    ) -> RegviewResult<Outcome>
    {
        let Some(id) = self.field_at(column, row) else {
            return Ok(Outcome::Nothing);
        };
        let position = Position::new(column, row);
        let Self { fields, surface, .. } = self;
        let field = &mut fields[id.index()];

        let outcome = if double_click {
            field.mouse_double_click(model, surface, button, position)?
        } else {
            let had_menu = surface.menu.is_some();
            field.mouse_press(model, surface, button, position, false);
            if surface.menu.is_some() && !had_menu {
                Outcome::MenuShown
            } else {
                Outcome::Nothing
            }
        };
        self.sync_selection();
        Ok(outcome)
    }

    /// Default action of the selected field.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn default_action<M: RegisterModel + ?Sized>(&mut self, model: &mut M) -> RegviewResult<Outcome>
    {
        match self.selected_field() {
            Some(field) => field.default_action(model),
            None => Ok(Outcome::Nothing),
        }
    }

    /// Run an action on field `id`.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn trigger<M: RegisterModel + ?Sized>(&mut self, model: &mut M, id: FieldId, kind: ActionKind) -> RegviewResult<Outcome>
    {
        let Self { fields, surface, .. } = self;
        match fields.get(id.index()) {
            Some(field) => field.trigger(kind, model, surface),
            None => Ok(Outcome::Nothing),
        }
    }

    /// Run the selected field's action bound to `key`, if one is.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn shortcut<M: RegisterModel + ?Sized>(&mut self, model: &mut M, key: &KeyEvent) -> RegviewResult<Option<Outcome>>
    {
        let Some(field) = self.selected_field() else {
            return Ok(None);
        };
        let (id, kind) = match actions::by_shortcut(field.actions(), key) {
            Some(kind) => (field.id(), kind),
            None => return Ok(None),
        };
        self.trigger(model, id, kind).map(Some)
    }

    /// Open the context menu of the selected field next to it.
    pub fn open_menu(&mut self) -> bool
    {
        let Some(id) = self.surface.selected else {
            return false;
        };
        let position = self.screen_position(id).unwrap_or(Position::new(self.area.x, self.area.y));
        let position = Position::new(position.x, position.y.saturating_add(1));
        if let Some(field) = self.fields.get(id.index()) {
            field.show_menu(&mut self.surface, position);
        }
        self.surface.menu.is_some()
    }

    pub fn close_menu(&mut self)
    {
        self.surface.menu = None;
    }

    /// Move the menu highlight by `delta`, wrapping around.
    pub fn menu_move(&mut self, delta: isize)
    {
        if let Some(menu) = &mut self.surface.menu {
            let len = menu.actions.len();
            if len > 0 {
                let step = delta.unsigned_abs() % len;
                menu.highlighted = if delta < 0 {
                    (menu.highlighted + len - step) % len
                } else {
                    (menu.highlighted + step) % len
                };
            }
        }
    }

    /// Close the menu and run entry `index`.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn menu_activate<M: RegisterModel + ?Sized>(&mut self, model: &mut M, index: usize) -> RegviewResult<Outcome>
    {
        let Some(menu) = self.surface.menu.take() else {
            return Ok(Outcome::Nothing);
        };
        match menu.actions.get(index) {
            Some(action) => self.trigger(model, menu.field, action.kind),
            None => Ok(Outcome::Nothing),
        }
    }

    /// Close the menu and run the highlighted entry.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn menu_activate_highlighted<M: RegisterModel + ?Sized>(&mut self, model: &mut M) -> RegviewResult<Outcome>
    {
        let index = self.surface.menu.as_ref().map_or(0, |menu| menu.highlighted);
        self.menu_activate(model, index)
    }

    /// Run the menu entry whose accelerator is `c`.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn menu_accelerator<M: RegisterModel + ?Sized>(&mut self, model: &mut M, c: char) -> RegviewResult<Option<Outcome>>
    {
        let Some(menu) = &self.surface.menu else {
            return Ok(None);
        };
        let Some(kind) = actions::by_accelerator(&menu.actions, c) else {
            return Ok(None);
        };
        let index = menu.actions.iter().position(|action| action.kind == kind).unwrap_or(0);
        self.menu_activate(model, index).map(Some)
    }
}
