//! # Value Field
//!
//! A [`ValueField`] shows the value of one register model cell and turns user
//! input into model edits. It never owns model data: it keeps the
//! [`CellRef`] it is bound to, a cached copy of the text and "changed" flag
//! from the last refresh, and its current action set.
//!
//! State: `{unselected, selected} x {idle, hovered} x {normal, changed}`.
//!
//! - pointer enter/leave toggles `hovered`
//! - a left or right press selects the field (idempotent) and marks the
//!   register active in the model
//! - a right press that is not part of a double click opens the context menu
//! - a double click selects, then runs the default action
//! - only the owning group unselects a field
//!
//! Every state change refreshes the field's foreground from the palette.

use std::fmt;

use crossterm::event::MouseButton;
use ratatui::layout::Position;
use ratatui::style::{Color, Style};
use regview_core::model::RegisterModel;
use regview_core::mutation::{self, Mutation};
use regview_core::{CellKind, CellRef, RegviewResult};
use regview_utils::{debug, trace};

use crate::actions::{self, ActionKind, MenuAction};
use crate::editor::EditRequest;
use crate::group::FieldGroup;
use crate::navigation::{Direction, FieldPos};
use crate::palette::Palette;

/// Turns model text into displayed text
pub type Formatter = Box<dyn Fn(&str) -> String>;

/// Identifier of a field inside its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(usize);

impl FieldId
{
    #[must_use]
    pub const fn new(index: usize) -> Self
    {
        FieldId(index)
    }

    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0
    }
}

/// What an action did
#[derive(Debug)]
pub enum Outcome
{
    /// Nothing applied to this field
    Nothing,
    /// A mutation ran (it may still have been skipped)
    Mutated(Mutation),
    /// The user must confirm or cancel an edit
    Edit(EditRequest),
    /// The field text went to the clipboard
    Copied(String),
    /// The context menu was opened
    MenuShown,
}

impl Outcome
{
    /// Whether the model may have changed, so fields need a refresh.
    #[must_use]
    pub fn wrote_model(&self) -> bool
    {
        matches!(self, Outcome::Mutated(m) if m.is_applied())
    }
}

/// UI control bound to one register model cell
pub struct ValueField
{
    id: FieldId,
    cell: CellRef,
    width: u16,
    formatter: Formatter,
    palette: Palette,
    selected: bool,
    hovered: bool,
    raw_text: String,
    changed: bool,
    foreground: Color,
    actions: Vec<MenuAction>,
}

impl fmt::Debug for ValueField
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ValueField")
            .field("id", &self.id)
            .field("cell", &self.cell)
            .field("selected", &self.selected)
            .field("hovered", &self.hovered)
            .field("text", &self.raw_text)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

impl ValueField
{
    /// Create a field bound to `cell` and load its data.
    pub fn new<M: RegisterModel + ?Sized>(
        model: &M,
        id: FieldId,
        cell: CellRef,
        width: u16,
        formatter: Formatter,
        palette: Palette,
    ) -> Self
    {
        let mut field = Self {
            id,
            cell,
            width,
            formatter,
            palette,
            selected: false,
            hovered: false,
            raw_text: String::new(),
            changed: false,
            foreground: palette.foreground,
            actions: Vec::new(),
        };
        field.adjust_to_data(model);
        field
    }

    #[must_use]
    pub fn id(&self) -> FieldId
    {
        self.id
    }

    #[must_use]
    pub fn cell(&self) -> CellRef
    {
        self.cell
    }

    /// Width reserved in the layout, in terminal cells.
    #[must_use]
    pub fn width(&self) -> u16
    {
        self.width
    }

    #[must_use]
    pub fn is_selected(&self) -> bool
    {
        self.selected
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool
    {
        self.hovered
    }

    /// Whether the register changed since the last step, as of the last refresh.
    #[must_use]
    pub fn changed(&self) -> bool
    {
        self.changed
    }

    /// Action set as of the last refresh.
    #[must_use]
    pub fn actions(&self) -> &[MenuAction]
    {
        &self.actions
    }

    /// Displayed text: the model text through the formatter.
    #[must_use]
    pub fn text(&self) -> String
    {
        (self.formatter)(self.raw_text.as_str())
    }

    /// Reload text, "changed" flag and action set from the model.
    ///
    /// An unknown cell counts as changed.
    pub fn adjust_to_data<M: RegisterModel + ?Sized>(&mut self, model: &M)
    {
        self.raw_text = model.text(self.cell);
        self.changed = model.changed(self.cell).unwrap_or(true);
        self.actions = actions::compute(model, self.cell);
        self.update_palette();
    }

    fn update_palette(&mut self)
    {
        self.foreground = self.palette.foreground_for(self.changed);
    }

    /// Style to draw the field with.
    #[must_use]
    pub fn style(&self, focused: bool) -> Style
    {
        self.palette
            .field_style(self.foreground, self.selected, self.hovered, focused)
    }

    /// Pointer entered the field.
    pub fn enter(&mut self)
    {
        self.hovered = true;
        self.update_palette();
    }

    /// Pointer left the field.
    pub fn leave(&mut self)
    {
        self.hovered = false;
        self.update_palette();
    }

    /// Register the model should treat as active while this field is selected.
    ///
    /// Bit fields, normal registers and x87 data registers name themselves;
    /// other cells have no register of their own.
    pub fn reg_index<M: RegisterModel + ?Sized>(&self, model: &M) -> Option<CellRef>
    {
        match model.kind(self.cell) {
            CellKind::BitField { .. } | CellKind::NormalRegister | CellKind::FpuRegister => Some(self.cell),
            _ => None,
        }
    }

    /// Select the field and notify the model and the group.
    ///
    /// Does nothing when already selected.
    pub fn select<M, G>(&mut self, model: &mut M, group: &mut G)
    where
        M: RegisterModel + ?Sized,
        G: FieldGroup + ?Sized,
    {
        if self.selected {
            return;
        }
        self.selected = true;
        model.set_active(self.reg_index(model));
        group.field_selected(self.id);
        self.update_palette();
        trace!("Selected field {:?} ({})", self.id, self.cell);
    }

    /// Drop the selection. Called by the group when another field is selected.
    pub fn unselect(&mut self)
    {
        if !self.selected {
            return;
        }
        self.selected = false;
        self.update_palette();
    }

    /// Handle a mouse press at screen `position`.
    ///
    /// `double_click` is true for the second press of a double click, which
    /// never opens the menu.
    pub fn mouse_press<M, G>(&mut self, model: &mut M, group: &mut G, button: MouseButton, position: Position, double_click: bool)
    where
        M: RegisterModel + ?Sized,
        G: FieldGroup + ?Sized,
    {
        if matches!(button, MouseButton::Left | MouseButton::Right) {
            self.select(model, group);
        }
        if button == MouseButton::Right && !double_click {
            self.show_menu(group, position);
        }
    }

    /// Handle a double click: press logic, then the default action.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn mouse_double_click<M, G>(
        &mut self,
        model: &mut M,
        group: &mut G,
        button: MouseButton,
        position: Position,
    ) -> RegviewResult<Outcome>
    where
        M: RegisterModel + ?Sized,
        G: FieldGroup + ?Sized,
    {
        self.mouse_press(model, group, button, position, true);
        self.default_action(model)
    }

    /// Show the visible actions in the group's context menu.
    pub fn show_menu<G: FieldGroup + ?Sized>(&self, group: &mut G, position: Position)
    {
        group.show_menu(self.id, position, self.actions.clone());
    }

    /// Run the default action of the bound cell.
    ///
    /// - single-bit field: toggle the bit in the parent register
    /// - normal or x87 data register: edit it
    /// - SIMD lane: edit the vector register two levels up, at this lane
    /// - child of an x87 register: edit that register
    /// - anything else: nothing
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn default_action<M: RegisterModel + ?Sized>(&self, model: &mut M) -> RegviewResult<Outcome>
    {
        let kind = model.kind(self.cell);
        if kind.is_single_bit() {
            return Ok(Outcome::Mutated(mutation::toggle_bit(model, self.cell)?));
        }

        let target = match kind {
            CellKind::NormalRegister | CellKind::FpuRegister => Some(self.cell),
            CellKind::SimdElement { .. } => model.parent(self.cell).and_then(|lanes| model.parent(lanes)),
            _ => model
                .parent(self.cell)
                .filter(|parent| model.kind(*parent) == CellKind::FpuRegister),
        };

        let request = target.and_then(|target| EditRequest::for_cell(model, target, self.cell));
        match request {
            Some(request) => Ok(Outcome::Edit(request)),
            None => {
                debug!("No default action for {}", model.name(self.cell).unwrap_or("?"));
                Ok(Outcome::Nothing)
            }
        }
    }

    /// Run one action of the action set.
    ///
    /// # Errors
    ///
    /// Propagates a refused model write.
    pub fn trigger<M, G>(&self, kind: ActionKind, model: &mut M, group: &mut G) -> RegviewResult<Outcome>
    where
        M: RegisterModel + ?Sized,
        G: FieldGroup + ?Sized,
    {
        let outcome = match kind {
            ActionKind::Increment => Outcome::Mutated(mutation::increment(model, self.cell)?),
            ActionKind::Decrement => Outcome::Mutated(mutation::decrement(model, self.cell)?),
            ActionKind::Zero => Outcome::Mutated(mutation::set_zero(model, self.cell)?),
            ActionKind::SetToOne => Outcome::Mutated(mutation::set_to_one(model, self.cell)?),
            ActionKind::Invert => Outcome::Mutated(mutation::invert(model, self.cell)?),
            ActionKind::Modify | ActionKind::Toggle => self.default_action(model)?,
            ActionKind::CopyToClipboard => Outcome::Copied(self.copy_to_clipboard(group)),
            ActionKind::PushFpuStack => Outcome::Mutated(mutation::push_fpu_stack(model, self.cell)?),
            ActionKind::PopFpuStack => Outcome::Mutated(mutation::pop_fpu_stack(model, self.cell)?),
        };
        if let Outcome::Mutated(Mutation::Skipped(skip)) = &outcome {
            debug!("{:?} skipped on {}: {}", kind, model.name(self.cell).unwrap_or("?"), skip);
        }
        Ok(outcome)
    }

    /// Put the displayed text on the group's clipboard and return it.
    pub fn copy_to_clipboard<G: FieldGroup + ?Sized>(&self, group: &mut G) -> String
    {
        let text = self.text();
        group.copy_to_clipboard(text.clone());
        text
    }

    /// Neighbor in `direction` among the group's visible fields.
    pub fn neighbor<G: FieldGroup + ?Sized>(&self, group: &G, direction: Direction) -> Option<FieldId>
    {
        let current = group.field_pos(self.id)?;
        direction.neighbor(group.visible_fields(), current)
    }

    pub fn up<G: FieldGroup + ?Sized>(&self, group: &G) -> Option<FieldId>
    {
        self.neighbor(group, Direction::Up)
    }

    pub fn down<G: FieldGroup + ?Sized>(&self, group: &G) -> Option<FieldId>
    {
        self.neighbor(group, Direction::Down)
    }

    pub fn left<G: FieldGroup + ?Sized>(&self, group: &G) -> Option<FieldId>
    {
        self.neighbor(group, Direction::Left)
    }

    pub fn right<G: FieldGroup + ?Sized>(&self, group: &G) -> Option<FieldId>
    {
        self.neighbor(group, Direction::Right)
    }
}

#[cfg(test)]
mod tests
{
    use regview_core::model::x86_64::{sample, FSR_NAME};
    use regview_core::InMemoryModel;

    use super::*;
    use crate::editor::EditScope;

    /// Group double recording what fields ask of it
    #[derive(Default)]
    struct Recorder
    {
        positions: Vec<(FieldId, FieldPos)>,
        selected: Vec<FieldId>,
        menus: Vec<(FieldId, Position, usize)>,
        clipboard: Option<String>,
    }

    impl FieldGroup for Recorder
    {
        fn visible_fields(&self) -> Vec<(FieldId, FieldPos)>
        {
            self.positions.clone()
        }

        fn field_pos(&self, id: FieldId) -> Option<FieldPos>
        {
            self.positions.iter().find(|(f, _)| *f == id).map(|(_, p)| *p)
        }

        fn field_selected(&mut self, id: FieldId)
        {
            self.selected.push(id);
        }

        fn show_menu(&mut self, field: FieldId, position: Position, actions: Vec<MenuAction>)
        {
            self.menus.push((field, position, actions.len()));
        }

        fn copy_to_clipboard(&mut self, text: String)
        {
            self.clipboard = Some(text);
        }
    }

    fn field_for(model: &InMemoryModel, name: &str) -> ValueField
    {
        let cell = model.find(name).unwrap();
        ValueField::new(model, FieldId::new(0), cell, 16, Box::new(str::to_string), Palette::default())
    }

    #[test]
    fn test_hover_and_selection_states()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "RCX");

        field.enter();
        assert!(field.is_hovered());
        field.leave();
        assert!(!field.is_hovered());

        field.mouse_press(&mut model, &mut group, MouseButton::Left, Position::new(3, 4), false);
        field.mouse_press(&mut model, &mut group, MouseButton::Left, Position::new(3, 4), false);
        assert!(field.is_selected());
        assert_eq!(group.selected, vec![FieldId::new(0)]);
        assert_eq!(model.active(), Some(field.cell()));
        assert!(group.menus.is_empty());

        field.unselect();
        assert!(!field.is_selected());
    }

    #[test]
    fn test_right_press_opens_menu_once()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "RCX");

        field.mouse_press(&mut model, &mut group, MouseButton::Right, Position::new(1, 2), false);
        assert_eq!(group.menus.len(), 1);
        assert_eq!(group.menus[0].1, Position::new(1, 2));

        // Second half of a double click: select only
        field.mouse_press(&mut model, &mut group, MouseButton::Right, Position::new(1, 2), true);
        assert_eq!(group.menus.len(), 1);
    }

    #[test]
    fn test_middle_button_ignored()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "RCX");

        field.mouse_press(&mut model, &mut group, MouseButton::Middle, Position::new(0, 0), false);
        assert!(!field.is_selected());
        assert_eq!(model.active(), None);
    }

    #[test]
    fn test_lane_has_no_active_register()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "XMM0[0]");
        field.select(&mut model, &mut group);
        assert_eq!(model.active(), None);
    }

    #[test]
    fn test_double_click_toggles_bit()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "CF");
        assert_eq!(field.text(), "0");

        let outcome = field
            .mouse_double_click(&mut model, &mut group, MouseButton::Left, Position::new(0, 0))
            .unwrap();
        assert!(outcome.wrote_model());
        field.adjust_to_data(&model);
        assert_eq!(field.text(), "1");
        assert!(field.changed());
        assert!(field.is_selected());
    }

    #[test]
    fn test_default_action_dispatch()
    {
        let mut model = sample();

        let rcx = field_for(&model, "RCX");
        assert!(matches!(rcx.default_action(&mut model).unwrap(), Outcome::Edit(r) if r.target() == rcx.cell()));

        let lane = field_for(&model, "XMM0[3]");
        let xmm0 = model.find("XMM0").unwrap();
        assert!(matches!(lane.default_action(&mut model).unwrap(), Outcome::Edit(r) if r.target() == xmm0));

        let r7_value = field_for(&model, "R7.value");
        let r7 = model.find("R7").unwrap();
        assert!(matches!(r7_value.default_action(&mut model).unwrap(), Outcome::Edit(r) if r.target() == r7));

        let top = field_for(&model, "TOP");
        assert!(matches!(top.default_action(&mut model).unwrap(), Outcome::Nothing));
    }

    #[test]
    fn test_fpu_register_edits_itself()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut r0 = field_for(&model, "R0");
        let kinds: Vec<ActionKind> = r0.actions().iter().map(|action| action.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Modify, ActionKind::CopyToClipboard]);

        match r0.default_action(&mut model).unwrap() {
            Outcome::Edit(request) => {
                assert_eq!(request.target(), r0.cell());
                assert_eq!(request.scope(), EditScope::Fpu);
            }
            _ => panic!("R0 should open the x87 editor"),
        }

        assert_eq!(r0.reg_index(&model), Some(r0.cell()));
        r0.select(&mut model, &mut group);
        assert_eq!(model.active(), Some(r0.cell()));
    }

    #[test]
    fn test_trigger_actions()
    {
        let mut model = sample();
        let mut group = Recorder::default();

        let mut rax = field_for(&model, "RAX");
        rax.trigger(ActionKind::SetToOne, &mut model, &mut group).unwrap();
        rax.trigger(ActionKind::Increment, &mut model, &mut group).unwrap();
        rax.adjust_to_data(&model);
        assert_eq!(rax.text(), "0000000000000002");

        let fsr = field_for(&model, FSR_NAME);
        let outcome = fsr.trigger(ActionKind::PopFpuStack, &mut model, &mut group).unwrap();
        assert!(matches!(outcome, Outcome::Mutated(Mutation::Applied { before: 0x3800, after: 0x0000 })));

        let outcome = rax.trigger(ActionKind::CopyToClipboard, &mut model, &mut group).unwrap();
        assert!(matches!(outcome, Outcome::Copied(ref text) if text == "0000000000000002"));
        assert_eq!(group.clipboard.as_deref(), Some("0000000000000002"));
    }

    #[test]
    fn test_formatter_applies_to_text()
    {
        let model = sample();
        let cell = model.find("RIP").unwrap();
        let field = ValueField::new(
            &model,
            FieldId::new(1),
            cell,
            16,
            Box::new(|text: &str| text.to_uppercase()),
            Palette::default(),
        );
        assert_eq!(field.text(), "0000555555555149");
    }

    #[test]
    fn test_changed_foreground()
    {
        let mut model = sample();
        let mut group = Recorder::default();
        let mut field = field_for(&model, "RDX");
        assert_eq!(field.style(true).fg, Some(Palette::default().foreground));

        field.trigger(ActionKind::Invert, &mut model, &mut group).unwrap();
        field.adjust_to_data(&model);
        assert_eq!(field.style(true).fg, Some(Palette::default().changed));

        model.sample_step();
        field.adjust_to_data(&model);
        assert!(!field.changed());
    }

    #[test]
    fn test_unknown_cell_counts_as_changed()
    {
        let model = sample();
        let field = ValueField::new(
            &model,
            FieldId::new(2),
            CellRef::new(100_000),
            4,
            Box::new(str::to_string),
            Palette::default(),
        );
        assert!(field.changed());
    }

    #[test]
    fn test_navigation_through_group()
    {
        let model = sample();
        let field = field_for(&model, "RAX");
        let group = Recorder {
            positions: vec![
                (FieldId::new(0), FieldPos::new(0, 0)),
                (FieldId::new(1), FieldPos::new(0, -10)),
                (FieldId::new(2), FieldPos::new(0, 10)),
                (FieldId::new(3), FieldPos::new(-10, 0)),
                (FieldId::new(4), FieldPos::new(10, 0)),
            ],
            ..Recorder::default()
        };
        assert_eq!(field.up(&group), Some(FieldId::new(1)));
        assert_eq!(field.down(&group), Some(FieldId::new(2)));
        assert_eq!(field.left(&group), Some(FieldId::new(3)));
        assert_eq!(field.right(&group), Some(FieldId::new(4)));
    }
}
