//! Context menu actions of a value field
//!
//! The action set is a pure function of the cell's current state. Fields
//! recompute it on every refresh instead of toggling menu entries in place,
//! so visibility (e.g. "Zero" on a register that already holds 0) always
//! matches the model.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use regview_core::model::RegisterModel;
use regview_core::mutation::{gpr_value, is_general_purpose, is_status_word};
use regview_core::{CellKind, CellRef};

/// What a menu entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind
{
    Increment,
    Decrement,
    Zero,
    SetToOne,
    Invert,
    /// Open the value editor (the default action of registers and lanes)
    Modify,
    /// Flip a single-bit field (its default action)
    Toggle,
    CopyToClipboard,
    PushFpuStack,
    PopFpuStack,
}

/// Key combination that triggers an action without opening the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut
{
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Shortcut
{
    const fn key(code: KeyCode) -> Self
    {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    const fn ctrl(c: char) -> Self
    {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Whether a key press matches this shortcut.
    ///
    /// Shift is ignored for characters, since terminals report `+` with
    /// or without it depending on the layout.
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool
    {
        if event.code != self.code {
            return false;
        }
        let significant = KeyModifiers::CONTROL | KeyModifiers::ALT;
        match self.code {
            KeyCode::Char(_) => event.modifiers & significant == self.modifiers & significant,
            _ => event.modifiers == self.modifiers,
        }
    }
}

impl fmt::Display for Shortcut
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        match self.code {
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            other => write!(f, "{other:?}"),
        }
    }
}

/// One entry of a field's context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAction
{
    pub kind: ActionKind,
    /// Label with `&` before the accelerator character
    pub label: &'static str,
    pub shortcut: Option<Shortcut>,
    pub visible: bool,
}

impl MenuAction
{
    fn new(kind: ActionKind, label: &'static str, shortcut: Option<Shortcut>) -> Self
    {
        Self {
            kind,
            label,
            shortcut,
            visible: true,
        }
    }

    /// Label without the accelerator marker.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use regview_ui::actions::{compute, ActionKind};
    /// use regview_core::model::x86_64;
    ///
    /// let model = x86_64::sample();
    /// let rbx = model.find("RBX").unwrap();
    /// let one = compute(&model, rbx).into_iter().find(|a| a.kind == ActionKind::SetToOne).unwrap();
    /// assert_eq!(one.text(), "Set to 1");
    /// assert_eq!(one.accelerator(), Some('1'));
    /// assert!(!one.visible); // RBX already holds 1
    /// ```
    #[must_use]
    pub fn text(&self) -> String
    {
        self.label.replace('&', "")
    }

    /// Character after the `&` marker, lowercased.
    #[must_use]
    pub fn accelerator(&self) -> Option<char>
    {
        let (_, rest) = self.label.split_once('&')?;
        rest.chars().next().map(|c| c.to_ascii_lowercase())
    }
}

/// Compute the action set of the field bound to `cell`.
///
/// Order: integer mutations for general-purpose registers, then the default
/// action (Modify for registers and SIMD lanes, Toggle for single-bit
/// fields), Copy, and finally the x87 stack actions for the FPU status word.
pub fn compute<M: RegisterModel + ?Sized>(model: &M, cell: CellRef) -> Vec<MenuAction>
{
    let mut actions = Vec::with_capacity(10);

    if is_general_purpose(model, cell) {
        // An empty register keeps both entries visible
        let value = gpr_value(model, cell);
        actions.push(MenuAction::new(
            ActionKind::Increment,
            "&Increment",
            Some(Shortcut::key(KeyCode::Char('+'))),
        ));
        actions.push(MenuAction::new(
            ActionKind::Decrement,
            "&Decrement",
            Some(Shortcut::key(KeyCode::Char('-'))),
        ));
        actions.push(MenuAction {
            visible: value != Some(0),
            ..MenuAction::new(ActionKind::Zero, "&Zero", Some(Shortcut::key(KeyCode::Char('0'))))
        });
        actions.push(MenuAction {
            visible: value != Some(1),
            ..MenuAction::new(ActionKind::SetToOne, "Set to &1", None)
        });
        actions.push(MenuAction::new(ActionKind::Invert, "In&vert", None));
    }

    match model.kind(cell) {
        CellKind::NormalRegister | CellKind::FpuRegister | CellKind::SimdElement { .. } => {
            actions.push(MenuAction::new(
                ActionKind::Modify,
                "&Modify…",
                Some(Shortcut::key(KeyCode::Enter)),
            ));
        }
        kind if kind.is_single_bit() => {
            actions.push(MenuAction::new(
                ActionKind::Toggle,
                "&Toggle",
                Some(Shortcut::key(KeyCode::Enter)),
            ));
        }
        _ => {}
    }

    actions.push(MenuAction::new(
        ActionKind::CopyToClipboard,
        "&Copy to clipboard",
        Some(Shortcut::ctrl('c')),
    ));

    if is_status_word(model, cell) {
        actions.push(MenuAction::new(ActionKind::PushFpuStack, "P&ush FPU stack", None));
        actions.push(MenuAction::new(ActionKind::PopFpuStack, "P&op FPU stack", None));
    }

    actions
}

/// Visible action bound to the pressed key, if any.
#[must_use]
pub fn by_shortcut(actions: &[MenuAction], event: &KeyEvent) -> Option<ActionKind>
{
    actions
        .iter()
        .filter(|action| action.visible)
        .find(|action| action.shortcut.is_some_and(|shortcut| shortcut.matches(event)))
        .map(|action| action.kind)
}

/// Visible action whose accelerator is `c`, if any.
#[must_use]
pub fn by_accelerator(actions: &[MenuAction], c: char) -> Option<ActionKind>
{
    let c = c.to_ascii_lowercase();
    actions
        .iter()
        .filter(|action| action.visible)
        .find(|action| action.accelerator() == Some(c))
        .map(|action| action.kind)
}

#[cfg(test)]
mod tests
{
    use regview_core::model::x86_64::{sample, FSR_NAME};

    use super::*;

    fn kinds(actions: &[MenuAction]) -> Vec<ActionKind>
    {
        actions.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_gpr_actions_come_first()
    {
        let model = sample();
        let rcx = model.find("RCX").unwrap();
        assert_eq!(
            kinds(&compute(&model, rcx)),
            vec![
                ActionKind::Increment,
                ActionKind::Decrement,
                ActionKind::Zero,
                ActionKind::SetToOne,
                ActionKind::Invert,
                ActionKind::Modify,
                ActionKind::CopyToClipboard,
            ]
        );
    }

    #[test]
    fn test_zero_hidden_when_zero()
    {
        let model = sample();
        let rax = model.find("RAX").unwrap();
        let actions = compute(&model, rax);
        let zero = actions.iter().find(|a| a.kind == ActionKind::Zero).unwrap();
        let one = actions.iter().find(|a| a.kind == ActionKind::SetToOne).unwrap();
        assert!(!zero.visible);
        assert!(one.visible);
    }

    #[test]
    fn test_status_word_gets_stack_actions()
    {
        let model = sample();
        let fsr = model.find(FSR_NAME).unwrap();
        assert_eq!(
            kinds(&compute(&model, fsr)),
            vec![
                ActionKind::Modify,
                ActionKind::CopyToClipboard,
                ActionKind::PushFpuStack,
                ActionKind::PopFpuStack,
            ]
        );
    }

    #[test]
    fn test_bit_fields()
    {
        let model = sample();
        let zf = model.find("ZF").unwrap();
        let top = model.find("TOP").unwrap();
        assert_eq!(
            kinds(&compute(&model, zf)),
            vec![ActionKind::Toggle, ActionKind::CopyToClipboard]
        );
        assert_eq!(kinds(&compute(&model, top)), vec![ActionKind::CopyToClipboard]);
    }

    #[test]
    fn test_simd_lane_can_be_modified()
    {
        let model = sample();
        let lane = model.find("XMM0[1]").unwrap();
        assert_eq!(
            kinds(&compute(&model, lane)),
            vec![ActionKind::Modify, ActionKind::CopyToClipboard]
        );
    }

    #[test]
    fn test_fpu_register_can_be_modified()
    {
        let model = sample();
        let r0 = model.find("R0").unwrap();
        assert_eq!(
            kinds(&compute(&model, r0)),
            vec![ActionKind::Modify, ActionKind::CopyToClipboard]
        );

        let value = model.find("R0.value").unwrap();
        assert_eq!(kinds(&compute(&model, value)), vec![ActionKind::CopyToClipboard]);
    }

    #[test]
    fn test_shortcut_lookup()
    {
        let model = sample();
        let rcx = model.find("RCX").unwrap();
        let actions = compute(&model, rcx);

        let plus = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT);
        let copy = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(by_shortcut(&actions, &plus), Some(ActionKind::Increment));
        assert_eq!(by_shortcut(&actions, &copy), Some(ActionKind::CopyToClipboard));
        assert_eq!(by_shortcut(&actions, &enter), Some(ActionKind::Modify));
        assert_eq!(by_accelerator(&actions, 'V'), Some(ActionKind::Invert));
    }

    #[test]
    fn test_hidden_actions_have_no_shortcut()
    {
        let model = sample();
        let rax = model.find("RAX").unwrap();
        let zero_key = KeyEvent::new(KeyCode::Char('0'), KeyModifiers::NONE);
        assert_eq!(by_shortcut(&compute(&model, rax), &zero_key), None);
    }

    #[test]
    fn test_shortcut_display()
    {
        assert_eq!(Shortcut::ctrl('c').to_string(), "Ctrl+C");
        assert_eq!(Shortcut::key(KeyCode::Enter).to_string(), "Enter");
    }
}
