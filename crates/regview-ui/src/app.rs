//! Application state and logic

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use regview_core::mutation::Mutation;
use regview_core::types::{ElementSize, NumberFormat};
use regview_core::{CellKind, CellRef, InMemoryModel, RegisterModel, RegviewError, RegviewResult};
use regview_utils::{debug, info, warn, ViewConfig};

use crate::editor::EditRequest;
use crate::field::{FieldId, Outcome};
use crate::group::RegisterView;
use crate::navigation::Direction;
use crate::palette::Palette;

/// Line shown in the footer after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status
{
    Info(String),
    Error(String),
}

/// Open edit popup
#[derive(Debug)]
pub struct EditorState
{
    pub request: EditRequest,
    /// Text typed so far, starting from the current value
    pub input: String,
    /// Last parse error, cleared on the next key
    pub error: Option<String>,
}

impl EditorState
{
    fn new(request: EditRequest) -> Self
    {
        let input = request.initial_text();
        Self {
            request,
            input,
            error: None,
        }
    }
}

/// Detects two presses of the same button on the same field
#[derive(Debug)]
struct ClickTracker
{
    interval: Duration,
    last: Option<(FieldId, MouseButton, Instant)>,
}

impl ClickTracker
{
    fn new(interval: Duration) -> Self
    {
        Self { interval, last: None }
    }

    /// Record a press; true when it completes a double click.
    fn press(&mut self, field: Option<FieldId>, button: MouseButton, now: Instant) -> bool
    {
        let double = match (self.last, field) {
            (Some((last_field, last_button, at)), Some(field)) => {
                last_field == field && last_button == button && now.saturating_duration_since(at) <= self.interval
            }
            _ => false,
        };
        // A third press starts a new pair
        self.last = if double { None } else { field.map(|field| (field, button, now)) };
        double
    }
}

/// Which half of the lane view to cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneChange
{
    Format,
    Size,
}

/// Application state
pub struct App
{
    /// Register file shown and edited
    pub model: InMemoryModel,
    /// Fields laid out over the model
    pub view: RegisterView,
    pub palette: Palette,
    pub config: ViewConfig,
    /// Edit popup, when a default action asked for a new value
    pub editor: Option<EditorState>,
    /// Result of the last action
    pub status: Option<Status>,
    /// Whether the application should exit
    pub should_quit: bool,
    /// Whole terminal area as of the last draw
    pub screen: Rect,
    clicks: ClickTracker,
}

impl App
{
    /// Create a new application instance
    #[must_use]
    pub fn new(model: InMemoryModel, config: ViewConfig) -> Self
    {
        let palette = Palette::from_config(&config);
        let view = RegisterView::new(&model, palette, config.hex_case);
        Self {
            model,
            view,
            palette,
            clicks: ClickTracker::new(config.double_click),
            config,
            editor: None,
            status: None,
            should_quit: false,
            screen: Rect::default(),
        }
    }

    /// Whether the register view has keyboard focus (no popup above it)
    #[must_use]
    pub fn view_focused(&self) -> bool
    {
        self.editor.is_none() && self.view.menu().is_none()
    }

    /// Handle a keyboard event
    ///
    /// Returns `true` if the application should quit, `false` otherwise.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool
    {
        if self.editor.is_some() {
            self.handle_editor_key(key_event);
            return false;
        }
        if self.view.menu().is_some() {
            self.handle_menu_key(key_event);
            return false;
        }

        self.status = None;

        match self.view.shortcut(&mut self.model, &key_event) {
            Ok(Some(outcome)) => {
                self.apply(Ok(outcome));
                return false;
            }
            Ok(None) => {}
            Err(e) => {
                self.apply(Err(e));
                return false;
            }
        }

        match key_event.code {
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => {
                self.should_quit = true;
                return true;
            }
            KeyCode::Up => self.navigate(Direction::Up),
            KeyCode::Down => self.navigate(Direction::Down),
            KeyCode::Left => self.navigate(Direction::Left),
            KeyCode::Right => self.navigate(Direction::Right),
            KeyCode::Enter => {
                let result = self.view.default_action(&mut self.model);
                self.apply(result);
            }
            KeyCode::Char('m') => {
                if !self.view.open_menu() {
                    self.status = Some(Status::Info("Select a field first".to_string()));
                }
            }
            KeyCode::Char('s') => {
                self.model.sample_step();
                self.view.refresh(&self.model);
                self.status = Some(Status::Info("Stepped: changes cleared".to_string()));
            }
            KeyCode::Char('c') => self.view.toggle_collapse(&mut self.model),
            KeyCode::Char('f') => self.cycle_lanes(LaneChange::Format),
            KeyCode::Char('w') => self.cycle_lanes(LaneChange::Size),
            _ => {}
        }

        false
    }

    fn navigate(&mut self, direction: Direction)
    {
        if !self.view.navigate(&mut self.model, direction) {
            debug!("No field {:?} of the selection", direction);
        }
    }

    fn handle_menu_key(&mut self, key_event: KeyEvent)
    {
        match key_event.code {
            KeyCode::Esc => self.view.close_menu(),
            KeyCode::Up => self.view.menu_move(-1),
            KeyCode::Down => self.view.menu_move(1),
            KeyCode::Enter => {
                let result = self.view.menu_activate_highlighted(&mut self.model);
                self.apply(result);
            }
            KeyCode::Char(c) => match self.view.menu_accelerator(&mut self.model, c) {
                Ok(Some(outcome)) => self.apply(Ok(outcome)),
                Ok(None) => {}
                Err(e) => self.apply(Err(e)),
            },
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key_event: KeyEvent)
    {
        let Some(editor) = &mut self.editor else {
            return;
        };
        match key_event.code {
            KeyCode::Esc => {
                debug!("Edit of {} cancelled", editor.request.title());
                self.editor = None;
            }
            KeyCode::Enter => match editor.request.parse(&editor.input) {
                Ok(value) => {
                    if let Some(editor) = self.editor.take() {
                        let title = editor.request.title();
                        match editor.request.confirm(&mut self.model, &value) {
                            Ok(()) => self.status = Some(Status::Info(format!("{title}: written"))),
                            Err(e) => self.report(&e),
                        }
                        self.view.refresh(&self.model);
                    }
                }
                Err(e) => editor.error = Some(e.to_string()),
            },
            KeyCode::Backspace => {
                editor.input.pop();
                editor.error = None;
            }
            KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                editor.input.push(c);
                editor.error = None;
            }
            _ => {}
        }
    }

    /// Handle a mouse event
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent)
    {
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.view.hover(mouse.column, mouse.row),
            MouseEventKind::Down(button) => self.mouse_down(button, mouse.column, mouse.row),
            MouseEventKind::ScrollUp => self.navigate(Direction::Up),
            MouseEventKind::ScrollDown => self.navigate(Direction::Down),
            _ => {}
        }
    }

    fn mouse_down(&mut self, button: MouseButton, column: u16, row: u16)
    {
        if self.editor.is_some() {
            return;
        }
        if let Some(menu) = self.view.menu() {
            // A press outside the menu only closes it
            match menu.entry_at(self.screen, column, row) {
                Some(index) => {
                    let result = self.view.menu_activate(&mut self.model, index);
                    self.apply(result);
                }
                None => self.view.close_menu(),
            }
            return;
        }

        self.status = None;
        let field = self.view.field_at(column, row);
        let double_click = self.clicks.press(field, button, Instant::now());
        let result = self.view.press(&mut self.model, button, column, row, double_click);
        self.apply(result);
    }

    /// Update the application state (called on each tick)
    pub fn tick(&mut self)
    {
        self.view.refresh(&self.model);
    }

    /// Act on what a field operation returned and refresh the fields.
    fn apply(&mut self, result: RegviewResult<Outcome>)
    {
        match result {
            Ok(Outcome::Edit(request)) => {
                info!("Editing {}", request.title());
                self.editor = Some(EditorState::new(request));
            }
            Ok(Outcome::Mutated(Mutation::Applied { before, after })) => {
                self.status = Some(Status::Info(format!("{before:#x} -> {after:#x}")));
            }
            Ok(Outcome::Mutated(Mutation::Skipped(skip))) => {
                self.status = Some(Status::Info(format!("Nothing to do: {skip}")));
            }
            Ok(Outcome::Copied(text)) => {
                self.status = Some(Status::Info(format!("Copied {text}")));
            }
            Ok(Outcome::Nothing | Outcome::MenuShown) => {}
            Err(e) => self.report(&e),
        }
        self.view.refresh(&self.model);
    }

    fn report(&mut self, error: &RegviewError)
    {
        warn!("Register write failed: {}", error);
        self.status = Some(Status::Error(error.to_string()));
    }

    /// Lane container of the selected vector register or lane.
    fn lane_container(&self) -> Option<CellRef>
    {
        let cell = self.view.selected_field()?.cell();
        match self.model.kind(cell) {
            CellKind::SimdElement { .. } => self.model.parent(cell),
            _ => self
                .model
                .children(cell)
                .into_iter()
                .find(|child| self.model.lane_view(*child).is_some()),
        }
    }

    fn cycle_lanes(&mut self, change: LaneChange)
    {
        let Some(container) = self.lane_container() else {
            self.status = Some(Status::Info("Select a vector register or lane".to_string()));
            return;
        };
        let Some((size, format)) = self.model.lane_view(container) else {
            return;
        };
        let (size, format) = match change {
            LaneChange::Format => (size, next_format(format)),
            LaneChange::Size => (next_size(size), format),
        };
        let register = self.model.parent(container);

        match self.model.set_lane_view(container, size, format) {
            Ok(()) => {
                // Lane fields are bound to stale cells now
                let rebuilt = RegisterView::new(&self.model, self.palette, self.config.hex_case);
                let previous = std::mem::replace(&mut self.view, rebuilt);
                self.view.carry_over(previous);
                if let Some(register) = register {
                    self.view.select_cell(&mut self.model, register);
                }
                self.status = Some(Status::Info(format!("Lanes: {size} {format}")));
            }
            Err(e) => self.report(&e),
        }
    }
}

fn next_format(format: NumberFormat) -> NumberFormat
{
    match format {
        NumberFormat::Hex => NumberFormat::Signed,
        NumberFormat::Signed => NumberFormat::Unsigned,
        NumberFormat::Unsigned => NumberFormat::Float,
        NumberFormat::Float => NumberFormat::Hex,
    }
}

fn next_size(size: ElementSize) -> ElementSize
{
    match size {
        ElementSize::Byte => ElementSize::Word,
        ElementSize::Word => ElementSize::Dword,
        ElementSize::Dword => ElementSize::Qword,
        ElementSize::Qword => ElementSize::Byte,
    }
}

#[cfg(test)]
mod tests
{
    use regview_core::model::x86_64::sample;

    use super::*;

    fn app() -> App
    {
        let mut app = App::new(sample(), ViewConfig::default());
        app.view.set_area(Rect::new(0, 0, 120, 200));
        app.screen = Rect::new(0, 0, 120, 200);
        app
    }

    fn key(code: KeyCode) -> KeyEvent
    {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn select(app: &mut App, name: &str)
    {
        let cell = app.model.find(name).unwrap();
        assert!(app.view.select_cell(&mut app.model, cell));
    }

    #[test]
    fn test_quit_keys()
    {
        let mut app = app();
        assert!(app.handle_key_event(key(KeyCode::Char('q'))));
        assert!(app.should_quit);

        let mut app = self::app();
        assert!(app.handle_key_event(key(KeyCode::Esc)));
    }

    #[test]
    fn test_arrows_then_increment()
    {
        let mut app = app();
        app.handle_key_event(key(KeyCode::Down));
        app.handle_key_event(key(KeyCode::Down));
        let rbx = app.model.find("RBX").unwrap();
        assert_eq!(app.view.selected_field().unwrap().cell(), rbx);

        app.handle_key_event(key(KeyCode::Char('+')));
        assert_eq!(app.model.text(rbx), "0000000000000002");
        assert_eq!(app.status, Some(Status::Info("0x1 -> 0x2".to_string())));
        assert!(app.view.selected_field().unwrap().changed());

        app.handle_key_event(key(KeyCode::Char('s')));
        assert!(!app.view.selected_field().unwrap().changed());
    }

    #[test]
    fn test_edit_popup_writes_value()
    {
        let mut app = app();
        select(&mut app, "RCX");
        app.handle_key_event(key(KeyCode::Enter));
        let editor = app.editor.as_mut().unwrap();
        assert_eq!(editor.input, "0x0000000000000020");
        editor.input.clear();

        for c in "0x4z".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Enter));
        assert!(app.editor.as_ref().unwrap().error.is_some());

        app.handle_key_event(key(KeyCode::Backspace));
        app.handle_key_event(key(KeyCode::Char('2')));
        app.handle_key_event(key(KeyCode::Enter));
        assert!(app.editor.is_none());
        assert_eq!(app.model.text(app.model.find("RCX").unwrap()), "0000000000000042");
    }

    #[test]
    fn test_edit_popup_cancel()
    {
        let mut app = app();
        select(&mut app, "RCX");
        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Char('7')));
        app.handle_key_event(key(KeyCode::Esc));
        assert!(app.editor.is_none());
        assert!(!app.should_quit);
        assert_eq!(app.model.text(app.model.find("RCX").unwrap()), "0000000000000020");
    }

    #[test]
    fn test_enter_toggles_flag()
    {
        let mut app = app();
        select(&mut app, "ZF");
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.model.text(app.model.find("ZF").unwrap()), "0");
        assert!(app.editor.is_none());
    }

    #[test]
    fn test_menu_keys()
    {
        let mut app = app();
        select(&mut app, "RDX");
        app.handle_key_event(key(KeyCode::Char('m')));
        assert!(app.view.menu().is_some());
        assert!(!app.view_focused());

        app.handle_key_event(key(KeyCode::Char('z')));
        assert!(app.view.menu().is_none());
        assert_eq!(app.model.text(app.model.find("RDX").unwrap()), "0000000000000000");

        app.handle_key_event(key(KeyCode::Char('m')));
        app.handle_key_event(key(KeyCode::Esc));
        assert!(app.view.menu().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_double_click_opens_editor()
    {
        let mut app = app();
        let rsi = app.view.field_by_cell(app.model.find("RSI").unwrap()).unwrap();
        let pos = app.view.screen_position(rsi).unwrap();
        let press = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: pos.x,
            row: pos.y,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse_event(press);
        assert!(app.editor.is_none());
        app.handle_mouse_event(press);
        assert!(app.editor.is_some());
    }

    #[test]
    fn test_click_tracker()
    {
        let mut clicks = ClickTracker::new(Duration::from_millis(400));
        let start = Instant::now();
        let a = Some(FieldId::new(1));
        let b = Some(FieldId::new(2));

        assert!(!clicks.press(a, MouseButton::Left, start));
        assert!(clicks.press(a, MouseButton::Left, start + Duration::from_millis(100)));
        assert!(!clicks.press(a, MouseButton::Left, start + Duration::from_millis(200)));

        assert!(!clicks.press(b, MouseButton::Left, start + Duration::from_millis(300)));
        assert!(!clicks.press(a, MouseButton::Left, start + Duration::from_millis(350)));
        assert!(!clicks.press(a, MouseButton::Right, start + Duration::from_millis(360)));
        assert!(!clicks.press(a, MouseButton::Right, start + Duration::from_secs(2)));
        assert!(!clicks.press(None, MouseButton::Left, start + Duration::from_secs(3)));
    }

    #[test]
    fn test_cycle_lane_format()
    {
        let mut app = app();
        select(&mut app, "XMM0[1]");
        app.handle_key_event(key(KeyCode::Char('f')));

        let xmm0 = app.model.find("XMM0").unwrap();
        assert_eq!(app.view.selected_field().unwrap().cell(), xmm0);
        let lane = app.model.find("XMM0[0]").unwrap();
        assert_eq!(app.model.text(lane), "3f800000");
        assert!(app.view.field_by_cell(lane).is_some());

        app.handle_key_event(key(KeyCode::Char('w')));
        let lanes = app.model.children(app.model.children(xmm0)[0]);
        assert_eq!(lanes.len(), 2);
    }

    #[test]
    fn test_lane_change_keeps_view_state()
    {
        let mut app = app();
        select(&mut app, "RAX");
        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        app.handle_key_event(key(KeyCode::Char('c')));
        assert!(app.view.is_collapsed(0));

        select(&mut app, "XMM0[1]");
        app.handle_key_event(key(KeyCode::Char('f')));
        app.handle_key_event(key(KeyCode::Char('w')));

        assert!(app.view.is_collapsed(0));
        assert!(!app.view.is_collapsed(2));
        assert_eq!(app.view.clipboard(), Some("0000000000000000"));
        assert_eq!(app.view.area(), Rect::new(0, 0, 120, 200));
        assert!(app.view.visible_lines().iter().all(|line| line.category != 0 || line.header));
    }

    #[test]
    fn test_lane_keys_need_vector_selection()
    {
        let mut app = app();
        select(&mut app, "RAX");
        app.handle_key_event(key(KeyCode::Char('f')));
        assert_eq!(
            app.status,
            Some(Status::Info("Select a vector register or lane".to_string()))
        );
    }
}
