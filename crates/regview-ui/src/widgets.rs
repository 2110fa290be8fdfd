//! Widget components for the register view and its popups

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::actions::MenuAction;
use crate::app::App;
use crate::group::{Item, RegisterView, ViewLine};
use crate::palette::Palette;

/// Draw the register view
///
/// Records the drawn area in the view so mouse positions can be mapped back
/// to fields.
pub fn draw_registers(frame: &mut Frame, area: Rect, app: &mut App)
{
    let block = Block::default().borders(Borders::ALL).title("Registers");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.view.set_area(inner);
    app.view.scroll_to_selection(usize::from(inner.height));

    let focused = app.view_focused();
    let lines: Vec<Line> = app
        .view
        .visible_lines()
        .into_iter()
        .skip(app.view.scroll())
        .take(usize::from(inner.height))
        .map(|line| render_line(&app.view, &app.palette, line, focused))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_line<'a>(view: &RegisterView, palette: &Palette, line: &'a ViewLine, focused: bool) -> Line<'a>
{
    let mut spans = Vec::with_capacity(line.items.len() * 2);
    let mut column = 0u16;

    for placed in &line.items {
        if placed.x > column {
            spans.push(Span::raw(" ".repeat(usize::from(placed.x - column))));
        }
        match &placed.item {
            Item::Label { text, header: true } => {
                let marker = if view.is_collapsed(line.category) { " [+]" } else { "" };
                spans.push(Span::styled(
                    format!("{text}{marker}"),
                    Style::default().fg(palette.category).add_modifier(Modifier::BOLD),
                ));
            }
            Item::Label { text, header: false } => {
                spans.push(Span::styled(text.as_str(), Style::default().fg(palette.label)));
            }
            Item::Field(id) => {
                if let Some(field) = view.field(*id) {
                    let width = usize::from(placed.width);
                    spans.push(Span::styled(format!("{:<width$}", field.text()), field.style(focused)));
                }
            }
        }
        column = placed.x.saturating_add(placed.width);
    }

    Line::from(spans)
}

/// Draw the context menu of the selected field, if one is open
pub fn draw_menu(frame: &mut Frame, app: &App)
{
    let Some(menu) = app.view.menu() else {
        return;
    };
    let rect = menu.rect(app.screen);
    let inner_width = usize::from(rect.width.saturating_sub(2));

    let lines: Vec<Line> = menu
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| menu_line(action, inner_width, index == menu.highlighted))
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan))),
        rect,
    );
}

/// One menu entry: label with the accelerator underlined, shortcut right-aligned.
fn menu_line(action: &MenuAction, width: usize, highlighted: bool) -> Line<'static>
{
    let base = if highlighted {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::styled(" ", base)];
    match action.label.split_once('&') {
        Some((before, rest)) => {
            let mut chars = rest.chars();
            spans.push(Span::styled(before, base));
            if let Some(accelerator) = chars.next() {
                spans.push(Span::styled(
                    accelerator.to_string(),
                    base.add_modifier(Modifier::UNDERLINED),
                ));
            }
            spans.push(Span::styled(chars.as_str(), base));
        }
        None => spans.push(Span::styled(action.label, base)),
    }

    let shortcut = action.shortcut.map(|s| s.to_string()).unwrap_or_default();
    let used = 1 + action.text().chars().count();
    let padding = width.saturating_sub(used + shortcut.chars().count() + 1);
    spans.push(Span::styled(" ".repeat(padding), base));
    spans.push(Span::styled(shortcut, base.fg(Color::DarkGray)));
    spans.push(Span::styled(" ", base));

    Line::from(spans)
}

/// Draw the edit popup, if one is open
pub fn draw_editor(frame: &mut Frame, area: Rect, app: &App)
{
    let Some(editor) = &app.editor else {
        return;
    };

    let rect = centered_rect(area, 50, 6);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(editor.input.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
    ];
    match &editor.error {
        Some(error) => lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red)))),
        None => lines.push(Line::from(Span::styled(
            "Enter: write  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(editor.request.title())
                .border_style(Style::default().fg(Color::Yellow)),
        ),
        rect,
    );
}

/// Rectangle of at most `width` x `height` centered in `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect
{
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
