//! UI rendering logic

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use regview_core::RegisterModel;

use crate::app::{App, Status};

/// Draw the UI
pub fn draw(frame: &mut Frame, app: &mut App)
{
    app.screen = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(0),    // Register view
        Constraint::Length(4), // Footer/status
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    crate::widgets::draw_registers(frame, chunks[1], app);
    draw_footer(frame, chunks[2], app);

    // Popups go last so they cover the view
    crate::widgets::draw_menu(frame, app);
    crate::widgets::draw_editor(frame, chunks[1], app);
}

/// Draw the header bar
fn draw_header(frame: &mut Frame, area: Rect, app: &App)
{
    let title = match app.model.active().and_then(|cell| app.model.name(cell)) {
        Some(name) => format!("regview - {name}"),
        None => "regview".to_string(),
    };

    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL).title("regview"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    frame.render_widget(header, area);
}

/// Draw the footer with help text and the last status
fn draw_footer(frame: &mut Frame, area: Rect, app: &App)
{
    let help_text = if app.editor.is_some() {
        "Type a value | Enter:Write Esc:Cancel"
    } else if app.view.menu().is_some() {
        "↑/↓:Choose Enter:Run | underlined key:Run | Esc:Close"
    } else {
        "Arrows:Navigate Enter:Edit/Toggle m:Menu +/-/0:Adjust Ctrl+C:Copy | s:Step c:Collapse f/w:Lanes | q:Quit"
    };

    let mut footer_lines = vec![Line::from(help_text)];
    match &app.status {
        Some(Status::Info(text)) => footer_lines.push(Line::from(Span::styled(
            text.as_str(),
            Style::default().fg(Color::Green),
        ))),
        Some(Status::Error(text)) => footer_lines.push(Line::from(Span::styled(
            format!("Error: {text}"),
            Style::default().fg(Color::Red),
        ))),
        None => {}
    }

    let footer = Paragraph::new(footer_lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .style(Style::default().fg(app.palette.foreground))
        .wrap(ratatui::widgets::Wrap { trim: true });

    frame.render_widget(footer, area);
}
