//! Terminal User Interface initialization and management

use std::io::{self, Stdout};
use std::panic;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use regview_utils::info;

use crate::app::App;
use crate::event::{Event, EventHandler};

/// Terminal User Interface for the register view
///
/// This struct manages the terminal state and runs the event loop of an
/// [`App`].
pub struct Tui
{
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui
{
    /// Create a new TUI instance
    ///
    /// This initializes the terminal in raw mode and alternate screen with
    /// mouse capture, and sets up panic handling to restore the terminal on
    /// panic.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization fails (raw mode, alternate screen, etc.)
    pub fn new() -> io::Result<Self>
    {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = Self::restore();
            original_hook(panic_info);
        }));

        Ok(Self { terminal })
    }

    /// Run the TUI event loop
    ///
    /// Draws `app` and feeds it input until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal drawing fails or terminal restoration fails
    pub async fn run(&mut self, mut app: App) -> io::Result<()>
    {
        info!("regview TUI started");

        let mut event_handler = EventHandler::new(app.config.tick_rate);

        while !app.should_quit {
            self.terminal.draw(|frame| crate::ui::draw(frame, &mut app))?;

            match event_handler.next().await {
                Some(Event::Key(key_event)) => {
                    if app.handle_key_event(key_event) {
                        break;
                    }
                }
                Some(Event::Mouse(mouse_event)) => app.handle_mouse_event(mouse_event),
                // The next draw picks up the new size
                Some(Event::Resize(..)) => {}
                Some(Event::Tick) => app.tick(),
                // Channel closed
                None => break,
            }
        }

        info!("regview TUI closing");

        Self::restore()?;
        event_handler.stop();

        Ok(())
    }

    /// Restore the terminal to its original state
    ///
    /// This should be called when exiting the TUI to ensure the terminal
    /// is left in a usable state.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal restoration fails (disabling raw mode, leaving alternate screen, etc.)
    pub fn restore() -> io::Result<()>
    {
        disable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }
}

impl Drop for Tui
{
    fn drop(&mut self)
    {
        let _ = Self::restore();
    }
}
