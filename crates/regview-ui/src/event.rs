//! Event handling for the TUI

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

/// Events that can occur in the TUI
#[derive(Debug, Clone)]
pub enum Event
{
    /// Keyboard input event
    Key(KeyEvent),
    /// Mouse press, drag, move or scroll
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows)
    Resize(u16, u16),
    /// Tick event (for periodic updates)
    Tick,
}

/// Event handler that reads from crossterm and produces TUI events
pub struct EventHandler
{
    receiver: mpsc::Receiver<Event>,
    should_stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl EventHandler
{
    /// Create a new event handler ticking every `tick_rate`
    ///
    /// This spawns a background task that reads crossterm events
    /// and sends them to the async receiver.
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self
    {
        let (sender, receiver) = mpsc::channel(100);
        let should_stop = Arc::new(AtomicBool::new(false));

        let should_stop_clone = should_stop.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let mut last_tick = Instant::now();
            loop {
                if should_stop_clone.load(Ordering::Relaxed) {
                    break;
                }

                let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);

                if event::poll(timeout).unwrap_or(false) {
                    let event = match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Resize(columns, rows)) => Some(Event::Resize(columns, rows)),
                        _ => None,
                    };
                    // If send fails (receiver dropped), break
                    if let Some(event) = event {
                        if sender.blocking_send(event).is_err() {
                            break;
                        }
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if sender.blocking_send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            receiver,
            should_stop,
            handle,
        }
    }

    /// Stop the event handler gracefully
    ///
    /// The background task exits on its next iteration, or as soon as it
    /// finds the channel closed.
    pub fn stop(&mut self)
    {
        self.should_stop.store(true, Ordering::Relaxed);
        self.receiver.close();
    }

    /// Check if the event handler task is still running
    #[must_use]
    pub fn is_running(&self) -> bool
    {
        !self.handle.is_finished()
    }

    /// Get the next event (async)
    pub async fn next(&mut self) -> Option<Event>
    {
        self.receiver.recv().await
    }
}

impl Drop for EventHandler
{
    fn drop(&mut self)
    {
        self.stop();
    }
}
