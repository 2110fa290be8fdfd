//! # regview-ui
//!
//! Terminal register view for regview.
//!
//! This crate turns a [`RegisterModel`](regview_core::RegisterModel) into a
//! grid of value fields, built on top of `ratatui`. Fields show register
//! text (highlighted when changed since the last step), react to hover,
//! selection and double clicks, offer a context menu of value mutations,
//! and open edit popups for new values.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use regview_core::model::x86_64;
//! use regview_ui::run_tui;
//! use regview_utils::ViewConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! run_tui(x86_64::sample(), ViewConfig::from_env()?).await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod app;
pub mod editor;
pub mod event;
pub mod field;
pub mod group;
pub mod navigation;
pub mod palette;
pub mod tui;
pub mod ui;
pub mod widgets;

pub use app::App;
pub use field::{FieldId, Outcome, ValueField};
pub use group::{FieldGroup, RegisterView};
pub use tui::Tui;

/// Run the TUI over a register model
///
/// This is a convenience function that creates a TUI and runs an [`App`] on
/// `model` with the given view settings.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up, drawn or restored.
pub async fn run_tui(model: regview_core::InMemoryModel, config: regview_utils::ViewConfig) -> std::io::Result<()>
{
    let mut tui = Tui::new()?;
    tui.run(App::new(model, config)).await
}
