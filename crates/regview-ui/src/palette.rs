//! Colors and styles of the register view

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use regview_utils::{warn, ViewConfig};

/// Colors shared by every field of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette
{
    /// Foreground of registers changed since the last step
    pub changed: Color,
    /// Ambient foreground: the terminal's own default
    pub foreground: Color,
    /// Background of the selected field while the view has focus
    pub selection: Color,
    /// Background of the selected field without focus
    pub inactive_selection: Color,
    pub label: Color,
    pub category: Color,
}

impl Default for Palette
{
    fn default() -> Self
    {
        Self {
            changed: Color::Red,
            foreground: Color::Reset,
            selection: Color::Blue,
            inactive_selection: Color::DarkGray,
            label: Color::Gray,
            category: Color::Cyan,
        }
    }
}

impl Palette
{
    /// Palette with the configured "changed" color.
    ///
    /// An unknown color name is logged and replaced by red.
    #[must_use]
    pub fn from_config(config: &ViewConfig) -> Self
    {
        let changed = Color::from_str(&config.changed_color).unwrap_or_else(|_| {
            warn!("Unknown color '{}', using red for changed registers", config.changed_color);
            Color::Red
        });
        Self {
            changed,
            ..Self::default()
        }
    }

    /// Foreground for a field: the changed color or the ambient one.
    #[must_use]
    pub fn foreground_for(&self, changed: bool) -> Color
    {
        if changed {
            self.changed
        } else {
            self.foreground
        }
    }

    /// Full style of a value field.
    ///
    /// `foreground` is the color chosen at the last palette update. A selected
    /// field keeps it on the selection background, so a changed value stays
    /// visible while highlighted.
    #[must_use]
    pub fn field_style(&self, foreground: Color, selected: bool, hovered: bool, focused: bool) -> Style
    {
        let mut style = Style::default().fg(foreground);
        if selected {
            style = style.bg(if focused { self.selection } else { self.inactive_selection });
            if focused {
                style = style.add_modifier(Modifier::BOLD);
            }
        }
        if hovered {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_changed_color_from_config()
    {
        let config = ViewConfig {
            changed_color: "yellow".to_string(),
            ..ViewConfig::default()
        };
        assert_eq!(Palette::from_config(&config).changed, Color::Yellow);

        let config = ViewConfig {
            changed_color: "#00ff00".to_string(),
            ..ViewConfig::default()
        };
        assert_eq!(Palette::from_config(&config).changed, Color::Rgb(0, 255, 0));
    }

    #[test]
    fn test_unknown_color_falls_back_to_red()
    {
        let config = ViewConfig {
            changed_color: "ultraviolet".to_string(),
            ..ViewConfig::default()
        };
        assert_eq!(Palette::from_config(&config).changed, Color::Red);
    }

    #[test]
    fn test_field_style()
    {
        let palette = Palette::default();
        let fg = palette.foreground_for(true);
        assert_eq!(fg, Color::Red);

        let style = palette.field_style(fg, true, true, true);
        assert_eq!(style.fg, Some(Color::Red));
        assert_eq!(style.bg, Some(Color::Blue));
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));

        let style = palette.field_style(palette.foreground_for(false), true, false, false);
        assert_eq!(style.fg, Some(Color::Reset));
        assert_eq!(style.bg, Some(Color::DarkGray));
    }
}
