use crate::config::Config;
use ratatui::style::{Color, Modifier, Style};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct UiPalette {
    pub base_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub border: Color,
    pub error: Color,
}

impl UiPalette {
    pub fn from_config(config: &Config) -> Self {
        let accent = match Color::from_str(&config.accent) {
            Ok(color) => color,
            Err(_) => {
                warn!(accent = %config.accent, "unknown accent colour, using cyan");
                Color::Cyan
            }
        };
        Self {
            base_fg: Color::Reset,
            accent,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            error: Color::Red,
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.base_fg)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .bg(self.accent)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    /// Border for the pane that has focus.
    pub fn border_for(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.border)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UiPalette;
    use crate::config::Config;
    use ratatui::style::Color;

    #[test]
    fn named_and_hex_accents_parse() {
        let mut cfg = Config::default();
        cfg.accent = "magenta".to_string();
        assert_eq!(UiPalette::from_config(&cfg).accent, Color::Magenta);
        cfg.accent = "#102030".to_string();
        assert_eq!(UiPalette::from_config(&cfg).accent, Color::Rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn unknown_accent_falls_back_to_cyan() {
        let mut cfg = Config::default();
        cfg.accent = "not-a-colour".to_string();
        assert_eq!(UiPalette::from_config(&cfg).accent, Color::Cyan);
    }
}
