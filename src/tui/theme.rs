// Theme for the TUI
//
// One palette for every UI element, so render code never names raw colors.

use crate::notify::Severity;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

/// Complete theme definition with all UI colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub border_type: BorderType,
    pub title: Color,
    pub highlight: Color,
    pub muted: Color,
    pub status_bar: Color,

    // Table
    pub header: Color,
    pub selection: Color,
    pub selection_fg: Color,
    /// Background of rows in edit mode
    pub editing_row: Color,
    /// Cell receiving text input
    pub input_cell: Color,

    // Notification severities
    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Gray,
            border: Color::DarkGray,
            border_type: BorderType::Rounded,
            title: Color::Cyan,
            highlight: Color::Cyan,
            muted: Color::DarkGray,
            status_bar: Color::Gray,
            header: Color::Yellow,
            selection: Color::Rgb(45, 55, 72),
            selection_fg: Color::White,
            editing_row: Color::Rgb(30, 40, 30),
            input_cell: Color::Rgb(60, 60, 20),
            info: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }

    /// Accent color for a notification severity
    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Info => self.info,
            Severity::Success => self.success,
            Severity::Warning => self.warning,
            Severity::Danger => self.danger,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for a disabled cell (read-only row or degraded column)
    pub fn disabled_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}
