// Status bar component
//
// Renders key hints for the current mode and the newest warning or error
// from the log buffer.

use crate::logging::LogLevel;
use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Below this width only the hints are shown
const NARROW_WIDTH: u16 = 80;

/// Key hints for the current input mode
pub fn hints(app: &App) -> &'static str {
    if app.input.is_some() {
        " Enter apply │ Esc discard"
    } else {
        " ↑↓ row │ ←→ col │ e edit │ Enter/Space change │ s save │ Esc cancel │ x dismiss │ q quit"
    }
}

/// Render the status bar
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        hints(app),
        Style::default().fg(app.theme.status_bar),
    )];

    if area.width >= NARROW_WIDTH {
        if let Some(entry) = app.log_buffer.latest_at_least(LogLevel::Warn) {
            let color = match entry.level {
                LogLevel::Error => app.theme.danger,
                _ => app.theme.warning,
            };
            spans.push(Span::styled(
                format!(
                    " │ {} {} {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.level.as_str(),
                    entry.message
                ),
                Style::default().fg(color),
            ));
        }
    }

    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(app.theme.border)),
    );

    f.render_widget(status, area);
}
