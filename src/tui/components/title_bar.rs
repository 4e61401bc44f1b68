// Title bar component
//
// Renders the table title, row counts and the persistence provider.

use crate::grid::lock_store;
use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the title bar at the top of the screen
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let (rows, editing) = {
        let store = lock_store(app.controller().store());
        (store.len(), store.editing_count())
    };

    let counts = if editing > 0 {
        format!("{} rows, {} editing", rows, editing)
    } else {
        format!("{} rows", rows)
    };

    let title = Paragraph::new(format!(" {} ──── {}", app.title, counts))
        .style(
            Style::default()
                .fg(app.theme.title)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.title))
                .title_top(
                    Line::from(format!(" {} ", app.controller().persistence_name()))
                        .right_aligned(),
                ),
        );

    f.render_widget(title, area);
}
