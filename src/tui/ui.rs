// UI rendering - screen layout
//
// Title bar on top, the grid in the middle, status bar at the bottom. The
// notification overlay is drawn last, over everything.

use super::app::App;
use super::components::{grid_table, status_bar, title_bar, toast};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

/// Draw one frame
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Grid
            Constraint::Length(2), // Status
        ])
        .split(f.area());

    title_bar::render(f, chunks[0], app);
    grid_table::render(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    toast::render(f, f.area(), &app.visible_notifications(), &app.theme);
}
