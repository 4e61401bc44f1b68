//! Notification overlay
//!
//! Renders active notifications as a stack of boxes in the bottom-right
//! corner, on top of all other content. Oldest sits at the top, newest at
//! the bottom. Expiry is owned by the `NotificationCenter`; this component
//! only draws what it is given.

use crate::notify::Notification;
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Box height: 1 line of text + 2 for borders
const TOAST_HEIGHT: u16 = 3;

/// Widest a toast may grow, borders included
const MAX_TOAST_WIDTH: u16 = 60;

/// Render the notification stack in the bottom-right corner
///
/// Uses `Clear` so each toast is visible on top of the table.
pub fn render(f: &mut Frame, area: Rect, notifications: &[Notification], theme: &Theme) {
    for (slot, area) in toast_areas(area, notifications) {
        render_one(f, area, &notifications[slot], theme);
    }
}

/// Placement of each notification that fits, keyed by its index
///
/// Stacks upwards from the bottom edge; the newest is kept when space runs
/// out.
fn toast_areas(area: Rect, notifications: &[Notification]) -> Vec<(usize, Rect)> {
    let max_width = MAX_TOAST_WIDTH.min(area.width.saturating_sub(4));
    if max_width < 8 {
        return Vec::new();
    }

    let mut placed = Vec::new();
    let mut bottom = area.bottom().saturating_sub(2);

    for (slot, notification) in notifications.iter().enumerate().rev() {
        if bottom < area.top() + TOAST_HEIGHT {
            break;
        }
        // Add 4 for padding (1 char each side) and border
        let text_width = notification.message.width() + notification.severity.as_str().len() + 3;
        let width = u16::try_from(text_width)
            .unwrap_or(u16::MAX)
            .saturating_add(4)
            .min(max_width);

        let x = area.right().saturating_sub(width + 2);
        let y = bottom - TOAST_HEIGHT;
        placed.push((slot, Rect::new(x, y, width, TOAST_HEIGHT)));
        bottom = y;
    }

    placed.reverse();
    placed
}

fn render_one(f: &mut Frame, area: Rect, notification: &Notification, theme: &Theme) {
    let accent = theme.severity(notification.severity);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(accent))
        .title(Line::from(format!(" {} ", notification.severity)).left_aligned())
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(theme.background));

    let inner_width = area.width.saturating_sub(4) as usize;
    let text = Paragraph::new(truncate(&notification.message, inner_width))
        .alignment(Alignment::Left)
        .style(Style::default().fg(theme.foreground))
        .block(block);

    // Clear the area first so toast appears on top
    f.render_widget(Clear, area);
    f.render_widget(text, area);
}

/// Cut a string to a display width, marking the cut with an ellipsis
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return format!(" {}", s);
    }
    let mut out = String::from(" ");
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
