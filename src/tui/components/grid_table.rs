// Grid table component
//
// Renders every record as a table row through `TableSchema::cells`. Cells of
// read-only rows and degraded columns are drawn disabled; the cell under the
// cursor is highlighted and shows the text input when one is active.

use crate::grid::{lock_store, CellView, FieldKind, Record};
use crate::tui::app::App;
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

/// Width of the leading row-state column
const MARKER_WIDTH: u16 = 4;

/// Row-state marker: saving, editing with changes, editing, or nothing
fn marker(record: &Record, saving: bool) -> &'static str {
    if saving {
        " ⟳"
    } else if record.has_unsaved_changes() {
        " ✎*"
    } else if record.is_editing() {
        " ✎"
    } else {
        ""
    }
}

fn column_width(kind: FieldKind) -> Constraint {
    match kind {
        FieldKind::Checkbox => Constraint::Length(8),
        FieldKind::Select => Constraint::Min(14),
        FieldKind::Text => Constraint::Min(10),
    }
}

fn cell_style(cell: &CellView<'_>, selected: bool, theme: &Theme) -> Style {
    let base = if cell.editable {
        Style::default().fg(theme.foreground)
    } else {
        theme.disabled_style()
    };
    if selected {
        base.bg(theme.selection)
            .fg(theme.selection_fg)
            .add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

/// Render the data grid
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let store = lock_store(app.controller().store());

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(
                app.schema
                    .fields()
                    .iter()
                    .map(|spec| Cell::from(spec.display_name.as_str())),
            )
            .collect::<Vec<_>>(),
    )
    .style(theme.header_style());

    let rows: Vec<Row> = store
        .records()
        .iter()
        .enumerate()
        .map(|(row_idx, record)| {
            let is_cursor_row = row_idx == app.selected_row;
            let mut cells = vec![Cell::from(marker(record, app.is_saving(record.id())))];

            for (col_idx, cell) in app.schema.cells(record).iter().enumerate() {
                let selected = is_cursor_row && col_idx == app.selected_col;
                let text = match &app.input {
                    Some(input)
                        if selected && input.row == record.id() && input.field == cell.spec.field =>
                    {
                        format!("{}▏", input.buffer)
                    }
                    _ => cell.display(),
                };
                cells.push(Cell::from(text).style(cell_style(cell, selected, theme)));
            }

            let row = Row::new(cells);
            if record.is_editing() {
                row.style(Style::default().bg(theme.editing_row))
            } else {
                row
            }
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(MARKER_WIDTH))
        .chain(app.schema.fields().iter().map(|spec| column_width(spec.kind)))
        .collect();

    let empty = store.is_empty();
    drop(store);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));
    if empty {
        block = block.title_bottom(Line::from(" no records ").centered());
    }

    let table = Table::new(rows, widths).header(header).block(block);

    let mut state = TableState::default().with_selected(Some(app.selected_row));
    f.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{FieldValue, RowId, RowStore};

    #[test]
    fn test_marker() {
        let mut store = RowStore::new();
        store.load(vec![serde_json::json!({"name": "a"})
            .as_object()
            .cloned()
            .unwrap()]);
        let id = RowId(0);
        assert_eq!(marker(store.get(id).unwrap(), false), "");

        store.toggle_edit(id);
        assert_eq!(marker(store.get(id).unwrap(), false), " ✎");

        store.set_field(id, "name", FieldValue::text("b"));
        assert_eq!(marker(store.get(id).unwrap(), false), " ✎*");
        assert_eq!(marker(store.get(id).unwrap(), true), " ⟳");
    }
}
