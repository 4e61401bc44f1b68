// TUI application state
//
// The App holds handles to the row store, notification center and
// controller, plus cursor and text-input state. Every user action is a
// method here so key handling stays a thin dispatch layer.

use super::theme::Theme;
use crate::controller::{CommitOutcome, RowController};
use crate::grid::{lock_store, FieldKind, FieldValue, RowId, TableSchema};
use crate::logging::LogBuffer;
use crate::notify::{Notification, NotificationCenter};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Text being typed into a cell; applied on Enter, dropped on Esc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub row: RowId,
    pub field: String,
    pub buffer: String,
}

/// Main application state for the TUI
pub struct App {
    /// Title shown in the title bar
    pub title: String,

    /// Column definitions
    pub schema: TableSchema,

    controller: RowController,

    /// Index of the selected row (load order)
    pub selected_row: usize,

    /// Index of the selected column (schema order)
    pub selected_col: usize,

    /// Active text input, if any
    pub input: Option<TextInput>,

    /// Rows with a commit in flight
    saving: Arc<Mutex<HashSet<RowId>>>,

    /// Most notifications drawn at once
    pub max_visible: usize,

    /// Log buffer for the status bar
    pub log_buffer: LogBuffer,

    pub theme: Theme,

    /// Whether the app should quit
    pub should_quit: bool,
}

impl App {
    pub fn new(
        title: impl Into<String>,
        schema: TableSchema,
        controller: RowController,
        log_buffer: LogBuffer,
        max_visible: usize,
    ) -> Self {
        Self {
            title: title.into(),
            schema,
            controller,
            selected_row: 0,
            selected_col: 0,
            input: None,
            saving: Arc::new(Mutex::new(HashSet::new())),
            max_visible: max_visible.max(1),
            log_buffer,
            theme: Theme::default(),
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &RowController {
        &self.controller
    }

    pub fn notifications(&self) -> &NotificationCenter {
        self.controller.notifications()
    }

    /// Notifications to draw: oldest first, newest `max_visible` kept
    pub fn visible_notifications(&self) -> Vec<Notification> {
        let mut active = self.notifications().active();
        let skip = active.len().saturating_sub(self.max_visible);
        active.drain(..skip);
        active
    }

    pub fn row_count(&self) -> usize {
        lock_store(self.controller.store()).len()
    }

    /// Id of the row under the cursor
    pub fn selected_id(&self) -> Option<RowId> {
        lock_store(self.controller.store())
            .records()
            .get(self.selected_row)
            .map(|r| r.id())
    }

    pub fn is_saving(&self, id: RowId) -> bool {
        self.saving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn move_row(&mut self, delta: isize) {
        let count = self.row_count();
        if count == 0 {
            self.selected_row = 0;
            return;
        }
        self.selected_row = self
            .selected_row
            .saturating_add_signed(delta)
            .min(count - 1);
    }

    /// Wraps around at either end
    pub fn move_col(&mut self, delta: isize) {
        let count = self.schema.len();
        if count == 0 {
            return;
        }
        let count = count as isize;
        self.selected_col = (self.selected_col as isize + delta).rem_euclid(count) as usize;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edit state
    // ─────────────────────────────────────────────────────────────────────────

    /// Toggle edit mode on the selected row (leaving edit mode cancels)
    pub fn toggle_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        self.input = None;
        match lock_store(self.controller.store()).toggle_edit(id) {
            Some(true) => tracing::debug!("Row {} editing", id),
            Some(false) => tracing::debug!("Row {} edit cancelled", id),
            None => {}
        }
    }

    /// Esc: abort text input first, otherwise cancel the row's edit
    pub fn escape(&mut self) {
        if self.input.take().is_some() {
            return;
        }
        if let Some(id) = self.selected_id() {
            if lock_store(self.controller.store()).cancel_edit(id) {
                tracing::debug!("Row {} edit cancelled", id);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cell input
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter: start or apply text input; checkbox and select cells advance
    pub fn enter(&mut self) {
        if self.input.is_some() {
            self.apply_input();
            return;
        }
        match self.schema.column(self.selected_col).map(|c| c.kind) {
            Some(FieldKind::Text) => self.begin_input(),
            Some(_) => self.activate_cell(),
            None => {}
        }
    }

    /// Space: toggle a checkbox or cycle a select
    pub fn activate_cell(&mut self) {
        let Some(spec) = self.schema.column(self.selected_col) else {
            return;
        };
        let Some(id) = self.selected_id() else {
            return;
        };

        let mut store = lock_store(self.controller.store());
        let Some(record) = store.get(id) else {
            return;
        };
        if !record.is_editing() || spec.is_degraded() {
            return;
        }

        let current = record.get(&spec.field);
        let next = match spec.kind {
            FieldKind::Checkbox => spec.toggled(current),
            FieldKind::Select => spec.next_choice(current),
            FieldKind::Text => None,
        };
        if let Some(value) = next {
            store.set_field(id, &spec.field, value);
        }
    }

    fn begin_input(&mut self) {
        let Some(spec) = self.schema.column(self.selected_col) else {
            return;
        };
        let Some(id) = self.selected_id() else {
            return;
        };

        let store = lock_store(self.controller.store());
        let Some(record) = store.get(id) else {
            return;
        };
        if !record.is_editing() || spec.kind != FieldKind::Text || spec.is_degraded() {
            return;
        }

        self.input = Some(TextInput {
            row: id,
            field: spec.field.clone(),
            buffer: record.get(&spec.field).map(|v| v.to_string()).unwrap_or_default(),
        });
    }

    /// Write the input buffer into the row
    ///
    /// A field that held a number keeps being a number while the text parses
    /// as one.
    pub fn apply_input(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };

        let mut store = lock_store(self.controller.store());
        let was_number = matches!(
            store.get(input.row).and_then(|r| r.get(&input.field)),
            Some(FieldValue::Number(_))
        );
        let value = if was_number {
            match serde_json::from_str::<serde_json::Number>(input.buffer.trim()) {
                Ok(n) => FieldValue::Number(n),
                Err(_) => FieldValue::Text(input.buffer),
            }
        } else {
            FieldValue::Text(input.buffer)
        };

        if !store.set_field(input.row, &input.field, value) {
            tracing::debug!("Row {} vanished before input was applied", input.row);
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(input) = self.input.as_mut() {
            input.buffer.push(c);
        }
    }

    pub fn input_backspace(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.buffer.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit the selected row in a background task
    ///
    /// Other rows stay editable while the provider works. A second commit of
    /// a row that is already saving is ignored.
    pub fn commit_selected(&mut self) -> Option<JoinHandle<()>> {
        self.apply_input();
        let id = self.selected_id()?;

        {
            let mut saving = self.saving.lock().unwrap_or_else(PoisonError::into_inner);
            if !saving.insert(id) {
                tracing::debug!("Row {} already saving", id);
                return None;
            }
        }

        let controller = self.controller.clone();
        let saving = self.saving.clone();
        Some(tokio::spawn(async move {
            match controller.commit(id).await {
                Ok(CommitOutcome::Failed { error, .. }) => {
                    tracing::warn!("Row {} not saved: {}", id, error);
                }
                Ok(CommitOutcome::Superseded) => {
                    tracing::info!("Row {} changed while saving; still editing", id);
                }
                Ok(CommitOutcome::NotEditing) => {
                    tracing::debug!("Row {} is not in edit mode", id);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Commit skipped: {}", e),
            }
            saving
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────

    pub fn dismiss_oldest(&mut self) {
        self.notifications().dismiss_oldest();
    }

    /// Periodic housekeeping
    pub fn tick(&mut self) {
        self.notifications()
            .prune_expired(tokio::time::Instant::now());

        // Keep the cursor on a row after a reload shrank the table
        let count = self.row_count();
        if self.selected_row >= count {
            self.selected_row = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_columns;
    use crate::dataset::sample_records;
    use crate::grid::RowStore;
    use crate::notify::Severity;
    use crate::persistence::{AcceptAll, RowPersistence, SimulatedFailure};
    use std::time::Duration;

    fn app_with(persistence: Arc<dyn RowPersistence>) -> App {
        let mut store = RowStore::new();
        store.load(sample_records());
        let controller = RowController::new(
            store.shared(),
            NotificationCenter::new(Duration::from_secs(5)),
            persistence,
        );
        App::new(
            "Records",
            TableSchema::new(default_columns()),
            controller,
            LogBuffer::new(),
            5,
        )
    }

    fn field(app: &App, id: u64, name: &str) -> Option<FieldValue> {
        lock_store(app.controller().store())
            .get(RowId(id))
            .and_then(|r| r.get(name).cloned())
    }

    fn editing(app: &App, id: u64) -> bool {
        lock_store(app.controller().store())
            .get(RowId(id))
            .map(|r| r.is_editing())
            .unwrap_or(false)
    }

    #[test]
    fn test_navigation_clamps_rows_and_wraps_columns() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.move_row(-1);
        assert_eq!(app.selected_row, 0);
        app.move_row(10);
        assert_eq!(app.selected_row, 1);

        app.move_col(-1);
        assert_eq!(app.selected_col, 3);
        app.move_col(1);
        assert_eq!(app.selected_col, 0);
    }

    #[test]
    fn test_text_input_requires_edit_mode() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.enter();
        assert!(app.input.is_none());

        app.toggle_edit();
        app.enter();
        assert_eq!(
            app.input.as_ref().map(|i| i.buffer.as_str()),
            Some("John Doe")
        );

        for _ in 0.."Doe".len() {
            app.input_backspace();
        }
        for c in "Roe".chars() {
            app.input_char(c);
        }
        app.enter();

        assert!(app.input.is_none());
        assert_eq!(field(&app, 1, "name"), Some(FieldValue::text("John Roe")));
    }

    #[test]
    fn test_numbers_stay_numbers() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.toggle_edit();
        app.move_col(1);

        app.enter();
        app.input_backspace();
        app.input_char('9');
        app.apply_input();
        assert_eq!(field(&app, 1, "age"), Some(FieldValue::Number(29.into())));

        app.enter();
        app.input_char('x');
        app.apply_input();
        assert_eq!(field(&app, 1, "age"), Some(FieldValue::text("29x")));
    }

    #[test]
    fn test_escape_aborts_input_then_cancels_edit() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.toggle_edit();
        app.move_col(3);
        app.activate_cell();
        assert_eq!(field(&app, 1, "active"), Some(FieldValue::Bool(false)));

        app.move_col(-3);
        app.enter();
        app.input_char('!');
        app.escape();
        assert!(app.input.is_none());
        assert!(editing(&app, 1));
        assert_eq!(field(&app, 1, "name"), Some(FieldValue::text("John Doe")));

        app.escape();
        assert!(!editing(&app, 1));
        assert_eq!(field(&app, 1, "active"), Some(FieldValue::Bool(true)));
    }

    #[test]
    fn test_select_cycles_only_while_editing() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.move_col(2);
        app.activate_cell();
        assert_eq!(field(&app, 1, "city"), Some(FieldValue::text("New York")));

        app.toggle_edit();
        app.activate_cell();
        assert_eq!(field(&app, 1, "city"), Some(FieldValue::text("Los Angeles")));
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_row_editing() {
        let mut app = app_with(Arc::new(SimulatedFailure));
        app.toggle_edit();

        let handle = app.commit_selected().unwrap();
        handle.await.unwrap();

        assert!(editing(&app, 1));
        assert!(!app.is_saving(RowId(1)));
        let visible = app.visible_notifications();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].severity, Severity::Danger);
        assert!(visible[0].message.contains("Failed to save row 1"));

        app.dismiss_oldest();
        assert!(app.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_commit_success_applies_pending_input() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.toggle_edit();
        app.enter();
        app.input_char('!');

        let handle = app.commit_selected().unwrap();
        handle.await.unwrap();

        assert!(!editing(&app, 1));
        assert_eq!(field(&app, 1, "name"), Some(FieldValue::text("John Doe!")));
        assert!(app.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_visible_notifications_keep_newest() {
        let mut app = app_with(Arc::new(AcceptAll));
        app.max_visible = 2;
        for i in 0..4 {
            app.notifications().post(format!("n{}", i), Severity::Info);
        }
        let messages: Vec<_> = app
            .visible_notifications()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["n2", "n3"]);
    }
}
