// gridedit - Editable data grid with save notifications
//
// Rows are toggled into edit mode one at a time, changed locally, then
// committed through a persistence provider. Failed saves leave the row in
// edit mode and raise a short-lived notification.
//
// Architecture:
// - grid: RowStore (records + edit state) and the column schema
// - notify: NotificationCenter (post, auto-expire, dismiss)
// - persistence: RowPersistence providers (simulated, local, http)
// - controller: RowController (commit orchestration)
// - config / dataset: table definition and initial records
// - tui (ratatui): renders the grid and the notification overlay

pub mod cli;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod grid;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod startup;
pub mod tui;
