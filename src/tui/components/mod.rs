// Components module - UI building blocks
//
// - Title bar: table title, row counts, persistence provider
// - Grid table: the records
// - Status bar: key hints, newest warning
// - Toast: notification overlay

pub mod grid_table;
pub mod status_bar;
pub mod title_bar;
pub mod toast;
