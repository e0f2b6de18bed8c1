//! Display helpers shared by CLI command output.

pub mod table;

pub use table::{list_table, render_list, status_cell};
