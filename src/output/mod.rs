//! Output formatting for deployment plans.
//!
//! This module handles rendering plans:
//! - [`csv`] - CSV subnet layout
//! - [`terminal`] - Terminal summary with colors
//! - [`json`] - JSON export and plan files

mod csv;
mod json;
mod terminal;

pub use csv::{subnet_print, subnet_rows, SubnetCsvRow};
pub use json::{plan_file_name, to_json, write_plan_file};
pub use terminal::{format_field, render_table};
