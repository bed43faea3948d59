//! Output formatting for subnet data.
//!
//! - [`csv`] - Quoted, column-aligned CSV rows for plans and live VPCs

mod csv;

pub use csv::{plan_print, plan_rows, vpc_print, SubnetPrintRow};
