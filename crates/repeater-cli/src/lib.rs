//! Repeater Finder CLI - run one route search from the command line.

pub mod report;

pub use report::{render_report, render_table};
