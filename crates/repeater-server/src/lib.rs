//! Repeater Finder server: background route searches over HTTP.

pub mod api;
pub mod config;
pub mod loops;
pub mod state;
pub mod tasks;
