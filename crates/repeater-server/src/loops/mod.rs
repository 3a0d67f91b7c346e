//! Background loops for housekeeping.

pub mod prune_loop;
