//! CLI command implementations

pub mod clear_all;
pub mod database;
pub mod list;
pub mod new;
