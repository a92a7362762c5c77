//! Row structs and DTOs for the sync engine's tables.

pub mod call_log;
pub mod monitored_entity;
pub mod movement;
pub mod process;
