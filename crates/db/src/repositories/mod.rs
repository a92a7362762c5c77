//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod call_log_repo;
pub mod monitored_entity_repo;
pub mod movement_repo;
pub mod process_repo;

pub use call_log_repo::CallLogRepo;
pub use monitored_entity_repo::MonitoredEntityRepo;
pub use movement_repo::MovementRepo;
pub use process_repo::ProcessRepo;
