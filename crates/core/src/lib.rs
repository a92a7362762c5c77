//! Domain logic for the legal-process synchronization engine.
//!
//! This crate is pure: no I/O, no database, no HTTP. It holds the
//! canonical projections produced from raw provider payloads
//! ([`normalize`]), the tracking-subscription state machine
//! ([`tracking`]), and the shared error taxonomy ([`error`]).

pub mod error;
pub mod normalize;
pub mod tracking;
pub mod types;

pub use error::CoreError;
pub use types::{DbId, Timestamp};
