pub mod call_logs;
pub mod entities;
pub mod movements;
pub mod sync;
pub mod tracking;
pub mod webhooks;
