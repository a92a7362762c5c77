//! Client for the upstream legal-data provider.
//!
//! The provider's API is asynchronous (submit-then-poll): a search is
//! posted to `/requests`, producing a job id, and results are collected
//! either from the job-status endpoint or from the paginated `/responses`
//! endpoint. Standing monitors ("tracking subscriptions") are resolved
//! through `/tracking/{id}`.
//!
//! Everything network-facing goes through the [`transport::ProviderTransport`]
//! trait so the submit/poll/resolve logic is testable against in-memory
//! stubs. Every round trip is captured by a [`log::CallRecorder`] for the
//! audit trail.

pub mod config;
pub mod error;
pub mod log;
pub mod poll;
pub mod search;
pub mod submit;
pub mod tracking;
pub mod transport;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use log::{CallKind, CallRecord, CallRecorder};
pub use poll::{PollBudget, PollMode, PollOutcome};
pub use search::SearchType;
pub use submit::{SubmitConfig, SubmitOutcome};
pub use tracking::{TrackingPoll, TrackingResolution};
pub use transport::{HttpTransport, ProviderTransport};
