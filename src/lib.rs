//! Client for the Trino statement protocol plus the readiness checks used to
//! smoke-test a freshly started cluster.
//!
//! A [`QuerySession`] submits one statement at a time and follows the
//! server's `nextUri` links to collect the full result set. A
//! [`ReadinessPoller`] retries a [`Probe`] on a fixed interval within a total
//! budget, and [`SmokeTestService`] strings the node, catalog and reference
//! query checks together.

pub mod api;
pub mod client;
pub mod clock;
pub mod config;
pub mod models;
pub mod poller;
pub mod readiness;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::StatementTransport;
pub use client::TrinoHttpClient;
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{ClientConfig, ReadinessConfig};
pub use models::{MissingField, QueryResults, ResultPage, Row, TrinoError};
pub use poller::{probe_fn, Attempt, Probe, ReadinessPoller};
pub use service::{SmokeReport, SmokeTestService};
pub use session::{QuerySession, SessionState};
