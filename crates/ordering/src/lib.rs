//! Order placement orchestration and stock reconciliation.
//!
//! The orchestrator admits orders against the stock counter store on the
//! fast path and defers the authoritative update to the reconciler,
//! which drains the event channel as a single serialized worker. Between
//! the two, the counter decides whether an order may proceed right now;
//! the relational store catches up with a bounded lag.

mod error;
mod orchestrator;
mod reconciler;

pub use error::{OrderingError, Result};
pub use orchestrator::OrderingService;
pub use reconciler::Reconciler;
