//! # dnsvakt-engine
//!
//! The staged packet-processing pipeline: capture feeds a bounded packet
//! queue, parser workers turn frames into DNS response records, the
//! classifier batches and filters them against the authoritative store, and
//! the publisher delivers the remaining batches to the broker. The
//! [`Supervisor`] owns construction, the signal handler and thread lifetime.

pub mod error;
pub mod stages;
pub mod supervisor;

pub use error::{exit_code, EngineError};
pub use supervisor::Supervisor;
