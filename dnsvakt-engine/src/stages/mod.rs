//! The four pipeline stages.
//!
//! Each stage is a plain struct with a `run` method executed on its own OS
//! thread. Stages share nothing but the bounded queues, the cancellation
//! flag and the metrics handles.

pub mod capture;
pub mod classifier;
pub mod parser;
pub mod publisher;

use std::time::Duration;

/// Back-off used by every stage when its input queue is empty. Also bounds
/// how long a raised cancellation flag goes unobserved on an idle stage.
pub(crate) const IDLE_SLEEP: Duration = Duration::from_millis(100);

pub use capture::CaptureStage;
pub use classifier::ClassifierStage;
pub use parser::ParserStage;
pub use publisher::PublisherStage;
