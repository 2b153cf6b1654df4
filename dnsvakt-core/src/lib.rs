//! # dnsvakt-core
//!
//! Foundation layer for the dnsvakt pipeline: the data model moved between
//! stages, the bounded MPMC queue fabric connecting them, memory-budget
//! driven sizing, the process-wide cancellation flag, and the bounded retry
//! helper shared by the IO-facing stages.

pub mod batch;
pub mod dns_info;
pub mod packet;
pub mod queue;
pub mod retry;
pub mod shutdown;
pub mod sizing;

pub mod prelude {
    pub use crate::batch::DomainBatch;
    pub use crate::dns_info::DnsResponseInfo;
    pub use crate::packet::{CaptureHeader, Packet};
    pub use crate::queue::BoundedQueue;
    pub use crate::shutdown::ShutdownFlag;
    pub use crate::sizing::SizingPlan;
}
