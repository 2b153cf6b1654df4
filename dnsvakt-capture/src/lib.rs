//! # dnsvakt-capture
//!
//! Live packet acquisition using libpcap (via the pcap crate). Opens the
//! configured interface in promiscuous mode with a 1 ms poll timeout and
//! immediate mode, installs the `port 53` filter, and feeds the capture loop
//! until the cancellation flag is raised.

pub mod live;

pub use live::{CaptureError, CaptureHandle, CaptureStats};
