//! # dnsvakt-protocols
//!
//! Bounded decoders for the capture path: Ethernet/IPv4/IPv6/UDP
//! decapsulation down to the DNS payload, and a DNS message view exposing the
//! header bits and the questions section. Every read is bounds-checked; a
//! malformed frame is a rejected frame, never a panic.

pub mod dns;
pub mod frame;

pub use dns::{DnsMessage, DnsParseError};
pub use frame::udp_payload;
