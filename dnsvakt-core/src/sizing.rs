//! Memory-budget-driven sizing.
//!
//! A single byte budget is split across the capture driver's ring buffer and
//! the three stage queues. The driver ring dominates on purpose: most queue
//! cells sit empty under normal traffic and the ring is the only buffer that
//! absorbs kernel-side bursts. The publisher queue holds a handful of large
//! batches at a time, so its slot count is a fixed, generously oversized
//! constant.

use std::mem;

use crate::batch::DomainBatch;
use crate::dns_info::DnsResponseInfo;
use crate::packet::Packet;

/// Fixed slot count of the publisher queue.
pub const PUBLISHER_QUEUE_SLOTS: usize = 1000;

/// Derived capacities for one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingPlan {
    /// Bytes requested for the capture driver's ring buffer.
    pub driver_buffer_bytes: u64,
    pub packet_queue_capacity: usize,
    pub dns_info_queue_capacity: usize,
    pub publisher_queue_capacity: usize,
}

impl SizingPlan {
    /// Splits `budget_bytes` into the driver ring and queue capacities.
    ///
    /// All intermediate arithmetic is 64-bit unsigned; the driver request is
    /// saturated at the driver's `i32` buffer-size type. Derived capacities
    /// never fall below one slot.
    pub fn from_budget(budget_bytes: u64) -> Self {
        let driver_buffer_bytes = (budget_bytes.saturating_mul(65) / 100).min(i32::MAX as u64);

        let publisher_queue_bytes =
            (PUBLISHER_QUEUE_SLOTS * mem::size_of::<DomainBatch>()) as u64;

        let remaining =
            budget_bytes.saturating_sub(driver_buffer_bytes + publisher_queue_bytes);
        let packet_queue_bytes = remaining.saturating_mul(35) / 100;
        let dns_info_queue_bytes = remaining - packet_queue_bytes;

        Self {
            driver_buffer_bytes,
            packet_queue_capacity: slots(packet_queue_bytes, mem::size_of::<Packet>()),
            dns_info_queue_capacity: slots(
                dns_info_queue_bytes,
                mem::size_of::<DnsResponseInfo>(),
            ),
            publisher_queue_capacity: PUBLISHER_QUEUE_SLOTS,
        }
    }

    /// Driver ring request in the driver's native buffer-size type.
    pub fn driver_buffer_request(&self) -> i32 {
        self.driver_buffer_bytes.min(i32::MAX as u64) as i32
    }
}

fn slots(bytes: u64, slot_size: usize) -> usize {
    (bytes / slot_size as u64).max(1) as usize
}
