//! Parser stage: drains captured frames and emits DNS response records.
//!
//! Any number of identical workers may run concurrently. Record order on the
//! output queue is per-worker FIFO only; the classifier's last-writer-wins
//! dedup makes cross-worker reordering harmless.

use std::sync::Arc;
use std::thread;

use dnsvakt_core::dns_info::DnsResponseInfo;
use dnsvakt_core::packet::Packet;
use dnsvakt_core::queue::BoundedQueue;
use dnsvakt_core::shutdown::ShutdownFlag;
use dnsvakt_protocols::{udp_payload, DnsMessage};
use dnsvakt_telemetry::PipelineMetrics;

use super::IDLE_SLEEP;

pub struct ParserStage {
    packets: Arc<BoundedQueue<Packet>>,
    records: Arc<BoundedQueue<DnsResponseInfo>>,
    shutdown: ShutdownFlag,
    metrics: PipelineMetrics,
}

impl ParserStage {
    pub fn new(
        packets: Arc<BoundedQueue<Packet>>,
        records: Arc<BoundedQueue<DnsResponseInfo>>,
        shutdown: ShutdownFlag,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            packets,
            records,
            shutdown,
            metrics,
        }
    }

    pub fn run(self) {
        while !self.shutdown.is_requested() {
            match self.packets.try_pop() {
                Some(packet) => self.process(packet),
                None => thread::sleep(IDLE_SLEEP),
            }
        }
    }

    fn process(&self, packet: Packet) {
        let Some(record) = parse_response(packet.payload()) else {
            self.metrics.parse_rejected.inc();
            return;
        };

        // A response with zero questions carries nothing for the classifier.
        if record.domains.is_empty() {
            return;
        }

        // Blocking push: the consumer side backpressures the parsers instead
        // of dropping; loss is only ever taken at capture.
        if self
            .records
            .push_until(record, || self.shutdown.is_requested())
            .is_ok()
        {
            self.metrics.records_parsed.inc();
        }
    }
}

/// Decodes one captured frame into a parser record. Queries (QR = 0) and
/// frames failing any decoding step yield `None`.
pub fn parse_response(frame: &[u8]) -> Option<DnsResponseInfo> {
    let payload = udp_payload(frame)?;
    let message = DnsMessage::parse(payload).ok()?;
    if !message.is_response() {
        return None;
    }
    let domains = message.question_names().ok()?;
    Some(DnsResponseInfo::new(domains, message.response_code()))
}
