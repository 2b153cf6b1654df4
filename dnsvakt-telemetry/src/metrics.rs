//! Pipeline stage counters.

use prometheus::{IntCounter, Registry};

/// Counters shared across the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub registry: Registry,
    pub packets_captured: IntCounter,
    pub packets_dropped: IntCounter,
    pub parse_rejected: IntCounter,
    pub records_parsed: IntCounter,
    pub batches_published: IntCounter,
    pub publish_failures: IntCounter,
    pub blacklist_hits: IntCounter,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let packets_captured = counter(
            &registry,
            "dnsvakt_packets_captured_total",
            "Frames accepted from the capture driver",
        );
        let packets_dropped = counter(
            &registry,
            "dnsvakt_packets_dropped_total",
            "Frames dropped because the packet queue was full",
        );
        let parse_rejected = counter(
            &registry,
            "dnsvakt_parse_rejected_total",
            "Frames that did not decode to a DNS response",
        );
        let records_parsed = counter(
            &registry,
            "dnsvakt_records_parsed_total",
            "DNS response records handed to the classifier",
        );
        let batches_published = counter(
            &registry,
            "dnsvakt_batches_published_total",
            "Domain batches delivered to the broker",
        );
        let publish_failures = counter(
            &registry,
            "dnsvakt_publish_failures_total",
            "Batches dropped after exhausted publish retries",
        );
        let blacklist_hits = counter(
            &registry,
            "dnsvakt_blacklist_hits_total",
            "Domains found on the blacklist during flush",
        );

        Self {
            registry,
            packets_captured,
            packets_dropped,
            parse_rejected,
            records_parsed,
            batches_published,
            publish_failures,
            blacklist_hits,
        }
    }

    /// Renders the registry in the prometheus text format.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("valid counter options");
    registry
        .register(Box::new(counter.clone()))
        .expect("unique counter registration");
    counter
}
