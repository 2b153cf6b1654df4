//! Publisher stage: serializes batches and delivers them to the broker.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::error;

use dnsvakt_broker::MessagePublisher;
use dnsvakt_core::batch::DomainBatch;
use dnsvakt_core::queue::BoundedQueue;
use dnsvakt_core::retry::with_retries;
use dnsvakt_core::shutdown::ShutdownFlag;
use dnsvakt_telemetry::PipelineMetrics;

use super::IDLE_SLEEP;

const PUBLISH_RETRY_ATTEMPTS: u32 = 5;
const PUBLISH_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct PublisherStage<P> {
    batches: Arc<BoundedQueue<DomainBatch>>,
    sink: P,
    shutdown: ShutdownFlag,
    metrics: PipelineMetrics,
}

impl<P: MessagePublisher> PublisherStage<P> {
    pub fn new(
        batches: Arc<BoundedQueue<DomainBatch>>,
        sink: P,
        shutdown: ShutdownFlag,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            batches,
            sink,
            shutdown,
            metrics,
        }
    }

    pub fn run(mut self) {
        while !self.shutdown.is_requested() {
            match self.batches.try_pop() {
                Some(batch) => self.publish(batch),
                None => thread::sleep(IDLE_SLEEP),
            }
        }
    }

    fn publish(&mut self, batch: DomainBatch) {
        // Batches fully stripped by the classifier carry nothing.
        if batch.is_empty() {
            return;
        }

        let body = match to_wire_json(&batch) {
            Ok(body) => body,
            Err(error) => {
                error!("failed to serialize batch of {} domains: {error}", batch.len());
                return;
            }
        };

        match with_retries(
            "publish",
            PUBLISH_RETRY_ATTEMPTS,
            PUBLISH_RETRY_DELAY,
            || self.sink.publish(body.as_bytes()),
        ) {
            Ok(()) => self.metrics.batches_published.inc(),
            // Dropping the batch keeps the pipeline healthy; blocking here
            // would backpressure all the way into capture loss.
            Err(error) => {
                self.metrics.publish_failures.inc();
                error!(
                    "dropping batch of {} domains after exhausted publish retries: {error}",
                    batch.len()
                );
            }
        }
    }
}

/// Serializes the wire message, pretty-printed with a 4-space indent for
/// operational readability.
fn to_wire_json(batch: &DomainBatch) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    batch.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
