//! Classifier stage: batching, dedup and store filtering.
//!
//! Accumulates domain → response-code pairs until a flush trigger fires,
//! strips everything the store already classifies, and hands the remainder
//! to the publisher queue. The same domain observed twice within a batch
//! window keeps only the most recent response code.

use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, warn};

use dnsvakt_core::batch::DomainBatch;
use dnsvakt_core::dns_info::DnsResponseInfo;
use dnsvakt_core::queue::BoundedQueue;
use dnsvakt_core::retry::with_retries;
use dnsvakt_core::shutdown::ShutdownFlag;
use dnsvakt_storage::{ClassificationStore, StoreError};
use dnsvakt_telemetry::PipelineMetrics;

use super::IDLE_SLEEP;

const STORE_RETRY_ATTEMPTS: u32 = 3;
const STORE_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct ClassifierStage<S> {
    records: Arc<BoundedQueue<DnsResponseInfo>>,
    batches: Arc<BoundedQueue<DomainBatch>>,
    store: S,
    shutdown: ShutdownFlag,
    metrics: PipelineMetrics,
    max_batch_size: u64,
    max_cycle_count: u64,
}

impl<S: ClassificationStore> ClassifierStage<S> {
    pub fn new(
        records: Arc<BoundedQueue<DnsResponseInfo>>,
        batches: Arc<BoundedQueue<DomainBatch>>,
        store: S,
        shutdown: ShutdownFlag,
        metrics: PipelineMetrics,
        max_batch_size: u64,
        max_cycle_count: u64,
    ) -> Self {
        Self {
            records,
            batches,
            store,
            shutdown,
            metrics,
            max_batch_size,
            max_cycle_count,
        }
    }

    pub fn run(mut self) {
        let mut pending: HashMap<String, u8> = HashMap::new();
        let mut cycle_count: u64 = 0;

        while !self.shutdown.is_requested() {
            match self.records.try_pop() {
                Some(record) => {
                    accumulate(record, &mut pending, &mut cycle_count);

                    if pending.len() as u64 >= self.max_batch_size
                        || cycle_count > self.max_cycle_count
                    {
                        if self.flush(&mut pending).is_err() {
                            error!(
                                "classification store unreachable after retries; \
                                 requesting pipeline shutdown"
                            );
                            self.shutdown.request();
                            return;
                        }
                        cycle_count = 0;
                    }
                }
                // Batches complete only on a trigger, never on idleness.
                None => thread::sleep(IDLE_SLEEP),
            }
        }
    }

    /// Strips classified domains from `pending` and pushes the remainder as
    /// one batch. Fails only when the store stays unreachable through the
    /// retry window.
    fn flush(&mut self, pending: &mut HashMap<String, u8>) -> Result<(), StoreError> {
        if pending.is_empty() {
            return Ok(());
        }

        let names: HashSet<String> = pending.keys().cloned().collect();
        let blacklist = with_retries(
            "blacklist check",
            STORE_RETRY_ATTEMPTS,
            STORE_RETRY_DELAY,
            || self.store.check_blacklist(&names),
        )?;
        let whitelist = with_retries(
            "whitelist check",
            STORE_RETRY_ATTEMPTS,
            STORE_RETRY_DELAY,
            || self.store.check_whitelist(&names),
        )?;

        self.record_blacklist_hits(&blacklist);

        for (domain, listed) in blacklist.iter().chain(whitelist.iter()) {
            if *listed {
                pending.remove(domain);
            }
        }

        debug!(
            "flushing batch: {} unclassified of {} observed domains",
            pending.len(),
            names.len()
        );

        let batch = DomainBatch::new(mem::take(pending));
        let _ = self
            .batches
            .push_until(batch, || self.shutdown.is_requested());
        Ok(())
    }

    /// Best-effort recording of observed blacklist hits; a failed write is
    /// logged and does not abort the flush.
    fn record_blacklist_hits(&self, blacklist: &HashMap<String, bool>) {
        for (domain, listed) in blacklist {
            if !listed {
                continue;
            }
            self.metrics.blacklist_hits.inc();
            if let Err(error) = self.store.record_blacklist_hit(domain, unix_seconds()) {
                warn!("failed to record blacklist hit for '{domain}': {error}");
            }
        }
    }
}

fn accumulate(
    record: DnsResponseInfo,
    pending: &mut HashMap<String, u8>,
    cycle_count: &mut u64,
) {
    for domain in record.domains {
        pending.insert(domain, record.response_code);
        *cycle_count += 1;
    }
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
