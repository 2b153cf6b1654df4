//! End-to-end pipeline tests over real queues and mock store/broker.
//!
//! The capture driver is the only collaborator not exercised here; frames
//! enter through the packet queue exactly as the capture stage would push
//! them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dnsvakt_broker::{BrokerError, MessagePublisher};
use dnsvakt_core::prelude::*;
use dnsvakt_engine::stages::{ClassifierStage, ParserStage, PublisherStage};
use dnsvakt_storage::{ClassificationStore, StoreError};
use dnsvakt_telemetry::PipelineMetrics;

// Frames captured off the wire.
const RESPONSE_FRAME: &str = "000c291dc716005056fc80ea0800450000531ff1000080117cd3c0a88e02c0a88e820035da79003f6544ead98180000100010000000106676f6f676c6503636f6d0000010001c00c000100010000000500048efb256e000029100000000000050000";
const QUERY_FRAME: &str = "005056fc80ea000c291dc71608004500005637a740004011651ac0a88e82c0a88e028577003500429e29aab70100000100000000000112636f6e6e65637469766974792d636865636b067562756e747503636f6d00001c00010000290200000000000000";

#[derive(Default, Clone)]
struct MockStore {
    blacklist: HashSet<String>,
    whitelist: HashSet<String>,
    hits: Arc<Mutex<Vec<(String, i64)>>>,
}

impl ClassificationStore for MockStore {
    fn check_blacklist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError> {
        Ok(names
            .iter()
            .map(|n| (n.clone(), self.blacklist.contains(n)))
            .collect())
    }

    fn check_whitelist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError> {
        Ok(names
            .iter()
            .map(|n| (n.clone(), self.whitelist.contains(n)))
            .collect())
    }

    fn record_blacklist_hit(&self, name: &str, unix_seconds: i64) -> Result<(), StoreError> {
        self.hits
            .lock()
            .unwrap()
            .push((name.to_string(), unix_seconds));
        Ok(())
    }
}

#[derive(Default, Clone)]
struct MockSink {
    published: Arc<Mutex<Vec<String>>>,
}

impl MessagePublisher for MockSink {
    fn publish(&mut self, body: &[u8]) -> Result<(), BrokerError> {
        self.published
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(body).into_owned());
        Ok(())
    }
}

struct Pipeline {
    packets: Arc<BoundedQueue<Packet>>,
    records: Arc<BoundedQueue<DnsResponseInfo>>,
    shutdown: ShutdownFlag,
    published: Arc<Mutex<Vec<String>>>,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Parser + classifier + publisher over freshly built queues.
    fn start(store: MockStore, max_batch_size: u64, max_cycle_count: u64) -> Self {
        Self::start_with_capacities(store, max_batch_size, max_cycle_count, 128, 128, 128)
    }

    fn start_with_capacities(
        store: MockStore,
        max_batch_size: u64,
        max_cycle_count: u64,
        packet_slots: usize,
        record_slots: usize,
        batch_slots: usize,
    ) -> Self {
        let packets = Arc::new(BoundedQueue::with_capacity(packet_slots));
        let records = Arc::new(BoundedQueue::with_capacity(record_slots));
        let batches = Arc::new(BoundedQueue::with_capacity(batch_slots));
        let shutdown = ShutdownFlag::new();
        let metrics = PipelineMetrics::new();
        let sink = MockSink::default();
        let published = Arc::clone(&sink.published);

        let mut workers = Vec::new();

        let parser = ParserStage::new(
            Arc::clone(&packets),
            Arc::clone(&records),
            shutdown.clone(),
            metrics.clone(),
        );
        workers.push(thread::spawn(move || parser.run()));

        let classifier = ClassifierStage::new(
            Arc::clone(&records),
            Arc::clone(&batches),
            store,
            shutdown.clone(),
            metrics.clone(),
            max_batch_size,
            max_cycle_count,
        );
        workers.push(thread::spawn(move || classifier.run()));

        let publisher = PublisherStage::new(
            Arc::clone(&batches),
            sink,
            shutdown.clone(),
            metrics.clone(),
        );
        workers.push(thread::spawn(move || publisher.run()));

        Self {
            packets,
            records,
            shutdown,
            published,
            workers,
        }
    }

    fn feed_frame(&self, hex_frame: &str) {
        let data = hex::decode(hex_frame).unwrap();
        let header = CaptureHeader {
            ts_sec: 1_700_000_000,
            ts_usec: 0,
            captured_len: data.len() as u32,
            wire_len: data.len() as u32,
        };
        self.packets.try_push(Packet::new(header, &data)).unwrap();
    }

    fn wait_for_messages(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let published = self.published.lock().unwrap();
                if published.len() >= count {
                    return published.clone();
                }
            }
            assert!(
                Instant::now() < deadline,
                "expected {count} published messages, got {}",
                self.published.lock().unwrap().len()
            );
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn stop(self) -> Vec<String> {
        self.shutdown.request();
        for worker in self.workers {
            worker.join().unwrap();
        }
        let published = self.published.lock().unwrap().clone();
        published
    }
}

#[test]
fn single_unclassified_response_is_published() {
    let pipeline = Pipeline::start(MockStore::default(), 1, 1_000_000);
    pipeline.feed_frame(RESPONSE_FRAME);

    let messages = pipeline.wait_for_messages(1, Duration::from_secs(5));
    let value: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
    assert_eq!(value, serde_json::json!({"domains": {"google.com": 0}}));

    let messages = pipeline.stop();
    assert_eq!(messages.len(), 1);
}

#[test]
fn blacklisted_domain_is_suppressed_and_recorded() {
    let store = MockStore {
        blacklist: HashSet::from(["google.com".to_string()]),
        ..MockStore::default()
    };
    let hits = Arc::clone(&store.hits);

    let pipeline = Pipeline::start(store, 1, 1_000_000);
    pipeline.feed_frame(RESPONSE_FRAME);

    let deadline = Instant::now() + Duration::from_secs(5);
    while hits.lock().unwrap().is_empty() {
        assert!(Instant::now() < deadline, "blacklist hit never recorded");
        thread::sleep(Duration::from_millis(20));
    }

    // Give the publisher a chance to (wrongly) emit the stripped batch.
    thread::sleep(Duration::from_millis(300));
    let messages = pipeline.stop();
    assert!(messages.is_empty());

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "google.com");
    assert!(hits[0].1 > 1_700_000_000);
}

#[test]
fn queries_produce_no_records_and_no_messages() {
    let pipeline = Pipeline::start(MockStore::default(), 1, 1_000_000);
    pipeline.feed_frame(QUERY_FRAME);

    // Wait until the parser has consumed the frame.
    let deadline = Instant::now() + Duration::from_secs(2);
    while !pipeline.packets.is_empty() {
        assert!(Instant::now() < deadline, "frame never consumed");
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(Duration::from_millis(300));

    assert!(pipeline.records.is_empty());
    let messages = pipeline.stop();
    assert!(messages.is_empty());
}

#[test]
fn batch_flush_by_size_collects_every_domain() {
    // Feed records straight to the classifier: distinct domains, rcode 3.
    const DOMAINS: usize = 500;
    let pipeline = Pipeline::start(MockStore::default(), DOMAINS as u64, u64::MAX);
    for i in 0..DOMAINS {
        pipeline
            .records
            .try_push(DnsResponseInfo::new(vec![format!("h{i}.example")], 3))
            .unwrap();
    }

    let messages = pipeline.wait_for_messages(1, Duration::from_secs(5));
    let value: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
    let domains = value["domains"].as_object().unwrap();
    assert_eq!(domains.len(), DOMAINS);
    assert!(domains.values().all(|code| code == 3));

    let messages = pipeline.stop();
    assert_eq!(messages.len(), 1);
}

#[test]
fn shutdown_with_full_queues_joins_quickly() {
    // Tiny queues, filled to capacity, nothing draining them fast.
    let pipeline = Pipeline::start_with_capacities(
        MockStore::default(),
        1_000_000,
        1_000_000,
        4,
        4,
        4,
    );

    for _ in 0..4 {
        pipeline.feed_frame(RESPONSE_FRAME);
    }
    // The classifier drains concurrently; push a bounded burst rather than
    // spinning until the queue reports full.
    for _ in 0..64 {
        if pipeline
            .records
            .try_push(DnsResponseInfo::new(vec!["fill.example".into()], 0))
            .is_err()
        {
            break;
        }
    }

    let started = Instant::now();
    let _ = pipeline.stop();
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "shutdown took {:?}",
        started.elapsed()
    );
}
