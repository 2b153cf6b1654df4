//! Pipeline assembly and lifecycle.
//!
//! The supervisor constructs every collaborator before any thread runs, so
//! initialization failures abort startup with a specific exit code. Queues
//! are owned here and outlive every stage; the stages hold shared handles.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use dnsvakt_broker::AmqpPublisher;
use dnsvakt_capture::CaptureHandle;
use dnsvakt_config::Settings;
use dnsvakt_core::prelude::*;
use dnsvakt_storage::MongoStore;
use dnsvakt_telemetry::PipelineMetrics;

use crate::error::EngineError;
use crate::stages::{CaptureStage, ClassifierStage, ParserStage, PublisherStage};

pub struct Supervisor {
    settings: Settings,
    plan: SizingPlan,
    capture: CaptureHandle,
    store: MongoStore,
    publisher: AmqpPublisher,
    shutdown: ShutdownFlag,
    metrics: PipelineMetrics,
}

impl Supervisor {
    /// Builds the sizing plan and every external collaborator. Nothing is
    /// spawned yet; any failure here is fatal before the pipeline exists.
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        let plan = SizingPlan::from_budget(settings.memory_budget_bytes);
        info!(
            "sizing plan: driver ring {} B, packet queue {} slots, record queue {} slots, \
             publisher queue {} slots",
            plan.driver_buffer_bytes,
            plan.packet_queue_capacity,
            plan.dns_info_queue_capacity,
            plan.publisher_queue_capacity
        );

        let capture = CaptureHandle::open(&settings.interface, plan.driver_buffer_request())?;
        let store = MongoStore::connect(&settings.store_uri)?;
        let publisher = AmqpPublisher::connect(&settings.broker_uri, &settings.broker_queue)?;

        Ok(Self {
            settings,
            plan,
            capture,
            store,
            publisher,
            shutdown: ShutdownFlag::new(),
            metrics: PipelineMetrics::new(),
        })
    }

    /// Installs the signal handler, starts every stage thread and blocks
    /// until all of them have joined.
    pub fn run(self) -> Result<(), EngineError> {
        let Self {
            settings,
            plan,
            capture,
            store,
            publisher,
            shutdown,
            metrics,
        } = self;

        {
            let shutdown = shutdown.clone();
            ctrlc::set_handler(move || {
                info!("shutdown signal received");
                shutdown.request();
            })
            .map_err(|e| EngineError::Signal(e.to_string()))?;
        }

        let packets: Arc<BoundedQueue<Packet>> =
            Arc::new(BoundedQueue::with_capacity(plan.packet_queue_capacity));
        let records: Arc<BoundedQueue<DnsResponseInfo>> =
            Arc::new(BoundedQueue::with_capacity(plan.dns_info_queue_capacity));
        let batches: Arc<BoundedQueue<DomainBatch>> =
            Arc::new(BoundedQueue::with_capacity(plan.publisher_queue_capacity));

        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        let capture_stage = CaptureStage::new(
            capture,
            Arc::clone(&packets),
            shutdown.clone(),
            metrics.clone(),
        );
        workers.push(spawn_stage("capture", "capture".into(), move || {
            capture_stage.run()
        })?);

        for index in 0..settings.parser_threads {
            let stage = ParserStage::new(
                Arc::clone(&packets),
                Arc::clone(&records),
                shutdown.clone(),
                metrics.clone(),
            );
            workers.push(spawn_stage("parser", format!("parser-{index}"), move || {
                stage.run()
            })?);
        }

        let classifier = ClassifierStage::new(
            Arc::clone(&records),
            Arc::clone(&batches),
            store,
            shutdown.clone(),
            metrics.clone(),
            settings.max_batch_size,
            settings.max_cycle_count,
        );
        workers.push(spawn_stage("classifier", "classifier".into(), move || {
            classifier.run()
        })?);

        let publisher_stage = PublisherStage::new(
            Arc::clone(&batches),
            publisher,
            shutdown.clone(),
            metrics.clone(),
        );
        workers.push(spawn_stage("publisher", "publisher".into(), move || {
            publisher_stage.run()
        })?);

        info!(
            "pipeline running on {} with {} parser workers",
            settings.interface, settings.parser_threads
        );

        // Join order is immaterial: the queues outlive every stage.
        for worker in workers {
            if worker.join().is_err() {
                warn!("a pipeline stage panicked during shutdown");
            }
        }

        info!(
            "pipeline stopped: {} records parsed, {} batches published, {} publish failures",
            metrics.records_parsed.get(),
            metrics.batches_published.get(),
            metrics.publish_failures.get()
        );
        Ok(())
    }
}

fn spawn_stage<F>(stage: &'static str, name: String, body: F) -> Result<JoinHandle<()>, EngineError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(body)
        .map_err(|source| EngineError::Spawn { stage, source })
}
