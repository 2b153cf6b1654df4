//! Capture stage: one producer thread feeding the packet queue.

use std::sync::Arc;

use tracing::info;

use dnsvakt_capture::CaptureHandle;
use dnsvakt_core::packet::Packet;
use dnsvakt_core::queue::BoundedQueue;
use dnsvakt_core::shutdown::ShutdownFlag;
use dnsvakt_telemetry::PipelineMetrics;

pub struct CaptureStage {
    handle: CaptureHandle,
    packets: Arc<BoundedQueue<Packet>>,
    shutdown: ShutdownFlag,
    metrics: PipelineMetrics,
}

impl CaptureStage {
    pub fn new(
        handle: CaptureHandle,
        packets: Arc<BoundedQueue<Packet>>,
        shutdown: ShutdownFlag,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            handle,
            packets,
            shutdown,
            metrics,
        }
    }

    /// Runs the capture loop until shutdown. The enqueue is non-blocking:
    /// when the packet queue is full the frame is dropped and counted, never
    /// letting the kernel-adjacent callback stall. The driver ring plus the
    /// packet queue form the two-level burst buffer.
    pub fn run(self) {
        let Self {
            mut handle,
            packets,
            shutdown,
            metrics,
        } = self;

        handle.run_loop(&shutdown, |packet| {
            enqueue_frame(&packets, &metrics, packet);
        });

        if let Some(stats) = handle.stats() {
            info!(
                "capture statistics: received {}, kernel-dropped {}, interface-dropped {}, \
                 queue-full drops {}",
                stats.received,
                stats.kernel_dropped,
                stats.interface_dropped,
                metrics.packets_dropped.get()
            );
        }
    }
}

/// Queue admission for one captured frame. Non-blocking on purpose: when the
/// packet queue is full the frame is dropped and counted rather than stalling
/// the capture callback.
fn enqueue_frame(packets: &BoundedQueue<Packet>, metrics: &PipelineMetrics, packet: Packet) {
    match packets.try_push(packet) {
        Ok(()) => metrics.packets_captured.inc(),
        Err(_) => metrics.packets_dropped.inc(),
    }
}
