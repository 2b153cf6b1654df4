//! Device handling and the capture loop.

use std::time::Duration;

use pcap::{Active, Capture, Device};
use thiserror::Error;
use tracing::{info, warn};

use dnsvakt_core::packet::{CaptureHeader, Packet};
use dnsvakt_core::shutdown::ShutdownFlag;

/// Snapshot length handed to the driver; full frames, DNS is small anyway.
const SNAPLEN: i32 = 65_535;
/// Poll timeout. Keeps the loop responsive to the cancellation flag.
const POLL_TIMEOUT_MS: i32 = 1;
/// Smallest driver ring we will accept before giving up.
const MIN_BUFFER_BYTES: i32 = 1024 * 1024;
/// Step removed from the request after each rejected attempt.
const BUFFER_DECREMENT_BYTES: i32 = 5 * 1024 * 1024;

const BPF_FILTER: &str = "port 53";

/// Capture initialization failures. All of them abort startup.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("interface '{0}' not found")]
    DeviceNotFound(String),
    #[error("failed to enumerate devices: {0}")]
    DeviceList(#[source] pcap::Error),
    #[error("failed to open '{interface}': {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },
    #[error("driver rejected every buffer size down to {MIN_BUFFER_BYTES} bytes: {0}")]
    BufferExhausted(#[source] pcap::Error),
    #[error("memory budget yields a driver ring below {MIN_BUFFER_BYTES} bytes")]
    BufferTooSmall,
    #[error("failed to install filter '{BPF_FILTER}': {0}")]
    Filter(#[source] pcap::Error),
}

/// Final driver statistics, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub received: u32,
    pub kernel_dropped: u32,
    pub interface_dropped: u32,
}

/// An activated capture handle with the filter installed.
pub struct CaptureHandle {
    capture: Capture<Active>,
    interface: String,
}

impl CaptureHandle {
    /// Opens `interface` promiscuous with immediate mode and a driver ring of
    /// `buffer_bytes`, downscaling the ring request by 5 MiB per rejection.
    /// Fails once the request would fall below 1 MiB.
    pub fn open(interface: &str, buffer_bytes: i32) -> Result<Self, CaptureError> {
        let device = find_device(interface)?;

        let mut request = buffer_bytes;
        let mut last_rejection = None;
        while request >= MIN_BUFFER_BYTES {
            let inactive = Capture::from_device(device.clone())
                .map_err(|source| CaptureError::Open {
                    interface: interface.to_string(),
                    source,
                })?
                .snaplen(SNAPLEN)
                .promisc(true)
                .timeout(POLL_TIMEOUT_MS)
                .immediate_mode(true)
                .buffer_size(request);

            match inactive.open() {
                Ok(mut capture) => {
                    info!("driver buffer set to {request} bytes on {interface}");
                    capture
                        .filter(BPF_FILTER, true)
                        .map_err(CaptureError::Filter)?;
                    return Ok(Self {
                        capture,
                        interface: interface.to_string(),
                    });
                }
                Err(error) => {
                    warn!("driver rejected buffer of {request} bytes on {interface}: {error}");
                    last_rejection = Some(error);
                    request -= BUFFER_DECREMENT_BYTES;
                }
            }
        }

        Err(match last_rejection {
            Some(error) => CaptureError::BufferExhausted(error),
            None => CaptureError::BufferTooSmall,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Runs the capture loop until `shutdown` is raised, invoking `sink` for
    /// every captured frame. The 1 ms poll timeout bounds how long a raised
    /// flag goes unobserved.
    pub fn run_loop<F>(&mut self, shutdown: &ShutdownFlag, mut sink: F)
    where
        F: FnMut(Packet),
    {
        info!("capture loop started on {}", self.interface);
        while !shutdown.is_requested() {
            match self.capture.next_packet() {
                Ok(frame) => {
                    let header = CaptureHeader {
                        ts_sec: frame.header.ts.tv_sec as i64,
                        ts_usec: frame.header.ts.tv_usec as i64,
                        captured_len: frame.header.caplen,
                        wire_len: frame.header.len,
                    };
                    sink(Packet::new(header, frame.data));
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(error) => {
                    warn!("capture error on {}: {error}", self.interface);
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
        info!("capture loop stopped on {}", self.interface);
    }

    /// Pulls the driver's counters. Logged once at shutdown.
    pub fn stats(&mut self) -> Option<CaptureStats> {
        match self.capture.stats() {
            Ok(stats) => Some(CaptureStats {
                received: stats.received,
                kernel_dropped: stats.dropped,
                interface_dropped: stats.if_dropped,
            }),
            Err(error) => {
                warn!("failed to read capture stats: {error}");
                None
            }
        }
    }
}

fn find_device(interface: &str) -> Result<Device, CaptureError> {
    Device::list()
        .map_err(CaptureError::DeviceList)?
        .into_iter()
        .find(|d| d.name == interface)
        .ok_or_else(|| CaptureError::DeviceNotFound(interface.to_string()))
}
