//! Captured-frame representation.
//!
//! DNS-over-UDP responses overwhelmingly fit in 750 bytes, so payloads at or
//! below that bound are stored inline in the packet value and never touch the
//! allocator on the capture path. Larger frames (EDNS options, responses near
//! the truncation boundary) spill to an owned heap buffer. The representation
//! is chosen once at construction and never changes.

/// Largest payload stored without a heap allocation.
pub const INLINE_PAYLOAD_MAX: usize = 750;

/// Capture metadata as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureHeader {
    /// Seconds since the UNIX epoch.
    pub ts_sec: i64,
    /// Microsecond remainder of the capture timestamp.
    pub ts_usec: i64,
    /// Bytes handed over by the driver (bounded by the snapshot length).
    pub captured_len: u32,
    /// Bytes that were on the wire.
    pub wire_len: u32,
}

#[derive(Debug, Clone)]
enum Payload {
    Inline {
        len: u16,
        buf: [u8; INLINE_PAYLOAD_MAX],
    },
    Spilled(Box<[u8]>),
}

/// One captured frame moving from the capture stage to the parsers.
#[derive(Debug, Clone)]
pub struct Packet {
    header: CaptureHeader,
    payload: Payload,
}

impl Packet {
    /// Copies `data` into the hybrid representation.
    pub fn new(header: CaptureHeader, data: &[u8]) -> Self {
        let payload = if data.len() <= INLINE_PAYLOAD_MAX {
            let mut buf = [0u8; INLINE_PAYLOAD_MAX];
            buf[..data.len()].copy_from_slice(data);
            Payload::Inline {
                len: data.len() as u16,
                buf,
            }
        } else {
            Payload::Spilled(data.into())
        };
        Self { header, payload }
    }

    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        match &self.payload {
            Payload::Inline { len, buf } => &buf[..usize::from(*len)],
            Payload::Spilled(buf) => buf,
        }
    }

    /// True when the payload lives inline rather than on the heap.
    pub fn is_inline(&self) -> bool {
        matches!(self.payload, Payload::Inline { .. })
    }
}
