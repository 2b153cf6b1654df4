//! Bounded DNS message view.
//!
//! Exposes exactly what the pipeline needs from a DNS payload: the QR bit,
//! the response code, and the names in the questions section. Label walks are
//! bounds-checked, compression pointers are jump-capped, and the RFC 1035
//! label/name length limits are enforced, so arbitrary input terminates in a
//! bounded number of steps.

use thiserror::Error;

const HEADER_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;
const MAX_POINTER_JUMPS: usize = 10;

const QR_MASK: u16 = 0x8000;
const RCODE_MASK: u16 = 0x000F;
const POINTER_TAG: u8 = 0xC0;

/// Errors produced while decoding a DNS payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsParseError {
    #[error("buffer shorter than the DNS header")]
    TruncatedHeader,
    #[error("question section truncated")]
    TruncatedQuestion,
    #[error("label exceeds 63 octets")]
    OversizedLabel,
    #[error("name exceeds 253 octets")]
    OversizedName,
    #[error("compression pointer loop")]
    PointerLoop,
    #[error("name contains non-ASCII octets")]
    NonAsciiName,
}

/// Zero-copy view over one DNS message.
#[derive(Debug, Clone, Copy)]
pub struct DnsMessage<'a> {
    data: &'a [u8],
    flags: u16,
    question_count: u16,
}

impl<'a> DnsMessage<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, DnsParseError> {
        if data.len() < HEADER_LEN {
            return Err(DnsParseError::TruncatedHeader);
        }
        Ok(Self {
            data,
            flags: u16::from_be_bytes([data[2], data[3]]),
            question_count: u16::from_be_bytes([data[4], data[5]]),
        })
    }

    /// QR bit: true for responses, false for queries.
    pub fn is_response(&self) -> bool {
        self.flags & QR_MASK != 0
    }

    /// DNS rcode, 0..15.
    pub fn response_code(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    pub fn question_count(&self) -> u16 {
        self.question_count
    }

    /// Iterator over the questions section, yielding owned lowercase names in
    /// wire order. Stops at the first malformed question.
    pub fn questions(&self) -> Questions<'a> {
        Questions {
            data: self.data,
            offset: HEADER_LEN,
            remaining: self.question_count,
            failed: false,
        }
    }

    /// Collects every question name, failing on the first malformed one.
    pub fn question_names(&self) -> Result<Vec<String>, DnsParseError> {
        self.questions().collect()
    }
}

/// Iterator handed out by [`DnsMessage::questions`].
pub struct Questions<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u16,
    failed: bool,
}

impl Iterator for Questions<'_> {
    type Item = Result<String, DnsParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let name = match read_name(self.data, &mut self.offset) {
            Ok(name) => name,
            Err(error) => {
                self.failed = true;
                return Some(Err(error));
            }
        };

        // QTYPE and QCLASS trail each question.
        if self.offset + 4 > self.data.len() {
            self.failed = true;
            return Some(Err(DnsParseError::TruncatedQuestion));
        }
        self.offset += 4;

        Some(Ok(name))
    }
}

/// Reads one possibly-compressed name starting at `*offset` and leaves
/// `*offset` on the byte following the name in the question section.
fn read_name(data: &[u8], offset: &mut usize) -> Result<String, DnsParseError> {
    let mut name: Vec<u8> = Vec::new();
    let mut cursor = *offset;
    let mut resume = 0usize;
    let mut jumped = false;
    let mut jumps = 0usize;

    loop {
        let len = *data
            .get(cursor)
            .ok_or(DnsParseError::TruncatedQuestion)?;

        if len == 0 {
            cursor += 1;
            break;
        }

        if len & POINTER_TAG == POINTER_TAG {
            let low = *data
                .get(cursor + 1)
                .ok_or(DnsParseError::TruncatedQuestion)?;
            if !jumped {
                resume = cursor + 2;
                jumped = true;
            }
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err(DnsParseError::PointerLoop);
            }
            cursor = usize::from(len & 0x3F) << 8 | usize::from(low);
            continue;
        }

        let len = usize::from(len);
        if len > MAX_LABEL_LEN {
            return Err(DnsParseError::OversizedLabel);
        }

        let label = data
            .get(cursor + 1..cursor + 1 + len)
            .ok_or(DnsParseError::TruncatedQuestion)?;
        if !name.is_empty() {
            name.push(b'.');
        }
        name.extend(label.iter().map(u8::to_ascii_lowercase));
        if name.len() > MAX_NAME_LEN {
            return Err(DnsParseError::OversizedName);
        }
        cursor += 1 + len;
    }

    *offset = if jumped { resume } else { cursor };
    if !name.is_ascii() {
        return Err(DnsParseError::NonAsciiName);
    }
    String::from_utf8(name).map_err(|_| DnsParseError::NonAsciiName)
}
