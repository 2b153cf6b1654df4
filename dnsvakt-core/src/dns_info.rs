//! Parser output record.

/// The queried names of one DNS response, in question order, paired with the
/// response code. Only produced for frames whose DNS header has QR = 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsResponseInfo {
    /// Lowercase ASCII names from the questions section, wire order.
    pub domains: Vec<String>,
    /// DNS rcode, 0..15.
    pub response_code: u8,
}

impl DnsResponseInfo {
    pub fn new(domains: Vec<String>, response_code: u8) -> Self {
        Self {
            domains,
            response_code,
        }
    }
}
