//! Classifier flush unit.

use std::collections::HashMap;

use serde::Serialize;

/// One flushed batch of still-unclassified domains.
///
/// Keys are unique; when the same name is observed more than once inside a
/// batch window the most recently seen response code wins. Serializes to the
/// broker wire shape `{"domains": {"<name>": <code>, ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainBatch {
    pub domains: HashMap<String, u8>,
}

impl DomainBatch {
    pub fn new(domains: HashMap<String, u8>) -> Self {
        Self { domains }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }
}
