//! Per-type message counters, grounded on `message_bus.py`'s `MessageStats`.

use std::collections::HashMap;

use sar_proto::MessageKind;

/// Running counts of messages sent/received on the bus, broken down by kind.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageStats {
    pub total_sent: u64,
    pub total_received: u64,
    by_kind: HashMap<MessageKind, u64>,
}

impl MessageStats {
    pub fn record_sent(&mut self, kind: MessageKind) {
        self.total_sent += 1;
        *self.by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn record_received(&mut self) {
        self.total_received += 1;
    }

    pub fn count(&self, kind: MessageKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// A snapshot of all kinds with a non-zero count, in `MessageKind::ALL`
    /// order for stable output.
    pub fn by_kind(&self) -> Vec<(MessageKind, u64)> {
        MessageKind::ALL
            .into_iter()
            .filter_map(|k| {
                let n = self.count(k);
                (n > 0).then_some((k, n))
            })
            .collect()
    }
}
