// Accumulated message bodies per notification id, backing inbox-style rendering

use dashmap::DashMap;

use super::NotId;

/// Per-id line table shared by intake (appends) and tap/dismiss handlers (clears).
/// Entries for unrelated ids live in separate shards and do not contend.
#[derive(Debug, Default)]
pub struct NotificationRecords {
    lines: DashMap<NotId, Vec<String>>,
}

impl NotificationRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body and return a snapshot of all lines, oldest first.
    /// An empty body clears the record instead.
    pub fn append(&self, id: NotId, message: &str) -> Vec<String> {
        if message.is_empty() {
            self.clear(id);
            return Vec::new();
        }
        let mut entry = self.lines.entry(id).or_default();
        entry.push(message.to_string());
        entry.value().clone()
    }

    pub fn clear(&self, id: NotId) {
        if self.lines.remove(&id).is_some() {
            tracing::debug!(not_id = %id, "Cleared notification record");
        }
    }

    pub fn clear_all(&self) {
        self.lines.clear();
    }

    pub fn lines(&self, id: NotId) -> Vec<String> {
        self.lines
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self, id: NotId) -> usize {
        self.lines.get(&id).map_or(0, |entry| entry.len())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
