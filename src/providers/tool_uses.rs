//! Per-run correlation of tool starts with their results.

use parking_lot::Mutex;
use std::collections::HashMap;

/// What a tool start told us, kept until its result arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolUseInfo {
    pub name: String,
    pub detail: String,
}

/// Tool-use id to start metadata. Entries are consumed at most once.
///
/// Starts and results may be decoded on either reader task, hence the lock.
#[derive(Debug, Default)]
pub(crate) struct ToolUseTable {
    entries: Mutex<HashMap<String, ToolUseInfo>>,
}

impl ToolUseTable {
    pub fn remember(&self, id: &str, name: &str, detail: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        self.entries.lock().insert(
            id.to_string(),
            ToolUseInfo {
                name: name.trim().to_string(),
                detail: detail.to_string(),
            },
        );
    }

    pub fn take(&self, id: &str) -> Option<ToolUseInfo> {
        self.entries.lock().remove(id.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
