//! save_note_snapshot：为某条记录保存一段批注快照

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};

use crate::core::CoreResult;
use crate::tools::json_file::{read_json_list, text_field, write_json};
use crate::tools::{Tool, ToolResult};

pub const SNAPSHOTS_FILE: &str = "agent_note_snapshots.json";

/// 批注快照工具。参数：{"canonical_id": 必填, "note": 必填}
pub struct SaveNoteSnapshotTool {
    path: PathBuf,
}

impl SaveNoteSnapshotTool {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SNAPSHOTS_FILE),
        }
    }

    fn append(&self, canonical_id: String, note: String) -> CoreResult<Value> {
        let mut snapshots = read_json_list(&self.path)?;
        let snapshot = json!({
            "canonical_id": canonical_id,
            "note": note,
            "saved_at": Utc::now().to_rfc3339(),
        });
        snapshots.push(snapshot.clone());
        write_json(&self.path, &Value::Array(snapshots))?;
        Ok(snapshot)
    }
}

impl Tool for SaveNoteSnapshotTool {
    fn execute(&self, payload: &Value) -> ToolResult {
        let canonical_id = text_field(payload, "canonical_id");
        let note = text_field(payload, "note");
        if canonical_id.is_empty() || note.is_empty() {
            return ToolResult::failure("canonical_id and note are required");
        }
        match self.append(canonical_id, note) {
            Ok(snapshot) => ToolResult::success(snapshot),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_saved() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SaveNoteSnapshotTool::new(dir.path());
        let result = tool.execute(&json!({"canonical_id": "co_1", "note": "Pinned for review"}));
        assert!(result.ok);
        let stored = read_json_list(&dir.path().join(SNAPSHOTS_FILE)).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["canonical_id"], "co_1");
    }

    #[test]
    fn test_snapshot_requires_both_fields() {
        let dir = tempfile::tempdir().unwrap();
        let result = SaveNoteSnapshotTool::new(dir.path()).execute(&json!({"canonical_id": "co_1"}));
        assert!(!result.ok);
    }
}
