//! append_log：向 agent_events.log 追加一行带时间戳的消息

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};

use crate::tools::json_file::text_field;
use crate::tools::{Tool, ToolResult};

pub const EVENTS_LOG_FILE: &str = "agent_events.log";

/// 事件日志工具。参数：{"message": 必填}
pub struct AppendLogTool {
    path: PathBuf,
}

impl AppendLogTool {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(EVENTS_LOG_FILE),
        }
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = format!("{} | {}\n", Utc::now().to_rfc3339(), message);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())
    }
}

impl Tool for AppendLogTool {
    fn execute(&self, payload: &Value) -> ToolResult {
        let message = text_field(payload, "message");
        if message.is_empty() {
            return ToolResult::failure("message is required");
        }
        match self.append(&message) {
            Ok(()) => ToolResult::success(json!({"written": true})),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_log_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let tool = AppendLogTool::new(dir.path());
        assert!(tool.execute(&json!({"message": "graph updated"})).ok);
        assert!(tool.execute(&json!({"message": "state recalculated"})).ok);
        let log = std::fs::read_to_string(dir.path().join(EVENTS_LOG_FILE)).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| graph updated"));
    }

    #[test]
    fn test_append_log_requires_message() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppendLogTool::new(dir.path()).execute(&json!({}));
        assert!(!result.ok);
        assert_eq!(result.error, "message is required");
    }
}
