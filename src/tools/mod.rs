//! 工具层：注册表与本地内置工具（create_task / append_log / save_note_snapshot）
//!
//! Agent 只能「请求」工具调用，真正执行由 AgentMesh 通过 ToolRegistry 完成。

pub mod append_log;
pub mod create_task;
pub mod json_file;
pub mod note_snapshot;
pub mod registry;

pub use append_log::AppendLogTool;
pub use create_task::CreateTaskTool;
pub use note_snapshot::SaveNoteSnapshotTool;
pub use registry::{Tool, ToolCall, ToolRegistry, ToolResult};

use std::path::Path;

use crate::core::CoreResult;

pub const CREATE_TASK_TOOL: &str = "create_task";
pub const APPEND_LOG_TOOL: &str = "append_log";
pub const SAVE_NOTE_SNAPSHOT_TOOL: &str = "save_note_snapshot";

/// 构建本地工具注册表：所有文件写在 data_dir 下
pub fn build_local_tool_registry(data_dir: impl AsRef<Path>) -> CoreResult<ToolRegistry> {
    let data_dir = data_dir.as_ref();
    let mut registry = ToolRegistry::new();
    registry.register(CREATE_TASK_TOOL, CreateTaskTool::new(data_dir))?;
    registry.register(APPEND_LOG_TOOL, AppendLogTool::new(data_dir))?;
    registry.register(SAVE_NOTE_SNAPSHOT_TOOL, SaveNoteSnapshotTool::new(data_dir))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_registry_creates_files_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let registry = build_local_tool_registry(dir.path()).unwrap();
        assert_eq!(
            registry.list_tools(),
            vec!["append_log", "create_task", "save_note_snapshot"]
        );

        let calls = [
            ToolCall::new("create_task", json!({"title": "Follow up", "details": "Ping team", "domain": "work"})),
            ToolCall::new("append_log", json!({"message": "graph updated"})),
            ToolCall::new("save_note_snapshot", json!({"canonical_id": "co_1", "note": "Pinned for review"})),
        ];
        for call in &calls {
            assert!(registry.execute(call).ok, "{} failed", call.name);
        }

        assert!(dir.path().join(create_task::TASKS_FILE).exists());
        assert!(dir.path().join(append_log::EVENTS_LOG_FILE).exists());
        assert!(dir.path().join(note_snapshot::SNAPSHOTS_FILE).exists());
    }
}
