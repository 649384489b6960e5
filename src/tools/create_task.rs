//! create_task：把待办追加到 agent_tasks.json

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};

use crate::core::{CoreResult, DEFAULT_DOMAIN};
use crate::tools::json_file::{read_json_list, text_field, write_json};
use crate::tools::{Tool, ToolResult};

pub const TASKS_FILE: &str = "agent_tasks.json";

/// 本地任务工具。参数：{"title": 必填, "details": 可选, "domain": 可选}
pub struct CreateTaskTool {
    path: PathBuf,
}

impl CreateTaskTool {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(TASKS_FILE),
        }
    }

    fn append(&self, title: String, details: String, domain: String) -> CoreResult<Value> {
        let mut tasks = read_json_list(&self.path)?;
        let task = json!({
            "task_id": format!("task_{:06}", tasks.len() + 1),
            "title": title,
            "details": details,
            "domain": domain,
            "status": "pending",
            "created_at": Utc::now().to_rfc3339(),
        });
        tasks.push(task.clone());
        write_json(&self.path, &Value::Array(tasks))?;
        Ok(task)
    }
}

impl Tool for CreateTaskTool {
    fn execute(&self, payload: &Value) -> ToolResult {
        let title = text_field(payload, "title");
        if title.is_empty() {
            return ToolResult::failure("title is required");
        }
        let details = text_field(payload, "details");
        let domain = match text_field(payload, "domain") {
            d if d.is_empty() => DEFAULT_DOMAIN.to_string(),
            d => d,
        };
        match self.append(title, details, domain) {
            Ok(task) => ToolResult::success(task),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}
