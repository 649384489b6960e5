//! 工具注册表
//!
//! 所有工具实现 Tool trait（同步 execute，参数为 JSON），由 ToolRegistry 按名注册与查找。
//! 名称去空白并转小写后作为键，重复注册覆盖旧实现；找不到工具时返回 ok=false 的结果而不是报错。
//! 每次调用输出一条结构化审计日志（JSON）。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{CoreError, CoreResult};

/// Agent 请求执行的工具调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub payload: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// 工具执行结果：失败以数据形式返回（ok=false + error），不中断调度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    pub output: Value,
    #[serde(default)]
    pub error: String,
}

impl ToolResult {
    pub fn success(output: Value) -> Self {
        Self {
            ok: true,
            output,
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            output: Value::Null,
            error: error.into(),
        }
    }
}

/// 工具 trait：同步执行（args 为 JSON）
pub trait Tool: Send + Sync {
    fn execute(&self, payload: &Value) -> ToolResult;
}

/// 闭包即工具，便于测试与轻量注册
impl<F> Tool for F
where
    F: Fn(&Value) -> ToolResult + Send + Sync,
{
    fn execute(&self, payload: &Value) -> ToolResult {
        self(payload)
    }
}

/// 工具注册表：规范化名称 → Arc<dyn Tool>，键有序，list_tools 天然排序
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名（忽略大小写与首尾空白）覆盖旧实现，空名称报错
    pub fn register(&mut self, name: &str, tool: impl Tool + 'static) -> CoreResult<()> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(CoreError::InvalidToolName);
        }
        if self.tools.insert(key.clone(), Arc::new(tool)).is_some() {
            tracing::debug!(tool = %key, "tool registration replaced");
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(&normalize_name(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&normalize_name(name)).cloned()
    }

    /// 同步执行一次工具调用；未注册时返回 not-found 结果
    pub fn execute(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let result = match self.get(&call.name) {
            Some(tool) => tool.execute(&call.payload),
            None => ToolResult::failure(format!("tool not found: {}", call.name)),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": call.name,
            "ok": result.ok,
            "error": result.error,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(&call.payload),
        });
        tracing::info!(audit = %audit, "tool");
        result
    }

    /// 当前已注册的工具名（已排序）
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
