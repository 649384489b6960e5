//! Agent 契约：事件、上下文、结果，以及 Agent / 记忆提供者 trait
//!
//! 只要求结构上满足 {handles, handle} 或 {get_relations / search / get_state}，不需要继承层级。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::CoreResult;
use crate::graph::Relation;
use crate::state::StateSnapshot;
use crate::tools::{ToolCall, ToolResult};

/// 常用事件类型
pub mod event_types {
    pub const RELATION_GRAPH_UPDATED: &str = "RELATION_GRAPH_UPDATED";
    pub const FOLLOW_UP_TRIGGERED: &str = "FOLLOW_UP_TRIGGERED";
    pub const MEMORY_QUERY: &str = "MEMORY_QUERY";
    pub const STATE_RECALCULATED: &str = "STATE_RECALCULATED";
}

/// 驱动 Agent 的事件；payload 为 JSON 对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub event_type: String,
    pub emitted_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl AgentEvent {
    pub fn new(
        event_type: impl Into<String>,
        emitted_at: DateTime<Utc>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            emitted_at,
            payload,
        }
    }

    /// 以当前时间创建事件；payload 不是对象时视为空对象
    pub fn now(event_type: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(event_type, Utc::now(), payload)
    }

    /// payload 中请求的 canonical_id 列表
    ///
    /// 优先读取 `canonical_ids` 数组（丢弃非字符串与空白项），否则读取单个 `canonical_id`。
    pub fn canonical_ids(&self) -> Vec<String> {
        if let Some(Value::Array(items)) = self.payload.get("canonical_ids") {
            return items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }
        match self.payload.get("canonical_id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => vec![id.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// 检索用查询文本：按 query → text → title → content 取第一个非空白字符串
    pub fn query_text(&self) -> String {
        ["query", "text", "title", "content"]
            .iter()
            .filter_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// 向量检索命中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub canonical_id: String,
    pub score: f64,
}

/// 每个事件即时组装的上下文快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentContext {
    pub user_state: StateSnapshot,
    pub related_relations: Vec<Relation>,
    pub vector_hits: Vec<VectorHit>,
    /// 已排序的可用工具名
    pub available_tools: Vec<String>,
}

impl AgentContext {
    pub fn has_tool(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.available_tools.iter().any(|t| *t == name)
    }
}

/// Agent 处理结果；草稿阶段 tool_results 为空，由 AgentMesh 执行后填充
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AgentOutcome {
    pub agent_name: String,
    pub emitted_events: Vec<AgentEvent>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub notes: Vec<String>,
}

impl AgentOutcome {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            ..Self::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// 事件驱动的 Agent：handles 判断是否关心该事件，handle 产出草稿结果（可请求工具、可发出新事件）
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn handles(&self, event: &AgentEvent) -> bool;

    fn handle(&self, event: &AgentEvent, context: &AgentContext) -> AgentOutcome;
}

/// 关系记忆：按 ID 过滤关系；ids 为空时返回完整关系集合
pub trait RelationProvider: Send + Sync {
    fn get_relations(&self, canonical_ids: &[String]) -> CoreResult<Vec<Relation>>;
}

/// 向量记忆：按分数从高到低返回；没有索引时返回空列表，不报错
pub trait VectorSearchProvider: Send + Sync {
    fn search(&self, text: &str, top_k: usize) -> Vec<VectorHit>;
}

/// 状态提供者
pub trait StateProvider: Send + Sync {
    fn get_state(&self) -> CoreResult<StateSnapshot>;
}
