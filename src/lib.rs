//! Cortona - 个人记录的认知核心
//!
//! 模块划分：
//! - **core**: 规范化记录、确定性 ID、时间解析、错误类型
//! - **graph**: 关系推断引擎（SAME_DAY / SAME_PERSON / SAME_DOMAIN / FOLLOW_UP）
//! - **state**: 确定性状态评分引擎
//! - **tools**: 工具注册表与本地内置工具
//! - **agents**: 事件驱动的 AgentMesh、内置 Agent 与记忆提供者
//! - **storage**: 存储端口（内存 / SQLite）
//! - **cycle**: 一次完整认知周期
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **observability**: 日志初始化与分层计时

pub mod agents;
pub mod config;
pub mod core;
pub mod cycle;
pub mod graph;
pub mod observability;
pub mod state;
pub mod storage;
pub mod tools;

pub use agents::AgentMesh;
pub use core::{CanonicalRecord, CoreError, CoreResult};
pub use cycle::{CognitiveCycle, CycleReport};
pub use graph::{Relation, RelationEngine, RelationType};
pub use state::{StateEngine, StateSnapshot};
pub use tools::ToolRegistry;
