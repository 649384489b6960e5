//! 状态快照类型：完全由记录与关系推导，每次请求重新计算，不落库

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 原始特征计数（只统计最近窗口内的记录）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFeatures {
    pub recent_record_count: usize,
    pub upcoming_24h_count: usize,
    pub overdue_reminder_count: usize,
    pub follow_up_relation_count: usize,
    pub active_domain_count: usize,
}

/// 诊断用比值
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDiagnostics {
    /// 活跃领域数 / 最近记录数
    pub context_switch_ratio: f64,
    /// FOLLOW_UP 数 / 最近记录数
    pub follow_up_density: f64,
}

/// 用户行为状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// [0, 100]
    pub energy_level: f64,
    /// [0, 1]
    pub stress_probability: f64,
    /// [0, 100]
    pub focus_index: f64,
    /// [0, 100]
    pub execution_velocity: f64,
    pub domain_context: String,
    pub computed_at: DateTime<Utc>,
    pub features: StateFeatures,
    pub diagnostics: StateDiagnostics,
}
