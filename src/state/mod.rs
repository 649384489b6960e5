//! 行为状态：由记录与关系确定性推导的精力 / 压力 / 专注 / 执行速度

pub mod engine;
pub mod models;

pub use engine::{StateEngine, StateEngineConfig, MAX_WINDOW_DAYS};
pub use models::{StateDiagnostics, StateFeatures, StateSnapshot};
