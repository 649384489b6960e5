//! 核心错误类型
//!
//! 只有「输入不合法」与「协作方失败」才是错误；缺少工具、没有向量索引、没有 FOLLOW_UP 边
//! 都不是错误，而是以 note / 空结果的形式返回，保证流水线总能跑完。

use thiserror::Error;

/// 核心层错误（记录校验、工具注册、存储、文件 IO、JSON、配置）
#[derive(Error, Debug)]
pub enum CoreError {
    /// 记录字段不合法（构造时立即报错，不做静默修正）
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// 存储中读出的关系无法还原（例如未知的关系类型）
    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Tool name cannot be empty")]
    InvalidToolName,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type CoreResult<T> = Result<T, CoreError>;
