//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CORTONA__*` 覆盖（双下划线表示嵌套，如 `CORTONA__MESH__MAX_EVENTS=10`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::CoreResult;
use crate::state::StateEngineConfig;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    /// [state] 段直接映射到状态引擎窗口
    pub state: StateEngineConfig,
    pub mesh: MeshSection,
}

/// [app] 段：数据目录与数据库路径
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    /// 工具输出文件（任务、日志、快照）的根目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/cortona.db")
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_path: default_db_path(),
        }
    }
}

/// [mesh] 段：事件上限、向量检索条数、认知周期携带的 ID 数
#[derive(Debug, Clone, Deserialize)]
pub struct MeshSection {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: usize,
    #[serde(default = "default_cycle_id_limit")]
    pub cycle_id_limit: usize,
}

fn default_max_events() -> usize {
    crate::agents::DEFAULT_MAX_EVENTS
}

fn default_vector_top_k() -> usize {
    crate::agents::DEFAULT_VECTOR_TOP_K
}

fn default_cycle_id_limit() -> usize {
    20
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            vector_top_k: default_vector_top_k(),
            cycle_id_limit: default_cycle_id_limit(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 CORTONA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CORTONA__*（双下划线表示嵌套键）
/// 4. 校验 [state] 窗口，越界时报错
pub fn load_config(config_path: Option<PathBuf>) -> CoreResult<AppConfig> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default", "default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path.filter(|p| p.exists()) {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CORTONA")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.state.validate()?;
    Ok(cfg)
}
