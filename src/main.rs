//! Cortona 入口：加载配置、初始化日志，对本地 SQLite 记忆库执行一次认知周期并输出 JSON 报告。

use std::sync::Arc;

use anyhow::Context;
use cortona::{
    config::load_config,
    cycle::CognitiveCycle,
    observability,
    storage::{MemoryStore, SqliteStore},
    tools::build_local_tool_registry,
};

fn main() -> anyhow::Result<()> {
    observability::init();

    let config = load_config(None).context("Failed to load config")?;

    std::fs::create_dir_all(&config.app.data_dir)
        .with_context(|| format!("Failed to create data dir {}", config.app.data_dir.display()))?;

    let store = SqliteStore::open(&config.app.db_path)
        .with_context(|| format!("Failed to open database {}", config.app.db_path.display()))?;
    store
        .initialize_schema()
        .context("Failed to initialize schema")?;
    let store: Arc<dyn MemoryStore> = Arc::new(store);

    let tools =
        build_local_tool_registry(&config.app.data_dir).context("Failed to build tool registry")?;

    let report = CognitiveCycle::new(&config)
        .run(store, tools, &config)
        .context("Cognitive cycle failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
