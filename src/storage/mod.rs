//! 存储端口：记录的批量写入 / 读取、关系集合的整体替换 / 读取
//!
//! 核心只依赖 [`MemoryStore`] trait；失败通过 `CoreResult` 上抛，核心层不重试也不吞错。

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::core::{CanonicalRecord, CoreResult};
use crate::graph::Relation;

/// 存储端口
pub trait MemoryStore: Send + Sync {
    /// 读取全部规范化记录
    fn fetch_records(&self) -> CoreResult<Vec<CanonicalRecord>>;

    /// 批量写入：按 canonical_id 幂等，后写者胜
    fn upsert_records(&self, records: &[CanonicalRecord]) -> CoreResult<()>;

    /// 原子地删除全部旧关系并写入新集合
    fn replace_relations(&self, relations: &[Relation]) -> CoreResult<()>;

    /// 读取全部关系，按 (from, to, type) 排序
    fn fetch_relations(&self) -> CoreResult<Vec<Relation>>;
}
