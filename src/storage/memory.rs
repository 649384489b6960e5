//! 内存存储：测试与一次性流水线使用

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::core::{CanonicalRecord, CoreResult};
use crate::graph::Relation;
use crate::storage::MemoryStore;

/// 基于 RwLock 的内存实现；克隆共享同一份数据
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<BTreeMap<String, CanonicalRecord>>>,
    relations: Arc<RwLock<Vec<Relation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl MemoryStore for InMemoryStore {
    fn fetch_records(&self) -> CoreResult<Vec<CanonicalRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }

    fn upsert_records(&self, records: &[CanonicalRecord]) -> CoreResult<()> {
        let mut stored = self.records.write().unwrap_or_else(|e| e.into_inner());
        for record in records {
            stored.insert(record.canonical_id().to_string(), record.clone());
        }
        Ok(())
    }

    fn replace_relations(&self, relations: &[Relation]) -> CoreResult<()> {
        let mut sorted = relations.to_vec();
        sorted.sort_by(|a, b| {
            (&a.from_canonical_id, &a.to_canonical_id, a.relation_type.as_str()).cmp(&(
                &b.from_canonical_id,
                &b.to_canonical_id,
                b.relation_type.as_str(),
            ))
        });
        *self.relations.write().unwrap_or_else(|e| e.into_inner()) = sorted;
        Ok(())
    }

    fn fetch_relations(&self) -> CoreResult<Vec<Relation>> {
        Ok(self.relations.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}
