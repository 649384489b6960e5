//! 记忆提供者实现：基于存储的关系 / 状态提供者，以及向量检索的空实现与关键词索引

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use super::contracts::{RelationProvider, StateProvider, VectorHit, VectorSearchProvider};
use crate::core::{CanonicalRecord, CoreResult};
use crate::graph::Relation;
use crate::state::{StateEngine, StateSnapshot};
use crate::storage::MemoryStore;

/// 从存储读取关系，按端点过滤
pub struct StoreRelationProvider {
    store: Arc<dyn MemoryStore>,
}

impl StoreRelationProvider {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

impl RelationProvider for StoreRelationProvider {
    fn get_relations(&self, canonical_ids: &[String]) -> CoreResult<Vec<Relation>> {
        let relations = self.store.fetch_relations()?;
        if canonical_ids.is_empty() {
            tracing::debug!(
                relations = relations.len(),
                "no canonical ids requested, returning full relation set"
            );
            return Ok(relations);
        }
        let wanted: HashSet<&str> = canonical_ids.iter().map(String::as_str).collect();
        Ok(relations
            .into_iter()
            .filter(|r| {
                wanted.contains(r.from_canonical_id.as_str())
                    || wanted.contains(r.to_canonical_id.as_str())
            })
            .collect())
    }
}

/// 每次请求都从存储重新计算状态
pub struct StoreStateProvider {
    store: Arc<dyn MemoryStore>,
    engine: StateEngine,
}

impl StoreStateProvider {
    pub fn new(store: Arc<dyn MemoryStore>, engine: StateEngine) -> Self {
        Self { store, engine }
    }
}

impl StateProvider for StoreStateProvider {
    fn get_state(&self) -> CoreResult<StateSnapshot> {
        self.engine.calculate_from_store(self.store.as_ref(), None)
    }
}

/// 未配置向量索引时使用：永远返回空
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVectorSearch;

impl VectorSearchProvider for NullVectorSearch {
    fn search(&self, _text: &str, _top_k: usize) -> Vec<VectorHit> {
        Vec::new()
    }
}

/// 小写词集合；单字符词不计
fn tokenize_lower(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 1)
        .collect()
}

/// 内存关键词索引：对记录的检索文本（不含字段标签）做词重叠打分
///
/// score = 重叠词数 / 查询词数，按分数降序，并列按 canonical_id 升序；重复索引同一 ID 覆盖旧文本。
#[derive(Debug, Default, Clone)]
pub struct KeywordVectorIndex {
    docs: Arc<RwLock<BTreeMap<String, HashSet<String>>>>,
}

impl KeywordVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let index = Self::new();
        index.index_records(records);
        index
    }

    pub fn index_records(&self, records: &[CanonicalRecord]) {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        for record in records {
            docs.insert(
                record.canonical_id().to_string(),
                tokenize_lower(&record.search_text()),
            );
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VectorSearchProvider for KeywordVectorIndex {
    fn search(&self, text: &str, top_k: usize) -> Vec<VectorHit> {
        let query = tokenize_lower(text);
        if query.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<VectorHit> = docs
            .iter()
            .filter_map(|(id, tokens)| {
                let overlap = query.intersection(tokens).count();
                (overlap > 0).then(|| VectorHit {
                    canonical_id: id.clone(),
                    score: overlap as f64 / query.len() as f64,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        hits.truncate(top_k);
        hits
    }
}
