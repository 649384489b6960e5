//! 关系推断引擎
//!
//! 对记录集合两两比较（O(n²)，个人规模的语料可以接受），按四条独立规则产出可解释的边：
//! - SAME_DAY：锚点 UTC 日期相同
//! - SAME_PERSON：人物（去空白、小写）有交集
//! - SAME_DOMAIN：领域非空且相同（忽略大小写）
//! - FOLLOW_UP：先 → 后，0 < Δt ≤ 7 天，且共享人物或领域；仅时间接近不成立
//!
//! 结果按 (from, to, type) 去重并排序，同样的输入永远得到逐字节相同的输出。
//! 关系完全可推导：重建时整体替换，不做增量合并。

use std::collections::BTreeMap;

use chrono::Duration;

use crate::core::{CanonicalRecord, CoreResult};
use crate::graph::relation::{Relation, RelationType};
use crate::storage::MemoryStore;

/// FOLLOW_UP 的最大时间跨度
pub const FOLLOW_UP_MAX_DAYS: i64 = 7;

/// 无状态的关系推断引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationEngine;

impl RelationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成完整、确定、可解释的关系边集合
    pub fn build(&self, records: &[CanonicalRecord]) -> Vec<Relation> {
        // 同一 ID 的多个版本只保留最后一个（后写者胜）
        let latest: Vec<&CanonicalRecord> = records
            .iter()
            .map(|r| (r.canonical_id(), r))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect();

        let mut dedup: BTreeMap<(String, String, &'static str), Relation> = BTreeMap::new();
        for (idx, a) in latest.iter().enumerate() {
            for b in &latest[idx + 1..] {
                for relation in pair_relations(a, b) {
                    let key = (
                        relation.from_canonical_id.clone(),
                        relation.to_canonical_id.clone(),
                        relation.relation_type.as_str(),
                    );
                    dedup.insert(key, relation);
                }
            }
        }
        dedup.into_values().collect()
    }

    /// 重建并整体替换存储中的关系；`records` 为 None 时从存储读取全部记录
    pub fn rebuild_and_store(
        &self,
        store: &dyn MemoryStore,
        records: Option<&[CanonicalRecord]>,
    ) -> CoreResult<usize> {
        let fetched;
        let source = match records {
            Some(records) => records,
            None => {
                fetched = store.fetch_records()?;
                &fetched
            }
        };
        let relations = self.build(source);
        store.replace_relations(&relations)?;
        tracing::info!(
            records = source.len(),
            relations = relations.len(),
            "relation graph rebuilt"
        );
        Ok(relations.len())
    }
}

/// 一对记录按四条规则分别求值，可能产出 0~4 条边
fn pair_relations(a: &CanonicalRecord, b: &CanonicalRecord) -> Vec<Relation> {
    let mut relations = Vec::new();
    let (id_a, id_b) = (a.canonical_id(), b.canonical_id());

    if let (Some(day_a), Some(day_b)) = (a.anchor_day(), b.anchor_day()) {
        if day_a == day_b {
            relations.push(Relation::new(
                id_a,
                id_b,
                RelationType::SameDay,
                format!("anchor_day={}", day_a.format("%Y-%m-%d")),
            ));
        }
    }

    let shared_people: Vec<String> = a
        .normalized_people()
        .intersection(&b.normalized_people())
        .cloned()
        .collect();
    if !shared_people.is_empty() {
        relations.push(Relation::new(
            id_a,
            id_b,
            RelationType::SamePerson,
            format!("people={}", shared_people.join(",")),
        ));
    }

    let domain_a = a.normalized_domain();
    let domain_match = !domain_a.is_empty() && domain_a == b.normalized_domain();
    if domain_match {
        relations.push(Relation::new(
            id_a,
            id_b,
            RelationType::SameDomain,
            format!("domain={domain_a}"),
        ));
    }

    if let (Some(time_a), Some(time_b)) = (a.anchor_time(), b.anchor_time()) {
        let ((earlier, earlier_at), (later, later_at)) = if time_a <= time_b {
            ((id_a, time_a), (id_b, time_b))
        } else {
            ((id_b, time_b), (id_a, time_a))
        };
        let delta = later_at - earlier_at;
        let shared_context = !shared_people.is_empty() || domain_match;
        if delta > Duration::zero() && delta <= Duration::days(FOLLOW_UP_MAX_DAYS) && shared_context
        {
            let hours = delta.num_milliseconds() as f64 / 3_600_000.0;
            relations.push(Relation::new(
                earlier,
                later,
                RelationType::FollowUp,
                format!("delta_hours={hours:.2}"),
            ));
        }
    }

    relations
}

/// 便捷函数：等价于 `RelationEngine.build(records)`
pub fn build_relations(records: &[CanonicalRecord]) -> Vec<Relation> {
    RelationEngine.build(records)
}
