//! 关系边类型定义

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::stable_digest_id;

/// 规则推断边的固定置信度
pub const RULE_CONFIDENCE: f64 = 1.0;

/// 关系类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// 锚点落在同一 UTC 日
    SameDay,
    /// 共享至少一个人物
    SamePerson,
    /// 领域相同
    SameDomain,
    /// 7 天内、有共同人物或领域的先后关系（有向）
    FollowUp,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::SameDay => "SAME_DAY",
            RelationType::SamePerson => "SAME_PERSON",
            RelationType::SameDomain => "SAME_DOMAIN",
            RelationType::FollowUp => "FOLLOW_UP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "SAME_DAY" => Some(RelationType::SameDay),
            "SAME_PERSON" => Some(RelationType::SamePerson),
            "SAME_DOMAIN" => Some(RelationType::SameDomain),
            "FOLLOW_UP" => Some(RelationType::FollowUp),
            _ => None,
        }
    }

    /// 只有 FOLLOW_UP 有方向
    pub fn is_directed(&self) -> bool {
        matches!(self, RelationType::FollowUp)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 两条记录之间可解释的关系边
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relation_id: String,
    pub from_canonical_id: String,
    pub to_canonical_id: String,
    pub relation_type: RelationType,
    /// 证据，例如 `anchor_day=2026-02-26`、`people=sam@example.com`
    pub reason: String,
    pub confidence: f64,
    /// 入库时间，仅由存储层填充；不参与 relation_id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Relation {
    /// 规则边：无向类型自动按字典序排列端点
    pub fn new(
        from_id: &str,
        to_id: &str,
        relation_type: RelationType,
        reason: impl Into<String>,
    ) -> Self {
        let (from_id, to_id) = if relation_type.is_directed() || from_id <= to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };
        let reason = reason.into();
        Self {
            relation_id: make_relation_id(from_id, to_id, relation_type, &reason),
            from_canonical_id: from_id.to_string(),
            to_canonical_id: to_id.to_string(),
            relation_type,
            reason,
            confidence: RULE_CONFIDENCE,
            created_at: None,
        }
    }

    /// 去重键 (from, to, type)
    pub fn key(&self) -> (String, String, RelationType) {
        (
            self.from_canonical_id.clone(),
            self.to_canonical_id.clone(),
            self.relation_type,
        )
    }

    pub fn touches(&self, canonical_id: &str) -> bool {
        self.from_canonical_id == canonical_id || self.to_canonical_id == canonical_id
    }
}

/// relation_id = `rel_` + SHA-256(键排序 JSON{from, to, type, reason}) 前 24 位
pub fn make_relation_id(
    from_id: &str,
    to_id: &str,
    relation_type: RelationType,
    reason: &str,
) -> String {
    let fields = BTreeMap::from([
        ("from_canonical_id", from_id),
        ("to_canonical_id", to_id),
        ("relation_type", relation_type.as_str()),
        ("reason", reason),
    ]);
    stable_digest_id("rel_", &fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undirected_endpoints_are_ordered() {
        let a = Relation::new("co_b", "co_a", RelationType::SameDay, "anchor_day=2026-02-26");
        let b = Relation::new("co_a", "co_b", RelationType::SameDay, "anchor_day=2026-02-26");
        assert_eq!(a, b);
        assert_eq!(a.from_canonical_id, "co_a");
    }

    #[test]
    fn test_follow_up_keeps_direction() {
        let rel = Relation::new("co_b", "co_a", RelationType::FollowUp, "delta_hours=4.00");
        assert_eq!(rel.from_canonical_id, "co_b");
        assert_eq!(rel.to_canonical_id, "co_a");
    }

    #[test]
    fn test_relation_type_wire_names() {
        for ty in [
            RelationType::SameDay,
            RelationType::SamePerson,
            RelationType::SameDomain,
            RelationType::FollowUp,
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            assert_eq!(RelationType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(RelationType::parse("SIBLING"), None);
    }

    #[test]
    fn test_relation_id_depends_on_reason() {
        let a = make_relation_id("co_a", "co_b", RelationType::SameDomain, "domain=work");
        let b = make_relation_id("co_a", "co_b", RelationType::SameDomain, "domain=home");
        assert_ne!(a, b);
        assert!(a.starts_with("rel_"));
    }
}
