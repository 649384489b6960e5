//! 关系图：关系边类型与确定性推断引擎

pub mod engine;
pub mod relation;

pub use engine::{build_relations, RelationEngine, FOLLOW_UP_MAX_DAYS};
pub use relation::{make_relation_id, Relation, RelationType, RULE_CONFIDENCE};
