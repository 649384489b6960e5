//! 认知周期：重建关系图 → 计算状态 → 派发 RELATION_GRAPH_UPDATED 事件
//!
//! 把三个核心层串成一次完整执行，每一层都经过 observability::timed 记录耗时。

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::agents::{
    event_types, AgentMesh, FollowUpPlannerAgent, KeywordVectorIndex, MemoryContextAgent,
    StoreRelationProvider, StoreStateProvider,
};
use crate::config::AppConfig;
use crate::core::CoreResult;
use crate::graph::RelationEngine;
use crate::observability::timed;
use crate::state::{StateEngine, StateSnapshot};
use crate::storage::MemoryStore;
use crate::tools::ToolRegistry;

pub const CYCLE_QUERY: &str = "follow up priorities";

/// 一次认知周期的汇总
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub run_id: String,
    pub relation_count: usize,
    pub state: StateSnapshot,
    pub outcome_count: usize,
    /// "agent: note"
    pub notes: Vec<String>,
}

pub struct CognitiveCycle {
    relation_engine: RelationEngine,
    state_engine: StateEngine,
}

impl CognitiveCycle {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            relation_engine: RelationEngine::default(),
            state_engine: StateEngine::new(config.state),
        }
    }

    pub fn run(
        &self,
        store: Arc<dyn MemoryStore>,
        tools: ToolRegistry,
        config: &AppConfig,
    ) -> CoreResult<CycleReport> {
        let run_id = Uuid::new_v4().to_string();
        let records = timed("storage", "fetch_records", || store.fetch_records())?;

        let relation_count = timed("graph", "rebuild_relations", || {
            self.relation_engine
                .rebuild_and_store(store.as_ref(), Some(&records))
        })?;

        let state = timed("state", "calculate", || {
            self.state_engine.calculate_from_store(store.as_ref(), None)
        })?;

        let mesh = AgentMesh::new(
            Arc::new(StoreRelationProvider::new(store.clone())),
            Arc::new(KeywordVectorIndex::from_records(&records)),
            Arc::new(StoreStateProvider::new(store.clone(), self.state_engine.clone())),
            tools,
        )
        .with_vector_top_k(config.mesh.vector_top_k)
        .with_agent(FollowUpPlannerAgent)
        .with_agent(MemoryContextAgent);

        let ids: Vec<&str> = records
            .iter()
            .take(config.mesh.cycle_id_limit)
            .map(|r| r.canonical_id())
            .collect();
        let event = AgentMesh::make_event(
            event_types::RELATION_GRAPH_UPDATED,
            json!({"canonical_ids": ids, "query": CYCLE_QUERY}),
        );
        let outcomes = timed("agents", "run", || {
            mesh.run(vec![event], config.mesh.max_events)
        })?;

        let notes = outcomes
            .iter()
            .flat_map(|o| o.notes.iter().map(move |n| format!("{}: {}", o.agent_name, n)))
            .collect();

        tracing::info!(
            run_id = %run_id,
            records = records.len(),
            relations = relation_count,
            outcomes = outcomes.len(),
            "cognitive cycle complete"
        );
        Ok(CycleReport {
            run_id,
            relation_count,
            state,
            outcome_count: outcomes.len(),
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CanonicalRecord;
    use crate::storage::InMemoryStore;
    use crate::tools::build_local_tool_registry;
    use chrono::{Duration, Utc};

    #[test]
    fn test_cycle_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        let report = CognitiveCycle::new(&config)
            .run(
                Arc::new(InMemoryStore::new()),
                build_local_tool_registry(dir.path()).unwrap(),
                &config,
            )
            .unwrap();
        assert_eq!(report.relation_count, 0);
        assert_eq!(report.outcome_count, 2);
        assert!(report
            .notes
            .contains(&"follow_up_planner: No follow-up relations in event scope.".to_string()));
        assert!(report
            .notes
            .contains(&"memory_context_agent: relation_edges=0".to_string()));
        assert!(Uuid::parse_str(&report.run_id).is_ok());
    }

    #[test]
    fn test_cycle_materializes_follow_up_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_records(&[
                CanonicalRecord::builder("co_a", "notes", "note")
                    .title("Roadmap draft")
                    .created_at(now - Duration::hours(5))
                    .domain("work")
                    .build()
                    .unwrap(),
                CanonicalRecord::builder("co_b", "calendar", "event")
                    .title("Roadmap review")
                    .start_at(now - Duration::hours(2))
                    .domain("work")
                    .build()
                    .unwrap(),
            ])
            .unwrap();

        let config = AppConfig::default();
        let report = CognitiveCycle::new(&config)
            .run(store, build_local_tool_registry(dir.path()).unwrap(), &config)
            .unwrap();
        assert!(report.relation_count >= 2);
        assert!(report
            .notes
            .iter()
            .any(|n| n.starts_with("follow_up_planner: Queued")));
        assert!(dir.path().join(crate::tools::create_task::TASKS_FILE).exists());
        assert_eq!(report.state.domain_context, "work");
    }
}
