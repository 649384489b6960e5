//! 认知核心集成测试：关系推断 → 状态评分 → Agent 调度

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use cortona::agents::{
        event_types, AgentMesh, FollowUpPlannerAgent, MemoryContextAgent, NullVectorSearch,
        StoreRelationProvider, StoreStateProvider,
    };
    use cortona::config::AppConfig;
    use cortona::core::CanonicalRecord;
    use cortona::cycle::CognitiveCycle;
    use cortona::graph::{RelationEngine, RelationType};
    use cortona::state::{StateEngine, StateEngineConfig};
    use cortona::storage::{InMemoryStore, MemoryStore, SqliteStore};
    use cortona::tools::{build_local_tool_registry, ToolRegistry, ToolResult};
    use serde_json::{json, Value};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap()
    }

    /// 同一天、同一人（sam）、同一领域（work）的笔记 / 日程 / 提醒
    fn sam_work_records() -> Vec<CanonicalRecord> {
        vec![
            CanonicalRecord::from_source("apple_notes", "note", "n-1")
                .title("Roadmap notes")
                .created_at(at(26, 9))
                .person("sam")
                .domain("work")
                .build()
                .unwrap(),
            CanonicalRecord::from_source("calendar", "event", "e-1")
                .title("Roadmap review")
                .start_at(at(26, 15))
                .end_at(at(26, 16))
                .person("Sam")
                .domain("Work")
                .build()
                .unwrap(),
            CanonicalRecord::from_source("reminders", "reminder", "r-1")
                .title("Send roadmap summary")
                .due_at(at(27, 10))
                .person("sam")
                .domain("work")
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_sam_work_scenario_produces_every_relation_type() {
        let relations = RelationEngine.build(&sam_work_records());
        for ty in [
            RelationType::SameDay,
            RelationType::SamePerson,
            RelationType::SameDomain,
            RelationType::FollowUp,
        ] {
            assert!(
                relations.iter().any(|r| r.relation_type == ty),
                "missing {ty}"
            );
        }
    }

    #[test]
    fn test_state_from_scenario_is_bounded() {
        let records = sam_work_records();
        let relations = RelationEngine.build(&records);
        let snapshot = StateEngine::new(StateEngineConfig::default()).calculate(
            &records,
            &relations,
            Some(at(27, 12)),
        );
        assert_eq!(snapshot.features.recent_record_count, 3);
        assert_eq!(snapshot.features.overdue_reminder_count, 1);
        assert_eq!(snapshot.domain_context, "work");
        assert!((0.0..=100.0).contains(&snapshot.energy_level));
        assert!((0.0..=1.0).contains(&snapshot.stress_probability));
        assert!((0.0..=100.0).contains(&snapshot.focus_index));
        assert!((0.0..=100.0).contains(&snapshot.execution_velocity));
    }

    #[test]
    fn test_planner_through_store_backed_mesh() {
        let store = Arc::new(InMemoryStore::new());
        let records = sam_work_records();
        store.upsert_records(&records).unwrap();
        RelationEngine.rebuild_and_store(store.as_ref(), None).unwrap();
        let follow_ups = store
            .fetch_relations()
            .unwrap()
            .into_iter()
            .filter(|r| r.relation_type == RelationType::FollowUp)
            .count();
        assert!(follow_ups >= 1);

        let mut tools = ToolRegistry::new();
        tools
            .register("create_task", |payload: &Value| {
                ToolResult::success(json!({"title": payload["title"]}))
            })
            .unwrap();

        let mesh = AgentMesh::new(
            Arc::new(StoreRelationProvider::new(store.clone())),
            Arc::new(NullVectorSearch),
            Arc::new(StoreStateProvider::new(
                store.clone(),
                StateEngine::new(StateEngineConfig::default()),
            )),
            tools,
        )
        .with_agent(FollowUpPlannerAgent)
        .with_agent(MemoryContextAgent);

        let event = AgentMesh::make_event(
            event_types::RELATION_GRAPH_UPDATED,
            json!({"canonical_ids": [records[0].canonical_id()]}),
        );
        let outcomes = mesh.run(vec![event], 50).unwrap();
        assert_eq!(outcomes.len(), 2);
        let planner = &outcomes[0];
        assert_eq!(planner.agent_name, "follow_up_planner");
        assert!(!planner.tool_calls.is_empty());
        assert_eq!(planner.tool_calls.len(), planner.tool_results.len());
        assert!(planner.tool_results.iter().all(|r| r.ok));
    }

    #[test]
    fn test_end_to_end_cycle_over_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("cortona.db")).unwrap();
        store.initialize_schema().unwrap();

        let now = Utc::now();
        store
            .upsert_records(&[
                CanonicalRecord::from_source("apple_notes", "note", "n-1")
                    .title("Budget draft")
                    .created_at(now - Duration::hours(6))
                    .person("sam")
                    .build()
                    .unwrap(),
                CanonicalRecord::from_source("calendar", "event", "e-1")
                    .title("Budget sync")
                    .start_at(now - Duration::hours(1))
                    .person("sam")
                    .build()
                    .unwrap(),
            ])
            .unwrap();
        let store: Arc<dyn MemoryStore> = Arc::new(store);

        let mut config = AppConfig::default();
        config.app.data_dir = dir.path().to_path_buf();
        let tools = build_local_tool_registry(&config.app.data_dir).unwrap();
        let report = CognitiveCycle::new(&config)
            .run(store.clone(), tools, &config)
            .unwrap();

        assert_eq!(report.relation_count, store.fetch_relations().unwrap().len());
        assert!(report
            .notes
            .iter()
            .any(|n| n == "follow_up_planner: Queued 1 deterministic follow-up task(s)."));

        let tasks: Vec<Value> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("agent_tasks.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["status"], "pending");
        assert_eq!(tasks[0]["domain"], "general");
    }
}
