//! 内置 Agent：跟进规划与记忆上下文

use serde_json::json;

use super::contracts::{event_types, Agent, AgentContext, AgentEvent, AgentOutcome};
use crate::graph::RelationType;
use crate::tools::{ToolCall, CREATE_TASK_TOOL};

/// 把上下文中的每条 FOLLOW_UP 边转成一次 create_task 调用
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowUpPlannerAgent;

impl FollowUpPlannerAgent {
    pub const NAME: &'static str = "follow_up_planner";
}

impl Agent for FollowUpPlannerAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handles(&self, event: &AgentEvent) -> bool {
        matches!(
            event.event_type.as_str(),
            event_types::RELATION_GRAPH_UPDATED | event_types::FOLLOW_UP_TRIGGERED
        )
    }

    fn handle(&self, _event: &AgentEvent, context: &AgentContext) -> AgentOutcome {
        let outcome = AgentOutcome::new(Self::NAME);
        let edges: Vec<_> = context
            .related_relations
            .iter()
            .filter(|r| r.relation_type == RelationType::FollowUp)
            .collect();
        if edges.is_empty() {
            return outcome.with_note("No follow-up relations in event scope.");
        }
        if !context.has_tool(CREATE_TASK_TOOL) {
            return outcome
                .with_note("create_task tool unavailable; follow-up actions not materialized.");
        }

        let domain = &context.user_state.domain_context;
        let tool_calls: Vec<ToolCall> = edges
            .iter()
            .map(|r| {
                ToolCall::new(
                    CREATE_TASK_TOOL,
                    json!({
                        "title": format!("Follow up: {} -> {}", r.from_canonical_id, r.to_canonical_id),
                        "details": r.reason,
                        "domain": domain,
                    }),
                )
            })
            .collect();
        let note = format!(
            "Queued {} deterministic follow-up task(s).",
            tool_calls.len()
        );
        AgentOutcome {
            tool_calls,
            ..outcome
        }
        .with_note(note)
    }
}

/// 只报告上下文规模，无副作用
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryContextAgent;

impl MemoryContextAgent {
    pub const NAME: &'static str = "memory_context_agent";
}

impl Agent for MemoryContextAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handles(&self, event: &AgentEvent) -> bool {
        matches!(
            event.event_type.as_str(),
            event_types::MEMORY_QUERY
                | event_types::RELATION_GRAPH_UPDATED
                | event_types::STATE_RECALCULATED
        )
    }

    fn handle(&self, _event: &AgentEvent, context: &AgentContext) -> AgentOutcome {
        AgentOutcome::new(Self::NAME)
            .with_note(format!("vector_hits={}", context.vector_hits.len()))
            .with_note(format!("relation_edges={}", context.related_relations.len()))
            .with_note(format!("state_domain={}", context.user_state.domain_context))
            .with_note(format!(
                "stress_probability={:.3}",
                context.user_state.stress_probability
            ))
    }
}
