//! AgentMesh：单线程、事件驱动的 Agent 调度器
//!
//! dispatch 为单个事件组装上下文（状态 / 相关关系 / 向量命中 / 可用工具），按注册顺序调用匹配的 Agent，
//! 再按请求顺序同步执行每个工具调用。run 用本地 FIFO 队列处理级联事件，max_events 为硬上限。

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;

use super::contracts::{
    Agent, AgentContext, AgentEvent, AgentOutcome, RelationProvider, StateProvider,
    VectorSearchProvider,
};
use crate::core::CoreResult;
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_EVENTS: usize = 50;
pub const DEFAULT_VECTOR_TOP_K: usize = 5;

pub struct AgentMesh {
    relation_provider: Arc<dyn RelationProvider>,
    vector_provider: Arc<dyn VectorSearchProvider>,
    state_provider: Arc<dyn StateProvider>,
    tools: ToolRegistry,
    agents: Vec<Box<dyn Agent>>,
    vector_top_k: usize,
}

impl AgentMesh {
    pub fn new(
        relation_provider: Arc<dyn RelationProvider>,
        vector_provider: Arc<dyn VectorSearchProvider>,
        state_provider: Arc<dyn StateProvider>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            relation_provider,
            vector_provider,
            state_provider,
            tools,
            agents: Vec::new(),
            vector_top_k: DEFAULT_VECTOR_TOP_K,
        }
    }

    pub fn with_vector_top_k(mut self, top_k: usize) -> Self {
        self.vector_top_k = top_k;
        self
    }

    /// 按注册顺序追加 Agent
    pub fn register(&mut self, agent: impl Agent + 'static) {
        tracing::debug!(agent = agent.name(), "agent registered");
        self.agents.push(Box::new(agent));
    }

    pub fn with_agent(mut self, agent: impl Agent + 'static) -> Self {
        self.register(agent);
        self
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    /// 以当前时间创建事件
    pub fn make_event(event_type: &str, payload: Value) -> AgentEvent {
        AgentEvent::now(event_type, payload)
    }

    fn build_context(&self, event: &AgentEvent) -> CoreResult<AgentContext> {
        let canonical_ids = event.canonical_ids();
        let query = event.query_text();
        let user_state = self.state_provider.get_state()?;
        let related_relations = self.relation_provider.get_relations(&canonical_ids)?;
        let vector_hits = if query.is_empty() {
            Vec::new()
        } else {
            self.vector_provider.search(&query, self.vector_top_k)
        };
        Ok(AgentContext {
            user_state,
            related_relations,
            vector_hits,
            available_tools: self.tools.list_tools(),
        })
    }

    /// 处理单个事件；提供者错误直接上抛，工具失败记录在结果中
    pub fn dispatch(&self, event: &AgentEvent) -> CoreResult<Vec<AgentOutcome>> {
        let context = self.build_context(event)?;
        tracing::debug!(
            event_type = %event.event_type,
            relations = context.related_relations.len(),
            vector_hits = context.vector_hits.len(),
            "dispatching event"
        );

        let mut outcomes = Vec::new();
        for agent in self.agents.iter().filter(|a| a.handles(event)) {
            let draft = agent.handle(event, &context);
            let tool_results = draft
                .tool_calls
                .iter()
                .map(|call| self.tools.execute(call))
                .collect();
            tracing::debug!(
                agent = agent.name(),
                tool_calls = draft.tool_calls.len(),
                emitted = draft.emitted_events.len(),
                "agent handled event"
            );
            outcomes.push(AgentOutcome {
                tool_results,
                ..draft
            });
        }
        Ok(outcomes)
    }

    /// 处理种子事件及其级联事件，最多 max_events 次 dispatch
    pub fn run(
        &self,
        seed_events: impl IntoIterator<Item = AgentEvent>,
        max_events: usize,
    ) -> CoreResult<Vec<AgentOutcome>> {
        let mut queue: VecDeque<AgentEvent> = seed_events.into_iter().collect();
        let mut outcomes = Vec::new();
        let mut processed = 0usize;

        while processed < max_events {
            let Some(event) = queue.pop_front() else {
                break;
            };
            for outcome in self.dispatch(&event)? {
                queue.extend(outcome.emitted_events.iter().cloned());
                outcomes.push(outcome);
            }
            processed += 1;
        }

        if !queue.is_empty() {
            tracing::warn!(
                max_events,
                dropped = queue.len(),
                "event ceiling reached, remaining events dropped"
            );
        }
        tracing::info!(processed, outcomes = outcomes.len(), "agent mesh run finished");
        Ok(outcomes)
    }
}
