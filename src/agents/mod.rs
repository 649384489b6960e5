//! Agent 层：事件契约、调度器、内置 Agent 与记忆提供者

pub mod builtin;
pub mod contracts;
pub mod mesh;
pub mod providers;

pub use builtin::{FollowUpPlannerAgent, MemoryContextAgent};
pub use contracts::{
    event_types, Agent, AgentContext, AgentEvent, AgentOutcome, RelationProvider, StateProvider,
    VectorHit, VectorSearchProvider,
};
pub use mesh::{AgentMesh, DEFAULT_MAX_EVENTS, DEFAULT_VECTOR_TOP_K};
pub use providers::{
    KeywordVectorIndex, NullVectorSearch, StoreRelationProvider, StoreStateProvider,
};
