//! Behavior logging with AI-derived analysis.

pub mod model;
pub mod routes;

pub use model::{
    BehaviorAnalysis, BehaviorLogEntry, BehaviorLogRequest, BehaviorLogStore, ChildProfile,
    ChildProfileStore, InMemoryBehaviorLog, InMemoryChildProfiles,
};
pub use routes::{BehaviorRouteState, behavior_routes};
