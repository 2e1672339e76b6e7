pub mod config;
pub mod error;
pub mod classifier;
pub mod intent;
pub mod extract;
pub mod planner;
pub mod snapshot;
pub mod stores;
pub mod executor;
pub mod orchestrator;

// Re-export the entry points
pub use config::AssistantConfig;
pub use orchestrator::{Assistant, AssistantRequest, AssistantResponse};
