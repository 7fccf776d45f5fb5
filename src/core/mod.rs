//! Core types: agents, their configuration, the registry that owns them and
//! the crate-wide error type.

pub mod agent;
pub mod config;
pub mod error;
pub mod registry;

pub use agent::{Agent, Behavior, BehaviorKind, Density, Perception, Perceptron, Pose};
pub use config::{AgentParams, CohortSpec, DensityConfig, EngineConfig, ScenarioConfig};
pub use error::{FlockError, Result};
pub use registry::{AgentRegistry, Layout};
