//! Flocking Core v0.3.0 - Collective Motion Simulation
//!
//! Self-propelled agents on a periodic square domain, stepped in discrete
//! ticks. Every tick the engine captures one immutable [`Snapshot`] of all
//! positions and headings; each agent then perceives that snapshot from its
//! own frame and moves, so per-agent updates are independent and can run in
//! parallel.
//!
//! Three behaviors share one update contract:
//! - **Blind**: uncorrelated random walk.
//! - **Vicsek**: align with the circular mean heading within a radius.
//! - **Perceptron**: steer from weighted, inverse-distance slice densities.
//!
//! ```no_run
//! use flocking_core::{AgentParams, BehaviorKind, CohortSpec, Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig { steps: Some(100), seed: Some(1), ..Default::default() })?;
//! engine.add_cohort(&CohortSpec::new(BehaviorKind::Vicsek, 300).with_params(AgentParams {
//!     r: 0.1,
//!     sigma_out: 0.05,
//!     ..Default::default()
//! }))?;
//! engine.run()?;
//! println!("polarization: {:.3}", engine.metrics().polarization);
//! # Ok::<(), flocking_core::FlockError>(())
//! ```

pub mod core;
pub mod swarm;

#[cfg(feature = "python")]
mod py_api;

pub use crate::core::agent::{Agent, Behavior, BehaviorKind, Density, Pose};
pub use crate::core::config::{AgentParams, CohortSpec, DensityConfig, EngineConfig, ScenarioConfig};
pub use crate::core::error::{FlockError, Result};
pub use crate::core::registry::{AgentRegistry, Layout};
pub use crate::swarm::{
    Change, ControlCommand, ControlHandle, DataSink, Engine, EngineState, JsonLinesSink,
    MemorySink, PopulationMetrics, Snapshot, Target,
};

/// Initialize tracing for the library. Safe to call more than once.
pub fn setup_logging(level: Option<&str>) {
    let filter = level.unwrap_or("info");
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
