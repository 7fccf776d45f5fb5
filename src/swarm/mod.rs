//! Swarm Engine
//!
//! Snapshot-based stepping of a heterogeneous flock on a periodic square
//! domain. Agent state lives in the registry; everything an agent reads during
//! a tick comes from the immutable start-of-tick [`Snapshot`].

pub mod control;
pub mod engine;
pub mod geometry;
pub mod metrics;
pub mod sink;
pub mod snapshot;

pub use control::{Change, ControlCommand, ControlHandle, Target};
pub use engine::{Engine, EngineState, DEFAULT_RECORDED_STEPS};
pub use geometry::{BlindList, RelativeField};
pub use metrics::{polarization, PopulationMetrics};
pub use sink::{DataSink, JsonLinesSink, MemorySink, SnapshotRow};
pub use snapshot::Snapshot;
