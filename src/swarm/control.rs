//! Live Reconfiguration
//!
//! A control front-end (sliders, buttons, a script) queues parameter changes
//! through a [`ControlHandle`]. The engine drains the whole queue between
//! ticks, so a tick sees either none or all of the changes queued before it.

use crate::core::agent::BehaviorKind;
use crate::core::error::{FlockError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Which agents a change applies to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    #[default]
    All,
    Cohort(String),
}

/// A single parameter change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// Forward speed (also the base speed for speed modulation).
    Speed(f64),
    /// Perception noise `sigma_in`.
    PerceptionNoise(f64),
    /// Motion noise `sigma_out`.
    MotionNoise(f64),
    /// Vicsek interaction radius.
    Radius(f64),
    /// One perceptron weight.
    Weight { slice: usize, value: f64 },
    /// Full perceptron weight vector.
    Weights(Vec<f64>),
    /// Perceptron slice offset `delta`.
    SliceOffset(f64),
    /// Zero all perceptron weights.
    ResetWeights,
    /// Behavior given to agents added from now on.
    ActiveBehavior(BehaviorKind),
    /// Re-draw positions and headings uniformly.
    Shuffle,
}

impl Change {
    /// Value-level checks that do not depend on any agent.
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(FlockError::invalid(format!("{name} must be finite and >= 0, got {v}")))
            }
        };
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(FlockError::invalid(format!("{name} must be finite, got {v}")))
            }
        };

        match self {
            Change::Speed(v) => non_negative("speed", *v),
            Change::PerceptionNoise(s) => non_negative("sigma_in", *s),
            Change::MotionNoise(s) => non_negative("sigma_out", *s),
            Change::Radius(r) => non_negative("radius", *r),
            Change::Weight { value, .. } => finite("weight", *value),
            Change::Weights(ws) => ws.iter().try_for_each(|w| finite("weight", *w)),
            Change::SliceOffset(d) => finite("delta", *d),
            Change::ResetWeights | Change::ActiveBehavior(_) | Change::Shuffle => Ok(()),
        }
    }
}

/// A change plus the agents it targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub target: Target,
    pub change: Change,
}

impl ControlCommand {
    pub fn all(change: Change) -> Self {
        ControlCommand {
            target: Target::All,
            change,
        }
    }

    pub fn cohort(name: impl Into<String>, change: Change) -> Self {
        ControlCommand {
            target: Target::Cohort(name.into()),
            change,
        }
    }
}

/// Thread-safe queue of pending commands. Clones share the same queue.
#[derive(Clone, Debug, Default)]
pub struct ControlHandle {
    queue: Arc<Mutex<VecDeque<ControlCommand>>>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command; invalid values are rejected here, not at apply time.
    pub fn send(&self, command: ControlCommand) -> Result<()> {
        command.change.validate()?;
        self.queue.lock().push_back(command);
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Take every queued command in FIFO order under a single lock.
    pub(crate) fn drain(&self) -> Vec<ControlCommand> {
        self.queue.lock().drain(..).collect()
    }
}
