//! Population metrics
//!
//! Order parameters read from a snapshot or from the registry, for logging
//! and for the Python front-end.

use super::snapshot::Snapshot;
use crate::core::registry::AgentRegistry;
use serde::{Deserialize, Serialize};

/// Magnitude of the mean heading unit vector, in `[0, 1]`.
///
/// 1 when every agent points the same way, near 0 for isotropic headings.
/// An empty snapshot has polarization 0.
pub fn polarization(snapshot: &Snapshot) -> f64 {
    if snapshot.is_empty() {
        return 0.0;
    }
    let (s, c) = snapshot
        .a()
        .iter()
        .fold((0.0, 0.0), |(s, c), a| (s + a.sin(), c + a.cos()));
    (s.hypot(c) / snapshot.len() as f64).min(1.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationMetrics {
    pub agents: usize,
    pub polarization: f64,
    pub mean_position_density: f64,
    pub mean_heading_density: f64,
}

impl PopulationMetrics {
    pub fn sample(registry: &AgentRegistry) -> Self {
        let n = registry.len();
        if n == 0 {
            return Self::default();
        }
        let (pos, head) = registry
            .agents()
            .iter()
            .map(|a| a.density())
            .fold((0.0, 0.0), |(p, h), d| (p + d.position, h + d.heading));
        PopulationMetrics {
            agents: n,
            polarization: polarization(&registry.compile()),
            mean_position_density: pos / n as f64,
            mean_heading_density: head / n as f64,
        }
    }
}
