//! Agent Registry
//!
//! Owns the ordered agent list and the cohorts (named groups of indices).
//! Agents are only appended; an agent's index is its identifier and is what
//! blind lists refer to.

use crate::core::agent::{Agent, Pose};
use crate::core::config::{CohortSpec, DensityConfig};
use crate::core::error::{FlockError, Result};
use crate::swarm::control::Target;
use crate::swarm::geometry::BlindList;
use crate::swarm::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;
use std::ops::Range;
use std::sync::Arc;
use tracing::info;

/// Initial placement policy for a batch of agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Uniform positions in the domain, uniform headings in `[0, 2π)`.
    #[default]
    Random,
    /// Cell centers of a `⌈√n⌉ × ⌈√n⌉` grid spanning the domain, heading 0.
    Grid,
}

#[derive(Clone, Debug, Default)]
struct Cohort {
    members: Vec<usize>,
    blinded: bool,
}

/// Grid placement for `count` agents on a square domain of side `side`.
///
/// Agent `k` goes to cell `(k / a, k % a)` with `a = ⌈√count⌉`, at the cell
/// center `((i + ½)·d, (j + ½)·d)`, `d = side / a`.
pub fn grid_poses(count: usize, side: f64) -> Vec<Pose> {
    if count == 0 {
        return Vec::new();
    }
    let a = (count as f64).sqrt().ceil() as usize;
    let d = side / a as f64;
    (0..count)
        .map(|k| {
            let i = k / a;
            let j = k % a;
            Pose {
                x: (i as f64 + 0.5) * d,
                y: (j as f64 + 0.5) * d,
                a: 0.0,
            }
        })
        .collect()
}

/// Uniform random pose in the domain.
pub fn random_pose<R: Rng + ?Sized>(rng: &mut R, side: f64) -> Pose {
    Pose {
        x: rng.gen_range(0.0..side),
        y: rng.gen_range(0.0..side),
        a: rng.gen_range(0.0..TAU),
    }
}

/// Ordered collection of agents plus cohort bookkeeping.
#[derive(Clone, Debug)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    cohorts: BTreeMap<String, Cohort>,
    side: f64,
    density: DensityConfig,
}

impl AgentRegistry {
    pub fn new(side: f64, density: DensityConfig) -> Self {
        AgentRegistry {
            agents: Vec::new(),
            cohorts: BTreeMap::new(),
            side,
            density,
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access for dispatch. The slice cannot grow or shrink.
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn get(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    /// Member indices of a cohort, in creation order.
    pub fn cohort(&self, name: &str) -> Option<&[usize]> {
        self.cohorts.get(name).map(|c| c.members.as_slice())
    }

    pub fn cohort_names(&self) -> impl Iterator<Item = &str> {
        self.cohorts.keys().map(String::as_str)
    }

    /// Create `spec.count` agents and return their index range.
    ///
    /// Every agent is built before anything is inserted, so an invalid cohort
    /// leaves the registry untouched. Each agent gets its own RNG seeded
    /// from `rng`.
    pub fn add(&mut self, spec: &CohortSpec, rng: &mut StdRng) -> Result<Range<usize>> {
        spec.validate()?;

        let start = self.agents.len();
        let ids = start..start + spec.count;

        let poses: Vec<Pose> = match spec.layout {
            Layout::Grid => grid_poses(spec.count, self.side),
            Layout::Random => (0..spec.count).map(|_| random_pose(rng, self.side)).collect(),
        };

        let mut batch = Vec::with_capacity(spec.count);
        for (id, pose) in ids.clone().zip(poses) {
            let agent_rng = StdRng::seed_from_u64(rng.gen());
            let mut agent = Agent::new(
                id,
                spec.kind,
                &spec.params,
                pose,
                self.density.clone(),
                agent_rng,
            )?;
            if let Some((lo, hi)) = spec.damax_range {
                let damax = if hi > lo { rng.gen_range(lo..hi) } else { lo };
                agent.set_damax(damax);
            }
            batch.push(agent);
        }
        self.agents.extend(batch);

        let name = spec.cohort_name();
        let cohort = self.cohorts.entry(name.clone()).or_default();
        cohort.members.extend(ids.clone());
        cohort.blinded |= spec.blinding;
        if cohort.blinded {
            let members: Arc<BTreeSet<usize>> = Arc::new(cohort.members.iter().copied().collect());
            for &i in &cohort.members {
                self.agents[i].set_blindlist(BlindList::for_member(members.clone(), i));
            }
        }

        info!(
            "[Registry] Added {} {} agents ({}){}",
            spec.count,
            spec.kind,
            name,
            if spec.blinding { ", blinded" } else { "" }
        );
        Ok(ids)
    }

    /// Positions and headings of every agent, in registration order.
    pub fn compile(&self) -> Snapshot {
        Snapshot::from_poses(self.agents.iter().map(Agent::pose), self.side)
    }

    /// Indices addressed by a control target.
    pub fn resolve(&self, target: &Target) -> Result<Vec<usize>> {
        match target {
            Target::All => Ok((0..self.agents.len()).collect()),
            Target::Cohort(name) => self
                .cohort(name)
                .map(<[usize]>::to_vec)
                .ok_or_else(|| FlockError::UnknownCohort(name.clone())),
        }
    }

    /// Re-draw positions and headings of the given agents.
    pub fn shuffle(&mut self, indices: &[usize], rng: &mut StdRng) {
        for &i in indices {
            let pose = random_pose(rng, self.side);
            if let Some(agent) = self.agents.get_mut(i) {
                agent.set_pose(pose);
            }
        }
    }
}
