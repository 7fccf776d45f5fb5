//! Mobile agents
//!
//! An agent owns its pose, its noise levels, its own random source and one
//! behavior fixed at construction. Each tick it reads only the shared
//! start-of-tick [`Snapshot`] and then moves itself, so agents can be updated
//! in any order, or in parallel, with identical results.

use crate::core::config::{AgentParams, DensityConfig};
use crate::core::error::{FlockError, Result};
use crate::swarm::control::Change;
use crate::swarm::geometry::{wrap, wrap_angle, BlindList, RelativeField};
use crate::swarm::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Below this magnitude the alignment vector has no usable direction.
const ALIGNMENT_EPSILON: f64 = 1e-12;

/// Closed set of behaviors an agent can be built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Uncorrelated random walk.
    #[default]
    #[serde(alias = "blind")]
    Blind,
    /// Velocity alignment with neighbors within `r`.
    #[serde(alias = "vicsek")]
    Vicsek,
    /// Hand-coded radial perceptron steering.
    #[serde(alias = "perceptron")]
    Perceptron,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 3] = [
        BehaviorKind::Blind,
        BehaviorKind::Vicsek,
        BehaviorKind::Perceptron,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorKind::Blind => "Blind",
            BehaviorKind::Vicsek => "Vicsek",
            BehaviorKind::Perceptron => "Perceptron",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorKind {
    type Err = FlockError;

    fn from_str(s: &str) -> Result<Self> {
        BehaviorKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FlockError::UnknownBehavior(s.to_string()))
    }
}

/// Position and heading. Heading is unbounded and read modulo 2π.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub a: f64,
}

/// Local density estimate recorded at the last update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Density {
    /// Gaussian kernel sum over neighbor distances.
    pub position: f64,
    /// Gaussian kernel sum over neighbor bearings.
    pub heading: f64,
}

/// What the agent sensed during its last update. Rebuilt every tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Perception {
    pub neighbors: Vec<usize>,
    pub bearings: Vec<f64>,
    pub distances: Vec<f64>,
    pub features: Vec<f64>,
}

impl Perception {
    fn clear(&mut self) {
        self.neighbors.clear();
        self.bearings.clear();
        self.distances.clear();
        self.features.clear();
    }
}

/// Radial perceptron: inverse-distance density per angular slice, weighted
/// and squashed into a heading change (and optionally a speed factor).
#[derive(Clone, Debug, PartialEq)]
pub struct Perceptron {
    pub weights: Vec<f64>,
    pub speed_weights: Vec<f64>,
    /// Rotation of the slice partition.
    pub delta: f64,
    pub reorient: bool,
    pub renormalize: bool,
}

impl Perceptron {
    pub fn slices(&self) -> usize {
        self.weights.len()
    }

    /// Slice features for the given bearings (in `[0, 2π)`) and distances.
    ///
    /// Slice `k` is the closed interval `[2πk/ns, 2π(k+1)/ns]` shifted by
    /// `delta`, so a bearing landing exactly on an inner boundary is counted
    /// in both neighboring slices.
    pub fn features(&self, bearings: &[f64], distances: &[f64]) -> Vec<f64> {
        let ns = self.slices();
        let mut features = vec![0.0; ns];

        for (&theta, &rho) in bearings.iter().zip(distances) {
            let t = wrap_angle(theta - self.delta);
            for (k, f) in features.iter_mut().enumerate() {
                let lo = TAU * k as f64 / ns as f64;
                let hi = TAU * (k + 1) as f64 / ns as f64;
                if t >= lo && t <= hi {
                    *f += rho.recip();
                }
            }
        }

        if self.renormalize {
            let total: f64 = features.iter().sum();
            if total > 0.0 {
                features.iter_mut().for_each(|f| *f /= total);
            }
        }
        features
    }

    /// Steering output in `(-1, 1)`, scaled by `damax` by the caller.
    pub fn steering(&self, features: &[f64]) -> f64 {
        dot(&self.weights, features).tanh()
    }

    /// Multiplier applied to the base speed; 1 without speed weights.
    pub fn speed_factor(&self, features: &[f64]) -> f64 {
        if self.speed_weights.is_empty() {
            1.0
        } else {
            1.0 + dot(&self.speed_weights, features).tanh()
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Behavior variant with its own parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Behavior {
    Blind,
    Vicsek { radius: f64 },
    Perceptron(Perceptron),
}

impl Behavior {
    /// Factory from the closed kind enumeration. Parameters must already be valid.
    pub fn build(kind: BehaviorKind, params: &AgentParams) -> Self {
        match kind {
            BehaviorKind::Blind => Behavior::Blind,
            BehaviorKind::Vicsek => Behavior::Vicsek { radius: params.r },
            BehaviorKind::Perceptron => Behavior::Perceptron(Perceptron {
                weights: params.weights.clone(),
                speed_weights: params.speed_weights.clone(),
                delta: params.delta,
                reorient: params.reorient,
                renormalize: params.renormalize,
            }),
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Blind => BehaviorKind::Blind,
            Behavior::Vicsek { .. } => BehaviorKind::Vicsek,
            Behavior::Perceptron(_) => BehaviorKind::Perceptron,
        }
    }
}

/// Circular mean of headings, `None` when the unit vectors cancel out.
pub fn circular_mean<I: IntoIterator<Item = f64>>(headings: I) -> Option<f64> {
    let (s, c) = headings
        .into_iter()
        .fold((0.0, 0.0), |(s, c), a| (s + a.sin(), c + a.cos()));
    if s.hypot(c) <= ALIGNMENT_EPSILON {
        None
    } else {
        Some(s.atan2(c))
    }
}

fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return 0.0;
    }
    let z: f64 = rng.sample(StandardNormal);
    sigma * z
}

fn measure_density(
    field: &RelativeField,
    range: f64,
    include_self: bool,
    blind: &BlindList,
    cfg: &DensityConfig,
) -> Density {
    let mut density = Density::default();
    for j in field.near(range, include_self, blind) {
        let d = field.distance(j) / cfg.position_width;
        let b = field.bearing(j) / cfg.angle_width;
        density.position += (-d * d / 2.0).exp();
        density.heading += (-b * b / 2.0).exp();
    }
    density
}

/// One mobile agent.
#[derive(Clone, Debug)]
pub struct Agent {
    id: usize,
    pose: Pose,
    v: f64,
    base_speed: f64,
    sigma_in: f64,
    sigma_out: f64,
    damax: f64,
    range: f64,
    behavior: Behavior,
    blindlist: BlindList,
    density_cfg: DensityConfig,
    density: Density,
    perception: Perception,
    rng: StdRng,
}

impl Agent {
    /// Build an agent; any invalid parameter rejects the whole agent.
    pub fn new(
        id: usize,
        kind: BehaviorKind,
        params: &AgentParams,
        pose: Pose,
        density_cfg: DensityConfig,
        rng: StdRng,
    ) -> Result<Self> {
        params.validate(kind)?;
        density_cfg.validate()?;
        if !(pose.x.is_finite() && pose.y.is_finite() && pose.a.is_finite()) {
            return Err(FlockError::invalid(format!("initial pose must be finite, got {pose:?}")));
        }
        Ok(Agent {
            id,
            pose,
            v: params.v,
            base_speed: params.v,
            sigma_in: params.sigma_in,
            sigma_out: params.sigma_out,
            damax: params.damax,
            range: params.perception_range,
            behavior: Behavior::build(kind, params),
            blindlist: BlindList::none(),
            density_cfg,
            density: Density::default(),
            perception: Perception::default(),
            rng,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn kind(&self) -> BehaviorKind {
        self.behavior.kind()
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Current speed (may differ from the base speed under speed modulation).
    pub fn speed(&self) -> f64 {
        self.v
    }

    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    pub fn sigma_in(&self) -> f64 {
        self.sigma_in
    }

    pub fn sigma_out(&self) -> f64 {
        self.sigma_out
    }

    pub fn damax(&self) -> f64 {
        self.damax
    }

    pub fn blindlist(&self) -> &BlindList {
        &self.blindlist
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn perception(&self) -> &Perception {
        &self.perception
    }

    pub(crate) fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub(crate) fn set_blindlist(&mut self, blindlist: BlindList) {
        self.blindlist = blindlist;
    }

    pub(crate) fn set_damax(&mut self, damax: f64) {
        self.damax = damax;
    }

    /// Advance one tick against the start-of-tick snapshot and return the new pose.
    pub fn update(&mut self, tick: u64, snapshot: &Snapshot) -> Pose {
        self.perception.clear();

        let needs_field =
            self.density_cfg.enabled || !matches!(self.behavior, Behavior::Blind);
        if needs_field {
            let frame = match &self.behavior {
                Behavior::Perceptron(net) if net.reorient => self.pose.a,
                _ => 0.0,
            };
            let field = snapshot.center(self.pose.x, self.pose.y, frame);

            if self.density_cfg.enabled {
                // Vicsek counts itself among its neighbors, so its density does too.
                let include_self = matches!(self.behavior, Behavior::Vicsek { .. });
                self.density = measure_density(
                    &field,
                    self.range,
                    include_self,
                    &self.blindlist,
                    &self.density_cfg,
                );
            }

            match &self.behavior {
                Behavior::Blind => {}
                Behavior::Vicsek { radius } => {
                    let neighbors = field.near(*radius, true, &self.blindlist);
                    let headings = neighbors.iter().map(|&j| snapshot.a()[j]);
                    if let Some(mean) = circular_mean(headings) {
                        self.pose.a = mean;
                    }
                    self.perception.neighbors = neighbors;
                }
                Behavior::Perceptron(net) => {
                    let neighbors = field.near(self.range, false, &self.blindlist);
                    for &j in &neighbors {
                        let noise = gaussian(&mut self.rng, self.sigma_in);
                        self.perception.bearings.push(wrap_angle(field.bearing(j) + noise));
                        self.perception.distances.push(field.distance(j));
                    }
                    let features =
                        net.features(&self.perception.bearings, &self.perception.distances);
                    self.pose.a += net.steering(&features) * self.damax;
                    self.v = self.base_speed * net.speed_factor(&features);
                    self.perception.features = features;
                    self.perception.neighbors = neighbors;
                }
            }
        }

        self.move_step(snapshot.side());

        trace!(
            agent = self.id,
            tick,
            neighbors = self.perception.neighbors.len(),
            "agent updated"
        );
        self.pose
    }

    /// Heading noise, then a straight move of length `v` with periodic wrap.
    fn move_step(&mut self, side: f64) {
        self.pose.a += gaussian(&mut self.rng, self.sigma_out);
        self.pose.x = wrap(self.pose.x + self.v * self.pose.a.cos(), side);
        self.pose.y = wrap(self.pose.y + self.v * self.pose.a.sin(), side);
    }

    /// Check that `change` can be applied to this agent without partial effect.
    pub fn check_change(&self, change: &Change) -> Result<()> {
        change.validate()?;
        if let Behavior::Perceptron(net) = &self.behavior {
            match change {
                Change::Weight { slice, .. } if *slice >= net.slices() => {
                    return Err(FlockError::invalid(format!(
                        "slice {slice} out of range for agent {} with {} slices",
                        self.id,
                        net.slices()
                    )));
                }
                Change::Weights(ws) if ws.len() != net.slices() => {
                    return Err(FlockError::SliceMismatch {
                        slices: net.slices(),
                        weights: ws.len(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply a parameter change checked by [`Agent::check_change`].
    ///
    /// Returns `false` when the change does not concern this agent's behavior.
    pub fn apply_change(&mut self, change: &Change) -> bool {
        match (change, &mut self.behavior) {
            (Change::Speed(v), _) => {
                self.v = *v;
                self.base_speed = *v;
                true
            }
            (Change::PerceptionNoise(s), _) => {
                self.sigma_in = *s;
                true
            }
            (Change::MotionNoise(s), _) => {
                self.sigma_out = *s;
                true
            }
            (Change::Radius(r), Behavior::Vicsek { radius }) => {
                *radius = *r;
                true
            }
            (Change::Weight { slice, value }, Behavior::Perceptron(net)) => {
                match net.weights.get_mut(*slice) {
                    Some(w) => {
                        *w = *value;
                        true
                    }
                    None => false,
                }
            }
            (Change::Weights(ws), Behavior::Perceptron(net)) if ws.len() == net.slices() => {
                net.weights.clone_from(ws);
                true
            }
            (Change::SliceOffset(delta), Behavior::Perceptron(net)) => {
                net.delta = *delta;
                true
            }
            (Change::ResetWeights, Behavior::Perceptron(net)) => {
                net.weights.iter_mut().for_each(|w| *w = 0.0);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn agent(id: usize, kind: BehaviorKind, params: &AgentParams, pose: Pose) -> Agent {
        Agent::new(
            id,
            kind,
            params,
            pose,
            DensityConfig::disabled(),
            StdRng::seed_from_u64(id as u64 + 1),
        )
        .unwrap()
    }

    fn still(kind: BehaviorKind) -> AgentParams {
        AgentParams {
            v: 0.0,
            r: 0.1,
            ..AgentParams::default()
        }
        .with_weights(match kind {
            BehaviorKind::Perceptron => vec![0.0; 4],
            _ => Vec::new(),
        })
    }

    fn snapshot(poses: &[Pose]) -> Snapshot {
        Snapshot::from_poses(poses.iter().copied(), 1.0)
    }

    #[test]
    fn kind_parsing_is_closed_and_case_insensitive() {
        assert_eq!("vicsek".parse::<BehaviorKind>().unwrap(), BehaviorKind::Vicsek);
        assert_eq!(" Perceptron ".parse::<BehaviorKind>().unwrap(), BehaviorKind::Perceptron);
        assert!(matches!(
            "Aoki".parse::<BehaviorKind>(),
            Err(FlockError::UnknownBehavior(_))
        ));
    }

    #[test]
    fn invalid_params_reject_construction() {
        let params = AgentParams { damax: -1.0, ..AgentParams::default() };
        let res = Agent::new(
            0,
            BehaviorKind::Blind,
            &params,
            Pose { x: 0.0, y: 0.0, a: 0.0 },
            DensityConfig::default(),
            StdRng::seed_from_u64(0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn blind_move_without_noise_is_a_straight_line() {
        let params = AgentParams { v: 0.1, ..AgentParams::default() };
        let start = Pose { x: 0.95, y: 0.5, a: 0.0 };
        let mut a = agent(0, BehaviorKind::Blind, &params, start);
        let next = a.update(0, &snapshot(&[start]));
        assert!((next.x - 0.05).abs() < 1e-12);
        assert_eq!(next.y, 0.5);
        assert_eq!(next.a, 0.0);
    }

    #[test]
    fn vicsek_opposite_headings_leave_heading_unchanged() {
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.5, a: PI },
        ];
        let snap = snapshot(&poses);
        let mut first = agent(0, BehaviorKind::Vicsek, &still(BehaviorKind::Vicsek), poses[0]);
        let mut second = agent(1, BehaviorKind::Vicsek, &still(BehaviorKind::Vicsek), poses[1]);
        assert_eq!(first.update(0, &snap).a, 0.0);
        assert_eq!(second.update(0, &snap).a, PI);
    }

    #[test]
    fn vicsek_takes_the_circular_mean() {
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.5, a: FRAC_PI_2 },
        ];
        let snap = snapshot(&poses);
        let mut a = agent(0, BehaviorKind::Vicsek, &still(BehaviorKind::Vicsek), poses[0]);
        let expected = (0f64.sin() + 0f64.sin() + FRAC_PI_2.sin())
            .atan2(0f64.cos() + 0f64.cos() + FRAC_PI_2.cos());
        assert!((a.update(0, &snap).a - expected).abs() < 1e-12);
        assert_eq!(a.perception().neighbors, vec![0, 1, 2]);
    }

    #[test]
    fn vicsek_ignores_agents_outside_radius() {
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.3 },
            Pose { x: 0.9, y: 0.9, a: 2.0 },
        ];
        let mut a = agent(0, BehaviorKind::Vicsek, &still(BehaviorKind::Vicsek), poses[0]);
        assert!((a.update(0, &snapshot(&poses)).a - 0.3).abs() < 1e-12);
    }

    #[test]
    fn perceptron_boundary_bearing_counts_in_two_slices() {
        // Neighbor straight "up" from an agent heading east: bearing exactly π/2,
        // the boundary between slice 0 and slice 1 of a 4-slice partition.
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.6, a: 0.0 },
        ];
        let mut a = agent(0, BehaviorKind::Perceptron, &still(BehaviorKind::Perceptron), poses[0]);
        a.update(0, &snapshot(&poses));
        assert_eq!(a.perception().bearings, vec![FRAC_PI_2]);
        assert_eq!(a.perception().features, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn perceptron_features_renormalize_or_stay_zero() {
        let net = Perceptron {
            weights: vec![0.0; 4],
            speed_weights: Vec::new(),
            delta: 0.0,
            reorient: true,
            renormalize: true,
        };
        let f = net.features(&[0.3, 2.0, 4.0], &[0.1, 0.2, 0.4]);
        assert!((f.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(f[0] > f[1] && f[1] > f[2]);
        assert_eq!(net.features(&[], &[]), vec![0.0; 4]);
    }

    #[test]
    fn perceptron_without_renormalization_keeps_inverse_distances() {
        let net = Perceptron {
            weights: vec![0.0; 2],
            speed_weights: Vec::new(),
            delta: 0.0,
            reorient: true,
            renormalize: false,
        };
        let f = net.features(&[1.0, 4.0], &[0.5, 0.25]);
        assert!((f[0] - 2.0).abs() < 1e-12);
        assert!((f[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn slice_offset_rotates_the_partition() {
        let net = Perceptron {
            weights: vec![0.0; 4],
            speed_weights: Vec::new(),
            delta: FRAC_PI_2 / 2.0,
            reorient: true,
            renormalize: false,
        };
        // 0.1 rad sits before the shifted start of slice 0, so it wraps into slice 3.
        let f = net.features(&[0.1], &[1.0]);
        assert_eq!(f, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn perception_noise_is_centered_with_sigma_in_spread() {
        let params = AgentParams {
            v: 0.0,
            sigma_in: 0.2,
            ..AgentParams::default()
        }
        .with_weights(vec![0.0; 4]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.6, a: 0.0 },
        ];
        let snap = snapshot(&poses);
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);

        let n = 5000;
        let samples: Vec<f64> = (0..n)
            .map(|t| {
                a.update(t, &snap);
                a.perception().bearings[0]
            })
            .collect();
        // Zero weights and zero speed: the agent never moves.
        assert_eq!(a.pose(), poses[0]);

        let mean = samples.iter().sum::<f64>() / n as f64;
        let sd = (samples.iter().map(|b| (b - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt();
        assert!((mean - FRAC_PI_2).abs() < 0.015, "mean = {mean}");
        assert!((sd - 0.2).abs() < 0.01, "sd = {sd}");
    }

    #[test]
    fn perception_noise_is_drawn_per_neighbor() {
        let params = AgentParams {
            v: 0.0,
            sigma_in: 0.2,
            ..AgentParams::default()
        }
        .with_weights(vec![0.0; 4]);
        // Both neighbors sit at bearing π/2, at different distances.
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.5, y: 0.6, a: 0.0 },
            Pose { x: 0.5, y: 0.7, a: 0.0 },
        ];
        let snap = snapshot(&poses);
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);

        let n = 5000;
        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for t in 0..n {
            a.update(t, &snap);
            let b = &a.perception().bearings;
            assert_eq!(b.len(), 2);
            assert_ne!(b[0], b[1]);
            let (dx, dy) = (b[0] - FRAC_PI_2, b[1] - FRAC_PI_2);
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        let corr = sxy / (sxx * syy).sqrt();
        assert!(corr.abs() < 0.06, "corr = {corr}");
    }

    #[test]
    fn noisy_bearings_near_zero_wrap_into_range() {
        let params = AgentParams {
            v: 0.0,
            sigma_in: 0.2,
            ..AgentParams::default()
        }
        .with_weights(vec![0.0; 4]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.6, y: 0.5, a: 0.0 },
        ];
        let snap = snapshot(&poses);
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);

        let mut wrapped = 0;
        for t in 0..500 {
            a.update(t, &snap);
            let b = a.perception().bearings[0];
            assert!((0.0..TAU).contains(&b), "bearing = {b}");
            if b > PI {
                wrapped += 1;
            }
        }
        // About half of the draws fall below zero and come back near 2π.
        assert!(wrapped > 150 && wrapped < 350, "wrapped = {wrapped}");
    }

    #[test]
    fn perceptron_turns_towards_weighted_slice() {
        // Neighbor ahead-left (slice 0) with a positive slice-0 weight turns left.
        let params = AgentParams {
            v: 0.0,
            damax: 0.2,
            ..AgentParams::default()
        }
        .with_weights(vec![1.0, 0.0, 0.0, 0.0]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.55, y: 0.55, a: 0.0 },
        ];
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);
        let next = a.update(0, &snapshot(&poses));
        assert!((next.a - 1f64.tanh() * 0.2).abs() < 1e-12);
    }

    #[test]
    fn perceptron_is_egocentric() {
        // Same neighbor, agent heading west: the neighbor is now behind-right.
        let params = AgentParams {
            v: 0.0,
            damax: 0.2,
            ..AgentParams::default()
        }
        .with_weights(vec![1.0, 0.0, 0.0, 0.0]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: PI },
            Pose { x: 0.55, y: 0.55, a: 0.0 },
        ];
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);
        let next = a.update(0, &snapshot(&poses));
        assert!((next.a - PI).abs() < 1e-12);
        let bearing = a.perception().bearings[0];
        assert!(bearing > PI && bearing < 1.5 * PI);
    }

    #[test]
    fn perceptron_without_reorientation_uses_absolute_bearings() {
        // Same geometry as above, but the frame is not rotated by the own heading:
        // the neighbor stays at absolute bearing π/4, inside slice 0.
        let params = AgentParams {
            v: 0.0,
            damax: 0.2,
            reorient: false,
            ..AgentParams::default()
        }
        .with_weights(vec![1.0, 0.0, 0.0, 0.0]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: PI },
            Pose { x: 0.55, y: 0.55, a: 0.0 },
        ];
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);
        let next = a.update(0, &snapshot(&poses));
        assert!((a.perception().bearings[0] - FRAC_PI_4).abs() < 1e-12);
        assert_eq!(a.perception().features, vec![1.0, 0.0, 0.0, 0.0]);
        assert!((next.a - (PI + 1f64.tanh() * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn speed_weights_modulate_speed() {
        let params = AgentParams {
            v: 0.02,
            ..AgentParams::default()
        }
        .with_mirrored_weights(&[0.0, 0.0], &[1.0, 1.0]);
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.6, y: 0.5, a: 0.0 },
        ];
        let mut a = agent(0, BehaviorKind::Perceptron, &params, poses[0]);
        a.update(0, &snapshot(&poses));
        // Neighbor dead ahead: all of the feature mass sits in slice 0.
        assert!((a.speed() - 0.02 * (1.0 + 1f64.tanh())).abs() < 1e-12);
        assert_eq!(a.base_speed(), 0.02);
    }

    #[test]
    fn blind_records_density_without_steering() {
        let params = AgentParams { v: 0.0, ..AgentParams::default() };
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 1.0 },
            Pose { x: 0.6, y: 0.5, a: 0.0 },
        ];
        let mut a = Agent::new(
            0,
            BehaviorKind::Blind,
            &params,
            poses[0],
            DensityConfig::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let next = a.update(0, &snapshot(&poses));
        assert_eq!(next.a, 1.0);
        let expected = (-0.5f64).exp();
        assert!((a.density().position - expected).abs() < 1e-9);
        assert!((a.density().heading - 1.0).abs() < 1e-12);
    }

    #[test]
    fn vicsek_density_counts_the_agent_itself() {
        let params = AgentParams { v: 0.0, ..AgentParams::default() };
        let poses = [
            Pose { x: 0.5, y: 0.5, a: 0.0 },
            Pose { x: 0.6, y: 0.5, a: 0.0 },
        ];
        let snap = snapshot(&poses);
        let build = |kind| {
            Agent::new(0, kind, &params, poses[0], DensityConfig::default(), StdRng::seed_from_u64(5))
                .unwrap()
        };
        let mut vicsek = build(BehaviorKind::Vicsek);
        let mut blind = build(BehaviorKind::Blind);
        vicsek.update(0, &snap);
        blind.update(0, &snap);

        let neighbor = (-0.5f64).exp();
        assert!((vicsek.density().position - (1.0 + neighbor)).abs() < 1e-9);
        assert!((vicsek.density().heading - 2.0).abs() < 1e-12);
        assert!((blind.density().position - neighbor).abs() < 1e-9);
        assert!((blind.density().heading - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weight_changes_are_checked_against_slice_count() {
        let mut a = agent(
            0,
            BehaviorKind::Perceptron,
            &still(BehaviorKind::Perceptron),
            Pose { x: 0.1, y: 0.1, a: 0.0 },
        );
        assert!(a.check_change(&Change::Weight { slice: 4, value: 1.0 }).is_err());
        assert!(a.check_change(&Change::Weights(vec![1.0; 3])).is_err());
        assert!(a.apply_change(&Change::Weight { slice: 2, value: 0.7 }));
        assert!(a.apply_change(&Change::SliceOffset(0.3)));
        match a.behavior() {
            Behavior::Perceptron(net) => {
                assert_eq!(net.weights[2], 0.7);
                assert_eq!(net.delta, 0.3);
            }
            other => panic!("unexpected behavior {other:?}"),
        }
        assert!(a.apply_change(&Change::ResetWeights));
        assert!(!a.apply_change(&Change::Radius(0.2)));
    }
}
