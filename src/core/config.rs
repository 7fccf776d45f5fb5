//! Engine, agent and scenario configuration
//!
//! Plain serde structs with defaults for every field, so a scenario file only
//! has to name what it changes. Validation is explicit and fatal.

use crate::core::agent::BehaviorKind;
use crate::core::error::{FlockError, Result};
use crate::core::registry::Layout;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!("{name} must be finite and >= 0, got {value}")))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!("{name} must be finite and > 0, got {value}")))
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FlockError::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// Kernel widths of the local density estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub enabled: bool,
    /// Gaussian width over neighbor distance.
    pub position_width: f64,
    /// Gaussian width over neighbor bearing (radians).
    pub angle_width: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        DensityConfig {
            enabled: true,
            position_width: 0.1,
            angle_width: PI / 10.0,
        }
    }
}

impl DensityConfig {
    pub fn disabled() -> Self {
        DensityConfig {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("density.position_width", self.position_width)?;
        check_positive("density.angle_width", self.angle_width)
    }
}

/// Engine-wide settings fixed at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of the square periodic domain.
    pub side: f64,
    /// Step bound; `None` runs until the driver stops calling `step()`.
    pub steps: Option<u64>,
    /// Log progress every `verbose` iterations.
    pub verbose: Option<u64>,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Fan agent updates out over the rayon pool.
    pub parallel: bool,
    pub density: DensityConfig,
    /// Behavior given to agents added without an explicit kind.
    pub default_behavior: BehaviorKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            side: 1.0,
            steps: None,
            verbose: None,
            seed: None,
            parallel: false,
            density: DensityConfig::default(),
            default_behavior: BehaviorKind::Blind,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("side", self.side)?;
        if self.steps == Some(0) {
            return Err(FlockError::invalid("steps must be >= 1 when set"));
        }
        if self.verbose == Some(0) {
            return Err(FlockError::invalid("verbose interval must be >= 1 when set"));
        }
        self.density.validate()
    }
}

/// Initial per-agent parameters.
///
/// Only the fields relevant to the chosen behavior are read; the others keep
/// their defaults and are still validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// Forward speed per tick.
    pub v: f64,
    /// Std-dev of the noise added to perceived bearings (perceptron).
    pub sigma_in: f64,
    /// Std-dev of the noise added to the heading every tick.
    pub sigma_out: f64,
    /// Maximum heading change per tick (radians).
    pub damax: f64,
    /// Alignment radius (Vicsek).
    pub r: f64,
    /// Number of angular slices (perceptron).
    pub slices: usize,
    /// Per-slice steering weights, `slices` long (perceptron).
    pub weights: Vec<f64>,
    /// Optional per-slice speed weights; empty disables speed modulation.
    pub speed_weights: Vec<f64>,
    /// Rotation of the slice partition (radians).
    pub delta: f64,
    /// Sensing radius for the perceptron and the density estimate.
    pub perception_range: f64,
    /// Perceive in the egocentric frame (rotated by own heading).
    pub reorient: bool,
    /// Rescale slice features to sum to 1.
    pub renormalize: bool,
}

impl Default for AgentParams {
    fn default() -> Self {
        AgentParams {
            v: 0.01,
            sigma_in: 0.0,
            sigma_out: 0.0,
            damax: PI / 2.0,
            r: 0.05,
            slices: 4,
            weights: Vec::new(),
            speed_weights: Vec::new(),
            delta: 0.0,
            perception_range: 0.5,
            reorient: true,
            renormalize: true,
        }
    }
}

impl AgentParams {
    /// Antisymmetric steering weights from the first half of the slices.
    ///
    /// `weights = half ++ reverse(-half)`; speed weights, when given, are
    /// mirrored symmetrically: `speed_half ++ reverse(speed_half)`.
    pub fn with_mirrored_weights(mut self, half: &[f64], speed_half: &[f64]) -> Self {
        self.weights = half
            .iter()
            .copied()
            .chain(half.iter().rev().map(|w| -w))
            .collect();
        self.speed_weights = if speed_half.is_empty() {
            Vec::new()
        } else {
            speed_half
                .iter()
                .copied()
                .chain(speed_half.iter().rev().copied())
                .collect()
        };
        self.slices = self.weights.len();
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.slices = weights.len();
        self.weights = weights;
        self
    }

    pub fn validate(&self, kind: BehaviorKind) -> Result<()> {
        check_non_negative("v", self.v)?;
        check_non_negative("sigma_in", self.sigma_in)?;
        check_non_negative("sigma_out", self.sigma_out)?;
        check_positive("damax", self.damax)?;
        check_non_negative("r", self.r)?;
        check_non_negative("perception_range", self.perception_range)?;
        check_finite("delta", self.delta)?;

        if kind == BehaviorKind::Perceptron {
            if self.weights.is_empty() {
                return Err(FlockError::invalid("perceptron agents require steering weights"));
            }
            if self.weights.len() != self.slices {
                return Err(FlockError::SliceMismatch {
                    slices: self.slices,
                    weights: self.weights.len(),
                });
            }
            if !self.speed_weights.is_empty() && self.speed_weights.len() != self.slices {
                return Err(FlockError::SliceMismatch {
                    slices: self.slices,
                    weights: self.speed_weights.len(),
                });
            }
            for w in self.weights.iter().chain(self.speed_weights.iter()) {
                check_finite("weight", *w)?;
            }
        }
        Ok(())
    }
}

/// One `add` request: a batch of agents sharing a behavior and a cohort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortSpec {
    pub kind: BehaviorKind,
    pub count: usize,
    /// Cohort name; defaults to the behavior name.
    pub name: Option<String>,
    /// Make cohort members mutually blind.
    pub blinding: bool,
    pub layout: Layout,
    pub params: AgentParams,
    /// Draw each agent's `damax` uniformly in `[lo, hi)` instead of using `params.damax`.
    pub damax_range: Option<(f64, f64)>,
}

impl Default for CohortSpec {
    fn default() -> Self {
        CohortSpec {
            kind: BehaviorKind::Blind,
            count: 0,
            name: None,
            blinding: false,
            layout: Layout::Random,
            params: AgentParams::default(),
            damax_range: None,
        }
    }
}

impl CohortSpec {
    pub fn new(kind: BehaviorKind, count: usize) -> Self {
        CohortSpec {
            kind,
            count,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn blinded(mut self) -> Self {
        self.blinding = true;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_params(mut self, params: AgentParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_damax_range(mut self, lo: f64, hi: f64) -> Self {
        self.damax_range = Some((lo, hi));
        self
    }

    pub fn cohort_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.kind.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((lo, hi)) = self.damax_range {
            check_positive("damax_range.lo", lo)?;
            check_finite("damax_range.hi", hi)?;
            if hi < lo {
                return Err(FlockError::invalid(format!(
                    "damax_range upper bound {hi} is below lower bound {lo}"
                )));
            }
        }
        self.params.validate(self.kind)
    }
}

/// A full headless run: engine settings plus the cohorts to create.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub cohorts: Vec<CohortSpec>,
}

impl ScenarioConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let scenario: ScenarioConfig = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        for cohort in &self.cohorts {
            cohort.validate()?;
        }
        Ok(())
    }
}
