//! Simulation Engine
//!
//! Discrete-time driver: Idle → Running on the first step, Running → Finished
//! when the optional step bound is reached. Each tick compiles one snapshot,
//! hands it to the sink and then lets every agent update against it.

use super::control::{Change, ControlCommand, ControlHandle};
use super::metrics::PopulationMetrics;
use super::sink::DataSink;
use super::snapshot::Snapshot;
use crate::core::agent::BehaviorKind;
use crate::core::config::{AgentParams, CohortSpec, EngineConfig, ScenarioConfig};
use crate::core::error::Result;
use crate::core::registry::AgentRegistry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Step bound applied by [`Engine::run`] when a sink is attached and none is configured.
pub const DEFAULT_RECORDED_STEPS: u64 = 250;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Finished,
}

pub struct Engine {
    config: EngineConfig,
    registry: AgentRegistry,
    rng: StdRng,
    state: EngineState,
    iteration: u64,
    sink: Option<Box<dyn DataSink>>,
    controls: ControlHandle,
    active_behavior: BehaviorKind,
    started: Option<Instant>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "🐦 [Engine] Initializing flock (side={}, steps={:?}, seed={:?}, parallel={})",
            config.side, config.steps, config.seed, config.parallel
        );

        Ok(Engine {
            registry: AgentRegistry::new(config.side, config.density.clone()),
            active_behavior: config.default_behavior,
            config,
            rng,
            state: EngineState::Idle,
            iteration: 0,
            sink: None,
            controls: ControlHandle::new(),
            started: None,
        })
    }

    /// Build an engine and every cohort of a scenario, in file order.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self> {
        let mut engine = Engine::new(scenario.engine.clone())?;
        for cohort in &scenario.cohorts {
            engine.add_cohort(cohort)?;
        }
        Ok(engine)
    }

    pub fn with_sink(mut self, sink: impl DataSink + 'static) -> Self {
        self.attach_sink(sink);
        self
    }

    pub fn attach_sink(&mut self, sink: impl DataSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Handle for queueing live changes from another thread.
    pub fn controls(&self) -> ControlHandle {
        self.controls.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn active_behavior(&self) -> BehaviorKind {
        self.active_behavior
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    pub fn snapshot(&self) -> Snapshot {
        self.registry.compile()
    }

    pub fn metrics(&self) -> PopulationMetrics {
        PopulationMetrics::sample(&self.registry)
    }

    pub fn add_cohort(&mut self, spec: &CohortSpec) -> Result<Range<usize>> {
        self.registry.add(spec, &mut self.rng)
    }

    /// Add `count` agents of the currently active behavior.
    pub fn add(&mut self, count: usize, params: AgentParams) -> Result<Range<usize>> {
        let spec = CohortSpec::new(self.active_behavior, count).with_params(params);
        self.add_cohort(&spec)
    }

    /// Apply one change now. Agent-level changes are checked on every targeted
    /// agent first; if any check fails nothing is modified.
    pub fn apply(&mut self, command: &ControlCommand) -> Result<()> {
        command.change.validate()?;
        match &command.change {
            Change::ActiveBehavior(kind) => {
                info!("[Engine] Active behavior set to {}", kind);
                self.active_behavior = *kind;
            }
            Change::Shuffle => {
                let targets = self.registry.resolve(&command.target)?;
                self.registry.shuffle(&targets, &mut self.rng);
                info!("[Engine] Shuffled {} agents", targets.len());
            }
            change => {
                let targets = self.registry.resolve(&command.target)?;
                let agents = self.registry.agents_mut();
                for &i in &targets {
                    agents[i].check_change(change)?;
                }
                let mut applied = 0;
                for &i in &targets {
                    if agents[i].apply_change(change) {
                        applied += 1;
                    }
                }
                if applied == 0 {
                    warn!(
                        "[Engine] {:?} for {:?} matched no agent with that parameter",
                        change, command.target
                    );
                } else {
                    debug!("[Engine] {:?} applied to {} agents", change, applied);
                }
            }
        }
        Ok(())
    }

    /// Advance one tick. A finished engine is left untouched.
    pub fn step(&mut self) -> Result<EngineState> {
        if self.state == EngineState::Finished {
            return Ok(self.state);
        }
        if self.state == EngineState::Idle {
            self.state = EngineState::Running;
            self.started = Some(Instant::now());
        }

        for command in self.controls.drain() {
            if let Err(e) = self.apply(&command) {
                warn!("[Engine] Dropped control command {:?}: {}", command, e);
            }
        }

        if let Some(every) = self.config.verbose {
            if self.iteration % every == 0 {
                let elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
                info!(
                    "[Engine] Iteration {} ({} agents, {:.2?} elapsed)",
                    self.iteration,
                    self.registry.len(),
                    elapsed
                );
            }
        }

        let snapshot = self.registry.compile();
        if let Some(sink) = self.sink.as_mut() {
            sink.append(self.iteration, &snapshot)?;
        }

        let tick = self.iteration;
        if self.config.parallel {
            self.registry.agents_mut().par_iter_mut().for_each(|agent| {
                agent.update(tick, &snapshot);
            });
        } else {
            for agent in self.registry.agents_mut() {
                agent.update(tick, &snapshot);
            }
        }

        if self.config.steps == Some(self.iteration + 1) {
            self.state = EngineState::Finished;
            if let Some(sink) = self.sink.as_mut() {
                sink.finish()?;
            }
            info!(
                "✅ [Engine] Finished after {} steps in {:.2?}",
                self.iteration + 1,
                self.started.map(|t| t.elapsed()).unwrap_or_default()
            );
        }
        self.iteration += 1;
        Ok(self.state)
    }

    /// Step until finished. Without a step bound this only returns on error,
    /// unless a sink is attached, in which case the bound defaults to
    /// [`DEFAULT_RECORDED_STEPS`].
    pub fn run(&mut self) -> Result<EngineState> {
        if self.config.steps.is_none() && self.sink.is_some() {
            info!(
                "[Engine] No step bound with a sink attached, recording {} steps",
                DEFAULT_RECORDED_STEPS
            );
            self.config.steps = Some(DEFAULT_RECORDED_STEPS);
        }
        while self.step()? != EngineState::Finished {}
        Ok(self.state)
    }

    /// Step at most `n` times, stopping early if the engine finishes.
    pub fn run_for(&mut self, n: u64) -> Result<EngineState> {
        for _ in 0..n {
            if self.step()? == EngineState::Finished {
                break;
            }
        }
        Ok(self.state)
    }
}
