//! Python bindings (feature `python`).

use crate::core::agent::BehaviorKind;
use crate::core::config::{AgentParams, CohortSpec, DensityConfig, EngineConfig};
use crate::core::error::FlockError;
use crate::core::registry::Layout;
use crate::swarm::control::{Change, ControlCommand, Target};
use crate::swarm::engine::{Engine, EngineState};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

impl From<FlockError> for PyErr {
    fn from(err: FlockError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn target(cohort: Option<String>) -> Target {
    cohort.map(Target::Cohort).unwrap_or_default()
}

fn cohort_spec(
    kind: &str,
    count: usize,
    name: Option<String>,
    blinding: bool,
    layout: Layout,
    params: AgentParams,
    damax_range: Option<(f64, f64)>,
) -> Result<CohortSpec, FlockError> {
    let kind: BehaviorKind = kind.parse()?;
    let mut spec = CohortSpec::new(kind, count)
        .with_layout(layout)
        .with_params(params);
    spec.name = name;
    spec.blinding = blinding;
    spec.damax_range = damax_range;
    spec.validate()?;
    Ok(spec)
}

#[pyclass(name = "Flock")]
pub struct PyFlock {
    engine: Engine,
}

#[pymethods]
impl PyFlock {
    #[new]
    #[pyo3(signature = (side=1.0, steps=None, seed=None, parallel=false, verbose=None, density=true))]
    pub fn new(
        side: f64,
        steps: Option<u64>,
        seed: Option<u64>,
        parallel: bool,
        verbose: Option<u64>,
        density: bool,
    ) -> PyResult<Self> {
        let config = EngineConfig {
            side,
            steps,
            seed,
            parallel,
            verbose,
            density: if density {
                DensityConfig::default()
            } else {
                DensityConfig::disabled()
            },
            ..EngineConfig::default()
        };
        Ok(Self {
            engine: Engine::new(config)?,
        })
    }

    /// Add a cohort; returns the index range as `(start, end)`.
    #[pyo3(signature = (
        kind, count, name=None, blinding=false, grid=false,
        v=0.01, sigma_in=0.0, sigma_out=0.0, damax=std::f64::consts::FRAC_PI_2,
        r=0.05, weights=None, speed_weights=None, delta=0.0,
        perception_range=0.5, reorient=true, renormalize=true, damax_range=None
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        kind: &str,
        count: usize,
        name: Option<String>,
        blinding: bool,
        grid: bool,
        v: f64,
        sigma_in: f64,
        sigma_out: f64,
        damax: f64,
        r: f64,
        weights: Option<Vec<f64>>,
        speed_weights: Option<Vec<f64>>,
        delta: f64,
        perception_range: f64,
        reorient: bool,
        renormalize: bool,
        damax_range: Option<(f64, f64)>,
    ) -> PyResult<(usize, usize)> {
        let params = AgentParams {
            v,
            sigma_in,
            sigma_out,
            damax,
            r,
            delta,
            perception_range,
            reorient,
            renormalize,
            speed_weights: speed_weights.unwrap_or_default(),
            ..AgentParams::default()
        }
        .with_weights(weights.unwrap_or_default());
        let layout = if grid { Layout::Grid } else { Layout::Random };
        let spec = cohort_spec(kind, count, name, blinding, layout, params, damax_range)?;
        let ids = self.engine.add_cohort(&spec)?;
        Ok((ids.start, ids.end))
    }

    /// Advance one tick; returns `True` once the engine has finished.
    pub fn step(&mut self) -> PyResult<bool> {
        Ok(self.engine.step()? == EngineState::Finished)
    }

    pub fn run_for(&mut self, n: u64) -> PyResult<bool> {
        Ok(self.engine.run_for(n)? == EngineState::Finished)
    }

    #[getter]
    pub fn iteration(&self) -> u64 {
        self.engine.iteration()
    }

    /// Current `(x, y, a)` columns.
    pub fn snapshot(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let snap = self.engine.snapshot();
        (snap.x().to_vec(), snap.y().to_vec(), snap.a().to_vec())
    }

    pub fn metrics<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let m = self.engine.metrics();
        let dict = PyDict::new_bound(py);
        dict.set_item("agents", m.agents)?;
        dict.set_item("polarization", m.polarization)?;
        dict.set_item("mean_position_density", m.mean_position_density)?;
        dict.set_item("mean_heading_density", m.mean_heading_density)?;
        dict.set_item("iteration", self.engine.iteration())?;
        Ok(dict)
    }

    #[pyo3(signature = (v, cohort=None))]
    pub fn set_speed(&mut self, v: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::Speed(v))
    }

    #[pyo3(signature = (sigma, cohort=None))]
    pub fn set_perception_noise(&mut self, sigma: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::PerceptionNoise(sigma))
    }

    #[pyo3(signature = (sigma, cohort=None))]
    pub fn set_motion_noise(&mut self, sigma: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::MotionNoise(sigma))
    }

    #[pyo3(signature = (r, cohort=None))]
    pub fn set_radius(&mut self, r: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::Radius(r))
    }

    #[pyo3(signature = (slice, value, cohort=None))]
    pub fn set_weight(&mut self, slice: usize, value: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::Weight { slice, value })
    }

    #[pyo3(signature = (delta, cohort=None))]
    pub fn set_delta(&mut self, delta: f64, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::SliceOffset(delta))
    }

    #[pyo3(signature = (cohort=None))]
    pub fn reset_weights(&mut self, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::ResetWeights)
    }

    pub fn set_behavior(&mut self, kind: &str) -> PyResult<()> {
        let kind: BehaviorKind = kind.parse()?;
        self.apply(None, Change::ActiveBehavior(kind))
    }

    #[pyo3(signature = (cohort=None))]
    pub fn shuffle(&mut self, cohort: Option<String>) -> PyResult<()> {
        self.apply(cohort, Change::Shuffle)
    }
}

impl PyFlock {
    fn apply(&mut self, cohort: Option<String>, change: Change) -> PyResult<()> {
        self.engine.apply(&ControlCommand {
            target: target(cohort),
            change,
        })?;
        Ok(())
    }
}

/// Initialize tracing from Python.
#[pyfunction]
#[pyo3(name = "setup_logging", signature = (level=None))]
fn py_setup_logging(level: Option<String>) {
    crate::setup_logging(level.as_deref());
}

#[pymodule]
fn flocking_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFlock>()?;
    m.add_function(wrap_pyfunction!(py_setup_logging, m)?)?;
    Ok(())
}
