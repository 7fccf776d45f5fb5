//! Headless runner: builds a flock from a JSON scenario, runs it to its step
//! bound and streams every snapshot as JSON lines.
//!
//! Usage: `flock-headless <scenario.json> [snapshots.jsonl]`

use anyhow::{bail, Context, Result};
use flocking_core::{setup_logging, Engine, JsonLinesSink, ScenarioConfig};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

fn main() -> Result<()> {
    setup_logging(std::env::var("FLOCK_LOG").ok().as_deref());

    let mut args = std::env::args().skip(1);
    let Some(scenario_path) = args.next() else {
        bail!("usage: flock-headless <scenario.json> [snapshots.jsonl]");
    };
    let output = args.next();

    let scenario = ScenarioConfig::from_path(&scenario_path)
        .with_context(|| format!("loading scenario {scenario_path}"))?;
    let mut engine = Engine::from_scenario(&scenario).context("building flock")?;

    match &output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {path}"))?;
            engine.attach_sink(JsonLinesSink::new(BufWriter::new(file)));
        }
        None if scenario.engine.steps.is_none() => {
            bail!("scenario has no step bound; set engine.steps or give an output path");
        }
        None => {}
    }

    engine.run().context("running flock")?;

    let metrics = engine.metrics();
    info!(
        "📊 [Headless] {} agents after {} steps: polarization {:.3}, mean density {:.3}",
        metrics.agents,
        engine.iteration(),
        metrics.polarization,
        metrics.mean_position_density
    );
    println!("{}", serde_json::to_string(&metrics)?);
    Ok(())
}
