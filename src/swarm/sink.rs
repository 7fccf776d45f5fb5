//! Snapshot sinks
//!
//! The engine appends the start-of-tick snapshot of every step to an optional
//! sink before agents move. Sinks only see immutable data.

use super::snapshot::Snapshot;
use crate::core::error::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

/// One recorded tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub step: u64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub a: Vec<f64>,
}

impl SnapshotRow {
    pub fn new(step: u64, snapshot: &Snapshot) -> Self {
        SnapshotRow {
            step,
            x: snapshot.x().to_vec(),
            y: snapshot.y().to_vec(),
            a: snapshot.a().to_vec(),
        }
    }
}

/// Destination for per-tick snapshots.
pub trait DataSink: Send {
    fn append(&mut self, step: u64, snapshot: &Snapshot) -> Result<()>;

    /// Called once when the engine reaches its step bound.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory recorder. Clones share the same rows, so a caller can keep a
/// handle while the engine owns the sink.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    rows: Arc<RwLock<Vec<SnapshotRow>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    pub fn rows(&self) -> Vec<SnapshotRow> {
        self.rows.read().clone()
    }

    pub fn last(&self) -> Option<SnapshotRow> {
        self.rows.read().last().cloned()
    }

    pub fn to_json(&self) -> Result<String> {
        let rows = self.rows.read();
        Ok(serde_json::to_string(&*rows)?)
    }
}

impl DataSink for MemorySink {
    fn append(&mut self, step: u64, snapshot: &Snapshot) -> Result<()> {
        self.rows.write().push(SnapshotRow::new(step, snapshot));
        Ok(())
    }
}

/// Writes one JSON object per tick, newline separated.
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
    rows: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out, rows: 0 }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DataSink for JsonLinesSink<W> {
    fn append(&mut self, step: u64, snapshot: &Snapshot) -> Result<()> {
        serde_json::to_writer(&mut self.out, &SnapshotRow::new(step, snapshot))?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
