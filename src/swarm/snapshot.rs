//! Per-tick Snapshot
//!
//! Immutable capture of every agent's position and heading at the start of a
//! tick, stored as three parallel columns (SoA) plus the domain side.

use super::geometry::{wrap_centered, RelativeField};
use crate::core::agent::Pose;
use crate::core::error::{FlockError, Result};
use serde::{Deserialize, Serialize};

/// Positions and headings of all agents, in registration order.
///
/// Carries no reference back to the agents that produced it, so it can be
/// shared by reference across worker threads or handed to a display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    x: Vec<f64>,
    y: Vec<f64>,
    a: Vec<f64>,
    side: f64,
}

impl Snapshot {
    /// Build from three same-length columns.
    pub fn from_columns(x: Vec<f64>, y: Vec<f64>, a: Vec<f64>, side: f64) -> Result<Self> {
        if x.len() != y.len() || x.len() != a.len() {
            return Err(FlockError::invalid(format!(
                "snapshot columns differ in length ({}, {}, {})",
                x.len(),
                y.len(),
                a.len()
            )));
        }
        if !(side.is_finite() && side > 0.0) {
            return Err(FlockError::invalid(format!("domain side must be > 0, got {side}")));
        }
        Ok(Snapshot { x, y, a, side })
    }

    pub(crate) fn from_poses<I>(poses: I, side: f64) -> Self
    where
        I: ExactSizeIterator<Item = Pose>,
    {
        let n = poses.len();
        let mut snap = Snapshot {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            a: Vec::with_capacity(n),
            side,
        };
        for p in poses {
            snap.x.push(p.x);
            snap.y.push(p.y);
            snap.a.push(p.a);
        }
        snap
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn pose(&self, i: usize) -> Option<Pose> {
        Some(Pose {
            x: *self.x.get(i)?,
            y: self.y[i],
            a: self.a[i],
        })
    }

    /// Re-express the snapshot around `(tx, ty)`.
    ///
    /// Every point is translated by `(-tx, -ty)` with periodic wrap into
    /// `[-side/2, side/2)`. When `ta != 0` points are rotated by `-ta` (polar
    /// form: magnitude kept, angle reduced by `ta`). Headings are always
    /// shifted by `-ta`.
    pub fn center(&self, tx: f64, ty: f64, ta: f64) -> RelativeField {
        let n = self.len();
        let mut field = RelativeField {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            a: Vec::with_capacity(n),
            side: self.side,
        };

        for i in 0..n {
            let mut dx = wrap_centered(self.x[i] - tx, self.side);
            let mut dy = wrap_centered(self.y[i] - ty, self.side);

            if ta != 0.0 {
                let rho = dx.hypot(dy);
                let phi = dy.atan2(dx) - ta;
                dx = rho * phi.cos();
                dy = rho * phi.sin();
            }

            field.x.push(dx);
            field.y.push(dy);
            field.a.push(self.a[i] - ta);
        }

        field
    }
}
