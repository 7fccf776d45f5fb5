//! Toroidal Geometry Kernel
//!
//! Stateless transforms over a [`Snapshot`](super::snapshot::Snapshot):
//! periodic wrapping, egocentric re-centering and radius queries.
//!
//! Radius queries are inclusive (`distance <= r`) and the blind list is
//! applied after the radius filter. Both are observable and must not change.

use std::collections::BTreeSet;
use std::sync::Arc;

/// Wrap `value` into `[0, side)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `side`; that
/// case is folded back to `0.0` so stored positions never leave the domain.
#[inline]
pub fn wrap(value: f64, side: f64) -> f64 {
    let w = value.rem_euclid(side);
    if w >= side {
        0.0
    } else {
        w
    }
}

/// Wrap a displacement into `[-side/2, side/2)` (minimum image convention).
#[inline]
pub fn wrap_centered(delta: f64, side: f64) -> f64 {
    let half = side / 2.0;
    wrap(delta + half, side) - half
}

/// Normalize an angle into `[0, 2π)`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    wrap(angle, std::f64::consts::TAU)
}

/// Set of agent indices an agent never perceives.
///
/// Cohort members share one `Arc`'d index set; `owner` is the agent holding
/// this list, which is never hidden from itself.
#[derive(Clone, Debug, Default)]
pub struct BlindList {
    members: Option<Arc<BTreeSet<usize>>>,
    owner: Option<usize>,
}

impl BlindList {
    /// Empty list: the agent sees everybody.
    pub fn none() -> Self {
        Self::default()
    }

    /// Blind to exactly these indices.
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        BlindList {
            members: Some(Arc::new(indices.into_iter().collect())),
            owner: None,
        }
    }

    /// Blind to every member of a shared cohort set except `owner`.
    pub fn for_member(members: Arc<BTreeSet<usize>>, owner: usize) -> Self {
        BlindList {
            members: Some(members),
            owner: Some(owner),
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        match &self.members {
            Some(set) => self.owner != Some(index) && set.contains(&index),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.members {
            Some(set) => set.iter().all(|&i| self.owner == Some(i)),
            None => true,
        }
    }
}

/// Snapshot re-expressed around one origin pose.
///
/// Positions are displacements from the origin (wrapped into
/// `[-side/2, side/2)`), optionally rotated so the origin heading is angle 0.
/// Headings are shifted by the same rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct RelativeField {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub a: Vec<f64>,
    pub side: f64,
}

impl RelativeField {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Euclidean distance of point `i` from the origin.
    #[inline]
    pub fn distance(&self, i: usize) -> f64 {
        self.x[i].hypot(self.y[i])
    }

    /// Signed bearing of point `i` in `(-π, π]`.
    #[inline]
    pub fn bearing(&self, i: usize) -> f64 {
        self.y[i].atan2(self.x[i])
    }

    /// Indices within distance `r` of the origin (inclusive).
    ///
    /// With `include_self == false` every point at distance exactly 0 is
    /// dropped, which is how the origin agent removes itself; a different
    /// agent sharing its exact position is dropped too. Blind indices are
    /// removed afterwards, regardless of distance.
    pub fn near(&self, r: f64, include_self: bool, blind: &BlindList) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| {
                let d = self.distance(i);
                d <= r && (include_self || d > 0.0)
            })
            .filter(|&i| !blind.contains(i))
            .collect()
    }
}
