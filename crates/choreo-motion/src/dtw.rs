//! Dynamic Time Warping alignment of two feature-vector sequences.
//!
//! ## Recurrence
//!
//! ```text
//! C[0][0] = 0,  C[i][0] = C[0][j] = ∞
//! C[i][j] = D[i-1][j-1] + min(C[i-1][j], C[i][j-1], C[i-1][j-1])
//! ```
//!
//! with `D` the Euclidean distance between frames. Unit step costs, no
//! warping window. Backtracking picks the cheapest of up, left, diagonal and
//! resolves ties in that order, so the path is fully deterministic.
//!
//! Cost is O(n·m) in time and memory.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use choreo_core::{Error, Result};

use crate::encoder::FeatureVector;

/// Divisor applied to `distance / max(n, m)` before clamping to [0, 1]
pub const NORMALIZATION_SCALE: f64 = 10.0;

/// Monotonic frame correspondence between a reference and a candidate sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Accumulated DTW cost `C[n][m]`
    pub distance: f64,
    /// `min(distance / (max(n, m) * 10), 1)`
    pub normalized_distance: f64,
    /// Index pairs `(reference, candidate)`, ascending
    pub path: Vec<(usize, usize)>,
    /// `max(0, 1 - normalized_distance)`
    pub alignment_quality: f64,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Check that every vector in both sequences has the same length
fn check_shape(a: &[FeatureVector], b: &[FeatureVector]) -> Result<()> {
    let Some(expected) = a.first().or_else(|| b.first()).map(FeatureVector::len) else {
        return Ok(());
    };

    match a.iter().chain(b).find(|v| v.len() != expected) {
        Some(v) => Err(Error::ShapeMismatch {
            expected,
            actual: v.len(),
        }),
        None => Ok(()),
    }
}

/// Align two sequences by DTW.
///
/// Fails only on precondition violations: an empty sequence or vectors of
/// unequal length. A non-finite accumulated cost is recovered by falling
/// back to [`linear_alignment`].
pub fn align(a: &[FeatureVector], b: &[FeatureVector]) -> Result<Alignment> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    check_shape(a, b)?;

    let (n, m) = (a.len(), b.len());
    let mut cost = Array2::<f64>::from_elem((n + 1, m + 1), f64::INFINITY);
    cost[[0, 0]] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let d = a[i - 1].euclidean(&b[j - 1]);
            let best = cost[[i - 1, j]]
                .min(cost[[i, j - 1]])
                .min(cost[[i - 1, j - 1]]);
            cost[[i, j]] = d + best;
        }
    }

    let distance = cost[[n, m]];
    // f64::min skips NaN, so a poisoned row can still leave finite
    // neighbours; the final cell is what matters.
    if !distance.is_finite() {
        tracing::warn!(
            "DTW produced non-finite cost ({}) for {}x{} frames, using linear alignment",
            distance,
            n,
            m
        );
        return Ok(linear_alignment(n, m));
    }

    let path = backtrack(&cost);

    let max_len = n.max(m) as f64;
    let raw_normalized = distance / (max_len * NORMALIZATION_SCALE);

    Ok(Alignment {
        distance,
        normalized_distance: raw_normalized.min(1.0),
        path,
        alignment_quality: (1.0 - raw_normalized).max(0.0),
    })
}

/// Walk the cost matrix back from `C[n][m]` to the origin, preferring up,
/// then left, then diagonal on ties
fn backtrack(cost: &Array2<f64>) -> Vec<(usize, usize)> {
    let (rows, cols) = cost.dim();
    let mut path = Vec::with_capacity(rows + cols);
    let (mut i, mut j) = (rows - 1, cols - 1);

    while i > 0 && j > 0 {
        path.push((i - 1, j - 1));

        let up = cost[[i - 1, j]];
        let left = cost[[i, j - 1]];
        let diagonal = cost[[i - 1, j - 1]];

        let (mut next_i, mut next_j, mut best) = (i - 1, j, up);
        if left < best {
            (next_i, next_j, best) = (i, j - 1, left);
        }
        if diagonal < best {
            (next_i, next_j) = (i - 1, j - 1);
        }
        i = next_i;
        j = next_j;
    }

    path.reverse();
    path
}

/// Proportional index mapping used when DTW cannot produce a usable cost.
///
/// Every index of the longer sequence is paired with the proportionally
/// scaled (rounded, clamped) index of the shorter one.
pub fn linear_alignment(n: usize, m: usize) -> Alignment {
    let mut path = Vec::new();

    if n > 0 && m > 0 {
        let (long, short) = (n.max(m), n.min(m));
        for k in 0..long {
            let scaled = ((k * short) as f64 / long as f64).round() as usize;
            let scaled = scaled.min(short - 1);
            path.push(if n >= m { (k, scaled) } else { (scaled, k) });
        }
    }

    Alignment {
        distance: 0.0,
        normalized_distance: 0.5,
        path,
        alignment_quality: 0.5,
    }
}
