//! PositionGenerator: one synthetic rank per impression, with the per-row
//! rank sum reconciled to `ceil(position × impressions)`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;
use serpsynth_core::errors::StageError;
use serpsynth_core::types::PositionSample;
use serpsynth_storage::queries::aggregated::{self, PendingPositions};
use serpsynth_storage::queries::positions;
use serpsynth_storage::DatabaseManager;

use super::EtlStage;

const STAGE: &str = "positions";

/// Largest average rank whose bounds and reconciled ranks still fit in `u32`.
pub const MAX_AVERAGE_POSITION: f64 = (u32::MAX - 4) as f64;

/// Rank range and per-trial success probability for one aggregated row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionBounds {
    pub min: u32,
    pub max: u32,
    pub p: f64,
}

impl PositionBounds {
    /// Bounds centred on `avg`. None when `avg` is negative, non-finite or
    /// above [`MAX_AVERAGE_POSITION`].
    pub fn for_average(avg: f64) -> Option<Self> {
        if !avg.is_finite() || !(0.0..=MAX_AVERAGE_POSITION).contains(&avg) {
            return None;
        }
        let min = (avg - 1.5).floor().max(1.0) as u32;
        let mut max = (avg + 1.5).ceil() as u32;
        if max <= min {
            max = min + 1;
        }
        let p = (avg - f64::from(min)) / f64::from(max - min);
        let p = if p.is_finite() { p.clamp(0.05, 0.95) } else { 0.5 };
        Some(Self { min, max, p })
    }

    pub fn width(&self) -> u32 {
        self.max - self.min
    }
}

/// `min + Binomial(width, p)` for each of `n` impressions, in generation order.
pub fn generate_positions<R: Rng + ?Sized>(n: usize, bounds: &PositionBounds, rng: &mut R) -> Vec<u32> {
    (0..n)
        .map(|_| {
            let offset = (0..bounds.width()).filter(|_| rng.gen_bool(bounds.p)).count() as u32;
            bounds.min + offset
        })
        .collect()
}

/// Target rank sum for a row.
pub fn target_sum(avg: f64, n: usize) -> u64 {
    (avg * n as f64).ceil().max(0.0) as u64
}

/// Move the sum of `positions` to `target` one unit at a time, always
/// touching the current smallest (when raising) or largest (when lowering)
/// value, earliest index first on ties. Never lowers a value below 1.
/// Returns the realized sum, which differs from `target` only when every
/// value already sits at 1.
pub fn reconcile_sum(positions: &mut [u32], target: u64) -> u64 {
    let mut sum: u64 = positions.iter().map(|&v| u64::from(v)).sum();

    if target > sum {
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = positions
            .iter()
            .enumerate()
            .map(|(i, &v)| Reverse((v, i)))
            .collect();
        while sum < target {
            let Some(Reverse((v, i))) = heap.pop() else {
                break;
            };
            positions[i] = v + 1;
            sum += 1;
            heap.push(Reverse((v + 1, i)));
        }
    } else if target < sum {
        let mut heap: BinaryHeap<(u32, Reverse<usize>)> = positions
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, Reverse(i)))
            .collect();
        while sum > target {
            let Some((v, Reverse(i))) = heap.pop() else {
                break;
            };
            if v <= 1 {
                break;
            }
            positions[i] = v - 1;
            sum -= 1;
            heap.push((v - 1, Reverse(i)));
        }
    }

    sum
}

/// Generate and reconcile the full sample set for one aggregated row.
pub fn samples_for_row<R: Rng + ?Sized>(
    row: &PendingPositions,
    rng: &mut R,
) -> Result<Vec<PositionSample>, StageError> {
    let n = usize::try_from(row.impressions).map_err(|_| {
        StageError::transformation(STAGE, format!("id {}: bad impressions {}", row.id, row.impressions))
    })?;
    let bounds = PositionBounds::for_average(row.position).ok_or_else(|| {
        StageError::transformation(STAGE, format!("id {}: bad position {}", row.id, row.position))
    })?;

    let mut ranks = generate_positions(n, &bounds, rng);
    let target = target_sum(row.position, n);
    let realized = reconcile_sum(&mut ranks, target);
    if realized != target {
        tracing::warn!(id = row.id, target, realized, "rank sum unreachable, all ranks at 1");
    }

    ranks
        .into_iter()
        .enumerate()
        .map(|(i, rank)| {
            let order = u32::try_from(i + 1).map_err(|_| {
                StageError::transformation(STAGE, format!("id {}: too many impressions", row.id))
            })?;
            Ok(PositionSample {
                id: row.id,
                impression_position: rank,
                impression_order: order,
            })
        })
        .collect()
}

pub struct PositionGenerator<'a, R> {
    db: &'a DatabaseManager,
    rng: R,
    batch_size: usize,
}

impl<'a, R: Rng> PositionGenerator<'a, R> {
    pub fn new(db: &'a DatabaseManager, rng: R, batch_size: usize) -> Self {
        Self {
            db,
            rng,
            batch_size,
        }
    }
}

impl<R: Rng> EtlStage for PositionGenerator<'_, R> {
    const NAME: &'static str = STAGE;

    type Item = PendingPositions;
    type Output = PositionSample;

    fn extract(&mut self) -> Result<Vec<PendingPositions>, StageError> {
        self.db
            .with_conn(aggregated::pending_positions)
            .map_err(StageError::extraction(Self::NAME))
    }

    fn transform(&mut self, items: &[PendingPositions]) -> Result<Vec<PositionSample>, StageError> {
        let mut out = Vec::new();
        for row in items {
            out.extend(samples_for_row(row, &mut self.rng)?);
        }
        Ok(out)
    }

    fn load(&mut self, rows: Vec<PositionSample>) -> Result<usize, StageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.db
            .with_transaction(|tx| positions::insert_batch(tx, &rows))
            .map_err(StageError::load(Self::NAME))
    }

    fn chunk_size(&self) -> usize {
        self.batch_size
    }
}
