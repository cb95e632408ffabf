//! ClicksGenerator: attribute each reported click to one synthetic impression
//! by rank- and order-weighted sampling.

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use serpsynth_core::errors::StageError;
use serpsynth_core::types::{ClickSample, PositionSample};
use serpsynth_storage::queries::aggregated::{self, PendingClicks};
use serpsynth_storage::queries::{clicks, positions};
use serpsynth_storage::DatabaseManager;

use super::EtlStage;

const STAGE: &str = "clicks";

/// Click propensity for ranks 1 through 10.
pub const RANK_WEIGHTS: [f64; 10] = [0.30, 0.15, 0.08, 0.05, 0.03, 0.02, 0.015, 0.012, 0.01, 0.008];

/// Click propensity for any rank beyond 10.
pub const TAIL_RANK_WEIGHT: f64 = 0.005;

pub fn rank_weight(rank: u32) -> f64 {
    match rank {
        1..=10 => RANK_WEIGHTS[rank as usize - 1],
        _ => TAIL_RANK_WEIGHT,
    }
}

/// Attention decay along the synthetic impression sequence.
pub fn time_decay(order: u32) -> f64 {
    1.0 / (1.0 + 0.1 * f64::from(order))
}

/// Normalized sampling weights, one per candidate. Falls back to uniform
/// when the raw weights do not sum to a positive finite total.
pub fn click_weights(candidates: &[PositionSample]) -> Vec<f64> {
    let raw: Vec<f64> = candidates
        .iter()
        .map(|c| rank_weight(c.impression_position) * time_decay(c.impression_order))
        .collect();
    let total: f64 = raw.iter().sum();
    if total > 0.0 && total.is_finite() {
        raw.into_iter().map(|w| w / total).collect()
    } else {
        let uniform = 1.0 / candidates.len() as f64;
        vec![uniform; candidates.len()]
    }
}

/// Draw `count` candidate indices. Without replacement while
/// `count <= weights.len()`, with replacement beyond that. The
/// without-replacement path is a single weighted pass over the candidates.
pub fn draw_indices<R: Rng + ?Sized>(
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Result<Vec<usize>, WeightedError> {
    if count > weights.len() {
        let dist = WeightedIndex::new(weights)?;
        return Ok((0..count).map(|_| dist.sample(&mut *rng)).collect());
    }

    Ok(index::sample_weighted(rng, weights.len(), |i| weights[i], count)?.into_vec())
}

/// Click samples for one aggregated row, given its impressions ordered by
/// `impression_order`.
pub fn samples_for_row<R: Rng + ?Sized>(
    row: &PendingClicks,
    impressions: &[PositionSample],
    rng: &mut R,
) -> Result<Vec<ClickSample>, StageError> {
    let count = usize::try_from(row.clicks).map_err(|_| {
        StageError::transformation(STAGE, format!("id {}: bad clicks {}", row.id, row.clicks))
    })?;
    if count > impressions.len() {
        tracing::debug!(
            id = row.id,
            clicks = count,
            impressions = impressions.len(),
            "more clicks than impressions, sampling with replacement"
        );
    }

    let weights = click_weights(impressions);
    let drawn = draw_indices(&weights, count, rng)
        .map_err(|e| StageError::transformation(STAGE, format!("id {}: {e}", row.id)))?;

    Ok(drawn.into_iter().map(|i| ClickSample::from(&impressions[i])).collect())
}

pub struct ClicksGenerator<'a, R> {
    db: &'a DatabaseManager,
    rng: R,
    batch_size: usize,
}

impl<'a, R: Rng> ClicksGenerator<'a, R> {
    pub fn new(db: &'a DatabaseManager, rng: R, batch_size: usize) -> Self {
        Self {
            db,
            rng,
            batch_size,
        }
    }
}

impl<R: Rng> EtlStage for ClicksGenerator<'_, R> {
    const NAME: &'static str = STAGE;

    type Item = PendingClicks;
    type Output = ClickSample;

    fn extract(&mut self) -> Result<Vec<PendingClicks>, StageError> {
        self.db
            .with_conn(aggregated::pending_clicks)
            .map_err(StageError::extraction(Self::NAME))
    }

    fn transform(&mut self, items: &[PendingClicks]) -> Result<Vec<ClickSample>, StageError> {
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for row in items {
            let impressions = self
                .db
                .with_conn(|conn| positions::for_id(conn, row.id))
                .map_err(StageError::extraction(Self::NAME))?;
            if impressions.is_empty() {
                skipped += 1;
                tracing::debug!(id = row.id, "no position samples yet, skipping");
                continue;
            }
            out.extend(samples_for_row(row, &impressions, &mut self.rng)?);
        }
        if skipped > 0 {
            tracing::info!(skipped, "rows awaiting position samples");
        }
        Ok(out)
    }

    fn load(&mut self, rows: Vec<ClickSample>) -> Result<usize, StageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.db
            .with_transaction(|tx| clicks::insert_batch(tx, &rows))
            .map_err(StageError::load(Self::NAME))
    }

    fn chunk_size(&self) -> usize {
        self.batch_size
    }
}
