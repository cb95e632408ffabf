//! Coordinator: runs the stages in their fixed order and audits the result.

use std::time::Instant;

use serpsynth_core::config::PipelineConfig;
use serpsynth_core::errors::{PipelineError, StageError, StorageError};
use serpsynth_storage::queries::runs;
use serpsynth_storage::DatabaseManager;

use crate::consistency::{self, ConsistencyReport};
use crate::rng::{stage_rng, CLICKS_STREAM, POSITIONS_STREAM};
use crate::stages::{Aggregator, ClicksGenerator, PipelineStage, PositionGenerator};

/// Rows written per stage, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    stages: Vec<(&'static str, usize)>,
}

impl PipelineStats {
    pub fn get(&self, stage: &str) -> Option<usize> {
        self.stages
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, rows)| *rows)
    }

    pub fn total(&self) -> usize {
        self.stages.iter().map(|(_, rows)| rows).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.stages.iter().copied()
    }

    fn record(&mut self, stage: &'static str, rows: usize) {
        self.stages.push((stage, rows));
    }
}

pub struct Coordinator<'a> {
    db: &'a DatabaseManager,
    stages: Vec<Box<dyn PipelineStage + 'a>>,
}

impl<'a> Coordinator<'a> {
    /// Aggregator → PositionGenerator → ClicksGenerator over `db`.
    pub fn new(db: &'a DatabaseManager, config: &PipelineConfig) -> Self {
        let batch_size = config.effective_batch_size();
        let stages: Vec<Box<dyn PipelineStage + 'a>> = vec![
            Box::new(Aggregator::new(db)),
            Box::new(PositionGenerator::new(
                db,
                stage_rng(config.seed, POSITIONS_STREAM),
                batch_size,
            )),
            Box::new(ClicksGenerator::new(
                db,
                stage_rng(config.seed, CLICKS_STREAM),
                batch_size,
            )),
        ];
        Self { db, stages }
    }

    /// Coordinator over a caller-supplied stage sequence.
    pub fn with_stages(db: &'a DatabaseManager, stages: Vec<Box<dyn PipelineStage + 'a>>) -> Self {
        Self { db, stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure. Runs that
    /// wrote rows or failed are appended to the run log; a run with nothing
    /// to do leaves the store untouched.
    pub fn run_full_pipeline(&mut self) -> Result<PipelineStats, PipelineError> {
        let started = Instant::now();
        let started_at = chrono::Utc::now().timestamp();
        tracing::info!(stages = self.stages.len(), "pipeline run started");

        let mut stats = PipelineStats::default();
        let mut failure: Option<StageError> = None;
        for stage in &mut self.stages {
            match stage.run() {
                Ok(rows) => stats.record(stage.name(), rows),
                Err(e) => {
                    tracing::error!(stage = stage.name(), error = %e, "stage failed, halting pipeline");
                    failure = Some(e);
                    break;
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as i64;
        if failure.is_none() && stats.total() == 0 {
            tracing::debug!("nothing to do, run not recorded");
        } else if let Err(e) = self.record_outcome(started_at, &stats, duration_ms, failure.as_ref()) {
            tracing::warn!(error = %e, "failed to record pipeline run");
        }

        if let Some(e) = failure {
            return Err(e.into());
        }

        tracing::info!(
            duration_ms,
            total_rows = stats.total(),
            "pipeline run complete"
        );
        for (stage, rows) in stats.iter() {
            tracing::info!(stage, rows, "stage summary");
        }
        Ok(stats)
    }

    /// Audit cross-table invariants. Nonzero checks are logged as warnings
    /// and returned, never raised.
    pub fn check_data_consistency(&self) -> Result<ConsistencyReport, PipelineError> {
        let report = self.db.with_conn(consistency::run_checks)?;
        for warning in report.warnings() {
            tracing::warn!(check = warning.check, anomalies = warning.anomalies, "consistency check failed");
        }
        if report.is_consistent() {
            tracing::info!("all consistency checks passed");
        }
        Ok(report)
    }

    fn record_outcome(
        &self,
        started_at: i64,
        stats: &PipelineStats,
        duration_ms: i64,
        failure: Option<&StageError>,
    ) -> Result<(), StorageError> {
        let (status, error) = match failure {
            None => ("completed", None),
            Some(e) => ("failed", Some(e.to_string())),
        };
        self.db.with_transaction(|tx| {
            let run_id = runs::insert_run_start(tx, started_at)?;
            tracing::debug!(run_id, status, "recording pipeline run");
            for (seq, (stage, rows)) in stats.iter().enumerate() {
                runs::insert_stage_count(tx, run_id, seq, stage, rows)?;
            }
            runs::update_run_complete(
                tx,
                run_id,
                chrono::Utc::now().timestamp(),
                duration_ms,
                status,
                error.as_deref(),
            )
        })
    }
}
