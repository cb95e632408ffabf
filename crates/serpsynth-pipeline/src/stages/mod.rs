//! ETL stages and the interface the coordinator drives them through.

pub mod aggregator;
pub mod clicks;
pub mod positions;

pub use aggregator::Aggregator;
pub use clicks::ClicksGenerator;
pub use positions::PositionGenerator;

use serpsynth_core::errors::StageError;

/// Extract / transform / load capability implemented by every stage.
///
/// `extract` selects all unprocessed work; `transform` and `load` then run
/// once per chunk of `chunk_size` items, so each `load` call is one commit.
pub trait EtlStage {
    /// Stage name used in stats, logs and errors.
    const NAME: &'static str;

    /// Unit of extracted work (a source row).
    type Item;
    /// Unit written by `load`.
    type Output;

    fn extract(&mut self) -> Result<Vec<Self::Item>, StageError>;

    fn transform(&mut self, items: &[Self::Item]) -> Result<Vec<Self::Output>, StageError>;

    /// Persist one chunk atomically. Returns rows written.
    fn load(&mut self, rows: Vec<Self::Output>) -> Result<usize, StageError>;

    /// Items per transform/load round. Default: the whole extraction.
    fn chunk_size(&self) -> usize {
        usize::MAX
    }
}

/// Object-safe view of a stage, as held by the coordinator.
pub trait PipelineStage {
    fn name(&self) -> &'static str;

    /// Run extract → transform → load. Returns rows written.
    fn run(&mut self) -> Result<usize, StageError>;
}

impl<S: EtlStage> PipelineStage for S {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn run(&mut self) -> Result<usize, StageError> {
        let span = tracing::info_span!("stage", stage = S::NAME);
        let _entered = span.enter();

        let items = self.extract()?;
        if items.is_empty() {
            tracing::info!("no new rows to process");
            return Ok(0);
        }
        tracing::info!(rows_extracted = items.len(), "extracted");

        let mut written = 0;
        for chunk in items.chunks(self.chunk_size().max(1)) {
            let rows = self.transform(chunk)?;
            written += self.load(rows)?;
        }

        tracing::info!(rows_written = written, "stage complete");
        Ok(written)
    }
}
