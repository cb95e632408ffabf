//! serpsynth-pipeline: the three-stage generation pipeline.
//!
//! raw records → [`stages::Aggregator`] → aggregated facts →
//! [`stages::PositionGenerator`] → position samples →
//! [`stages::ClicksGenerator`] → click samples, sequenced by
//! [`coordinator::Coordinator`]. The [`ingest`] module fills the raw table
//! from an upstream source.

pub mod consistency;
pub mod coordinator;
pub mod ingest;
pub mod rng;
pub mod stages;

pub use consistency::{ConsistencyReport, ConsistencyWarning};
pub use coordinator::{Coordinator, PipelineStats};
pub use ingest::{JsonLinesSource, RawLoader, SearchAnalyticsSource, StaticSource, SyncReport};
pub use stages::{Aggregator, ClicksGenerator, EtlStage, PipelineStage, PositionGenerator};
