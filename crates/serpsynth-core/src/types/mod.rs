//! Domain types shared by storage and the pipeline stages.

pub mod device;
pub mod records;

pub use device::Device;
pub use records::{
    AggregatedRecord, ClickSample, PositionSample, RawRow, RawValue, SourceRecord,
};
