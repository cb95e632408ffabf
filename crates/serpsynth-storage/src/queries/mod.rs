//! Per-table query modules.

pub mod aggregated;
pub mod clicks;
pub mod consistency;
pub mod positions;
pub mod raw;
pub mod runs;

use rusqlite::types::{FromSqlError, Type};
use serpsynth_core::types::Device;

/// Parse a persisted device column, surfacing bad values as a conversion error.
pub(crate) fn device_from_column(idx: usize, value: String) -> rusqlite::Result<Device> {
    value.parse::<Device>().map_err(|message| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(FromSqlError::Other(message.into())),
        )
    })
}
