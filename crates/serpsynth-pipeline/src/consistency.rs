//! Cross-table consistency checks. Read-only: anomalies are reported, never
//! repaired.

use std::fmt;

use rusqlite::Connection;
use serpsynth_core::errors::StorageError;
use serpsynth_storage::queries::consistency;

pub const ROWS_MISSING_POSITIONS: &str = "rows_missing_positions";
pub const ORPHANED_CLICKS: &str = "orphaned_clicks";
pub const POSITION_COUNT_MISMATCH: &str = "position_count_mismatch";
pub const CLICK_COUNT_MISMATCH: &str = "click_count_mismatch";

type CheckFn = fn(&Connection) -> Result<i64, StorageError>;

const CHECKS: [(&str, CheckFn); 4] = [
    (ROWS_MISSING_POSITIONS, consistency::count_rows_missing_positions),
    (ORPHANED_CLICKS, consistency::count_orphaned_clicks),
    (POSITION_COUNT_MISMATCH, consistency::count_position_count_mismatch),
    (CLICK_COUNT_MISMATCH, consistency::count_click_count_mismatch),
];

/// A nonzero consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub check: &'static str,
    pub anomalies: i64,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} anomalies", self.check, self.anomalies)
    }
}

/// Anomaly count per check, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub checks: Vec<(&'static str, i64)>,
}

impl ConsistencyReport {
    pub fn get(&self, check: &str) -> Option<i64> {
        self.checks
            .iter()
            .find(|(name, _)| *name == check)
            .map(|(_, n)| *n)
    }

    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(|(_, n)| *n == 0)
    }

    pub fn warnings(&self) -> Vec<ConsistencyWarning> {
        self.checks
            .iter()
            .filter(|(_, n)| *n != 0)
            .map(|&(check, anomalies)| ConsistencyWarning { check, anomalies })
            .collect()
    }
}

/// Run every check against the store.
pub fn run_checks(conn: &Connection) -> Result<ConsistencyReport, StorageError> {
    let checks = CHECKS
        .iter()
        .map(|&(name, check)| check(conn).map(|anomalies| (name, anomalies)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConsistencyReport { checks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_list_nonzero_checks() {
        let report = ConsistencyReport {
            checks: vec![(ROWS_MISSING_POSITIONS, 0), (ORPHANED_CLICKS, 3)],
        };
        assert!(!report.is_consistent());
        assert_eq!(report.get(ORPHANED_CLICKS), Some(3));
        assert_eq!(report.get("nope"), None);
        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "orphaned_clicks: 3 anomalies");
    }
}
