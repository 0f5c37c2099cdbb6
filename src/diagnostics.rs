//! Reaction-time diagnostics log.
//!
//! The measurement mode appends one record per completed run; records live
//! in memory until the shutdown path exports them. Export is best-effort
//! and append-only: the CSV file is created with a header when absent,
//! otherwise rows are appended, and any failure is logged without blocking
//! the remaining shutdown sequence.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

pub const TRIALS_PER_RECORD: usize = 10;

/// Whether the measurement ran before or after the intervention session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Moment {
    Before,
    After,
}

impl Moment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Which protocol condition the subject was measured under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Game,
    Real,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Real => "real",
        }
    }
}

/// One completed measurement run: metadata plus ten trial slots.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionRecord {
    pub timestamp: DateTime<Local>,
    pub subject_id: i64,
    pub moment: Moment,
    pub condition: Condition,
    /// Trial slots in protocol order; `None` renders as an empty cell.
    pub reaction_times_ms: [Option<u64>; TRIALS_PER_RECORD],
}

impl ReactionRecord {
    pub fn open(subject_id: i64, moment: Moment, condition: Condition) -> Self {
        Self {
            timestamp: Local::now(),
            subject_id,
            moment,
            condition,
            reaction_times_ms: [None; TRIALS_PER_RECORD],
        }
    }

    pub fn set_trial(&mut self, index: usize, elapsed_ms: u64) {
        if let Some(slot) = self.reaction_times_ms.get_mut(index) {
            *slot = Some(elapsed_ms);
        }
    }

    fn csv_row(&self) -> String {
        let mut row = format!(
            "{},{},{},{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.subject_id,
            self.moment.as_str(),
            self.condition.as_str(),
        );
        for slot in &self.reaction_times_ms {
            match slot {
                Some(ms) => {
                    let _ = write!(row, ",{ms}");
                }
                None => row.push(','),
            }
        }
        row
    }
}

fn csv_header() -> String {
    let mut header = String::from("timestamp,subject_id,measurement_moment,test_condition");
    for i in 1..=TRIALS_PER_RECORD {
        let _ = write!(header, ",reaction_time_{i}");
    }
    header
}

/// In-memory append-only sink.
#[derive(Default)]
pub struct DiagnosticsLog {
    records: Vec<ReactionRecord>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ReactionRecord) {
        info!(
            "diagnostics: record appended (subject {}, {} {})",
            record.subject_id,
            record.condition.as_str(),
            record.moment.as_str()
        );
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReactionRecord] {
        &self.records
    }

    /// Write every record to `path`, creating the file with a header when
    /// absent, appending otherwise.
    pub fn export(&self, path: &Path) -> Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }

        let fresh = !path.exists();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Export(e.to_string()))?;

        if fresh {
            writeln!(file, "{}", csv_header()).map_err(|e| Error::Export(e.to_string()))?;
        }
        for record in &self.records {
            writeln!(file, "{}", record.csv_row()).map_err(|e| Error::Export(e.to_string()))?;
        }
        info!("diagnostics: exported {} record(s) to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Shutdown-path export: failures are logged, never propagated.
    pub fn export_best_effort(&self, path: &Path) {
        if let Err(e) = self.export(path) {
            warn!("diagnostics export failed ({e}), records lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> ReactionRecord {
        let mut r = ReactionRecord::open(42, Moment::Before, Condition::Game);
        for i in 0..TRIALS_PER_RECORD {
            r.set_trial(i, 300 + i as u64);
        }
        r
    }

    #[test]
    fn csv_row_has_fourteen_fields() {
        let row = full_record().csv_row();
        assert_eq!(row.split(',').count(), 4 + TRIALS_PER_RECORD);
        assert!(row.contains(",game"));
        assert!(row.contains(",before"));
    }

    #[test]
    fn empty_trial_slots_render_as_empty_cells() {
        let r = ReactionRecord::open(1, Moment::After, Condition::Real);
        let row = r.csv_row();
        assert!(row.ends_with(&",".repeat(TRIALS_PER_RECORD)));
    }

    #[test]
    fn export_creates_file_with_header_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reaction_log.csv");

        let mut log = DiagnosticsLog::new();
        log.append(full_record());
        log.export(&path).unwrap();

        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.starts_with("timestamp,subject_id"));
        assert_eq!(first.lines().count(), 2);

        // Second export appends without a second header.
        log.export(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(second.lines().count(), 3);
        assert_eq!(second.matches("timestamp,subject_id").count(), 1);
    }

    #[test]
    fn empty_log_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reaction_log.csv");
        DiagnosticsLog::new().export(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn best_effort_export_swallows_errors() {
        let mut log = DiagnosticsLog::new();
        log.append(full_record());
        // Unwritable destination: a directory path.
        let dir = tempfile::tempdir().unwrap();
        log.export_best_effort(dir.path());
        assert_eq!(log.len(), 1); // records untouched
    }
}
