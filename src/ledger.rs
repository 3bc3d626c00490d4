//! In-memory attendance ledger, keyed by date then student id.
//!
//! A day is initialized at most once: the first time it is opened with a
//! non-empty roster every student starts out [`AttendanceStatus::Present`].
//! After that only [`AttendanceLedger::set_status`] touches the day. Students
//! added to the roster later are not back-filled; reads fall back to the same
//! default instead.

use crate::collab::AttendanceSubmission;
use crate::dates;
use crate::recap::StatusSummary;
use crate::roster::Student;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    #[serde(rename = "Hadir")]
    Present,
    #[serde(rename = "Izin")]
    Leave,
    #[serde(rename = "Sakit")]
    Sick,
    #[serde(rename = "Alpha")]
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Leave,
        AttendanceStatus::Sick,
        AttendanceStatus::Absent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Present => "Hadir",
            Self::Leave => "Izin",
            Self::Sick => "Sakit",
            Self::Absent => "Alpha",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attendance status {0:?} (expected Hadir, Izin, Sakit or Alpha)")]
pub struct ParseStatusError(pub String);

impl FromStr for AttendanceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct AttendanceLedger {
    days: BTreeMap<NaiveDate, HashMap<String, AttendanceStatus>>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for `date` with everyone present. Returns `false`
    /// (and changes nothing) when the day already exists or the roster is
    /// empty; an empty entry would block initialization once the roster loads.
    pub fn ensure_day(&mut self, date: NaiveDate, roster: &[Student]) -> bool {
        if roster.is_empty() || self.days.contains_key(&date) {
            return false;
        }
        let day = roster
            .iter()
            .map(|s| (s.id.clone(), AttendanceStatus::Present))
            .collect();
        self.days.insert(date, day);
        tracing::debug!(%date, students = roster.len(), "attendance day initialized");
        true
    }

    pub fn is_initialized(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Overwrite one cell. Returns the status that was in effect before.
    pub fn set_status(
        &mut self,
        date: NaiveDate,
        student_id: &str,
        status: AttendanceStatus,
    ) -> AttendanceStatus {
        let previous = self
            .days
            .entry(date)
            .or_default()
            .insert(student_id.to_string(), status)
            .unwrap_or_default();
        tracing::debug!(%date, student_id, %previous, %status, "attendance status set");
        previous
    }

    /// Present unless a status was recorded for this date and student.
    pub fn status_of(&self, date: NaiveDate, student_id: &str) -> AttendanceStatus {
        self.days
            .get(&date)
            .and_then(|day| day.get(student_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn day_summary<'a, I>(&self, date: NaiveDate, students: I) -> StatusSummary
    where
        I: IntoIterator<Item = &'a Student>,
    {
        let mut summary = StatusSummary::default();
        for s in students {
            summary.record(self.status_of(date, &s.id));
        }
        summary
    }

    /// Save payload for `students` on `date`.
    pub fn snapshot<'a, I>(&self, date: NaiveDate, students: I) -> Vec<AttendanceSubmission>
    where
        I: IntoIterator<Item = &'a Student>,
    {
        let display_date = dates::to_display(date);
        students
            .into_iter()
            .map(|s| AttendanceSubmission {
                date: display_date.clone(),
                student_name: s.name.clone(),
                class_label: s.class_label.clone(),
                national_id: s.national_id.clone(),
                status: self.status_of(date, &s.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, class: &str) -> Student {
        Student {
            id: id.to_string(),
            name: format!("Siswa {}", id),
            national_id: format!("100{}", id),
            class_label: Some(class.to_string()),
        }
    }

    fn day(s: &str) -> NaiveDate {
        dates::parse_iso(s).expect("date")
    }

    #[test]
    fn fresh_day_defaults_everyone_present() {
        let roster = vec![student("1", "3"), student("2", "3")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        assert_eq!(ledger.status_of(d, "1"), AttendanceStatus::Present);
        assert!(ledger.ensure_day(d, &roster));
        for s in &roster {
            assert_eq!(ledger.status_of(d, &s.id), AttendanceStatus::Present);
        }
    }

    #[test]
    fn empty_roster_does_not_initialize() {
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        assert!(!ledger.ensure_day(d, &[]));
        assert!(!ledger.is_initialized(d));
        assert!(ledger.ensure_day(d, &[student("1", "3")]));
    }

    #[test]
    fn initialized_day_is_never_reset() {
        let roster = vec![student("1", "3"), student("2", "3")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        ledger.ensure_day(d, &roster);
        ledger.set_status(d, "1", AttendanceStatus::Absent);
        assert!(!ledger.ensure_day(d, &roster));
        assert_eq!(ledger.status_of(d, "1"), AttendanceStatus::Absent);
    }

    #[test]
    fn set_status_touches_one_cell() {
        let roster = vec![student("1", "3"), student("2", "3"), student("3", "4")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        ledger.ensure_day(d, &roster);
        ledger.set_status(d, "2", AttendanceStatus::Leave);
        let previous = ledger.set_status(d, "1", AttendanceStatus::Absent);
        assert_eq!(previous, AttendanceStatus::Present);
        assert_eq!(ledger.status_of(d, "1"), AttendanceStatus::Absent);
        assert_eq!(ledger.status_of(d, "2"), AttendanceStatus::Leave);
        assert_eq!(ledger.status_of(d, "3"), AttendanceStatus::Present);
    }

    #[test]
    fn switching_dates_keeps_other_days() {
        let roster = vec![student("1", "3")];
        let mut ledger = AttendanceLedger::new();
        let d1 = day("2024-05-01");
        let d2 = day("2024-05-02");
        ledger.ensure_day(d1, &roster);
        ledger.set_status(d1, "1", AttendanceStatus::Sick);
        ledger.ensure_day(d2, &roster);
        assert_eq!(ledger.status_of(d1, "1"), AttendanceStatus::Sick);
        assert_eq!(ledger.status_of(d2, "1"), AttendanceStatus::Present);
        assert_eq!(ledger.days().collect::<Vec<_>>(), vec![d1, d2]);
    }

    #[test]
    fn late_roster_additions_read_as_present() {
        let mut roster = vec![student("1", "3")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        ledger.ensure_day(d, &roster);
        roster.push(student("2", "3"));
        assert!(!ledger.ensure_day(d, &roster));
        assert_eq!(ledger.status_of(d, "2"), AttendanceStatus::Present);
        assert_eq!(ledger.day_summary(d, &roster).present, 2);
    }

    #[test]
    fn summary_after_one_sick_student() {
        let roster = vec![student("1", "3"), student("2", "3")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        ledger.ensure_day(d, &roster);
        ledger.set_status(d, "1", "Sakit".parse().expect("status"));
        assert_eq!(
            ledger.day_summary(d, &roster),
            StatusSummary {
                present: 1,
                leave: 0,
                sick: 1,
                absent: 0
            }
        );
    }

    #[test]
    fn snapshot_uses_display_date_and_current_status() {
        let roster = vec![student("1", "3"), student("2", " 4 ")];
        let mut ledger = AttendanceLedger::new();
        let d = day("2024-05-01");
        ledger.ensure_day(d, &roster);
        ledger.set_status(d, "2", AttendanceStatus::Absent);
        let records = ledger.snapshot(d, &roster);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "01-05-2024");
        assert_eq!(records[0].status, AttendanceStatus::Present);
        assert_eq!(records[1].status, AttendanceStatus::Absent);
        assert_eq!(records[1].class_label.as_deref(), Some(" 4 "));
        assert_eq!(records[1].national_id, "1002");
    }

    #[test]
    fn status_labels_parse_strictly() {
        for status in AttendanceStatus::ALL {
            assert_eq!(status.label().parse::<AttendanceStatus>(), Ok(status));
        }
        assert!("hadir".parse::<AttendanceStatus>().is_err());
        assert!("Alpa".parse::<AttendanceStatus>().is_err());
        assert_eq!(
            serde_json::to_value(AttendanceStatus::Absent).expect("json"),
            serde_json::json!("Alpha")
        );
    }
}
