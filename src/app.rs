//! Session context: the collaborators, the current roster, and the ledger.
//!
//! One `AppContext` exists per open workspace. IPC handlers borrow it for
//! the length of a request; nothing else holds a copy of the roster or the
//! ledger.

use crate::collab::{AttendanceSink, CollabError, NewStudent, Result, RosterProvider};
use crate::dates::{self, Month, SchoolYear, Semester};
use crate::ledger::{AttendanceLedger, AttendanceStatus};
use crate::recap::{self, ExportTable, PercentPrecision, RecapRow, StatusSummary};
use crate::roster::{self, Student};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub student: Student,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: String,
    pub display_date: String,
    pub class_label: String,
    /// True when this call created the day's entry.
    pub initialized: bool,
    pub total_students: usize,
    pub entries: Vec<DayEntry>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecap {
    pub month: &'static str,
    pub school_year: String,
    pub class_label: String,
    pub rows: Vec<RecapRow>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTrend {
    pub month: &'static str,
    #[serde(flatten)]
    pub summary: StatusSummary,
}

pub struct AppContext {
    provider: Box<dyn RosterProvider>,
    sink: Box<dyn AttendanceSink>,
    roster: Vec<Student>,
    /// Set when the last roster reload failed; `roster` is then out of date.
    roster_stale: bool,
    ledger: AttendanceLedger,
    precision: PercentPrecision,
}

impl AppContext {
    pub fn new(
        provider: Box<dyn RosterProvider>,
        sink: Box<dyn AttendanceSink>,
        precision: PercentPrecision,
    ) -> Self {
        Self {
            provider,
            sink,
            roster: Vec::new(),
            roster_stale: false,
            ledger: AttendanceLedger::new(),
            precision,
        }
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn roster_stale(&self) -> bool {
        self.roster_stale
    }

    pub fn ledger(&self) -> &AttendanceLedger {
        &self.ledger
    }

    pub fn classes(&self) -> Vec<String> {
        roster::normalize_classes(&self.roster)
    }

    /// Reload the roster. On failure the previous roster stays in place.
    pub fn refresh_roster(&mut self) -> Result<usize> {
        match self.provider.fetch_roster() {
            Ok(students) => {
                self.roster = students;
                self.roster_stale = false;
                tracing::info!(students = self.roster.len(), "roster refreshed");
                Ok(self.roster.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, kept = self.roster.len(), "roster refresh failed");
                self.roster_stale = true;
                Err(e)
            }
        }
    }

    // An edit has already landed once the provider returns; a failed reload
    // afterwards only marks the roster stale.
    fn refresh_after_edit(&mut self) {
        if self.refresh_roster().is_err() {
            tracing::warn!("roster edit saved but reload failed");
        }
    }

    pub fn add_student(&mut self, student: &NewStudent) -> Result<Student> {
        let created = self.provider.add_student(student)?;
        self.refresh_after_edit();
        Ok(created)
    }

    pub fn update_student(&mut self, old_national_id: &str, student: &NewStudent) -> Result<()> {
        self.provider.update_student(old_national_id, student)?;
        self.refresh_after_edit();
        Ok(())
    }

    pub fn delete_student(&mut self, national_id: &str) -> Result<()> {
        self.provider.delete_student(national_id)?;
        self.refresh_after_edit();
        Ok(())
    }

    /// View a day for one class (or the wildcard), initializing it on first
    /// access.
    pub fn open_day(&mut self, date: NaiveDate, selected: &str) -> DayView {
        let initialized = self.ledger.ensure_day(date, &self.roster);
        let filtered = roster::filter_roster(&self.roster, selected);
        let summary = self.ledger.day_summary(date, filtered.iter().copied());
        let entries = filtered
            .into_iter()
            .map(|s| DayEntry {
                student: s.clone(),
                status: self.ledger.status_of(date, &s.id),
            })
            .collect();
        DayView {
            date: dates::to_iso(date),
            display_date: dates::to_display(date),
            class_label: selected.to_string(),
            initialized,
            total_students: self.roster.len(),
            entries,
            summary,
        }
    }

    /// Record one student's status. Only students on the current roster can
    /// be marked.
    pub fn set_status(
        &mut self,
        date: NaiveDate,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<AttendanceStatus> {
        if !self.roster.iter().any(|s| s.id == student_id) {
            return Err(CollabError::NotFound(student_id.to_string()));
        }
        Ok(self.ledger.set_status(date, student_id, status))
    }

    /// Send the day's snapshot for the selected class to the sink. The local
    /// ledger is left as is either way.
    pub fn save_day(&self, date: NaiveDate, selected: &str) -> Result<usize> {
        let filtered = roster::filter_roster(&self.roster, selected);
        if filtered.is_empty() {
            tracing::info!(%date, class = selected, "nothing to save");
            return Ok(0);
        }
        let records = self.ledger.snapshot(date, filtered);
        let display_date = dates::to_display(date);
        match self.sink.submit_attendance(&display_date, &records) {
            Ok(n) => {
                tracing::info!(
                    date = %display_date,
                    class = selected,
                    records = n,
                    "attendance saved"
                );
                Ok(n)
            }
            Err(e) => {
                tracing::warn!(
                    date = %display_date,
                    class = selected,
                    error = %e,
                    "attendance save failed"
                );
                Err(e)
            }
        }
    }

    pub fn monthly_recap(
        &self,
        selected: &str,
        month: Month,
        school_year: SchoolYear,
    ) -> Result<MonthlyRecap> {
        let fetched = self.sink.query_monthly_recap(
            roster::sink_class_filter(selected),
            month,
            school_year,
        )?;
        let rows: Vec<RecapRow> = recap::filter_rows(&fetched, selected)
            .into_iter()
            .cloned()
            .collect();
        let summary = recap::summarize(&rows);
        Ok(MonthlyRecap {
            month: month.name(),
            school_year: school_year.label(),
            class_label: selected.to_string(),
            rows,
            summary,
        })
    }

    pub fn export_recap(
        &self,
        selected: &str,
        month: Month,
        school_year: SchoolYear,
    ) -> Result<ExportTable> {
        let recap = self.monthly_recap(selected, month, school_year)?;
        Ok(recap::export_table(&recap.rows, self.precision))
    }

    pub fn semester_trend(
        &self,
        selected: &str,
        semester: Semester,
        school_year: SchoolYear,
    ) -> Result<Vec<MonthTrend>> {
        let data = self.sink.query_graph_data(
            roster::sink_class_filter(selected),
            semester,
            school_year,
        )?;
        Ok(data
            .into_iter()
            .map(|(month, summary)| MonthTrend {
                month: month.name(),
                summary,
            })
            .collect())
    }
}
