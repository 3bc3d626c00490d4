//! SQLite-backed roster provider and attendance sink.
//!
//! The store plays the part of the attendance spreadsheet: a students sheet
//! and an append-style attendance sheet, with recap and trend queries
//! computed on read.

use crate::collab::{
    AttendanceSink, AttendanceSubmission, CollabError, NewStudent, Result, RosterProvider,
};
use crate::dates::{self, Month, SchoolYear, Semester};
use crate::db;
use crate::ledger::AttendanceStatus;
use crate::recap::{percent, PercentPrecision, RecapRow, StatusSummary};
use crate::roster::{label_matches, Student};
use chrono::Datelike;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// Precision of the `attendancePercent` column the sheet reports.
const SHEET_PERCENT_PRECISION: PercentPrecision = PercentPrecision::Two;

pub struct SheetStore {
    conn: Connection,
}

impl SheetStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: db::open_db(workspace)?,
        })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn national_id_taken(&self, national_id: &str) -> Result<bool> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM students WHERE national_id = ?",
                [national_id],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .is_some())
    }

    // Counts for one calendar month, grouped by class label so the caller can
    // filter with the same trimmed-exact rule as everywhere else.
    fn month_counts_by_class(
        &self,
        year: i32,
        month: Month,
    ) -> Result<Vec<(Option<String>, StatusSummary)>> {
        let mut stmt = self.conn.prepare(
            "SELECT class_label, status, COUNT(*)
             FROM attendance
             WHERE year = ? AND month = ?
             GROUP BY class_label, status",
        )?;
        let rows = stmt
            .query_map((year, month.number()), |r| {
                Ok((
                    r.get::<_, Option<String>>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, u32>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut out: Vec<(Option<String>, StatusSummary)> = Vec::new();
        for (class_label, status, count) in rows {
            let status: AttendanceStatus = match status.parse() {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping attendance rows with unknown status");
                    continue;
                }
            };
            let idx = match out.iter().position(|(c, _)| *c == class_label) {
                Some(i) => i,
                None => {
                    out.push((class_label, StatusSummary::default()));
                    out.len() - 1
                }
            };
            out[idx].1.record_many(status, count);
        }
        Ok(out)
    }
}

fn class_filter_matches(class_label: Option<&str>, class_filter: &str) -> bool {
    class_filter.is_empty() || label_matches(class_label, class_filter)
}

impl RosterProvider for SheetStore {
    fn fetch_roster(&self) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, national_id, class_label
             FROM students
             ORDER BY sort_order",
        )?;
        let roster = stmt
            .query_map([], |r| {
                Ok(Student {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    national_id: r.get(2)?,
                    class_label: r.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(roster)
    }

    fn add_student(&self, student: &NewStudent) -> Result<Student> {
        if self.national_id_taken(&student.national_id)? {
            return Err(CollabError::Duplicate(student.national_id.clone()));
        }
        let id = Uuid::new_v4().to_string();
        let sort_order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM students",
            [],
            |r| r.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO students(id, national_id, name, class_label, sort_order)
             VALUES(?, ?, ?, ?, ?)",
            (
                &id,
                &student.national_id,
                &student.name,
                &student.class_label,
                sort_order,
            ),
        )?;
        tracing::info!(student_id = %id, national_id = %student.national_id, "student added");
        Ok(Student {
            id,
            name: student.name.clone(),
            national_id: student.national_id.clone(),
            class_label: Some(student.class_label.clone()),
        })
    }

    fn update_student(&self, old_national_id: &str, student: &NewStudent) -> Result<()> {
        if student.national_id != old_national_id && self.national_id_taken(&student.national_id)? {
            return Err(CollabError::Duplicate(student.national_id.clone()));
        }
        let changed = self.conn.execute(
            "UPDATE students SET national_id = ?, name = ?, class_label = ?
             WHERE national_id = ?",
            (
                &student.national_id,
                &student.name,
                &student.class_label,
                old_national_id,
            ),
        )?;
        if changed == 0 {
            return Err(CollabError::NotFound(old_national_id.to_string()));
        }
        tracing::info!(old_national_id, national_id = %student.national_id, "student updated");
        Ok(())
    }

    fn delete_student(&self, national_id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE national_id = ?", [national_id])?;
        if changed == 0 {
            return Err(CollabError::NotFound(national_id.to_string()));
        }
        tracing::info!(national_id, "student deleted");
        Ok(())
    }
}

impl AttendanceSink for SheetStore {
    fn submit_attendance(&self, date: &str, records: &[AttendanceSubmission]) -> Result<usize> {
        let day = dates::parse_display(date).map_err(|e| CollabError::Invalid(e.to_string()))?;
        if let Some(stray) = records.iter().find(|r| r.date != date) {
            return Err(CollabError::Invalid(format!(
                "record for {} dated {}, expected {}",
                stray.student_name, stray.date, date
            )));
        }
        let date_key = dates::to_iso(day);
        let year = day.year();
        let month = Month::of(day).number();
        let submitted_at = chrono::Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        for r in records {
            tx.execute(
                "INSERT INTO attendance(date_key, year, month, national_id, student_name, class_label, status, submitted_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(date_key, national_id, student_name) DO UPDATE SET
                   class_label = excluded.class_label,
                   status = excluded.status,
                   submitted_at = excluded.submitted_at",
                (
                    &date_key,
                    year,
                    month,
                    &r.national_id,
                    &r.student_name,
                    &r.class_label,
                    r.status.label(),
                    &submitted_at,
                ),
            )?;
        }
        tx.commit()?;
        tracing::info!(date, records = records.len(), "attendance day stored");
        Ok(records.len())
    }

    fn query_monthly_recap(
        &self,
        class_filter: &str,
        month: Month,
        school_year: SchoolYear,
    ) -> Result<Vec<RecapRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_name, class_label,
                    SUM(CASE WHEN status = 'Hadir' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'Alpha' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'Izin' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'Sakit' THEN 1 ELSE 0 END)
             FROM attendance
             WHERE year = ? AND month = ?
             GROUP BY national_id, student_name, class_label
             ORDER BY student_name, national_id",
        )?;
        let rows = stmt
            .query_map((school_year.year_of(month), month.number()), |r| {
                Ok(RecapRow {
                    student_name: r.get(0)?,
                    class_label: r.get(1)?,
                    present: r.get(2)?,
                    absent: r.get(3)?,
                    leave: r.get(4)?,
                    sick: r.get(5)?,
                    attendance_percent: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter(|r| class_filter_matches(r.class_label.as_deref(), class_filter))
            .map(|mut r| {
                let counts = r.counts();
                r.attendance_percent =
                    Some(percent(counts.present, &counts, SHEET_PERCENT_PRECISION));
                r
            })
            .collect())
    }

    fn query_graph_data(
        &self,
        class_filter: &str,
        semester: Semester,
        school_year: SchoolYear,
    ) -> Result<Vec<(Month, StatusSummary)>> {
        let mut out = Vec::with_capacity(6);
        for month in semester.months() {
            let mut summary = StatusSummary::default();
            for (class_label, counts) in
                self.month_counts_by_class(school_year.year_of(month), month)?
            {
                if class_filter_matches(class_label.as_deref(), class_filter) {
                    summary.add(&counts);
                }
            }
            out.push((month, summary));
        }
        Ok(out)
    }
}
