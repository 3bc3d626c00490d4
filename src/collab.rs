//! Collaborator seams: where the roster comes from and where attendance goes.
//!
//! The core never talks to storage directly. [`crate::app::AppContext`] is
//! handed one [`RosterProvider`] and one [`AttendanceSink`] at construction.

use crate::dates::{Month, SchoolYear, Semester};
use crate::ledger::AttendanceStatus;
use crate::recap::{RecapRow, StatusSummary};
use crate::roster::Student;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("student not found: {0}")]
    NotFound(String),

    #[error("national id already registered: {0}")]
    Duplicate(String),

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, CollabError>;

/// Fields of a roster entry as entered by a user. All three are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub national_id: String,
    pub name: String,
    pub class_label: String,
}

impl NewStudent {
    pub fn new(national_id: &str, name: &str, class_label: &str) -> Result<Self> {
        let s = Self {
            national_id: national_id.trim().to_string(),
            name: name.trim().to_string(),
            class_label: class_label.trim().to_string(),
        };
        if s.national_id.is_empty() || s.name.is_empty() || s.class_label.is_empty() {
            return Err(CollabError::Invalid(
                "nationalId, name and classLabel are all required".to_string(),
            ));
        }
        Ok(s)
    }
}

/// One row of a day's save payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSubmission {
    /// `DD-MM-YYYY`.
    pub date: String,
    pub student_name: String,
    pub class_label: Option<String>,
    pub national_id: String,
    pub status: AttendanceStatus,
}

pub trait RosterProvider {
    fn fetch_roster(&self) -> Result<Vec<Student>>;
    fn add_student(&self, student: &NewStudent) -> Result<Student>;
    fn update_student(&self, old_national_id: &str, student: &NewStudent) -> Result<()>;
    fn delete_student(&self, national_id: &str) -> Result<()>;
}

pub trait AttendanceSink {
    /// Store a whole day. Either every record is accepted or none is.
    /// Returns the number of records written.
    fn submit_attendance(&self, date: &str, records: &[AttendanceSubmission]) -> Result<usize>;

    /// Per-student totals for `month` of `school_year`. An empty
    /// `class_filter` means every class.
    fn query_monthly_recap(
        &self,
        class_filter: &str,
        month: Month,
        school_year: SchoolYear,
    ) -> Result<Vec<RecapRow>>;

    /// One summary per month of the semester, calendar order, zeros included.
    fn query_graph_data(
        &self,
        class_filter: &str,
        semester: Semester,
        school_year: SchoolYear,
    ) -> Result<Vec<(Month, StatusSummary)>>;
}
