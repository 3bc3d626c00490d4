use crate::ledger::AttendanceStatus;
use crate::roster::{deserialize_class_label, label_matches};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub present: u32,
    pub leave: u32,
    pub sick: u32,
    pub absent: u32,
}

impl StatusSummary {
    pub fn record(&mut self, status: AttendanceStatus) {
        self.record_many(status, 1);
    }

    pub fn record_many(&mut self, status: AttendanceStatus, count: u32) {
        match status {
            AttendanceStatus::Present => self.present += count,
            AttendanceStatus::Leave => self.leave += count,
            AttendanceStatus::Sick => self.sick += count,
            AttendanceStatus::Absent => self.absent += count,
        }
    }

    pub fn count(&self, status: AttendanceStatus) -> u32 {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Leave => self.leave,
            AttendanceStatus::Sick => self.sick,
            AttendanceStatus::Absent => self.absent,
        }
    }

    pub fn total(&self) -> u32 {
        self.present + self.leave + self.sick + self.absent
    }

    pub fn add(&mut self, other: &StatusSummary) {
        self.present += other.present;
        self.leave += other.leave;
        self.sick += other.sick;
        self.absent += other.absent;
    }
}

/// One student's monthly totals as reported by the sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapRow {
    #[serde(default)]
    pub student_name: String,
    #[serde(default, deserialize_with = "deserialize_class_label")]
    pub class_label: Option<String>,
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub absent: u32,
    #[serde(default)]
    pub leave: u32,
    #[serde(default)]
    pub sick: u32,
    #[serde(default)]
    pub attendance_percent: Option<f64>,
}

impl RecapRow {
    pub fn counts(&self) -> StatusSummary {
        StatusSummary {
            present: self.present,
            leave: self.leave,
            sick: self.sick,
            absent: self.absent,
        }
    }
}

pub fn summarize<'a, I>(rows: I) -> StatusSummary
where
    I: IntoIterator<Item = &'a RecapRow>,
{
    rows.into_iter().fold(StatusSummary::default(), |mut acc, row| {
        acc.add(&row.counts());
        acc
    })
}

pub fn filter_rows<'a>(rows: &'a [RecapRow], selected: &str) -> Vec<&'a RecapRow> {
    rows.iter()
        .filter(|r| label_matches(r.class_label.as_deref(), selected))
        .collect()
}

/// Decimal places used for every attendance percentage in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercentPrecision {
    One,
    #[default]
    Two,
}

impl PercentPrecision {
    pub fn from_decimals(decimals: u8) -> Option<Self> {
        match decimals {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    pub fn decimals(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    fn round(self, x: f64) -> f64 {
        let factor = 10f64.powi(i32::from(self.decimals()));
        (x * factor).round() / factor
    }
}

/// `count / total * 100`, rounded. An empty summary yields 0, never NaN.
pub fn percent(count: u32, summary: &StatusSummary, precision: PercentPrecision) -> f64 {
    let total = summary.total();
    if total == 0 {
        return 0.0;
    }
    precision.round(f64::from(count) / f64::from(total) * 100.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPercentages {
    pub present: f64,
    pub leave: f64,
    pub sick: f64,
    pub absent: f64,
}

impl StatusPercentages {
    pub fn of(summary: &StatusSummary, precision: PercentPrecision) -> Self {
        let of = |status| percent(summary.count(status), summary, precision);
        Self {
            present: of(AttendanceStatus::Present),
            leave: of(AttendanceStatus::Leave),
            sick: of(AttendanceStatus::Sick),
            absent: of(AttendanceStatus::Absent),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub student_name: String,
    pub class_label: Option<String>,
    #[serde(flatten)]
    pub counts: StatusSummary,
    pub percentages: StatusPercentages,
}

/// Format-agnostic export model: one row per student plus column totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTable {
    pub decimals: u8,
    pub rows: Vec<ExportRow>,
    pub totals: StatusSummary,
    pub total_percentages: StatusPercentages,
}

pub fn export_table<'a, I>(rows: I, precision: PercentPrecision) -> ExportTable
where
    I: IntoIterator<Item = &'a RecapRow>,
{
    let mut totals = StatusSummary::default();
    let rows: Vec<ExportRow> = rows
        .into_iter()
        .map(|r| {
            let counts = r.counts();
            totals.add(&counts);
            ExportRow {
                student_name: r.student_name.clone(),
                class_label: r.class_label.clone(),
                counts,
                percentages: StatusPercentages::of(&counts, precision),
            }
        })
        .collect();
    ExportTable {
        decimals: precision.decimals(),
        rows,
        total_percentages: StatusPercentages::of(&totals, precision),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(
        name: &str,
        class: Option<&str>,
        present: u32,
        absent: u32,
        leave: u32,
        sick: u32,
    ) -> RecapRow {
        RecapRow {
            student_name: name.to_string(),
            class_label: class.map(|s| s.to_string()),
            present,
            absent,
            leave,
            sick,
            attendance_percent: None,
        }
    }

    #[test]
    fn empty_rows_sum_to_zero() {
        let summary = summarize(&Vec::<RecapRow>::new());
        assert_eq!(summary, StatusSummary::default());
        assert_eq!(percent(0, &summary, PercentPrecision::Two), 0.0);
        assert_eq!(percent(0, &summary, PercentPrecision::One), 0.0);
    }

    #[test]
    fn present_percentage_rounds_to_two_places() {
        let rows = vec![row("Ani", Some("3"), 10, 2, 1, 0)];
        let summary = summarize(&rows);
        assert_eq!(summary.total(), 13);
        let p = percent(summary.present, &summary, PercentPrecision::Two);
        assert!((p - 76.92).abs() < 1e-9, "got {}", p);
        let p1 = percent(summary.present, &summary, PercentPrecision::One);
        assert!((p1 - 76.9).abs() < 1e-9, "got {}", p1);
    }

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let raw = serde_json::json!([
            { "studentName": "Budi", "classLabel": "4", "present": 3 },
            { "studentName": "Cici", "classLabel": 4, "sick": 2, "attendancePercent": 50.0 }
        ]);
        let rows: Vec<RecapRow> = serde_json::from_value(raw).expect("rows");
        let summary = summarize(&rows);
        assert_eq!(
            summary,
            StatusSummary {
                present: 3,
                leave: 0,
                sick: 2,
                absent: 0
            }
        );
        assert_eq!(rows[0].attendance_percent, None);
        assert_eq!(rows[1].class_label.as_deref(), Some("4"));
    }

    #[test]
    fn filter_rows_matches_trimmed_class() {
        let rows = vec![
            row("A", Some(" 5 "), 1, 0, 0, 0),
            row("B", Some("5B"), 1, 0, 0, 0),
            row("C", None, 1, 0, 0, 0),
        ];
        assert_eq!(filter_rows(&rows, "5").len(), 1);
        assert_eq!(filter_rows(&rows, "Semua").len(), 3);
        assert_eq!(summarize(filter_rows(&rows, "5B")).present, 1);
    }

    #[test]
    fn export_table_totals_and_percentages() {
        let rows = vec![row("A", Some("1"), 3, 1, 0, 0), row("B", Some("1"), 0, 0, 0, 0)];
        let table = export_table(&rows, PercentPrecision::One);
        assert_eq!(table.decimals, 1);
        assert_eq!(table.rows[0].percentages.present, 75.0);
        assert_eq!(table.rows[0].percentages.absent, 25.0);
        assert_eq!(table.rows[1].percentages, StatusPercentages::default());
        assert_eq!(table.totals.total(), 4);
        assert_eq!(table.total_percentages.present, 75.0);
    }

    #[test]
    fn export_row_serializes_flat_counts() {
        let rows = vec![row("A", Some("1"), 1, 0, 0, 0)];
        let table = export_table(&rows, PercentPrecision::Two);
        let v = serde_json::to_value(&table.rows[0]).expect("json");
        assert_eq!(v["present"], 1);
        assert_eq!(v["percentages"]["present"], 100.0);
    }

    proptest! {
        #[test]
        fn percentages_stay_finite_and_bounded(
            present in 0u32..500, absent in 0u32..500, leave in 0u32..500, sick in 0u32..500
        ) {
            let summary = StatusSummary { present, leave, sick, absent };
            for status in AttendanceStatus::ALL {
                let p = percent(summary.count(status), &summary, PercentPrecision::Two);
                prop_assert!(p.is_finite());
                prop_assert!((0.0..=100.0).contains(&p));
            }
        }
    }
}
