use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub const ISO_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y";

pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    Iso(String),
    #[error("invalid date {0:?}, expected DD-MM-YYYY")]
    Display(String),
    #[error("unknown month {0:?}")]
    Month(String),
    #[error("semester must be \"1\" or \"2\", got {0:?}")]
    Semester(String),
    #[error("invalid school year {0:?}, expected YYYY/YYYY or a start year")]
    SchoolYear(String),
}

pub fn parse_iso(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), ISO_FORMAT).map_err(|_| DateError::Iso(s.to_string()))
}

pub fn parse_display(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), DISPLAY_FORMAT)
        .map_err(|_| DateError::Display(s.to_string()))
}

/// Date as written to the sink (`DD-MM-YYYY`).
pub fn to_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Calendar month, 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month(u32);

impl Month {
    pub fn new(number: u32) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self(number))
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.month())
    }

    /// Accepts a month name in any case ("januari", "Januari") or a number.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let t = s.trim();
        if let Ok(n) = t.parse::<u32>() {
            return Self::new(n).ok_or_else(|| DateError::Month(s.to_string()));
        }
        MONTH_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(t))
            .map(|idx| Self(idx as u32 + 1))
            .ok_or_else(|| DateError::Month(s.to_string()))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }
}

/// Half of the school year. The first semester runs July to December, the
/// second January to June.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn parse(s: &str) -> Result<Self, DateError> {
        match s.trim() {
            "1" => Ok(Self::First),
            "2" => Ok(Self::Second),
            _ => Err(DateError::Semester(s.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
        }
    }

    pub fn months(self) -> Vec<Month> {
        let start = match self {
            Self::First => 7,
            Self::Second => 1,
        };
        (start..start + 6).map(Month).collect()
    }
}

/// School year running from July of `start` to June of `start + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolYear {
    start: i32,
}

impl SchoolYear {
    pub fn starting(start: i32) -> Self {
        Self { start }
    }

    pub fn containing(date: NaiveDate) -> Self {
        let start = if date.month() >= 7 {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start }
    }

    pub fn current() -> Self {
        Self::containing(today())
    }

    /// Accepts `2023/2024`, `2023-2024` or a bare start year `2023`.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let bad = || DateError::SchoolYear(s.to_string());
        let t = s.trim();
        match t.split_once(['/', '-']) {
            Some((first, second)) => {
                let start: i32 = first.trim().parse().map_err(|_| bad())?;
                let end: i32 = second.trim().parse().map_err(|_| bad())?;
                if end != start + 1 {
                    return Err(bad());
                }
                Ok(Self { start })
            }
            None => t.parse().map(Self::starting).map_err(|_| bad()),
        }
    }

    pub fn label(self) -> String {
        format!("{}/{}", self.start, self.start + 1)
    }

    /// Calendar year `month` falls in within this school year.
    pub fn year_of(self, month: Month) -> i32 {
        if month.number() >= 7 {
            self.start
        } else {
            self.start + 1
        }
    }
}
