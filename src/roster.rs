//! Roster records and class-label handling.
//!
//! Class labels arrive from an uncontrolled upstream: absent, JSON null,
//! numbers, padded strings, or the literal text `"null"`/`"undefined"` left
//! behind by sloppy serialization. [`ClassLabel`] classifies a raw label once;
//! everything else in the crate goes through it or [`label_matches`].

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Reserved class id meaning "no filter". Always first in the class list.
pub const WILDCARD_CLASS: &str = "Semua";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub national_id: String,
    /// Raw label as stored upstream (untrimmed). Use [`Student::class_id`]
    /// for the normalized value.
    #[serde(default, deserialize_with = "deserialize_class_label")]
    pub class_label: Option<String>,
}

impl Student {
    pub fn label(&self) -> ClassLabel {
        ClassLabel::classify(self.class_label.as_deref())
    }

    pub fn class_id(&self) -> Option<String> {
        self.label().into_option()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassLabel {
    /// Null, absent, or blank after trimming.
    Missing,
    /// Literal `"undefined"` / `"null"` text.
    Placeholder,
    /// Trimmed, non-empty label.
    Value(String),
}

impl ClassLabel {
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        match raw.trim() {
            "" => Self::Missing,
            "undefined" | "null" => Self::Placeholder,
            t => Self::Value(t.to_string()),
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Placeholder => None,
        }
    }
}

/// Coerce a loosely-typed JSON label to text. Numbers and booleans keep their
/// JSON spelling; null and structured values count as absent.
pub fn label_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

pub(crate) fn deserialize_class_label<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(d)?;
    Ok(label_text(&value))
}

/// Exact match of a raw label against a selected class. The wildcard matches
/// everything, including rows whose label never normalizes.
pub fn label_matches(raw: Option<&str>, selected: &str) -> bool {
    if selected == WILDCARD_CLASS {
        return true;
    }
    raw.map(str::trim) == Some(selected)
}

/// Class filter as the sink expects it: empty string for "all classes".
pub fn sink_class_filter(selected: &str) -> &str {
    if selected == WILDCARD_CLASS {
        ""
    } else {
        selected
    }
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// Digit strings of any length; no integer parse so "999999999999999999999"
// still orders correctly.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_sig = a.trim_start_matches('0');
    let b_sig = b.trim_start_matches('0');
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
}

thread_local! {
    static COLLATOR: Option<Collator> = root_collator();
}

// Root locale at tertiary strength: accents and case only break ties, and on
// a case tie lowercase sorts first.
fn root_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            tracing::warn!(error = ?e, "root collator unavailable, using code-point order");
            None
        }
    }
}

fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(c) => c.compare(a, b),
            None => a.cmp(b),
        })
        .then_with(|| a.cmp(b))
}

/// Canonical class ordering: numeric ids ascending, then everything else in
/// locale-aware order. Equal numeric values ("3" vs "03") tie-break on the
/// raw text.
pub fn compare_class_ids(a: &str, b: &str) -> Ordering {
    match (is_numeric_id(a), is_numeric_id(b)) {
        (true, true) => cmp_numeric(a, b).then_with(|| a.cmp(b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => collate(a, b),
    }
}

/// Distinct, sorted class ids with [`WILDCARD_CLASS`] prepended.
///
/// Students whose label does not normalize are skipped here but stay in the
/// roster. A student literally labelled "Semua" is skipped as well, since
/// that id is taken by the wildcard.
pub fn normalize_classes(students: &[Student]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;
    for s in students {
        match s.label() {
            ClassLabel::Value(v) if v != WILDCARD_CLASS => {
                seen.insert(v);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "students without a usable class label");
    }

    let mut classes: Vec<String> = seen.into_iter().collect();
    classes.sort_by(|a, b| compare_class_ids(a, b));

    let mut out = Vec::with_capacity(classes.len() + 1);
    out.push(WILDCARD_CLASS.to_string());
    out.extend(classes);
    out
}

pub fn filter_roster<'a>(students: &'a [Student], selected: &str) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| label_matches(s.class_label.as_deref(), selected))
        .collect()
}
