//! Three-period daily journal payload

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

const TIME_FORMAT: &str = "%H:%M";
const MAX_KEYWORDS: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JournalError {
    #[error("JOURNAL/{period}: '{value}' is not a HH:MM time")]
    InvalidTime { period: &'static str, value: String },

    #[error("JOURNAL/{period}: starts at {start} but ends at {end}")]
    EndsBeforeStart {
        period: &'static str,
        start: String,
        end: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub content: String,
}

impl Period {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Hours between start and end, rounded to two decimals. Unparseable
    /// times give 0.
    pub fn duration_hours(&self) -> f64 {
        match (parse_time(&self.start_time), parse_time(&self.end_time)) {
            (Some(start), Some(end)) => {
                let hours = (end - start).num_seconds() as f64 / 3600.0;
                (hours * 100.0).round() / 100.0
            }
            _ => 0.0,
        }
    }

    /// One task per non-blank content line.
    pub fn task_count(&self) -> usize {
        self.content.lines().filter(|l| !l.trim().is_empty()).count()
    }

    /// Up to five distinct lower-cased words longer than three characters,
    /// in alphabetical order.
    pub fn keywords(&self) -> Vec<String> {
        self.content
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > 3)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(MAX_KEYWORDS)
            .collect()
    }

    fn validate(&self, period: &'static str) -> Result<(), JournalError> {
        let start = parse_time(&self.start_time).ok_or_else(|| JournalError::InvalidTime {
            period,
            value: self.start_time.clone(),
        })?;
        let end = parse_time(&self.end_time).ok_or_else(|| JournalError::InvalidTime {
            period,
            value: self.end_time.clone(),
        })?;
        if end < start {
            return Err(JournalError::EndsBeforeStart {
                period,
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        Ok(())
    }
}

/// The payload handed to the journal script: morning, midday, evening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub morning: Period,
    pub midday: Period,
    pub evening: Period,
}

impl Default for JournalEntry {
    fn default() -> Self {
        Self {
            morning: Period::new("09:00", "12:00"),
            midday: Period::new("12:00", "17:00"),
            evening: Period::new("17:00", "21:00"),
        }
    }
}

impl JournalEntry {
    pub fn periods(&self) -> [(&'static str, &Period); 3] {
        [
            ("morning", &self.morning),
            ("midday", &self.midday),
            ("evening", &self.evening),
        ]
    }

    pub fn validate(&self) -> Result<(), JournalError> {
        self.periods()
            .into_iter()
            .try_for_each(|(name, period)| period.validate(name))
    }

    pub fn total_tasks(&self) -> usize {
        self.periods().iter().map(|(_, p)| p.task_count()).sum()
    }

    pub fn total_hours(&self) -> f64 {
        self.periods().iter().map(|(_, p)| p.duration_hours()).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Daily journal entry with {} tasks spanning {:.1} hours across {} time blocks.",
            self.total_tasks(),
            self.total_hours(),
            self.periods().len()
        )
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_periods() {
        let entry = JournalEntry::default();
        assert_eq!(entry.morning.start_time, "09:00");
        assert_eq!(entry.evening.end_time, "21:00");
        assert!(entry.validate().is_ok());
        assert_eq!(entry.total_hours(), 12.0);
    }

    #[test]
    fn test_wire_shape() {
        let entry = JournalEntry {
            morning: Period::new("08:30", "11:00").with_content("standup"),
            ..Default::default()
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value["morning"],
            json!({ "start_time": "08:30", "end_time": "11:00", "content": "standup" })
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut entry = JournalEntry::default();
        entry.midday.end_time = "5pm".to_string();
        assert_eq!(
            entry.validate(),
            Err(JournalError::InvalidTime {
                period: "midday",
                value: "5pm".to_string()
            })
        );

        let mut entry = JournalEntry::default();
        entry.evening = Period::new("21:00", "17:00");
        assert!(matches!(
            entry.validate(),
            Err(JournalError::EndsBeforeStart { period: "evening", .. })
        ));
    }

    #[test]
    fn test_duration_rounding() {
        assert_eq!(Period::new("09:00", "09:20").duration_hours(), 0.33);
        assert_eq!(Period::new("nine", "10:00").duration_hours(), 0.0);
    }

    #[test]
    fn test_tasks_and_keywords() {
        let period = Period::new("09:00", "12:00")
            .with_content("Review pull requests\n\n  fix flaky test\nReview docs");
        assert_eq!(period.task_count(), 3);
        assert_eq!(
            period.keywords(),
            vec!["docs", "flaky", "pull", "requests", "review"]
        );
    }

    #[test]
    fn test_summary() {
        let entry = JournalEntry {
            morning: Period::new("09:00", "12:00").with_content("a\nb"),
            ..Default::default()
        };
        assert_eq!(
            entry.summary(),
            "Daily journal entry with 2 tasks spanning 12.0 hours across 3 time blocks."
        );
    }
}
