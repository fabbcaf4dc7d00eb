use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use crate::utils::error::Result;

/// Master dataset columns, in file order.
pub const ZONE_HEADER: [&str; 6] = [
    "domain",
    "registered",
    "date_created",
    "paid_till",
    "date_free",
    "delegated",
];

/// Extra columns appended to the report.
pub const REPORT_EXTRA_COLUMNS: [&str; 2] = ["days_left", "domain_age"];

/// Columns the filter stage cannot work without.
pub const REQUIRED_COLUMNS: [&str; 3] = ["domain", "date_free", "date_created"];

pub const PREVIEW_LIMIT: usize = 25;

/// One zone-file line split on tabs. Field count is not checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRow {
    fields: Vec<String>,
}

impl ZoneRow {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// 去除首尾空白後以 tab 切分；空行回傳 None
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(Self::new(line.split('\t').map(str::to_string).collect()))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Threshold and name pattern for one filter run.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub days_threshold: i64,
    pattern: Option<Regex>,
    raw_pattern: String,
}

impl FilterCriteria {
    /// 空白的 pattern 表示不過濾名稱
    pub fn new(days_threshold: i64, name_pattern: &str) -> Result<Self> {
        let pattern = if name_pattern.trim().is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(name_pattern)
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            days_threshold,
            pattern,
            raw_pattern: name_pattern.to_string(),
        })
    }

    pub fn name_pattern(&self) -> &str {
        &self.raw_pattern
    }

    pub fn matches_name(&self, domain: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|re| re.is_match(domain))
            .unwrap_or(true)
    }

    pub fn accepts_days_left(&self, days_left: i64) -> bool {
        days_left < self.days_threshold
    }
}

/// A qualifying dataset row with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Dataset fields padded to the header width, `domain` already normalized.
    pub fields: Vec<String>,
    pub domain: String,
    pub date_created: Option<NaiveDate>,
    pub date_free: NaiveDate,
    pub days_left: i64,
    pub domain_age: Option<i64>,
}

impl ReportRow {
    pub fn sort_key(&self) -> (i64, &str) {
        (self.days_left, self.domain.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Appended { rows: usize },
    FetchFailed { class: String, message: String },
    DecodeFailed { class: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub group: String,
    pub zone: String,
    pub url: String,
    pub status: SourceStatus,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SourceStatus::Appended { .. })
    }

    pub fn rows(&self) -> usize {
        match self.status {
            SourceStatus::Appended { rows } => rows,
            _ => 0,
        }
    }
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregationSummary {
    pub dataset_path: String,
    pub outcomes: Vec<SourceOutcome>,
    pub rows_appended: usize,
    /// Re-counted from the written file; `None` if that failed.
    pub total_rows: Option<usize>,
}

impl AggregationSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub header: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub scanned: usize,
    pub malformed_skipped: usize,
    pub missing_date_free: usize,
}

impl FilterOutcome {
    pub fn preview(&self) -> Vec<&str> {
        self.rows
            .iter()
            .take(PREVIEW_LIMIT)
            .map(|r| r.domain.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_keeps_any_field_count() {
        let short = ZoneRow::from_line("a.ru\t1").unwrap();
        assert_eq!(short.len(), 2);

        let long = ZoneRow::from_line("a.ru\t1\t2\t3\t4\t5\t6\t7").unwrap();
        assert_eq!(long.len(), 8);
        assert_eq!(long.get(7), Some("7"));
    }

    #[test]
    fn test_from_line_trims_and_skips_blank() {
        assert!(ZoneRow::from_line("   \r\n").is_none());
        let row = ZoneRow::from_line("  a.ru\t1\r\n").unwrap();
        assert_eq!(row.fields(), &["a.ru".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_criteria_threshold_is_strict() {
        let criteria = FilterCriteria::new(30, "").unwrap();
        assert!(criteria.accepts_days_left(29));
        assert!(criteria.accepts_days_left(-3));
        assert!(!criteria.accepts_days_left(30));
    }

    #[test]
    fn test_criteria_pattern_is_case_insensitive_search() {
        let criteria = FilterCriteria::new(30, "mebel").unwrap();
        assert!(criteria.matches_name("mebelshop.ru"));
        assert!(criteria.matches_name("MEBEL.ru"));
        assert!(!criteria.matches_name("shkaf.ru"));

        let any = FilterCriteria::new(30, "  ").unwrap();
        assert!(any.matches_name("anything.ru"));
    }

    #[test]
    fn test_criteria_rejects_invalid_regex() {
        assert!(FilterCriteria::new(30, "mebel(").is_err());
    }
}
