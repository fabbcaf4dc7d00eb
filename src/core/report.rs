use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::core::dataset::{ensure_parent_dir, tsv_reader_builder, tsv_writer_builder};
use crate::core::decoder::decode_line;
use crate::domain::model::{
    FilterCriteria, FilterOutcome, ReportRow, REPORT_EXTRA_COLUMNS, REQUIRED_COLUMNS,
};
use crate::utils::error::{EtlError, Result};

const DAY_FIRST_FORMATS: [&str; 3] = ["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];
const YEAR_FIRST_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];
/// `%y` maps 00-69 to 20xx and 70-99 to 19xx.
const SHORT_YEAR_FORMATS: [&str; 3] = ["%d.%m.%y", "%d/%m/%y", "%d-%m-%y"];

const TIME_SUFFIXES: [&str; 4] = [" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M"];

const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Lower-cases and strips scheme, `www.`, path and port.
///
/// Applied until the value stops changing, so `normalize_domain` is idempotent
/// even for inputs like `www.www.example.ru`.
pub fn normalize_domain(raw: &str) -> String {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut rest = lowered.as_str();

    for scheme in ["https://", "http://"] {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            break;
        }
    }
    if let Some(stripped) = rest.strip_prefix("www.") {
        rest = stripped;
    }

    let end = rest.find(['/', ':']).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

/// Chooses formats by digit-group widths of the date part, so a year is
/// always four digits or an expanded two-digit year, never `0024`.
fn candidate_formats(date_part: &str) -> &'static [&'static str] {
    let widths: Vec<usize> = date_part
        .split(|c: char| !c.is_ascii_digit())
        .map(str::len)
        .collect();
    match widths.as_slice() {
        [4, 1..=2, 1..=2] => &YEAR_FIRST_FORMATS,
        [1..=2, 1..=2, 4] => &DAY_FIRST_FORMATS,
        [1..=2, 1..=2, 2] => &SHORT_YEAR_FORMATS,
        _ => &[],
    }
}

/// Day-first date parsing; time of day is dropped. `None` means unknown.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let date_part = value.split([' ', 'T']).next().unwrap_or(value);
    let formats = candidate_formats(date_part);

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in formats {
        for suffix in TIME_SUFFIXES {
            let full = format!("{}{}", format, suffix);
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, &full) {
                return Some(dt.date());
            }
        }
    }

    if formats.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h == name)
}

struct Columns {
    domain: usize,
    date_created: usize,
    date_free: usize,
}

impl Columns {
    fn resolve(header: &[String]) -> Result<Self> {
        let lookup = |name| column_index(header, name);
        match (
            lookup("domain"),
            lookup("date_created"),
            lookup("date_free"),
        ) {
            (Some(domain), Some(date_created), Some(date_free)) => Ok(Self {
                domain,
                date_created,
                date_free,
            }),
            _ => Err(EtlError::SchemaMismatch {
                expected: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: header.to_vec(),
            }),
        }
    }
}

/// Expiry filter over a master dataset.
pub struct ReportEngine {
    criteria: FilterCriteria,
    reference_date: NaiveDate,
}

impl ReportEngine {
    pub fn new(criteria: FilterCriteria, reference_date: NaiveDate) -> Self {
        Self {
            criteria,
            reference_date,
        }
    }

    pub fn filter_path<P: AsRef<Path>>(&self, dataset: P) -> Result<FilterOutcome> {
        let file = File::open(dataset.as_ref())?;
        self.filter_reader(file)
    }

    /// Streams the dataset row by row; only qualifying rows are kept.
    pub fn filter_reader<R: Read>(&self, input: R) -> Result<FilterOutcome> {
        let mut reader = tsv_reader_builder().from_reader(input);

        let header: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| {
                decode_line(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();
        let columns = Columns::resolve(&header)?;

        let mut outcome = FilterOutcome {
            header: header.clone(),
            ..Default::default()
        };

        for record in reader.byte_records() {
            let record = record?;
            outcome.scanned += 1;

            // 欄位比表頭多的列直接略過；少的補空字串
            if record.len() > header.len() {
                outcome.malformed_skipped += 1;
                continue;
            }
            let mut fields: Vec<String> =
                record.iter().map(|f| decode_line(f).into_owned()).collect();
            fields.resize(header.len(), String::new());

            let Some(date_free) = parse_day_first(&fields[columns.date_free]) else {
                outcome.missing_date_free += 1;
                continue;
            };

            let days_left = (date_free - self.reference_date).num_days();
            if !self.criteria.accepts_days_left(days_left) {
                continue;
            }

            let domain = normalize_domain(&fields[columns.domain]);
            if !self.criteria.matches_name(&domain) {
                continue;
            }

            let date_created = parse_day_first(&fields[columns.date_created]);
            let domain_age = date_created.map(|created| (self.reference_date - created).num_days());

            fields[columns.domain] = domain.clone();
            fields[columns.date_free] = date_free.format(REPORT_DATE_FORMAT).to_string();
            fields[columns.date_created] = date_created
                .map(|d| d.format(REPORT_DATE_FORMAT).to_string())
                .unwrap_or_default();

            outcome.rows.push(ReportRow {
                fields,
                domain,
                date_created,
                date_free,
                days_left,
                domain_age,
            });
        }

        outcome.rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        tracing::debug!(
            "🔎 Scanned {} rows: {} matched, {} without date_free, {} malformed",
            outcome.scanned,
            outcome.rows.len(),
            outcome.missing_date_free,
            outcome.malformed_skipped
        );

        Ok(outcome)
    }

    pub fn write_report<P: AsRef<Path>>(&self, outcome: &FilterOutcome, path: P) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        let mut writer = tsv_writer_builder().from_path(&path)?;
        let mut header = outcome.header.clone();
        header.extend(REPORT_EXTRA_COLUMNS.iter().map(|c| c.to_string()));
        writer.write_record(&header)?;

        for row in &outcome.rows {
            let mut record = row.fields.clone();
            record.push(row.days_left.to_string());
            record.push(row.domain_age.map(|a| a.to_string()).unwrap_or_default());
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// 過濾 dataset 並寫出報表
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, dataset: P, report: Q) -> Result<FilterOutcome> {
        let dataset = dataset.as_ref();
        tracing::info!(
            "🔎 Filtering {} (days_left < {}, mask: '{}', today: {})",
            dataset.display(),
            self.criteria.days_threshold,
            self.criteria.name_pattern(),
            self.reference_date
        );

        let outcome = self.filter_path(dataset)?;
        let path = self.write_report(&outcome, report)?;

        tracing::info!("💾 Saved: {} (rows: {})", path.display(), outcome.rows.len());
        Ok(outcome)
    }
}
