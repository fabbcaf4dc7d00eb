use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};

use crate::domain::model::{ZoneRow, ZONE_HEADER};
use crate::utils::error::Result;

pub const DELIMITER: u8 = b'\t';

pub fn tsv_reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.delimiter(DELIMITER).flexible(true).has_headers(true);
    builder
}

pub fn tsv_writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.delimiter(DELIMITER).flexible(true);
    builder
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Append-only writer for the master dataset.
///
/// `create` truncates the file and writes the header. Rows are written as
/// they arrive; a source can be undone with `mark`/`rollback`.
pub struct DatasetWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl DatasetWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        let file = File::create(&path)?;
        let mut writer = tsv_writer_builder().from_writer(file);
        writer.write_record(ZONE_HEADER)?;
        writer.flush()?;

        tracing::debug!("🗂️ Dataset truncated: {}", path.display());
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current committed length in bytes.
    pub fn mark(&mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.writer.get_ref().metadata()?.len())
    }

    pub fn append(&mut self, row: &ZoneRow) -> Result<()> {
        self.writer.write_record(row.fields())?;
        Ok(())
    }

    /// 截斷回 `mark` 的位置，丟棄失敗來源已寫入的列
    pub fn rollback(&mut self, mark: u64) -> Result<()> {
        self.writer.flush()?;
        let mut file: &File = self.writer.get_ref();
        file.set_len(mark)?;
        file.seek(SeekFrom::Start(mark))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(self.path)
    }
}

/// Counts data rows (header excluded).
pub fn count_rows<P: AsRef<Path>>(path: P) -> Result<usize> {
    let mut reader = tsv_reader_builder().from_path(path)?;
    let mut count = 0;
    for record in reader.byte_records() {
        record?;
        count += 1;
    }
    Ok(count)
}

/// Reads every data row back with its fields untouched.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<ZoneRow>> {
    let mut reader = tsv_reader_builder().from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(ZoneRow::new(record.iter().map(str::to_string).collect()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(fields: &[&str]) -> ZoneRow {
        ZoneRow::new(fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_create_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/all_domains.csv");

        DatasetWriter::create(&path).unwrap().finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "domain\tregistered\tdate_created\tpaid_till\tdate_free\tdelegated\n"
        );
        assert_eq!(count_rows(&path).unwrap(), 0);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_domains.csv");
        let rows = vec![
            row(&["Example.RU", "1", "01.02.2010", "01.02.2025", "04.03.2025", "1"]),
            row(&["quote\"d.ru", "1", " spaced ", "", "", "0"]),
            row(&["short.ru", "1"]),
            row(&["long.ru", "1", "2", "3", "4", "5", "extra"]),
            row(&["пример.рф", "1", "", "", "", ""]),
        ];

        let mut writer = DatasetWriter::create(&path).unwrap();
        for r in &rows {
            writer.append(r).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(read_rows(&path).unwrap(), rows);
    }

    #[test]
    fn test_rollback_discards_partial_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_domains.csv");

        let mut writer = DatasetWriter::create(&path).unwrap();
        writer.append(&row(&["keep.ru", "1"])).unwrap();
        let mark = writer.mark().unwrap();
        writer.append(&row(&["drop1.ru", "1"])).unwrap();
        writer.append(&row(&["drop2.ru", "1"])).unwrap();
        writer.rollback(mark).unwrap();
        writer.append(&row(&["after.ru", "1"])).unwrap();
        writer.finish().unwrap();

        let domains: Vec<String> = read_rows(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.fields()[0].clone())
            .collect();
        assert_eq!(domains, vec!["keep.ru", "after.ru"]);
    }

    #[test]
    fn test_create_truncates_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_domains.csv");
        fs::write(&path, "garbage\nmore garbage\n").unwrap();

        DatasetWriter::create(&path).unwrap().finish().unwrap();
        assert_eq!(count_rows(&path).unwrap(), 0);
    }
}
