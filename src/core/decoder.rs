use std::borrow::Cow;
use std::io::{BufRead, BufReader, Cursor, ErrorKind, Read};

use flate2::read::MultiGzDecoder;

use crate::domain::model::ZoneRow;
use crate::utils::error::{EtlError, Result};

pub type GzZoneRows = ZoneRows<BufReader<MultiGzDecoder<Cursor<Vec<u8>>>>>;

/// Turns a gzip zone archive into rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZoneDecoder;

impl ZoneDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Lazily decompresses `payload`. Corruption surfaces as an `Err` item,
    /// after which the sequence ends. An empty payload yields no rows.
    pub fn decode(&self, payload: Vec<u8>) -> GzZoneRows {
        let empty = payload.is_empty();
        let mut rows = self.decode_reader(MultiGzDecoder::new(Cursor::new(payload)));
        rows.done = empty;
        rows
    }

    pub fn decode_reader<R: Read>(&self, reader: R) -> ZoneRows<BufReader<R>> {
        ZoneRows::new(BufReader::new(reader))
    }
}

/// Single-pass row iterator over decompressed zone lines.
pub struct ZoneRows<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> ZoneRows<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ZoneRows<R> {
    type Item = Result<ZoneRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_no += 1;
                    if let Some(row) = ZoneRow::from_line(&decode_line(&self.buf)) {
                        return Some(Ok(row));
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(EtlError::DecodeError {
                        message: format!("after line {}: {}", self.line_no, e),
                    }));
                }
            }
        }
    }
}

/// UTF-8 decode that drops invalid byte sequences.
pub fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.utf8_chunks() {
                out.push_str(chunk.valid());
            }
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_splits_on_tabs_and_skips_blank_lines() {
        let payload = gzip(
            b"a.ru\t1\t01.02.2010\t01.02.2025\t04.03.2025\t1\n\n   \nb.ru\t1\t\t\t\t0\r\n",
        );

        let rows: Vec<ZoneRow> = ZoneDecoder::new()
            .decode(payload)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some("a.ru"));
        assert_eq!(rows[0].get(4), Some("04.03.2025"));
        assert_eq!(rows[1].len(), 6);
        assert_eq!(rows[1].get(5), Some("0"));
    }

    #[test]
    fn test_decode_keeps_short_and_long_lines() {
        let payload = gzip(b"short.ru\t1\nlong.ru\t1\t2\t3\t4\t5\t6\t7\n");
        let rows: Vec<ZoneRow> = ZoneDecoder::new()
            .decode(payload)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 8);
    }

    #[test]
    fn test_decode_drops_invalid_utf8_bytes() {
        let payload = gzip(b"ca\xfffe.ru\t1\n\xd0\xbc\xd0\xb5\xd0\xb1.\xd1\x80\xd1\x84\t1\n");
        let rows: Vec<ZoneRow> = ZoneDecoder::new()
            .decode(payload)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows[0].get(0), Some("cafe.ru"));
        assert_eq!(rows[1].get(0), Some("меб.рф"));
    }

    #[test]
    fn test_decode_concatenated_members() {
        let mut payload = gzip(b"a.ru\t1\n");
        payload.extend(gzip(b"b.ru\t1\n"));

        let rows: Vec<ZoneRow> = ZoneDecoder::new()
            .decode(payload)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_empty_payload_yields_no_rows() {
        let mut rows = ZoneDecoder::new().decode(Vec::new());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_non_gzip_payload_is_decode_error() {
        let mut rows = ZoneDecoder::new().decode(b"<html>not found</html>".to_vec());
        let first = rows.next().unwrap();
        assert!(matches!(first, Err(EtlError::DecodeError { .. })));
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_truncated_archive_fails_after_good_rows() {
        let mut content = Vec::new();
        for i in 0..2000 {
            content.extend(format!("domain{}.ru\t1\t\t\t\t1\n", i).into_bytes());
        }
        let mut payload = gzip(&content);
        payload.truncate(payload.len() / 2);

        let results: Vec<Result<ZoneRow>> = ZoneDecoder::new().decode(payload).collect();
        assert!(results.last().unwrap().is_err());
    }

    #[test]
    fn test_decode_line_passthrough() {
        assert!(matches!(decode_line(b"plain"), Cow::Borrowed("plain")));
    }
}
