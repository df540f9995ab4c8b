// src/views.rs
//
// Table, CSV and JSON renderers for listings and resolved records.

use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::io::{self, Write};

use crate::constants::EMPTY_BUCKET_MSG;
use crate::types::{ObjectEntry, ObjectRecord};

pub use crate::config::ViewType;

const ENTRY_CSV_HEADER: &str = "name,size,lastModified,isLatest,versionId,owner,etag";
const RECORD_CSV_HEADER: &str = "name,lastModified";

fn iso_date(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Quote a CSV field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn json_error(e: serde_json::Error) -> io::Error {
    io::Error::other(e)
}

/// Incremental renderer for a bucket listing. Entries are written as they
/// arrive so a long listing is never buffered.
pub struct EntryWriter<W: Write> {
    out: W,
    view: ViewType,
    bucket: String,
    show_versions: bool,
    written: usize,
}

impl<W: Write> EntryWriter<W> {
    pub fn new(out: W, view: ViewType, bucket: impl Into<String>, show_versions: bool) -> Self {
        Self {
            out,
            view,
            bucket: bucket.into(),
            show_versions,
            written: 0,
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        match self.view {
            ViewType::Cli => {
                writeln!(self.out, "Contents of bucket {}:", self.bucket)?;
                let mut line = format!(
                    "{:<40} {:>12} {:<20} {:<26} {:<34}",
                    "File Name", "Size", "Owner", "Last Modified", "ETag"
                );
                if self.show_versions {
                    line.push_str(&format!(" {:<34} {}", "Version Id", "Latest"));
                }
                writeln!(self.out, "{}", line.trim_end())?;
                writeln!(self.out, "{}", "-".repeat(line.trim_end().len()))
            }
            ViewType::Csv => writeln!(self.out, "{ENTRY_CSV_HEADER}"),
            ViewType::Json => {
                write!(self.out, "{{\"BucketName\":")?;
                serde_json::to_writer(&mut self.out, &self.bucket).map_err(json_error)?;
                write!(self.out, ",\"Objects\":[")
            }
        }
    }

    pub fn write_entry(&mut self, entry: &ObjectEntry) -> io::Result<()> {
        if self.written == 0 {
            self.write_header()?;
        }

        match self.view {
            ViewType::Cli => {
                let mut line = format!(
                    "{:<40} {:>12} {:<20} {:<26} {:<34}",
                    entry.key,
                    entry.size,
                    entry.owner.as_deref().unwrap_or("N/A"),
                    iso_date(entry.last_modified.as_ref()),
                    entry.e_tag.as_deref().unwrap_or("N/A"),
                );
                if self.show_versions {
                    line.push_str(&format!(
                        " {:<34} {}",
                        entry.version_id.as_deref().unwrap_or("N/A"),
                        entry.is_latest
                    ));
                }
                writeln!(self.out, "{}", line.trim_end())?;
            }
            ViewType::Csv => {
                let size = entry.size.to_string();
                let modified = iso_date(entry.last_modified.as_ref());
                let latest = entry.is_latest.to_string();
                let fields = [
                    entry.key.as_str(),
                    size.as_str(),
                    modified.as_str(),
                    latest.as_str(),
                    entry.version_id.as_deref().unwrap_or_default(),
                    entry.owner.as_deref().unwrap_or_default(),
                    entry.e_tag.as_deref().unwrap_or_default(),
                ];
                let row: Vec<_> = fields.iter().map(|f| csv_field(f)).collect();
                writeln!(self.out, "{}", row.join(","))?;
            }
            ViewType::Json => {
                if self.written > 0 {
                    write!(self.out, ",")?;
                }
                serde_json::to_writer(&mut self.out, entry).map_err(json_error)?;
            }
        }

        self.written += 1;
        Ok(())
    }

    /// Close the document and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.written == 0 {
            match self.view {
                ViewType::Cli => writeln!(self.out, "{EMPTY_BUCKET_MSG}")?,
                _ => self.write_header()?,
            }
        }
        if self.view == ViewType::Json {
            writeln!(self.out, "]}}")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Render resolved records in one go.
pub fn write_records<W: Write>(out: &mut W, view: ViewType, records: &[ObjectRecord]) -> io::Result<()> {
    match view {
        ViewType::Cli => {
            let header = format!("{:<50} {}", "File Name", "Last Modified");
            writeln!(out, "{header}")?;
            writeln!(out, "{}", "-".repeat(header.len()))?;
            for record in records {
                writeln!(out, "{:<50} {}", record.key, iso_date(record.last_modified.as_ref()))?;
            }
        }
        ViewType::Csv => {
            writeln!(out, "{RECORD_CSV_HEADER}")?;
            for record in records {
                writeln!(
                    out,
                    "{},{}",
                    csv_field(&record.key),
                    iso_date(record.last_modified.as_ref())
                )?;
            }
        }
        ViewType::Json => {
            serde_json::to_writer_pretty(&mut *out, records).map_err(json_error)?;
            writeln!(out)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_entry() -> ObjectEntry {
        ObjectEntry {
            last_modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single(),
            e_tag: Some("\"abc\"".into()),
            owner: Some("alice".into()),
            version_id: Some("v1".into()),
            ..ObjectEntry::new("logs/a, b.txt", 42)
        }
    }

    fn render(view: ViewType, show_versions: bool, entries: &[ObjectEntry]) -> String {
        let mut writer = EntryWriter::new(Vec::new(), view, "bkt", show_versions);
        for e in entries {
            writer.write_entry(e).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_entries_csv() {
        let out = render(ViewType::Csv, false, &[sample_entry()]);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some(ENTRY_CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("\"logs/a, b.txt\",42,2024-03-01T12:00:00.000Z,true,v1,alice,\"\"\"abc\"\"\"")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_entries_json_document() {
        let out = render(ViewType::Json, false, &[sample_entry(), ObjectEntry::new("b", 1)]);
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["BucketName"], "bkt");
        assert_eq!(doc["Objects"].as_array().unwrap().len(), 2);
        assert_eq!(doc["Objects"][0]["Key"], "logs/a, b.txt");
        assert_eq!(doc["Objects"][0]["ETag"], "\"abc\"");

        let empty: serde_json::Value = serde_json::from_str(&render(ViewType::Json, false, &[])).unwrap();
        assert_eq!(empty["Objects"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_entries_table() {
        let out = render(ViewType::Cli, true, &[sample_entry()]);
        assert!(out.starts_with("Contents of bucket bkt:"));
        assert!(out.contains("File Name"));
        assert!(out.contains("Version Id"));
        assert!(out.contains("alice"));

        assert_eq!(render(ViewType::Cli, false, &[]).trim(), EMPTY_BUCKET_MSG);
        assert_eq!(render(ViewType::Csv, false, &[]).trim(), ENTRY_CSV_HEADER);
    }

    #[test]
    fn test_records_views() {
        let records = vec![ObjectRecord {
            key: "a.json".into(),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
        }];

        let mut csv = Vec::new();
        write_records(&mut csv, ViewType::Csv, &records).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,lastModified\na.json,2024-01-02T03:04:05.000Z\n"
        );

        let mut json = Vec::new();
        write_records(&mut json, ViewType::Json, &records).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(doc[0]["Key"], "a.json");

        let mut table = Vec::new();
        write_records(&mut table, ViewType::Cli, &records).unwrap();
        let table = String::from_utf8(table).unwrap();
        assert!(table.contains("File Name"));
        assert!(table.contains("a.json"));
    }
}
