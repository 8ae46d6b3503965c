//! CSV record sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use sb_core::types::{MatchRecord, RECORD_HEADER};

/// Open a path for writing; `-` is stdout.
pub fn open_output(path: &str) -> Result<Box<dyn Write>, String> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Writes [`MatchRecord`]s as CSV rows, header first.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Result<Self, String> {
        let mut writer = csv::Writer::from_writer(inner);
        writer
            .write_record(RECORD_HEADER)
            .map_err(|e| format!("Failed to write header: {}", e))?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, record: &MatchRecord) -> Result<(), String> {
        self.writer
            .write_record(record.to_row())
            .map_err(|e| format!("Failed to write record: {}", e))?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a MatchRecord>,
    ) -> Result<(), String> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Rows written so far, header excluded.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W, String> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush output: {}", e))?;
        self.writer
            .into_inner()
            .map_err(|e| format!("Failed to flush output: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sb_core::types::ThreatSubtype;

    #[test]
    fn test_header_then_rows() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let records = [
            MatchRecord {
                url: "http://evil.example/a,b".to_string(),
                full_hash: "FULL".to_string(),
                partial_hash: "PART".to_string(),
                timestamp: ts,
                threat_type: "MALWARE".to_string(),
                threat_subtype: Some(ThreatSubtype::Distribution),
                platform_type: "ANY_PLATFORM".to_string(),
            },
            MatchRecord::unresolved("http:///", ts),
        ];

        let mut writer = RecordWriter::new(Vec::new()).unwrap();
        writer.write_all(&records).unwrap();
        assert_eq!(writer.written(), 2);
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(
            text,
            "URL,Full Hash,Partial Hash,UTC Time Stamp,Match Type,Match Metadata,Platform\n\
             \"http://evil.example/a,b\",FULL,PART,2024-05-01 12:00:00.000000,MALWARE,MALWARE DISTRIBUTION,ANY_PLATFORM\n\
             http:///,,,2024-05-01 12:00:00.000000,,,\n"
        );
    }
}
