//! URL sources: CSV rows for `check`, plain lines for the diagnostics.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};

/// Open a path for reading; `-` is stdin.
pub fn open_input(path: &str) -> Result<Box<dyn Read>, String> {
    if path == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Normalize one raw input cell. Returns `None` for blank cells.
fn clean_url(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    let trimmed = trimmed.strip_prefix("//").unwrap_or(trimmed);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Iterator over the URL column (first field) of a CSV source.
pub struct UrlRows<R> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> UrlRows<R> {
    pub fn new(reader: R, has_header: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .flexible(true)
            .from_reader(reader);
        Self {
            records: reader.into_records(),
        }
    }
}

impl<R: Read> Iterator for UrlRows<R> {
    type Item = Result<String, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(format!("Failed to parse input row: {}", e))),
            };
            if let Some(url) = record.get(0).and_then(clean_url) {
                return Some(Ok(url));
            }
        }
    }
}

// =============================================================================
// Lines
// =============================================================================

/// Read one URL per line, skipping blank lines.
pub fn read_lines<R: Read>(reader: R) -> Result<Vec<String>, String> {
    let mut urls = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
        if let Some(url) = clean_url(&line) {
            urls.push(url);
        }
    }
    Ok(urls)
}
