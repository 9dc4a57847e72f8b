//! Header detection, row validation, and mapping onto `LocationRecord`.

use access_core::constants::{HEADER_LOCATION, HEADER_PRIVACY};
use access_core::error::{AccessError, Result};
use access_core::LocationRecord;
use tracing::{debug, warn};

use crate::tokenizer::tokenize;

// ═══════════════════════════════════════════════════════════════════════════════
// COLUMNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Record field a sheet column maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Column {
    /// Identity
    Location,
    /// Street address
    Address,
    /// `"<lat>, <lng>"`
    LatLong,
    /// Privacy
    Privacy,
    /// Gendered
    Gendered,
    /// Accessibility
    Accessibility,
    /// Notes
    Notes,
    /// Tags
    Tags,
    /// Access
    Access,
    /// Hours
    Hours,
    /// WiFi code
    WifiCode,
    /// Verification date
    Updated,
    /// Anything else, kept under its header name
    Extra(String),
}

impl Column {
    /// Maps a header name, ignoring case, spaces and underscores.
    pub fn from_header(header: &str) -> Self {
        let key: String = header
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "location" => Column::Location,
            "address" => Column::Address,
            "latlong" => Column::LatLong,
            "privacy" => Column::Privacy,
            "gendered" => Column::Gendered,
            "accessibility" => Column::Accessibility,
            "notes" => Column::Notes,
            "tags" => Column::Tags,
            "access" => Column::Access,
            "hours" => Column::Hours,
            "wificode" => Column::WifiCode,
            "updated" => Column::Updated,
            _ => Column::Extra(header.to_string()),
        }
    }

    fn apply(&self, record: LocationRecord, value: &str) -> LocationRecord {
        match self {
            Column::Location => record,
            Column::Address => record.with_address(value),
            Column::LatLong => record.with_lat_long(value),
            Column::Privacy => record.with_privacy(value),
            Column::Gendered => record.with_gendered(value),
            Column::Accessibility => record.with_accessibility(value),
            Column::Notes => record.with_notes(value),
            Column::Tags => record.with_tags(value),
            Column::Access => record.with_access(value),
            Column::Hours => record.with_hours(value),
            Column::WifiCode => record.with_wifi_code(value),
            Column::Updated => record.with_updated(value),
            Column::Extra(name) => {
                let mut record = record;
                if !value.is_empty() {
                    record.extra.insert(name.clone(), value.to_string());
                }
                record
            }
        }
    }

    fn read<'a>(&self, record: &'a LocationRecord) -> &'a str {
        let value = match self {
            Column::Location => Some(&record.location),
            Column::Address => record.address.as_ref(),
            Column::LatLong => record.lat_long.as_ref(),
            Column::Privacy => record.privacy.as_ref(),
            Column::Gendered => record.gendered.as_ref(),
            Column::Accessibility => record.accessibility.as_ref(),
            Column::Notes => record.notes.as_ref(),
            Column::Tags => record.tags.as_ref(),
            Column::Access => record.access.as_ref(),
            Column::Hours => record.hours.as_ref(),
            Column::WifiCode => record.wifi_code.as_ref(),
            Column::Updated => record.updated.as_ref(),
            Column::Extra(name) => record.extra.get(name),
        };
        value.map(String::as_str).unwrap_or("")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Header plus the rows that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvTable {
    /// Column names, quote-stripped and trimmed
    pub headers: Vec<String>,
    /// Accepted rows; each has exactly `headers.len()` fields
    pub rows: Vec<Vec<String>>,
    /// Rows dropped for a wrong field count or an empty location
    pub rejected: usize,
}

impl CsvTable {
    /// Index of the `Location` column, if the header has one.
    pub fn location_index(&self) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| Column::from_header(h) == Column::Location)
    }

    /// Maps every accepted row onto a record.
    pub fn records(&self) -> Vec<LocationRecord> {
        let columns: Vec<Column> = self.headers.iter().map(|h| Column::from_header(h)).collect();
        let Some(location_idx) = self.location_index() else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|row| {
                let record = LocationRecord::new(row.get(location_idx)?.as_str()).ok()?;
                Some(
                    columns
                        .iter()
                        .zip(row)
                        .fold(record, |record, (column, value)| column.apply(record, value)),
                )
            })
            .collect()
    }
}

fn is_header_line(line: &str) -> bool {
    line.contains(HEADER_LOCATION) && line.contains(HEADER_PRIVACY)
}

/// Locates the header and returns the validated table.
///
/// Fails with [`AccessError::ParseFailure`] when no line names both
/// `Location` and `Privacy`.
pub fn parse_table(text: &str) -> Result<CsvTable> {
    let mut lines = text.split('\n');
    let header_line = lines
        .by_ref()
        .find(|line| is_header_line(line))
        .ok_or_else(|| AccessError::ParseFailure("no header row with Location and Privacy".into()))?;

    let headers: Vec<String> = tokenize(header_line)
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim_matches('"').trim().to_string())
        .collect();

    let body = lines.collect::<Vec<_>>().join("\n");
    let location_idx = headers
        .iter()
        .position(|h| Column::from_header(h) == Column::Location);

    let mut rows = Vec::new();
    let mut rejected = 0;
    for row in tokenize(&body) {
        let has_location = location_idx
            .and_then(|i| row.get(i))
            .is_some_and(|v| !v.is_empty());
        if row.len() == headers.len() && has_location {
            rows.push(row);
        } else {
            rejected += 1;
        }
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        rejected,
        "Parsed sheet table"
    );

    Ok(CsvTable {
        headers,
        rows,
        rejected,
    })
}

/// Parses sheet text into records.
///
/// A missing header row is logged and yields an empty list.
pub fn parse(text: &str) -> Vec<LocationRecord> {
    match parse_table(text) {
        Ok(table) => table.records(),
        Err(e) => {
            warn!(error = %e, "Sheet text has no usable header");
            Vec::new()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WRITER
// ═══════════════════════════════════════════════════════════════════════════════

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializes records under `headers`, in the shape [`parse`] reads.
///
/// Columns the record has no value for are written empty.
pub fn write_csv<S: AsRef<str>>(headers: &[S], records: &[LocationRecord]) -> String {
    let columns: Vec<Column> = headers.iter().map(|h| Column::from_header(h.as_ref())).collect();

    let mut out = headers
        .iter()
        .map(|h| escape(h.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for record in records {
        let line = columns
            .iter()
            .map(|c| escape(c.read(record)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SHEET: &str = "Info,,\nLast Modified:,2024-01-01\nLocation,Privacy\nCafe X,Public\n";

    #[test]
    fn test_scenario_sheet() {
        let records = parse(SHEET);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "Cafe X");
        assert_eq!(records[0].privacy.as_deref(), Some("Public"));
        assert!(!records[0].is_api_source);
    }

    #[test]
    fn test_missing_header() {
        assert!(parse("Name,Kind\nCafe X,Public\n").is_empty());
        assert!(matches!(
            parse_table("just,some,text"),
            Err(AccessError::ParseFailure(_))
        ));
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_header_fields_are_unquoted() {
        let table = parse_table("\"Location\", \"Privacy\" ,Tags\nA,Public,Food\n").unwrap();
        assert_eq!(table.headers, vec!["Location", "Privacy", "Tags"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_quoted_values_span_commas_and_lines() {
        let text = "Location,Privacy,Notes\n\"Cafe, X\",Private,\"line one\nline two\"\nPark,Public,\n";
        let records = parse(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location, "Cafe, X");
        assert_eq!(records[0].notes.as_deref(), Some("line one\nline two"));
        assert_eq!(records[1].location, "Park");
        assert_eq!(records[1].notes, None);
    }

    #[test]
    fn test_escaped_quotes() {
        let text = "Location,Privacy\n\"The \"\"Spot\"\"\",Public\n";
        let records = parse(text);
        assert_eq!(records[0].location, "The \"Spot\"");
    }

    #[test]
    fn test_rejects_wrong_field_count_and_empty_location() {
        let text = "Location,Privacy\nA,Public,extra\nB\n,Private\nC,Private\n";
        let table = parse_table(text).unwrap();
        assert_eq!(table.rows, vec![vec!["C".to_string(), "Private".to_string()]]);
        assert_eq!(table.rejected, 3);
    }

    #[test]
    fn test_partial_trailing_record() {
        let complete = parse("Location,Privacy\nA,Public\nB,Private");
        assert_eq!(complete.len(), 2);

        let partial = parse("Location,Privacy\nA,Public\nB");
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn test_column_mapping() {
        let text = "Location,Privacy,Lat_Long,WiFi Code,Hours,Updated,Owner\n\
                    Library,Public,\"44.05, -123.09\",guest123,Mon 9-5;Tue 9-5,2024-03-01,City\n";
        let records = parse(text);
        let r = &records[0];
        assert_eq!(r.lat_long.as_deref(), Some("44.05, -123.09"));
        assert_eq!(r.wifi_code.as_deref(), Some("guest123"));
        assert_eq!(r.hours.as_deref(), Some("Mon 9-5;Tue 9-5"));
        assert_eq!(r.updated.as_deref(), Some("2024-03-01"));
        assert_eq!(r.extra.get("Owner").map(String::as_str), Some("City"));
    }

    #[test]
    fn test_crlf_input() {
        let records = parse("Location,Privacy\r\nA,Public\r\nB,Private\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].privacy.as_deref(), Some("Private"));
    }

    #[test]
    fn test_header_without_location_column_yields_nothing() {
        // "Location" only appears inside another column name
        let records = parse("Location Name,Privacy\nA,Public\n");
        assert!(records.is_empty());
    }

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let record = LocationRecord::new("Cafe, X")
            .unwrap()
            .with_privacy("Public")
            .with_notes("say \"hi\"");
        let out = write_csv(&["Location", "Privacy", "Notes", "Tags"], &[record]);
        assert_eq!(
            out,
            "Location,Privacy,Notes,Tags\n\"Cafe, X\",Public,\"say \"\"hi\"\"\",\n"
        );
    }

    #[test]
    fn test_write_then_parse() {
        let headers = ["Location", "Privacy", "Notes", "Owner"];
        let records = parse(
            "Location,Privacy,Notes,Owner\n\"A, B\",Public,\"multi\nline\",City\nC,Private,,\n",
        );
        assert_eq!(parse(&write_csv(&headers, &records)), records);
    }

    fn value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ,\"\n]{0,12}"
    }

    fn name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ,\"]{0,12}"
    }

    proptest! {
        #[test]
        fn prop_parse_is_idempotent(rows in prop::collection::vec((name(), value(), value(), value()), 0..8)) {
            let headers = ["Location", "Privacy", "Tags", "Owner"];
            let records: Vec<LocationRecord> = rows
                .into_iter()
                .filter_map(|(n, p, t, o)| {
                    let mut r = LocationRecord::new(n).ok()?.with_privacy(p).with_tags(t);
                    let o = o.trim();
                    if !o.is_empty() {
                        r.extra.insert("Owner".to_string(), o.to_string());
                    }
                    Some(r)
                })
                .collect();

            let first = parse(&write_csv(&headers, &records));
            prop_assert_eq!(&first, &records);

            let second = parse(&write_csv(&headers, &first));
            prop_assert_eq!(&first, &second);
        }
    }
}
