use std::collections::HashMap;

pub const FIELD_LATITUDE: &str = "latitude";
pub const FIELD_LONGITUDE: &str = "longitude";
pub const FIELD_ACQ_DATE: &str = "acq_date";
pub const FIELD_CONFIDENCE: &str = "confidence";

pub const REQUIRED_FIELDS: [&str; 4] = [
    FIELD_LATITUDE,
    FIELD_LONGITUDE,
    FIELD_ACQ_DATE,
    FIELD_CONFIDENCE,
];

/// One data line keyed by normalized header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// First non-empty value among `fields`.
    pub fn first_of(&self, fields: &[&str]) -> &str {
        fields
            .iter()
            .map(|field| self.get(field))
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeaderError {
    #[error("payload has no data rows")]
    NoDataRows,
    #[error("header is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("unreadable header: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowRejection {
    #[error("malformed line: {0}")]
    Malformed(String),
    #[error("missing {0}")]
    MissingCoordinate(&'static str),
    #[error("non-numeric {field}: {value:?}")]
    NonNumericCoordinate { field: &'static str, value: String },
}

#[derive(Debug, Default)]
pub struct ParsedRows {
    pub records: Vec<RawRecord>,
    pub rejected: Vec<RowRejection>,
}

pub fn normalize_header(token: &str) -> String {
    token
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn validate_header(header: &[String]) -> Result<(), HeaderError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !header.iter().any(|name| name == field))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HeaderError::MissingFields(missing))
    }
}

pub(crate) fn coordinate(record: &RawRecord, field: &'static str) -> Result<f64, RowRejection> {
    let value = record.get(field);
    if value.is_empty() {
        return Err(RowRejection::MissingCoordinate(field));
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowRejection::NonNumericCoordinate {
            field,
            value: value.to_string(),
        })
}

fn validate_row(record: RawRecord) -> Result<RawRecord, RowRejection> {
    coordinate(&record, FIELD_LATITUDE)?;
    coordinate(&record, FIELD_LONGITUDE)?;
    Ok(record)
}

/// Splits one line into trimmed fields. Quoting is honoured, but a quote never spans
/// past the end of the line.
fn split_line(line: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Splits FIRMS CSV text into header-keyed rows.
///
/// Each line is split on its own, so quoted fields may contain the separator but never a
/// line break. A header lacking any of [`REQUIRED_FIELDS`] rejects the whole payload; a
/// bad data line only rejects that line. Values beyond the header width are ignored.
pub fn parse_rows(text: &str) -> Result<ParsedRows, HeaderError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header: Vec<String> = match lines.next() {
        Some(line) => split_line(line)
            .map_err(|err| HeaderError::Unreadable(err.to_string()))?
            .iter()
            .map(|token| normalize_header(token))
            .collect(),
        None => return Err(HeaderError::NoDataRows),
    };
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return Err(HeaderError::NoDataRows);
    }
    validate_header(&header)?;

    let mut parsed = ParsedRows::default();
    for line in lines {
        let outcome = split_line(line)
            .map_err(|err| RowRejection::Malformed(err.to_string()))
            .map(|values| {
                header
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        (name.clone(), values.get(idx).cloned().unwrap_or_default())
                    })
                    .collect::<RawRecord>()
            })
            .and_then(validate_row);
        match outcome {
            Ok(record) => parsed.records.push(record),
            Err(rejection) => parsed.rejected.push(rejection),
        }
    }
    Ok(parsed)
}
