//! Persisted record layout shared by text-based backends and export/import.
//!
//! One record per line with the ordered fields
//! `user_id, display_name, code, code_issued_at, joined_at`, comma separated.
//! Absent values are empty strings. Quoting follows RFC 4180 via the `csv`
//! crate.
//!
//! Rows this codec cannot interpret are kept as [`Row::Raw`] and written back
//! field for field, and columns past the known ones ride along with their
//! record. Rewriting a sheet never drops a row.

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::warn;

use crate::error::StoreError;
use crate::record::{PromoCode, StoredTime, UserId, UserRecord, non_empty};

/// Current header row.
pub const HEADER: [&str; 5] = ["user_id", "display_name", "code", "code_issued_at", "joined_at"];

/// Header written by the earlier bot, before join tracking existed.
pub const LEGACY_HEADER: [&str; 4] = ["user_id", "username", "code", "code_created_at"];

/// Which header a document was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Current,
    Legacy,
}

impl HeaderKind {
    /// Number of columns the header defines.
    fn width(self) -> usize {
        match self {
            Self::Current => HEADER.len(),
            Self::Legacy => LEGACY_HEADER.len(),
        }
    }
}

/// One data row of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// A decoded record, plus any fields past the known columns.
    Record { record: UserRecord, extra: Vec<String> },
    /// A row whose key does not parse, kept verbatim.
    Raw(Vec<String>),
}

impl Row {
    pub fn record(&self) -> Option<&UserRecord> {
        match self {
            Self::Record { record, .. } => Some(record),
            Self::Raw(_) => None,
        }
    }

    fn record_mut(&mut self) -> Option<&mut UserRecord> {
        match self {
            Self::Record { record, .. } => Some(record),
            Self::Raw(_) => None,
        }
    }
}

impl From<UserRecord> for Row {
    fn from(record: UserRecord) -> Self {
        Self::Record {
            record,
            extra: Vec::new(),
        }
    }
}

/// A decoded document, rows in file order (duplicates preserved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub header: HeaderKind,
    pub rows: Vec<Row>,
}

impl Sheet {
    /// An empty sheet with the current header.
    pub fn empty() -> Self {
        Self {
            header: HeaderKind::Current,
            rows: Vec::new(),
        }
    }

    /// Decoded records in file order; raw rows are skipped.
    pub fn records(&self) -> impl Iterator<Item = &UserRecord> {
        self.rows.iter().filter_map(Row::record)
    }

    /// Indices into `rows` of every record for `user_id`, in file order.
    pub fn positions(&self, user_id: UserId) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.record().is_some_and(|r| r.user_id == user_id))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn record(&self, index: usize) -> Option<&UserRecord> {
        self.rows.get(index).and_then(Row::record)
    }

    pub fn record_mut(&mut self, index: usize) -> Option<&mut UserRecord> {
        self.rows.get_mut(index).and_then(Row::record_mut)
    }

    /// Append a record at the end of the sheet.
    pub fn push(&mut self, record: UserRecord) {
        self.rows.push(record.into());
    }

    /// Number of rows kept verbatim.
    pub fn raw_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, Row::Raw(_)))
            .count()
    }
}

/// Decode a whole document.
///
/// An empty document is an empty sheet and an unknown header is a
/// [`StoreError::Layout`]. Rows whose key does not parse are kept as
/// [`Row::Raw`] with a warning.
pub fn decode(text: &str) -> Result<Sheet, StoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut lines = reader.records();

    let header = match lines.next() {
        None => return Ok(Sheet::empty()),
        Some(fields) => header_kind(&fields?)?,
    };

    let mut rows = Vec::new();
    for fields in lines {
        let fields = fields?;
        let row = decode_row(&fields, header.width());
        if let Row::Raw(raw) = &row {
            let line = fields.position().map_or(0, |p| p.line());
            warn!(line, key = raw.first().map_or("", String::as_str), "keeping row with unparseable user_id");
        }
        rows.push(row);
    }
    Ok(Sheet { header, rows })
}

/// Encode a sheet under the current header, raw rows included.
pub fn encode_sheet(sheet: &Sheet) -> Result<String, StoreError> {
    write_rows(sheet.rows.iter().map(row_fields))
}

/// Encode records under the current header.
pub fn encode<'a>(
    records: impl IntoIterator<Item = &'a UserRecord>,
) -> Result<String, StoreError> {
    write_rows(records.into_iter().map(record_fields))
}

fn write_rows(rows: impl Iterator<Item = Vec<String>>) -> Result<String, StoreError> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for fields in rows {
        writer.write_record(&fields)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::unavailable(e.error()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Layout(e.to_string()))
}

fn row_fields(row: &Row) -> Vec<String> {
    match row {
        Row::Record { record, extra } => {
            let mut fields = record_fields(record);
            fields.extend(extra.iter().cloned());
            fields
        }
        Row::Raw(fields) => fields.clone(),
    }
}

fn record_fields(record: &UserRecord) -> Vec<String> {
    vec![
        record.user_id.to_string(),
        record.display_name.clone().unwrap_or_default(),
        record
            .code
            .as_ref()
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        record
            .code_issued_at
            .as_ref()
            .map(StoredTime::to_field)
            .unwrap_or_default(),
        record
            .joined_at
            .as_ref()
            .map(StoredTime::to_field)
            .unwrap_or_default(),
    ]
}

fn header_kind(fields: &StringRecord) -> Result<HeaderKind, StoreError> {
    let names: Vec<&str> = fields.iter().map(str::trim).collect();
    if names == HEADER {
        Ok(HeaderKind::Current)
    } else if names == LEGACY_HEADER {
        Ok(HeaderKind::Legacy)
    } else {
        Err(StoreError::Layout(format!("unexpected header: {}", names.join(","))))
    }
}

fn decode_row(fields: &StringRecord, width: usize) -> Row {
    let field = |i: usize| if i < width { fields.get(i).unwrap_or("") } else { "" };
    let Ok(user_id) = field(0).trim().parse::<UserId>() else {
        return Row::Raw(fields.iter().map(str::to_string).collect());
    };
    // Legacy rows stop after code_issued_at; joined_at reads as absent.
    let record = UserRecord {
        user_id,
        display_name: non_empty(Some(field(1))),
        code: non_empty(Some(field(2))).map(PromoCode::new),
        code_issued_at: StoredTime::from_field(field(3)),
        joined_at: StoredTime::from_field(field(4)),
    };
    let extra = fields.iter().skip(width).map(str::to_string).collect();
    Row::Record { record, extra }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    const HEAD: &str = "user_id,display_name,code,code_issued_at,joined_at\n";

    #[test]
    fn test_encode_absent_fields_as_empty() {
        let record = UserRecord::stub(UserId(42), None);
        assert_eq!(encode([&record]).unwrap(), format!("{HEAD}42,,,,\n"));
    }

    #[test]
    fn test_encode_quotes_awkward_names() {
        let record = UserRecord::stub(UserId(7), Some("Smith, \"Bob\""));
        let text = encode([&record]).unwrap();
        assert_eq!(text, format!("{HEAD}7,\"Smith, \"\"Bob\"\"\",,,\n"));

        let sheet = decode(&text).unwrap();
        assert_eq!(sheet.records().collect::<Vec<_>>(), vec![&record]);
    }

    #[test]
    fn test_decode_full_document() {
        let text = "\
user_id,display_name,code,code_issued_at,joined_at
1,alice,PROMO-ABC123,2025-03-01T12:00:00.000000Z,2025-03-01T11:00:00.000000Z
2,bob,,,
";
        let sheet = decode(text).unwrap();
        assert_eq!(sheet.header, HeaderKind::Current);
        assert_eq!(sheet.rows.len(), 2);

        let alice = sheet.record(0).unwrap();
        assert_eq!(alice.code, Some(PromoCode::new("PROMO-ABC123")));
        assert_eq!(
            alice.joined_at,
            Some(StoredTime::At(Utc.with_ymd_and_hms(2025, 3, 1, 11, 0, 0).unwrap()))
        );
        assert_eq!(sheet.record(1), Some(&UserRecord::stub(UserId(2), Some("bob"))));
    }

    #[test]
    fn test_decode_legacy_header() {
        let text = "user_id,username,code,code_created_at\n5,carol,MEBEL-00FF00,2024-11-02T09:15:00.5\n";
        let sheet = decode(text).unwrap();
        assert_eq!(sheet.header, HeaderKind::Legacy);
        let carol = sheet.record(0).unwrap();
        assert!(carol.has_code());
        assert!(matches!(carol.code_issued_at, Some(StoredTime::At(_))));
        assert_eq!(carol.joined_at, None);
    }

    #[test]
    fn test_decode_unknown_header_is_layout_error() {
        let err = decode("id,name\n1,x\n").unwrap_err();
        assert!(matches!(err, StoreError::Layout(_)));
    }

    #[test]
    fn test_unparseable_rows_survive_rewrite() {
        let text = format!("{HEAD}@vip,manual,MEBEL-ABCDEF,,\n3,,,,\n");
        let mut sheet = decode(&text).unwrap();
        assert_eq!(sheet.raw_count(), 1);
        assert_eq!(sheet.records().count(), 1);

        assert_eq!(encode_sheet(&sheet).unwrap(), text);

        sheet.push(UserRecord::stub(UserId(4), None));
        let rewritten = encode_sheet(&sheet).unwrap();
        assert_eq!(rewritten, format!("{text}4,,,,\n"));
    }

    #[test]
    fn test_extra_columns_survive_rewrite() {
        let text = format!("{HEAD}8,eve,,,,vip note,\"a,b\"\n");
        let sheet = decode(&text).unwrap();
        match &sheet.rows[0] {
            Row::Record { record, extra } => {
                assert_eq!(record.user_id, UserId(8));
                assert_eq!(extra, &vec!["vip note".to_string(), "a,b".to_string()]);
            }
            other => panic!("unexpected row: {other:?}"),
        }
        assert_eq!(encode_sheet(&sheet).unwrap(), text);
    }

    #[test]
    fn test_legacy_extra_column_moves_past_joined_at() {
        let text = "user_id,username,code,code_created_at\n1,old,,,note\n";
        let sheet = decode(text).unwrap();
        assert_eq!(sheet.record(0).unwrap().joined_at, None);
        assert_eq!(encode_sheet(&sheet).unwrap(), format!("{HEAD}1,old,,,,note\n"));
    }

    #[test]
    fn test_positions_reports_duplicates() {
        let text = format!("{HEAD}9,a,,,\nx,,,,\n9,b,,,\n");
        let sheet = decode(&text).unwrap();
        assert_eq!(sheet.positions(UserId(9)), vec![0, 2]);
        assert!(sheet.positions(UserId(1)).is_empty());
    }

    #[test]
    fn test_decode_empty_document() {
        assert_eq!(decode("").unwrap(), Sheet::empty());
    }
}
