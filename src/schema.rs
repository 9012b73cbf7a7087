//! Record schemas: one static field table per record kind.
//!
//! Every table lists its slots in column order and its widths sum to
//! [`RECORD_LENGTH`]. Records are encoded with a [`LineWriter`] and decoded
//! with a [`LineReader`], both of which walk the table one slot at a time.

use crate::amount::Amount;
use crate::error::{FieldError, RecordError};
use crate::field::{decode_field, encode_field, FieldKind, FieldSpec, FieldValue};
use chrono::{NaiveDate, NaiveTime};
use std::borrow::Cow;
use std::fmt;
use std::slice::Iter;

/// Characters per record, excluding the line terminator.
pub const RECORD_LENGTH: usize = 94;

/// Records per block.
pub const BLOCKING_FACTOR: usize = 10;

/// Character used to fill padding lines after the file control record.
pub const FILLER_CHAR: char = '9';

/// Returns one all-nines padding line.
pub fn filler_line() -> String {
    std::iter::repeat(FILLER_CHAR).take(RECORD_LENGTH).collect()
}

/// The six NACHA record kinds, tagged by their leading type digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    FileHeader,
    BatchHeader,
    EntryDetail,
    Addenda,
    BatchControl,
    FileControl,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::FileHeader,
        RecordKind::BatchHeader,
        RecordKind::EntryDetail,
        RecordKind::Addenda,
        RecordKind::BatchControl,
        RecordKind::FileControl,
    ];

    /// The record-type digit in column 1.
    pub fn type_code(self) -> char {
        match self {
            RecordKind::FileHeader => '1',
            RecordKind::BatchHeader => '5',
            RecordKind::EntryDetail => '6',
            RecordKind::Addenda => '7',
            RecordKind::BatchControl => '8',
            RecordKind::FileControl => '9',
        }
    }

    pub fn from_type_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_code() == code)
    }

    /// The field table for this kind.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            RecordKind::FileHeader => FILE_HEADER,
            RecordKind::BatchHeader => BATCH_HEADER,
            RecordKind::EntryDetail => ENTRY_DETAIL,
            RecordKind::Addenda => ADDENDA,
            RecordKind::BatchControl => BATCH_CONTROL,
            RecordKind::FileControl => FILE_CONTROL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordKind::FileHeader => "file header",
            RecordKind::BatchHeader => "batch header",
            RecordKind::EntryDetail => "entry detail",
            RecordKind::Addenda => "addenda",
            RecordKind::BatchControl => "batch control",
            RecordKind::FileControl => "file control",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const fn alpha(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width, FieldKind::Alphanumeric)
}

const fn num(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width, FieldKind::Numeric)
}

const fn digits(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width, FieldKind::Digits)
}

const fn amount(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width, FieldKind::Amount)
}

const fn constant(name: &'static str, value: &'static str) -> FieldSpec {
    FieldSpec::new(name, value.len(), FieldKind::Constant(value))
}

const fn blank(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width, FieldKind::Blank)
}

static FILE_HEADER: &[FieldSpec] = &[
    constant("record type code", "1"),
    num("priority code", 2),
    alpha("immediate destination", 10),
    alpha("immediate origin", 10),
    FieldSpec::new("file creation date", 6, FieldKind::Date),
    FieldSpec::new("file creation time", 4, FieldKind::Time),
    alpha("file id modifier", 1),
    constant("record size", "094"),
    num("blocking factor", 2),
    constant("format code", "1"),
    alpha("immediate destination name", 23),
    alpha("immediate origin name", 23),
    alpha("reference code", 8),
];

static BATCH_HEADER: &[FieldSpec] = &[
    constant("record type code", "5"),
    num("service class code", 3),
    alpha("company name", 16),
    alpha("company discretionary data", 20),
    alpha("company identification", 10),
    alpha("standard entry class code", 3),
    alpha("company entry description", 10),
    alpha("company descriptive date", 6),
    FieldSpec::new("effective entry date", 6, FieldKind::Date),
    alpha("settlement date", 3),
    alpha("originator status code", 1),
    digits("originating dfi identification", 8),
    num("batch number", 7),
];

static ENTRY_DETAIL: &[FieldSpec] = &[
    constant("record type code", "6"),
    num("transaction code", 2),
    num("receiving dfi identification", 8),
    num("check digit", 1),
    alpha("dfi account number", 17),
    amount("amount", 10),
    alpha("individual identification number", 15),
    alpha("individual name", 22),
    alpha("discretionary data", 2),
    num("addenda record indicator", 1),
    num("trace number", 15),
];

static ADDENDA: &[FieldSpec] = &[
    constant("record type code", "7"),
    num("addenda type code", 2),
    alpha("payment related information", 80),
    num("addenda sequence number", 4),
    num("entry detail sequence number", 7),
];

static BATCH_CONTROL: &[FieldSpec] = &[
    constant("record type code", "8"),
    num("service class code", 3),
    num("entry/addenda count", 6),
    num("entry hash", 10),
    amount("total debit entry dollar amount", 12),
    amount("total credit entry dollar amount", 12),
    alpha("company identification", 10),
    alpha("message authentication code", 19),
    blank("reserved", 6),
    digits("originating dfi identification", 8),
    num("batch number", 7),
];

static FILE_CONTROL: &[FieldSpec] = &[
    constant("record type code", "9"),
    num("batch count", 6),
    num("block count", 6),
    num("entry/addenda count", 8),
    num("entry hash", 10),
    amount("total debit entry dollar amount", 12),
    amount("total credit entry dollar amount", 12),
    blank("reserved", 39),
];

/// Builds one record line by encoding slots in schema order.
pub(crate) struct LineWriter {
    kind: RecordKind,
    fields: Iter<'static, FieldSpec>,
    line: String,
}

impl LineWriter {
    pub fn new(kind: RecordKind) -> Self {
        LineWriter {
            kind,
            fields: kind.schema().iter(),
            line: String::with_capacity(RECORD_LENGTH),
        }
    }

    fn put(&mut self, value: FieldValue<'_>) -> Result<&mut Self, RecordError> {
        let spec = self
            .fields
            .next()
            .ok_or(RecordError::SchemaMismatch(self.kind))?;
        let encoded = encode_field(&value, spec).map_err(|source| RecordError::Field {
            field: spec.name,
            source,
        })?;
        self.line.push_str(&encoded);
        Ok(self)
    }

    /// Writes the next slot's fixed content.
    pub fn constant(&mut self) -> Result<&mut Self, RecordError> {
        match self.fields.as_slice().first().map(|spec| spec.kind) {
            Some(FieldKind::Constant(value)) => self.put(FieldValue::Text(Cow::Borrowed(value))),
            _ => Err(RecordError::SchemaMismatch(self.kind)),
        }
    }

    pub fn blank(&mut self) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Text(Cow::Borrowed("")))
    }

    pub fn text(&mut self, value: &str) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Text(Cow::Borrowed(value)))
    }

    pub fn number(&mut self, value: impl Into<u64>) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Number(value.into()))
    }

    pub fn date(&mut self, value: NaiveDate) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Date(value))
    }

    pub fn time(&mut self, value: NaiveTime) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Time(value))
    }

    pub fn amount(&mut self, value: Amount) -> Result<&mut Self, RecordError> {
        self.put(FieldValue::Amount(value))
    }

    /// Returns the finished line; every slot must have been written.
    pub fn finish(mut self) -> Result<String, RecordError> {
        if self.fields.next().is_some() || self.line.len() != RECORD_LENGTH {
            return Err(RecordError::SchemaMismatch(self.kind));
        }
        Ok(self.line)
    }
}

/// Slices one record line at cumulative schema offsets.
pub(crate) struct LineReader<'a> {
    kind: RecordKind,
    line: &'a str,
    offset: usize,
    fields: Iter<'static, FieldSpec>,
}

impl<'a> LineReader<'a> {
    /// Checks width, charset and record-type digit before any slot is read.
    pub fn new(kind: RecordKind, line: &'a str) -> Result<Self, RecordError> {
        let length = line.chars().count();
        if length != RECORD_LENGTH {
            return Err(RecordError::Length(length));
        }
        if !line.is_ascii() {
            return Err(RecordError::NonAscii);
        }
        let found = line.chars().next().unwrap_or_default();
        if found != kind.type_code() {
            return Err(RecordError::Classification {
                expected: kind,
                found,
            });
        }
        Ok(LineReader {
            kind,
            line,
            offset: 0,
            fields: kind.schema().iter(),
        })
    }

    fn take(&mut self) -> Result<(FieldValue<'a>, &'static FieldSpec), RecordError> {
        let spec = self
            .fields
            .next()
            .ok_or(RecordError::SchemaMismatch(self.kind))?;
        let end = self.offset + spec.width;
        let slice = self
            .line
            .get(self.offset..end)
            .ok_or(RecordError::SchemaMismatch(self.kind))?;
        self.offset = end;
        let value = decode_field(slice, spec).map_err(|source| RecordError::Field {
            field: spec.name,
            source,
        })?;
        Ok((value, spec))
    }

    pub fn constant(&mut self) -> Result<(), RecordError> {
        self.take().map(|_| ())
    }

    pub fn blank(&mut self) -> Result<(), RecordError> {
        self.take().map(|_| ())
    }

    pub fn text(&mut self) -> Result<String, RecordError> {
        match self.take()? {
            (FieldValue::Text(text), _) => Ok(text.into_owned()),
            (other, spec) => Err(mismatch(spec, &other)),
        }
    }

    pub fn number(&mut self) -> Result<u64, RecordError> {
        match self.take()? {
            (FieldValue::Number(n), _) => Ok(n),
            (other, spec) => Err(mismatch(spec, &other)),
        }
    }

    /// Reads a numeric slot into a narrower integer type.
    pub fn number_as<T: TryFrom<u64>>(&mut self) -> Result<T, RecordError> {
        let n = self.number()?;
        T::try_from(n).map_err(|_| RecordError::SchemaMismatch(self.kind))
    }

    pub fn date(&mut self) -> Result<NaiveDate, RecordError> {
        match self.take()? {
            (FieldValue::Date(date), _) => Ok(date),
            (other, spec) => Err(mismatch(spec, &other)),
        }
    }

    pub fn time(&mut self) -> Result<NaiveTime, RecordError> {
        match self.take()? {
            (FieldValue::Time(time), _) => Ok(time),
            (other, spec) => Err(mismatch(spec, &other)),
        }
    }

    pub fn amount(&mut self) -> Result<Amount, RecordError> {
        match self.take()? {
            (FieldValue::Amount(amount), _) => Ok(amount),
            (other, spec) => Err(mismatch(spec, &other)),
        }
    }

    /// Confirms every slot was consumed.
    pub fn finish(mut self) -> Result<(), RecordError> {
        if self.fields.next().is_some() || self.offset != RECORD_LENGTH {
            return Err(RecordError::SchemaMismatch(self.kind));
        }
        Ok(())
    }
}

fn mismatch(spec: &FieldSpec, value: &FieldValue<'_>) -> RecordError {
    RecordError::Field {
        field: spec.name,
        source: FieldError::KindMismatch {
            expected: spec.kind.name(),
            found: value.kind_name(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_is_94_wide() {
        for kind in RecordKind::ALL {
            let width: usize = kind.schema().iter().map(|spec| spec.width).sum();
            assert_eq!(width, RECORD_LENGTH, "{} schema", kind);
        }
    }

    #[test]
    fn test_schema_starts_with_type_code() {
        for kind in RecordKind::ALL {
            let first = kind.schema()[0];
            assert_eq!(first.width, 1);
            match first.kind {
                FieldKind::Constant(code) => assert_eq!(code, kind.type_code().to_string()),
                other => panic!("{} starts with {:?}", kind, other),
            }
        }
    }

    #[test]
    fn test_type_code_lookup() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_type_code(kind.type_code()), Some(kind));
        }
        assert_eq!(RecordKind::from_type_code('2'), None);
        assert_eq!(RecordKind::from_type_code('0'), None);
    }

    #[test]
    fn test_filler_line() {
        let line = filler_line();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert!(line.chars().all(|c| c == '9'));
    }

    #[test]
    fn test_reader_rejects_wrong_length_and_type() {
        let short = "7".repeat(93);
        assert_eq!(
            LineReader::new(RecordKind::Addenda, &short).err(),
            Some(RecordError::Length(93))
        );

        let wrong = format!("6{}", " ".repeat(93));
        assert_eq!(
            LineReader::new(RecordKind::Addenda, &wrong).err(),
            Some(RecordError::Classification {
                expected: RecordKind::Addenda,
                found: '6'
            })
        );
    }

    #[test]
    fn test_writer_requires_every_slot() {
        let mut w = LineWriter::new(RecordKind::Addenda);
        w.constant().unwrap().number(5u8).unwrap();
        assert_eq!(
            w.finish().unwrap_err(),
            RecordError::SchemaMismatch(RecordKind::Addenda)
        );
    }
}
