//! Error types for encoding and decoding ACH files.

use crate::schema::RecordKind;
use std::fmt;
use thiserror::Error;

/// Result type alias for the collaborator-facing operations (CLI, reports).
pub type Result<T> = std::result::Result<T, NachaError>;

/// A single value failed to fit, or be read from, its fixed-width slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Value needs more characters than the slot holds
    #[error("value {value:?} is {len} characters wide, field holds {width}")]
    TooWide {
        value: String,
        len: usize,
        width: usize,
    },

    /// ACH amounts are unsigned
    #[error("amount {0} is negative")]
    NegativeAmount(String),

    /// Amount text that is not a two-decimal number
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// Non-digit content in a numeric slot
    #[error("non-numeric content {0:?} in numeric field")]
    NonNumeric(String),

    /// Date that is not a valid YYMMDD inside the two-digit year window
    #[error("invalid date {0:?}, expected YYMMDD between 1969 and 2068")]
    InvalidDate(String),

    /// Time that is not a valid HHMM
    #[error("invalid time {0:?}, expected HHMM with no seconds")]
    InvalidTime(String),

    /// Trailing spaces are indistinguishable from padding once encoded
    #[error("value {0:?} ends with a space")]
    TrailingSpace(String),

    /// Character that cannot appear in a NACHA line
    #[error("character {0:?} is not printable ASCII")]
    InvalidCharacter(char),

    /// Fixed content such as the record size `094` does not match
    #[error("expected {expected:?}, found {found:?}")]
    ConstantMismatch {
        expected: &'static str,
        found: String,
    },

    /// Reserved slot that must contain only spaces
    #[error("reserved field must be blank, found {0:?}")]
    NotBlank(String),

    /// Slice handed to the decoder has the wrong width
    #[error("slice is {found} characters, field is {width}")]
    WidthMismatch { width: usize, found: usize },

    /// Value kind does not match the field descriptor
    #[error("{found} value supplied for {expected} field")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Numeric code outside its enumeration
    #[error("unknown {field} {value}")]
    UnknownCode { field: &'static str, value: u64 },
}

/// One line failed against one record schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Line is not exactly 94 characters
    #[error("line is {0} characters, expected 94")]
    Length(usize),

    /// Line contains non-ASCII characters
    #[error("line contains non-ASCII characters")]
    NonAscii,

    /// Leading record-type digit names no record kind
    #[error("unrecognized record type {0:?}")]
    UnknownType(char),

    /// Leading record-type digit does not match the schema
    #[error("expected record type {}, found {found:?}", .expected.type_code())]
    Classification { expected: RecordKind, found: char },

    /// A field failed to encode or decode
    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: FieldError,
    },

    /// The record's field list and its schema table disagree
    #[error("{0} fields do not match the schema table")]
    SchemaMismatch(RecordKind),
}

/// Which control record a [`ControlMismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlScope {
    /// Batch control of the batch with this number
    Batch(u32),
    /// The file control record
    File,
}

impl fmt::Display for ControlScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlScope::Batch(number) => write!(f, "batch {}", number),
            ControlScope::File => f.write_str("file"),
        }
    }
}

/// A stored control value disagrees with the value recomputed from content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{scope} control `{field}` is {actual}, computed {expected}")]
pub struct ControlMismatch {
    pub scope: ControlScope,
    pub field: &'static str,
    /// Value recomputed from the document content
    pub expected: String,
    /// Value stored on the control record
    pub actual: String,
}

/// Failure while encoding a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A record could not be encoded
    #[error("cannot encode {record} at line {line}: {source}")]
    Record {
        line: usize,
        record: RecordKind,
        #[source]
        source: RecordError,
    },
}

impl EncodeError {
    /// Name of the offending field, if the failure was field-level.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EncodeError::Record {
                source: RecordError::Field { field, .. },
                ..
            } => Some(*field),
            EncodeError::Record { .. } => None,
        }
    }
}

/// Failure while decoding text into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Line length is not 94
    #[error("line {line}: malformed line of {length} characters, expected 94")]
    MalformedLine { line: usize, length: usize },

    /// Line contains non-ASCII characters
    #[error("line {line}: non-ASCII content")]
    NonAscii { line: usize },

    /// Record-type digit is unrecognized or does not match the schema
    #[error("line {line}: unrecognized record type {found:?}")]
    Classification {
        line: usize,
        found: char,
        expected: Option<RecordKind>,
    },

    /// A field failed to decode
    #[error("line {line} ({record}): field `{field}`: {source}")]
    Field {
        line: usize,
        record: RecordKind,
        field: &'static str,
        #[source]
        source: FieldError,
    },

    /// Records appear in an order the file layout does not allow
    #[error("line {line}: {reason}")]
    Structural { line: usize, reason: String },

    /// Control totals do not reconcile
    #[error("control totals do not reconcile: {0}")]
    Control(#[from] ControlMismatch),
}

impl DecodeError {
    /// Attaches line context to a record-level failure.
    pub(crate) fn from_record(line: usize, record: RecordKind, err: RecordError) -> Self {
        match err {
            RecordError::Length(length) => DecodeError::MalformedLine { line, length },
            RecordError::NonAscii => DecodeError::NonAscii { line },
            RecordError::UnknownType(found) => DecodeError::Classification {
                line,
                found,
                expected: None,
            },
            RecordError::Classification { expected, found } => DecodeError::Classification {
                line,
                found,
                expected: Some(expected),
            },
            RecordError::Field { field, source } => DecodeError::Field {
                line,
                record,
                field,
                source,
            },
            RecordError::SchemaMismatch(kind) => DecodeError::Structural {
                line,
                reason: format!("{} fields do not match the schema table", kind),
            },
        }
    }

    pub(crate) fn structural(line: usize, reason: impl Into<String>) -> Self {
        DecodeError::Structural {
            line,
            reason: reason.into(),
        }
    }

    /// Line number the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::MalformedLine { line, .. }
            | DecodeError::NonAscii { line }
            | DecodeError::Classification { line, .. }
            | DecodeError::Field { line, .. }
            | DecodeError::Structural { line, .. } => Some(*line),
            DecodeError::Control(_) => None,
        }
    }
}

/// Errors surfaced by the command-line collaborator.
#[derive(Error, Debug)]
pub enum NachaError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write the CSV report
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Missing command or input file argument
    #[error("Missing argument. Usage: nacha-codec <check|report|fill> <file.ach>")]
    MissingArgument,

    /// Command other than check, report or fill
    #[error("Unknown command '{0}'. Usage: nacha-codec <check|report|fill> <file.ach>")]
    UnknownCommand(String),
}
