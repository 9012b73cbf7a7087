//! Field codec: packs one typed value into a fixed-width text slot and back.
//!
//! Alphanumeric slots are left-justified and space-padded; numeric, date,
//! time and amount slots are right-justified and zero-padded. Decoding is
//! the strict inverse of encoding and never tolerates a width mismatch.

use crate::amount::Amount;
use crate::error::FieldError;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::borrow::Cow;

const DATE_FORMAT: &str = "%y%m%d";
const TIME_FORMAT: &str = "%H%M";

/// Years representable by a two-digit YYMMDD date without ambiguity.
const MIN_YEAR: i32 = 1969;
const MAX_YEAR: i32 = 2068;

/// Side of the slot the value is pushed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Right,
}

/// The kind of value a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, left-justified, space-padded. Values may not end with a
    /// space, since decoding strips the padding.
    Alphanumeric,
    /// Unsigned integer, right-justified, zero-padded
    Numeric,
    /// Identifier made of exactly `width` digits, kept as text so leading
    /// zeros survive
    Digits,
    /// Calendar date as YYMMDD
    Date,
    /// Time of day as HHMM
    Time,
    /// Unsigned amount in minor units without a decimal point
    Amount,
    /// Fixed content, e.g. a record-type code or the record size `094`
    Constant(&'static str),
    /// Reserved slot filled with spaces
    Blank,
}

impl FieldKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            FieldKind::Alphanumeric => "alphanumeric",
            FieldKind::Numeric => "numeric",
            FieldKind::Digits => "digits",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Amount => "amount",
            FieldKind::Constant(_) => "constant",
            FieldKind::Blank => "blank",
        }
    }
}

/// Descriptor of one fixed-width slot inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, width: usize, kind: FieldKind) -> Self {
        FieldSpec { name, width, kind }
    }

    pub fn justify(&self) -> Justify {
        match self.kind {
            FieldKind::Alphanumeric | FieldKind::Constant(_) | FieldKind::Blank => Justify::Left,
            FieldKind::Numeric
            | FieldKind::Digits
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::Amount => Justify::Right,
        }
    }

    pub fn pad(&self) -> char {
        match self.justify() {
            Justify::Left => ' ',
            Justify::Right => '0',
        }
    }
}

/// A typed value moving through the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(u64),
    Date(NaiveDate),
    Time(NaiveTime),
    Amount(Amount),
}

impl FieldValue<'_> {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "numeric",
            FieldValue::Date(_) => "date",
            FieldValue::Time(_) => "time",
            FieldValue::Amount(_) => "amount",
        }
    }
}

/// Encodes `value` into exactly `spec.width` characters.
pub fn encode_field(value: &FieldValue<'_>, spec: &FieldSpec) -> Result<String, FieldError> {
    let raw = match (spec.kind, value) {
        (FieldKind::Alphanumeric, FieldValue::Text(text)) => {
            check_printable(text)?;
            if text.ends_with(' ') {
                return Err(FieldError::TrailingSpace(text.to_string()));
            }
            text.to_string()
        }
        (FieldKind::Digits, FieldValue::Text(text)) => {
            require_digits(text)?;
            let found = text.len();
            if found < spec.width {
                return Err(FieldError::WidthMismatch {
                    width: spec.width,
                    found,
                });
            }
            text.to_string()
        }
        (FieldKind::Constant(expected), FieldValue::Text(text)) => {
            if &**text != expected {
                return Err(FieldError::ConstantMismatch {
                    expected,
                    found: text.to_string(),
                });
            }
            text.to_string()
        }
        (FieldKind::Blank, FieldValue::Text(text)) => {
            if !text.trim().is_empty() {
                return Err(FieldError::NotBlank(text.to_string()));
            }
            String::new()
        }
        (FieldKind::Numeric, FieldValue::Number(n)) => n.to_string(),
        (FieldKind::Date, FieldValue::Date(date)) => {
            if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
                return Err(FieldError::InvalidDate(date.to_string()));
            }
            date.format(DATE_FORMAT).to_string()
        }
        (FieldKind::Time, FieldValue::Time(time)) => {
            if time.second() != 0 || time.nanosecond() != 0 {
                return Err(FieldError::InvalidTime(time.to_string()));
            }
            time.format(TIME_FORMAT).to_string()
        }
        (FieldKind::Amount, FieldValue::Amount(amount)) => {
            if amount.is_negative() {
                return Err(FieldError::NegativeAmount(amount.to_string()));
            }
            amount.cents().to_string()
        }
        (kind, value) => {
            return Err(FieldError::KindMismatch {
                expected: kind.name(),
                found: value.kind_name(),
            })
        }
    };

    let len = raw.chars().count();
    if len > spec.width {
        return Err(FieldError::TooWide {
            value: raw,
            len,
            width: spec.width,
        });
    }

    let padding: String = std::iter::repeat(spec.pad()).take(spec.width - len).collect();
    Ok(match spec.justify() {
        Justify::Left => raw + &padding,
        Justify::Right => padding + &raw,
    })
}

/// Decodes a slot of exactly `spec.width` characters.
///
/// Alphanumeric values come back with trailing padding removed.
pub fn decode_field<'a>(slice: &'a str, spec: &FieldSpec) -> Result<FieldValue<'a>, FieldError> {
    let found = slice.chars().count();
    if found != spec.width {
        return Err(FieldError::WidthMismatch {
            width: spec.width,
            found,
        });
    }

    match spec.kind {
        FieldKind::Alphanumeric => {
            check_printable(slice)?;
            Ok(FieldValue::Text(Cow::Borrowed(slice.trim_end_matches(' '))))
        }
        FieldKind::Constant(expected) => {
            if slice != expected {
                return Err(FieldError::ConstantMismatch {
                    expected,
                    found: slice.to_string(),
                });
            }
            Ok(FieldValue::Text(Cow::Borrowed(slice)))
        }
        FieldKind::Blank => {
            if slice.chars().any(|c| c != ' ') {
                return Err(FieldError::NotBlank(slice.to_string()));
            }
            Ok(FieldValue::Text(Cow::Borrowed("")))
        }
        FieldKind::Numeric => Ok(FieldValue::Number(parse_digits(slice)?)),
        FieldKind::Digits => {
            require_digits(slice)?;
            Ok(FieldValue::Text(Cow::Borrowed(slice)))
        }
        FieldKind::Date => {
            require_digits(slice)?;
            let date = NaiveDate::parse_from_str(slice, DATE_FORMAT)
                .map_err(|_| FieldError::InvalidDate(slice.to_string()))?;
            Ok(FieldValue::Date(date))
        }
        FieldKind::Time => {
            require_digits(slice)?;
            let time = NaiveTime::parse_from_str(slice, TIME_FORMAT)
                .map_err(|_| FieldError::InvalidTime(slice.to_string()))?;
            Ok(FieldValue::Time(time))
        }
        FieldKind::Amount => {
            let cents = parse_digits(slice)?;
            let cents =
                i64::try_from(cents).map_err(|_| FieldError::InvalidAmount(slice.to_string()))?;
            Ok(FieldValue::Amount(Amount::from_cents(cents)))
        }
    }
}

fn check_printable(text: &str) -> Result<(), FieldError> {
    match text.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        Some(c) => Err(FieldError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

fn require_digits(slice: &str) -> Result<(), FieldError> {
    if slice.is_empty() || !slice.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::NonNumeric(slice.to_string()));
    }
    Ok(())
}

fn parse_digits(slice: &str) -> Result<u64, FieldError> {
    require_digits(slice)?;
    slice
        .parse::<u64>()
        .map_err(|_| FieldError::NonNumeric(slice.to_string()))
}
