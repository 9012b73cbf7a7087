//! # NACHA Codec
//!
//! Encodes and decodes NACHA-format ACH files: fixed-width, 94-character
//! lines grouped into batches, closed by control records, and padded to
//! ten-line blocks.
//!
//! ## Design Principles
//!
//! - **Static schemas**: every record kind has a constant field table whose
//!   widths sum to 94
//! - **Strict codec**: values never truncate silently; decode is the exact
//!   inverse of encode
//! - **Reconciled controls**: counts, entry hashes and totals are recomputed
//!   and compared, never auto-corrected on decode
//! - **Pure core**: no I/O; text in, text out
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use nacha_codec::{
//!     AchBatch, AchDocument, Amount, BatchEntry, BatchHeader, EntryDetail, FileHeader,
//!     ServiceClass, TransactionCode,
//! };
//!
//! let date = NaiveDate::from_ymd_opt(2019, 7, 9).unwrap();
//! let header = BatchHeader {
//!     service_class: ServiceClass::CreditsOnly,
//!     company_name: "TOAST".to_string(),
//!     company_discretionary_data: String::new(),
//!     company_identification: "0000000000".to_string(),
//!     standard_entry_class: "PPD".to_string(),
//!     company_entry_description: "PAYROLL".to_string(),
//!     company_descriptive_date: String::new(),
//!     effective_entry_date: date,
//!     settlement_date: String::new(),
//!     originator_status_code: "1".to_string(),
//!     originating_dfi: "02100002".to_string(),
//!     batch_number: 1,
//! };
//! let entry = EntryDetail {
//!     transaction_code: TransactionCode::CHECKING_CREDIT,
//!     receiving_dfi: 12345678,
//!     check_digit: 1,
//!     account_number: "987654321".to_string(),
//!     amount: Amount::from_cents(150_000),
//!     individual_id: String::new(),
//!     individual_name: "JANE DOE".to_string(),
//!     discretionary_data: String::new(),
//!     addenda_record_indicator: 0,
//!     trace_number: 21_000_020_000_001,
//! };
//! let batch = AchBatch::new(header, vec![BatchEntry::new(entry)]);
//! let file_header = FileHeader::new(
//!     " 021000021",
//!     "0000000000",
//!     date,
//!     NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
//! );
//! let document = AchDocument::new(file_header, vec![batch]);
//!
//! let text = nacha_codec::encode(&document).unwrap();
//! assert_eq!(text.lines().count(), 10);
//! assert_eq!(nacha_codec::decode(&text).unwrap(), document);
//! ```

pub mod amount;
pub mod controls;
pub mod document;
pub mod error;
pub mod field;
pub mod reader;
pub mod record;
pub mod report;
pub mod schema;
pub mod writer;

pub use amount::Amount;
pub use controls::validate_controls;
pub use document::{AchBatch, AchDocument, BatchEntry};
pub use error::{
    ControlMismatch, ControlScope, DecodeError, EncodeError, FieldError, NachaError,
    RecordError, Result,
};
pub use reader::{decode, AchReader, ReadOptions};
pub use record::{
    AddendaRecord, BatchControl, BatchHeader, EntryDetail, FileControl, FileHeader, Record,
    ServiceClass, TransactionCode,
};
pub use schema::{RecordKind, RECORD_LENGTH};
pub use writer::{encode, AchWriter, WriteOptions};
