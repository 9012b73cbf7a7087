//! Typed NACHA records and their line encodings.
//!
//! Each record struct owns the typed values of one 94-character line. The
//! [`Record`] enum tags a record with its kind so a line can be decoded by
//! its leading digit and a value encoded by its own variant.

use crate::amount::Amount;
use crate::error::{FieldError, RecordError};
use crate::schema::{LineReader, LineWriter, RecordKind};
use chrono::{NaiveDate, NaiveTime};

/// Modulus for the 7-digit sequence part of a trace number.
const TRACE_SEQUENCE_MODULUS: u64 = 10_000_000;

fn field_error(field: &'static str) -> impl FnOnce(FieldError) -> RecordError {
    move |source| RecordError::Field { field, source }
}

/// Service class of a batch: which directions of money its entries move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceClass {
    /// 200: debits and credits
    Mixed,
    /// 220: credits only
    CreditsOnly,
    /// 225: debits only
    DebitsOnly,
    /// 280: automated accounting advices
    AccountingAdvices,
}

impl ServiceClass {
    pub fn code(self) -> u16 {
        match self {
            ServiceClass::Mixed => 200,
            ServiceClass::CreditsOnly => 220,
            ServiceClass::DebitsOnly => 225,
            ServiceClass::AccountingAdvices => 280,
        }
    }

    pub fn from_code(code: u16) -> Result<Self, FieldError> {
        match code {
            200 => Ok(ServiceClass::Mixed),
            220 => Ok(ServiceClass::CreditsOnly),
            225 => Ok(ServiceClass::DebitsOnly),
            280 => Ok(ServiceClass::AccountingAdvices),
            other => Err(FieldError::UnknownCode {
                field: "service class code",
                value: other.into(),
            }),
        }
    }
}

/// Two-digit entry transaction code.
///
/// The first digit names the account type (2 checking, 3 savings, 4 general
/// ledger, 5 loan); the second names the direction: 1-4 credit, 6-9 debit.
/// Within each direction the digits are return/NOC, live, prenote, and
/// zero-dollar remittance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionCode(u8);

impl TransactionCode {
    pub const CHECKING_CREDIT: Self = TransactionCode(22);
    pub const CHECKING_CREDIT_PRENOTE: Self = TransactionCode(23);
    pub const CHECKING_DEBIT: Self = TransactionCode(27);
    pub const CHECKING_DEBIT_PRENOTE: Self = TransactionCode(28);
    pub const SAVINGS_CREDIT: Self = TransactionCode(32);
    pub const SAVINGS_CREDIT_PRENOTE: Self = TransactionCode(33);
    pub const SAVINGS_DEBIT: Self = TransactionCode(37);
    pub const SAVINGS_DEBIT_PRENOTE: Self = TransactionCode(38);

    pub fn new(code: u8) -> Result<Self, FieldError> {
        let account = code / 10;
        let direction = code % 10;
        if (2..=5).contains(&account) && direction != 0 && direction != 5 {
            Ok(TransactionCode(code))
        } else {
            Err(FieldError::UnknownCode {
                field: "transaction code",
                value: code.into(),
            })
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn is_credit(self) -> bool {
        (1..=4).contains(&(self.0 % 10))
    }

    pub fn is_debit(self) -> bool {
        (6..=9).contains(&(self.0 % 10))
    }

    pub fn is_prenote(self) -> bool {
        matches!(self.0 % 10, 3 | 8)
    }

    /// Automated return or notification of change.
    pub fn is_return(self) -> bool {
        matches!(self.0 % 10, 1 | 6)
    }
}

/// Type 1: opens the file and identifies sender and receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub priority_code: u8,
    /// Receiving point routing number, conventionally a leading blank plus 9 digits
    pub immediate_destination: String,
    pub immediate_origin: String,
    pub file_creation_date: NaiveDate,
    pub file_creation_time: NaiveTime,
    /// Distinguishes multiple files created on the same day (A-Z, 0-9)
    pub file_id_modifier: String,
    pub blocking_factor: u8,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
    pub reference_code: String,
}

impl FileHeader {
    pub const KIND: RecordKind = RecordKind::FileHeader;

    /// Header with the conventional priority `01`, modifier `A` and blocking factor `10`.
    pub fn new(
        immediate_destination: impl Into<String>,
        immediate_origin: impl Into<String>,
        file_creation_date: NaiveDate,
        file_creation_time: NaiveTime,
    ) -> Self {
        FileHeader {
            priority_code: 1,
            immediate_destination: immediate_destination.into(),
            immediate_origin: immediate_origin.into(),
            file_creation_date,
            file_creation_time,
            file_id_modifier: "A".to_string(),
            blocking_factor: 10,
            immediate_destination_name: String::new(),
            immediate_origin_name: String::new(),
            reference_code: String::new(),
        }
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.priority_code)?
            .text(&self.immediate_destination)?
            .text(&self.immediate_origin)?
            .date(self.file_creation_date)?
            .time(self.file_creation_time)?
            .text(&self.file_id_modifier)?
            .constant()?
            .number(self.blocking_factor)?
            .constant()?
            .text(&self.immediate_destination_name)?
            .text(&self.immediate_origin_name)?
            .text(&self.reference_code)?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let priority_code = r.number_as()?;
        let immediate_destination = r.text()?;
        let immediate_origin = r.text()?;
        let file_creation_date = r.date()?;
        let file_creation_time = r.time()?;
        let file_id_modifier = r.text()?;
        r.constant()?;
        let blocking_factor = r.number_as()?;
        r.constant()?;
        let header = FileHeader {
            priority_code,
            immediate_destination,
            immediate_origin,
            file_creation_date,
            file_creation_time,
            file_id_modifier,
            blocking_factor,
            immediate_destination_name: r.text()?,
            immediate_origin_name: r.text()?,
            reference_code: r.text()?,
        };
        r.finish()?;
        Ok(header)
    }
}

/// Type 5: opens a batch of entries from one originator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub service_class: ServiceClass,
    pub company_name: String,
    pub company_discretionary_data: String,
    pub company_identification: String,
    /// SEC code such as `CCD` or `PPD`
    pub standard_entry_class: String,
    pub company_entry_description: String,
    pub company_descriptive_date: String,
    pub effective_entry_date: NaiveDate,
    /// Assigned by the ACH operator; blank on origination
    pub settlement_date: String,
    pub originator_status_code: String,
    /// First 8 digits of the originating bank's routing number
    pub originating_dfi: String,
    pub batch_number: u32,
}

impl BatchHeader {
    pub const KIND: RecordKind = RecordKind::BatchHeader;

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.service_class.code())?
            .text(&self.company_name)?
            .text(&self.company_discretionary_data)?
            .text(&self.company_identification)?
            .text(&self.standard_entry_class)?
            .text(&self.company_entry_description)?
            .text(&self.company_descriptive_date)?
            .date(self.effective_entry_date)?
            .text(&self.settlement_date)?
            .text(&self.originator_status_code)?
            .text(&self.originating_dfi)?
            .number(self.batch_number)?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let service_class =
            ServiceClass::from_code(r.number_as()?).map_err(field_error("service class code"))?;
        let header = BatchHeader {
            service_class,
            company_name: r.text()?,
            company_discretionary_data: r.text()?,
            company_identification: r.text()?,
            standard_entry_class: r.text()?,
            company_entry_description: r.text()?,
            company_descriptive_date: r.text()?,
            effective_entry_date: r.date()?,
            settlement_date: r.text()?,
            originator_status_code: r.text()?,
            originating_dfi: r.text()?,
            batch_number: r.number_as()?,
        };
        r.finish()?;
        Ok(header)
    }
}

/// Type 6: one debit or credit to one receiver account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub transaction_code: TransactionCode,
    /// First 8 digits of the receiving bank's routing number
    pub receiving_dfi: u32,
    /// 9th digit of the receiving bank's routing number
    pub check_digit: u8,
    pub account_number: String,
    pub amount: Amount,
    pub individual_id: String,
    pub individual_name: String,
    pub discretionary_data: String,
    /// 1 when addenda records follow, otherwise 0
    pub addenda_record_indicator: u8,
    /// Originating DFI (8 digits) followed by a 7-digit sequence
    pub trace_number: u64,
}

impl EntryDetail {
    pub const KIND: RecordKind = RecordKind::EntryDetail;

    /// Low-order 7 digits of the trace number, which addenda records echo.
    pub fn sequence_number(&self) -> u32 {
        // < 10^7, always fits
        (self.trace_number % TRACE_SEQUENCE_MODULUS) as u32
    }

    /// Full 9-digit receiving routing number.
    pub fn routing_number(&self) -> String {
        format!("{:08}{}", self.receiving_dfi, self.check_digit)
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.transaction_code.code())?
            .number(self.receiving_dfi)?
            .number(self.check_digit)?
            .text(&self.account_number)?
            .amount(self.amount)?
            .text(&self.individual_id)?
            .text(&self.individual_name)?
            .text(&self.discretionary_data)?
            .number(self.addenda_record_indicator)?
            .number(self.trace_number)?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let transaction_code =
            TransactionCode::new(r.number_as()?).map_err(field_error("transaction code"))?;
        let entry = EntryDetail {
            transaction_code,
            receiving_dfi: r.number_as()?,
            check_digit: r.number_as()?,
            account_number: r.text()?,
            amount: r.amount()?,
            individual_id: r.text()?,
            individual_name: r.text()?,
            discretionary_data: r.text()?,
            addenda_record_indicator: r.number_as()?,
            trace_number: r.number()?,
        };
        r.finish()?;
        Ok(entry)
    }
}

/// Type 7: free-form remittance information attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddendaRecord {
    pub addenda_type_code: u8,
    pub payment_related_information: String,
    /// 1-based position among the owning entry's addenda
    pub addenda_sequence_number: u16,
    /// Low-order 7 digits of the owning entry's trace number
    pub entry_detail_sequence_number: u32,
}

impl AddendaRecord {
    pub const KIND: RecordKind = RecordKind::Addenda;

    /// Type code `05`, general addenda for CCD/PPD/CTX entries.
    pub const GENERAL_TYPE_CODE: u8 = 5;

    /// General addenda linked to `entry`.
    pub fn for_entry(entry: &EntryDetail, sequence: u16, information: impl Into<String>) -> Self {
        AddendaRecord {
            addenda_type_code: Self::GENERAL_TYPE_CODE,
            payment_related_information: information.into(),
            addenda_sequence_number: sequence,
            entry_detail_sequence_number: entry.sequence_number(),
        }
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.addenda_type_code)?
            .text(&self.payment_related_information)?
            .number(self.addenda_sequence_number)?
            .number(self.entry_detail_sequence_number)?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let addenda = AddendaRecord {
            addenda_type_code: r.number_as()?,
            payment_related_information: r.text()?,
            addenda_sequence_number: r.number_as()?,
            entry_detail_sequence_number: r.number_as()?,
        };
        r.finish()?;
        Ok(addenda)
    }
}

/// Type 8: closes a batch with its counts and totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchControl {
    pub service_class: ServiceClass,
    pub entry_addenda_count: u32,
    pub entry_hash: u64,
    pub total_debit: Amount,
    pub total_credit: Amount,
    pub company_identification: String,
    pub message_authentication_code: String,
    pub originating_dfi: String,
    pub batch_number: u32,
}

impl BatchControl {
    pub const KIND: RecordKind = RecordKind::BatchControl;

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.service_class.code())?
            .number(self.entry_addenda_count)?
            .number(self.entry_hash)?
            .amount(self.total_debit)?
            .amount(self.total_credit)?
            .text(&self.company_identification)?
            .text(&self.message_authentication_code)?
            .blank()?
            .text(&self.originating_dfi)?
            .number(self.batch_number)?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let service_class =
            ServiceClass::from_code(r.number_as()?).map_err(field_error("service class code"))?;
        let entry_addenda_count = r.number_as()?;
        let entry_hash = r.number()?;
        let total_debit = r.amount()?;
        let total_credit = r.amount()?;
        let company_identification = r.text()?;
        let message_authentication_code = r.text()?;
        r.blank()?;
        let control = BatchControl {
            service_class,
            entry_addenda_count,
            entry_hash,
            total_debit,
            total_credit,
            company_identification,
            message_authentication_code,
            originating_dfi: r.text()?,
            batch_number: r.number_as()?,
        };
        r.finish()?;
        Ok(control)
    }
}

/// Type 9: closes the file with totals across all batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileControl {
    pub batch_count: u32,
    pub block_count: u32,
    pub entry_addenda_count: u32,
    pub entry_hash: u64,
    pub total_debit: Amount,
    pub total_credit: Amount,
}

impl FileControl {
    pub const KIND: RecordKind = RecordKind::FileControl;

    pub fn encode(&self) -> Result<String, RecordError> {
        let mut w = LineWriter::new(Self::KIND);
        w.constant()?
            .number(self.batch_count)?
            .number(self.block_count)?
            .number(self.entry_addenda_count)?
            .number(self.entry_hash)?
            .amount(self.total_debit)?
            .amount(self.total_credit)?
            .blank()?;
        w.finish()
    }

    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let mut r = LineReader::new(Self::KIND, line)?;
        r.constant()?;
        let control = FileControl {
            batch_count: r.number_as()?,
            block_count: r.number_as()?,
            entry_addenda_count: r.number_as()?,
            entry_hash: r.number()?,
            total_debit: r.amount()?,
            total_credit: r.amount()?,
        };
        r.blank()?;
        r.finish()?;
        Ok(control)
    }
}

/// Any one line of an ACH file, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    FileHeader(FileHeader),
    BatchHeader(BatchHeader),
    EntryDetail(EntryDetail),
    Addenda(AddendaRecord),
    BatchControl(BatchControl),
    FileControl(FileControl),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::FileHeader(_) => RecordKind::FileHeader,
            Record::BatchHeader(_) => RecordKind::BatchHeader,
            Record::EntryDetail(_) => RecordKind::EntryDetail,
            Record::Addenda(_) => RecordKind::Addenda,
            Record::BatchControl(_) => RecordKind::BatchControl,
            Record::FileControl(_) => RecordKind::FileControl,
        }
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        match self {
            Record::FileHeader(r) => r.encode(),
            Record::BatchHeader(r) => r.encode(),
            Record::EntryDetail(r) => r.encode(),
            Record::Addenda(r) => r.encode(),
            Record::BatchControl(r) => r.encode(),
            Record::FileControl(r) => r.encode(),
        }
    }

    /// Decodes a line, choosing the schema by its leading record-type digit.
    pub fn decode(line: &str) -> Result<Self, RecordError> {
        let code = line.chars().next().unwrap_or(' ');
        match RecordKind::from_type_code(code) {
            Some(RecordKind::FileHeader) => FileHeader::decode(line).map(Record::FileHeader),
            Some(RecordKind::BatchHeader) => BatchHeader::decode(line).map(Record::BatchHeader),
            Some(RecordKind::EntryDetail) => EntryDetail::decode(line).map(Record::EntryDetail),
            Some(RecordKind::Addenda) => AddendaRecord::decode(line).map(Record::Addenda),
            Some(RecordKind::BatchControl) => BatchControl::decode(line).map(Record::BatchControl),
            Some(RecordKind::FileControl) => FileControl::decode(line).map(Record::FileControl),
            None => Err(RecordError::UnknownType(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_header() -> FileHeader {
        FileHeader {
            priority_code: 1,
            immediate_destination: "b021000021".to_string(),
            immediate_origin: "0000000000".to_string(),
            file_creation_date: NaiveDate::from_ymd_opt(2019, 7, 9).unwrap(),
            file_creation_time: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
            file_id_modifier: "X".to_string(),
            blocking_factor: 10,
            immediate_destination_name: "JPMORGAN CHASE".to_string(),
            immediate_origin_name: "TOAST".to_string(),
            reference_code: String::new(),
        }
    }

    fn entry() -> EntryDetail {
        EntryDetail {
            transaction_code: TransactionCode::CHECKING_DEBIT,
            receiving_dfi: 12345678,
            check_digit: 1,
            account_number: "DFIACCOUNTNUMBER".to_string(),
            amount: Amount::from_cents(12345),
            individual_id: "INDIVIDNUMBER".to_string(),
            individual_name: "SIMISANDWICHSHOP".to_string(),
            discretionary_data: String::new(),
            addenda_record_indicator: 1,
            trace_number: 21000020000001,
        }
    }

    #[test]
    fn test_file_header_layout() {
        let line = file_header().encode().unwrap();
        assert_eq!(line.len(), 94);
        assert_eq!(&line[..40], "101b02100002100000000001907090630X094101");
        assert_eq!(&line[40..63], "JPMORGAN CHASE         ");
        assert_eq!(&line[63..86], "TOAST                  ");
        assert_eq!(&line[86..], "        ");
        assert_eq!(FileHeader::decode(&line).unwrap(), file_header());
    }

    #[test]
    fn test_entry_detail_layout() {
        let line = entry().encode().unwrap();
        assert_eq!(line.len(), 94);
        assert_eq!(&line[..12], "627123456781");
        assert_eq!(&line[12..29], "DFIACCOUNTNUMBER ");
        assert_eq!(&line[29..39], "0000012345");
        assert_eq!(&line[76..], "  1021000020000001");
        assert_eq!(EntryDetail::decode(&line).unwrap(), entry());
    }

    #[test]
    fn test_entry_encode_reports_offending_field() {
        let mut e = entry();
        e.individual_name = "A NAME THAT IS FAR TOO LONG".to_string();
        match e.encode().unwrap_err() {
            RecordError::Field { field, source } => {
                assert_eq!(field, "individual name");
                assert!(matches!(source, FieldError::TooWide { width: 22, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_addenda_links_to_entry() {
        let addenda = AddendaRecord::for_entry(&entry(), 1, "Payment related info.");
        assert_eq!(addenda.entry_detail_sequence_number, 1);
        let line = addenda.encode().unwrap();
        assert!(line.starts_with("705Payment related info."));
        assert!(line.ends_with("00010000001"));
        assert_eq!(AddendaRecord::decode(&line).unwrap(), addenda);
    }

    #[test]
    fn test_batch_control_reserved_must_be_blank() {
        let control = BatchControl {
            service_class: ServiceClass::CreditsOnly,
            entry_addenda_count: 2,
            entry_hash: 12345678,
            total_debit: Amount::from_cents(12345),
            total_credit: Amount::ZERO,
            company_identification: "0000000000".to_string(),
            message_authentication_code: String::new(),
            originating_dfi: "02100002".to_string(),
            batch_number: 1,
        };
        let line = control.encode().unwrap();
        assert_eq!(BatchControl::decode(&line).unwrap(), control);

        let mut tampered = line.clone();
        tampered.replace_range(73..74, "X");
        assert!(matches!(
            BatchControl::decode(&tampered),
            Err(RecordError::Field {
                field: "reserved",
                ..
            })
        ));
    }

    #[test]
    fn test_originating_dfi_must_be_eight_digits() {
        let control = BatchControl {
            service_class: ServiceClass::CreditsOnly,
            entry_addenda_count: 1,
            entry_hash: 12345678,
            total_debit: Amount::ZERO,
            total_credit: Amount::from_cents(100),
            company_identification: "0000000000".to_string(),
            message_authentication_code: String::new(),
            originating_dfi: "0210000X".to_string(),
            batch_number: 1,
        };
        assert!(matches!(
            control.encode(),
            Err(RecordError::Field {
                field: "originating dfi identification",
                source: FieldError::NonNumeric(_)
            })
        ));

        let mut line = BatchControl {
            originating_dfi: "02100002".to_string(),
            ..control
        }
        .encode()
        .unwrap();
        assert_eq!(&line[79..87], "02100002");
        line.replace_range(79..80, " ");
        assert!(matches!(
            BatchControl::decode(&line),
            Err(RecordError::Field {
                field: "originating dfi identification",
                ..
            })
        ));
    }

    #[test]
    fn test_record_dispatch_by_leading_digit() {
        let line = file_header().encode().unwrap();
        let record = Record::decode(&line).unwrap();
        assert_eq!(record.kind(), RecordKind::FileHeader);
        assert_eq!(record.encode().unwrap(), line);

        let unknown = format!("3{}", &line[1..]);
        assert_eq!(Record::decode(&unknown), Err(RecordError::UnknownType('3')));
    }

    #[test]
    fn test_wrong_schema_is_a_classification_error() {
        let line = file_header().encode().unwrap();
        assert_eq!(
            BatchHeader::decode(&line),
            Err(RecordError::Classification {
                expected: RecordKind::BatchHeader,
                found: '1'
            })
        );
    }

    #[test]
    fn test_unknown_codes_are_field_errors() {
        let mut line = entry().encode().unwrap();
        line.replace_range(1..3, "99");
        assert!(matches!(
            EntryDetail::decode(&line),
            Err(RecordError::Field {
                field: "transaction code",
                source: FieldError::UnknownCode { value: 99, .. }
            })
        ));
        assert!(ServiceClass::from_code(221).is_err());
    }

    #[test]
    fn test_transaction_code_classification() {
        assert!(TransactionCode::CHECKING_DEBIT.is_debit());
        assert!(!TransactionCode::CHECKING_DEBIT.is_credit());
        assert!(TransactionCode::SAVINGS_CREDIT.is_credit());
        assert!(TransactionCode::CHECKING_CREDIT_PRENOTE.is_prenote());
        assert!(TransactionCode::new(21).unwrap().is_return());
        assert!(TransactionCode::new(20).is_err());
        assert!(TransactionCode::new(65).is_err());
        assert!(TransactionCode::new(12).is_err());
    }
}
