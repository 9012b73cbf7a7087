//! Serializes an [`AchDocument`] into NACHA text.
//!
//! Records are emitted in file order, then the output is padded with
//! all-nines filler lines up to a whole number of ten-line blocks. Control
//! records are written as stored unless [`WriteOptions::populate_controls`]
//! is set.

use crate::document::{AchBatch, AchDocument};
use crate::error::{EncodeError, RecordError};
use crate::schema::{filler_line, RecordKind, BLOCKING_FACTOR};
use log::debug;
use std::borrow::Cow;

/// Line terminator placed after every record.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Line terminator placed after every record.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Recompute batch and file control records before writing.
    pub populate_controls: bool,
}

/// Document-to-text encoder.
#[derive(Debug, Clone, Default)]
pub struct AchWriter {
    options: WriteOptions,
}

impl AchWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        AchWriter { options }
    }

    /// Encodes `document`. Any field error aborts the whole write.
    pub fn write(&self, document: &AchDocument) -> Result<String, EncodeError> {
        let document = if self.options.populate_controls {
            Cow::Owned(document.clone().with_computed_controls())
        } else {
            Cow::Borrowed(document)
        };

        let mut sink = LineSink::with_capacity(document.line_count());
        sink.push(RecordKind::FileHeader, document.file_header.encode())?;

        let mut batches: Vec<&AchBatch> = document.batches.iter().collect();
        batches.sort_by_key(|batch| batch.batch_number());
        for batch in batches {
            write_batch(&mut sink, batch)?;
        }

        sink.push(RecordKind::FileControl, document.file_control.encode())?;
        let records = sink.lines;
        sink.pad_block();
        debug!(
            "Encoded {} records in {} batches, padded to {} lines",
            records,
            document.batches.len(),
            sink.lines
        );

        Ok(sink.text)
    }
}

fn write_batch(sink: &mut LineSink, batch: &AchBatch) -> Result<(), EncodeError> {
    sink.push(RecordKind::BatchHeader, batch.header.encode())?;
    for item in &batch.entries {
        sink.push(RecordKind::EntryDetail, item.entry.encode())?;

        let mut addenda: Vec<_> = item.addenda.iter().collect();
        addenda.sort_by_key(|a| a.addenda_sequence_number);
        for record in addenda {
            sink.push(RecordKind::Addenda, record.encode())?;
        }
    }
    sink.push(RecordKind::BatchControl, batch.control.encode())?;
    debug!(
        "Encoded batch {} with {} entries",
        batch.batch_number(),
        batch.entries.len()
    );
    Ok(())
}

/// Accumulates lines and tracks the physical line number for error context.
struct LineSink {
    text: String,
    lines: usize,
}

impl LineSink {
    fn with_capacity(records: usize) -> Self {
        let blocks = records.div_ceil(BLOCKING_FACTOR).max(1);
        LineSink {
            text: String::with_capacity(blocks * BLOCKING_FACTOR * 96),
            lines: 0,
        }
    }

    fn push(
        &mut self,
        record: RecordKind,
        encoded: Result<String, RecordError>,
    ) -> Result<(), EncodeError> {
        let line = self.lines + 1;
        let encoded = encoded.map_err(|source| EncodeError::Record {
            line,
            record,
            source,
        })?;
        self.push_line(&encoded);
        Ok(())
    }

    fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push_str(LINE_ENDING);
        self.lines += 1;
    }

    fn pad_block(&mut self) {
        let filler = filler_line();
        while self.lines % BLOCKING_FACTOR != 0 {
            self.push_line(&filler);
        }
    }
}

/// Encodes `document` exactly as stored.
pub fn encode(document: &AchDocument) -> Result<String, EncodeError> {
    AchWriter::new().write(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::document::BatchEntry;
    use crate::record::{
        AddendaRecord, BatchHeader, EntryDetail, FileHeader, ServiceClass, TransactionCode,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 7, 9).unwrap()
    }

    fn batch(number: u32, entries: usize) -> AchBatch {
        let header = BatchHeader {
            service_class: ServiceClass::CreditsOnly,
            company_name: "TOAST".to_string(),
            company_discretionary_data: String::new(),
            company_identification: "0000000000".to_string(),
            standard_entry_class: "PPD".to_string(),
            company_entry_description: "PAYROLL".to_string(),
            company_descriptive_date: String::new(),
            effective_entry_date: date(),
            settlement_date: String::new(),
            originator_status_code: "1".to_string(),
            originating_dfi: "02100002".to_string(),
            batch_number: number,
        };
        let entries = (1..=entries as u64)
            .map(|seq| {
                BatchEntry::new(EntryDetail {
                    transaction_code: TransactionCode::CHECKING_CREDIT,
                    receiving_dfi: 11000001,
                    check_digit: 5,
                    account_number: format!("ACCT{}", seq),
                    amount: Amount::from_cents(100),
                    individual_id: String::new(),
                    individual_name: "EMPLOYEE".to_string(),
                    discretionary_data: String::new(),
                    addenda_record_indicator: 0,
                    trace_number: 21_000_020_000_000 + seq,
                })
            })
            .collect();
        AchBatch::new(header, entries)
    }

    fn document(batches: Vec<AchBatch>) -> AchDocument {
        let header = FileHeader::new(
            " 021000021",
            "0000000000",
            date(),
            NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
        );
        AchDocument::new(header, batches)
    }

    #[test]
    fn test_output_is_padded_to_whole_blocks() {
        let text = encode(&document(vec![batch(1, 2)])).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.len() == 94));
        assert!(lines[6..].iter().all(|l| l.chars().all(|c| c == '9')));
        assert!(lines[5].starts_with('9'));
        assert!(!lines[5].chars().all(|c| c == '9'));
    }

    #[test]
    fn test_exact_block_needs_no_filler() {
        // 2 file records + 2 batch records + 6 entries
        let text = encode(&document(vec![batch(1, 6)])).unwrap();
        assert_eq!(text.lines().count(), 10);
        assert!(text.lines().last().unwrap().starts_with("9000001000001"));
    }

    #[test]
    fn test_eleven_lines_pad_to_twenty() {
        let text = encode(&document(vec![batch(1, 7)])).unwrap();
        assert_eq!(text.lines().count(), 20);
        assert_eq!(text.lines().filter(|l| l.starts_with("99999")).count(), 9);
    }

    #[test]
    fn test_batches_written_in_batch_number_order() {
        let text = encode(&document(vec![batch(2, 1), batch(1, 1)])).unwrap();
        let headers: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with('5'))
            .map(|l| &l[87..])
            .collect();
        assert_eq!(headers, vec!["0000001", "0000002"]);
    }

    #[test]
    fn test_addenda_written_in_sequence_order() {
        let mut b = batch(1, 1);
        let entry = b.entries[0].entry.clone();
        b.entries[0] = BatchEntry::with_addenda(
            entry.clone(),
            vec![
                AddendaRecord::for_entry(&entry, 2, "SECOND"),
                AddendaRecord::for_entry(&entry, 1, "FIRST"),
            ],
        );
        b.recompute_control();
        let text = encode(&document(vec![b])).unwrap();
        let addenda: Vec<&str> = text.lines().filter(|l| l.starts_with('7')).collect();
        assert!(addenda[0].starts_with("705FIRST"));
        assert!(addenda[1].starts_with("705SECOND"));
    }

    #[test]
    fn test_controls_written_as_stored_unless_requested() {
        let mut doc = document(vec![batch(1, 1)]);
        doc.batches[0].control.entry_hash = 42;

        let stored = encode(&doc).unwrap();
        let control = stored.lines().find(|l| l.starts_with('8')).unwrap();
        assert_eq!(&control[10..20], "0000000042");

        let populated = AchWriter::with_options(WriteOptions {
            populate_controls: true,
        })
        .write(&doc)
        .unwrap();
        let control = populated.lines().find(|l| l.starts_with('8')).unwrap();
        assert_eq!(&control[10..20], "0011000001");
    }

    #[test]
    fn test_field_error_aborts_with_line_and_field() {
        let mut doc = document(vec![batch(1, 2)]);
        doc.batches[0].entries[1].entry.amount = Amount::from_cents(-5);
        let err = encode(&doc).unwrap_err();
        match &err {
            EncodeError::Record { line, record, .. } => {
                assert_eq!(*line, 4);
                assert_eq!(*record, RecordKind::EntryDetail);
            }
        }
        assert_eq!(err.field(), Some("amount"));
    }
}
