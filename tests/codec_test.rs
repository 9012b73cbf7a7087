//! End-to-end codec tests against the public API.
//!
//! Covers the golden single-batch file, round trips, block padding and the
//! rejections a receiving bank would apply.

use chrono::{NaiveDate, NaiveTime};
use nacha_codec::{
    decode, encode, validate_controls, AchBatch, AchDocument, AddendaRecord, Amount, BatchEntry,
    BatchHeader, ControlScope, DecodeError, EntryDetail, FileHeader, ServiceClass,
    TransactionCode,
};
use std::fs;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/data/{}", name)).unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 7, 9).unwrap()
}

fn file_header() -> FileHeader {
    FileHeader {
        priority_code: 1,
        immediate_destination: "b021000021".to_string(),
        immediate_origin: "0000000000".to_string(),
        file_creation_date: date(),
        file_creation_time: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
        file_id_modifier: "X".to_string(),
        blocking_factor: 10,
        immediate_destination_name: "JPMORGAN CHASE".to_string(),
        immediate_origin_name: "TOAST".to_string(),
        reference_code: String::new(),
    }
}

fn batch_header(number: u32, service_class: ServiceClass) -> BatchHeader {
    BatchHeader {
        service_class,
        company_name: "TOAST".to_string(),
        company_discretionary_data: "12345678".to_string(),
        company_identification: "0000000000".to_string(),
        standard_entry_class: "CCD".to_string(),
        company_entry_description: "CCD".to_string(),
        company_descriptive_date: "JAN 03".to_string(),
        effective_entry_date: date(),
        settlement_date: String::new(),
        originator_status_code: "1".to_string(),
        originating_dfi: "02100002".to_string(),
        batch_number: number,
    }
}

fn entry(code: TransactionCode, rdfi: u32, cents: i64, seq: u64) -> EntryDetail {
    EntryDetail {
        transaction_code: code,
        receiving_dfi: rdfi,
        check_digit: 1,
        account_number: "DFIACCOUNTNUMBER".to_string(),
        amount: Amount::from_cents(cents),
        individual_id: "INDIVIDNUMBER".to_string(),
        individual_name: "SIMISANDWICHSHOP".to_string(),
        discretionary_data: String::new(),
        addenda_record_indicator: 0,
        trace_number: 21_000_020_000_000 + seq,
    }
}

/// One batch, one debit entry of $123.45, one addenda.
fn single_batch_document() -> AchDocument {
    let debit = entry(TransactionCode::CHECKING_DEBIT, 12345678, 12345, 1);
    let addenda = AddendaRecord::for_entry(&debit, 1, "Payment related info.");
    let batch = AchBatch::new(
        batch_header(1, ServiceClass::CreditsOnly),
        vec![BatchEntry::with_addenda(debit, vec![addenda])],
    );
    AchDocument::new(file_header(), vec![batch])
}

fn multi_batch_document() -> AchDocument {
    let first = AchBatch::new(
        batch_header(1, ServiceClass::Mixed),
        (1..=4)
            .map(|seq| {
                let code = if seq % 2 == 0 {
                    TransactionCode::SAVINGS_CREDIT
                } else {
                    TransactionCode::CHECKING_DEBIT
                };
                let e = entry(code, 11000000 + seq as u32, 1000 * seq as i64, seq);
                let addenda = (1..=seq as u16)
                    .map(|n| AddendaRecord::for_entry(&e, n, format!("REMITTANCE {}", n)))
                    .collect();
                BatchEntry::with_addenda(e, addenda)
            })
            .collect(),
    );
    let second = AchBatch::new(
        batch_header(2, ServiceClass::CreditsOnly),
        vec![BatchEntry::new(entry(
            TransactionCode::CHECKING_CREDIT_PRENOTE,
            87654321,
            0,
            1,
        ))],
    );
    AchDocument::new(file_header(), vec![first, second])
}

// ==================== GOLDEN FILE ====================

#[test]
fn test_single_batch_matches_golden_file() {
    let text = encode(&single_batch_document()).unwrap();
    let expected = fixture("single_batch.ach");
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        expected.lines().collect::<Vec<_>>()
    );
}

#[test]
fn test_single_batch_control_values() {
    let doc = single_batch_document();
    let control = &doc.batches[0].control;
    assert_eq!(control.entry_addenda_count, 2);
    assert_eq!(control.entry_hash, 12345678);
    assert_eq!(control.total_debit.to_string(), "123.45");
    assert_eq!(control.total_credit, Amount::ZERO);

    assert_eq!(doc.file_control.batch_count, 1);
    assert_eq!(doc.file_control.block_count, 1);
    assert_eq!(doc.file_control.entry_addenda_count, 2);
    assert_eq!(doc.file_control.entry_hash, 12345678);
}

#[test]
fn test_golden_file_decodes_to_document() {
    let doc = decode(&fixture("single_batch.ach")).unwrap();
    assert_eq!(doc, single_batch_document());
}

// ==================== ROUND TRIP ====================

#[test]
fn test_round_trip_multi_batch() {
    let doc = multi_batch_document();
    let text = encode(&doc).unwrap();
    assert_eq!(decode(&text).unwrap(), doc);
}

#[test]
fn test_every_line_is_94_characters() {
    let text = encode(&multi_batch_document()).unwrap();
    for (i, line) in text.lines().enumerate() {
        assert_eq!(line.len(), 94, "line {}", i + 1);
    }
}

#[test]
fn test_block_padding() {
    let doc = multi_batch_document();
    // 2 file records + 2 * 2 batch records + 5 entries + 10 addenda
    let real = doc.line_count();
    assert_eq!(real, 21);

    let text = encode(&doc).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 30);
    assert!(lines[real..]
        .iter()
        .all(|l| l.len() == 94 && l.chars().all(|c| c == '9')));
    assert_eq!(doc.file_control.block_count, 3);
}

#[test]
fn test_validation_is_idempotent_on_computed_documents() {
    let doc = multi_batch_document().with_computed_controls();
    assert_eq!(validate_controls(&doc), Ok(()));
    assert_eq!(validate_controls(&doc), Ok(()));
}

// ==================== REJECTIONS ====================

#[test]
fn test_rejects_wrong_file_entry_count() {
    let err = decode(&fixture("bad_control.ach")).unwrap_err();
    match err {
        DecodeError::Control(mismatch) => {
            assert_eq!(mismatch.scope, ControlScope::File);
            assert_eq!(mismatch.field, "entry/addenda count");
            assert_eq!(mismatch.expected, "2");
            assert_eq!(mismatch.actual, "1");
        }
        other => panic!("expected control mismatch, got {:?}", other),
    }
}

#[test]
fn test_rejects_93_and_95_character_lines() {
    let text = fixture("single_batch.ach");

    let short: Vec<String> = text
        .lines()
        .enumerate()
        .map(|(i, l)| if i == 2 { l[..93].to_string() } else { l.to_string() })
        .collect();
    assert_eq!(
        decode(&short.join("\n")).unwrap_err(),
        DecodeError::MalformedLine {
            line: 3,
            length: 93
        }
    );

    let long: Vec<String> = text
        .lines()
        .enumerate()
        .map(|(i, l)| if i == 4 { format!("{} ", l) } else { l.to_string() })
        .collect();
    assert_eq!(
        decode(&long.join("\n")).unwrap_err(),
        DecodeError::MalformedLine {
            line: 5,
            length: 95
        }
    );
}

#[test]
fn test_rejects_non_numeric_amount() {
    let text = fixture("single_batch.ach").replacen("0000012345", "00000123X5", 1);
    match decode(&text).unwrap_err() {
        DecodeError::Field { line, field, .. } => {
            assert_eq!(line, 3);
            assert_eq!(field, "amount");
        }
        other => panic!("expected field error, got {:?}", other),
    }
}

#[test]
fn test_rejects_tampered_batch_total() {
    let mut doc = single_batch_document();
    doc.batches[0].control.total_debit = Amount::from_cents(12312);
    let text = encode(&doc).unwrap();
    match decode(&text).unwrap_err() {
        DecodeError::Control(mismatch) => {
            assert_eq!(mismatch.scope, ControlScope::Batch(1));
            assert_eq!(mismatch.field, "total debit entry dollar amount");
            assert_eq!(mismatch.expected, "123.45");
            assert_eq!(mismatch.actual, "123.12");
        }
        other => panic!("expected control mismatch, got {:?}", other),
    }
}

#[test]
fn test_rejects_missing_filler() {
    let text = fixture("single_batch.ach");
    let unpadded: Vec<&str> = text.lines().take(6).collect();
    let err = decode(&unpadded.join("\n")).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { .. }));
}

// ==================== ENCODE FAILURES ====================

#[test]
fn test_encode_rejects_oversized_name() {
    let mut doc = single_batch_document();
    doc.batches[0].header.company_name = "TOAST RESTAURANT GROUP".to_string();
    let err = encode(&doc).unwrap_err();
    assert_eq!(err.field(), Some("company name"));
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_encode_rejects_amount_wider_than_slot() {
    let mut doc = single_batch_document();
    doc.batches[0].entries[0].entry.amount = Amount::from_cents(100_000_000_000);
    let err = encode(&doc).unwrap_err();
    assert_eq!(err.field(), Some("amount"));
}

#[test]
fn test_encode_rejects_trailing_space_that_would_not_round_trip() {
    let mut doc = single_batch_document();
    doc.batches[0].header.company_name = "TOAST ".to_string();
    let err = encode(&doc).unwrap_err();
    assert_eq!(err.field(), Some("company name"));
}
