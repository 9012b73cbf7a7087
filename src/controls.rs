//! Control-total engine.
//!
//! Pure functions over a document: they populate control records on the
//! way out and reconcile stored control records on the way in. Nothing here
//! mutates its input; mismatches are reported, never corrected.

use crate::amount::Amount;
use crate::document::{AchBatch, AchDocument};
use crate::error::{ControlMismatch, ControlScope};
use crate::record::{BatchControl, BatchHeader, EntryDetail, FileControl};
use crate::schema::BLOCKING_FACTOR;
use std::fmt::Display;

/// Entry hashes keep only their low-order 10 digits.
pub const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;

/// Sum of `values` modulo 10^10, wrapping rather than saturating.
pub fn entry_hash<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values
        .into_iter()
        .fold(0, |acc, value| (acc + value % ENTRY_HASH_MODULUS) % ENTRY_HASH_MODULUS)
}

/// Entry details plus addenda records in the batch.
pub fn batch_entry_count(batch: &AchBatch) -> u32 {
    saturating_u32(batch.entries.iter().map(|e| e.line_count()).sum())
}

/// Sum of receiving DFI identifiers modulo 10^10.
pub fn batch_entry_hash(batch: &AchBatch) -> u64 {
    entry_hash(batch.entries.iter().map(|e| u64::from(e.entry.receiving_dfi)))
}

pub fn batch_total_debits(batch: &AchBatch) -> Amount {
    batch_total(batch, |entry| entry.transaction_code.is_debit())
}

pub fn batch_total_credits(batch: &AchBatch) -> Amount {
    batch_total(batch, |entry| entry.transaction_code.is_credit())
}

fn batch_total(batch: &AchBatch, include: impl Fn(&EntryDetail) -> bool) -> Amount {
    batch
        .entries
        .iter()
        .map(|e| &e.entry)
        .filter(|entry| include(entry))
        .map(|entry| entry.amount)
        .sum()
}

/// Blocks of ten lines needed to hold `total_lines`.
pub fn file_block_count(total_lines: usize) -> u32 {
    saturating_u32(total_lines.div_ceil(BLOCKING_FACTOR))
}

/// Sum of the batches' computed entry hashes modulo 10^10.
pub fn file_entry_hash(document: &AchDocument) -> u64 {
    entry_hash(document.batches.iter().map(batch_entry_hash))
}

/// Sum of every batch's entry and addenda count.
pub fn file_entry_count(document: &AchDocument) -> u32 {
    document
        .batches
        .iter()
        .map(batch_entry_count)
        .fold(0u32, u32::saturating_add)
}

/// Batch control with every derivable value computed from `batch`.
///
/// The message authentication code is left blank.
pub fn batch_control(batch: &AchBatch) -> BatchControl {
    BatchControl {
        entry_addenda_count: batch_entry_count(batch),
        entry_hash: batch_entry_hash(batch),
        total_debit: batch_total_debits(batch),
        total_credit: batch_total_credits(batch),
        ..empty_batch_control(&batch.header)
    }
}

/// File control computed from `document`'s content.
pub fn file_control(document: &AchDocument) -> FileControl {
    FileControl {
        batch_count: saturating_u32(document.batches.len()),
        block_count: file_block_count(document.line_count()),
        entry_addenda_count: file_entry_count(document),
        entry_hash: file_entry_hash(document),
        total_debit: document.batches.iter().map(batch_total_debits).sum(),
        total_credit: document.batches.iter().map(batch_total_credits).sum(),
    }
}

pub(crate) fn empty_batch_control(header: &BatchHeader) -> BatchControl {
    BatchControl {
        service_class: header.service_class,
        entry_addenda_count: 0,
        entry_hash: 0,
        total_debit: Amount::ZERO,
        total_credit: Amount::ZERO,
        company_identification: header.company_identification.clone(),
        message_authentication_code: String::new(),
        originating_dfi: header.originating_dfi.clone(),
        batch_number: header.batch_number,
    }
}

pub(crate) fn empty_file_control() -> FileControl {
    FileControl {
        batch_count: 0,
        block_count: 0,
        entry_addenda_count: 0,
        entry_hash: 0,
        total_debit: Amount::ZERO,
        total_credit: Amount::ZERO,
    }
}

/// Recomputes every control value and compares it with the stored one.
///
/// Batches are checked in order, then the file control; the first
/// disagreement is returned.
pub fn validate_controls(document: &AchDocument) -> Result<(), ControlMismatch> {
    for batch in &document.batches {
        validate_batch(batch)?;
    }

    let stored = &document.file_control;
    let computed = file_control(document);
    let scope = ControlScope::File;
    check(scope, "batch count", computed.batch_count, stored.batch_count)?;
    check(scope, "block count", computed.block_count, stored.block_count)?;
    check(
        scope,
        "entry/addenda count",
        computed.entry_addenda_count,
        stored.entry_addenda_count,
    )?;
    check(scope, "entry hash", computed.entry_hash, stored.entry_hash)?;
    check(
        scope,
        "total debit entry dollar amount",
        computed.total_debit,
        stored.total_debit,
    )?;
    check(
        scope,
        "total credit entry dollar amount",
        computed.total_credit,
        stored.total_credit,
    )
}

/// Reconciles one batch's control record with its header and entries.
pub fn validate_batch(batch: &AchBatch) -> Result<(), ControlMismatch> {
    let stored = &batch.control;
    let computed = batch_control(batch);
    let scope = ControlScope::Batch(batch.header.batch_number);
    check(
        scope,
        "service class code",
        computed.service_class.code(),
        stored.service_class.code(),
    )?;
    check(
        scope,
        "entry/addenda count",
        computed.entry_addenda_count,
        stored.entry_addenda_count,
    )?;
    check(scope, "entry hash", computed.entry_hash, stored.entry_hash)?;
    check(
        scope,
        "total debit entry dollar amount",
        computed.total_debit,
        stored.total_debit,
    )?;
    check(
        scope,
        "total credit entry dollar amount",
        computed.total_credit,
        stored.total_credit,
    )?;
    check(
        scope,
        "company identification",
        computed.company_identification,
        stored.company_identification.clone(),
    )?;
    check(
        scope,
        "originating dfi identification",
        computed.originating_dfi,
        stored.originating_dfi.clone(),
    )?;
    check(
        scope,
        "batch number",
        computed.batch_number,
        stored.batch_number,
    )
}

fn check<T: PartialEq + Display>(
    scope: ControlScope,
    field: &'static str,
    expected: T,
    actual: T,
) -> Result<(), ControlMismatch> {
    if expected == actual {
        return Ok(());
    }
    Err(ControlMismatch {
        scope,
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
