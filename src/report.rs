//! CSV listing of the entries in a decoded document.

use crate::amount::Amount;
use crate::document::AchDocument;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 9] = [
    "batch",
    "trace_number",
    "transaction_code",
    "direction",
    "routing_number",
    "account_number",
    "amount",
    "name",
    "addenda",
];

#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    batch: u32,
    trace_number: String,
    transaction_code: u8,
    direction: &'static str,
    routing_number: String,
    account_number: &'a str,
    amount: Amount,
    name: &'a str,
    addenda: usize,
}

/// Writes one CSV row per entry detail, in file order.
///
/// Amounts are formatted with exactly 2 decimal places.
pub fn write_entries<W: Write>(document: &AchDocument, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(HEADER)?;

    for batch in &document.batches {
        for item in &batch.entries {
            let entry = &item.entry;
            csv_writer.serialize(EntryRow {
                batch: batch.batch_number(),
                trace_number: format!("{:015}", entry.trace_number),
                transaction_code: entry.transaction_code.code(),
                direction: if entry.transaction_code.is_debit() {
                    "debit"
                } else {
                    "credit"
                },
                routing_number: entry.routing_number(),
                account_number: &entry.account_number,
                amount: entry.amount,
                name: &entry.individual_name,
                addenda: item.addenda.len(),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
