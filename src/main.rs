//! NACHA Codec CLI
//!
//! Checks, lists or repairs an ACH file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- check payments.ach
//! cargo run -- report payments.ach > entries.csv
//! cargo run -- fill draft.ach > payments.ach
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use log::{info, warn};
use nacha_codec::{
    controls, report, AchDocument, AchReader, AchWriter, NachaError, ReadOptions, Result,
    WriteOptions,
};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(NachaError::MissingArgument);
    }

    let command = args[1].as_str();
    let input_path = &args[2];

    match command {
        "check" => check(input_path),
        "report" => report_entries(input_path),
        "fill" => fill(input_path),
        other => Err(NachaError::UnknownCommand(other.to_string())),
    }
}

fn read(path: &str, validate_controls: bool) -> Result<AchDocument> {
    let text = fs::read_to_string(path)?;
    let reader = AchReader::with_options(ReadOptions { validate_controls });
    let document = reader.read(&text)?;
    info!(
        "Read {} batches from {}",
        document.batches.len(),
        path
    );
    Ok(document)
}

fn check(path: &str) -> Result<()> {
    let document = read(path, true)?;
    let control = &document.file_control;
    println!(
        "OK: {} batches, {} entry/addenda records, debits {}, credits {}",
        control.batch_count, control.entry_addenda_count, control.total_debit, control.total_credit
    );
    Ok(())
}

fn report_entries(path: &str) -> Result<()> {
    let document = read(path, true)?;
    let stdout = io::stdout();
    let handle = stdout.lock();
    report::write_entries(&document, handle)
}

fn fill(path: &str) -> Result<()> {
    let document = read(path, false)?;

    for batch in &document.batches {
        if let Err(mismatch) = controls::validate_batch(batch) {
            warn!("Correcting {}", mismatch);
        }
    }
    let corrected = document.clone().with_computed_controls();
    if let Err(mismatch) = controls::validate_controls(&AchDocument {
        file_control: document.file_control.clone(),
        ..corrected
    }) {
        warn!("Correcting {}", mismatch);
    }

    let writer = AchWriter::with_options(WriteOptions {
        populate_controls: true,
    });
    let text = writer.write(&document)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes())?;
    handle.flush()?;
    Ok(())
}
