//! Parses NACHA text into an [`AchDocument`].
//!
//! Lines are classified by their leading record-type digit and fed through a
//! small state machine that enforces the file layout: one file header, one
//! or more batches bounded by type 5 and type 8 records, one file control,
//! then all-nines filler up to a whole block. The first violation aborts the
//! parse with its line number.

use crate::controls::validate_controls;
use crate::document::{AchBatch, AchDocument, BatchEntry};
use crate::error::{ControlMismatch, DecodeError};
use crate::record::{
    AddendaRecord, BatchControl, BatchHeader, EntryDetail, FileControl, FileHeader, Record,
};
use crate::schema::{RecordKind, BLOCKING_FACTOR, FILLER_CHAR, RECORD_LENGTH};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Reconcile control records after parsing.
    pub validate_controls: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            validate_controls: true,
        }
    }
}

/// Text-to-document decoder.
#[derive(Debug, Clone, Default)]
pub struct AchReader {
    options: ReadOptions,
}

impl AchReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        AchReader { options }
    }

    /// Parses `text`, then reconciles control totals if enabled.
    pub fn read(&self, text: &str) -> Result<AchDocument, DecodeError> {
        let document = parse(text)?;
        if self.options.validate_controls {
            validate_controls(&document)?;
        }
        Ok(document)
    }

    /// Parses `text` and returns the control reconciliation result alongside
    /// the document instead of failing on it.
    pub fn read_with_controls(
        &self,
        text: &str,
    ) -> Result<(AchDocument, Result<(), ControlMismatch>), DecodeError> {
        let document = parse(text)?;
        let controls = validate_controls(&document);
        Ok((document, controls))
    }
}

/// Decodes `text` and reconciles its control totals.
pub fn decode(text: &str) -> Result<AchDocument, DecodeError> {
    AchReader::new().read(text)
}

/// A batch whose header has been read but whose control has not.
struct OpenBatch {
    header: BatchHeader,
    entries: Vec<BatchEntry>,
    /// Line number of the most recent entry detail
    last_entry_line: usize,
}

impl OpenBatch {
    /// Checks the most recent entry promised addenda only if it got some.
    fn check_last_entry(&self) -> Result<(), DecodeError> {
        match self.entries.last() {
            Some(item) if item.entry.addenda_record_indicator == 1 && item.addenda.is_empty() => {
                Err(DecodeError::structural(
                    self.last_entry_line,
                    "entry detail indicates addenda but none follow",
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
struct Parser {
    file_header: Option<FileHeader>,
    batches: Vec<AchBatch>,
    open: Option<OpenBatch>,
    file_control: Option<FileControl>,
    filler_lines: usize,
}

fn parse(text: &str) -> Result<AchDocument, DecodeError> {
    let mut parser = Parser::default();
    let mut total_lines = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        total_lines = line;
        parser.line(line, raw)?;
    }

    parser.finish(total_lines)
}

impl Parser {
    fn line(&mut self, line: usize, raw: &str) -> Result<(), DecodeError> {
        let length = raw.chars().count();
        if length != RECORD_LENGTH {
            return Err(DecodeError::MalformedLine { line, length });
        }
        if !raw.is_ascii() {
            return Err(DecodeError::NonAscii { line });
        }

        if self.file_control.is_some() {
            if raw.chars().all(|c| c == FILLER_CHAR) {
                if (line - 1) % BLOCKING_FACTOR == 0 {
                    return Err(DecodeError::structural(
                        line,
                        "filler extends past the block holding the file control record",
                    ));
                }
                self.filler_lines += 1;
                return Ok(());
            }
            return Err(DecodeError::structural(
                line,
                "only all-nines filler may follow the file control record",
            ));
        }

        let code = raw.chars().next().unwrap_or(' ');
        let kind = RecordKind::from_type_code(code).ok_or(DecodeError::Classification {
            line,
            found: code,
            expected: None,
        })?;
        if kind != RecordKind::FileHeader && self.file_header.is_none() {
            return Err(DecodeError::structural(
                line,
                "file header must be the first record",
            ));
        }

        let record = Record::decode(raw).map_err(|e| DecodeError::from_record(line, kind, e))?;
        match record {
            Record::FileHeader(header) => self.file_header(line, header),
            Record::BatchHeader(header) => self.batch_header(line, header),
            Record::EntryDetail(entry) => self.entry_detail(line, entry),
            Record::Addenda(addenda) => self.addenda(line, addenda),
            Record::BatchControl(control) => self.batch_control(line, control),
            Record::FileControl(control) => self.file_control(line, control),
        }
    }

    fn file_header(&mut self, line: usize, header: FileHeader) -> Result<(), DecodeError> {
        if self.file_header.is_some() {
            return Err(DecodeError::structural(line, "duplicate file header"));
        }
        self.file_header = Some(header);
        Ok(())
    }

    fn batch_header(&mut self, line: usize, header: BatchHeader) -> Result<(), DecodeError> {
        if let Some(open) = &self.open {
            return Err(DecodeError::structural(
                line,
                format!(
                    "batch {} is not closed before the next batch header",
                    open.header.batch_number
                ),
            ));
        }
        if let Some(previous) = self.batches.last() {
            if header.batch_number <= previous.batch_number() {
                return Err(DecodeError::structural(
                    line,
                    format!(
                        "batch number {} does not follow batch {}",
                        header.batch_number,
                        previous.batch_number()
                    ),
                ));
            }
        }
        self.open = Some(OpenBatch {
            header,
            entries: Vec::new(),
            last_entry_line: line,
        });
        Ok(())
    }

    fn entry_detail(&mut self, line: usize, entry: EntryDetail) -> Result<(), DecodeError> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| DecodeError::structural(line, "entry detail outside of a batch"))?;
        open.check_last_entry()?;
        if let Some(previous) = open.entries.last() {
            if entry.trace_number <= previous.entry.trace_number {
                return Err(DecodeError::structural(
                    line,
                    format!(
                        "trace number {} does not follow {}",
                        entry.trace_number, previous.entry.trace_number
                    ),
                ));
            }
        }
        open.entries.push(BatchEntry {
            entry,
            addenda: Vec::new(),
        });
        open.last_entry_line = line;
        Ok(())
    }

    fn addenda(&mut self, line: usize, addenda: AddendaRecord) -> Result<(), DecodeError> {
        let item = self
            .open
            .as_mut()
            .and_then(|open| open.entries.last_mut())
            .ok_or_else(|| {
                DecodeError::structural(line, "addenda record without a preceding entry detail")
            })?;

        if item.entry.addenda_record_indicator != 1 {
            return Err(DecodeError::structural(
                line,
                "addenda record follows an entry whose addenda indicator is not 1",
            ));
        }
        if addenda.entry_detail_sequence_number != item.entry.sequence_number() {
            return Err(DecodeError::structural(
                line,
                format!(
                    "addenda entry detail sequence number {} does not match trace number {}",
                    addenda.entry_detail_sequence_number, item.entry.trace_number
                ),
            ));
        }
        let expected = item.addenda.len() + 1;
        if usize::from(addenda.addenda_sequence_number) != expected {
            return Err(DecodeError::structural(
                line,
                format!(
                    "addenda sequence number {} where {} was expected",
                    addenda.addenda_sequence_number, expected
                ),
            ));
        }
        item.addenda.push(addenda);
        Ok(())
    }

    fn batch_control(&mut self, line: usize, control: BatchControl) -> Result<(), DecodeError> {
        let open = self
            .open
            .take()
            .ok_or_else(|| DecodeError::structural(line, "batch control without an open batch"))?;
        open.check_last_entry()?;
        if control.batch_number != open.header.batch_number {
            return Err(DecodeError::structural(
                line,
                format!(
                    "batch control number {} does not close batch {}",
                    control.batch_number, open.header.batch_number
                ),
            ));
        }
        debug!(
            "Decoded batch {} with {} entries",
            open.header.batch_number,
            open.entries.len()
        );
        self.batches.push(AchBatch {
            header: open.header,
            entries: open.entries,
            control,
        });
        Ok(())
    }

    fn file_control(&mut self, line: usize, control: FileControl) -> Result<(), DecodeError> {
        if let Some(open) = &self.open {
            return Err(DecodeError::structural(
                line,
                format!(
                    "batch {} is not closed by a batch control record",
                    open.header.batch_number
                ),
            ));
        }
        self.file_control = Some(control);
        Ok(())
    }

    fn finish(self, total_lines: usize) -> Result<AchDocument, DecodeError> {
        let end = total_lines + 1;
        let file_header = self
            .file_header
            .ok_or_else(|| DecodeError::structural(end, "file header missing"))?;
        if let Some(open) = self.open {
            return Err(DecodeError::structural(
                end,
                format!(
                    "batch {} is not closed by a batch control record",
                    open.header.batch_number
                ),
            ));
        }
        let file_control = self
            .file_control
            .ok_or_else(|| DecodeError::structural(end, "file control missing"))?;
        if self.batches.is_empty() {
            return Err(DecodeError::structural(end, "file contains no batches"));
        }
        if total_lines % BLOCKING_FACTOR != 0 {
            return Err(DecodeError::structural(
                end,
                format!(
                    "file has {} lines, not a multiple of {}",
                    total_lines, BLOCKING_FACTOR
                ),
            ));
        }

        debug!(
            "Decoded {} batches from {} lines ({} filler)",
            self.batches.len(),
            total_lines,
            self.filler_lines
        );
        Ok(AchDocument {
            file_header,
            batches: self.batches,
            file_control,
        })
    }
}
