//! In-memory ACH document: a file header, its batches, and a file control.
//!
//! A document exclusively owns its batches and each batch owns its records.
//! Addenda are linked to their entry by value, through the entry-detail
//! sequence number derived from the entry's trace number.

use crate::controls;
use crate::record::{
    AddendaRecord, BatchControl, BatchHeader, EntryDetail, FileControl, FileHeader,
};

/// One entry detail and the addenda records that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub entry: EntryDetail,
    pub addenda: Vec<AddendaRecord>,
}

impl BatchEntry {
    /// Entry without addenda; the addenda indicator is set to 0.
    pub fn new(entry: EntryDetail) -> Self {
        Self::with_addenda(entry, Vec::new())
    }

    /// Entry followed by `addenda`; the addenda indicator is set to match.
    pub fn with_addenda(mut entry: EntryDetail, addenda: Vec<AddendaRecord>) -> Self {
        entry.addenda_record_indicator = u8::from(!addenda.is_empty());
        BatchEntry { entry, addenda }
    }

    /// Lines this entry occupies in the file.
    pub fn line_count(&self) -> usize {
        1 + self.addenda.len()
    }
}

/// A batch bounded by its header and control records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchBatch {
    pub header: BatchHeader,
    pub entries: Vec<BatchEntry>,
    pub control: BatchControl,
}

impl AchBatch {
    /// Builds a batch whose control record is computed from its entries.
    pub fn new(header: BatchHeader, entries: Vec<BatchEntry>) -> Self {
        let mut batch = AchBatch {
            control: controls::empty_batch_control(&header),
            header,
            entries,
        };
        batch.recompute_control();
        batch
    }

    pub fn batch_number(&self) -> u32 {
        self.header.batch_number
    }

    /// Replaces the control totals with values computed from the entries.
    ///
    /// The message authentication code is kept; it cannot be derived.
    pub fn recompute_control(&mut self) {
        let mac = std::mem::take(&mut self.control.message_authentication_code);
        self.control = controls::batch_control(self);
        self.control.message_authentication_code = mac;
    }

    /// Lines this batch occupies, including header and control.
    pub fn line_count(&self) -> usize {
        2 + self.entries.iter().map(BatchEntry::line_count).sum::<usize>()
    }
}

/// A complete ACH file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchDocument {
    pub file_header: FileHeader,
    pub batches: Vec<AchBatch>,
    pub file_control: FileControl,
}

impl AchDocument {
    /// Builds a document whose file control is computed from `batches`.
    ///
    /// Batch controls are taken as given; use [`AchDocument::recompute_controls`]
    /// to refresh them too.
    pub fn new(file_header: FileHeader, batches: Vec<AchBatch>) -> Self {
        let mut document = AchDocument {
            file_header,
            batches,
            file_control: controls::empty_file_control(),
        };
        document.file_control = controls::file_control(&document);
        document
    }

    /// Recomputes every batch control, then the file control.
    pub fn recompute_controls(&mut self) {
        for batch in &mut self.batches {
            batch.recompute_control();
        }
        self.file_control = controls::file_control(self);
    }

    /// Consuming form of [`AchDocument::recompute_controls`].
    pub fn with_computed_controls(mut self) -> Self {
        self.recompute_controls();
        self
    }

    /// Record lines before block padding.
    pub fn line_count(&self) -> usize {
        2 + self.batches.iter().map(AchBatch::line_count).sum::<usize>()
    }

    /// All entry details in file order.
    pub fn entries(&self) -> impl Iterator<Item = &EntryDetail> {
        self.batches
            .iter()
            .flat_map(|batch| batch.entries.iter().map(|e| &e.entry))
    }
}
