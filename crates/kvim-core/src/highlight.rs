use crossbeam_channel::{Receiver, Sender, unbounded};
use kvim_document::{Document, DocumentId};
use std::collections::HashMap;
use tracing::debug;

/// Ask for a document to be rescanned as of `revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRequest {
    pub document: DocumentId,
    pub revision: u64,
}

/// Outcome of draining the queue once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Documents whose spans were recomputed.
    pub scanned: usize,
    /// Requests dropped because a newer one covered the same document, the
    /// document was closed, or its spans were already current.
    pub superseded: usize,
}

/// Pending keyword rescans, drained on the thread that owns the documents.
///
/// Requests for the same document coalesce to the newest one, and that one is
/// only honored while it still names the document's current revision.
#[derive(Debug, Clone)]
pub struct HighlightQueue {
    sender: Sender<HighlightRequest>,
    receiver: Receiver<HighlightRequest>,
}

impl Default for HighlightQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Handle for enqueueing from an event loop.
    pub fn sender(&self) -> Sender<HighlightRequest> {
        self.sender.clone()
    }

    pub fn request(&self, document: &Document) {
        if !document.language().has_keywords() {
            return;
        }
        // The queue owns a receiver, so the channel is never disconnected.
        let _ = self.sender.send(HighlightRequest {
            document: document.id(),
            revision: document.revision(),
        });
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drain every pending request and rescan the affected documents.
    pub fn pump(&self, documents: &mut [Document]) -> PumpReport {
        let mut report = PumpReport::default();
        let mut latest: HashMap<DocumentId, u64> = HashMap::new();

        for request in self.receiver.try_iter() {
            match latest.get_mut(&request.document) {
                Some(revision) => {
                    *revision = (*revision).max(request.revision);
                    report.superseded += 1;
                }
                None => {
                    latest.insert(request.document, request.revision);
                }
            }
        }

        for document in documents.iter_mut() {
            let Some(revision) = latest.remove(&document.id()) else {
                continue;
            };
            if revision != document.revision() {
                debug!(
                    id = ?document.id(),
                    revision,
                    current = document.revision(),
                    "dropping superseded highlight request"
                );
                report.superseded += 1;
            } else if document.needs_highlight() {
                document.rehighlight();
                report.scanned += 1;
            } else {
                debug!(id = ?document.id(), revision, "highlights already current");
                report.superseded += 1;
            }
        }

        // Whatever is left belongs to documents that were closed meanwhile.
        report.superseded += latest.len();
        report
    }
}
