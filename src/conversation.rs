//! Prompt/response loop for the selected agency.
//!
//! [`ConversationEngine`] owns the transcript, the agency selection and the
//! pending document. All methods take `&self`: state sits behind a mutex that
//! is never held across an `.await`, and the single run-agency slot is an
//! atomic flag so overlapping callers are turned away instead of queued.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use agency_api::{Agency, DocumentUpload, RunAgencyRequest};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DeskError;
use crate::gateway::PipelineGateway;
use crate::normalize::{AgencyResult, REQUEST_FAILED};
use crate::transcript::{Transcript, TranscriptEntry};

pub const FILE_INGESTED: &str = "File ingested successfully!";
pub const UPLOAD_FAILED: &str = "Upload failed";

/// Why a prompt was dropped without touching the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyPrompt,
    NoAgencySelected,
    /// Another run is still waiting on the pipeline.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The assistant entry appended for this prompt.
    Answered(TranscriptEntry),
    Ignored(IgnoreReason),
    /// The agency changed while the request was in flight; the reply was
    /// dropped together with the old transcript.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Unchanged,
    Switched { previous: Option<Agency> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    NoDocument,
    Ingested { file_name: String },
    Failed { file_name: String },
}

impl IngestOutcome {
    /// Acknowledgment shown to the user, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::NoDocument => None,
            Self::Ingested { .. } => Some(FILE_INGESTED),
            Self::Failed { .. } => Some(UPLOAD_FAILED),
        }
    }
}

#[derive(Debug)]
struct PendingDocument {
    seq: u64,
    upload: DocumentUpload,
}

#[derive(Debug)]
struct ConversationState {
    agency: Option<Agency>,
    conversation_id: Uuid,
    transcript: Transcript,
    pending: Option<PendingDocument>,
    next_document_seq: u64,
}

impl ConversationState {
    fn new(agency: Option<Agency>) -> Self {
        Self {
            agency,
            conversation_id: Uuid::new_v4(),
            transcript: Transcript::new(),
            pending: None,
            next_document_seq: 0,
        }
    }

    fn start_over(&mut self, agency: Option<Agency>) {
        self.agency = agency;
        self.conversation_id = Uuid::new_v4();
        self.transcript = Transcript::new();
        self.pending = None;
    }
}

pub struct ConversationEngine {
    pipeline: Arc<dyn PipelineGateway>,
    state: Mutex<ConversationState>,
    in_flight: AtomicBool,
}

impl ConversationEngine {
    /// An engine with no agency selected. Prompts are ignored until
    /// [`select_agency`](Self::select_agency) is called.
    pub fn new(pipeline: Arc<dyn PipelineGateway>) -> Self {
        Self {
            pipeline,
            state: Mutex::new(ConversationState::new(None)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_agency(pipeline: Arc<dyn PipelineGateway>, agency: Agency) -> Self {
        Self {
            pipeline,
            state: Mutex::new(ConversationState::new(Some(agency))),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn selected_agency(&self) -> Option<Agency> {
        self.state().agency
    }

    pub fn conversation_id(&self) -> Uuid {
        self.state().conversation_id
    }

    /// Snapshot of the current transcript.
    pub fn transcript(&self) -> Transcript {
        self.state().transcript.clone()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// File name of the document waiting for ingestion.
    pub fn pending_document(&self) -> Option<String> {
        self.state()
            .pending
            .as_ref()
            .map(|pending| pending.upload.file_name.clone())
    }

    /// Select `agency`. A different agency starts a fresh conversation.
    pub fn select_agency(&self, agency: Agency) -> Selection {
        let mut state = self.state();
        if state.agency == Some(agency) {
            return Selection::Unchanged;
        }

        let previous = state.agency;
        state.start_over(Some(agency));
        debug!(
            agency = %agency,
            conversation_id = %state.conversation_id,
            "agency selected"
        );
        Selection::Switched { previous }
    }

    /// Drop the selection, transcript and pending document.
    pub fn reset(&self) {
        self.state().start_over(None);
    }

    pub fn attach_document(&self, upload: DocumentUpload) {
        let mut state = self.state();
        let seq = state.next_document_seq;
        state.next_document_seq += 1;
        state.pending = Some(PendingDocument { seq, upload });
    }

    /// Send `prompt` to the selected agency and append both sides of the
    /// exchange to the transcript.
    pub async fn run_agency(&self, prompt: &str) -> RunOutcome {
        if prompt.trim().is_empty() {
            return RunOutcome::Ignored(IgnoreReason::EmptyPrompt);
        }
        let Some(_slot) = RunSlot::claim(&self.in_flight) else {
            return RunOutcome::Ignored(IgnoreReason::Busy);
        };

        let (agency, conversation_id) = {
            let mut state = self.state();
            let Some(agency) = state.agency else {
                return RunOutcome::Ignored(IgnoreReason::NoAgencySelected);
            };
            state.transcript.push(TranscriptEntry::user(prompt));
            (agency, state.conversation_id)
        };

        let request = RunAgencyRequest::new(prompt, agency);
        let content = match self.pipeline.run_agency(&request).await {
            Ok(payload) => AgencyResult::from_payload(agency, payload).display_text(),
            Err(error) => {
                warn!(agency = %agency, error = %error, "run-agency request failed");
                REQUEST_FAILED.to_owned()
            }
        };

        let mut state = self.state();
        if state.conversation_id != conversation_id {
            debug!(
                agency = %agency,
                conversation_id = %conversation_id,
                "dropping reply for a discarded conversation"
            );
            return RunOutcome::Stale;
        }
        let entry = TranscriptEntry::assistant(content);
        state.transcript.push(entry.clone());
        RunOutcome::Answered(entry)
    }

    /// Upload the pending document. Success clears the selection unless a
    /// newer document was attached meanwhile; failure keeps it.
    pub async fn ingest_pending(&self) -> IngestOutcome {
        let pending = {
            let state = self.state();
            state
                .pending
                .as_ref()
                .map(|pending| (pending.seq, pending.upload.clone()))
        };
        let Some((seq, upload)) = pending else {
            return IngestOutcome::NoDocument;
        };

        let file_name = upload.file_name.clone();
        match self.pipeline.ingest(upload).await {
            Ok(()) => {
                let mut state = self.state();
                if state.pending.as_ref().is_some_and(|pending| pending.seq == seq) {
                    state.pending = None;
                }
                debug!(file_name = %file_name, "document ingested");
                IngestOutcome::Ingested { file_name }
            }
            Err(error) => {
                warn!(file_name = %file_name, error = %error, "document ingestion failed");
                IngestOutcome::Failed { file_name }
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Read a document from disk for [`ConversationEngine::attach_document`].
pub async fn load_document(path: &Path) -> Result<DocumentUpload, DeskError> {
    DocumentUpload::from_path(path)
        .await
        .map_err(|source| DeskError::Document {
            path: path.to_path_buf(),
            source,
        })
}

/// Holds the run-agency slot until dropped.
struct RunSlot<'a>(&'a AtomicBool);

impl<'a> RunSlot<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
