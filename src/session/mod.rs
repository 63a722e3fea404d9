//! Chat Sessions
//!
//! [`ChatSession`] owns everything one browser tab sees: the transcript, the
//! active document, the loading flag and the presentation controls. Every
//! operation is a command on the struct, so the controller can be driven
//! without a UI.
//!
//! Uploads and sends are single-flight. While one is running the loading
//! flag is set and further uploads or sends are ignored, so a user message
//! is always followed by its own reply.

pub mod registry;

pub use registry::SessionRegistry;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::phrases::{self, GREETINGS};
use crate::agents::{CanonicalText, ExtractError, FileUploadAgent, ReplyAgent, UploadedDocument};
use crate::models::{ChatMessage, ModelId, SessionSnapshot, Theme};

pub const NEEDS_DOCUMENT_REPLY: &str =
    "Please upload a file first, and I'll be happy to help you analyze its contents.";
pub const UPLOAD_FAILED_REPLY: &str =
    "I encountered an error while processing the file. Could you please try uploading it again?";
pub const GENERATION_FAILED_REPLY: &str = "I apologize, but I encountered an error while processing your request. Could you please try rephrasing your question?";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// What happened to a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// A reply was generated from the active document
    Replied,
    /// No document yet; the fixed upload prompt was appended
    NeedsDocument,
    /// Blank input, nothing appended
    IgnoredBlank,
    /// Another upload or send is in flight, nothing appended
    IgnoredBusy,
    /// Generation failed; an apology was appended
    Failed,
}

/// What happened to an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Document extracted and now active
    Processed,
    /// Extraction failed; previous document kept
    Failed,
    /// Batch contained no allowed file types
    Rejected,
    /// Another upload or send is in flight
    IgnoredBusy,
}

/// The document questions are answered from
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    pub filename: String,
    pub text: CanonicalText,
}

/// Work captured by [`ChatSession::begin_send`] to run outside the session
/// lock.
#[derive(Debug)]
pub struct PendingReply {
    pub content: CanonicalText,
    pub query: String,
    pub temperature: f32,
    rng: StdRng,
}

impl PendingReply {
    pub fn run(mut self) -> String {
        ReplyAgent::generate_response(&self.content, &self.query, self.temperature, &mut self.rng)
    }
}

/// First half of a send
#[derive(Debug)]
pub enum SendStep {
    /// Nothing left to do
    Done(SendOutcome),
    /// Run the reply, then call [`ChatSession::finish_send`]
    Generate(PendingReply),
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    messages: Vec<ChatMessage>,
    document: Option<ActiveDocument>,
    loading: bool,
    model: ModelId,
    temperature: f32,
    theme: Theme,
    rng: StdRng,
}

impl ChatSession {
    pub fn new(temperature: f32) -> Self {
        Self::with_rng(StdRng::from_entropy(), temperature)
    }

    /// Session whose phrase choices are reproducible
    pub fn with_seed(seed: u64, temperature: f32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), temperature)
    }

    fn with_rng(mut rng: StdRng, temperature: f32) -> Self {
        let greeting = phrases::pick(GREETINGS, &mut rng);
        Self {
            id: Uuid::new_v4(),
            messages: vec![ChatMessage::assistant(greeting)],
            document: None,
            loading: false,
            model: ModelId::default(),
            temperature: clamp_temperature(temperature).unwrap_or(DEFAULT_TEMPERATURE),
            theme: Theme::default(),
            rng,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn document(&self) -> Option<&ActiveDocument> {
        self.document.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.model = model;
    }

    /// Slider update. Values are clamped to [0, 1]; non-finite input is
    /// ignored.
    pub fn set_temperature(&mut self, temperature: f32) {
        match clamp_temperature(temperature) {
            Some(t) => self.temperature = t,
            None => warn!(session_id = %self.id, "Ignoring non-finite temperature"),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            messages: self.messages.clone(),
            filename: self.document.as_ref().map(|d| d.filename.clone()),
            has_document: self.document.is_some(),
            loading: self.loading,
            model: self.model,
            temperature: self.temperature,
            theme: self.theme,
        }
    }

    /// Extract `doc` and make it the active document.
    pub fn on_file_uploaded(&mut self, doc: &UploadedDocument) -> UploadOutcome {
        if !self.begin_upload() {
            return UploadOutcome::IgnoredBusy;
        }
        let result = FileUploadAgent::extract(doc);
        self.finish_upload(&doc.filename, result)
    }

    /// Answer `text` from the active document.
    pub fn on_user_message(&mut self, text: &str) -> SendOutcome {
        match self.begin_send(text) {
            SendStep::Done(outcome) => outcome,
            SendStep::Generate(pending) => {
                let reply = pending.run();
                self.finish_send(Some(reply))
            }
        }
    }

    /// Claim the in-flight slot for an upload. Returns false when busy.
    pub fn begin_upload(&mut self) -> bool {
        if self.loading {
            warn!(session_id = %self.id, "Upload ignored, session busy");
            return false;
        }
        self.loading = true;
        true
    }

    pub fn finish_upload(
        &mut self,
        filename: &str,
        result: Result<CanonicalText, ExtractError>,
    ) -> UploadOutcome {
        self.loading = false;

        match result {
            Ok(text) => {
                info!(
                    session_id = %self.id,
                    filename,
                    bytes = text.len(),
                    "Document processed"
                );
                self.document = Some(ActiveDocument {
                    filename: filename.to_string(),
                    text,
                });
                self.messages.push(ChatMessage::assistant(format!(
                    "I've processed \"{}\" and I'm ready to answer your questions about it. What would you like to know?",
                    filename
                )));
                UploadOutcome::Processed
            }
            Err(e) => {
                error!(session_id = %self.id, filename, error = %e, "Error processing file");
                self.messages.push(ChatMessage::assistant(UPLOAD_FAILED_REPLY));
                UploadOutcome::Failed
            }
        }
    }

    /// Append the user message and, if a document is active, hand back the
    /// reply work. Blank input and busy sessions append nothing.
    pub fn begin_send(&mut self, text: &str) -> SendStep {
        if text.trim().is_empty() {
            return SendStep::Done(SendOutcome::IgnoredBlank);
        }
        if self.loading {
            warn!(session_id = %self.id, "Message ignored, session busy");
            return SendStep::Done(SendOutcome::IgnoredBusy);
        }

        self.messages.push(ChatMessage::user(text));

        let Some(document) = &self.document else {
            self.messages.push(ChatMessage::assistant(NEEDS_DOCUMENT_REPLY));
            return SendStep::Done(SendOutcome::NeedsDocument);
        };

        self.loading = true;
        SendStep::Generate(PendingReply {
            content: document.text.clone(),
            query: text.to_string(),
            temperature: self.temperature,
            rng: StdRng::seed_from_u64(self.rng.gen()),
        })
    }

    /// Append the generated reply, or an apology when generation failed.
    pub fn finish_send(&mut self, reply: Option<String>) -> SendOutcome {
        self.loading = false;

        match reply {
            Some(reply) => {
                self.messages.push(ChatMessage::assistant(reply));
                SendOutcome::Replied
            }
            None => {
                self.messages.push(ChatMessage::assistant(GENERATION_FAILED_REPLY));
                SendOutcome::Failed
            }
        }
    }
}

fn clamp_temperature(temperature: f32) -> Option<f32> {
    temperature.is_finite().then(|| temperature.clamp(0.0, 1.0))
}

/// Shared, lockable session used by the HTTP layer
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<ChatSession>>,
}

impl SessionHandle {
    pub fn new(session: ChatSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Apply a synchronous change and return the resulting snapshot.
    pub async fn update<F>(&self, f: F) -> SessionSnapshot
    where
        F: FnOnce(&mut ChatSession),
    {
        let mut session = self.inner.lock().await;
        f(&mut session);
        session.snapshot()
    }

    /// Extract `doc` on a blocking worker; the lock is released meanwhile.
    /// The snapshot is taken under the same lock as the final state change.
    ///
    /// The whole operation runs on its own task, so dropping the returned
    /// future (client disconnect) still clears the loading flag.
    pub async fn upload(&self, doc: UploadedDocument) -> (UploadOutcome, SessionSnapshot) {
        let inner = Arc::clone(&self.inner);
        let filename = doc.filename.clone();

        match tokio::spawn(Self::run_upload(inner, doc)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Upload task failed");
                let mut session = self.inner.lock().await;
                let outcome = if session.is_loading() {
                    session.finish_upload(&filename, Err(ExtractError::Processing(e.to_string())))
                } else {
                    UploadOutcome::Failed
                };
                (outcome, session.snapshot())
            }
        }
    }

    /// Answer `text` on a blocking worker; the lock is released meanwhile.
    /// Runs detached like [`SessionHandle::upload`].
    pub async fn send(&self, text: &str) -> (SendOutcome, SessionSnapshot) {
        let inner = Arc::clone(&self.inner);

        match tokio::spawn(Self::run_send(inner, text.to_string())).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Send task failed");
                let mut session = self.inner.lock().await;
                let outcome = if session.is_loading() {
                    session.finish_send(None)
                } else {
                    SendOutcome::Failed
                };
                (outcome, session.snapshot())
            }
        }
    }

    async fn run_upload(
        inner: Arc<Mutex<ChatSession>>,
        doc: UploadedDocument,
    ) -> (UploadOutcome, SessionSnapshot) {
        {
            let mut session = inner.lock().await;
            if !session.begin_upload() {
                return (UploadOutcome::IgnoredBusy, session.snapshot());
            }
        }

        let filename = doc.filename.clone();
        let result = FileUploadAgent::process_file(doc).await;

        let mut session = inner.lock().await;
        let outcome = session.finish_upload(&filename, result);
        (outcome, session.snapshot())
    }

    async fn run_send(inner: Arc<Mutex<ChatSession>>, text: String) -> (SendOutcome, SessionSnapshot) {
        let pending = {
            let mut session = inner.lock().await;
            match session.begin_send(&text) {
                SendStep::Done(outcome) => return (outcome, session.snapshot()),
                SendStep::Generate(pending) => pending,
            }
        };

        let reply = match tokio::task::spawn_blocking(move || pending.run()).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(error = %e, "Reply generation task failed");
                None
            }
        };

        let mut session = inner.lock().await;
        let outcome = session.finish_send(reply);
        (outcome, session.snapshot())
    }
}
