//! File Upload Agent
//!
//! Turns an uploaded file into the canonical text the reply agent searches.
//! Three kinds are recognised by declared MIME type: JSON (re-serialized with
//! two-space indentation, key order kept), plain text (verbatim) and
//! word-processor files.
//!
//! Word-processor support is a printable-ASCII scrape of the raw bytes, not a
//! `.doc`/`.docx` parser. Binary structure comes through as noise. This is a
//! known limitation.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const JSON_MIME: &str = "application/json";
pub const TEXT_MIME: &str = "text/plain";
pub const MSWORD_MIME: &str = "application/msword";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Declared types accepted by the upload surface
pub const ALLOWED_MIME_TYPES: [&str; 4] = [JSON_MIME, TEXT_MIME, MSWORD_MIME, DOCX_MIME];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Value of the `accept` attribute on the upload input
pub const ACCEPTED_EXTENSIONS: &str = ".json,.txt,.doc,.docx";

/// Extraction failures
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Error processing file: {0}")]
    Processing(String),
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::MalformedInput(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ExtractError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        ExtractError::MalformedInput(e.to_string())
    }
}

/// Recognised document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Json,
    PlainText,
    WordProcessor,
}

impl DocumentKind {
    /// Map a declared MIME type onto a kind. Parameters such as `charset`
    /// are ignored.
    pub fn from_mime(declared: &str) -> Option<Self> {
        let parsed: mime::Mime = declared.trim().parse().ok()?;
        let essence = parsed.essence_str();

        if essence.eq_ignore_ascii_case(JSON_MIME) {
            Some(DocumentKind::Json)
        } else if essence.eq_ignore_ascii_case(TEXT_MIME) {
            Some(DocumentKind::PlainText)
        } else if essence.eq_ignore_ascii_case(MSWORD_MIME)
            || essence.eq_ignore_ascii_case(DOCX_MIME)
        {
            Some(DocumentKind::WordProcessor)
        } else {
            None
        }
    }
}

/// A file as received from the client
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Build from a multipart part. A missing or `application/octet-stream`
    /// type is replaced by a guess from the file extension.
    pub fn from_part(filename: Option<&str>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        let filename = filename.unwrap_or("upload").to_string();
        let declared = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty() && *ct != OCTET_STREAM_MIME);

        let content_type = match declared {
            Some(ct) => ct.to_string(),
            None => {
                let guessed = mime_guess::from_path(&filename)
                    .first_raw()
                    .unwrap_or(OCTET_STREAM_MIME);
                debug!(filename = %filename, guessed, "Inferred content type from extension");
                guessed.to_string()
            }
        };

        Self {
            filename,
            content_type,
            data,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.content_type)
    }
}

/// Normalised text of the active document. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalText(Arc<str>);

impl CanonicalText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CanonicalText {
    fn from(s: String) -> Self {
        CanonicalText(s.into())
    }
}

impl From<&str> for CanonicalText {
    fn from(s: &str) -> Self {
        CanonicalText(s.into())
    }
}

impl Deref for CanonicalText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Toast-style feedback for an upload batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadNotice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

/// Result of filtering a batch against the allow-list
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub accepted: Vec<UploadedDocument>,
    pub notice: UploadNotice,
}

impl ValidatedBatch {
    pub fn is_rejected(&self) -> bool {
        self.accepted.is_empty()
    }
}

pub struct FileUploadAgent;

impl FileUploadAgent {
    /// Filter a batch down to allowed types and describe the outcome.
    pub fn validate_batch(files: Vec<UploadedDocument>) -> ValidatedBatch {
        let total = files.len();
        let accepted: Vec<UploadedDocument> =
            files.into_iter().filter(|f| f.kind().is_some()).collect();

        let notice = if accepted.is_empty() {
            warn!(total, "Rejected upload batch, no allowed file types");
            UploadNotice {
                title: "Invalid file type".to_string(),
                description: "Please upload JSON, TXT, or DOC files.".to_string(),
                variant: NoticeVariant::Destructive,
            }
        } else {
            info!(total, accepted = accepted.len(), "Accepted upload batch");
            UploadNotice {
                title: "Files uploaded".to_string(),
                description: format!("{} file(s) successfully uploaded.", accepted.len()),
                variant: NoticeVariant::Default,
            }
        };

        ValidatedBatch { accepted, notice }
    }

    /// Extract canonical text on a blocking worker.
    pub async fn process_file(doc: UploadedDocument) -> Result<CanonicalText, ExtractError> {
        tokio::task::spawn_blocking(move || Self::extract(&doc))
            .await
            .map_err(|e| ExtractError::Processing(e.to_string()))?
    }

    /// Synchronous extraction core
    pub fn extract(doc: &UploadedDocument) -> Result<CanonicalText, ExtractError> {
        let kind = doc
            .kind()
            .ok_or_else(|| ExtractError::UnsupportedType(doc.content_type.clone()))?;

        debug!(
            filename = %doc.filename,
            kind = ?kind,
            bytes = doc.data.len(),
            "Extracting document text"
        );

        let text = match kind {
            DocumentKind::Json => {
                let raw = decode_utf8(&doc.data)?;
                let value: Value = serde_json::from_str(&raw)?;
                serde_json::to_string_pretty(&value)
                    .map_err(|e| ExtractError::Processing(e.to_string()))?
            }
            DocumentKind::PlainText => decode_utf8(&doc.data)?,
            DocumentKind::WordProcessor => scrape_printable(&doc.data),
        };

        Ok(CanonicalText::from(text))
    }
}

/// Strict UTF-8 decode that drops a leading byte-order mark.
fn decode_utf8(data: &[u8]) -> Result<String, ExtractError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    Ok(String::from_utf8(data.to_vec())?)
}

/// Keep printable ASCII and newlines, blank out everything else.
fn scrape_printable(data: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(data);
    let filtered: String = decoded
        .chars()
        .map(|c| if c == '\n' || (' '..='~').contains(&c) { c } else { ' ' })
        .collect();
    filtered.trim().to_string()
}
