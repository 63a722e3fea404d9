//! Document Agents
//!
//! The two pieces that answer questions about an uploaded document:
//!
//! - **File Upload Agent**: turns an uploaded file into canonical text
//! - **Reply Agent**: searches the canonical text and phrases the answer
//!
//! ## Pipeline Overview
//!
//! ```text
//! Uploaded file
//!      │
//!      ▼
//! ┌─────────────┐
//! │ File Upload │  → Canonical text (stored on the session)
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼   user question + temperature
//! ┌─────────────┐
//! │   Reply     │  → Matches wrapped in phrases
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//!  Assistant message
//! ```

pub mod file_upload;
pub mod phrases;
pub mod reply;

pub use file_upload::{
    CanonicalText, DocumentKind, ExtractError, FileUploadAgent, NoticeVariant, UploadNotice,
    UploadedDocument, ValidatedBatch,
};
pub use reply::{ContentMode, ReplyAgent, Verbosity};
