use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::UploadNotice;
use crate::config::Config;
use crate::session::{SendOutcome, SessionRegistry, UploadOutcome};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let sessions = SessionRegistry::new(
            Duration::from_secs(config.chat.session_idle_ttl_secs),
            config.chat.max_sessions,
        );
        Self { config, sessions }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Model picker options.
///
/// Purely cosmetic: the selection is stored on the session and shown in the
/// UI, but replies are always produced by the local reply agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "claude-2")]
    Claude2,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::Gpt35Turbo, ModelId::Gpt4, ModelId::Claude2];

    pub fn id(&self) -> &'static str {
        match self {
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Gpt4 => "gpt-4",
            ModelId::Claude2 => "claude-2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelId::Gpt35Turbo => "GPT-3.5 Turbo",
            ModelId::Gpt4 => "GPT-4",
            ModelId::Claude2 => "Claude 2",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// UI color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

// API Request/Response types

/// Serializable view of a chat session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub filename: Option<String>,
    pub has_document: bool,
    pub loading: bool,
    pub model: ModelId,
    pub temperature: f32,
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub outcome: SendOutcome,
    /// Latest assistant message when the send produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ChatMessage>,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub notice: UploadNotice,
    pub outcome: UploadOutcome,
    pub session: SessionSnapshot,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub model: Option<ModelId>,
    pub temperature: Option<f32>,
    pub theme: Option<Theme>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

impl From<ModelId> for ModelInfo {
    fn from(model: ModelId) -> Self {
        Self {
            id: model.id(),
            name: model.label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids_round_trip_through_serde() {
        for model in ModelId::ALL {
            let encoded = serde_json::to_string(&model).unwrap();
            assert_eq!(encoded, format!("\"{}\"", model.id()));
            assert_eq!(ModelId::from_id(model.id()), Some(model));
        }
        assert_eq!(ModelId::default(), ModelId::Gpt35Turbo);
        assert_eq!(ModelId::from_id("gpt-5"), None);
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let theme: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }
}
