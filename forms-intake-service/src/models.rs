use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of supported regulatory form kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Fc,
    Apr,
    Ecb,
}

impl FormKind {
    /// Fixed priority ordering. The first entry is the default priority label
    /// used to break classification ties, and the scan order for form-kind
    /// tokens in chat utterances.
    pub const PRIORITY: [FormKind; 3] = [FormKind::Fc, FormKind::Apr, FormKind::Ecb];

    pub fn label(&self) -> &'static str {
        match self {
            FormKind::Fc => "FC",
            FormKind::Apr => "APR",
            FormKind::Ecb => "ECB-2",
        }
    }

    /// Lowercase stem used in generated file names.
    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::Fc => "fc",
            FormKind::Apr => "apr",
            FormKind::Ecb => "ecb-2",
        }
    }

    fn token(&self) -> &'static str {
        match self {
            FormKind::Fc => "fc",
            FormKind::Apr => "apr",
            FormKind::Ecb => "ecb",
        }
    }

    /// Resolve a form kind from a chat utterance by first-keyword-match in
    /// priority order. The utterance must already be lowercased.
    pub fn from_utterance(utterance: &str) -> Option<FormKind> {
        Self::PRIORITY
            .into_iter()
            .find(|kind| utterance.contains(kind.token()))
    }

    /// Parse a path segment such as `fc`, `APR` or `ecb-2`.
    pub fn parse(value: &str) -> Option<FormKind> {
        match value.to_lowercase().as_str() {
            "fc" => Some(FormKind::Fc),
            "apr" => Some(FormKind::Apr),
            "ecb" | "ecb-2" => Some(FormKind::Ecb),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The fixed set of fields extracted from forms and supporting files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Uin,
    EntityName,
    Amount,
}

impl FieldName {
    pub const ALL: [FieldName; 3] = [FieldName::Uin, FieldName::EntityName, FieldName::Amount];

    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Uin => "UIN",
            FieldName::EntityName => "Entity Name",
            FieldName::Amount => "Amount",
        }
    }
}

/// Values for the fixed field enumeration. A missing value is `None`, never an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub uin: Option<String>,
    pub entity_name: Option<String>,
    pub amount: Option<String>,
}

impl FieldSet {
    pub fn get(&self, field: FieldName) -> Option<&str> {
        match field {
            FieldName::Uin => self.uin.as_deref(),
            FieldName::EntityName => self.entity_name.as_deref(),
            FieldName::Amount => self.amount.as_deref(),
        }
    }

    /// Store a value unless the field is already filled. Empty values are
    /// dropped rather than stored. Returns true if the field was filled.
    pub fn fill_if_absent(&mut self, field: FieldName, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return false;
        }
        let slot = match field {
            FieldName::Uin => &mut self.uin,
            FieldName::EntityName => &mut self.entity_name,
            FieldName::Amount => &mut self.amount,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(trimmed.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.uin.is_none() && self.entity_name.is_none() && self.amount.is_none()
    }
}

/// A field present on both sides with conflicting values. Values are reported
/// untrimmed, in their original case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: FieldName,
    pub form_value: String,
    pub support_value: String,
}

/// Per-file outcome of the supporting-document scan. Distinguishes "parsed but
/// no fields found" from "could not parse".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SupportOutcome {
    Parsed { fields_found: usize },
    ParseFailed { reason: String },
    SkippedNonTabular,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportFileReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: SupportOutcome,
}

/// State of the conversational field collector for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CollectorState {
    NoFormSelected,
    Collecting { index: usize },
    Complete,
}

// --- HTTP request/response types ---

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub form_path: String,
    #[serde(default)]
    pub support_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub session_id: String,
    /// Detected form label, or "unknown".
    pub detected_form: String,
    pub form_fields: FieldSet,
    pub support_fields: FieldSet,
    pub support_files: Vec<SupportFileReport>,
    pub mismatches: Vec<Mismatch>,
    pub consistent: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub collector_state: CollectorState,
    pub form_kind: Option<String>,
    pub answers: Vec<(String, String)>,
    pub transcript: Vec<intake_flow::ChatMessage>,
    pub artifact_ready: bool,
    pub status_message: Option<String>,
    pub context: HashMap<String, serde_json::Value>,
}

/// Discovery metadata for one form kind.
#[derive(Debug, Clone, Serialize)]
pub struct FormInfo {
    pub title: &'static str,
    pub checklist: &'static [&'static str],
    pub sample_link: &'static str,
}
