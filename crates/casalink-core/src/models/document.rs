//! Evidentiary document attachments (identity proofs, income proofs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrative review state of an uploaded document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Uploaded,
    Validated,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "UPLOADED",
            DocumentStatus::Validated => "VALIDATED",
            DocumentStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<DocumentStatus> {
        match s {
            "UPLOADED" => Some(DocumentStatus::Uploaded),
            "VALIDATED" => Some(DocumentStatus::Validated),
            "REJECTED" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub uploaded_by: Uuid,
    /// Free-form classification ("identity_proof", "income_proof", ...).
    pub category: String,
    pub file_name: String,
    /// Opaque reference into the external file store.
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub status: DocumentStatus,
    /// Set only while status is Rejected.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContractDocument {
    pub contract_id: Uuid,
    pub uploaded_by: Uuid,
    pub category: String,
    pub file_name: String,
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
}
