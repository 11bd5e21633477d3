//! Domain notifications emitted by contract transitions.
//!
//! Delivery (push, email, in-app rendering) is out of scope; the core only
//! enqueues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ContractReceived,
    ContractSigned,
    ContractCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ContractReceived => "CONTRACT_RECEIVED",
            NotificationKind::ContractSigned => "CONTRACT_SIGNED",
            NotificationKind::ContractCancelled => "CONTRACT_CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<NotificationKind> {
        match s {
            "CONTRACT_RECEIVED" => Some(NotificationKind::ContractReceived),
            "CONTRACT_SIGNED" => Some(NotificationKind::ContractSigned),
            "CONTRACT_CANCELLED" => Some(NotificationKind::ContractCancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Deep link for the client ("/contracts/{id}").
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
}
