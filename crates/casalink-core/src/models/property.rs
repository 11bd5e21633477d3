//! Property collaborator surface.
//!
//! Listing CRUD and search live outside the contract core; this is the
//! minimal shape the lifecycle manager reads and mutates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    Occupied,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "AVAILABLE",
            PropertyStatus::Occupied => "OCCUPIED",
        }
    }

    pub fn parse(s: &str) -> Option<PropertyStatus> {
        match s {
            "AVAILABLE" => Some(PropertyStatus::Available),
            "OCCUPIED" => Some(PropertyStatus::Occupied),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProperty {
    pub owner_id: Uuid,
    pub title: String,
}

/// Denormalized property summary attached to contract reads for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    pub status: PropertyStatus,
}

impl From<&Property> for PropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            status: p.status,
        }
    }
}
