//! Rental contract domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a contract.
///
/// The main path is `Draft → Sent → {SignedOwner, SignedTenant} →
/// Completed → Active → Terminated`. Any post-draft, pre-active state can
/// branch to `Cancelled`. `Expired` is reachable only through a scheduled
/// job, never through a service operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Sent,
    SignedOwner,
    SignedTenant,
    Completed,
    Active,
    Terminated,
    Cancelled,
    Expired,
}

impl ContractStatus {
    /// Canonical string form, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::Sent => "SENT",
            ContractStatus::SignedOwner => "SIGNED_OWNER",
            ContractStatus::SignedTenant => "SIGNED_TENANT",
            ContractStatus::Completed => "COMPLETED",
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Terminated => "TERMINATED",
            ContractStatus::Cancelled => "CANCELLED",
            ContractStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<ContractStatus> {
        match s {
            "DRAFT" => Some(ContractStatus::Draft),
            "SENT" => Some(ContractStatus::Sent),
            "SIGNED_OWNER" => Some(ContractStatus::SignedOwner),
            "SIGNED_TENANT" => Some(ContractStatus::SignedTenant),
            "COMPLETED" => Some(ContractStatus::Completed),
            "ACTIVE" => Some(ContractStatus::Active),
            "TERMINATED" => Some(ContractStatus::Terminated),
            "CANCELLED" => Some(ContractStatus::Cancelled),
            "EXPIRED" => Some(ContractStatus::Expired),
            _ => None,
        }
    }

    /// Statuses that represent a live claim on the property's date range.
    ///
    /// Partially-signed contracts are included: a contract mid-signature is
    /// still a real scheduling commitment.
    pub fn claims_date_range(&self) -> bool {
        matches!(
            self,
            ContractStatus::Draft
                | ContractStatus::Sent
                | ContractStatus::SignedOwner
                | ContractStatus::SignedTenant
                | ContractStatus::Completed
                | ContractStatus::Active
        )
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContractStatus::Terminated | ContractStatus::Cancelled | ContractStatus::Expired
        )
    }

    /// States from which the owner may cancel: everything after leaving
    /// Draft but before activation.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            ContractStatus::Sent
                | ContractStatus::SignedOwner
                | ContractStatus::SignedTenant
                | ContractStatus::Completed
        )
    }
}

/// Which contracting party an identity resolved to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Owner,
    Tenant,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Owner => "owner",
            PartyRole::Tenant => "tenant",
        }
    }

    /// The counterparty on the same contract.
    pub fn other(&self) -> PartyRole {
        match self {
            PartyRole::Owner => PartyRole::Tenant,
            PartyRole::Tenant => PartyRole::Owner,
        }
    }
}

/// Audit metadata recorded for a single signature event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureRecord {
    pub signed_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// SHA-256 over the canonical serialization of the contract content and
    /// custom clauses at signing time (tamper evidence).
    pub content_hash: String,
}

/// Per-role signature audit metadata. A role's entry, once present, is
/// never replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureMetadata {
    pub owner: Option<SignatureRecord>,
    pub tenant: Option<SignatureRecord>,
}

impl SignatureMetadata {
    pub fn for_role(&self, role: PartyRole) -> Option<&SignatureRecord> {
        match role {
            PartyRole::Owner => self.owner.as_ref(),
            PartyRole::Tenant => self.tenant.as_ref(),
        }
    }
}

/// Audit record layered into the content envelope when a contract is
/// cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationRecord {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: Uuid,
    pub previous_status: ContractStatus,
}

/// Versioned envelope for the contract's structured payload.
///
/// Known sections are typed; anything else a caller supplied at creation
/// time rides along in `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractContent {
    pub schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatures: Option<SignatureMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<CancellationRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ContractContent {
    fn default() -> Self {
        Self {
            schema_version: 1,
            signatures: None,
            cancellation: None,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Monthly rent in minor currency units (cents). Always positive.
    pub monthly_rent: i64,
    pub charges: Option<i64>,
    pub deposit: Option<i64>,
    pub terms: Option<String>,
    pub content: ContractContent,
    /// Free-form negotiated clauses, keyed by clause name.
    pub custom_clauses: serde_json::Value,
    /// Opaque signature payload supplied by the owner at signing time.
    pub owner_signature: Option<String>,
    pub signed_by_owner: Option<DateTime<Utc>>,
    pub tenant_signature: Option<String>,
    pub signed_by_tenant: Option<DateTime<Utc>>,
    /// Set exactly when both parties have signed.
    pub signed_at: Option<DateTime<Utc>>,
    pub status: ContractStatus,
    /// Optimistic-concurrency counter; every write bumps it by one.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn signature_timestamp(&self, role: PartyRole) -> Option<DateTime<Utc>> {
        match role {
            PartyRole::Owner => self.signed_by_owner,
            PartyRole::Tenant => self.signed_by_tenant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContract {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: i64,
    pub charges: Option<i64>,
    pub deposit: Option<i64>,
    pub terms: Option<String>,
    pub content: Option<ContractContent>,
    pub custom_clauses: Option<serde_json::Value>,
}

/// Partial update. `None` = no change. Nested `Some(None)` = clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContract {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_rent: Option<i64>,
    pub charges: Option<Option<i64>>,
    pub deposit: Option<Option<i64>>,
    pub terms: Option<Option<String>>,
    pub content: Option<ContractContent>,
    pub custom_clauses: Option<serde_json::Value>,
    pub status: Option<ContractStatus>,
    pub owner_signature: Option<String>,
    pub signed_by_owner: Option<DateTime<Utc>>,
    pub tenant_signature: Option<String>,
    pub signed_by_tenant: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
}
