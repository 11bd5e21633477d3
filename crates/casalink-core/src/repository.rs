//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Contract writes are
//! compare-and-swap on the record's `version` counter: a stale expected
//! version surfaces as [`CasalinkError::Conflict`] without touching the
//! row, so check-then-act races (double-sign, concurrent transitions)
//! resolve deterministically.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CasalinkResult;
use crate::models::{
    contract::{Contract, ContractStatus, CreateContract, UpdateContract},
    document::{ContractDocument, CreateContractDocument, DocumentStatus},
    notification::NewNotification,
    property::{CreateProperty, Property, PropertyStatus},
    user::{CreateUser, User},
};

#[cfg(doc)]
use crate::error::CasalinkError;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Contract fields exposed for server-side sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSortField {
    CreatedAt,
    UpdatedAt,
    StartDate,
    MonthlyRent,
}

/// Page-based pagination parameters (1-indexed).
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort_by: ContractSortField,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort_by: ContractSortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl PageRequest {
    /// Row offset for the underlying store.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

/// A paginated result set with the total count for UI pagination controls.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Server-side contract list filters; all optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ContractFilter {
    pub property_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
}

/// Whether statistics count the subject as owner or as tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPerspective {
    Owner,
    Tenant,
}

/// Per-status contract count for dashboard summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ContractStatus,
    pub count: u64,
}

pub trait ContractRepository: Send + Sync {
    fn create(&self, input: CreateContract) -> impl Future<Output = CasalinkResult<Contract>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CasalinkResult<Contract>> + Send;

    /// Compare-and-swap update: applies `input` only if the stored version
    /// equals `expected_version`, bumping the version by one.
    fn update(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateContract,
    ) -> impl Future<Output = CasalinkResult<Contract>> + Send;

    /// Same compare-and-swap update, plus a property status flip, applied
    /// in one transaction: either both writes land or neither does.
    fn update_with_property(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateContract,
        property_id: Uuid,
        property_status: PropertyStatus,
    ) -> impl Future<Output = CasalinkResult<Contract>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = CasalinkResult<()>> + Send;

    fn list(
        &self,
        filter: ContractFilter,
        page: PageRequest,
    ) -> impl Future<Output = CasalinkResult<PaginatedResult<Contract>>> + Send;

    /// Contracts for `property_id` whose status claims the date range and
    /// whose range overlaps `[start, end]` (inclusive on both boundaries).
    fn find_overlapping(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = CasalinkResult<Vec<Contract>>> + Send;

    fn status_counts(
        &self,
        subject_id: Uuid,
        perspective: StatsPerspective,
    ) -> impl Future<Output = CasalinkResult<Vec<StatusCount>>> + Send;
}

pub trait ContractDocumentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateContractDocument,
    ) -> impl Future<Output = CasalinkResult<ContractDocument>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CasalinkResult<ContractDocument>> + Send;

    /// All documents for a contract, most recent first.
    fn list_by_contract(
        &self,
        contract_id: Uuid,
    ) -> impl Future<Output = CasalinkResult<Vec<ContractDocument>>> + Send;

    /// Administrative review transition. `rejection_reason` is stored as
    /// given: `Some` when rejecting, `None` when validating (clearing any
    /// prior reason).
    fn set_review_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        rejection_reason: Option<String>,
    ) -> impl Future<Output = CasalinkResult<ContractDocument>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = CasalinkResult<()>> + Send;
}

pub trait PropertyStore: Send + Sync {
    fn create(&self, input: CreateProperty) -> impl Future<Output = CasalinkResult<Property>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = CasalinkResult<Property>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: PropertyStatus,
    ) -> impl Future<Output = CasalinkResult<Property>> + Send;
}

pub trait IdentityStore: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CasalinkResult<User>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = CasalinkResult<User>> + Send;

    fn find_by_email(&self, email: &str) -> impl Future<Output = CasalinkResult<User>> + Send;
}

/// Outbound notification queue. Dispatch failures are the caller's problem
/// to log; they must never fail the transition that produced them.
pub trait NotificationDispatcher: Send + Sync {
    fn enqueue(
        &self,
        notification: NewNotification,
    ) -> impl Future<Output = CasalinkResult<()>> + Send;
}
