//! Contract lifecycle service — owns the contract state machine.
//!
//! Every operation loads the current record, validates caller role and
//! state preconditions against the just-loaded snapshot, and persists the
//! transition through a compare-and-swap write keyed on the record's
//! version. Concurrent transitions on the same contract therefore resolve
//! to one winner and retryable `Conflict`s, never to silent overwrites.
//!
//! Generic over repository implementations so that the lifecycle layer
//! has no dependency on the database crate.

use casalink_core::error::{CasalinkError, CasalinkResult};
use casalink_core::models::contract::{
    CancellationRecord, Contract, ContractContent, ContractStatus, CreateContract, PartyRole,
    UpdateContract,
};
use casalink_core::models::notification::{NewNotification, NotificationKind};
use casalink_core::models::property::{PropertyStatus, PropertySummary};
use casalink_core::models::user::{User, UserRole, UserSummary};
use casalink_core::repository::{
    ContractFilter, ContractRepository, IdentityStore, NotificationDispatcher, PageRequest,
    PaginatedResult, PropertyStore, StatsPerspective, StatusCount,
};
use chrono::{NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::config::ContractConfig;
use crate::error::ContractError;
use crate::signature::{self, SignatureProvenance};

/// Tenant reference accepted at contract creation: a stable identity key
/// or an email address.
#[derive(Debug, Clone)]
pub enum TenantRef {
    Id(Uuid),
    Email(String),
}

impl TenantRef {
    fn identifier(&self) -> String {
        match self {
            TenantRef::Id(id) => id.to_string(),
            TenantRef::Email(email) => email.clone(),
        }
    }
}

/// Input for contract creation.
#[derive(Debug, Clone)]
pub struct CreateContractInput {
    pub property_id: Uuid,
    pub tenant: TenantRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Monthly rent in minor currency units (cents).
    pub monthly_rent: i64,
    pub charges: Option<i64>,
    pub deposit: Option<i64>,
    pub terms: Option<String>,
    pub content: Option<ContractContent>,
    pub custom_clauses: Option<serde_json::Value>,
}

/// Partial update of commercial terms, owner-only and only before the
/// contract is fully executed. `None` = no change, nested `Some(None)` =
/// clear.
#[derive(Debug, Clone, Default)]
pub struct UpdateContractTerms {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_rent: Option<i64>,
    pub charges: Option<Option<i64>>,
    pub deposit: Option<Option<i64>>,
    pub terms: Option<Option<String>>,
    pub custom_clauses: Option<serde_json::Value>,
}

/// A contract with denormalized party and property summaries for display.
#[derive(Debug, Clone)]
pub struct ContractDetails {
    pub contract: Contract,
    pub property: PropertySummary,
    pub owner: UserSummary,
    pub tenant: UserSummary,
}

/// Contract lifecycle service.
pub struct ContractService<C, P, I, N>
where
    C: ContractRepository,
    P: PropertyStore,
    I: IdentityStore,
    N: NotificationDispatcher,
{
    contracts: C,
    properties: P,
    identities: I,
    notifier: N,
    config: ContractConfig,
}

impl<C, P, I, N> ContractService<C, P, I, N>
where
    C: ContractRepository,
    P: PropertyStore,
    I: IdentityStore,
    N: NotificationDispatcher,
{
    pub fn new(
        contracts: C,
        properties: P,
        identities: I,
        notifier: N,
        config: ContractConfig,
    ) -> Self {
        Self {
            contracts,
            properties,
            identities,
            notifier,
            config,
        }
    }

    /// Create a draft contract between `owner_id` and the resolved tenant.
    pub async fn create(
        &self,
        owner_id: Uuid,
        input: CreateContractInput,
    ) -> CasalinkResult<ContractDetails> {
        validate_date_range(input.start_date, input.end_date)?;
        validate_amounts(input.monthly_rent, input.charges, input.deposit)?;

        let property = self
            .properties
            .find_by_id(input.property_id)
            .await
            .map_err(|e| not_found_as(e, ContractError::PropertyNotFound(input.property_id)))?;
        if property.owner_id != owner_id {
            return Err(ContractError::OwnerOnly {
                operation: "create contracts for this property",
            }
            .into());
        }

        let tenant = self.resolve_tenant(&input.tenant).await?;

        // Overlap guard: no second live claim on the same property for an
        // intersecting date range.
        let overlapping = self
            .contracts
            .find_overlapping(input.property_id, input.start_date, input.end_date)
            .await?;
        if let Some(existing) = overlapping.first() {
            return Err(ContractError::ScheduleOverlap {
                start: existing.start_date,
                end: existing.end_date,
            }
            .into());
        }

        let owner = self.identities.find_by_id(owner_id).await?;

        let contract = self
            .contracts
            .create(CreateContract {
                property_id: input.property_id,
                tenant_id: tenant.id,
                owner_id,
                start_date: input.start_date,
                end_date: input.end_date,
                monthly_rent: input.monthly_rent,
                charges: input.charges,
                deposit: input.deposit,
                terms: input.terms,
                content: input.content,
                custom_clauses: input.custom_clauses,
            })
            .await?;

        Ok(ContractDetails {
            contract,
            property: PropertySummary::from(&property),
            owner: UserSummary::from(&owner),
            tenant: UserSummary::from(&tenant),
        })
    }

    /// Fetch a contract with its display summaries.
    pub async fn get(&self, contract_id: Uuid) -> CasalinkResult<ContractDetails> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        let property = self.properties.find_by_id(contract.property_id).await?;
        let owner = self.identities.find_by_id(contract.owner_id).await?;
        let tenant = self.identities.find_by_id(contract.tenant_id).await?;
        Ok(ContractDetails {
            contract,
            property: PropertySummary::from(&property),
            owner: UserSummary::from(&owner),
            tenant: UserSummary::from(&tenant),
        })
    }

    /// Update commercial terms. Owner-only; frozen once both parties have
    /// committed (Completed), the lease is live (Active), or it expired.
    pub async fn update(
        &self,
        contract_id: Uuid,
        caller_id: Uuid,
        input: UpdateContractTerms,
    ) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "update a contract")?;

        if matches!(
            contract.status,
            ContractStatus::Expired | ContractStatus::Completed | ContractStatus::Active
        ) {
            return Err(ContractError::InvalidTransition {
                operation: "update",
                status: contract.status,
            }
            .into());
        }

        // Re-validate ordering over the effective range.
        let start = input.start_date.unwrap_or(contract.start_date);
        let end = input.end_date.unwrap_or(contract.end_date);
        validate_date_range(start, end)?;
        if let Some(rent) = input.monthly_rent {
            validate_amounts(rent, input.charges.flatten(), input.deposit.flatten())?;
        } else {
            validate_amounts(
                contract.monthly_rent,
                input.charges.flatten(),
                input.deposit.flatten(),
            )?;
        }

        // A date change must not collide with another live claim.
        if input.start_date.is_some() || input.end_date.is_some() {
            let overlapping = self
                .contracts
                .find_overlapping(contract.property_id, start, end)
                .await?;
            if let Some(existing) = overlapping.iter().find(|c| c.id != contract_id) {
                return Err(ContractError::ScheduleOverlap {
                    start: existing.start_date,
                    end: existing.end_date,
                }
                .into());
            }
        }

        self.contracts
            .update(
                contract_id,
                contract.version,
                UpdateContract {
                    start_date: input.start_date,
                    end_date: input.end_date,
                    monthly_rent: input.monthly_rent,
                    charges: input.charges,
                    deposit: input.deposit,
                    terms: input.terms,
                    custom_clauses: input.custom_clauses,
                    ..UpdateContract::default()
                },
            )
            .await
    }

    /// Delete a draft. Any later state is tenant-visible commitment and
    /// must go through `cancel` instead, which leaves an audit trail.
    pub async fn delete(&self, contract_id: Uuid, caller_id: Uuid) -> CasalinkResult<()> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "delete a contract")?;
        if contract.status != ContractStatus::Draft {
            return Err(ContractError::InvalidTransition {
                operation: "delete",
                status: contract.status,
            }
            .into());
        }
        self.contracts.delete(contract_id).await
    }

    /// Send a draft to the tenant for signature.
    pub async fn send(&self, contract_id: Uuid, caller_id: Uuid) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "send a contract")?;
        if contract.status != ContractStatus::Draft {
            return Err(ContractError::InvalidTransition {
                operation: "send",
                status: contract.status,
            }
            .into());
        }

        let updated = self
            .contracts
            .update(
                contract_id,
                contract.version,
                UpdateContract {
                    status: Some(ContractStatus::Sent),
                    ..UpdateContract::default()
                },
            )
            .await?;

        self.notify(NewNotification {
            recipient_id: updated.tenant_id,
            kind: NotificationKind::ContractReceived,
            title: "Contract received".into(),
            message: "A rental contract is awaiting your signature.".into(),
            action_url: Some(self.action_url(contract_id)),
        })
        .await;

        Ok(updated)
    }

    /// Record a signature for whichever party the caller is.
    ///
    /// The signing role is determined by identity match against the
    /// contract's own party ids, never by a caller-supplied flag.
    pub async fn sign(
        &self,
        contract_id: Uuid,
        caller_id: Uuid,
        signature_payload: Option<String>,
        provenance: SignatureProvenance,
    ) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        let role = party_role(&contract, caller_id)?;

        let allowed = match role {
            PartyRole::Owner => matches!(
                contract.status,
                ContractStatus::Draft | ContractStatus::Sent | ContractStatus::SignedTenant
            ),
            PartyRole::Tenant => matches!(
                contract.status,
                ContractStatus::Sent | ContractStatus::SignedOwner
            ),
        };
        if !allowed {
            return Err(ContractError::InvalidTransition {
                operation: "sign",
                status: contract.status,
            }
            .into());
        }
        if contract.signature_timestamp(role).is_some() {
            return Err(ContractError::AlreadySigned(role).into());
        }

        let now = Utc::now();
        let hash = signature::content_hash(&contract.content, &contract.custom_clauses)?;
        let existing = contract.content.signatures.clone().unwrap_or_default();
        let metadata = signature::record_signature(&existing, role, &provenance, hash, now);

        let other_signed = contract.signature_timestamp(role.other()).is_some();
        let new_status = if other_signed {
            ContractStatus::Completed
        } else {
            match role {
                PartyRole::Owner => ContractStatus::SignedOwner,
                PartyRole::Tenant => ContractStatus::SignedTenant,
            }
        };

        let mut content = contract.content.clone();
        content.signatures = Some(metadata);

        let mut update = UpdateContract {
            content: Some(content),
            status: Some(new_status),
            ..UpdateContract::default()
        };
        match role {
            PartyRole::Owner => {
                update.owner_signature = signature_payload;
                update.signed_by_owner = Some(now);
            }
            PartyRole::Tenant => {
                update.tenant_signature = signature_payload;
                update.signed_by_tenant = Some(now);
            }
        }
        if other_signed {
            update.signed_at = Some(now);
        }

        let updated = self
            .contracts
            .update(contract_id, contract.version, update)
            .await?;

        let recipient = match role {
            PartyRole::Owner => updated.tenant_id,
            PartyRole::Tenant => updated.owner_id,
        };
        self.notify(NewNotification {
            recipient_id: recipient,
            kind: NotificationKind::ContractSigned,
            title: "Contract signed".into(),
            message: format!("The {} has signed the contract.", role.as_str()),
            action_url: Some(self.action_url(contract_id)),
        })
        .await;

        Ok(updated)
    }

    /// Turn a fully-signed contract into the operative lease: status
    /// Active and the property marked occupied, in one transaction.
    pub async fn activate(&self, contract_id: Uuid, caller_id: Uuid) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "activate a contract")?;
        if contract.status != ContractStatus::Completed {
            return Err(ContractError::InvalidTransition {
                operation: "activate",
                status: contract.status,
            }
            .into());
        }

        self.contracts
            .update_with_property(
                contract_id,
                contract.version,
                UpdateContract {
                    status: Some(ContractStatus::Active),
                    ..UpdateContract::default()
                },
                contract.property_id,
                PropertyStatus::Occupied,
            )
            .await
    }

    /// End an active lease: status Terminated and the property released,
    /// in one transaction.
    pub async fn terminate(&self, contract_id: Uuid, caller_id: Uuid) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "terminate a contract")?;
        if contract.status != ContractStatus::Active {
            return Err(ContractError::InvalidTransition {
                operation: "terminate",
                status: contract.status,
            }
            .into());
        }

        self.contracts
            .update_with_property(
                contract_id,
                contract.version,
                UpdateContract {
                    status: Some(ContractStatus::Terminated),
                    ..UpdateContract::default()
                },
                contract.property_id,
                PropertyStatus::Available,
            )
            .await
    }

    /// Cancel a contract after it left Draft but before activation,
    /// recording an audit trail in the content envelope.
    pub async fn cancel(
        &self,
        contract_id: Uuid,
        caller_id: Uuid,
        reason: Option<String>,
    ) -> CasalinkResult<Contract> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        require_owner(&contract, caller_id, "cancel a contract")?;
        if !contract.status.is_cancellable() {
            return Err(ContractError::InvalidTransition {
                operation: "cancel",
                status: contract.status,
            }
            .into());
        }

        let mut content = contract.content.clone();
        content.cancellation = Some(CancellationRecord {
            reason: reason.clone(),
            cancelled_at: Utc::now(),
            cancelled_by: caller_id,
            previous_status: contract.status,
        });

        let updated = self
            .contracts
            .update(
                contract_id,
                contract.version,
                UpdateContract {
                    content: Some(content),
                    status: Some(ContractStatus::Cancelled),
                    ..UpdateContract::default()
                },
            )
            .await?;

        let message = match reason {
            Some(reason) => format!("The contract was cancelled: {reason}"),
            None => "The contract was cancelled.".into(),
        };
        self.notify(NewNotification {
            recipient_id: updated.tenant_id,
            kind: NotificationKind::ContractCancelled,
            title: "Contract cancelled".into(),
            message,
            action_url: Some(self.action_url(contract_id)),
        })
        .await;

        Ok(updated)
    }

    /// Filtered, sorted, offset-paginated contract listing.
    pub async fn list(
        &self,
        filter: ContractFilter,
        page: PageRequest,
    ) -> CasalinkResult<PaginatedResult<Contract>> {
        self.contracts.list(filter, page).await
    }

    /// Per-status contract counts for dashboard summaries.
    pub async fn statistics(
        &self,
        subject_id: Uuid,
        perspective: StatsPerspective,
    ) -> CasalinkResult<Vec<StatusCount>> {
        self.contracts.status_counts(subject_id, perspective).await
    }

    async fn resolve_tenant(&self, tenant: &TenantRef) -> CasalinkResult<User> {
        let identifier = tenant.identifier();
        let user = match tenant {
            TenantRef::Id(id) => self.identities.find_by_id(*id).await,
            TenantRef::Email(email) => self.identities.find_by_email(email).await,
        }
        .map_err(|e| {
            not_found_as(
                e,
                ContractError::TenantNotFound {
                    identifier: identifier.clone(),
                },
            )
        })?;

        if user.role != UserRole::Tenant {
            return Err(ContractError::NotATenant { identifier }.into());
        }
        Ok(user)
    }

    fn action_url(&self, contract_id: Uuid) -> String {
        format!("{}/{}", self.config.action_url_base, contract_id)
    }

    /// Fire-and-forget: a dispatch failure is logged and never fails the
    /// transition that produced it.
    async fn notify(&self, notification: NewNotification) {
        if let Err(error) = self.notifier.enqueue(notification).await {
            warn!(%error, "failed to enqueue notification");
        }
    }
}

/// Resolve which contracting party the caller is, by identity match.
fn party_role(contract: &Contract, caller_id: Uuid) -> Result<PartyRole, ContractError> {
    if contract.owner_id == caller_id {
        Ok(PartyRole::Owner)
    } else if contract.tenant_id == caller_id {
        Ok(PartyRole::Tenant)
    } else {
        Err(ContractError::NotAParty)
    }
}

fn require_owner(
    contract: &Contract,
    caller_id: Uuid,
    operation: &'static str,
) -> Result<(), ContractError> {
    match party_role(contract, caller_id) {
        Ok(PartyRole::Owner) => Ok(()),
        _ => Err(ContractError::OwnerOnly { operation }),
    }
}

fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ContractError> {
    if start < end {
        Ok(())
    } else {
        Err(ContractError::InvertedDateRange)
    }
}

fn validate_amounts(
    monthly_rent: i64,
    charges: Option<i64>,
    deposit: Option<i64>,
) -> Result<(), ContractError> {
    if monthly_rent <= 0 {
        return Err(ContractError::NonPositiveRent);
    }
    if charges.is_some_and(|c| c < 0) {
        return Err(ContractError::NegativeAmount { field: "charges" });
    }
    if deposit.is_some_and(|d| d < 0) {
        return Err(ContractError::NegativeAmount { field: "deposit" });
    }
    Ok(())
}

/// Collapse a store NotFound into a more specific service error; other
/// store failures pass through.
fn not_found_as(err: CasalinkError, specific: ContractError) -> CasalinkError {
    match err {
        CasalinkError::NotFound { .. } => specific.into(),
        other => other,
    }
}
