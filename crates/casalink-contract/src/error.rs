//! Contract service error types.
//!
//! Each variant maps onto one of the failure categories callers branch on
//! ([`CasalinkError`]): not-found, unauthorized, invalid state, validation,
//! or conflict. Messages are user-presentable; in particular "no such
//! tenant", "wrong role", and "overlapping dates" stay distinguishable
//! because they call for different remediation by the owner.

use casalink_core::error::CasalinkError;
use casalink_core::models::contract::{ContractStatus, PartyRole};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("contract {0} does not exist")]
    ContractNotFound(uuid::Uuid),

    #[error("property {0} does not exist")]
    PropertyNotFound(uuid::Uuid),

    #[error("no tenant account matches '{identifier}'")]
    TenantNotFound { identifier: String },

    #[error("document {0} does not exist")]
    DocumentNotFound(uuid::Uuid),

    #[error("user '{identifier}' exists but is not a tenant account")]
    NotATenant { identifier: String },

    #[error("only the contract owner may {operation}")]
    OwnerOnly { operation: &'static str },

    #[error("caller is neither the owner nor the tenant of this contract")]
    NotAParty,

    #[error("only the uploader may delete a document")]
    UploaderOnly,

    #[error("cannot {operation} a contract in status {status}", status = .status.as_str())]
    InvalidTransition {
        operation: &'static str,
        status: ContractStatus,
    },

    #[error("the {role} has already signed this contract", role = .0.as_str())]
    AlreadySigned(PartyRole),

    #[error("start date must be before end date")]
    InvertedDateRange,

    #[error("monthly rent must be positive")]
    NonPositiveRent,

    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error(
        "property is already under contract for overlapping dates \
         ({start} to {end})"
    )]
    ScheduleOverlap {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("file size {actual} bytes exceeds the {limit} byte limit")]
    FileTooLarge { limit: u64, actual: u64 },

    #[error("a rejection reason is required")]
    MissingRejectionReason,

    #[error("document does not belong to this contract")]
    DocumentContractMismatch,

    #[error(
        "document review is only possible from UPLOADED (current: {status})",
        status = .0.as_str()
    )]
    NotReviewable(casalink_core::models::document::DocumentStatus),

    /// Store-level failure (including compare-and-swap conflicts), passed
    /// through unchanged.
    #[error(transparent)]
    Store(#[from] CasalinkError),
}

impl From<ContractError> for CasalinkError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::ContractNotFound(id) => CasalinkError::NotFound {
                entity: "contract".into(),
                id: id.to_string(),
            },
            ContractError::PropertyNotFound(id) => CasalinkError::NotFound {
                entity: "property".into(),
                id: id.to_string(),
            },
            ContractError::DocumentNotFound(id) => CasalinkError::NotFound {
                entity: "contract_document".into(),
                id: id.to_string(),
            },
            ContractError::TenantNotFound { ref identifier } => CasalinkError::NotFound {
                entity: "tenant".into(),
                id: identifier.clone(),
            },
            ContractError::OwnerOnly { .. }
            | ContractError::NotAParty
            | ContractError::UploaderOnly => CasalinkError::Unauthorized {
                reason: err.to_string(),
            },
            ContractError::InvalidTransition { .. }
            | ContractError::AlreadySigned(_)
            | ContractError::NotReviewable(_) => CasalinkError::InvalidState {
                message: err.to_string(),
            },
            ContractError::NotATenant { .. }
            | ContractError::InvertedDateRange
            | ContractError::NonPositiveRent
            | ContractError::NegativeAmount { .. }
            | ContractError::FileTooLarge { .. }
            | ContractError::MissingRejectionReason
            | ContractError::DocumentContractMismatch => CasalinkError::Validation {
                message: err.to_string(),
            },
            ContractError::ScheduleOverlap { .. } => CasalinkError::Conflict {
                message: err.to_string(),
            },
            ContractError::Store(inner) => inner,
        }
    }
}
