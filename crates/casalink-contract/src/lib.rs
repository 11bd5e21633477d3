//! CASALINK Contract — the rental-contract lifecycle core.
//!
//! Owns the contract state machine (draft, send, dual-sign, activate,
//! terminate, cancel), the tamper-evident signature audit metadata, and
//! the evidentiary-document sub-registry. Generic over the `casalink-core`
//! repository traits so it carries no database dependency.

pub mod config;
pub mod documents;
pub mod error;
pub mod service;
pub mod signature;

pub use config::ContractConfig;
pub use documents::{ContractDocumentService, UploadFile};
pub use error::ContractError;
pub use service::{
    ContractDetails, ContractService, CreateContractInput, TenantRef, UpdateContractTerms,
};
pub use signature::SignatureProvenance;
