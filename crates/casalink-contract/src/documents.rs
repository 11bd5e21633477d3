//! Evidentiary document registry for contracts.
//!
//! Either contracting party can attach identity/income proofs to a
//! contract; an administrative reviewer validates or rejects them. File
//! transport is out of scope: uploads arrive as an opaque `file_url`
//! produced by the external file store.

use casalink_core::error::CasalinkResult;
use casalink_core::models::document::{
    ContractDocument, CreateContractDocument, DocumentStatus,
};
use casalink_core::repository::{ContractDocumentRepository, ContractRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::ContractConfig;
use crate::error::ContractError;

/// Upload descriptor, as received from the API layer.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub category: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub mime_type: String,
}

/// Contract document registry service.
pub struct ContractDocumentService<C, D>
where
    C: ContractRepository,
    D: ContractDocumentRepository,
{
    contracts: C,
    documents: D,
    config: ContractConfig,
}

impl<C, D> ContractDocumentService<C, D>
where
    C: ContractRepository,
    D: ContractDocumentRepository,
{
    pub fn new(contracts: C, documents: D, config: ContractConfig) -> Self {
        Self {
            contracts,
            documents,
            config,
        }
    }

    /// All documents for a contract, most recent first.
    pub async fn list(&self, contract_id: Uuid) -> CasalinkResult<Vec<ContractDocument>> {
        // Surface a NotFound for dangling contract ids rather than an
        // empty list.
        self.contracts.get_by_id(contract_id).await?;
        self.documents.list_by_contract(contract_id).await
    }

    /// Attach a document. Caller must be the contract's owner or tenant;
    /// the file must fit the configured size limit.
    pub async fn upload(
        &self,
        contract_id: Uuid,
        caller_id: Uuid,
        file: UploadFile,
    ) -> CasalinkResult<ContractDocument> {
        let contract = self.contracts.get_by_id(contract_id).await?;
        if contract.owner_id != caller_id && contract.tenant_id != caller_id {
            return Err(ContractError::NotAParty.into());
        }

        let limit = self.config.max_document_size_bytes;
        if file.size > limit {
            return Err(ContractError::FileTooLarge {
                limit,
                actual: file.size,
            }
            .into());
        }

        let document = self
            .documents
            .create(CreateContractDocument {
                contract_id,
                uploaded_by: caller_id,
                category: file.category,
                file_name: file.name,
                file_url: file.url,
                file_size: file.size,
                mime_type: file.mime_type,
            })
            .await?;

        info!(
            contract_id = %contract_id,
            document_id = %document.id,
            size = document.file_size,
            "document uploaded"
        );

        Ok(document)
    }

    /// Delete a document. Only the original uploader may delete, and the
    /// document must belong to the given contract (guards against
    /// cross-contract id confusion).
    pub async fn delete(
        &self,
        contract_id: Uuid,
        document_id: Uuid,
        caller_id: Uuid,
    ) -> CasalinkResult<()> {
        let document = self.fetch_for_contract(contract_id, document_id).await?;
        if document.uploaded_by != caller_id {
            return Err(ContractError::UploaderOnly.into());
        }
        self.documents.delete(document_id).await
    }

    /// Administrative review: Uploaded → Validated. Clears any prior
    /// rejection reason. Authorization is the caller layer's concern.
    pub async fn validate(
        &self,
        contract_id: Uuid,
        document_id: Uuid,
    ) -> CasalinkResult<ContractDocument> {
        let document = self.fetch_for_contract(contract_id, document_id).await?;
        if document.status != DocumentStatus::Uploaded {
            return Err(ContractError::NotReviewable(document.status).into());
        }
        self.documents
            .set_review_status(document_id, DocumentStatus::Validated, None)
            .await
    }

    /// Administrative review: Uploaded → Rejected, reason required.
    pub async fn reject(
        &self,
        contract_id: Uuid,
        document_id: Uuid,
        reason: String,
    ) -> CasalinkResult<ContractDocument> {
        if reason.trim().is_empty() {
            return Err(ContractError::MissingRejectionReason.into());
        }
        let document = self.fetch_for_contract(contract_id, document_id).await?;
        if document.status != DocumentStatus::Uploaded {
            return Err(ContractError::NotReviewable(document.status).into());
        }
        self.documents
            .set_review_status(document_id, DocumentStatus::Rejected, Some(reason))
            .await
    }

    async fn fetch_for_contract(
        &self,
        contract_id: Uuid,
        document_id: Uuid,
    ) -> CasalinkResult<ContractDocument> {
        let document = self.documents.get_by_id(document_id).await?;
        if document.contract_id != contract_id {
            return Err(ContractError::DocumentContractMismatch.into());
        }
        Ok(document)
    }
}
