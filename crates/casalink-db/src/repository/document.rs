//! SurrealDB implementation of [`ContractDocumentRepository`].

use casalink_core::error::CasalinkResult;
use casalink_core::models::document::{
    ContractDocument, CreateContractDocument, DocumentStatus,
};
use casalink_core::repository::ContractDocumentRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DocumentRow {
    contract_id: String,
    uploaded_by: String,
    category: String,
    file_name: String,
    file_url: String,
    file_size: u64,
    mime_type: String,
    status: String,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DocumentRowWithId {
    record_id: String,
    contract_id: String,
    uploaded_by: String,
    category: String,
    file_name: String,
    file_url: String,
    file_size: u64,
    mime_type: String,
    status: String,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::CorruptRow {
        entity: "contract_document".into(),
        message: format!("invalid {field} UUID: {e}"),
    })
}

fn parse_status(s: &str) -> Result<DocumentStatus, DbError> {
    DocumentStatus::parse(s).ok_or_else(|| DbError::CorruptRow {
        entity: "contract_document".into(),
        message: format!("unknown document status: {s}"),
    })
}

impl DocumentRow {
    fn into_document(self, id: Uuid) -> Result<ContractDocument, DbError> {
        Ok(ContractDocument {
            id,
            contract_id: parse_uuid("contract_id", &self.contract_id)?,
            uploaded_by: parse_uuid("uploaded_by", &self.uploaded_by)?,
            category: self.category,
            file_name: self.file_name,
            file_url: self.file_url,
            file_size: self.file_size,
            mime_type: self.mime_type,
            status: parse_status(&self.status)?,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DocumentRowWithId {
    fn try_into_document(self) -> Result<ContractDocument, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(ContractDocument {
            id,
            contract_id: parse_uuid("contract_id", &self.contract_id)?,
            uploaded_by: parse_uuid("uploaded_by", &self.uploaded_by)?,
            category: self.category,
            file_name: self.file_name,
            file_url: self.file_url,
            file_size: self.file_size,
            mime_type: self.mime_type,
            status: parse_status(&self.status)?,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the ContractDocument repository.
#[derive(Clone)]
pub struct SurrealContractDocumentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealContractDocumentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ContractDocumentRepository for SurrealContractDocumentRepository<C> {
    async fn create(&self, input: CreateContractDocument) -> CasalinkResult<ContractDocument> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('contract_document', $id) SET \
                 contract_id = $contract_id, \
                 uploaded_by = $uploaded_by, \
                 category = $category, \
                 file_name = $file_name, file_url = $file_url, \
                 file_size = $file_size, mime_type = $mime_type, \
                 status = $status, rejection_reason = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("contract_id", input.contract_id.to_string()))
            .bind(("uploaded_by", input.uploaded_by.to_string()))
            .bind(("category", input.category))
            .bind(("file_name", input.file_name))
            .bind(("file_url", input.file_url))
            .bind(("file_size", input.file_size))
            .bind(("mime_type", input.mime_type))
            .bind(("status", DocumentStatus::Uploaded.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contract_document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CasalinkResult<ContractDocument> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('contract_document', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contract_document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn list_by_contract(&self, contract_id: Uuid) -> CasalinkResult<Vec<ContractDocument>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM contract_document \
                 WHERE contract_id = $contract_id \
                 ORDER BY created_at DESC",
            )
            .bind(("contract_id", contract_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        let documents = rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(documents)
    }

    async fn set_review_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        rejection_reason: Option<String>,
    ) -> CasalinkResult<ContractDocument> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('contract_document', $id) SET \
                 status = $status, \
                 rejection_reason = $rejection_reason, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .bind(("rejection_reason", rejection_reason))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contract_document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn delete(&self, id: Uuid) -> CasalinkResult<()> {
        self.db
            .query("DELETE type::record('contract_document', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
