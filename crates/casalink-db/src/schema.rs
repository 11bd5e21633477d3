//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Lease dates are stored as ISO
//! `YYYY-MM-DD` strings, so lexicographic comparison in queries matches
//! date ordering.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (identity collaborator surface)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD display_name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['OWNER', 'TENANT', 'ADMIN'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Properties (listing collaborator surface)
-- =======================================================================
DEFINE TABLE property SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE property TYPE string;
DEFINE FIELD title ON TABLE property TYPE string;
DEFINE FIELD status ON TABLE property TYPE string \
    ASSERT $value IN ['AVAILABLE', 'OCCUPIED'];
DEFINE FIELD created_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_property_owner ON TABLE property COLUMNS owner_id;

-- =======================================================================
-- Contracts
-- =======================================================================
DEFINE TABLE contract SCHEMAFULL;
DEFINE FIELD property_id ON TABLE contract TYPE string;
DEFINE FIELD tenant_id ON TABLE contract TYPE string;
DEFINE FIELD owner_id ON TABLE contract TYPE string;
DEFINE FIELD start_date ON TABLE contract TYPE string;
DEFINE FIELD end_date ON TABLE contract TYPE string;
DEFINE FIELD monthly_rent ON TABLE contract TYPE int;
DEFINE FIELD charges ON TABLE contract TYPE option<int>;
DEFINE FIELD deposit ON TABLE contract TYPE option<int>;
DEFINE FIELD terms ON TABLE contract TYPE option<string>;
DEFINE FIELD content ON TABLE contract TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD custom_clauses ON TABLE contract TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD owner_signature ON TABLE contract TYPE option<string>;
DEFINE FIELD signed_by_owner ON TABLE contract TYPE option<datetime>;
DEFINE FIELD tenant_signature ON TABLE contract TYPE option<string>;
DEFINE FIELD signed_by_tenant ON TABLE contract TYPE option<datetime>;
DEFINE FIELD signed_at ON TABLE contract TYPE option<datetime>;
DEFINE FIELD status ON TABLE contract TYPE string \
    ASSERT $value IN ['DRAFT', 'SENT', 'SIGNED_OWNER', 'SIGNED_TENANT', \
    'COMPLETED', 'ACTIVE', 'TERMINATED', 'CANCELLED', 'EXPIRED'];
DEFINE FIELD version ON TABLE contract TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE contract TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE contract TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_contract_property ON TABLE contract COLUMNS property_id;
DEFINE INDEX idx_contract_tenant ON TABLE contract COLUMNS tenant_id;
DEFINE INDEX idx_contract_owner ON TABLE contract COLUMNS owner_id;

-- =======================================================================
-- Contract documents (evidentiary attachments)
-- =======================================================================
DEFINE TABLE contract_document SCHEMAFULL;
DEFINE FIELD contract_id ON TABLE contract_document TYPE string;
DEFINE FIELD uploaded_by ON TABLE contract_document TYPE string;
DEFINE FIELD category ON TABLE contract_document TYPE string;
DEFINE FIELD file_name ON TABLE contract_document TYPE string;
DEFINE FIELD file_url ON TABLE contract_document TYPE string;
DEFINE FIELD file_size ON TABLE contract_document TYPE int;
DEFINE FIELD mime_type ON TABLE contract_document TYPE string;
DEFINE FIELD status ON TABLE contract_document TYPE string \
    ASSERT $value IN ['UPLOADED', 'VALIDATED', 'REJECTED'];
DEFINE FIELD rejection_reason ON TABLE contract_document \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE contract_document TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE contract_document TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_document_contract ON TABLE contract_document \
    COLUMNS contract_id;

-- =======================================================================
-- Notifications (outbound queue; delivery is out of scope)
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD recipient_id ON TABLE notification TYPE string;
DEFINE FIELD kind ON TABLE notification TYPE string \
    ASSERT $value IN ['CONTRACT_RECEIVED', 'CONTRACT_SIGNED', \
    'CONTRACT_CANCELLED'];
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD action_url ON TABLE notification TYPE option<string>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_recipient ON TABLE notification \
    COLUMNS recipient_id;
";

/// Apply any pending migrations.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
