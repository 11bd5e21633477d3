//! SurrealDB implementation of [`ContractRepository`].
//!
//! All mutating queries are compare-and-swap on the record's `version`
//! counter (`WHERE version = $expected`). Lease dates are ISO `YYYY-MM-DD`
//! strings, so the overlap query compares them lexicographically.

use casalink_core::error::CasalinkResult;
use casalink_core::models::contract::{
    Contract, ContractContent, ContractStatus, CreateContract, UpdateContract,
};
use casalink_core::models::property::PropertyStatus;
use casalink_core::repository::{
    ContractFilter, ContractRepository, ContractSortField, PageRequest, PaginatedResult,
    SortOrder, StatsPerspective, StatusCount,
};
use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FMT: &str = "%Y-%m-%d";

/// Marker thrown inside the contract+property transaction when the
/// compare-and-swap fails, so the property write rolls back with it.
const STALE_VERSION_MARKER: &str = "casalink: stale contract version";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ContractRow {
    property_id: String,
    tenant_id: String,
    owner_id: String,
    start_date: String,
    end_date: String,
    monthly_rent: i64,
    charges: Option<i64>,
    deposit: Option<i64>,
    terms: Option<String>,
    content: serde_json::Value,
    custom_clauses: serde_json::Value,
    owner_signature: Option<String>,
    signed_by_owner: Option<DateTime<Utc>>,
    tenant_signature: Option<String>,
    signed_by_tenant: Option<DateTime<Utc>>,
    signed_at: Option<DateTime<Utc>>,
    status: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ContractRowWithId {
    record_id: String,
    property_id: String,
    tenant_id: String,
    owner_id: String,
    start_date: String,
    end_date: String,
    monthly_rent: i64,
    charges: Option<i64>,
    deposit: Option<i64>,
    terms: Option<String>,
    content: serde_json::Value,
    custom_clauses: serde_json::Value,
    owner_signature: Option<String>,
    signed_by_owner: Option<DateTime<Utc>>,
    tenant_signature: Option<String>,
    signed_by_tenant: Option<DateTime<Utc>>,
    signed_at: Option<DateTime<Utc>>,
    status: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::CorruptRow {
        entity: "contract".into(),
        message: format!("invalid {field} UUID: {e}"),
    })
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FMT).map_err(|e| DbError::CorruptRow {
        entity: "contract".into(),
        message: format!("invalid {field}: {e}"),
    })
}

fn parse_status(s: &str) -> Result<ContractStatus, DbError> {
    ContractStatus::parse(s).ok_or_else(|| DbError::CorruptRow {
        entity: "contract".into(),
        message: format!("unknown contract status: {s}"),
    })
}

fn parse_content(value: serde_json::Value) -> Result<ContractContent, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::CorruptRow {
        entity: "contract".into(),
        message: format!("invalid content envelope: {e}"),
    })
}

impl ContractRow {
    fn into_contract(self, id: Uuid) -> Result<Contract, DbError> {
        Ok(Contract {
            id,
            property_id: parse_uuid("property_id", &self.property_id)?,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            owner_id: parse_uuid("owner_id", &self.owner_id)?,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            monthly_rent: self.monthly_rent,
            charges: self.charges,
            deposit: self.deposit,
            terms: self.terms,
            content: parse_content(self.content)?,
            custom_clauses: self.custom_clauses,
            owner_signature: self.owner_signature,
            signed_by_owner: self.signed_by_owner,
            tenant_signature: self.tenant_signature,
            signed_by_tenant: self.signed_by_tenant,
            signed_at: self.signed_at,
            status: parse_status(&self.status)?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ContractRowWithId {
    fn try_into_contract(self) -> Result<Contract, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Contract {
            id,
            property_id: parse_uuid("property_id", &self.property_id)?,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            owner_id: parse_uuid("owner_id", &self.owner_id)?,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            monthly_rent: self.monthly_rent,
            charges: self.charges,
            deposit: self.deposit,
            terms: self.terms,
            content: parse_content(self.content)?,
            custom_clauses: self.custom_clauses,
            owner_signature: self.owner_signature,
            signed_by_owner: self.signed_by_owner,
            tenant_signature: self.tenant_signature,
            signed_by_tenant: self.signed_by_tenant,
            signed_at: self.signed_at,
            status: parse_status(&self.status)?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for per-status aggregation.
#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    total: u64,
}

/// Mutable SET fragments and their binds for a partial contract update.
struct UpdateSets {
    sets: Vec<&'static str>,
    input: UpdateContract,
}

fn update_sets(input: UpdateContract) -> UpdateSets {
    let mut sets = Vec::new();
    if input.start_date.is_some() {
        sets.push("start_date = $start_date");
    }
    if input.end_date.is_some() {
        sets.push("end_date = $end_date");
    }
    if input.monthly_rent.is_some() {
        sets.push("monthly_rent = $monthly_rent");
    }
    match input.charges {
        Some(Some(_)) => sets.push("charges = $charges"),
        Some(None) => sets.push("charges = NONE"),
        None => {}
    }
    match input.deposit {
        Some(Some(_)) => sets.push("deposit = $deposit"),
        Some(None) => sets.push("deposit = NONE"),
        None => {}
    }
    match &input.terms {
        Some(Some(_)) => sets.push("terms = $terms"),
        Some(None) => sets.push("terms = NONE"),
        None => {}
    }
    if input.content.is_some() {
        sets.push("content = $content");
    }
    if input.custom_clauses.is_some() {
        sets.push("custom_clauses = $custom_clauses");
    }
    if input.status.is_some() {
        sets.push("status = $status");
    }
    if input.owner_signature.is_some() {
        sets.push("owner_signature = $owner_signature");
    }
    if input.signed_by_owner.is_some() {
        sets.push("signed_by_owner = $signed_by_owner");
    }
    if input.tenant_signature.is_some() {
        sets.push("tenant_signature = $tenant_signature");
    }
    if input.signed_by_tenant.is_some() {
        sets.push("signed_by_tenant = $signed_by_tenant");
    }
    if input.signed_at.is_some() {
        sets.push("signed_at = $signed_at");
    }
    sets.push("version += 1");
    sets.push("updated_at = time::now()");
    UpdateSets { sets, input }
}

fn sort_column(field: ContractSortField) -> &'static str {
    match field {
        ContractSortField::CreatedAt => "created_at",
        ContractSortField::UpdatedAt => "updated_at",
        ContractSortField::StartDate => "start_date",
        ContractSortField::MonthlyRent => "monthly_rent",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Chains the bind calls for a partial contract update onto a query
/// builder. A macro keeps the builder's type inferred while letting the
/// two CAS queries share one bind list.
macro_rules! bind_update {
    ($builder:ident, $input:ident) => {{
        let mut builder = $builder;
        if let Some(start) = $input.start_date {
            builder = builder.bind(("start_date", start.format(DATE_FMT).to_string()));
        }
        if let Some(end) = $input.end_date {
            builder = builder.bind(("end_date", end.format(DATE_FMT).to_string()));
        }
        if let Some(rent) = $input.monthly_rent {
            builder = builder.bind(("monthly_rent", rent));
        }
        if let Some(Some(charges)) = $input.charges {
            builder = builder.bind(("charges", charges));
        }
        if let Some(Some(deposit)) = $input.deposit {
            builder = builder.bind(("deposit", deposit));
        }
        if let Some(Some(terms)) = $input.terms {
            builder = builder.bind(("terms", terms));
        }
        if let Some(content) = $input.content {
            let value = serde_json::to_value(&content).map_err(|e| DbError::CorruptRow {
                entity: "contract".into(),
                message: format!("unserializable content envelope: {e}"),
            })?;
            builder = builder.bind(("content", value));
        }
        if let Some(clauses) = $input.custom_clauses {
            builder = builder.bind(("custom_clauses", clauses));
        }
        if let Some(status) = $input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(sig) = $input.owner_signature {
            builder = builder.bind(("owner_signature", sig));
        }
        if let Some(ts) = $input.signed_by_owner {
            builder = builder.bind(("signed_by_owner", ts));
        }
        if let Some(sig) = $input.tenant_signature {
            builder = builder.bind(("tenant_signature", sig));
        }
        if let Some(ts) = $input.signed_by_tenant {
            builder = builder.bind(("signed_by_tenant", ts));
        }
        if let Some(ts) = $input.signed_at {
            builder = builder.bind(("signed_at", ts));
        }
        builder
    }};
}

/// SurrealDB implementation of the Contract repository.
#[derive(Clone)]
pub struct SurrealContractRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealContractRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// An empty CAS result means either the record is gone or the version
    /// is stale; re-read to tell the two apart.
    async fn stale_or_missing(&self, id: Uuid, expected_version: u64) -> DbError {
        let id_str = id.to_string();
        match ContractRepository::get_by_id(self, id).await {
            Ok(_) => DbError::StaleVersion {
                entity: "contract".into(),
                id: id_str,
                expected: expected_version,
            },
            Err(_) => DbError::NotFound {
                entity: "contract".into(),
                id: id_str,
            },
        }
    }
}

impl<C: Connection> ContractRepository for SurrealContractRepository<C> {
    async fn create(&self, input: CreateContract) -> CasalinkResult<Contract> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let content = input.content.unwrap_or_default();
        let content_value = serde_json::to_value(&content).map_err(|e| DbError::CorruptRow {
            entity: "contract".into(),
            message: format!("unserializable content envelope: {e}"),
        })?;
        let custom_clauses = input
            .custom_clauses
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let mut builder = self
            .db
            .query(
                "CREATE type::record('contract', $id) SET \
                 property_id = $property_id, \
                 tenant_id = $tenant_id, owner_id = $owner_id, \
                 start_date = $start_date, end_date = $end_date, \
                 monthly_rent = $monthly_rent, \
                 charges = $charges, deposit = $deposit, terms = $terms, \
                 content = $content, custom_clauses = $custom_clauses, \
                 owner_signature = NONE, signed_by_owner = NONE, \
                 tenant_signature = NONE, signed_by_tenant = NONE, \
                 signed_at = NONE, \
                 status = $status, version = 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("property_id", input.property_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("start_date", input.start_date.format(DATE_FMT).to_string()))
            .bind(("end_date", input.end_date.format(DATE_FMT).to_string()))
            .bind(("monthly_rent", input.monthly_rent))
            .bind(("content", content_value))
            .bind(("custom_clauses", custom_clauses))
            .bind(("status", ContractStatus::Draft.as_str().to_string()));

        builder = builder.bind(("charges", input.charges));
        builder = builder.bind(("deposit", input.deposit));
        builder = builder.bind(("terms", input.terms));

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ContractRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contract".into(),
            id: id_str,
        })?;

        Ok(row.into_contract(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CasalinkResult<Contract> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('contract', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ContractRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contract".into(),
            id: id_str,
        })?;

        Ok(row.into_contract(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateContract,
    ) -> CasalinkResult<Contract> {
        let UpdateSets { sets, input } = update_sets(input);

        let query = format!(
            "UPDATE type::record('contract', $id) SET {} \
             WHERE version = $expected_version RETURN AFTER",
            sets.join(", ")
        );

        let builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("expected_version", expected_version));
        let builder = bind_update!(builder, input);

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ContractRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_contract(id)?),
            None => Err(self.stale_or_missing(id, expected_version).await.into()),
        }
    }

    async fn update_with_property(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateContract,
        property_id: Uuid,
        property_status: PropertyStatus,
    ) -> CasalinkResult<Contract> {
        let UpdateSets { sets, input } = update_sets(input);

        let query = format!(
            "BEGIN TRANSACTION; \
             LET $updated = (UPDATE type::record('contract', $id) SET {} \
             WHERE version = $expected_version RETURN AFTER); \
             IF array::len($updated) == 0 {{ THROW '{STALE_VERSION_MARKER}' }}; \
             UPDATE type::record('property', $prop_id) SET \
             status = $prop_status, updated_at = time::now(); \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("expected_version", expected_version))
            .bind(("prop_id", property_id.to_string()))
            .bind(("prop_status", property_status.as_str().to_string()));
        let builder = bind_update!(builder, input);

        let mut result = builder.await.map_err(DbError::from)?;

        // A THROW cancels the whole transaction; every statement then
        // reports an error, so scan them all for the marker.
        let errors = result.take_errors();
        if !errors.is_empty() {
            if errors
                .values()
                .any(|e| e.to_string().contains(STALE_VERSION_MARKER))
            {
                return Err(self.stale_or_missing(id, expected_version).await.into());
            }
            let mut errors = errors.into_iter().collect::<Vec<_>>();
            errors.sort_by_key(|(index, _)| *index);
            let (_, first) = errors.swap_remove(0);
            return Err(DbError::Surreal(first).into());
        }

        ContractRepository::get_by_id(self, id).await
    }

    async fn delete(&self, id: Uuid) -> CasalinkResult<()> {
        self.db
            .query("DELETE type::record('contract', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: ContractFilter,
        page: PageRequest,
    ) -> CasalinkResult<PaginatedResult<Contract>> {
        let mut conditions = Vec::new();
        if filter.property_id.is_some() {
            conditions.push("property_id = $property_id");
        }
        if filter.tenant_id.is_some() {
            conditions.push("tenant_id = $tenant_id");
        }
        if filter.owner_id.is_some() {
            conditions.push("owner_id = $owner_id");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM contract{where_clause} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(property_id) = filter.property_id {
            count_builder = count_builder.bind(("property_id", property_id.to_string()));
        }
        if let Some(tenant_id) = filter.tenant_id {
            count_builder = count_builder.bind(("tenant_id", tenant_id.to_string()));
        }
        if let Some(owner_id) = filter.owner_id {
            count_builder = count_builder.bind(("owner_id", owner_id.to_string()));
        }
        if let Some(status) = filter.status {
            count_builder = count_builder.bind(("status", status.as_str().to_string()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM contract{where_clause} \
             ORDER BY {} {} LIMIT $limit START $offset",
            sort_column(page.sort_by),
            sort_direction(page.sort_order),
        );
        let mut builder = self
            .db
            .query(&list_query)
            .bind(("limit", page.limit))
            .bind(("offset", page.offset()));
        if let Some(property_id) = filter.property_id {
            builder = builder.bind(("property_id", property_id.to_string()));
        }
        if let Some(tenant_id) = filter.tenant_id {
            builder = builder.bind(("tenant_id", tenant_id.to_string()));
        }
        if let Some(owner_id) = filter.owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<ContractRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_contract())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn find_overlapping(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CasalinkResult<Vec<Contract>> {
        let claiming: Vec<String> = [
            ContractStatus::Draft,
            ContractStatus::Sent,
            ContractStatus::SignedOwner,
            ContractStatus::SignedTenant,
            ContractStatus::Completed,
            ContractStatus::Active,
        ]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

        // Inclusive interval test; ISO date strings compare like dates.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM contract \
                 WHERE property_id = $property_id \
                 AND status IN $statuses \
                 AND start_date <= $end AND end_date >= $start \
                 ORDER BY start_date ASC",
            )
            .bind(("property_id", property_id.to_string()))
            .bind(("statuses", claiming))
            .bind(("start", start.format(DATE_FMT).to_string()))
            .bind(("end", end.format(DATE_FMT).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ContractRowWithId> = result.take(0).map_err(DbError::from)?;
        let contracts = rows
            .into_iter()
            .map(|row| row.try_into_contract())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(contracts)
    }

    async fn status_counts(
        &self,
        subject_id: Uuid,
        perspective: StatsPerspective,
    ) -> CasalinkResult<Vec<StatusCount>> {
        let column = match perspective {
            StatsPerspective::Owner => "owner_id",
            StatsPerspective::Tenant => "tenant_id",
        };

        let query = format!(
            "SELECT status, count() AS total FROM contract \
             WHERE {column} = $subject GROUP BY status"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("subject", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;
        let counts = rows
            .into_iter()
            .map(|row| {
                Ok(StatusCount {
                    status: parse_status(&row.status)?,
                    count: row.total,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(counts)
    }
}
