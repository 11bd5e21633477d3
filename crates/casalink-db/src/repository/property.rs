//! SurrealDB implementation of [`PropertyStore`].

use casalink_core::error::CasalinkResult;
use casalink_core::models::property::{CreateProperty, Property, PropertyStatus};
use casalink_core::repository::PropertyStore;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PropertyRow {
    owner_id: String,
    title: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<PropertyStatus, DbError> {
    PropertyStatus::parse(s).ok_or_else(|| DbError::CorruptRow {
        entity: "property".into(),
        message: format!("unknown property status: {s}"),
    })
}

impl PropertyRow {
    fn into_property(self, id: Uuid) -> Result<Property, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id).map_err(|e| DbError::CorruptRow {
            entity: "property".into(),
            message: format!("invalid owner_id UUID: {e}"),
        })?;
        Ok(Property {
            id,
            owner_id,
            title: self.title,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Property store.
#[derive(Clone)]
pub struct SurrealPropertyStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPropertyStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PropertyStore for SurrealPropertyStore<C> {
    async fn create(&self, input: CreateProperty) -> CasalinkResult<Property> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('property', $id) SET \
                 owner_id = $owner_id, title = $title, status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("title", input.title))
            .bind(("status", PropertyStatus::Available.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }

    async fn find_by_id(&self, id: Uuid) -> CasalinkResult<Property> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('property', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }

    async fn set_status(&self, id: Uuid, status: PropertyStatus) -> CasalinkResult<Property> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('property', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }
}
