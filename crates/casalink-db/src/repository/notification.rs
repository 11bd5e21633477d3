//! SurrealDB-backed notification queue.
//!
//! Stores outbound notifications as rows; a delivery worker (out of scope)
//! drains the table. Implements [`NotificationDispatcher`].

use casalink_core::error::CasalinkResult;
use casalink_core::models::notification::{NewNotification, Notification, NotificationKind};
use casalink_core::repository::NotificationDispatcher;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    recipient_id: String,
    kind: String,
    title: String,
    message: String,
    action_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let corrupt = |message: String| DbError::CorruptRow {
            entity: "notification".into(),
            message,
        };
        Ok(Notification {
            id: Uuid::parse_str(&self.record_id)
                .map_err(|e| corrupt(format!("invalid UUID: {e}")))?,
            recipient_id: Uuid::parse_str(&self.recipient_id)
                .map_err(|e| corrupt(format!("invalid recipient UUID: {e}")))?,
            kind: NotificationKind::parse(&self.kind)
                .ok_or_else(|| corrupt(format!("unknown kind: {}", self.kind)))?,
            title: self.title,
            message: self.message,
            action_url: self.action_url,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Notification dispatcher.
#[derive(Clone)]
pub struct SurrealNotificationDispatcher<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationDispatcher<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Pending notifications for a recipient, newest first. Used by tests
    /// and by the (out-of-scope) delivery worker.
    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> CasalinkResult<Vec<Notification>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE recipient_id = $recipient_id \
                 ORDER BY created_at DESC",
            )
            .bind(("recipient_id", recipient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let notifications = rows
            .into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(notifications)
    }
}

impl<C: Connection> NotificationDispatcher for SurrealNotificationDispatcher<C> {
    async fn enqueue(&self, notification: NewNotification) -> CasalinkResult<()> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('notification', $id) SET \
                 recipient_id = $recipient_id, kind = $kind, \
                 title = $title, message = $message, \
                 action_url = $action_url",
            )
            .bind(("id", id.to_string()))
            .bind(("recipient_id", notification.recipient_id.to_string()))
            .bind(("kind", notification.kind.as_str().to_string()))
            .bind(("title", notification.title))
            .bind(("message", notification.message))
            .bind(("action_url", notification.action_url))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }
}
