//! Integration tests for the identity, property, document, and
//! notification stores using in-memory SurrealDB.

use casalink_core::error::CasalinkError;
use casalink_core::models::document::{CreateContractDocument, DocumentStatus};
use casalink_core::models::notification::{NewNotification, NotificationKind};
use casalink_core::models::property::{CreateProperty, PropertyStatus};
use casalink_core::models::user::{CreateUser, UserRole};
use casalink_core::repository::{
    ContractDocumentRepository, IdentityStore, NotificationDispatcher, PropertyStore,
};
use casalink_db::repository::{
    SurrealContractDocumentRepository, SurrealIdentityStore, SurrealNotificationDispatcher,
    SurrealPropertyStore,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    casalink_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn identity_store_finds_by_id_and_email() {
    let db = setup().await;
    let store = SurrealIdentityStore::new(db);

    let user = store
        .create(CreateUser {
            email: "alice@example.com".into(),
            display_name: "Alice".into(),
            role: UserRole::Tenant,
        })
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Tenant);

    let by_id = store.find_by_id(user.id).await.unwrap();
    assert_eq!(by_id.email, "alice@example.com");

    let by_email = store.find_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);

    let err = store.find_by_email("missing@example.com").await.unwrap_err();
    assert!(matches!(err, CasalinkError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn property_store_flips_status() {
    let db = setup().await;
    let store = SurrealPropertyStore::new(db);

    let property = store
        .create(CreateProperty {
            owner_id: Uuid::new_v4(),
            title: "Attic".into(),
        })
        .await
        .unwrap();
    assert_eq!(property.status, PropertyStatus::Available);

    let occupied = store
        .set_status(property.id, PropertyStatus::Occupied)
        .await
        .unwrap();
    assert_eq!(occupied.status, PropertyStatus::Occupied);

    let err = store
        .set_status(Uuid::new_v4(), PropertyStatus::Occupied)
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn document_repository_review_and_delete() {
    let db = setup().await;
    let repo = SurrealContractDocumentRepository::new(db);
    let contract_id = Uuid::new_v4();

    let document = repo
        .create(CreateContractDocument {
            contract_id,
            uploaded_by: Uuid::new_v4(),
            category: "identity_proof".into(),
            file_name: "card.png".into(),
            file_url: "s3://bucket/card.png".into(),
            file_size: 512,
            mime_type: "image/png".into(),
        })
        .await
        .unwrap();
    assert_eq!(document.status, DocumentStatus::Uploaded);

    let rejected = repo
        .set_review_status(
            document.id,
            DocumentStatus::Rejected,
            Some("blurred scan".into()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, DocumentStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("blurred scan"));

    // Validating clears the stored reason.
    let validated = repo
        .set_review_status(document.id, DocumentStatus::Validated, None)
        .await
        .unwrap();
    assert_eq!(validated.status, DocumentStatus::Validated);
    assert!(validated.rejection_reason.is_none());

    let listed = repo.list_by_contract(contract_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    repo.delete(document.id).await.unwrap();
    assert!(repo.list_by_contract(contract_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn notification_dispatcher_stores_rows() {
    let db = setup().await;
    let dispatcher = SurrealNotificationDispatcher::new(db);
    let recipient = Uuid::new_v4();

    dispatcher
        .enqueue(NewNotification {
            recipient_id: recipient,
            kind: NotificationKind::ContractReceived,
            title: "Contract received".into(),
            message: "A rental contract is awaiting your signature.".into(),
            action_url: Some("/contracts/abc".into()),
        })
        .await
        .unwrap();

    let inbox = dispatcher.list_for_recipient(recipient).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::ContractReceived);
    assert_eq!(inbox[0].action_url.as_deref(), Some("/contracts/abc"));

    // Someone else's inbox stays empty.
    let other = dispatcher
        .list_for_recipient(Uuid::new_v4())
        .await
        .unwrap();
    assert!(other.is_empty());
}
