//! Integration tests for the contract lifecycle service.

use casalink_contract::service::UpdateContractTerms;
use casalink_contract::{
    ContractConfig, ContractService, CreateContractInput, SignatureProvenance, TenantRef,
};
use casalink_core::error::CasalinkError;
use casalink_core::models::contract::ContractStatus;
use casalink_core::models::property::{CreateProperty, Property, PropertyStatus};
use casalink_core::models::user::{CreateUser, User, UserRole};
use casalink_core::repository::{
    ContractFilter, ContractRepository, IdentityStore, PageRequest, PropertyStore,
    StatsPerspective,
};
use casalink_db::repository::{
    SurrealContractRepository, SurrealIdentityStore, SurrealNotificationDispatcher,
    SurrealPropertyStore,
};
use chrono::NaiveDate;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = ContractService<
    SurrealContractRepository<Db>,
    SurrealPropertyStore<Db>,
    SurrealIdentityStore<Db>,
    SurrealNotificationDispatcher<Db>,
>;

struct TestEnv {
    svc: Service,
    contracts: SurrealContractRepository<Db>,
    properties: SurrealPropertyStore<Db>,
    notifications: SurrealNotificationDispatcher<Db>,
    identities: SurrealIdentityStore<Db>,
    owner: User,
    tenant: User,
    property: Property,
}

/// Spin up in-memory DB, run migrations, seed an owner, a tenant, and a
/// property owned by the owner.
async fn setup() -> TestEnv {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    casalink_db::run_migrations(&db).await.unwrap();

    let identities = SurrealIdentityStore::new(db.clone());
    let owner = identities
        .create(CreateUser {
            email: "owner@example.com".into(),
            display_name: "Olive Owner".into(),
            role: UserRole::Owner,
        })
        .await
        .unwrap();
    let tenant = identities
        .create(CreateUser {
            email: "t@x.com".into(),
            display_name: "Theo Tenant".into(),
            role: UserRole::Tenant,
        })
        .await
        .unwrap();

    let properties = SurrealPropertyStore::new(db.clone());
    let property = properties
        .create(CreateProperty {
            owner_id: owner.id,
            title: "Garden flat".into(),
        })
        .await
        .unwrap();

    let contracts = SurrealContractRepository::new(db.clone());
    let notifications = SurrealNotificationDispatcher::new(db.clone());

    let svc = ContractService::new(
        contracts.clone(),
        properties.clone(),
        identities.clone(),
        notifications.clone(),
        ContractConfig::default(),
    );

    TestEnv {
        svc,
        contracts,
        properties,
        notifications,
        identities,
        owner,
        tenant,
        property,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn year_lease(env: &TestEnv) -> CreateContractInput {
    CreateContractInput {
        property_id: env.property.id,
        tenant: TenantRef::Id(env.tenant.id),
        start_date: date(2025, 3, 1),
        end_date: date(2026, 3, 1),
        monthly_rent: 90_000,
        charges: Some(5_000),
        deposit: Some(180_000),
        terms: Some("Standard unfurnished lease".into()),
        content: None,
        custom_clauses: None,
    }
}

// -----------------------------------------------------------------------
// Creation
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_is_draft_with_unset_signatures() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();

    let fetched = env.svc.get(details.contract.id).await.unwrap();
    let contract = fetched.contract;
    assert_eq!(contract.status, ContractStatus::Draft);
    assert!(contract.signed_by_owner.is_none());
    assert!(contract.signed_by_tenant.is_none());
    assert!(contract.signed_at.is_none());
    assert!(contract.owner_signature.is_none());
    assert!(contract.tenant_signature.is_none());
    assert_eq!(fetched.property.id, env.property.id);
    assert_eq!(fetched.owner.id, env.owner.id);
    assert_eq!(fetched.tenant.email, "t@x.com");
}

#[tokio::test]
async fn create_rejects_inverted_or_empty_date_range() {
    let env = setup().await;

    let mut input = year_lease(&env);
    input.start_date = date(2026, 3, 1);
    input.end_date = date(2025, 3, 1);
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Validation { .. }), "{err}");

    let mut input = year_lease(&env);
    input.end_date = input.start_date;
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Validation { .. }), "{err}");
}

#[tokio::test]
async fn create_rejects_non_positive_rent() {
    let env = setup().await;
    let mut input = year_lease(&env);
    input.monthly_rent = 0;
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Validation { .. }), "{err}");
}

#[tokio::test]
async fn create_resolves_tenant_by_email() {
    let env = setup().await;
    let mut input = year_lease(&env);
    input.tenant = TenantRef::Email("t@x.com".into());
    let details = env.svc.create(env.owner.id, input).await.unwrap();
    assert_eq!(details.contract.tenant_id, env.tenant.id);
}

#[tokio::test]
async fn create_distinguishes_missing_tenant_from_wrong_role() {
    let env = setup().await;

    // No such tenant.
    let mut input = year_lease(&env);
    input.tenant = TenantRef::Email("nobody@x.com".into());
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::NotFound { .. }), "{err}");

    // Scenario C: identity exists but holds the owner role.
    let other_owner = env
        .identities
        .create(CreateUser {
            email: "o2@x.com".into(),
            display_name: "Second Owner".into(),
            role: UserRole::Owner,
        })
        .await
        .unwrap();
    let mut input = year_lease(&env);
    input.tenant = TenantRef::Id(other_owner.id);
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Validation { .. }), "{err}");
    assert!(err.to_string().contains("not a tenant"), "{err}");

    // Neither failure created a contract.
    let page = env
        .svc
        .list(ContractFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn create_requires_property_ownership() {
    let env = setup().await;
    let stranger = Uuid::new_v4();
    let err = env.svc.create(stranger, year_lease(&env)).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Unauthorized { .. }), "{err}");
}

#[tokio::test]
async fn create_rejects_missing_property() {
    let env = setup().await;
    let mut input = year_lease(&env);
    input.property_id = Uuid::new_v4();
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::NotFound { .. }), "{err}");
}

// -----------------------------------------------------------------------
// Overlap guard
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_rejects_overlapping_date_range() {
    let env = setup().await;
    env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();

    // Strictly inside the existing range.
    let mut input = year_lease(&env);
    input.start_date = date(2025, 6, 1);
    input.end_date = date(2025, 9, 1);
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Conflict { .. }), "{err}");
    assert!(err.to_string().contains("overlapping"), "{err}");
}

#[tokio::test]
async fn create_overlap_boundary_is_inclusive() {
    let env = setup().await;
    env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();

    // New range starts exactly on the existing range's end date: the
    // interval test is inclusive on both boundaries, so this conflicts.
    let mut input = year_lease(&env);
    input.start_date = date(2026, 3, 1);
    input.end_date = date(2027, 3, 1);
    let err = env.svc.create(env.owner.id, input).await.unwrap_err();
    assert!(matches!(err, CasalinkError::Conflict { .. }), "{err}");
}

#[tokio::test]
async fn create_accepts_disjoint_date_range() {
    let env = setup().await;
    env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();

    let mut input = year_lease(&env);
    input.start_date = date(2026, 3, 2);
    input.end_date = date(2027, 3, 1);
    env.svc.create(env.owner.id, input).await.unwrap();
}

#[tokio::test]
async fn cancelled_contract_releases_the_date_range() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc.cancel(id, env.owner.id, None).await.unwrap();

    // Same dates are free again after cancellation.
    env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
}

#[tokio::test]
async fn partially_signed_contract_still_claims_the_range() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc
        .sign(id, env.owner.id, None, SignatureProvenance::default())
        .await
        .unwrap();

    let err = env
        .svc
        .create(env.owner.id, year_lease(&env))
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::Conflict { .. }), "{err}");
}

// -----------------------------------------------------------------------
// Update and delete
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_is_owner_only_and_revalidates_ordering() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    let err = env
        .svc
        .update(
            id,
            env.tenant.id,
            UpdateContractTerms {
                monthly_rent: Some(95_000),
                ..UpdateContractTerms::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::Unauthorized { .. }), "{err}");

    // Moving the start date past the existing end date is invalid.
    let err = env
        .svc
        .update(
            id,
            env.owner.id,
            UpdateContractTerms {
                start_date: Some(date(2026, 6, 1)),
                ..UpdateContractTerms::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::Validation { .. }), "{err}");

    let updated = env
        .svc
        .update(
            id,
            env.owner.id,
            UpdateContractTerms {
                monthly_rent: Some(95_000),
                deposit: Some(None),
                ..UpdateContractTerms::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.monthly_rent, 95_000);
    assert_eq!(updated.deposit, None);
}

#[tokio::test]
async fn update_is_frozen_once_completed() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc
        .sign(id, env.owner.id, None, SignatureProvenance::default())
        .await
        .unwrap();
    env.svc
        .sign(id, env.tenant.id, None, SignatureProvenance::default())
        .await
        .unwrap();

    let err = env
        .svc
        .update(
            id,
            env.owner.id,
            UpdateContractTerms {
                monthly_rent: Some(99_000),
                ..UpdateContractTerms::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn delete_only_while_draft() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    env.svc.send(id, env.owner.id).await.unwrap();
    let err = env.svc.delete(id, env.owner.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");

    let details = {
        let mut input = year_lease(&env);
        input.start_date = date(2027, 1, 1);
        input.end_date = date(2027, 7, 1);
        env.svc.create(env.owner.id, input).await.unwrap()
    };
    env.svc.delete(details.contract.id, env.owner.id).await.unwrap();
    let err = env.svc.get(details.contract.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::NotFound { .. }), "{err}");
}

// -----------------------------------------------------------------------
// Send and sign
// -----------------------------------------------------------------------

#[tokio::test]
async fn send_moves_draft_to_sent_and_notifies_tenant() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    let sent = env.svc.send(id, env.owner.id).await.unwrap();
    assert_eq!(sent.status, ContractStatus::Sent);

    let inbox = env
        .notifications
        .list_for_recipient(env.tenant.id)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].action_url.as_deref().unwrap().contains(&id.to_string()));

    // Re-sending is an invalid transition.
    let err = env.svc.send(id, env.owner.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn send_is_owner_only() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let err = env
        .svc
        .send(details.contract.id, env.tenant.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::Unauthorized { .. }), "{err}");
}

#[tokio::test]
async fn scenario_a_owner_signs_first_then_activation() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();

    let provenance = SignatureProvenance {
        ip_address: Some("203.0.113.7".into()),
        user_agent: Some("casalink-test".into()),
    };

    let after_owner = env
        .svc
        .sign(id, env.owner.id, Some("owner-sig".into()), provenance.clone())
        .await
        .unwrap();
    assert_eq!(after_owner.status, ContractStatus::SignedOwner);
    assert!(after_owner.signed_by_owner.is_some());
    assert!(after_owner.signed_at.is_none());

    let completed = env
        .svc
        .sign(id, env.tenant.id, Some("tenant-sig".into()), provenance)
        .await
        .unwrap();
    assert_eq!(completed.status, ContractStatus::Completed);
    assert!(completed.signed_by_owner.is_some());
    assert!(completed.signed_by_tenant.is_some());
    assert!(completed.signed_at.is_some());
    assert_eq!(completed.owner_signature.as_deref(), Some("owner-sig"));
    assert_eq!(completed.tenant_signature.as_deref(), Some("tenant-sig"));

    let active = env.svc.activate(id, env.owner.id).await.unwrap();
    assert_eq!(active.status, ContractStatus::Active);
    let property = env.properties.find_by_id(env.property.id).await.unwrap();
    assert_eq!(property.status, PropertyStatus::Occupied);
}

#[tokio::test]
async fn scenario_b_tenant_signs_first_same_terminal_state() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();

    let after_tenant = env
        .svc
        .sign(id, env.tenant.id, None, SignatureProvenance::default())
        .await
        .unwrap();
    assert_eq!(after_tenant.status, ContractStatus::SignedTenant);

    let completed = env
        .svc
        .sign(id, env.owner.id, None, SignatureProvenance::default())
        .await
        .unwrap();
    assert_eq!(completed.status, ContractStatus::Completed);
    assert!(completed.signed_by_owner.is_some());
    assert!(completed.signed_by_tenant.is_some());
    assert!(completed.signed_at.is_some());
}

#[tokio::test]
async fn double_sign_fails_without_mutation() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();

    let first = env
        .svc
        .sign(id, env.owner.id, Some("first".into()), SignatureProvenance::default())
        .await
        .unwrap();

    let err = env
        .svc
        .sign(id, env.owner.id, Some("second".into()), SignatureProvenance::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
    assert!(err.to_string().contains("already signed"), "{err}");

    let unchanged = env.contracts.get_by_id(id).await.unwrap();
    assert_eq!(unchanged.status, first.status);
    assert_eq!(unchanged.version, first.version);
    assert_eq!(unchanged.owner_signature.as_deref(), Some("first"));
    assert_eq!(unchanged.signed_by_owner, first.signed_by_owner);
}

#[tokio::test]
async fn sign_rejects_strangers_and_premature_tenant_signature() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    let err = env
        .svc
        .sign(id, Uuid::new_v4(), None, SignatureProvenance::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::Unauthorized { .. }), "{err}");

    // Tenant cannot sign a draft that was never sent.
    let err = env
        .svc
        .sign(id, env.tenant.id, None, SignatureProvenance::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn signature_audit_metadata_matches_for_both_parties() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();

    env.svc
        .sign(
            id,
            env.owner.id,
            None,
            SignatureProvenance {
                ip_address: Some("198.51.100.1".into()),
                user_agent: Some("owner-browser".into()),
            },
        )
        .await
        .unwrap();
    let completed = env
        .svc
        .sign(
            id,
            env.tenant.id,
            None,
            SignatureProvenance {
                ip_address: Some("198.51.100.2".into()),
                user_agent: Some("tenant-browser".into()),
            },
        )
        .await
        .unwrap();

    let signatures = completed.content.signatures.unwrap();
    let owner_record = signatures.owner.unwrap();
    let tenant_record = signatures.tenant.unwrap();
    assert_eq!(owner_record.ip_address.as_deref(), Some("198.51.100.1"));
    assert_eq!(tenant_record.user_agent.as_deref(), Some("tenant-browser"));
    // Both parties signed identical terms, so the fingerprints agree.
    assert_eq!(owner_record.content_hash, tenant_record.content_hash);
    assert_eq!(owner_record.content_hash.len(), 64);

    // Signing notifies the counterparty each time.
    let owner_inbox = env
        .notifications
        .list_for_recipient(env.owner.id)
        .await
        .unwrap();
    assert_eq!(owner_inbox.len(), 1);
}

// -----------------------------------------------------------------------
// Activate, terminate, cancel
// -----------------------------------------------------------------------

#[tokio::test]
async fn activate_requires_completed_and_terminate_requires_active() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    let err = env.svc.activate(id, env.owner.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
    let err = env.svc.terminate(id, env.owner.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");

    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc
        .sign(id, env.owner.id, None, SignatureProvenance::default())
        .await
        .unwrap();
    env.svc
        .sign(id, env.tenant.id, None, SignatureProvenance::default())
        .await
        .unwrap();
    env.svc.activate(id, env.owner.id).await.unwrap();

    // Re-activating an active lease is invalid.
    let err = env.svc.activate(id, env.owner.id).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");

    let terminated = env.svc.terminate(id, env.owner.id).await.unwrap();
    assert_eq!(terminated.status, ContractStatus::Terminated);
    let property = env.properties.find_by_id(env.property.id).await.unwrap();
    assert_eq!(property.status, PropertyStatus::Available);
}

#[tokio::test]
async fn scenario_e_cancel_records_audit_trail() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;
    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc
        .sign(id, env.owner.id, None, SignatureProvenance::default())
        .await
        .unwrap();

    let cancelled = env
        .svc
        .cancel(id, env.owner.id, Some("tenant backed out".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, ContractStatus::Cancelled);

    let record = cancelled.content.cancellation.unwrap();
    assert_eq!(record.reason.as_deref(), Some("tenant backed out"));
    assert_eq!(record.previous_status, ContractStatus::SignedOwner);
    assert_eq!(record.cancelled_by, env.owner.id);
    assert_eq!(
        serde_json::to_value(record.previous_status).unwrap(),
        serde_json::json!("SIGNED_OWNER")
    );

    // The tenant is told why.
    let inbox = env
        .notifications
        .list_for_recipient(env.tenant.id)
        .await
        .unwrap();
    assert!(
        inbox
            .iter()
            .any(|n| n.message.contains("tenant backed out"))
    );
}

#[tokio::test]
async fn cancel_rejects_draft_and_terminal_states() {
    let env = setup().await;
    let details = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    let id = details.contract.id;

    let err = env.svc.cancel(id, env.owner.id, None).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");

    env.svc.send(id, env.owner.id).await.unwrap();
    env.svc.cancel(id, env.owner.id, None).await.unwrap();

    // Cancelling twice is invalid.
    let err = env.svc.cancel(id, env.owner.id, None).await.unwrap_err();
    assert!(matches!(err, CasalinkError::InvalidState { .. }), "{err}");
}

// -----------------------------------------------------------------------
// Listing and statistics
// -----------------------------------------------------------------------

#[tokio::test]
async fn list_filters_and_paginates() {
    let env = setup().await;
    for i in 0..3 {
        let mut input = year_lease(&env);
        input.start_date = date(2025 + i, 3, 2);
        input.end_date = date(2025 + i, 9, 1);
        env.svc.create(env.owner.id, input).await.unwrap();
    }

    let page = env
        .svc
        .list(
            ContractFilter {
                owner_id: Some(env.owner.id),
                ..ContractFilter::default()
            },
            PageRequest {
                page: 1,
                limit: 2,
                ..PageRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let rest = env
        .svc
        .list(
            ContractFilter {
                owner_id: Some(env.owner.id),
                ..ContractFilter::default()
            },
            PageRequest {
                page: 2,
                limit: 2,
                ..PageRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);

    let drafts_only = env
        .svc
        .list(
            ContractFilter {
                status: Some(ContractStatus::Draft),
                ..ContractFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(drafts_only.total, 3);

    let none = env
        .svc
        .list(
            ContractFilter {
                status: Some(ContractStatus::Active),
                ..ContractFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn statistics_count_per_status_and_perspective() {
    let env = setup().await;

    // One draft and one sent contract for the same owner/tenant pair.
    let first = env.svc.create(env.owner.id, year_lease(&env)).await.unwrap();
    env.svc.send(first.contract.id, env.owner.id).await.unwrap();
    let mut input = year_lease(&env);
    input.start_date = date(2026, 4, 1);
    input.end_date = date(2026, 10, 1);
    env.svc.create(env.owner.id, input).await.unwrap();

    let as_owner = env
        .svc
        .statistics(env.owner.id, StatsPerspective::Owner)
        .await
        .unwrap();
    let count_of = |counts: &[casalink_core::repository::StatusCount], s: ContractStatus| {
        counts
            .iter()
            .find(|c| c.status == s)
            .map(|c| c.count)
            .unwrap_or(0)
    };
    assert_eq!(count_of(&as_owner, ContractStatus::Draft), 1);
    assert_eq!(count_of(&as_owner, ContractStatus::Sent), 1);

    let as_tenant = env
        .svc
        .statistics(env.tenant.id, StatsPerspective::Tenant)
        .await
        .unwrap();
    assert_eq!(count_of(&as_tenant, ContractStatus::Draft), 1);
    assert_eq!(count_of(&as_tenant, ContractStatus::Sent), 1);

    // The owner has no contracts where they are the tenant.
    let empty = env
        .svc
        .statistics(env.owner.id, StatsPerspective::Tenant)
        .await
        .unwrap();
    assert!(empty.is_empty());
}
