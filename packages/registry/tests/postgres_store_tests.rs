//! PostgresStore against a real database.
//!
//! Needs Docker. Run with: cargo test --test postgres_store_tests -- --ignored

mod common;

use anyhow::{Context, Result};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use crate::common::{approval_doc, valid_submission};
use registry_core::common::auth::{Identity, Role};
use registry_core::common::{PageLimits, RegistryError};
use registry_core::domains::auth::CredentialVerifier;
use registry_core::domains::expert_edit_requests::actions::{
    self as edits, EditDecision, EditProposal,
};
use registry_core::domains::expert_edit_requests::EditRequestStatus;
use registry_core::domains::documents::DocumentRef;
use registry_core::domains::expert_requests::actions::{self as requests, Decision, ExpertSubmission};
use registry_core::domains::expert_requests::ExpertRequestStatus;
use registry_core::domains::experts::models::ProposedChanges;
use registry_core::domains::users::models::User;
use registry_core::kernel::{BaseRegistryStore, PostgresStore, ServerDeps, SpyDocumentService};

struct PostgresHarness {
    deps: ServerDeps,
    _postgres: ContainerAsync<Postgres>,
}

impl PostgresHarness {
    async fn start() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        let verifier = CredentialVerifier::new("test-registry".to_string(), Duration::hours(1), 1)?;
        let deps = ServerDeps::new(
            Arc::new(PostgresStore::new(pool)),
            Arc::new(SpyDocumentService::new()),
            Arc::new(verifier),
            PageLimits {
                default_limit: 100,
                max_limit: 500,
            },
            1024 * 1024,
        );

        Ok(Self {
            deps,
            _postgres: postgres,
        })
    }

    async fn identity(&self, email: &str, role: Role) -> Result<Identity> {
        let hash = self.deps.verifier.hash_password("correct horse battery")?;
        let user = User::new(email, "Test User", hash, role);
        anyhow::ensure!(self.deps.store.insert_user(&user).await?, "email taken");

        let issued = self
            .deps
            .verifier
            .issue_token(user.id, &user.name, &user.email, user.role)?;
        Ok(issued.identity)
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn full_lifecycle_against_postgres() {
    let harness = PostgresHarness::start().await.unwrap();
    let deps = &harness.deps;
    let user = harness.identity("analyst@example.com", Role::Regular).await.unwrap();
    let admin = harness.identity("reviewer@example.com", Role::Admin).await.unwrap();

    // Duplicate emails are reported, not raised
    let hash = deps.verifier.hash_password("whatever-password").unwrap();
    let duplicate = User::new("ANALYST@example.com", "Copy", hash, Role::Regular);
    assert!(!deps.store.insert_user(&duplicate).await.unwrap());

    // New expert request: approve materializes the expert
    let request = requests::submit(&user, valid_submission(), deps).await.unwrap();
    let approved = requests::decide(
        &admin,
        request.id,
        Decision::Approve {
            approval_document: Some(approval_doc()),
        },
        deps,
    )
    .await
    .unwrap();
    assert_eq!(approved.status, ExpertRequestStatus::Approved);

    let expert_id = approved.expert_id.unwrap();
    let expert = deps.store.find_expert(expert_id).await.unwrap().unwrap();
    assert_eq!(expert.original_request_id, Some(request.id));
    assert_eq!(expert.approval_document, Some(approval_doc()));

    let again = requests::decide(
        &admin,
        request.id,
        Decision::Approve {
            approval_document: Some(approval_doc()),
        },
        deps,
    )
    .await;
    assert!(matches!(again, Err(RegistryError::Conflict(_))));

    // Edit request: propose, approve, apply exactly once
    let proposal = EditProposal {
        changes: ProposedChanges {
            name: Some("Jane Q. Doe".to_string()),
            ..Default::default()
        },
        change_reason: "Legal name change".to_string(),
        change_summary: None,
    };
    let edit = edits::propose(&user, expert_id, proposal, deps).await.unwrap();
    edits::decide(&admin, edit.id, EditDecision::Approve { admin_notes: None }, deps)
        .await
        .unwrap();

    let applied = edits::apply(&admin, edit.id, deps).await.unwrap();
    assert_eq!(applied.request.status, EditRequestStatus::Applied);

    let stored = deps.store.find_expert(expert_id).await.unwrap().unwrap();
    assert_eq!(stored.profile.name, "Jane Q. Doe");
    assert_eq!(stored.profile.email, expert.profile.email);

    let second = edits::apply(&admin, edit.id, deps).await;
    assert!(matches!(second, Err(RegistryError::Conflict(_))));
    assert_eq!(deps.store.find_expert(expert_id).await.unwrap().unwrap(), stored);

    // Reads round-trip the JSON columns
    let reloaded = deps.store.find_edit_request(edit.id).await.unwrap().unwrap();
    assert_eq!(reloaded.changes, edit.changes);
    assert_eq!(reloaded.fields_changed, edit.fields_changed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires Docker"]
async fn concurrent_approvals_against_postgres() {
    let harness = PostgresHarness::start().await.unwrap();
    let user = harness.identity("applicant@example.com", Role::Regular).await.unwrap();
    let admin = harness.identity("first@example.com", Role::Admin).await.unwrap();
    let other = harness.identity("second@example.com", Role::ElevatedAdmin).await.unwrap();

    for _ in 0..10 {
        let request = requests::submit(&user, valid_submission(), &harness.deps)
            .await
            .unwrap();

        let id = request.id;
        let races = [admin.clone(), other.clone()].map(|reviewer| {
            let deps = harness.deps.clone();
            tokio::spawn(async move {
                let decision = Decision::Approve {
                    approval_document: Some(approval_doc()),
                };
                requests::decide(&reviewer, id, decision, &deps).await
            })
        });

        let mut winners = 0;
        for race in races {
            match race.await.unwrap() {
                Ok(_) => winners += 1,
                Err(RegistryError::Conflict(_)) => {}
                Err(e) => panic!("losing approval should conflict, got {e:?}"),
            }
        }
        assert_eq!(winners, 1);

        let stored = harness.deps.store.find_expert_request(request.id).await.unwrap().unwrap();
        let expert_id = stored.expert_id.unwrap();
        let expert = harness.deps.store.find_expert(expert_id).await.unwrap().unwrap();
        assert_eq!(expert.original_request_id, Some(request.id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires Docker"]
async fn concurrent_applies_against_postgres() {
    let harness = PostgresHarness::start().await.unwrap();
    let deps = &harness.deps;
    let user = harness.identity("editor@example.com", Role::Regular).await.unwrap();
    let admin = harness.identity("approver@example.com", Role::Admin).await.unwrap();

    let request = requests::submit(&user, valid_submission(), deps).await.unwrap();
    let approved = requests::decide(
        &admin,
        request.id,
        Decision::Approve {
            approval_document: Some(approval_doc()),
        },
        deps,
    )
    .await
    .unwrap();
    let expert_id = approved.expert_id.unwrap();

    let mut edits_to_apply = Vec::new();
    for changes in [
        ProposedChanges {
            name: Some("Jane Q. Doe".to_string()),
            ..Default::default()
        },
        ProposedChanges {
            affiliation: Some("Bahrain Polytechnic".to_string()),
            ..Default::default()
        },
    ] {
        let proposal = EditProposal {
            changes,
            change_reason: "Profile refresh".to_string(),
            change_summary: None,
        };
        let edit = edits::propose(&user, expert_id, proposal, deps).await.unwrap();
        edits::decide(&admin, edit.id, EditDecision::Approve { admin_notes: None }, deps)
            .await
            .unwrap();
        edits_to_apply.push(edit.id);
    }

    let handles: Vec<_> = edits_to_apply
        .iter()
        .map(|&id| {
            let deps = harness.deps.clone();
            let admin = admin.clone();
            tokio::spawn(async move { edits::apply(&admin, id, &deps).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = deps.store.find_expert(expert_id).await.unwrap().unwrap();
    assert_eq!(stored.profile.name, "Jane Q. Doe");
    assert_eq!(stored.profile.affiliation, "Bahrain Polytechnic");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn revision_clears_documents_against_postgres() {
    let harness = PostgresHarness::start().await.unwrap();
    let deps = &harness.deps;
    let admin = harness.identity("curator@example.com", Role::Admin).await.unwrap();

    let submission = ExpertSubmission {
        cv_document: Some(DocumentRef::new("cv/first.pdf")),
        approval_document: Some(approval_doc()),
        ..valid_submission()
    };
    let request = requests::submit(&admin, submission, deps).await.unwrap();

    let kept = requests::revise(&admin, request.id, valid_submission(), deps)
        .await
        .unwrap();
    assert_eq!(kept.cv_document, Some(DocumentRef::new("cv/first.pdf")));

    let clearing = ExpertSubmission {
        remove_cv: true,
        remove_approval_document: true,
        ..valid_submission()
    };
    let cleared = requests::revise(&admin, request.id, clearing, deps)
        .await
        .unwrap();
    assert_eq!(cleared.cv_document, None);
    assert_eq!(cleared.approval_document, None);
}
