//! Expert request lifecycle: submit, decide, batch approval, revise.

mod common;

use crate::common::{approval_doc, valid_submission, TestHarness};
use registry_core::common::auth::Role;
use registry_core::common::{ExpertRequestId, PageRequest, RegistryError};
use registry_core::domains::documents::DocumentRef;
use registry_core::domains::expert_requests::actions::{
    self, Decision, ExpertRequestQuery, ExpertSubmission,
};
use registry_core::domains::expert_requests::edges::mutation as edges;
use registry_core::domains::expert_requests::ExpertRequestStatus;

fn approve(document: Option<DocumentRef>) -> Decision {
    Decision::Approve {
        approval_document: document,
    }
}

// ============================================================================
// submit
// ============================================================================

#[tokio::test]
async fn submit_creates_pending_request_owned_by_caller() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;

    let request = edges::submit_expert_request(&harness.deps, user.bearer(), valid_submission())
        .await
        .unwrap();

    assert_eq!(request.status, ExpertRequestStatus::Pending);
    assert_eq!(request.created_by, user.user.id);
    assert_eq!(request.expert_id, None);
    assert_eq!(harness.store.expert_request(request.id), Some(request));
}

#[tokio::test]
async fn submit_without_token_is_unauthenticated() {
    let harness = TestHarness::new().unwrap();

    let result = edges::submit_expert_request(&harness.deps, None, valid_submission()).await;

    assert!(matches!(result, Err(RegistryError::Unauthenticated)));
}

#[tokio::test]
async fn submit_reports_every_invalid_field() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;

    let submission = ExpertSubmission {
        name: String::new(),
        affiliation: String::new(),
        phone: String::new(),
        email: String::new(),
        role: "observer".to_string(),
        experience_entries: vec![],
        education_entries: vec![],
        ..valid_submission()
    };
    let err = actions::submit(&user.identity, submission, &harness.deps)
        .await
        .unwrap_err();

    let errors = err.validation_errors().expect("validation failure");
    for field in ["name", "affiliation", "contact", "role", "entries"] {
        assert!(errors.has_field(field), "missing {}: {}", field, errors);
    }
}

// ============================================================================
// decide
// ============================================================================

#[tokio::test]
async fn approving_without_any_approval_document_fails_validation() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    let err = edges::decide_expert_request(&harness.deps, admin.bearer(), request.id, approve(None))
        .await
        .unwrap_err();

    let errors = err.validation_errors().expect("validation failure");
    assert!(errors.has_field("approvalDocument"));
    assert!(errors.to_string().contains("approval document required"));

    let stored = harness.store.expert_request(request.id).unwrap();
    assert_eq!(stored.status, ExpertRequestStatus::Pending);
    assert_eq!(harness.store.expert_count(), 0);
}

#[tokio::test]
async fn blank_approval_document_counts_as_missing_for_every_reviewer_role() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;

    for role in [Role::Admin, Role::ElevatedAdmin] {
        let reviewer = harness.user(role).await;
        let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
            .await
            .unwrap();

        let result = actions::decide(
            &reviewer.identity,
            request.id,
            approve(Some(DocumentRef::new("   "))),
            &harness.deps,
        )
        .await;

        assert!(
            matches!(result, Err(RegistryError::Validation(_))),
            "{:?} approved without a document",
            role
        );
    }
}

#[tokio::test]
async fn approval_materializes_expert_and_links_it() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let approved = actions::decide(
        &admin.identity,
        request.id,
        approve(Some(approval_doc())),
        &harness.deps,
    )
    .await
    .unwrap();

    assert_eq!(approved.status, ExpertRequestStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(admin.user.id));
    assert!(approved.reviewed_at.is_some());
    assert_eq!(approved.approval_document, Some(approval_doc()));

    let expert_id = approved.expert_id.expect("expert id stored on request");
    let expert = harness.store.expert(expert_id).expect("expert created");
    assert_eq!(expert.profile, request.profile);
    assert_eq!(expert.original_request_id, Some(request.id));
    assert_eq!(expert.approval_document, Some(approval_doc()));
}

#[tokio::test]
async fn stored_approval_document_is_enough() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let submission = ExpertSubmission {
        approval_document: Some(approval_doc()),
        ..valid_submission()
    };
    let request = actions::submit(&user.identity, submission, &harness.deps)
        .await
        .unwrap();

    let approved = actions::decide(&admin.identity, request.id, approve(None), &harness.deps)
        .await
        .unwrap();

    assert_eq!(approved.approval_document, Some(approval_doc()));
    assert!(approved.expert_id.is_some());
}

#[tokio::test]
async fn regular_users_cannot_decide() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    for decision in [
        approve(Some(approval_doc())),
        Decision::Reject {
            reason: "no".to_string(),
        },
    ] {
        let via_edge =
            edges::decide_expert_request(&harness.deps, user.bearer(), request.id, decision.clone())
                .await;
        assert!(matches!(via_edge, Err(RegistryError::Forbidden)));

        let via_action = actions::decide(&user.identity, request.id, decision, &harness.deps).await;
        assert!(matches!(via_action, Err(RegistryError::Forbidden)));
    }

    assert_eq!(
        harness.store.expert_request(request.id).unwrap().status,
        ExpertRequestStatus::Pending
    );
}

#[tokio::test]
async fn rejection_requires_reason_and_leaves_experts_alone() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    let blank = actions::decide(
        &admin.identity,
        request.id,
        Decision::Reject {
            reason: "  ".to_string(),
        },
        &harness.deps,
    )
    .await;
    assert!(matches!(blank, Err(RegistryError::Validation(_))));

    let rejected = actions::decide(
        &admin.identity,
        request.id,
        Decision::Reject {
            reason: "insufficient documentation".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();

    assert_eq!(rejected.status, ExpertRequestStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("insufficient documentation")
    );
    assert_eq!(harness.store.expert_count(), 0);
}

#[tokio::test]
async fn second_decision_conflicts() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    actions::decide(
        &admin.identity,
        request.id,
        approve(Some(approval_doc())),
        &harness.deps,
    )
    .await
    .unwrap();

    let again = actions::decide(
        &admin.identity,
        request.id,
        Decision::Reject {
            reason: "changed my mind".to_string(),
        },
        &harness.deps,
    )
    .await;

    assert!(matches!(again, Err(RegistryError::Conflict(_))));
    assert_eq!(harness.store.expert_count(), 1);
}

#[tokio::test]
async fn concurrent_approvals_create_one_expert() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let first = harness.user(Role::Admin).await;
    let second = harness.user(Role::ElevatedAdmin).await;
    let deps = harness.interleaved_deps();

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        actions::decide(&first.identity, request.id, approve(Some(approval_doc())), &deps),
        actions::decide(&second.identity, request.id, approve(Some(approval_doc())), &deps),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(RegistryError::Conflict(_)))));
    assert_eq!(harness.store.expert_count(), 1);
}

#[tokio::test]
async fn concurrent_approve_and_reject_settle_on_one_outcome() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;
    let deps = harness.interleaved_deps();

    let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    let (approved, rejected) = tokio::join!(
        actions::decide(&admin.identity, request.id, approve(Some(approval_doc())), &deps),
        actions::decide(
            &admin.identity,
            request.id,
            Decision::Reject {
                reason: "duplicate of an existing expert".to_string(),
            },
            &deps,
        ),
    );

    let stored = harness.store.expert_request(request.id).unwrap();
    match (approved, rejected) {
        (Ok(_), Err(RegistryError::Conflict(_))) => {
            assert_eq!(stored.status, ExpertRequestStatus::Approved);
            assert_eq!(harness.store.expert_count(), 1);
        }
        (Err(RegistryError::Conflict(_)), Ok(_)) => {
            assert_eq!(stored.status, ExpertRequestStatus::Rejected);
            assert_eq!(harness.store.expert_count(), 0);
        }
        other => panic!("expected exactly one decision to win, got {:?}", other),
    }
}

#[tokio::test]
async fn deciding_unknown_request_is_not_found() {
    let harness = TestHarness::new().unwrap();
    let admin = harness.user(Role::Admin).await;

    let result = actions::decide(
        &admin.identity,
        ExpertRequestId::new(),
        approve(Some(approval_doc())),
        &harness.deps,
    )
    .await;

    assert!(matches!(result, Err(RegistryError::NotFound { .. })));
}

// ============================================================================
// batch approval
// ============================================================================

#[tokio::test]
async fn batch_approval_reports_per_item_failures() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let first = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let second = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let missing = ExpertRequestId::new();

    let outcome = edges::batch_approve_expert_requests(
        &harness.deps,
        admin.bearer(),
        vec![first.id, second.id, missing],
        approval_doc(),
    )
    .await
    .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.approved_ids(), vec![first.id, second.id]);

    let errors = outcome.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, missing);
    assert!(matches!(errors[0].1, RegistryError::NotFound { .. }));

    assert_eq!(harness.store.expert_count(), 2);
}

#[tokio::test]
async fn batch_approval_continues_past_already_decided_requests() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let decided = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let pending = actions::submit(&user.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    actions::decide(
        &admin.identity,
        decided.id,
        Decision::Reject {
            reason: "duplicate".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();

    let outcome = actions::batch_decide(
        &admin.identity,
        &[decided.id, pending.id],
        approval_doc(),
        &harness.deps,
    )
    .await
    .unwrap();

    assert_eq!(outcome.approved_ids(), vec![pending.id]);
    assert!(matches!(outcome.errors()[0].1, RegistryError::Conflict(_)));
    assert_eq!(
        outcome
            .outcomes
            .iter()
            .map(|o| o.request_id())
            .collect::<Vec<_>>(),
        vec![decided.id, pending.id]
    );
}

#[tokio::test]
async fn batch_approval_validates_up_front() {
    let harness = TestHarness::new().unwrap();
    let admin = harness.user(Role::Admin).await;

    let empty = actions::batch_decide(&admin.identity, &[], approval_doc(), &harness.deps).await;
    assert!(matches!(empty, Err(RegistryError::Validation(_))));

    let blank = actions::batch_decide(
        &admin.identity,
        &[ExpertRequestId::new()],
        DocumentRef::new(""),
        &harness.deps,
    )
    .await;
    assert!(matches!(blank, Err(RegistryError::Validation(_))));
}

#[tokio::test]
async fn batch_with_only_failures_is_not_a_success() {
    let harness = TestHarness::new().unwrap();
    let admin = harness.user(Role::Admin).await;

    let outcome = actions::batch_decide(
        &admin.identity,
        &[ExpertRequestId::new()],
        approval_doc(),
        &harness.deps,
    )
    .await
    .unwrap();

    assert!(!outcome.is_success());
    assert!(outcome.approved_ids().is_empty());
}

// ============================================================================
// revise
// ============================================================================

#[tokio::test]
async fn pending_request_is_revisable_by_admin_only() {
    let harness = TestHarness::new().unwrap();
    let creator = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&creator.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    let amended = ExpertSubmission {
        affiliation: "Bahrain Polytechnic".to_string(),
        ..valid_submission()
    };

    let by_creator =
        actions::revise(&creator.identity, request.id, amended.clone(), &harness.deps).await;
    assert!(matches!(by_creator, Err(RegistryError::Forbidden)));

    let by_admin = actions::revise(&admin.identity, request.id, amended, &harness.deps)
        .await
        .unwrap();
    assert_eq!(by_admin.status, ExpertRequestStatus::Pending);
    assert_eq!(by_admin.profile.affiliation, "Bahrain Polytechnic");
}

#[tokio::test]
async fn rejected_request_is_resubmitted_by_creator_only() {
    let harness = TestHarness::new().unwrap();
    let creator = harness.user(Role::Regular).await;
    let stranger = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&creator.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    actions::decide(
        &admin.identity,
        request.id,
        Decision::Reject {
            reason: "insufficient documentation".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();

    let by_stranger =
        actions::revise(&stranger.identity, request.id, valid_submission(), &harness.deps).await;
    assert!(matches!(by_stranger, Err(RegistryError::Forbidden)));

    // Reviewers cannot bypass decide by revising a rejected request
    let by_admin =
        actions::revise(&admin.identity, request.id, valid_submission(), &harness.deps).await;
    assert!(matches!(by_admin, Err(RegistryError::Forbidden)));

    let resubmission = ExpertSubmission {
        cv_document: Some(DocumentRef::new("cv/updated.pdf")),
        ..valid_submission()
    };
    let resubmitted = edges::revise_expert_request(
        &harness.deps,
        creator.bearer(),
        request.id,
        resubmission,
    )
    .await
    .unwrap();

    assert_eq!(resubmitted.status, ExpertRequestStatus::Pending);
    assert_eq!(resubmitted.rejection_reason, None);
    assert_eq!(resubmitted.reviewed_at, None);
    assert_eq!(resubmitted.reviewed_by, None);
    assert_eq!(resubmitted.cv_document, Some(DocumentRef::new("cv/updated.pdf")));
}

#[tokio::test]
async fn revision_keeps_or_clears_documents() {
    let harness = TestHarness::new().unwrap();
    let creator = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let submission = ExpertSubmission {
        cv_document: Some(DocumentRef::new("cv/first.pdf")),
        approval_document: Some(approval_doc()),
        ..valid_submission()
    };
    let request = actions::submit(&creator.identity, submission, &harness.deps)
        .await
        .unwrap();

    // Omitted documents stay as stored
    let kept = actions::revise(&admin.identity, request.id, valid_submission(), &harness.deps)
        .await
        .unwrap();
    assert_eq!(kept.cv_document, Some(DocumentRef::new("cv/first.pdf")));
    assert_eq!(kept.approval_document, Some(approval_doc()));

    let clearing = ExpertSubmission {
        remove_cv: true,
        ..valid_submission()
    };
    let cleared = actions::revise(&admin.identity, request.id, clearing, &harness.deps)
        .await
        .unwrap();
    assert_eq!(cleared.cv_document, None);
    assert_eq!(cleared.approval_document, Some(approval_doc()));
    assert_eq!(harness.store.expert_request(request.id), Some(cleared));
}

#[tokio::test]
async fn approved_request_cannot_be_revised() {
    let harness = TestHarness::new().unwrap();
    let creator = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&creator.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    actions::decide(
        &admin.identity,
        request.id,
        approve(Some(approval_doc())),
        &harness.deps,
    )
    .await
    .unwrap();

    for identity in [&creator.identity, &admin.identity] {
        let result = actions::revise(identity, request.id, valid_submission(), &harness.deps).await;
        assert!(matches!(result, Err(RegistryError::Forbidden)));
    }
}

#[tokio::test]
async fn revision_is_validated_after_permission_check() {
    let harness = TestHarness::new().unwrap();
    let creator = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let request = actions::submit(&creator.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let invalid = ExpertSubmission {
        name: String::new(),
        ..valid_submission()
    };

    let by_creator =
        actions::revise(&creator.identity, request.id, invalid.clone(), &harness.deps).await;
    assert!(matches!(by_creator, Err(RegistryError::Forbidden)));

    let by_admin = actions::revise(&admin.identity, request.id, invalid, &harness.deps).await;
    assert!(matches!(by_admin, Err(RegistryError::Validation(_))));
}

// ============================================================================
// queries
// ============================================================================

#[tokio::test]
async fn regular_users_only_see_their_own_requests() {
    let harness = TestHarness::new().unwrap();
    let alice = harness.user(Role::Regular).await;
    let bob = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let mine = actions::submit(&alice.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();
    let theirs = actions::submit(&bob.identity, valid_submission(), &harness.deps)
        .await
        .unwrap();

    // Asking for someone else's requests is ignored for regular callers
    let query = ExpertRequestQuery {
        created_by: Some(bob.user.id),
        ..Default::default()
    };
    let page = actions::list_expert_requests(&alice.identity, query, &harness.deps)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, mine.id);

    let forbidden = actions::get_expert_request(&alice.identity, theirs.id, &harness.deps).await;
    assert!(matches!(forbidden, Err(RegistryError::Forbidden)));

    let all = actions::list_expert_requests(&admin.identity, Default::default(), &harness.deps)
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn list_filters_by_status_and_pages() {
    let harness = TestHarness::new().unwrap();
    let user = harness.user(Role::Regular).await;
    let admin = harness.user(Role::Admin).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let request = actions::submit(&user.identity, valid_submission(), &harness.deps)
            .await
            .unwrap();
        ids.push(request.id);
    }
    actions::decide(
        &admin.identity,
        ids[0],
        Decision::Reject {
            reason: "incomplete".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();

    let pending = actions::list_expert_requests(
        &admin.identity,
        ExpertRequestQuery {
            status: Some(ExpertRequestStatus::Pending),
            page: PageRequest::new(1, 0),
            ..Default::default()
        },
        &harness.deps,
    )
    .await
    .unwrap();

    assert_eq!(pending.total, 2);
    assert_eq!(pending.items.len(), 1);
    assert!(pending.has_more());
    assert_eq!(pending.items[0].status, ExpertRequestStatus::Pending);
}
