// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios across the whole lead lifecycle.
//!
//! Each test creates an isolated TestHarness with a temp SQLite database.
//! Tests are independent and order-insensitive.

use std::collections::HashMap;

use leadflow_core::{
    Caller, EmailStatus, LeadId, LeadStore, LeadflowError, PaymentStatus, Role, Stage,
};
use leadflow_pipeline::{Decision, EmailDecision, PageRequest, RejectionVerdict, Submission};
use leadflow_test_utils::TestHarness;

struct Team {
    dm: Caller,
    verifier: Caller,
    lq: Caller,
    manager: Caller,
}

async fn team(harness: &TestHarness) -> Team {
    let dm = harness.approved_user("Dana Miner", Role::DataMiner).await.unwrap();
    let verifier = harness.approved_user("Vera Verifier", Role::Verifier).await.unwrap();
    let lq = harness.approved_user("Quinn Qualifier", Role::LeadQualifier).await.unwrap();
    let manager = harness.approved_user("Max Manager", Role::Manager).await.unwrap();
    harness.report_to(&[&lq], &manager).await.unwrap();
    Team {
        dm,
        verifier,
        lq,
        manager,
    }
}

fn active(emails: &[&str]) -> Vec<EmailDecision> {
    emails
        .iter()
        .map(|e| EmailDecision {
            normalized: e.to_string(),
            status: EmailStatus::Active,
        })
        .collect()
}

/// Walks a fresh lead through DM, Verifier and LQ into the manager's queue.
async fn lead_at_manager(harness: &TestHarness, team: &Team, name: &str, email: &str) -> LeadId {
    let id = harness
        .create_lead(&team.dm, name, &[email], &[])
        .await
        .unwrap();
    harness
        .pipeline
        .review_emails(&team.verifier, &id, &active(&[email]))
        .await
        .unwrap();
    harness
        .pipeline
        .distribute_to_qualifiers(&team.verifier)
        .await
        .unwrap();
    harness
        .pipeline
        .set_lq_status(&team.lq, &id, "QUALIFIED")
        .await
        .unwrap();
    harness
        .pipeline
        .submit_to_manager(
            &team.lq,
            &id,
            &Submission {
                selected_emails: vec![email.to_string()],
                ..Submission::default()
            },
        )
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn lead_travels_from_data_miner_to_done() {
    let harness = TestHarness::new().await.unwrap();
    let team = team(&harness).await;
    let pipeline = &harness.pipeline;

    let id = harness
        .create_lead(
            &team.dm,
            "Acme Ltd",
            &["Sales@Acme.io", "ops@acme.io"],
            &["+1 (555) 010-2000"],
        )
        .await
        .unwrap();
    assert_eq!(pipeline.dm_stats(&team.dm).await.unwrap().today_count, 1);

    let queue = pipeline.list_dm(PageRequest::default().resolve()).await.unwrap();
    assert_eq!(queue.pagination.total, 1);

    // Every email needs a verdict before the lead can leave DM.
    let partial = pipeline
        .review_emails(&team.verifier, &id, &active(&["sales@acme.io"]))
        .await
        .unwrap_err();
    assert!(matches!(
        partial,
        LeadflowError::IncompleteReview { missing_count: 1 }
    ));

    let decisions = vec![
        EmailDecision {
            normalized: "sales@acme.io".into(),
            status: EmailStatus::Active,
        },
        EmailDecision {
            normalized: "ops@acme.io".into(),
            status: EmailStatus::Bounced,
        },
    ];
    let review = pipeline
        .review_emails(&team.verifier, &id, &decisions)
        .await
        .unwrap();
    assert_eq!(review.stage, Stage::Verifier);

    let moved = pipeline.distribute_to_qualifiers(&team.verifier).await.unwrap();
    assert_eq!(moved.count, 1);
    let lead = harness.store.get_lead(&id).await.unwrap().unwrap();
    assert_eq!(lead.stage, Stage::Lq);
    assert_eq!(lead.assigned_to.as_ref(), Some(&team.lq.id));

    pipeline
        .set_lq_status(&team.lq, &id, "QUALIFIED")
        .await
        .unwrap();
    let comments = pipeline
        .add_lq_comment(&team.lq, &id, "Buyer wants a demo next week")
        .await
        .unwrap();
    assert_eq!(comments, 1);

    let handoff = pipeline
        .submit_to_manager(
            &team.lq,
            &id,
            &Submission {
                selected_emails: vec!["sales@acme.io".into()],
                selected_phones: vec!["+1 (555) 010-2000".into()],
                comment: Some("Call after 3pm".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(handoff.assigned_to, team.manager.id);
    assert_eq!(handoff.email_count, 1);
    assert_eq!(handoff.phone_count, 1);

    let queue = pipeline
        .list_manager_leads(&team.manager, PageRequest::default().resolve())
        .await
        .unwrap();
    assert_eq!(queue.leads.len(), 1);

    let receipt = pipeline
        .record_payment(&team.manager, &id, 250.0, "Deposit")
        .await
        .unwrap();
    assert_eq!(receipt.total_upsell_amount, 250.0);
    assert_eq!(receipt.upsell_entries, 1);
    assert_eq!(receipt.status, PaymentStatus::Paid);

    let outcome = pipeline
        .decide(&team.manager, &id, Decision::Accept, "Signed")
        .await
        .unwrap();
    assert_eq!(outcome.stage, Stage::Done);

    let lead = harness.store.get_lead(&id).await.unwrap().unwrap();
    assert_eq!(lead.stage, Stage::Done);
}

#[tokio::test]
async fn rejection_request_is_settled_by_super_admin() {
    let harness = TestHarness::new().await.unwrap();
    let team = team(&harness).await;
    let root = harness
        .approved_user("Sam Root", Role::SuperAdmin)
        .await
        .unwrap();
    let pipeline = &harness.pipeline;

    let kept = lead_at_manager(&harness, &team, "Kept Co", "hello@kept.co").await;
    let dropped = lead_at_manager(&harness, &team, "Dropped Co", "hello@dropped.co").await;

    for id in [&kept, &dropped] {
        pipeline
            .request_rejection(&team.manager, id, "Not a fit")
            .await
            .unwrap();
    }
    let again = pipeline
        .request_rejection(&team.manager, &kept, "Still not a fit")
        .await
        .unwrap_err();
    assert!(matches!(again, LeadflowError::PreconditionFailed(_)));
    assert_eq!(pipeline.pending_rejections().await.unwrap().len(), 2);

    let stage = pipeline
        .review_rejection(&root, &dropped, RejectionVerdict::Approve)
        .await
        .unwrap();
    assert_eq!(stage, Stage::Rejected);

    let stage = pipeline
        .review_rejection(&root, &kept, RejectionVerdict::Dismiss)
        .await
        .unwrap();
    assert_eq!(stage, Stage::Manager);
    assert!(pipeline.pending_rejections().await.unwrap().is_empty());

    // A dismissed lead can still be closed.
    let outcome = pipeline
        .decide(&team.manager, &kept, Decision::Accept, "Changed their mind")
        .await
        .unwrap();
    assert_eq!(outcome.stage, Stage::Done);
}

#[tokio::test]
async fn distribution_spreads_evenly_across_qualifiers() {
    let harness = TestHarness::new().await.unwrap();
    let dm = harness.approved_user("Dana Miner", Role::DataMiner).await.unwrap();
    let verifier = harness.approved_user("Vera Verifier", Role::Verifier).await.unwrap();
    for name in ["LQ One", "LQ Two", "LQ Three"] {
        harness
            .approved_user(name, Role::LeadQualifier)
            .await
            .unwrap();
    }

    let mut ids = Vec::new();
    for n in 0..6 {
        let email = format!("buyer{n}@prospect{n}.io");
        let id = harness
            .create_lead(&dm, &format!("Prospect {n}"), &[email.as_str()], &[])
            .await
            .unwrap();
        harness
            .pipeline
            .review_emails(&verifier, &id, &active(&[email.as_str()]))
            .await
            .unwrap();
        ids.push(id);
    }

    let moved = harness
        .pipeline
        .distribute_to_qualifiers(&verifier)
        .await
        .unwrap();
    assert_eq!(moved.count, 6);

    let mut per_lq: HashMap<String, usize> = HashMap::new();
    for id in &ids {
        let lead = harness.store.get_lead(id).await.unwrap().unwrap();
        let owner = lead.assigned_to.unwrap();
        *per_lq.entry(owner.to_string()).or_default() += 1;
    }
    assert_eq!(per_lq.len(), 3);
    assert!(per_lq.values().all(|&n| n == 2));

    // Nothing left at Verifier.
    let empty = harness
        .pipeline
        .distribute_to_qualifiers(&verifier)
        .await
        .unwrap_err();
    assert!(matches!(empty, LeadflowError::NotFoundOrNotOwned(_)));
}

#[tokio::test]
async fn duplicates_are_caught_across_data_miners() {
    let harness = TestHarness::new().await.unwrap();
    let first = harness.approved_user("Dana Miner", Role::DataMiner).await.unwrap();
    let second = harness.approved_user("Dev Miner", Role::DataMiner).await.unwrap();

    harness
        .create_lead(&first, "Acme Ltd", &["sales@acme.io"], &["+1 555 010 2000"])
        .await
        .unwrap();

    let err = harness
        .create_lead(&second, "Acme Again", &["SALES@ACME.IO"], &["15550102000"])
        .await
        .unwrap_err();
    match err {
        LeadflowError::Conflict { duplicates } => {
            assert_eq!(duplicates.duplicate_emails, vec!["sales@acme.io".to_string()]);
            assert_eq!(duplicates.duplicate_phones.len(), 1);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn qualifier_without_manager_cannot_submit() {
    let harness = TestHarness::new().await.unwrap();
    let dm = harness.approved_user("Dana Miner", Role::DataMiner).await.unwrap();
    let verifier = harness.approved_user("Vera Verifier", Role::Verifier).await.unwrap();
    let lq = harness.approved_user("Lone Qualifier", Role::LeadQualifier).await.unwrap();

    let id = harness
        .create_lead(&dm, "Orphan Co", &["hi@orphan.co"], &[])
        .await
        .unwrap();
    harness
        .pipeline
        .review_emails(&verifier, &id, &active(&["hi@orphan.co"]))
        .await
        .unwrap();
    harness.pipeline.distribute_to_qualifiers(&verifier).await.unwrap();
    harness
        .pipeline
        .set_lq_status(&lq, &id, "QUALIFIED")
        .await
        .unwrap();

    let err = harness
        .pipeline
        .submit_to_manager(
            &lq,
            &id,
            &Submission {
                selected_emails: vec!["hi@orphan.co".into()],
                ..Submission::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeadflowError::PreconditionFailed(_)));

    let lead = harness.store.get_lead(&id).await.unwrap().unwrap();
    assert_eq!(lead.stage, Stage::Lq);
}
