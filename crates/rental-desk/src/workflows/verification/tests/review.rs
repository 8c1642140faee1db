use super::common::*;
use crate::workflows::verification::api::{ApiError, MockVerificationApi};
use crate::workflows::verification::desk::DeskError;
use crate::workflows::verification::domain::{ReviewAction, VerificationId, VerificationStatus};
use crate::workflows::verification::validation::ValidationError;

#[tokio::test]
async fn reject_without_remark_never_reaches_the_api() {
    // No expectations: any API call would panic.
    let mut desk = desk(MockVerificationApi::new());

    for remark in [None, Some(""), Some("   ")] {
        match desk.review("abc123", ReviewAction::Reject, remark).await {
            Err(DeskError::Validation(ValidationError::MissingRemark)) => {}
            other => panic!("expected missing remark, got {other:?}"),
        }
    }

    assert_eq!(
        error_messages(&desk),
        vec!["a remark is required to reject a verification"; 3]
    );
}

#[tokio::test]
async fn reject_sends_trimmed_remark() {
    let mut api = MockVerificationApi::new();
    api.expect_review()
        .withf(|id, decision| {
            id.as_str() == "abc123"
                && decision.action() == ReviewAction::Reject
                && decision.remark() == Some("address proof missing")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let mut desk = desk(api);
    let receipt = desk
        .review(
            "abc123",
            ReviewAction::Reject,
            Some("  address proof missing  "),
        )
        .await
        .expect("review accepted");

    assert_eq!(receipt.status, VerificationStatus::Rejected);
    assert_eq!(info_messages(&desk), vec!["Verification rejected"]);
}

#[tokio::test]
async fn approve_refreshes_each_view_showing_the_record_once() {
    let mut api = MockVerificationApi::new();

    let mut list_calls = 0;
    api.expect_list_assignments()
        .times(2)
        .returning(move |_, _| {
            list_calls += 1;
            let status = if list_calls == 1 {
                VerificationStatus::UnderReview
            } else {
                VerificationStatus::Verified
            };
            Ok(vec![
                record("v-1", "t-1", status),
                record("v-2", "t-2", VerificationStatus::UnderReview),
            ])
        });

    let mut record_calls = 0;
    api.expect_fetch_verification()
        .withf(|id| id.as_str() == "v-1")
        .times(2)
        .returning(move |_| {
            record_calls += 1;
            let status = if record_calls == 1 {
                VerificationStatus::UnderReview
            } else {
                VerificationStatus::Verified
            };
            Ok(record("v-1", "t-1", status))
        });

    api.expect_fetch_landlord()
        .times(2)
        .returning(|_| Ok(landlord("l-1", Some("v-1"))));

    api.expect_review()
        .withf(|id, decision| {
            id.as_str() == "v-1"
                && decision.action() == ReviewAction::Approve
                && decision.remark().is_none()
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let mut desk = desk(api);
    desk.open_assignments("l-1", "r-1").await.expect("list loads");
    desk.open_record("v-1").await.expect("record loads");
    desk.open_landlord("l-1").await.expect("landlord loads");

    let receipt = desk
        .review("v-1", ReviewAction::Approve, Some("ignored"))
        .await
        .expect("review accepted");
    assert_eq!(receipt.status, VerificationStatus::Verified);

    let state = desk.state();
    let list = state.assignments.as_ref().expect("list present");
    assert_eq!(
        list.get(&VerificationId::new("v-1")).map(|record| record.status),
        Some(VerificationStatus::Verified)
    );
    assert_eq!(
        state.record.as_ref().map(|record| record.status),
        Some(VerificationStatus::Verified)
    );
    assert!(error_messages(&desk).is_empty());
}

#[tokio::test]
async fn review_of_unrelated_record_refreshes_nothing() {
    let mut api = MockVerificationApi::new();
    api.expect_fetch_landlord()
        .times(1)
        .returning(|_| Ok(landlord("l-1", Some("v-standalone"))));
    api.expect_review().times(1).returning(|_, _| Ok(()));

    let mut desk = desk(api);
    desk.open_landlord("l-1").await.expect("landlord loads");
    desk.review("v-other", ReviewAction::Approve, None)
        .await
        .expect("review accepted");
}

#[tokio::test]
async fn resolved_records_held_by_the_desk_are_not_reviewed_again() {
    let mut api = MockVerificationApi::new();
    api.expect_fetch_verification()
        .times(1)
        .returning(|_| Ok(record("v-9", "t-9", VerificationStatus::Verified)));

    let mut desk = desk(api);
    desk.open_record("v-9").await.expect("record loads");

    match desk.review("v-9", ReviewAction::Reject, Some("late")).await {
        Err(DeskError::Validation(ValidationError::AlreadyResolved { status, .. })) => {
            assert_eq!(status, VerificationStatus::Verified)
        }
        other => panic!("expected already resolved, got {other:?}"),
    }

    let held = desk.state().record.as_ref().expect("record held");
    let controls = desk.review_controls(held);
    assert!(!controls.approve_enabled);
    assert!(!controls.panel_visible);
}

#[tokio::test]
async fn server_message_is_surfaced_and_fallback_used_otherwise() {
    let mut api = MockVerificationApi::new();
    let mut calls = 0;
    api.expect_review().times(2).returning(move |_, _| {
        calls += 1;
        if calls == 1 {
            Err(ApiError::Rejected {
                message: Some("Verification already processed".to_string()),
            })
        } else {
            Err(ApiError::Status {
                status: 502,
                message: None,
            })
        }
    });

    let mut desk = desk(api);
    assert!(desk.review("v-1", ReviewAction::Approve, None).await.is_err());
    assert!(desk.review("v-1", ReviewAction::Approve, None).await.is_err());

    assert_eq!(
        error_messages(&desk),
        vec![
            "Verification already processed".to_string(),
            "Failed to submit review".to_string(),
        ]
    );
}

#[tokio::test]
async fn blank_verification_id_is_a_validation_failure() {
    let mut desk = desk(MockVerificationApi::new());
    match desk.review("  ", ReviewAction::Approve, None).await {
        Err(DeskError::Validation(ValidationError::BlankIdentifier { field })) => {
            assert_eq!(field, "verification id")
        }
        other => panic!("expected blank id, got {other:?}"),
    }
}

#[tokio::test]
async fn review_stands_when_the_record_reload_fails() {
    let mut api = MockVerificationApi::new();
    let mut record_calls = 0;
    api.expect_fetch_verification()
        .times(2)
        .returning(move |_| {
            record_calls += 1;
            if record_calls == 1 {
                Ok(record("v-1", "t-1", VerificationStatus::UnderReview))
            } else {
                Err(ApiError::Status {
                    status: 503,
                    message: None,
                })
            }
        });
    api.expect_review().times(1).returning(|_, _| Ok(()));

    let mut desk = desk(api);
    desk.open_record("v-1").await.expect("record loads");
    let receipt = desk
        .review("v-1", ReviewAction::Approve, None)
        .await
        .expect("review stands");

    assert_eq!(receipt.verification_id, VerificationId::new("v-1"));
    assert_eq!(receipt.status, VerificationStatus::Verified);
    assert_eq!(info_messages(&desk), vec!["Verification approved"]);
    assert_eq!(
        error_messages(&desk),
        vec!["Failed to load verification details"]
    );
    assert_eq!(
        desk.state().record.as_ref().map(|record| record.status),
        Some(VerificationStatus::UnderReview)
    );
}
