use actix_web::{http::StatusCode, test::TestRequest};
use groupbuy_engine::{db_types::PaymentStatus, traits::PaymentConfirmation, GroupBuyError};
use mockall::predicate::eq;

use super::helpers::{callback_request, campaign, paid_callback, participant, send_request, TestBackend};

#[actix_web::test]
async fn callback_without_signature() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(paid_callback("GB-12"));
    // No expectations: any database call fails the test
    let (status, body) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid signature");
}

#[actix_web::test]
async fn callback_with_forged_signature() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("X-Callback-Signature", "4f1b0c0ffee0000000000000000000000000000000000000000000000000000a"))
        .set_payload(paid_callback("GB-12"));
    let (status, _) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn tampered_body_fails_verification() {
    let _ = env_logger::try_init().ok();
    let signed = callback_request(&paid_callback("GB-12"));
    let req = signed.set_payload(paid_callback("GB-13"));
    let (status, _) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn paid_callback_counts_the_payment() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.payments.expect_confirm_payment().with(eq(12)).times(1).returning(|id| {
        Ok(PaymentConfirmation::Counted {
            participant: participant(id, "alice", 3, PaymentStatus::Paid),
            campaign: campaign(7, 7),
        })
    });
    let (status, body) = send_request(callback_request(&paid_callback("GB-12")), backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"payment for participant #12 counted"}"#);
}

#[actix_web::test]
async fn duplicate_paid_callback() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend
        .payments
        .expect_confirm_payment()
        .times(1)
        .returning(|id| Ok(PaymentConfirmation::AlreadySettled(participant(id, "alice", 3, PaymentStatus::Paid))));
    let (status, body) = send_request(callback_request(&paid_callback("GB-12")), backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"participant #12 was already paid"}"#);
}

#[actix_web::test]
async fn late_payment_is_marked_for_refund() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.payments.expect_confirm_payment().returning(|id| {
        Ok(PaymentConfirmation::Rejected {
            participant: participant(id, "alice", 3, PaymentStatus::Refunded),
            campaign: campaign(7, 10),
        })
    });
    let (status, body) = send_request(callback_request(&paid_callback("GB-12")), backend).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("marked for refund"));
}

#[actix_web::test]
async fn expired_callback_releases_the_reservation() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend
        .payments
        .expect_mark_payment_failed()
        .with(eq(12))
        .times(1)
        .returning(|id| Ok(Some(participant(id, "alice", 3, PaymentStatus::Failed))));
    let body = paid_callback("GB-12").replace(r#""status":"PAID""#, r#""status":"EXPIRED""#);
    let (status, body) = send_request(callback_request(&body), backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"payment for participant #12 failed"}"#);
}

#[actix_web::test]
async fn callback_without_merchant_ref() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"reference":"DEV-T12345","status":"PAID"}"#;
    let (status, body) = send_request(callback_request(body), TestBackend::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"success":false,"message":"Invalid payload"}"#);
}

#[actix_web::test]
async fn callback_with_malformed_body() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send_request(callback_request("{not json"), TestBackend::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn foreign_merchant_ref_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(callback_request(&paid_callback("INV-2024-0042")), TestBackend::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("not a group-buy reference"));
}

#[actix_web::test]
async fn other_callback_events_are_ignored() {
    let _ = env_logger::try_init().ok();
    let req = callback_request(&paid_callback("GB-12")).insert_header(("X-Callback-Event", "payout_status"));
    let (status, body) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ignored payout_status callback"));
}

#[actix_web::test]
async fn storage_failure_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend
        .payments
        .expect_confirm_payment()
        .returning(|_| Err(GroupBuyError::DatabaseError("database is locked".into())));
    let (status, _) = send_request(callback_request(&paid_callback("GB-12")), backend).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
