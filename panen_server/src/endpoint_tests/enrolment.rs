use actix_web::{http::StatusCode, test::TestRequest};
use groupbuy_engine::{db_types::PaymentStatus, traits::PaymentProviderError};
use mockall::predicate::eq;
use serde_json::json;

use super::helpers::{campaign, participant, payment_details, product, send_request, with_token, TestBackend};

fn join_request(quantity: i64) -> TestRequest {
    with_token(TestRequest::post().uri("/group-buy/7/join"), "alice-token").set_json(json!({ "quantity": quantity }))
}

#[actix_web::test]
async fn join_campaign() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().with(eq(7)).returning(|id| Ok(Some(campaign(id, 4))));
    backend.enrolment.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend
        .enrolment
        .expect_insert_participant()
        .withf(|p, _| p.campaign_id == 7 && p.user_id.as_str() == "alice" && p.quantity == 3)
        .times(1)
        .returning(|p, _| {
            let mut joined = participant(12, "alice", p.quantity, PaymentStatus::Pending);
            joined.gateway_reference = None;
            Ok(Some(joined))
        });
    backend
        .gateway
        .expect_create_transaction()
        .withf(|r| {
            r.merchant_ref.as_str() == "GB-12" &&
                r.amount.value() == 240_000 &&
                r.method == "QRIS" &&
                r.customer_email == "alice@example.com" &&
                r.items[0].name == "Patungan: Beras Pandan Wangi 5kg"
        })
        .times(1)
        .returning(|r| Ok(payment_details(r.merchant_ref.as_str(), r.amount.value())));
    backend
        .enrolment
        .expect_set_gateway_reference()
        .withf(|id, reference| *id == 12 && reference.to_string() == "DEV-T12345")
        .times(1)
        .returning(|id, _| Ok(participant(id, "alice", 3, PaymentStatus::Pending)));
    let (status, body) = send_request(join_request(3), backend).await;
    assert_eq!(status, StatusCode::CREATED);
    let joined: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(joined["participant"]["id"], 12);
    assert_eq!(joined["participant"]["payment_status"], "pending");
    assert_eq!(joined["payment_details"]["merchant_ref"], "GB-12");
    assert_eq!(joined["payment_details"]["checkout_url"], "https://tripay.co.id/checkout/DEV-T12345");
}

#[actix_web::test]
async fn join_requires_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/group-buy/7/join").set_json(json!({ "quantity": 1 }));
    let (status, _) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn join_twice() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 4))));
    backend.enrolment.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend.enrolment.expect_insert_participant().returning(|_, _| Ok(None));
    backend
        .enrolment
        .expect_fetch_participant_for_user()
        .returning(|_, _| Ok(Some(participant(12, "alice", 3, PaymentStatus::Paid))));
    backend.gateway.expect_create_transaction().never();
    let (status, body) = send_request(join_request(1), backend).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"You have already joined campaign #7"}"#);
}

#[actix_web::test]
async fn join_beyond_capacity() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 8))));
    backend.enrolment.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend.enrolment.expect_insert_participant().returning(|_, _| Ok(None));
    backend.enrolment.expect_fetch_participant_for_user().returning(|_, _| Ok(None));
    backend.enrolment.expect_reserved_quantity().returning(|_| Ok(8));
    backend.gateway.expect_create_transaction().never();
    let (status, body) = send_request(join_request(3), backend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Campaign #7 cannot take 3 more. Only 2 left."}"#);
}

#[actix_web::test]
async fn join_with_invalid_quantity() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(join_request(0), TestBackend::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("quantity must be a positive integer"));
}

#[actix_web::test]
async fn gateway_failure_leaves_participant_pending() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 4))));
    backend.enrolment.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend
        .enrolment
        .expect_insert_participant()
        .times(1)
        .returning(|p, _| Ok(Some(participant(12, "alice", p.quantity, PaymentStatus::Pending))));
    backend
        .gateway
        .expect_create_transaction()
        .returning(|_| Err(PaymentProviderError::Unavailable("connection refused".into())));
    backend.enrolment.expect_set_gateway_reference().never();
    let (status, body) = send_request(join_request(2), backend).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Payment gateway error"));
}

#[actix_web::test]
async fn retry_payment_for_failed_participant() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 4))));
    backend
        .enrolment
        .expect_fetch_participant_for_user()
        .returning(|_, _| Ok(Some(participant(12, "alice", 2, PaymentStatus::Failed))));
    backend
        .enrolment
        .expect_reopen_participant()
        .with(eq(12))
        .times(1)
        .returning(|id| Ok(Some(participant(id, "alice", 2, PaymentStatus::Pending))));
    backend.enrolment.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend
        .gateway
        .expect_create_transaction()
        .withf(|r| r.merchant_ref.as_str() == "GB-12" && r.method == "BRIVA")
        .returning(|r| Ok(payment_details(r.merchant_ref.as_str(), r.amount.value())));
    backend
        .enrolment
        .expect_set_gateway_reference()
        .returning(|id, _| Ok(participant(id, "alice", 2, PaymentStatus::Pending)));
    let req = with_token(TestRequest::post().uri("/group-buy/7/payment"), "alice-token")
        .set_json(json!({ "payment_method": "briva" }));
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::OK);
    let joined: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(joined["payment_details"]["merchant_ref"], "GB-12");
}

#[actix_web::test]
async fn retry_payment_after_paying() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.enrolment.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 4))));
    backend
        .enrolment
        .expect_fetch_participant_for_user()
        .returning(|_, _| Ok(Some(participant(12, "alice", 2, PaymentStatus::Paid))));
    backend.gateway.expect_create_transaction().never();
    let req = with_token(TestRequest::post().uri("/group-buy/7/payment"), "alice-token");
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"The payment for participant #12 is already paid"}"#);
}
