use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Days, Utc};
use groupbuy_engine::{
    db_types::{CampaignUpdate, PaymentStatus},
    GroupBuyError,
};
use serde_json::json;

use super::helpers::{campaign, participant, product, send_request, store, with_token, TestBackend};

fn new_campaign_body() -> serde_json::Value {
    json!({
        "product_id": 3,
        "store_id": 1,
        "group_price": 80000,
        "target_quantity": 10,
        "end_date": (Utc::now() + Days::new(5)).to_rfc3339(),
    })
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/health"), TestBackend::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn list_campaigns_is_public() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_active_campaigns().times(1).returning(|| Ok(vec![campaign(7, 4)]));
    let (status, body) = send_request(TestRequest::get().uri("/group-buy"), backend).await;
    assert_eq!(status, StatusCode::OK);
    let campaigns: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(campaigns[0]["id"], 7);
    assert_eq!(campaigns[0]["current_quantity"], 4);
    assert_eq!(campaigns[0]["status"], "active");
}

#[actix_web::test]
async fn campaign_details_include_participants() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 3))));
    backend
        .campaigns
        .expect_fetch_participants()
        .returning(|_| Ok(vec![participant(12, "alice", 3, PaymentStatus::Paid)]));
    let (status, body) = send_request(TestRequest::get().uri("/group-buy/7"), backend).await;
    assert_eq!(status, StatusCode::OK);
    let details: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(details["id"], 7);
    assert_eq!(details["participants"][0]["quantity"], 3);
    assert_eq!(details["participants"][0]["payment_status"], "paid");
    // Buyers' identities are not part of the public view
    assert!(details["participants"][0].get("user_id").is_none());
}

#[actix_web::test]
async fn unknown_campaign() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_campaign().returning(|_| Ok(None));
    let (status, body) = send_request(TestRequest::get().uri("/group-buy/99"), backend).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Campaign #99 does not exist"}"#);
}

#[actix_web::test]
async fn create_campaign_without_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/group-buy").set_json(new_campaign_body());
    let (status, body) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No bearer token was provided"));
}

#[actix_web::test]
async fn create_campaign_with_invalid_token() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::post().uri("/group-buy"), "forged").set_json(new_campaign_body());
    let (status, body) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid bearer token");
}

#[actix_web::test]
async fn malformed_authorization_header() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/group-buy").insert_header(("Authorization", "Basic YWxpY2U6c2VjcmV0"));
    let (status, _) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn only_the_store_owner_creates_campaigns() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_store().returning(|_| Ok(Some(store("store-owner"))));
    backend.campaigns.expect_insert_campaign().never();
    let req = with_token(TestRequest::post().uri("/group-buy"), "alice-token").set_json(new_campaign_body());
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Only the owner of store #1 may manage its campaigns"}"#);
}

#[actix_web::test]
async fn create_campaign() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_store().returning(|_| Ok(Some(store("store-owner"))));
    backend.campaigns.expect_fetch_product().returning(|_| Ok(Some(product())));
    backend
        .campaigns
        .expect_insert_campaign()
        .withf(|c| c.product_id == 3 && c.store_id == 1 && c.target_quantity == 10)
        .times(1)
        .returning(|_| Ok(campaign(7, 0)));
    let req = with_token(TestRequest::post().uri("/group-buy"), "store-owner-token").set_json(new_campaign_body());
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::CREATED);
    let campaign: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(campaign["id"], 7);
    assert_eq!(campaign["group_price"], 80000);
}

#[actix_web::test]
async fn campaign_must_end_in_the_future() {
    let _ = env_logger::try_init().ok();
    let mut body = new_campaign_body();
    body["end_date"] = json!((Utc::now() - Days::new(1)).to_rfc3339());
    let req = with_token(TestRequest::post().uri("/group-buy"), "store-owner-token").set_json(body);
    let (status, body) = send_request(req, TestBackend::default()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("end_date must be in the future"));
}

#[actix_web::test]
async fn update_campaign() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 2))));
    backend.campaigns.expect_fetch_store().returning(|_| Ok(Some(store("store-owner"))));
    backend
        .campaigns
        .expect_update_campaign()
        .withf(|id, update| *id == 7 && update == &CampaignUpdate { target_quantity: Some(12), ..Default::default() })
        .returning(|id, _| {
            let mut c = campaign(id, 2);
            c.target_quantity = 12;
            Ok(Some(c))
        });
    let req = with_token(TestRequest::put().uri("/group-buy/7"), "store-owner-token")
        .set_json(json!({ "target_quantity": 12 }));
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::OK);
    let campaign: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(campaign["target_quantity"], 12);
}

#[actix_web::test]
async fn delete_campaign_with_participants() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 2))));
    backend.campaigns.expect_fetch_store().returning(|_| Ok(Some(store("store-owner"))));
    backend.campaigns.expect_delete_campaign().times(1).returning(|_| Ok(false));
    let req = with_token(TestRequest::delete().uri("/group-buy/7"), "store-owner-token");
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Cancel it instead"));
}

#[actix_web::test]
async fn delete_empty_campaign() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend.campaigns.expect_fetch_campaign().returning(|id| Ok(Some(campaign(id, 0))));
    backend.campaigns.expect_fetch_store().returning(|_| Ok(Some(store("store-owner"))));
    backend.campaigns.expect_delete_campaign().times(1).returning(|_| Ok(true));
    let req = with_token(TestRequest::delete().uri("/group-buy/7"), "store-owner-token");
    let (status, body) = send_request(req, backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Campaign #7 deleted"}"#);
}

#[actix_web::test]
async fn database_errors_are_internal() {
    let _ = env_logger::try_init().ok();
    let mut backend = TestBackend::default();
    backend
        .campaigns
        .expect_fetch_active_campaigns()
        .returning(|| Err(GroupBuyError::DatabaseError("database is locked".into())));
    let (status, _) = send_request(TestRequest::get().uri("/group-buy"), backend).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
