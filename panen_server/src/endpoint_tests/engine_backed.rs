//! Callbacks sent through the full app, against a real SQLite database.
use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use groupbuy_engine::{
    campaign_objects::{Actor, JoinCampaignRequest, JoinedCampaign},
    db_types::{Campaign, PaymentStatus},
    events::EventProducers,
    test_utils::{
        mock_gateway::MockGateway,
        prepare_env::{new_test_db, seed_open_campaign, seed_store},
    },
    CampaignApi,
    EnrolmentApi,
    GroupBuyDatabase,
    PaymentApi,
    SqliteDatabase,
};
use panen_common::Secret;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use super::{
    helpers::{callback_request, paid_callback, TEST_CALLBACK_KEY},
    mocks::StaticIdentity,
};
use crate::{middleware::IdentityMiddlewareFactory, server::configure_routes};

async fn setup() -> (SqliteDatabase, Campaign, JoinedCampaign) {
    let db = new_test_db().await;
    let (_, product) = seed_store(&db, "owner").await;
    let campaign = seed_open_campaign(&db, &product, 80_000, 10).await;
    let enrolment = EnrolmentApi::new(db.clone(), MockGateway::new());
    let joined = enrolment
        .join_campaign(&Actor::new("alice", None), campaign.id, JoinCampaignRequest::new(3))
        .await
        .expect("Error joining campaign");
    (db, campaign, joined)
}

async fn send(db: &SqliteDatabase, req: TestRequest) -> StatusCode {
    let producers = EventProducers::default();
    let campaigns = web::Data::new(CampaignApi::new(db.clone(), producers.clone()));
    let enrolment = web::Data::new(EnrolmentApi::new(db.clone(), MockGateway::new()));
    let payments = web::Data::new(PaymentApi::new(db.clone(), producers));
    let app = App::new().wrap(IdentityMiddlewareFactory::new(Arc::new(StaticIdentity))).configure(move |cfg| {
        cfg.app_data(campaigns).app_data(enrolment).app_data(payments);
        configure_routes::<SqliteDatabase, MockGateway>(cfg, Secret::new(TEST_CALLBACK_KEY.to_string()));
    });
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.status(),
        Err(e) => e.error_response().status(),
    }
}

async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    let _ = db.close().await;
    let _ = Sqlite::drop_database(&url).await;
}

#[actix_web::test]
async fn forged_callback_leaves_the_campaign_untouched() {
    let _ = env_logger::try_init().ok();
    let (db, campaign, joined) = setup().await;
    let merchant_ref = joined.participant.merchant_ref().to_string();
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("X-Callback-Signature", "4f1b0c0ffee0000000000000000000000000000000000000000000000000000a"))
        .insert_header(("X-Callback-Event", "payment_status"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(paid_callback(&merchant_ref));
    assert_eq!(send(&db, req).await, StatusCode::UNAUTHORIZED);

    let unsigned = TestRequest::post().uri("/payments/webhook").set_payload(paid_callback(&merchant_ref));
    assert_eq!(send(&db, unsigned).await, StatusCode::UNAUTHORIZED);

    let stored = db.fetch_campaign(campaign.id).await.unwrap().unwrap();
    assert_eq!(stored.current_quantity, 0);
    let participant = db.fetch_participant(joined.participant.id).await.unwrap().unwrap();
    assert_eq!(participant.payment_status, PaymentStatus::Pending);
    tear_down(db).await;
}

#[actix_web::test]
async fn signed_callback_counts_the_payment() {
    let _ = env_logger::try_init().ok();
    let (db, campaign, joined) = setup().await;
    let merchant_ref = joined.participant.merchant_ref().to_string();
    let req = callback_request(&paid_callback(&merchant_ref));
    assert_eq!(send(&db, req).await, StatusCode::OK);

    let stored = db.fetch_campaign(campaign.id).await.unwrap().unwrap();
    assert_eq!(stored.current_quantity, 3);
    let participant = db.fetch_participant(joined.participant.id).await.unwrap().unwrap();
    assert_eq!(participant.payment_status, PaymentStatus::Paid);
    tear_down(db).await;
}
