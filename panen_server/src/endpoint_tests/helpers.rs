use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Days, Utc};
use groupbuy_engine::{
    db_types::{Campaign, CampaignStatus, Participant, PaymentStatus, Product, Store, UserId},
    events::EventProducers,
    traits::PaymentDetails,
    CampaignApi,
    EnrolmentApi,
    PaymentApi,
};
use log::debug;
use panen_common::{Rupiah, Secret};
use tripay_tools::signature::callback_signature;

use super::mocks::{MockGroupBuyStore, MockPaymentGateway, StaticIdentity};
use crate::{middleware::IdentityMiddlewareFactory, server::configure_routes};

// The callback signing key used by the tests. DO NOT re-use it anywhere.
pub const TEST_CALLBACK_KEY: &str = "DEV-test-private-key";

/// One mock per API, since each API owns its backend.
#[derive(Default)]
pub struct TestBackend {
    pub campaigns: MockGroupBuyStore,
    pub enrolment: MockGroupBuyStore,
    pub payments: MockGroupBuyStore,
    pub gateway: MockPaymentGateway,
}

impl TestBackend {
    pub fn configure(self) -> impl FnOnce(&mut ServiceConfig) {
        move |cfg| {
            let producers = EventProducers::default();
            cfg.app_data(web::Data::new(CampaignApi::new(self.campaigns, producers.clone())))
                .app_data(web::Data::new(EnrolmentApi::new(self.enrolment, self.gateway)))
                .app_data(web::Data::new(PaymentApi::new(self.payments, producers)));
            configure_routes::<MockGroupBuyStore, MockPaymentGateway>(cfg, Secret::new(TEST_CALLBACK_KEY.to_string()));
        }
    }
}

/// Sends `req` through the full app and returns the status and body. Errors raised by middleware are folded into
/// the same shape.
pub async fn send_request(req: TestRequest, backend: TestBackend) -> (StatusCode, String) {
    let app = App::new().wrap(IdentityMiddlewareFactory::new(Arc::new(StaticIdentity))).configure(backend.configure());
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.error_response().status(), e.to_string()),
    }
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}

/// A signed Tripay callback for `body`.
pub fn callback_request(body: &str) -> TestRequest {
    let key = Secret::new(TEST_CALLBACK_KEY.to_string());
    let signature = callback_signature(&key, body.as_bytes()).unwrap();
    TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("X-Callback-Signature", signature))
        .insert_header(("X-Callback-Event", "payment_status"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

pub fn paid_callback(merchant_ref: &str) -> String {
    format!(
        r#"{{"reference":"DEV-T12345","merchant_ref":"{merchant_ref}","payment_method":"QRIS","payment_method_code":"QRIS","total_amount":240000,"fee_merchant":0,"fee_customer":0,"total_fee":0,"amount_received":240000,"is_closed_payment":1,"status":"PAID","paid_at":1718000000,"note":null}}"#
    )
}

pub fn store(owner: &str) -> Store {
    Store { id: 1, owner_id: UserId::from(owner), store_name: "Kebun Makmur".into(), created_at: Utc::now() }
}

pub fn product() -> Product {
    Product {
        id: 3,
        store_id: 1,
        title: "Beras Pandan Wangi 5kg".into(),
        price: Rupiah::from(95_000),
        created_at: Utc::now(),
    }
}

pub fn campaign(id: i64, current_quantity: i64) -> Campaign {
    let now = Utc::now();
    Campaign {
        id,
        product_id: 3,
        store_id: 1,
        group_price: Rupiah::from(80_000),
        target_quantity: 10,
        current_quantity,
        start_date: now,
        end_date: now + Days::new(3),
        status: CampaignStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn participant(id: i64, user: &str, quantity: i64, status: PaymentStatus) -> Participant {
    Participant {
        id,
        campaign_id: 7,
        user_id: UserId::from(user),
        quantity,
        total_price: Rupiah::from(80_000 * quantity),
        payment_status: status,
        gateway_reference: Some("DEV-T12345".into()),
        order_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn payment_details(merchant_ref: &str, amount: i64) -> PaymentDetails {
    PaymentDetails {
        reference: "DEV-T12345".into(),
        merchant_ref: merchant_ref.into(),
        checkout_url: "https://tripay.co.id/checkout/DEV-T12345".into(),
        amount: Rupiah::from(amount),
        status: "UNPAID".into(),
        pay_code: None,
        expires_at: None,
    }
}
