use chrono::{Duration, Utc};
use cucumber::{then, when};
use groupbuy_engine::{
    db_types::{CampaignStatus, PaymentStatus, UserId},
    payment_objects::{GatewayPaymentStatus, WebhookOutcome},
    GroupBuyDatabase,
    GroupBuyError,
};
use panen_common::Rupiah;

use crate::cucumber::{world::OWNER, GroupBuyWorld};

#[when(expr = "{word} joins the campaign with {int} units")]
async fn join_campaign(world: &mut GroupBuyWorld, user: String, quantity: i64) {
    world.join(&user, quantity).await;
}

#[when(expr = "the payment for {word} is {word}")]
async fn payment_update(world: &mut GroupBuyWorld, user: String, status: String) {
    let status = match status.as_str() {
        "confirmed" => GatewayPaymentStatus::Paid,
        "failed" => GatewayPaymentStatus::Failed,
        "expired" => GatewayPaymentStatus::Expired,
        s => panic!("Unknown payment update: {s}"),
    };
    let merchant_ref = world.joined(&user).participant.merchant_ref();
    let outcome = world
        .system()
        .payments
        .handle_payment_update(merchant_ref.as_str(), status)
        .await
        .expect("Error applying payment update");
    assert!(!matches!(outcome, WebhookOutcome::NotApplicable(_)));
}

#[when("the owner cancels the campaign")]
async fn cancel_campaign(world: &mut GroupBuyWorld) {
    let campaign_id = world.campaign_id();
    let campaign =
        world.system().campaigns.cancel_campaign(&UserId::from(OWNER), campaign_id).await.expect("Error cancelling");
    world.campaign = Some(campaign);
}

#[when("the campaign ends and settlement runs")]
async fn settle(world: &mut GroupBuyWorld) {
    let later = Utc::now() + Duration::days(8);
    let report = world.system().settlement.settle_expired_campaigns(later).await.expect("Error running settlement");
    assert!(report.failed.is_empty(), "Settlement failures: {:?}", report.failed);
    world.last_report = Some(report);
}

#[then(expr = "the campaign has {int} units sold")]
async fn units_sold(world: &mut GroupBuyWorld, quantity: i64) {
    let campaign = world.system().db.fetch_campaign(world.campaign_id()).await.unwrap().unwrap();
    assert_eq!(campaign.current_quantity, quantity);
}

#[then(expr = "the campaign is {word}")]
async fn campaign_status(world: &mut GroupBuyWorld, status: String) {
    let expected = status.parse::<CampaignStatus>().expect("Not a campaign status");
    let campaign = world.system().db.fetch_campaign(world.campaign_id()).await.unwrap().unwrap();
    assert_eq!(campaign.status, expected);
}

#[then(expr = "{word} has an order for {int} IDR")]
async fn has_order(world: &mut GroupBuyWorld, user: String, amount: i64) {
    let orders = world.system().db.fetch_orders_for_user(&UserId::from(user.as_str())).await.unwrap();
    assert_eq!(orders.len(), 1, "{user} has {} orders", orders.len());
    assert_eq!(orders[0].total_amount, Rupiah::from(amount));
}

#[then(expr = "{word} has no orders")]
async fn has_no_orders(world: &mut GroupBuyWorld, user: String) {
    let orders = world.system().db.fetch_orders_for_user(&UserId::from(user.as_str())).await.unwrap();
    assert!(orders.is_empty(), "{user} has {} orders", orders.len());
}

#[then(expr = "the payment status of {word} is {word}")]
async fn payment_status(world: &mut GroupBuyWorld, user: String, status: String) {
    let expected = status.parse::<PaymentStatus>().expect("Not a payment status");
    let id = world.joined(&user).participant.id;
    let participant = world.system().db.fetch_participant(id).await.unwrap().unwrap();
    assert_eq!(participant.payment_status, expected);
}

#[then(expr = "{int} orders were created")]
async fn orders_created(world: &mut GroupBuyWorld, count: usize) {
    let report = world.last_report.as_ref().expect("Settlement has not run");
    assert_eq!(report.total_orders(), count);
}

#[then(expr = "the join is rejected because {string}")]
async fn join_rejected(world: &mut GroupBuyWorld, reason: String) {
    let err = world.last_error.as_ref().expect("The last join succeeded");
    let matched = match reason.as_str() {
        "the campaign is full" => matches!(err, GroupBuyError::CapacityExceeded { .. }),
        "they already joined" => matches!(err, GroupBuyError::AlreadyJoined(_)),
        "the campaign is closed" => matches!(err, GroupBuyError::CampaignNotActive(_)),
        r => panic!("Unknown rejection reason: {r}"),
    };
    assert!(matched, "Expected rejection because {reason}, got {err:?}");
}
