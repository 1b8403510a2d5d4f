//! Push notifications for group-buy participants.
//!
//! Notifications are fire-and-forget. They are sent from event hooks, after the engine has committed the change they
//! describe, and a failed delivery is logged and otherwise ignored.
use std::time::Duration;

use futures::future::BoxFuture;
use groupbuy_engine::{
    db_types::UserId,
    events::{EventHandlers, EventHooks, OrderCreatedEvent, ParticipantPaidEvent, ParticipantRefundedEvent, RefundReason},
};
use log::*;
use reqwest::{header::AUTHORIZATION, Client};
use serde::{Deserialize, Serialize};

use crate::{config::NotificationConfig, errors::ServerError};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

impl NotificationPayload {
    pub fn new<T: Into<String>, B: Into<String>, U: Into<String>>(title: T, body: B, url: U) -> Self {
        Self { title: title.into(), body: body.into(), data: NotificationData { url: url.into() } }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: UserId,
    pub payload: NotificationPayload,
}

pub fn payment_received(event: &ParticipantPaidEvent) -> Notification {
    let participant = &event.participant;
    Notification {
        user_id: participant.user_id.clone(),
        payload: NotificationPayload::new(
            "Pembayaran Diterima ✅",
            format!(
                "Pembayaran {} untuk {} unit sudah kami terima. Terkumpul {}/{} unit.",
                participant.total_price,
                participant.quantity,
                event.campaign.current_quantity,
                event.campaign.target_quantity
            ),
            format!("/patungan/{}", event.campaign.id),
        ),
    }
}

pub fn group_buy_succeeded(event: &OrderCreatedEvent) -> Notification {
    Notification {
        user_id: event.participant.user_id.clone(),
        payload: NotificationPayload::new(
            "Patungan Berhasil! 🎉",
            "Patungan telah mencapai target. Pesanan Anda akan segera diproses oleh penjual.",
            format!("/transaksi/{}", event.order.order.id),
        ),
    }
}

pub fn group_buy_refunded(event: &ParticipantRefundedEvent) -> Notification {
    let body = match event.reason {
        RefundReason::CampaignFailed => {
            "Patungan tidak mencapai target. Dana Anda akan segera kami proses untuk pengembalian."
        },
        RefundReason::CampaignCancelled => {
            "Patungan dibatalkan oleh penjual. Dana Anda akan segera kami proses untuk pengembalian."
        },
        RefundReason::NotCounted => {
            "Pembayaran Anda diterima setelah patungan penuh atau ditutup. Dana Anda akan segera kami kembalikan."
        },
    };
    Notification {
        user_id: event.participant.user_id.clone(),
        payload: NotificationPayload::new("Patungan Gagal 🙁", body, "/patungan"),
    }
}

/// Client for the push-notification function.
#[derive(Clone)]
pub struct PushNotifier {
    url: String,
    config: NotificationConfig,
    client: Client,
}

impl std::fmt::Debug for PushNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PushNotifier({})", self.url)
    }
}

impl PushNotifier {
    /// Returns `None` if notifications are switched off.
    pub fn new(config: NotificationConfig) -> Result<Option<Self>, ServerError> {
        let Some(url) = config.url.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the notification client. {e}")))?;
        Ok(Some(Self { url, config, client }))
    }

    pub async fn notify(&self, notification: Notification) {
        let user = notification.user_id.clone();
        let mut request = self.client.post(&self.url).json(&notification);
        if self.config.api_key.is_set() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", self.config.api_key.reveal()));
        }
        match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => debug!("📬️ Notification \"{}\" sent to {user}", notification.payload.title),
            Err(e) => warn!("📬️ Could not send notification to {user}. {e}"),
        }
    }

    fn send(&self, notification: Notification) -> BoxFuture<'static, ()> {
        let notifier = self.clone();
        Box::pin(async move { notifier.notify(notification).await })
    }
}

/// Builds event handlers that push a notification for every payment, order and refund.
pub fn create_notification_event_handlers(notifier: PushNotifier) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let on_paid = notifier.clone();
    let on_order = notifier.clone();
    hooks
        .on_participant_paid(move |ev| on_paid.send(payment_received(&ev)))
        .on_order_created(move |ev| on_order.send(group_buy_succeeded(&ev)))
        .on_participant_refunded(move |ev| notifier.send(group_buy_refunded(&ev)));
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}
