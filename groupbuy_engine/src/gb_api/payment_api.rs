use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MerchantRef, PaymentStatus},
    events::{EventProducers, ParticipantPaidEvent, ParticipantRefundedEvent, RefundReason},
    gb_api::payment_objects::{GatewayPaymentStatus, WebhookOutcome},
    traits::{GroupBuyDatabase, GroupBuyError, PaymentConfirmation},
};

/// `PaymentApi` applies payment updates reported by the gateway to campaign participants.
///
/// All methods are idempotent. Delivering the same update twice leaves the database exactly as the first delivery
/// did, and the second call reports [`WebhookOutcome::AlreadyProcessed`].
pub struct PaymentApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B> PaymentApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentApi<B>
where B: GroupBuyDatabase
{
    /// Dispatches a payment update on its status.
    pub async fn handle_payment_update(
        &self,
        merchant_ref: &str,
        status: GatewayPaymentStatus,
    ) -> Result<WebhookOutcome, GroupBuyError> {
        match status {
            GatewayPaymentStatus::Paid => self.confirm_payment(merchant_ref).await,
            GatewayPaymentStatus::Failed | GatewayPaymentStatus::Expired => self.payment_failed(merchant_ref).await,
            GatewayPaymentStatus::Refund | GatewayPaymentStatus::Unknown => {
                info!("🪝️ Ignoring {status} update for {merchant_ref}");
                Ok(WebhookOutcome::Ignored(status))
            },
        }
    }

    /// Marks the participant as paid and counts their quantity towards the campaign.
    ///
    /// If the campaign cannot take the quantity any more, the participant is marked for refund instead, and a
    /// refund event is published.
    pub async fn confirm_payment(&self, merchant_ref: &str) -> Result<WebhookOutcome, GroupBuyError> {
        let participant_id = match participant_id(merchant_ref) {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };
        match self.db.confirm_payment(participant_id).await? {
            PaymentConfirmation::Counted { participant, campaign } => {
                info!(
                    "🪝️ Payment for {merchant_ref} received. Campaign #{} now has {}/{} units",
                    campaign.id, campaign.current_quantity, campaign.target_quantity
                );
                let event = ParticipantPaidEvent::new(participant.clone(), campaign);
                self.producers.participant_paid(event).await;
                Ok(WebhookOutcome::Counted(participant))
            },
            PaymentConfirmation::AlreadySettled(participant) => {
                info!("🪝️ {merchant_ref} is already {}. Nothing to do.", participant.payment_status);
                Ok(WebhookOutcome::AlreadyProcessed(participant))
            },
            PaymentConfirmation::Rejected { participant, campaign } => {
                warn!(
                    "🪝️ Payment for {merchant_ref} arrived, but campaign #{} ({}) cannot take {} more units. The \
                     participant is marked for refund.",
                    campaign.id, campaign.status, participant.quantity
                );
                let event = ParticipantRefundedEvent::new(participant.clone(), campaign, RefundReason::NotCounted);
                self.producers.participant_refunded(event).await;
                Ok(WebhookOutcome::Rejected(participant))
            },
            PaymentConfirmation::ParticipantNotFound(id) => {
                info!("🪝️ No participant #{id} for {merchant_ref}. Ignoring the payment.");
                Ok(WebhookOutcome::NotApplicable(format!("No participant matches {merchant_ref}")))
            },
        }
    }

    /// Marks a pending participant as failed, which releases their reservation.
    pub async fn payment_failed(&self, merchant_ref: &str) -> Result<WebhookOutcome, GroupBuyError> {
        let participant_id = match participant_id(merchant_ref) {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };
        if let Some(participant) = self.db.mark_payment_failed(participant_id).await? {
            info!("🪝️ Payment for {merchant_ref} failed. {} units released.", participant.quantity);
            return Ok(WebhookOutcome::MarkedFailed(participant));
        }
        match self.db.fetch_participant(participant_id).await? {
            Some(participant) => {
                if participant.payment_status == PaymentStatus::Failed {
                    debug!("🪝️ {merchant_ref} was already marked as failed");
                } else {
                    info!(
                        "🪝️ Ignoring failure notice for {merchant_ref}, which is already {}",
                        participant.payment_status
                    );
                }
                Ok(WebhookOutcome::AlreadyProcessed(participant))
            },
            None => {
                info!("🪝️ No participant #{participant_id} for {merchant_ref}. Ignoring the failure notice.");
                Ok(WebhookOutcome::NotApplicable(format!("No participant matches {merchant_ref}")))
            },
        }
    }
}

fn participant_id(merchant_ref: &str) -> Result<i64, WebhookOutcome> {
    merchant_ref.parse::<MerchantRef>().ok().and_then(|r| r.participant_id()).ok_or_else(|| {
        info!("🪝️ {merchant_ref} is not a group-buy reference. Ignoring it.");
        WebhookOutcome::NotApplicable(format!("{merchant_ref} is not a group-buy reference"))
    })
}
