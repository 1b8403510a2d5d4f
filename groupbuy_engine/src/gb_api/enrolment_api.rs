use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use panen_common::Rupiah;

use crate::{
    db_types::{Campaign, NewParticipant, Participant, PaymentStatus},
    gb_api::campaign_objects::{Actor, JoinCampaignRequest, JoinedCampaign, DEFAULT_PAYMENT_METHOD},
    traits::{GroupBuyDatabase, GroupBuyError, PaymentItem, PaymentProvider, PaymentRequest},
};

/// `EnrolmentApi` lets buyers join campaigns and pay for their share through the payment gateway.
///
/// Joining is a sequence of dependent steps. The participant row is written first, and the gateway transaction is
/// created afterwards. If the gateway call fails, the participant stays `pending` without a gateway reference, and
/// [`EnrolmentApi::retry_payment`] can create the transaction later under the same merchant reference.
pub struct EnrolmentApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> Debug for EnrolmentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnrolmentApi")
    }
}

impl<B, G> EnrolmentApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> EnrolmentApi<B, G>
where
    B: GroupBuyDatabase,
    G: PaymentProvider,
{
    /// Joins the actor to the campaign and creates their payment transaction.
    ///
    /// The capacity check and the insert happen in one guarded statement. Pending and paid participants together
    /// can never hold more than the campaign's target, however many joins race.
    pub async fn join_campaign(
        &self,
        actor: &Actor,
        campaign_id: i64,
        req: JoinCampaignRequest,
    ) -> Result<JoinedCampaign, GroupBuyError> {
        self.join_campaign_at(actor, campaign_id, req, Utc::now()).await
    }

    pub async fn join_campaign_at(
        &self,
        actor: &Actor,
        campaign_id: i64,
        req: JoinCampaignRequest,
        now: DateTime<Utc>,
    ) -> Result<JoinedCampaign, GroupBuyError> {
        if req.quantity <= 0 {
            return Err(GroupBuyError::ValidationFailed("quantity must be a positive integer".into()));
        }
        let method = payment_method(req.payment_method)?;
        let campaign = self.open_campaign(campaign_id, now).await?;
        let new_participant =
            NewParticipant { campaign_id, user_id: actor.user_id.clone(), quantity: req.quantity };
        let participant = match self.db.insert_participant(new_participant, now).await? {
            Some(p) => p,
            None => return Err(self.explain_rejected_join(actor, campaign_id, req.quantity, now).await),
        };
        info!(
            "🛒️ {} joined campaign #{campaign_id} with {} units ({}). Participant #{}",
            actor.user_id, participant.quantity, participant.total_price, participant.id
        );
        self.create_payment(actor, &campaign, participant, method).await
    }

    /// Creates a fresh gateway transaction for the actor's existing seat in the campaign.
    ///
    /// * `pending` participants (typically left without a transaction by a gateway failure) simply get a new one.
    /// * `failed` participants are re-opened, provided the campaign can still hold their quantity.
    /// * `paid` or `refunded` participants have nothing left to pay.
    pub async fn retry_payment(
        &self,
        actor: &Actor,
        campaign_id: i64,
        payment_method: Option<String>,
    ) -> Result<JoinedCampaign, GroupBuyError> {
        let now = Utc::now();
        let method = self::payment_method(payment_method)?;
        let campaign = self.open_campaign(campaign_id, now).await?;
        let participant = self.db.fetch_participant_for_user(campaign_id, &actor.user_id).await?.ok_or_else(|| {
            GroupBuyError::ParticipantNotFound(format!("{} has not joined campaign #{campaign_id}", actor.user_id))
        })?;
        let participant = match participant.payment_status {
            PaymentStatus::Pending => participant,
            PaymentStatus::Failed => match self.db.reopen_participant(participant.id).await? {
                Some(p) => {
                    debug!("🛒️ Participant #{} re-opened for another payment attempt", p.id);
                    p
                },
                None => return Err(self.explain_rejected_join(actor, campaign_id, participant.quantity, now).await),
            },
            status @ (PaymentStatus::Paid | PaymentStatus::Refunded) => {
                return Err(GroupBuyError::PaymentAlreadySettled(participant.id, status));
            },
        };
        info!("🛒️ Retrying payment for participant #{} in campaign #{campaign_id}", participant.id);
        self.create_payment(actor, &campaign, participant, method).await
    }

    async fn create_payment(
        &self,
        actor: &Actor,
        campaign: &Campaign,
        participant: Participant,
        method: String,
    ) -> Result<JoinedCampaign, GroupBuyError> {
        let merchant_ref = participant.merchant_ref();
        let item_name = self.item_name(campaign).await?;
        // Participants keep the price they joined at, even if the campaign price changed since
        let unit_price = Rupiah::from(participant.total_price.value() / participant.quantity.max(1));
        let request = PaymentRequest {
            merchant_ref: merchant_ref.clone(),
            amount: participant.total_price,
            customer_name: actor.customer_name(),
            customer_email: actor.customer_email(),
            items: vec![PaymentItem { name: item_name, price: unit_price, quantity: participant.quantity }],
            method,
        };
        let payment_details = self.gateway.create_transaction(request).await.map_err(|e| {
            error!(
                "🛒️ Could not create a payment transaction for {merchant_ref}. The participant remains pending \
                 until the payment is retried. {e}"
            );
            GroupBuyError::from(e)
        })?;
        let participant = self.db.set_gateway_reference(participant.id, &payment_details.reference).await?;
        debug!("🛒️ {merchant_ref} has gateway reference {}", payment_details.reference);
        Ok(JoinedCampaign { participant, payment_details })
    }

    async fn open_campaign(&self, campaign_id: i64, now: DateTime<Utc>) -> Result<Campaign, GroupBuyError> {
        let campaign =
            self.db.fetch_campaign(campaign_id).await?.ok_or(GroupBuyError::CampaignNotFound(campaign_id))?;
        if !campaign.is_active() || campaign.has_expired(now) {
            return Err(GroupBuyError::CampaignNotActive(campaign_id));
        }
        Ok(campaign)
    }

    async fn item_name(&self, campaign: &Campaign) -> Result<String, GroupBuyError> {
        let name = match self.db.fetch_product(campaign.product_id).await? {
            Some(product) => format!("Patungan: {}", product.title),
            None => format!("Patungan #{}", campaign.id),
        };
        Ok(name)
    }

    /// Works out why the guarded insert (or re-open) declined, in order of precedence.
    async fn explain_rejected_join(
        &self,
        actor: &Actor,
        campaign_id: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> GroupBuyError {
        let explain = async {
            if let Some(p) = self.db.fetch_participant_for_user(campaign_id, &actor.user_id).await? {
                if p.payment_status != PaymentStatus::Failed {
                    return Ok(GroupBuyError::AlreadyJoined(campaign_id));
                }
            }
            let campaign =
                self.db.fetch_campaign(campaign_id).await?.ok_or(GroupBuyError::CampaignNotFound(campaign_id))?;
            if !campaign.is_active() || campaign.has_expired(now) {
                return Ok(GroupBuyError::CampaignNotActive(campaign_id));
            }
            let reserved = self.db.reserved_quantity(campaign_id).await?;
            let available = (campaign.target_quantity - reserved).max(0);
            Ok(GroupBuyError::CapacityExceeded { campaign_id, requested: quantity, available })
        };
        let reason: Result<GroupBuyError, GroupBuyError> = explain.await;
        let reason = reason.unwrap_or_else(|e| e);
        debug!("🛒️ {} could not take {quantity} units of campaign #{campaign_id}: {reason}", actor.user_id);
        reason
    }
}

fn payment_method(method: Option<String>) -> Result<String, GroupBuyError> {
    match method {
        None => Ok(DEFAULT_PAYMENT_METHOD.to_string()),
        Some(m) if m.trim().is_empty() => Ok(DEFAULT_PAYMENT_METHOD.to_string()),
        Some(m) if m.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => Ok(m.trim().to_uppercase()),
        Some(m) => Err(GroupBuyError::ValidationFailed(format!("Invalid payment method: {m}"))),
    }
}
