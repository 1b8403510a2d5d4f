use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Campaign, CampaignStatus, PaymentStatus},
    events::{EventProducers, OrderCreatedEvent, ParticipantRefundedEvent, RefundReason},
    gb_api::settlement_objects::{CampaignSettlement, SettlementReport},
    traits::{GroupBuyDatabase, GroupBuyError},
};

/// `SettlementApi` closes expired campaigns and carries out the consequences: orders for the participants of
/// successful campaigns, refund marking for everyone else who paid.
///
/// A sweep can be interrupted at any point and simply run again. Campaigns are closed with a conditional
/// transition, orders are only created for paid participants that do not carry one yet, and only `paid`
/// participants are ever moved to `refunded`.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> SettlementApi<B>
where B: GroupBuyDatabase
{
    pub async fn run_settlement(&self) -> Result<SettlementReport, GroupBuyError> {
        self.settle_expired_campaigns(Utc::now()).await
    }

    /// Settles every campaign that needs it as of `now`.
    ///
    /// Only the initial query can fail the sweep as a whole. Errors while settling one campaign are logged and
    /// recorded in the report, and the sweep moves on to the next campaign.
    pub async fn settle_expired_campaigns(&self, now: DateTime<Utc>) -> Result<SettlementReport, GroupBuyError> {
        let campaigns = self.db.fetch_campaigns_to_settle(now).await?;
        let mut report = SettlementReport::default();
        if campaigns.is_empty() {
            trace!("🕰️ No campaigns to settle");
            return Ok(report);
        }
        debug!("🕰️ {} campaigns to settle", campaigns.len());
        for campaign in campaigns {
            let id = campaign.id;
            match self.settle_campaign(campaign).await {
                Ok(settlement) => {
                    info!(
                        "🕰️ Campaign #{id} settled as {}. {} orders created, {} participants marked for refund",
                        settlement.status, settlement.orders_created, settlement.refunded
                    );
                    report.settled.push(settlement);
                },
                Err(e) => {
                    error!("🕰️ Could not settle campaign #{id}. It will be retried on the next run. {e}");
                    report.failed.push((id, e.to_string()));
                },
            }
        }
        Ok(report)
    }

    async fn settle_campaign(&self, campaign: Campaign) -> Result<CampaignSettlement, GroupBuyError> {
        let campaign = if campaign.is_active() { self.close_expired(campaign).await? } else { campaign };
        let campaign_id = campaign.id;
        match campaign.status {
            CampaignStatus::Successful => {
                let orders_created = self.create_orders(&campaign).await?;
                Ok(CampaignSettlement { campaign_id, status: campaign.status, orders_created, refunded: 0 })
            },
            CampaignStatus::Failed | CampaignStatus::Cancelled => {
                let reason = if campaign.status == CampaignStatus::Failed {
                    RefundReason::CampaignFailed
                } else {
                    RefundReason::CampaignCancelled
                };
                let refunded = refund_paid_participants(&self.db, &self.producers, &campaign, reason).await?;
                Ok(CampaignSettlement { campaign_id, status: campaign.status, orders_created: 0, refunded })
            },
            CampaignStatus::Active => Err(GroupBuyError::DatabaseError(format!(
                "Campaign #{campaign_id} is still active after closing it"
            ))),
        }
    }

    async fn close_expired(&self, campaign: Campaign) -> Result<Campaign, GroupBuyError> {
        match self.db.close_expired_campaign(campaign.id).await? {
            Some(closed) => {
                debug!(
                    "🕰️ Campaign #{} closed as {} with {}/{} units",
                    closed.id, closed.status, closed.current_quantity, closed.target_quantity
                );
                Ok(closed)
            },
            None => {
                // Someone else closed it first (a cancellation, or another server's sweep)
                debug!("🕰️ Campaign #{} was closed concurrently. Continuing with its current state.", campaign.id);
                self.db.fetch_campaign(campaign.id).await?.ok_or(GroupBuyError::CampaignNotFound(campaign.id))
            },
        }
    }

    async fn create_orders(&self, campaign: &Campaign) -> Result<usize, GroupBuyError> {
        let participants = self.db.fetch_participants_with_status(campaign.id, PaymentStatus::Paid).await?;
        let mut count = 0;
        for participant in participants.into_iter().filter(|p| p.order_id.is_none()) {
            let Some(order) = self.db.create_order_for_participant(campaign, participant.id).await? else {
                debug!("🕰️ Participant #{} already has an order", participant.id);
                continue;
            };
            debug!(
                "🕰️ Order #{} ({}) created for participant #{} of campaign #{}",
                order.order.id, order.order.total_amount, participant.id, campaign.id
            );
            let participant = self.db.fetch_participant(participant.id).await?.unwrap_or(participant);
            let event = OrderCreatedEvent::new(participant, campaign.clone(), order);
            self.producers.order_created(event).await;
            count += 1;
        }
        Ok(count)
    }
}

/// Marks every paid participant of a closed campaign for refund and publishes a refund event for each.
///
/// Returns the number of participants marked. Participants that were already refunded are skipped.
pub(crate) async fn refund_paid_participants<B: GroupBuyDatabase>(
    db: &B,
    producers: &EventProducers,
    campaign: &Campaign,
    reason: RefundReason,
) -> Result<usize, GroupBuyError> {
    let participants = db.fetch_participants_with_status(campaign.id, PaymentStatus::Paid).await?;
    let mut count = 0;
    for participant in participants {
        let Some(refunded) = db.refund_participant(participant.id).await? else {
            continue;
        };
        debug!("🛒️ Participant #{} of campaign #{} marked for refund ({})", refunded.id, campaign.id, refunded.total_price);
        let event = ParticipantRefundedEvent::new(refunded, campaign.clone(), reason);
        producers.participant_refunded(event).await;
        count += 1;
    }
    Ok(count)
}
