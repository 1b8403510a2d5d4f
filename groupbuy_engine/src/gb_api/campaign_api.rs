use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use panen_common::Rupiah;

use crate::{
    db_types::{Campaign, CampaignDetails, CampaignStatus, CampaignUpdate, NewCampaign, Store, UserId},
    events::{EventProducers, RefundReason},
    gb_api::{campaign_objects::NewCampaignRequest, settlement_api::refund_paid_participants},
    traits::{GroupBuyDatabase, GroupBuyError},
};

/// `CampaignApi` manages the campaign lifecycle on behalf of store owners, and serves the public campaign reads.
pub struct CampaignApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for CampaignApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CampaignApi")
    }
}

impl<B> CampaignApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CampaignApi<B>
where B: GroupBuyDatabase
{
    /// Creates a new, active campaign with nothing sold yet.
    ///
    /// The actor must own the store, the product must belong to it, the price and target must be positive, and the
    /// end date must lie in the future.
    pub async fn create_campaign(&self, actor: &UserId, req: NewCampaignRequest) -> Result<Campaign, GroupBuyError> {
        self.create_campaign_at(actor, req, Utc::now()).await
    }

    pub async fn create_campaign_at(
        &self,
        actor: &UserId,
        req: NewCampaignRequest,
        now: DateTime<Utc>,
    ) -> Result<Campaign, GroupBuyError> {
        if !req.group_price.is_positive() {
            return Err(GroupBuyError::ValidationFailed("group_price must be greater than zero".into()));
        }
        if req.target_quantity <= 0 {
            return Err(GroupBuyError::ValidationFailed("target_quantity must be a positive integer".into()));
        }
        if req.end_date <= now {
            return Err(GroupBuyError::ValidationFailed("end_date must be in the future".into()));
        }
        check_campaign_value(req.group_price, req.target_quantity)?;
        self.check_owner(actor, req.store_id).await?;
        let product = self.db.fetch_product(req.product_id).await?.ok_or(GroupBuyError::ProductNotFound(req.product_id))?;
        if product.store_id != req.store_id {
            return Err(GroupBuyError::ValidationFailed(format!(
                "Product #{} does not belong to store #{}",
                product.id, req.store_id
            )));
        }
        let campaign = NewCampaign {
            product_id: req.product_id,
            store_id: req.store_id,
            group_price: req.group_price,
            target_quantity: req.target_quantity,
            start_date: now,
            end_date: req.end_date,
        };
        let campaign = self.db.insert_campaign(campaign).await?;
        info!(
            "🛒️ Campaign #{} created by {actor}: {} × {} for product #{}, ends {}",
            campaign.id, campaign.target_quantity, campaign.group_price, campaign.product_id, campaign.end_date
        );
        Ok(campaign)
    }

    /// Changes the price, target or end date of an active campaign.
    ///
    /// Participants who already joined keep the total price they joined at. The target may not drop below the
    /// quantity that pending and paid participants hold.
    pub async fn update_campaign(
        &self,
        actor: &UserId,
        campaign_id: i64,
        update: CampaignUpdate,
    ) -> Result<Campaign, GroupBuyError> {
        if update.is_empty() {
            return Err(GroupBuyError::ValidationFailed("Nothing to update".into()));
        }
        if matches!(update.group_price, Some(p) if !p.is_positive()) {
            return Err(GroupBuyError::ValidationFailed("group_price must be greater than zero".into()));
        }
        if matches!(update.target_quantity, Some(q) if q <= 0) {
            return Err(GroupBuyError::ValidationFailed("target_quantity must be a positive integer".into()));
        }
        let campaign = self.owned_campaign(actor, campaign_id).await?;
        if !campaign.is_active() {
            return Err(GroupBuyError::CampaignNotActive(campaign_id));
        }
        if matches!(update.end_date, Some(d) if d <= campaign.start_date) {
            return Err(GroupBuyError::ValidationFailed("end_date must be after the start date".into()));
        }
        check_campaign_value(
            update.group_price.unwrap_or(campaign.group_price),
            update.target_quantity.unwrap_or(campaign.target_quantity),
        )?;
        let target = update.target_quantity;
        match self.db.update_campaign(campaign_id, update).await? {
            Some(c) => {
                info!("🛒️ Campaign #{campaign_id} updated by {actor}");
                Ok(c)
            },
            None => {
                // Either the campaign closed in the meantime, or the new target is below the reserved quantity
                let current = self.fetch_campaign(campaign_id).await?;
                if !current.is_active() {
                    return Err(GroupBuyError::CampaignNotActive(campaign_id));
                }
                let reserved = self.db.reserved_quantity(campaign_id).await?;
                Err(GroupBuyError::ValidationFailed(format!(
                    "target_quantity ({}) cannot be less than the {reserved} units already reserved",
                    target.unwrap_or(current.target_quantity)
                )))
            },
        }
    }

    /// Deletes a campaign that nobody has joined. Campaigns with participants must be cancelled instead, so that
    /// paid participants are refunded.
    pub async fn delete_campaign(&self, actor: &UserId, campaign_id: i64) -> Result<(), GroupBuyError> {
        self.owned_campaign(actor, campaign_id).await?;
        if self.db.delete_campaign(campaign_id).await? {
            info!("🛒️ Campaign #{campaign_id} deleted by {actor}");
            Ok(())
        } else {
            debug!("🛒️ Campaign #{campaign_id} has participants. Refusing to delete it.");
            Err(GroupBuyError::CampaignHasParticipants(campaign_id))
        }
    }

    /// Closes an active campaign early. Every paid participant is marked for refund and no orders are created.
    pub async fn cancel_campaign(&self, actor: &UserId, campaign_id: i64) -> Result<Campaign, GroupBuyError> {
        self.owned_campaign(actor, campaign_id).await?;
        let campaign = self
            .db
            .close_campaign(campaign_id, CampaignStatus::Cancelled)
            .await?
            .ok_or(GroupBuyError::CampaignNotActive(campaign_id))?;
        info!("🛒️ Campaign #{campaign_id} cancelled by {actor}");
        let refunded =
            refund_paid_participants(&self.db, &self.producers, &campaign, RefundReason::CampaignCancelled).await?;
        debug!("🛒️ {refunded} participants of cancelled campaign #{campaign_id} marked for refund");
        Ok(campaign)
    }

    /// All open campaigns, newest first.
    pub async fn active_campaigns(&self) -> Result<Vec<Campaign>, GroupBuyError> {
        self.db.fetch_active_campaigns().await
    }

    pub async fn campaign_details(&self, campaign_id: i64) -> Result<CampaignDetails, GroupBuyError> {
        let campaign = self.fetch_campaign(campaign_id).await?;
        let participants = self.db.fetch_participants(campaign_id).await?.into_iter().map(Into::into).collect();
        Ok(CampaignDetails { campaign, participants })
    }

    async fn fetch_campaign(&self, campaign_id: i64) -> Result<Campaign, GroupBuyError> {
        self.db.fetch_campaign(campaign_id).await?.ok_or(GroupBuyError::CampaignNotFound(campaign_id))
    }

    async fn check_owner(&self, actor: &UserId, store_id: i64) -> Result<Store, GroupBuyError> {
        let store = self.db.fetch_store(store_id).await?.ok_or(GroupBuyError::StoreNotFound(store_id))?;
        if &store.owner_id != actor {
            warn!("🛒️ {actor} tried to manage campaigns for store #{store_id}, which they do not own");
            return Err(GroupBuyError::NotStoreOwner(store_id));
        }
        Ok(store)
    }

    async fn owned_campaign(&self, actor: &UserId, campaign_id: i64) -> Result<Campaign, GroupBuyError> {
        let campaign = self.fetch_campaign(campaign_id).await?;
        self.check_owner(actor, campaign.store_id).await?;
        Ok(campaign)
    }
}

/// A full campaign is worth `group_price × target_quantity`. Every participant total is bounded by it, so it must fit
/// in an `i64`, or SQLite silently stores the product as a REAL.
fn check_campaign_value(group_price: Rupiah, target_quantity: i64) -> Result<(), GroupBuyError> {
    group_price.value().checked_mul(target_quantity).map(|_| ()).ok_or_else(|| {
        GroupBuyError::ValidationFailed(format!(
            "A campaign of {target_quantity} units at {group_price} each is too large to be paid for"
        ))
    })
}
