//! `SqliteDatabase` is a concrete implementation of a group-buy engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use panen_common::Rupiah;
use sqlx::SqlitePool;

use super::db::{
    campaigns,
    db_url,
    new_pool,
    orders,
    participants,
    pending_migrations,
    sqlite_version,
    stores,
    version_is_supported,
    MIGRATOR,
    MIN_SQLITE_VERSION,
};
use crate::{
    db_types::{
        Campaign,
        CampaignStatus,
        CampaignUpdate,
        NewCampaign,
        NewParticipant,
        Order,
        OrderItem,
        Participant,
        PaymentStatus,
        Product,
        Store,
        UserId,
    },
    traits::{CatalogManagement, GroupBuyDatabase, GroupBuyError, PaymentConfirmation, SettledOrder},
};

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let store = stores::fetch_store(store_id, &mut conn).await?;
        Ok(store)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let product = stores::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_store(&self, owner_id: &UserId, store_name: &str) -> Result<Store, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let store = stores::insert_store(owner_id, store_name, &mut conn).await?;
        Ok(store)
    }

    async fn insert_product(&self, store_id: i64, title: &str, price: Rupiah) -> Result<Product, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let product = stores::insert_product(store_id, title, price, &mut conn).await?;
        Ok(product)
    }
}

impl GroupBuyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_campaign(&self, campaign: NewCampaign) -> Result<Campaign, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaign = campaigns::insert_campaign(campaign, &mut conn).await?;
        Ok(campaign)
    }

    async fn fetch_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaign = campaigns::fetch_campaign(campaign_id, &mut conn).await?;
        Ok(campaign)
    }

    async fn fetch_active_campaigns(&self) -> Result<Vec<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaigns = campaigns::fetch_active_campaigns(&mut conn).await?;
        Ok(campaigns)
    }

    async fn update_campaign(
        &self,
        campaign_id: i64,
        update: CampaignUpdate,
    ) -> Result<Option<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaign = campaigns::update_campaign(campaign_id, update, &mut conn).await?;
        Ok(campaign)
    }

    async fn delete_campaign(&self, campaign_id: i64) -> Result<bool, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = campaigns::delete_campaign(campaign_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn close_campaign(
        &self,
        campaign_id: i64,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaign = campaigns::close_campaign(campaign_id, status, &mut conn).await?;
        Ok(campaign)
    }

    async fn close_expired_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaign = campaigns::close_expired_campaign(campaign_id, &mut conn).await?;
        Ok(campaign)
    }

    async fn reserved_quantity(&self, campaign_id: i64) -> Result<i64, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let quantity = campaigns::reserved_quantity(campaign_id, &mut conn).await?;
        Ok(quantity)
    }

    async fn insert_participant(
        &self,
        participant: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        participants::insert_participant(participant, now, &mut conn).await
    }

    async fn fetch_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let participant = participants::fetch_participant(participant_id, &mut conn).await?;
        Ok(participant)
    }

    async fn fetch_participant_for_user(
        &self,
        campaign_id: i64,
        user_id: &UserId,
    ) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let participant = participants::fetch_participant_for_user(campaign_id, user_id, &mut conn).await?;
        Ok(participant)
    }

    async fn fetch_participants(&self, campaign_id: i64) -> Result<Vec<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let participants = participants::fetch_participants(campaign_id, None, &mut conn).await?;
        Ok(participants)
    }

    async fn fetch_participants_with_status(
        &self,
        campaign_id: i64,
        status: PaymentStatus,
    ) -> Result<Vec<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let participants = participants::fetch_participants(campaign_id, Some(status), &mut conn).await?;
        Ok(participants)
    }

    async fn set_gateway_reference(&self, participant_id: i64, reference: &str) -> Result<Participant, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        participants::set_gateway_reference(participant_id, reference, &mut conn)
            .await?
            .ok_or_else(|| GroupBuyError::ParticipantNotFound(format!("id {participant_id}")))
    }

    async fn reopen_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let participant = participants::reopen_participant(participant_id, &mut conn).await?;
        Ok(participant)
    }

    async fn confirm_payment(&self, participant_id: i64) -> Result<PaymentConfirmation, GroupBuyError> {
        let mut tx = self.pool.begin().await?;
        let from = [PaymentStatus::Pending, PaymentStatus::Failed];
        let paid = participants::transition_status(participant_id, &from, PaymentStatus::Paid, &mut tx).await?;
        let Some(participant) = paid else {
            let result = match participants::fetch_participant(participant_id, &mut tx).await? {
                Some(p) => PaymentConfirmation::AlreadySettled(p),
                None => PaymentConfirmation::ParticipantNotFound(participant_id),
            };
            tx.rollback().await?;
            return Ok(result);
        };
        let campaign_id = participant.campaign_id;
        let result = match campaigns::increment_quantity(campaign_id, participant.quantity, &mut tx).await? {
            Some(campaign) => PaymentConfirmation::Counted { participant, campaign },
            None => {
                let refunded = [PaymentStatus::Paid];
                let participant =
                    participants::transition_status(participant_id, &refunded, PaymentStatus::Refunded, &mut tx)
                        .await?
                        .ok_or_else(|| {
                            GroupBuyError::DatabaseError(format!(
                                "Participant #{participant_id} changed status inside its own transaction"
                            ))
                        })?;
                let campaign = campaigns::fetch_campaign(campaign_id, &mut tx)
                    .await?
                    .ok_or(GroupBuyError::CampaignNotFound(campaign_id))?;
                warn!(
                    "🗃️ Payment for participant #{participant_id} could not be counted against campaign \
                     #{campaign_id} ({}, {}/{}). Marked for refund.",
                    campaign.status, campaign.current_quantity, campaign.target_quantity
                );
                PaymentConfirmation::Rejected { participant, campaign }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn mark_payment_failed(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let from = [PaymentStatus::Pending];
        let participant =
            participants::transition_status(participant_id, &from, PaymentStatus::Failed, &mut conn).await?;
        Ok(participant)
    }

    async fn fetch_campaigns_to_settle(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let campaigns = campaigns::fetch_campaigns_to_settle(now, &mut conn).await?;
        Ok(campaigns)
    }

    async fn create_order_for_participant(
        &self,
        campaign: &Campaign,
        participant_id: i64,
    ) -> Result<Option<SettledOrder>, GroupBuyError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::insert_order_for_participant(campaign, participant_id, &mut tx).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let participant = participants::fetch_participant(participant_id, &mut tx)
            .await?
            .ok_or_else(|| GroupBuyError::ParticipantNotFound(format!("id {participant_id}")))?;
        let item = orders::insert_order_item(order.id, campaign, &participant, &mut tx).await?;
        if !participants::link_order(participant_id, order.id, &mut tx).await? {
            debug!("🗃️ Participant #{participant_id} was linked to an order concurrently. Discarding order #{}", order.id);
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some(SettledOrder { order, item }))
    }

    async fn refund_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let from = [PaymentStatus::Paid];
        let participant =
            participants::transition_status(participant_id, &from, PaymentStatus::Refunded, &mut conn).await?;
        Ok(participant)
    }

    async fn close(&mut self) -> Result<(), GroupBuyError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        Self::new_with_options(url, max_connections, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// Creates the connection pool. `acquire_timeout` bounds how long any store call waits for a connection.
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, acquire_timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding migrations.
    pub async fn migrate(&self) -> Result<(), GroupBuyError> {
        MIGRATOR.run(&self.pool).await.map_err(|e| GroupBuyError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Checks, once, that this database can run the engine: the SQLite library must support `RETURNING`, and every
    /// migration must have been applied.
    pub async fn check_capabilities(&self) -> Result<String, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let version = sqlite_version(&mut conn).await?;
        if !version_is_supported(&version) {
            let (major, minor) = MIN_SQLITE_VERSION;
            return Err(GroupBuyError::DatabaseError(format!(
                "SQLite {version} is too old. Version {major}.{minor} or later is required."
            )));
        }
        let pending = pending_migrations(&mut conn).await?;
        if !pending.is_empty() {
            return Err(GroupBuyError::DatabaseError(format!(
                "{} database migrations have not been applied: {pending:?}",
                pending.len()
            )));
        }
        debug!("🗃️ SQLite {version} passed the capability check");
        Ok(version)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    pub async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    pub async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItem>, GroupBuyError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }
}
