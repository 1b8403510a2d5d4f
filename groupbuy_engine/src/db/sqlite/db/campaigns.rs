use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{Campaign, CampaignStatus, CampaignUpdate, NewCampaign};

/// The quantity held by participants that are pending or paid. Failed and refunded rows hold nothing.
const RESERVED_QUANTITY: &str = r#"
    SELECT COALESCE(SUM(p.quantity), 0) FROM group_buy_participants p
    WHERE p.campaign_id = group_buy_campaigns.id AND p.payment_status IN ('pending', 'paid')
"#;

pub async fn insert_campaign(campaign: NewCampaign, conn: &mut SqliteConnection) -> Result<Campaign, sqlx::Error> {
    let campaign: Campaign = sqlx::query_as(
        r#"
            INSERT INTO group_buy_campaigns (
                product_id,
                store_id,
                group_price,
                target_quantity,
                start_date,
                end_date
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(campaign.product_id)
    .bind(campaign.store_id)
    .bind(campaign.group_price)
    .bind(campaign.target_quantity)
    .bind(campaign.start_date)
    .bind(campaign.end_date)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Campaign #{} created for product #{}", campaign.id, campaign.product_id);
    Ok(campaign)
}

pub async fn fetch_campaign(campaign_id: i64, conn: &mut SqliteConnection) -> Result<Option<Campaign>, sqlx::Error> {
    let campaign = sqlx::query_as("SELECT * FROM group_buy_campaigns WHERE id = $1")
        .bind(campaign_id)
        .fetch_optional(conn)
        .await?;
    Ok(campaign)
}

pub async fn fetch_active_campaigns(conn: &mut SqliteConnection) -> Result<Vec<Campaign>, sqlx::Error> {
    let campaigns =
        sqlx::query_as("SELECT * FROM group_buy_campaigns WHERE status = 'active' ORDER BY created_at DESC, id DESC")
            .fetch_all(conn)
            .await?;
    Ok(campaigns)
}

/// Applies the update to an active campaign. A new target quantity must not fall below the reserved quantity.
/// Both conditions are part of the `UPDATE` statement.
pub async fn update_campaign(
    campaign_id: i64,
    update: CampaignUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Campaign>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE group_buy_campaigns SET
            group_price = COALESCE($2, group_price),
            target_quantity = COALESCE($3, target_quantity),
            end_date = COALESCE($4, end_date),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'active' AND ($3 IS NULL OR $3 >= ({RESERVED_QUANTITY}))
        RETURNING *;
        "#
    );
    let campaign = sqlx::query_as(&sql)
        .bind(campaign_id)
        .bind(update.group_price)
        .bind(update.target_quantity)
        .bind(update.end_date)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(campaign)
}

/// Deletes the campaign only if no participant row references it.
pub async fn delete_campaign(campaign_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM group_buy_campaigns
        WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM group_buy_participants WHERE campaign_id = $1)
        "#,
    )
    .bind(campaign_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Moves an active campaign into `status`. Returns `None` if the campaign was not active.
pub async fn close_campaign(
    campaign_id: i64,
    status: CampaignStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Campaign>, sqlx::Error> {
    let campaign: Option<Campaign> = sqlx::query_as(
        r#"
        UPDATE group_buy_campaigns SET status = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'active'
        RETURNING *;
        "#,
    )
    .bind(campaign_id)
    .bind(status)
    .fetch_all(conn)
    .await?
    .pop();
    if campaign.is_some() {
        debug!("🗃️ Campaign #{campaign_id} is now {status}");
    }
    Ok(campaign)
}

/// Closes an active campaign as `successful` or `failed`, depending on the paid quantity at the time of the update.
pub async fn close_expired_campaign(
    campaign_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Campaign>, sqlx::Error> {
    let campaign: Option<Campaign> = sqlx::query_as(
        r#"
        UPDATE group_buy_campaigns SET
            status = CASE WHEN current_quantity >= target_quantity THEN 'successful' ELSE 'failed' END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'active'
        RETURNING *;
        "#,
    )
    .bind(campaign_id)
    .fetch_all(conn)
    .await?
    .pop();
    if let Some(c) = &campaign {
        debug!("🗃️ Campaign #{campaign_id} closed as {} with {}/{}", c.status, c.current_quantity, c.target_quantity);
    }
    Ok(campaign)
}

pub async fn reserved_quantity(campaign_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let quantity: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(quantity), 0) FROM group_buy_participants
        WHERE campaign_id = $1 AND payment_status IN ('pending', 'paid')
        "#,
    )
    .bind(campaign_id)
    .fetch_one(conn)
    .await?;
    Ok(quantity)
}

/// Adds `quantity` to the campaign's paid total, as long as the campaign is active and the result stays within the
/// target. Returns `None` if the increment could not be applied.
pub async fn increment_quantity(
    campaign_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Campaign>, sqlx::Error> {
    let campaign: Option<Campaign> = sqlx::query_as(
        r#"
        UPDATE group_buy_campaigns
        SET current_quantity = current_quantity + $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'active' AND current_quantity + $2 <= target_quantity
        RETURNING *;
        "#,
    )
    .bind(campaign_id)
    .bind(quantity)
    .fetch_all(conn)
    .await?
    .pop();
    if let Some(c) = &campaign {
        trace!("🗃️ Campaign #{campaign_id} quantity is now {}/{}", c.current_quantity, c.target_quantity);
    }
    Ok(campaign)
}

pub async fn fetch_campaigns_to_settle(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Campaign>, sqlx::Error> {
    let campaigns = sqlx::query_as(
        r#"
        SELECT * FROM group_buy_campaigns c
        WHERE (c.status = 'active' AND datetime(c.end_date) < datetime($1))
           OR (c.status = 'successful' AND EXISTS (
                SELECT 1 FROM group_buy_participants p
                WHERE p.campaign_id = c.id AND p.payment_status = 'paid' AND p.order_id IS NULL))
           OR (c.status IN ('failed', 'cancelled') AND EXISTS (
                SELECT 1 FROM group_buy_participants p
                WHERE p.campaign_id = c.id AND p.payment_status = 'paid'))
        ORDER BY c.end_date, c.id
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(campaigns)
}
