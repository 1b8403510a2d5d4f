use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewParticipant, Participant, PaymentStatus, UserId},
    traits::GroupBuyError,
};

/// Inserts a pending participant in a single `INSERT .. SELECT` statement, so that the capacity check and the insert
/// cannot be separated by a concurrent join.
///
/// Nothing is inserted (and `None` is returned) if the campaign is not active, has passed its end date, or cannot
/// hold the requested quantity on top of what pending and paid participants already hold.
///
/// A duplicate (campaign, user) pair violates the unique constraint and is reported as
/// [`GroupBuyError::AlreadyJoined`].
pub async fn insert_participant(
    participant: NewParticipant,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, GroupBuyError> {
    let campaign_id = participant.campaign_id;
    let result = sqlx::query_as::<_, Participant>(
        r#"
        INSERT INTO group_buy_participants (campaign_id, user_id, quantity, total_price, payment_status)
        SELECT c.id, $2, $3, c.group_price * $3, 'pending'
        FROM group_buy_campaigns c
        WHERE c.id = $1
          AND c.status = 'active'
          AND datetime(c.end_date) > datetime($4)
          AND (
            SELECT COALESCE(SUM(p.quantity), 0) FROM group_buy_participants p
            WHERE p.campaign_id = c.id AND p.payment_status IN ('pending', 'paid')
          ) + $3 <= c.target_quantity
        RETURNING *;
        "#,
    )
    .bind(campaign_id)
    .bind(&participant.user_id)
    .bind(participant.quantity)
    .bind(now)
    .fetch_all(conn)
    .await
    .map(|mut rows| rows.pop());
    match result {
        Ok(Some(p)) => {
            debug!("🗃️ {} joined campaign #{campaign_id} as participant #{} (qty {})", p.user_id, p.id, p.quantity);
            Ok(Some(p))
        },
        Ok(None) => Ok(None),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🗃️ {} tried to join campaign #{campaign_id} twice", participant.user_id);
            Err(GroupBuyError::AlreadyJoined(campaign_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_participant(
    participant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, sqlx::Error> {
    let participant = sqlx::query_as("SELECT * FROM group_buy_participants WHERE id = $1")
        .bind(participant_id)
        .fetch_optional(conn)
        .await?;
    Ok(participant)
}

pub async fn fetch_participant_for_user(
    campaign_id: i64,
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, sqlx::Error> {
    let participant = sqlx::query_as("SELECT * FROM group_buy_participants WHERE campaign_id = $1 AND user_id = $2")
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(participant)
}

pub async fn fetch_participants(
    campaign_id: i64,
    status: Option<PaymentStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Participant>, sqlx::Error> {
    let participants = sqlx::query_as(
        r#"
        SELECT * FROM group_buy_participants
        WHERE campaign_id = $1 AND ($2 IS NULL OR payment_status = $2)
        ORDER BY created_at, id
        "#,
    )
    .bind(campaign_id)
    .bind(status)
    .fetch_all(conn)
    .await?;
    Ok(participants)
}

pub async fn set_gateway_reference(
    participant_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, sqlx::Error> {
    let participant = sqlx::query_as(
        r#"
        UPDATE group_buy_participants SET gateway_reference = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING *;
        "#,
    )
    .bind(participant_id)
    .bind(reference)
    .fetch_all(conn)
    .await?
    .pop();
    trace!("🗃️ Participant #{participant_id} gateway reference set to {reference}");
    Ok(participant)
}

/// Moves the participant from one of `from` into `to`. Returns `None` if the participant's status was not in `from`.
pub async fn transition_status(
    participant_id: i64,
    from: &[PaymentStatus],
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, sqlx::Error> {
    let mut builder = sqlx::QueryBuilder::new("UPDATE group_buy_participants SET payment_status = ");
    builder.push_bind(to);
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id = ");
    builder.push_bind(participant_id);
    builder.push(" AND payment_status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING *");
    let participant: Option<Participant> = builder.build_query_as().fetch_all(conn).await?.pop();
    if let Some(p) = &participant {
        debug!("🗃️ Participant #{participant_id} payment status is now {}", p.payment_status);
    }
    Ok(participant)
}

/// Re-opens a failed participant, if the campaign is active and can still hold their quantity.
pub async fn reopen_participant(
    participant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, sqlx::Error> {
    let participant = sqlx::query_as(
        r#"
        UPDATE group_buy_participants SET payment_status = 'pending', updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND payment_status = 'failed'
          AND EXISTS (
            SELECT 1 FROM group_buy_campaigns c
            WHERE c.id = group_buy_participants.campaign_id
              AND c.status = 'active'
              AND (
                SELECT COALESCE(SUM(p.quantity), 0) FROM group_buy_participants p
                WHERE p.campaign_id = c.id AND p.payment_status IN ('pending', 'paid')
              ) + group_buy_participants.quantity <= c.target_quantity
          )
        RETURNING *;
        "#,
    )
    .bind(participant_id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(participant)
}

/// Links an order to a paid participant that does not have one yet. Returns `false` if nothing was updated.
pub async fn link_order(participant_id: i64, order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE group_buy_participants SET order_id = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND payment_status = 'paid' AND order_id IS NULL
        "#,
    )
    .bind(participant_id)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
