use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Campaign, Order, OrderItem, Participant, UserId};

/// Inserts the order for a paid participant of a successful campaign, copying the amount and gateway reference
/// from the participant row. Returns `None` if the participant is not paid or already has an order.
///
/// This is not atomic. Embed it in a transaction with [`insert_order_item`] and the participant link, passing
/// `&mut *tx` as the connection. Since it opens with a write, the transaction holds the write lock from the start.
///
/// The order starts out `pending` for the seller to process, and is already `paid`.
pub async fn insert_order_for_participant(
    campaign: &Campaign,
    participant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, store_id, status, total_amount, payment_status, payment_reference)
        SELECT p.user_id, $2, 'pending', p.total_price, 'paid', p.gateway_reference
        FROM group_buy_participants p
        WHERE p.id = $1 AND p.payment_status = 'paid' AND p.order_id IS NULL
        RETURNING *;
        "#,
    )
    .bind(participant_id)
    .bind(campaign.store_id)
    .fetch_all(conn)
    .await?
    .pop();
    if let Some(o) = &order {
        debug!("🗃️ Order #{} created for participant #{participant_id} ({})", o.id, o.total_amount);
    }
    Ok(order)
}

/// The single line item of a group-buy order. The unit price is the participant's total over their quantity, which
/// is the campaign's group price.
pub async fn insert_order_item(
    order_id: i64,
    campaign: &Campaign,
    participant: &Participant,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let unit_price = participant.total_price.value() / participant.quantity.max(1);
    let item = sqlx::query_as(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(campaign.product_id)
    .bind(participant.quantity)
    .bind(unit_price)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(item)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1").bind(order_id).fetch_all(conn).await?;
    Ok(items)
}
