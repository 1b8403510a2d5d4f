use serde::{Deserialize, Serialize};

use crate::db_types::{Campaign, Order, OrderItem, Participant};

/// The result of applying a `PAID` callback to a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentConfirmation {
    /// The participant is now paid and their quantity was added to the campaign.
    Counted { participant: Participant, campaign: Campaign },
    /// The payment was already applied (or already refunded). Nothing changed.
    AlreadySettled(Participant),
    /// The payment arrived but the campaign could not take the quantity, because it is full or no longer active.
    /// The participant has been marked `refunded`.
    Rejected { participant: Participant, campaign: Campaign },
    /// No participant carries this id.
    ParticipantNotFound(i64),
}

/// An order created during settlement, with its single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledOrder {
    pub order: Order,
    pub item: OrderItem,
}
