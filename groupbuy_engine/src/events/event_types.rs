use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Campaign, Participant},
    traits::SettledOrder,
};

/// A participant's payment was confirmed and counted towards the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPaidEvent {
    pub participant: Participant,
    pub campaign: Campaign,
}

impl ParticipantPaidEvent {
    pub fn new(participant: Participant, campaign: Campaign) -> Self {
        Self { participant, campaign }
    }
}

/// A campaign succeeded and an order was created for one of its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub participant: Participant,
    pub campaign: Campaign,
    pub order: SettledOrder,
}

impl OrderCreatedEvent {
    pub fn new(participant: Participant, campaign: Campaign, order: SettledOrder) -> Self {
        Self { participant, campaign, order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    /// The campaign ended without reaching its target.
    CampaignFailed,
    /// The owner cancelled the campaign.
    CampaignCancelled,
    /// The payment arrived when the campaign could no longer take the quantity.
    NotCounted,
}

/// A paid participant has been marked for refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRefundedEvent {
    pub participant: Participant,
    pub campaign: Campaign,
    pub reason: RefundReason,
}

impl ParticipantRefundedEvent {
    pub fn new(participant: Participant, campaign: Campaign, reason: RefundReason) -> Self {
        Self { participant, campaign, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    ParticipantPaid(ParticipantPaidEvent),
    OrderCreated(OrderCreatedEvent),
    ParticipantRefunded(ParticipantRefundedEvent),
}
