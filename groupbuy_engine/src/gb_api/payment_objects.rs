use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::Participant;

/// The payment states a gateway callback can report, as far as the group-buy engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayPaymentStatus {
    Paid,
    Failed,
    Expired,
    Refund,
    Unknown,
}

impl Display for GatewayPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "PAID"),
            Self::Failed => write!(f, "FAILED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Refund => write!(f, "REFUND"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// What happened when a payment update was applied.
///
/// Every variant is a successful outcome from the gateway's point of view, and should be acknowledged. Only
/// storage failures (returned as errors) warrant asking the gateway to deliver the callback again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The payment was applied and the participant's quantity now counts towards the campaign.
    Counted(Participant),
    /// The participant had already been settled by an earlier delivery. Nothing changed.
    AlreadyProcessed(Participant),
    /// The payment arrived after the campaign could no longer take the quantity. The participant is marked for
    /// refund.
    Rejected(Participant),
    /// The payment failed or expired, and the participant's reservation was released.
    MarkedFailed(Participant),
    /// The callback does not refer to one of our participants.
    NotApplicable(String),
    /// The status carries no action for us.
    Ignored(GatewayPaymentStatus),
}

impl WebhookOutcome {
    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Self::Counted(p) | Self::AlreadyProcessed(p) | Self::Rejected(p) | Self::MarkedFailed(p) => Some(p),
            Self::NotApplicable(_) | Self::Ignored(_) => None,
        }
    }
}

impl Display for WebhookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counted(p) => write!(f, "payment for participant #{} counted", p.id),
            Self::AlreadyProcessed(p) => write!(f, "participant #{} was already {}", p.id, p.payment_status),
            Self::Rejected(p) => write!(f, "payment for participant #{} could not be counted and is marked for refund", p.id),
            Self::MarkedFailed(p) => write!(f, "payment for participant #{} failed", p.id),
            Self::NotApplicable(reason) => write!(f, "not applicable: {reason}"),
            Self::Ignored(status) => write!(f, "status {status} ignored"),
        }
    }
}
