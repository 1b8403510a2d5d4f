use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use panen_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------       UserId        ---------------------------------------------------------
/// The opaque user id issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------     MerchantRef     ---------------------------------------------------------
const MERCHANT_REF_PREFIX: &str = "GB-";

/// The reference that ties a gateway transaction back to a participant.
///
/// It is derived from the participant id alone (`GB-<id>`), so every payment attempt for the same seat carries the
/// same reference and callbacks can always be traced back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantRef(String);

impl MerchantRef {
    pub fn for_participant(participant_id: i64) -> Self {
        Self(format!("{MERCHANT_REF_PREFIX}{participant_id}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The participant id encoded in this reference, if it is one of ours.
    pub fn participant_id(&self) -> Option<i64> {
        self.0.strip_prefix(MERCHANT_REF_PREFIX).and_then(|id| id.parse::<i64>().ok()).filter(|id| *id > 0)
    }
}

impl FromStr for MerchantRef {
    type Err = ConversionError;

    /// Accepts only references of the form `GB-<positive integer>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = Self(s.trim().to_string());
        match candidate.participant_id() {
            Some(_) => Ok(candidate),
            None => Err(ConversionError(format!("Not a group-buy merchant reference: {s}"))),
        }
    }
}

impl Display for MerchantRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    Store/Product    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub owner_id: UserId,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub store_id: i64,
    pub title: String,
    pub price: Rupiah,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   CampaignStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Open for joining and accepting payments.
    Active,
    /// Reached its target by the end date. Orders are created for every paid participant.
    Successful,
    /// Missed its target. Paid participants are marked for refund.
    Failed,
    /// Closed early by the store owner. Paid participants are marked for refund.
    Cancelled,
}

impl CampaignStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CampaignStatus::Active)
    }
}

impl Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Successful => write!(f, "successful"),
            CampaignStatus::Failed => write!(f, "failed"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid campaign status: {s}"))),
        }
    }
}

//--------------------------------------      Campaign       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub product_id: i64,
    pub store_id: i64,
    pub group_price: Rupiah,
    pub target_quantity: i64,
    /// The quantity that has actually been paid for.
    pub current_quantity: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    pub product_id: i64,
    pub store_id: i64,
    pub group_price: Rupiah,
    pub target_quantity: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// The fields an owner may change while a campaign is still active. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub group_price: Option<Rupiah>,
    pub target_quantity: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CampaignUpdate {
    pub fn is_empty(&self) -> bool {
        self.group_price.is_none() && self.target_quantity.is_none() && self.end_date.is_none()
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Joined, waiting for the gateway to confirm payment. The quantity is reserved.
    Pending,
    /// The gateway confirmed payment and the quantity was counted towards the campaign.
    Paid,
    /// The gateway reported the payment as failed or expired. The reservation is released.
    Failed,
    /// Paid, but the campaign did not go ahead. Refunds themselves are handled outside the engine.
    Refunded,
}

impl PaymentStatus {
    /// True if the participant's quantity counts against the campaign's capacity.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Paid)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     Participant     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: UserId,
    pub quantity: i64,
    /// The campaign's group price times the quantity, fixed at the time of joining.
    pub total_price: Rupiah,
    pub payment_status: PaymentStatus,
    pub gateway_reference: Option<String>,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn merchant_ref(&self) -> MerchantRef {
        MerchantRef::for_participant(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub campaign_id: i64,
    pub user_id: UserId,
    pub quantity: i64,
}

/// The public view of a participant, as listed on a campaign's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: i64,
    pub quantity: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantSummary {
    fn from(p: Participant) -> Self {
        Self { id: p.id, quantity: p.quantity, payment_status: p.payment_status, created_at: p.created_at }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDetails {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participants: Vec<ParticipantSummary>,
}

//--------------------------------------        Order        ---------------------------------------------------------
/// The order created for a participant when their campaign succeeds.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: UserId,
    pub store_id: i64,
    pub status: String,
    pub total_amount: Rupiah,
    pub payment_status: String,
    /// The gateway reference of the payment that funded this order.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price
    pub price: Rupiah,
}
