use chrono::{DateTime, Utc};
use panen_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Participant, UserId},
    traits::PaymentDetails,
};

/// The payment channel used when a buyer does not choose one.
pub const DEFAULT_PAYMENT_METHOD: &str = "QRIS";

/// The authenticated user making a request, as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl Actor {
    pub fn new<U: Into<UserId>>(user_id: U, email: Option<String>) -> Self {
        Self { user_id: user_id.into(), email }
    }

    /// The name shown on the gateway's checkout page. Users carry no display name, so the email stands in.
    pub fn customer_name(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.user_id.to_string())
    }

    pub fn customer_email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaignRequest {
    pub product_id: i64,
    pub store_id: i64,
    pub group_price: Rupiah,
    pub target_quantity: i64,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCampaignRequest {
    pub quantity: i64,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl JoinCampaignRequest {
    pub fn new(quantity: i64) -> Self {
        Self { quantity, payment_method: None }
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// A participant together with the gateway transaction they should pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedCampaign {
    pub participant: Participant,
    pub payment_details: PaymentDetails,
}
