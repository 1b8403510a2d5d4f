use chrono::{DateTime, Utc};
use panen_common::Rupiah;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::MerchantRef;

/// A line item shown to the buyer on the gateway's checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub name: String,
    pub price: Rupiah,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub merchant_ref: MerchantRef,
    pub amount: Rupiah,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<PaymentItem>,
    /// Payment channel, e.g. `QRIS`
    pub method: String,
}

/// What the gateway tells us about a newly created transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// The gateway's own transaction reference.
    pub reference: String,
    pub merchant_ref: String,
    pub checkout_url: String,
    pub amount: Rupiah,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProviderError {
    #[error("The payment gateway is not configured. {0}")]
    NotConfigured(String),
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the transaction. {0}")]
    Rejected(String),
    #[error("The payment gateway did not respond in time")]
    Timeout,
}

/// Creates payment transactions at an external gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Creates a transaction for `request.amount`, identified by `request.merchant_ref`.
    ///
    /// Calling this again with the same merchant reference is expected to produce a new transaction at the gateway
    /// carrying the same reference, so that later callbacks can still be correlated.
    async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentDetails, PaymentProviderError>;
}
