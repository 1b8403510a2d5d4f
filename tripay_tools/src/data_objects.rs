use chrono::{DateTime, Utc};
use panen_common::{Rupiah, Secret};
use serde::{Deserialize, Serialize};

use crate::signature::transaction_signature;
use crate::SignatureError;

/// A line on the gateway's checkout page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: Rupiah,
    pub quantity: i64,
}

impl OrderItem {
    pub fn new<S: Into<String>>(name: S, price: Rupiah, quantity: i64) -> Self {
        Self { name: name.into(), price, quantity }
    }

    pub fn subtotal(&self) -> Rupiah {
        self.price * self.quantity
    }
}

/// What the caller knows about a payment before it is signed and sent to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Payment channel code, e.g. `QRIS` or `BRIVA`.
    pub method: String,
    pub merchant_ref: String,
    pub amount: Rupiah,
    pub customer_name: String,
    pub customer_email: String,
    pub order_items: Vec<OrderItem>,
}

impl NewTransaction {
    /// The sum of the item subtotals. The gateway refuses a transaction whose items do not add up to its amount.
    pub fn items_total(&self) -> Rupiah {
        self.order_items.iter().map(OrderItem::subtotal).sum()
    }

    /// Builds the signed request body. The transaction expires `expires_in` after `now`.
    pub fn into_request(
        self,
        merchant_code: &str,
        private_key: &Secret<String>,
        now: DateTime<Utc>,
        expires_in: chrono::Duration,
    ) -> Result<TransactionRequest, SignatureError> {
        let signature = transaction_signature(private_key, merchant_code, &self.merchant_ref, self.amount)?;
        Ok(TransactionRequest {
            method: self.method,
            merchant_code: merchant_code.to_string(),
            merchant_ref: self.merchant_ref,
            amount: self.amount,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            order_items: self.order_items,
            expired_time: (now + expires_in).timestamp(),
            signature,
        })
    }
}

/// The body of `POST /transaction/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub method: String,
    pub merchant_code: String,
    pub merchant_ref: String,
    pub amount: Rupiah,
    pub customer_name: String,
    pub customer_email: String,
    pub order_items: Vec<OrderItem>,
    /// Unix timestamp, in seconds
    pub expired_time: i64,
    pub signature: String,
}

/// A transaction as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub merchant_ref: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_name: Option<String>,
    pub amount: Rupiah,
    #[serde(default)]
    pub pay_code: Option<String>,
    #[serde(default)]
    pub pay_url: Option<String>,
    pub checkout_url: String,
    pub status: String,
    #[serde(default)]
    pub expired_time: Option<i64>,
    #[serde(default)]
    pub qr_url: Option<String>,
}

/// Every gateway response is wrapped in this envelope. `data` is absent when `success` is false.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct TripayResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Payment states a callback can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    Paid,
    Failed,
    Expired,
    Refund,
    #[serde(other)]
    Unknown,
}

/// The body of a payment-status callback.
///
/// Only `merchant_ref` and `status` drive any behaviour. The rest is carried for logging.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub merchant_ref: Option<String>,
    pub status: CallbackStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Rupiah>,
    #[serde(default)]
    pub amount_received: Option<Rupiah>,
    #[serde(default)]
    pub is_closed_payment: Option<i64>,
    #[serde(default)]
    pub paid_at: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}
