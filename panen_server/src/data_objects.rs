use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /group-buy/{id}/payment`. An empty body keeps the default payment channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryPaymentParams {
    #[serde(default)]
    pub payment_method: Option<String>,
}
