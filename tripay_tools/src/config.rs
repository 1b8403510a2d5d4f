use std::time::Duration;

use log::*;
use panen_common::Secret;

const TRIPAY_SANDBOX_URL: &str = "https://tripay.co.id/api-sandbox";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct TripayConfig {
    /// Base URL of the gateway API, without a trailing slash. e.g. `https://tripay.co.id/api`
    pub api_url: String,
    pub api_key: Secret<String>,
    /// Signs outgoing transactions and verifies incoming callbacks. Tripay does not issue a separate callback key.
    pub private_key: Secret<String>,
    pub merchant_code: String,
    /// Upper bound on every gateway round trip.
    pub timeout: Duration,
    /// How long a created transaction stays payable.
    pub expiry: chrono::Duration,
}

impl Default for TripayConfig {
    fn default() -> Self {
        Self {
            api_url: TRIPAY_SANDBOX_URL.to_string(),
            api_key: Secret::default(),
            private_key: Secret::default(),
            merchant_code: String::default(),
            timeout: DEFAULT_TIMEOUT,
            expiry: chrono::Duration::hours(DEFAULT_EXPIRY_HOURS),
        }
    }
}

impl TripayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("TRIPAY_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ TRIPAY_API_URL not set, using the sandbox at {TRIPAY_SANDBOX_URL}");
            TRIPAY_SANDBOX_URL.to_string()
        });
        let api_url = api_url.trim_end_matches('/').to_string();
        let api_key = Secret::new(std::env::var("TRIPAY_API_KEY").unwrap_or_else(|_| {
            error!("🪛️ TRIPAY_API_KEY is not set. Payment transactions cannot be created.");
            String::default()
        }));
        let private_key = Secret::new(std::env::var("TRIPAY_PRIVATE_KEY").unwrap_or_else(|_| {
            error!("🪛️ TRIPAY_PRIVATE_KEY is not set. Transactions cannot be signed and callbacks will be rejected.");
            String::default()
        }));
        let merchant_code = std::env::var("TRIPAY_MERCHANT_CODE").unwrap_or_else(|_| {
            error!("🪛️ TRIPAY_MERCHANT_CODE is not set. Payment transactions cannot be created.");
            String::default()
        });
        let timeout = std::env::var("TRIPAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for TRIPAY_TIMEOUT ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let expiry = std::env::var("TRIPAY_EXPIRY_HOURS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid value for TRIPAY_EXPIRY_HOURS ({s}). {e}. Using the default."))
                    .ok()
            })
            .filter(|h| *h > 0)
            .map(chrono::Duration::hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_EXPIRY_HOURS));
        Self { api_url, api_key, private_key, merchant_code, timeout, expiry }
    }

    /// True if enough credentials are present to create signed transactions.
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_set() && self.private_key.is_set() && !self.merchant_code.trim().is_empty()
    }
}
