use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
    Mutex,
};

use chrono::{Duration, Utc};

use crate::traits::{PaymentDetails, PaymentProvider, PaymentProviderError, PaymentRequest};

/// A payment gateway double that records every request and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    requests: Arc<Mutex<Vec<PaymentRequest>>>,
    failing: Arc<AtomicBool>,
    counter: Arc<AtomicU64>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every transaction request fails as if the gateway were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl PaymentProvider for MockGateway {
    async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentDetails, PaymentProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentProviderError::Unavailable("The mock gateway is down".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("T0001MOCK{n:05}");
        Ok(PaymentDetails {
            checkout_url: format!("https://tripay.co.id/checkout/{reference}"),
            reference,
            merchant_ref: request.merchant_ref.to_string(),
            amount: request.amount,
            status: "UNPAID".to_string(),
            pay_code: None,
            expires_at: Some(Utc::now() + Duration::hours(24)),
        })
    }
}
