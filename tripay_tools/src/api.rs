use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::TripayConfig,
    data_objects::TripayResponse,
    NewTransaction,
    Transaction,
    TripayApiError,
};

#[derive(Clone)]
pub struct TripayApi {
    config: TripayConfig,
    client: Arc<Client>,
}

impl TripayApi {
    pub fn new(config: TripayConfig) -> Result<Self, TripayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.api_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| TripayApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TripayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &TripayConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Sends a request and unwraps the gateway's `{success, message, data}` envelope.
    ///
    /// A `success: false` reply is returned as [`TripayApiError::Rejected`] carrying the gateway's message, whatever
    /// the HTTP status was.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, TripayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<TripayResponse<T>>(&text) {
            Ok(TripayResponse { success: true, data: Some(data), .. }) => {
                trace!("💳️ REST query successful. {status}");
                Ok(data)
            },
            Ok(TripayResponse { success: true, data: None, .. }) => {
                Err(TripayApiError::RestResponseError("The gateway returned success without any data".into()))
            },
            Ok(TripayResponse { message, .. }) => {
                warn!("💳️ Tripay rejected the request ({status}): {message}");
                Err(TripayApiError::Rejected(message))
            },
            Err(_) if !status.is_success() => Err(TripayApiError::QueryError { status: status.as_u16(), message: text }),
            Err(e) => Err(TripayApiError::JsonError(e.to_string())),
        }
    }

    /// Signs and submits a closed-payment transaction.
    pub async fn create_transaction(&self, tx: NewTransaction) -> Result<Transaction, TripayApiError> {
        if !self.config.has_credentials() {
            return Err(TripayApiError::MissingCredentials(
                "TRIPAY_API_KEY, TRIPAY_PRIVATE_KEY and TRIPAY_MERCHANT_CODE must all be set".into(),
            ));
        }
        let merchant_ref = tx.merchant_ref.clone();
        if !tx.order_items.is_empty() && tx.items_total() != tx.amount {
            return Err(TripayApiError::InvalidTransaction(format!(
                "The items of {merchant_ref} add up to {}, but the amount is {}",
                tx.items_total(),
                tx.amount
            )));
        }
        let request = tx
            .into_request(&self.config.merchant_code, &self.config.private_key, Utc::now(), self.config.expiry)
            .map_err(|e| TripayApiError::RestRequestError(e.to_string()))?;
        debug!("💳️ Creating transaction for {merchant_ref} ({})", request.amount);
        let result =
            self.rest_query::<Transaction, _>(Method::POST, "/transaction/create", &[], Some(request)).await?;
        info!("💳️ Created transaction {} for {merchant_ref}", result.reference);
        Ok(result)
    }
}
