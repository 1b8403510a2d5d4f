use chrono::{DateTime, Utc};
use groupbuy_engine::traits::{PaymentDetails, PaymentProvider, PaymentProviderError, PaymentRequest};
use log::*;
use tripay_tools::{NewTransaction, OrderItem, Transaction, TripayApi, TripayApiError, TripayConfig};

/// Creates group-buy payments as Tripay closed-payment transactions.
#[derive(Clone)]
pub struct TripayGateway {
    api: TripayApi,
}

impl std::fmt::Debug for TripayGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TripayGateway({})", self.api.config().api_url)
    }
}

impl TripayGateway {
    pub fn new(config: TripayConfig) -> Result<Self, TripayApiError> {
        if !config.has_credentials() {
            warn!("💳️ Tripay credentials are incomplete. Joining a campaign will fail until they are configured.");
        }
        let api = TripayApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentProvider for TripayGateway {
    async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentDetails, PaymentProviderError> {
        if !self.api.config().has_credentials() {
            return Err(PaymentProviderError::NotConfigured("Tripay credentials are missing".into()));
        }
        let merchant_ref = request.merchant_ref.to_string();
        debug!("💳️ Creating {} transaction for {merchant_ref} ({})", request.method, request.amount);
        let tx = self.api.create_transaction(new_transaction(request)).await.map_err(|e| {
            warn!("💳️ Could not create transaction for {merchant_ref}. {e}");
            provider_error(e)
        })?;
        info!("💳️ Transaction {} created for {merchant_ref}", tx.reference);
        Ok(payment_details(tx))
    }
}

fn new_transaction(request: PaymentRequest) -> NewTransaction {
    let order_items =
        request.items.into_iter().map(|item| OrderItem::new(item.name, item.price, item.quantity)).collect();
    NewTransaction {
        method: request.method,
        merchant_ref: request.merchant_ref.to_string(),
        amount: request.amount,
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        order_items,
    }
}

fn payment_details(tx: Transaction) -> PaymentDetails {
    let expires_at = tx.expired_time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0));
    PaymentDetails {
        reference: tx.reference,
        merchant_ref: tx.merchant_ref,
        checkout_url: tx.checkout_url,
        amount: tx.amount,
        status: tx.status,
        pay_code: tx.pay_code,
        expires_at,
    }
}

fn provider_error(e: TripayApiError) -> PaymentProviderError {
    match e {
        TripayApiError::Timeout => PaymentProviderError::Timeout,
        TripayApiError::MissingCredentials(m) | TripayApiError::Initialization(m) => {
            PaymentProviderError::NotConfigured(m)
        },
        TripayApiError::Rejected(m) | TripayApiError::InvalidTransaction(m) => PaymentProviderError::Rejected(m),
        TripayApiError::QueryError { status, message } if (400..500).contains(&status) => {
            PaymentProviderError::Rejected(format!("{status}. {message}"))
        },
        e => PaymentProviderError::Unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod test {
    use groupbuy_engine::{db_types::MerchantRef, traits::PaymentItem};
    use panen_common::Rupiah;

    use super::*;

    #[test]
    fn payment_request_becomes_signed_transaction_input() {
        let request = PaymentRequest {
            merchant_ref: MerchantRef::for_participant(42),
            amount: Rupiah::from(240_000),
            customer_name: "budi@example.com".into(),
            customer_email: "budi@example.com".into(),
            items: vec![PaymentItem {
                name: "Patungan: Beras Pandan Wangi 5kg".into(),
                price: Rupiah::from(80_000),
                quantity: 3,
            }],
            method: "QRIS".into(),
        };
        let tx = new_transaction(request);
        assert_eq!(tx.merchant_ref, "GB-42");
        assert_eq!(tx.amount, Rupiah::from(240_000));
        assert_eq!(tx.order_items.len(), 1);
        assert_eq!(tx.order_items[0].subtotal(), Rupiah::from(240_000));
    }

    #[test]
    fn gateway_errors() {
        assert!(matches!(provider_error(TripayApiError::Timeout), PaymentProviderError::Timeout));
        assert!(matches!(
            provider_error(TripayApiError::Rejected("Invalid method".into())),
            PaymentProviderError::Rejected(_)
        ));
        assert!(matches!(
            provider_error(TripayApiError::InvalidTransaction("Items do not add up".into())),
            PaymentProviderError::Rejected(_)
        ));
        assert!(matches!(
            provider_error(TripayApiError::QueryError { status: 401, message: "Unauthorized".into() }),
            PaymentProviderError::Rejected(_)
        ));
        assert!(matches!(
            provider_error(TripayApiError::QueryError { status: 503, message: "Down".into() }),
            PaymentProviderError::Unavailable(_)
        ));
    }

    #[test]
    fn transaction_becomes_payment_details() {
        let tx = Transaction {
            reference: "DEV-T0001123456ABCDE".into(),
            merchant_ref: "GB-42".into(),
            payment_method: Some("QRIS".into()),
            payment_name: Some("QRIS".into()),
            amount: Rupiah::from(240_000),
            pay_code: None,
            pay_url: None,
            checkout_url: "https://tripay.co.id/checkout/DEV-T0001123456ABCDE".into(),
            status: "UNPAID".into(),
            expired_time: Some(1_717_286_400),
            qr_url: None,
        };
        let details = payment_details(tx);
        assert_eq!(details.reference, "DEV-T0001123456ABCDE");
        assert_eq!(details.status, "UNPAID");
        assert_eq!(details.expires_at.map(|t| t.timestamp()), Some(1_717_286_400));
    }
}
