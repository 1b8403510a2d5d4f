use chrono::{DateTime, Utc};
use groupbuy_engine::{
    db_types::{Campaign, CampaignStatus, CampaignUpdate, NewCampaign, NewParticipant, Participant, PaymentStatus, Product, Store, UserId},
    traits::{
        CatalogManagement,
        GroupBuyDatabase,
        GroupBuyError,
        PaymentConfirmation,
        PaymentDetails,
        PaymentProvider,
        PaymentProviderError,
        PaymentRequest,
        SettledOrder,
    },
};
use mockall::mock;
use panen_common::Rupiah;

use crate::{
    auth::{AuthenticatedUser, IdentityProvider},
    errors::AuthError,
};

mock! {
    pub GroupBuyStore {}
    impl CatalogManagement for GroupBuyStore {
        async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, GroupBuyError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, GroupBuyError>;
        async fn insert_store(&self, owner_id: &UserId, store_name: &str) -> Result<Store, GroupBuyError>;
        async fn insert_product(&self, store_id: i64, title: &str, price: Rupiah) -> Result<Product, GroupBuyError>;
    }
    impl GroupBuyDatabase for GroupBuyStore {
        fn url(&self) -> &str;
        async fn insert_campaign(&self, campaign: NewCampaign) -> Result<Campaign, GroupBuyError>;
        async fn fetch_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError>;
        async fn fetch_active_campaigns(&self) -> Result<Vec<Campaign>, GroupBuyError>;
        async fn update_campaign(&self, campaign_id: i64, update: CampaignUpdate) -> Result<Option<Campaign>, GroupBuyError>;
        async fn delete_campaign(&self, campaign_id: i64) -> Result<bool, GroupBuyError>;
        async fn close_campaign(&self, campaign_id: i64, status: CampaignStatus) -> Result<Option<Campaign>, GroupBuyError>;
        async fn close_expired_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError>;
        async fn reserved_quantity(&self, campaign_id: i64) -> Result<i64, GroupBuyError>;
        async fn insert_participant(&self, participant: NewParticipant, now: DateTime<Utc>) -> Result<Option<Participant>, GroupBuyError>;
        async fn fetch_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;
        async fn fetch_participant_for_user(&self, campaign_id: i64, user_id: &UserId) -> Result<Option<Participant>, GroupBuyError>;
        async fn fetch_participants(&self, campaign_id: i64) -> Result<Vec<Participant>, GroupBuyError>;
        async fn fetch_participants_with_status(&self, campaign_id: i64, status: PaymentStatus) -> Result<Vec<Participant>, GroupBuyError>;
        async fn set_gateway_reference(&self, participant_id: i64, reference: &str) -> Result<Participant, GroupBuyError>;
        async fn reopen_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;
        async fn confirm_payment(&self, participant_id: i64) -> Result<PaymentConfirmation, GroupBuyError>;
        async fn mark_payment_failed(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;
        async fn fetch_campaigns_to_settle(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, GroupBuyError>;
        async fn create_order_for_participant(&self, campaign: &Campaign, participant_id: i64) -> Result<Option<SettledOrder>, GroupBuyError>;
        async fn refund_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;
    }
}

mock! {
    pub PaymentGateway {}
    impl PaymentProvider for PaymentGateway {
        async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentDetails, PaymentProviderError>;
    }
}

/// Accepts a fixed set of tokens: `<user>-token` authenticates as `<user>`.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity;

impl IdentityProvider for StaticIdentity {
    async fn verify_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        match token.strip_suffix("-token") {
            Some(user) if !user.is_empty() => Ok(AuthenticatedUser::new(user, Some(format!("{user}@example.com")))),
            _ => Err(AuthError::InvalidToken("Unknown test token".into())),
        }
    }
}
