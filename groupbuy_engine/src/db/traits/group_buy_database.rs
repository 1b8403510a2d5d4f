use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Campaign, CampaignStatus, CampaignUpdate, NewCampaign, NewParticipant, Participant, PaymentStatus, UserId},
    traits::{CatalogManagement, PaymentConfirmation, PaymentProviderError, SettledOrder},
};

/// This trait defines the behaviour that backends must provide to run group-buy campaigns.
///
/// Every method is a single unit of work. Where a method guards an invariant, the guard must be evaluated by the
/// backend atomically with the write it protects. Callers never read a value, decide, and write it back.
///
/// Methods that apply a conditional transition return `Ok(None)` (or an `AlreadySettled`-style variant) when the
/// condition did not hold. The caller then works out why, and reports it.
#[allow(async_fn_in_trait)]
pub trait GroupBuyDatabase: CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    //-------------------------------------------   Campaigns   -----------------------------------------------------
    /// Stores a new campaign with `current_quantity = 0` and status `active`.
    async fn insert_campaign(&self, campaign: NewCampaign) -> Result<Campaign, GroupBuyError>;

    async fn fetch_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError>;

    /// All `active` campaigns, newest first.
    async fn fetch_active_campaigns(&self) -> Result<Vec<Campaign>, GroupBuyError>;

    /// Applies `update` if the campaign is still `active`, and if any new target quantity is not smaller than the
    /// quantity currently reserved by pending and paid participants.
    ///
    /// Returns `None` if either condition fails.
    async fn update_campaign(&self, campaign_id: i64, update: CampaignUpdate)
        -> Result<Option<Campaign>, GroupBuyError>;

    /// Deletes the campaign if it has no participant rows at all. Returns `false` if nothing was deleted.
    async fn delete_campaign(&self, campaign_id: i64) -> Result<bool, GroupBuyError>;

    /// Transitions the campaign from `active` to `status`. Returns `None` if the campaign was not active, since
    /// terminal states are final.
    async fn close_campaign(&self, campaign_id: i64, status: CampaignStatus)
        -> Result<Option<Campaign>, GroupBuyError>;

    /// Closes an `active` campaign at the end of its run. The outcome is decided from the stored quantity in the same
    /// statement: `successful` if the paid quantity reached the target, `failed` otherwise. A payment counted after
    /// the caller last read the campaign therefore still counts.
    ///
    /// Returns `None` if the campaign was not active.
    async fn close_expired_campaign(&self, campaign_id: i64) -> Result<Option<Campaign>, GroupBuyError>;

    /// The total quantity held by `pending` and `paid` participants.
    async fn reserved_quantity(&self, campaign_id: i64) -> Result<i64, GroupBuyError>;

    //-------------------------------------------  Participants  -----------------------------------------------------
    /// Inserts a `pending` participant, with `total_price = group_price × quantity` computed from the stored
    /// campaign. The insert only happens if, in the same statement,
    /// * the campaign is `active` and its end date is after `now`, and
    /// * the reserved quantity plus `participant.quantity` does not exceed the target.
    ///
    /// Returns `None` if the guard rejected the insert. A second row for the same (campaign, user) pair fails with
    /// [`GroupBuyError::AlreadyJoined`].
    async fn insert_participant(
        &self,
        participant: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, GroupBuyError>;

    async fn fetch_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;

    async fn fetch_participant_for_user(
        &self,
        campaign_id: i64,
        user_id: &UserId,
    ) -> Result<Option<Participant>, GroupBuyError>;

    /// All participants in the campaign, in order of joining.
    async fn fetch_participants(&self, campaign_id: i64) -> Result<Vec<Participant>, GroupBuyError>;

    /// All participants in the campaign with the given payment status, in order of joining.
    async fn fetch_participants_with_status(
        &self,
        campaign_id: i64,
        status: PaymentStatus,
    ) -> Result<Vec<Participant>, GroupBuyError>;

    /// Records the gateway's transaction reference against the participant.
    async fn set_gateway_reference(&self, participant_id: i64, reference: &str) -> Result<Participant, GroupBuyError>;

    /// Moves a `failed` participant back to `pending`, provided the campaign is active and can still hold the
    /// participant's quantity. Returns `None` if the guard rejected the change.
    async fn reopen_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;

    //-------------------------------------------    Payments    -----------------------------------------------------
    /// Marks the participant as paid and adds their quantity to the campaign, atomically.
    ///
    /// * Only `pending` or `failed` participants are moved to `paid`. Anything else is reported as
    ///   [`PaymentConfirmation::AlreadySettled`] and nothing changes, which makes re-delivered callbacks harmless.
    /// * The increment is conditional on the campaign being `active` with room for the quantity. If it cannot be
    ///   applied, the participant is marked `refunded` instead, and [`PaymentConfirmation::Rejected`] is returned.
    async fn confirm_payment(&self, participant_id: i64) -> Result<PaymentConfirmation, GroupBuyError>;

    /// Moves a `pending` participant to `failed`, releasing the reservation. Returns `None` if the participant was
    /// not pending.
    async fn mark_payment_failed(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;

    //-------------------------------------------   Settlement   -----------------------------------------------------
    /// Campaigns that need settlement work:
    /// * `active` campaigns whose end date is before `now`,
    /// * `successful` campaigns with paid participants that have no order yet,
    /// * `failed` or `cancelled` campaigns with participants still marked `paid`.
    ///
    /// The last two only occur if an earlier settlement run was interrupted.
    async fn fetch_campaigns_to_settle(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, GroupBuyError>;

    /// Creates an order and its line item for a paid participant of a successful campaign, and links the order to
    /// the participant, in one transaction.
    ///
    /// Returns `None`, with nothing written, if the participant already carries an order or is no longer paid.
    async fn create_order_for_participant(
        &self,
        campaign: &Campaign,
        participant_id: i64,
    ) -> Result<Option<SettledOrder>, GroupBuyError>;

    /// Moves a `paid` participant to `refunded`. Returns `None` if the participant was not paid.
    async fn refund_participant(&self, participant_id: i64) -> Result<Option<Participant>, GroupBuyError>;

    /// Closes the connection pool.
    async fn close(&mut self) -> Result<(), GroupBuyError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum GroupBuyError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Invalid input. {0}")]
    ValidationFailed(String),
    #[error("Only the owner of store #{0} may manage its campaigns")]
    NotStoreOwner(i64),
    #[error("Store #{0} does not exist")]
    StoreNotFound(i64),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Campaign #{0} does not exist")]
    CampaignNotFound(i64),
    #[error("Participant not found. {0}")]
    ParticipantNotFound(String),
    #[error("Campaign #{0} is not open")]
    CampaignNotActive(i64),
    #[error("Campaign #{campaign_id} cannot take {requested} more. Only {available} left.")]
    CapacityExceeded { campaign_id: i64, requested: i64, available: i64 },
    #[error("You have already joined campaign #{0}")]
    AlreadyJoined(i64),
    #[error("Campaign #{0} has participants and cannot be deleted. Cancel it instead.")]
    CampaignHasParticipants(i64),
    #[error("The payment for participant #{0} is already {1}")]
    PaymentAlreadySettled(i64, PaymentStatus),
    #[error("Payment gateway error. {0}")]
    PaymentGateway(String),
}

impl From<sqlx::Error> for GroupBuyError {
    fn from(e: sqlx::Error) -> Self {
        GroupBuyError::DatabaseError(e.to_string())
    }
}

impl From<PaymentProviderError> for GroupBuyError {
    fn from(e: PaymentProviderError) -> Self {
        GroupBuyError::PaymentGateway(e.to_string())
    }
}
