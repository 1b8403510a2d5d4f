//! PanenHub Group-Buy Engine
//!
//! The group-buy engine runs "patungan" campaigns: a store offers a product at a group price, buyers join with a
//! quantity and pay through the payment gateway, and once the campaign ends it either succeeds (every paid buyer
//! gets an order) or fails (every paid buyer is marked for refund).
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The engine's public API ([`mod@gb_api`]). This provides campaign management, enrolment, payment confirmation
//!    and settlement. Backends need to implement the traits in [`traits`] to act as storage for the engine, and
//!    payment gateways implement [`traits::PaymentProvider`].
//!
//! The central guarantee is that a campaign never sells more than its target. Every check that protects it is
//! evaluated by the backend in the same statement as the write it guards, so any number of server instances can
//! share one database.
//!
//! The engine also emits events when participants pay, orders are created, or refunds are marked. A simple actor
//! framework ([`events`]) lets you hook into them, e.g. to send push notifications.
mod db;

pub mod db_types;
pub mod events;
pub mod gb_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use gb_api::{
    campaign_api::CampaignApi,
    campaign_objects,
    enrolment_api::EnrolmentApi,
    payment_api::PaymentApi,
    payment_objects,
    settlement_api::SettlementApi,
    settlement_objects,
};
pub use traits::{GroupBuyDatabase, GroupBuyError, PaymentProvider};
