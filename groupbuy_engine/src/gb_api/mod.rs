//! # Group-buy engine public API
//!
//! The API is split by concern, so that each part of a deployment only needs the backends it actually uses.
//!
//! * [`campaign_api`] covers the campaign lifecycle as seen by store owners (create, update, delete, cancel), plus
//!   the public reads.
//! * [`enrolment_api`] handles buyers joining a campaign and (re)creating their gateway transaction.
//! * [`payment_api`] applies payment-status callbacks from the gateway.
//! * [`settlement_api`] finalises campaigns once their end date has passed.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs, and the event producers that
//! its side effects should be published to.
//!
//! ```rust,ignore
//! use groupbuy_engine::{events::EventProducers, CampaignApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/panen.db", 25).await?;
//! let api = CampaignApi::new(db, EventProducers::default());
//! let campaigns = api.active_campaigns().await?;
//! ```
pub mod campaign_api;
pub mod campaign_objects;
pub mod enrolment_api;
pub mod payment_api;
pub mod payment_objects;
pub mod settlement_api;
pub mod settlement_objects;
