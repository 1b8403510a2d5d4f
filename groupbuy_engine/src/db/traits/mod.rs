//! # Store accessor contracts
//!
//! The engine never talks to a database directly. Backends implement the traits in this module, and the public APIs
//! in [`crate::gb_api`] are generic over them.
//!
//! * [`CatalogManagement`] gives read access to stores and products (plus seeding, for operators and tests).
//! * [`GroupBuyDatabase`] holds every campaign, participant and order operation. Each method is one atomic unit of
//!   work; operations that guard an invariant (capacity, single participation, at-most-once counting of a payment)
//!   express that guard inside the database rather than as read-then-write in the caller.
//! * [`PaymentProvider`] is the narrow interface to the payment gateway.
mod catalog_management;
mod data_objects;
mod group_buy_database;
mod payment_provider;

pub use catalog_management::CatalogManagement;
pub use data_objects::{PaymentConfirmation, SettledOrder};
pub use group_buy_database::{GroupBuyDatabase, GroupBuyError};
pub use payment_provider::{PaymentDetails, PaymentItem, PaymentProvider, PaymentProviderError, PaymentRequest};
