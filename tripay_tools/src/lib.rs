//! # Tripay tools
//!
//! A small client for the Tripay payment gateway. It covers the two halves of the gateway contract that the
//! group-buy engine needs:
//!
//! * Creating a closed-payment transaction. Every request is signed with
//!   `HMAC-SHA256(private_key, merchant_code ‖ merchant_ref ‖ amount)` (see [`signature`]).
//! * Verifying inbound payment-status callbacks, which carry `HMAC-SHA256(private_key, raw_body)` in the
//!   `X-Callback-Signature` header.
mod api;
mod config;
mod data_objects;
mod error;

pub mod signature;

pub use api::TripayApi;
pub use config::TripayConfig;
pub use data_objects::{CallbackPayload, CallbackStatus, NewTransaction, OrderItem, Transaction, TransactionRequest};
pub use error::{SignatureError, TripayApiError};

/// The header Tripay uses to deliver the callback signature.
pub const CALLBACK_SIGNATURE_HEADER: &str = "X-Callback-Signature";
/// The header Tripay uses to describe the callback type. Payment status callbacks use `payment_status`.
pub const CALLBACK_EVENT_HEADER: &str = "X-Callback-Event";
