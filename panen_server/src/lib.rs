//! # PanenHub group-buy server
//! This crate hosts the HTTP surface of the group-buy engine. It is responsible for:
//! * Serving campaign reads to anyone, and campaign management, joining and payment retries to authenticated users.
//! * Receiving payment-status callbacks from Tripay, verifying their signature and passing them to the engine.
//! * Running the settlement worker that closes expired campaigns.
//! * Pushing notifications to buyers when their payment lands, their order is created, or their money is due back.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/group-buy`, `/group-buy/{id}`: Campaign listing, details and management.
//! * `/group-buy/{id}/join`, `/group-buy/{id}/payment`, `/group-buy/{id}/cancel`: Enrolment and cancellation.
//! * `/payments/webhook`: Tripay payment callbacks.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod settlement_worker;

#[cfg(test)]
mod endpoint_tests;
