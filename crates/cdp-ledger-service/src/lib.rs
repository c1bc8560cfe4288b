//! CDP Ledger HTTP API Service.
//!
//! This crate provides the HTTP API for the cdp-ledger service, including:
//!
//! - User registration and token login
//! - Posts and votes
//! - Deposits (CDPs) grouped by code
//! - Paybacks checked against each code's deposited total
//!
//! # Authentication
//!
//! Clients log in with email and password and receive an HS256 access token,
//! sent back as `Authorization: Bearer <token>`. Ledger mutations further
//! require a capability, held by the emails configured as ledger operators.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AccessPolicy, AuthUser};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
