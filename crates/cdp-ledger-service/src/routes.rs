//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{deposits, health, login, paybacks, posts, users, votes};
use crate::state::AppState;

/// Maximum concurrent requests for ledger endpoints.
const LEDGER_MAX_CONCURRENT_REQUESTS: usize = 32;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// Collection routes answer with and without a trailing slash.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /users` - Register
/// - `GET /users/:id` - Public user fields
/// - `POST /login` - Exchange credentials for an access token
/// - `GET /posts` - List posts with vote tallies (`limit`, `skip`, `search`)
/// - `GET /posts/:id` - One post with its vote tally
///
/// ## Authenticated
/// - `DELETE /users/me` - Delete the caller and their posts and votes
/// - `POST /posts` - Create a post
/// - `PUT /posts/:id`, `DELETE /posts/:id` - Owner only
/// - `POST /vote` - Cast or withdraw a vote
///
/// ## Deposits (mutations need the matching capability)
/// - `GET /posts/cdp`, `POST /posts/cdp`
/// - `GET /posts/cdp/:stt`, `PUT /posts/cdp/:stt`
/// - `GET /posts/cdp/code/:code`
///
/// ## Paybacks (mutations need the matching capability)
/// - `GET /posts/cdppayback`, `POST /posts/cdppayback`
/// - `GET /posts/cdppayback/:stt`, `PUT /posts/cdppayback/:stt`
/// - `GET /posts/cdppayback/code/:code`
/// - `GET /posts/cdppayback/code/balance/:code`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let ledger_routes = Router::new()
        // Deposits
        .route(
            "/posts/cdp",
            get(deposits::list_deposits).post(deposits::create_deposit),
        )
        .route(
            "/posts/cdp/",
            get(deposits::list_deposits).post(deposits::create_deposit),
        )
        .route(
            "/posts/cdp/:stt",
            get(deposits::get_deposit).put(deposits::update_deposit),
        )
        .route("/posts/cdp/code/:code", get(deposits::list_deposits_by_code))
        // Paybacks
        .route(
            "/posts/cdppayback",
            get(paybacks::list_paybacks).post(paybacks::create_payback),
        )
        .route(
            "/posts/cdppayback/",
            get(paybacks::list_paybacks).post(paybacks::create_payback),
        )
        .route(
            "/posts/cdppayback/:stt",
            get(paybacks::get_payback).put(paybacks::update_payback),
        )
        .route(
            "/posts/cdppayback/code/:code",
            get(paybacks::list_paybacks_by_code),
        )
        .route(
            "/posts/cdppayback/code/balance/:code",
            get(paybacks::get_balance),
        )
        .layer(ConcurrencyLimitLayer::new(LEDGER_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Users
        .route("/users", post(users::create_user))
        .route("/users/", post(users::create_user))
        .route("/users/me", delete(users::delete_me))
        .route("/users/:id", get(users::get_user))
        .route("/login", post(login::login))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        // Votes
        .route("/vote", post(votes::vote))
        .route("/vote/", post(votes::vote))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .merge(api_routes)
        .merge(ledger_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
