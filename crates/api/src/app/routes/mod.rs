use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::identifier_kind_middleware;

pub mod accounts;
pub mod system;
pub mod transfers;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    // Routes taking an account identifier need `X-Account-Identifier-Type`.
    let keyed = Router::new()
        .route("/accounts/:identifier", get(accounts::show))
        .route("/accounts/:identifier/balance", get(accounts::balance))
        .route("/accounts/:identifier/transfers", get(transfers::history))
        .route("/transfers", post(transfers::create))
        .route_layer(axum::middleware::from_fn(identifier_kind_middleware));

    Router::new()
        .route("/accounts", get(accounts::list).post(accounts::create))
        .merge(keyed)
}
