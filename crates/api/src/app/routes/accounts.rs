use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use tallybank_ledger::IdentifierKind;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<dto::CreateAccountRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match body.validate() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .accounts
        .create(caller.caller(), request.initial_deposit)
        .await
    {
        Ok(account) => (
            StatusCode::CREATED,
            Json(dto::AccountCreatedResponse {
                message: "Bank account created successfully",
                account: dto::AccountResponse::new(&account, services.currency()),
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.accounts.list(caller.caller()).await {
        Ok(accounts) => Json(
            accounts
                .iter()
                .map(|a| dto::AccountResponse::new(a, services.currency()))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Extension(kind): Extension<IdentifierKind>,
    Path(identifier): Path<String>,
) -> axum::response::Response {
    match services
        .accounts
        .get(caller.caller(), kind, &identifier)
        .await
    {
        Ok(account) => Json(dto::AccountResponse::new(&account, services.currency())).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Extension(kind): Extension<IdentifierKind>,
    Path(identifier): Path<String>,
) -> axum::response::Response {
    match services
        .accounts
        .balance(caller.caller(), kind, &identifier)
        .await
    {
        Ok(balance) => Json(dto::BalanceResponse::from(balance)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
