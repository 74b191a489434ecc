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
    Extension(kind): Extension<IdentifierKind>,
    body: Result<Json<dto::CreateTransferRequest>, JsonRejection>,
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
        .transfers
        .execute(caller.caller(), kind, &request)
        .await
    {
        Ok(transfer) => (
            StatusCode::CREATED,
            Json(dto::TransferCreatedResponse {
                message: "Transfer successful",
                transfer: dto::TransferResponse::from(&transfer),
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Extension(kind): Extension<IdentifierKind>,
    Path(identifier): Path<String>,
) -> axum::response::Response {
    match services
        .history
        .list(caller.caller(), kind, &identifier)
        .await
    {
        Ok(transfers) => Json(
            transfers
                .iter()
                .map(dto::TransferResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
