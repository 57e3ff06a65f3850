use api_types::transfer::SendCoinRequest;
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Account, TransferCmd};

use crate::{ServerError, server::ServerState};

pub async fn send_coin(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<SendCoinRequest>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .transfer(TransferCmd::new(account.id, payload.to_user, payload.amount))
        .await?;
    Ok(StatusCode::OK)
}
