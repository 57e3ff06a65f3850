//! Sign-in and account info endpoints.

use api_types::{
    auth::{AuthRequest, AuthResponse},
    info::{CoinHistory, InfoResponse, InventoryItem, Received, Sent},
};
use axum::{Extension, Json, extract::State};
use engine::{Account, AccountInfo};

use crate::{ServerError, server::ServerState};

/// Authenticates, registering unknown usernames on the fly.
pub async fn auth(
    State(state): State<ServerState>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    let account = state
        .engine
        .sign_in(&payload.username, &payload.password)
        .await?;

    Ok(Json(AuthResponse {
        username: account.username,
        coins: account.coins,
    }))
}

pub async fn info(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<InfoResponse>, ServerError> {
    let info = state.engine.account_info(account.id).await?;
    Ok(Json(info_response(info)))
}

fn info_response(info: AccountInfo) -> InfoResponse {
    InfoResponse {
        coins: info.account.coins,
        inventory: info
            .inventory
            .into_iter()
            .map(|owned| InventoryItem {
                kind: owned.item,
                quantity: owned.quantity,
            })
            .collect(),
        coin_history: CoinHistory {
            received: info
                .history
                .received
                .into_iter()
                .map(|entry| Received {
                    from_user: entry.counterparty,
                    amount: entry.amount,
                })
                .collect(),
            sent: info
                .history
                .sent
                .into_iter()
                .map(|entry| Sent {
                    to_user: entry.counterparty,
                    amount: entry.amount,
                    item: entry.item,
                })
                .collect(),
        },
    }
}
