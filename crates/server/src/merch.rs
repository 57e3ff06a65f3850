//! Catalog listing and purchases.

use api_types::merch::MerchItem;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, PurchaseCmd};

use crate::{ServerError, server::ServerState};

pub async fn buy(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Path(item): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .purchase(PurchaseCmd::new(account.id, item))
        .await?;
    Ok(StatusCode::OK)
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<MerchItem>>, ServerError> {
    let items = state
        .engine
        .catalog()
        .await?
        .into_iter()
        .map(|item| MerchItem {
            name: item.name,
            price: item.price,
        })
        .collect();
    Ok(Json(items))
}
