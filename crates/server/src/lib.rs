use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod coins;
mod merch;
mod server;
mod user;

pub mod types {
    pub mod auth {
        pub use api_types::auth::{AuthRequest, AuthResponse};
    }

    pub mod info {
        pub use api_types::info::{CoinHistory, InfoResponse, InventoryItem, Received, Sent};
    }

    pub mod transfer {
        pub use api_types::transfer::SendCoinRequest;
    }

    pub mod merch {
        pub use api_types::merch::MerchItem;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::AccountNotFound(_) | EngineError::ItemNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AccountAlreadyExists(_) | EngineError::ItemAlreadyExists(_) => {
            StatusCode::CONFLICT
        }
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientFunds(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidRecipient(_)
        | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, errors) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), err.to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };
        if status.is_server_error() {
            tracing::warn!(%status, "request failed: {errors}");
        }

        (status, Json(ErrorResponse { errors })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
