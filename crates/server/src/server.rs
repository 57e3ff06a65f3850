use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use engine::{Engine, EngineError};

use crate::{ServerError, coins, merch, user};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves Basic credentials to an `engine::Account` and hands it to the
/// handler as an extension.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(EngineError::InvalidCredentials.into());
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(EngineError::InvalidCredentials.into());
    }

    let account = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await?;

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    let protected = Router::new()
        .route("/api/info", get(user::info))
        .route("/api/sendCoin", post(coins::send_coin))
        .route("/api/buy/{item}", get(merch::buy))
        .route("/api/merch", get(merch::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/api/auth", post(user::auth))
        .merge(protected)
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn run(engine: Engine, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(engine, listener, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
        }
        tracing::info!("shutting down");
    })
    .await
}

pub async fn run_with_listener<F>(
    engine: Engine,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine)))
        .with_graceful_shutdown(shutdown)
        .await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener, std::future::pending()).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
