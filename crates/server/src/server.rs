use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{alerts, budgets};
use engine::{Engine, UserId};

static USER_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Authenticated user, set by the identity middleware.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub UserId);

/// `TypedHeader` for the caller identity.
///
/// Requests must carry an "x-user-id" entry with a positive numeric id.
/// Session handling lives in front of this service.
#[derive(Debug)]
struct UserHeader(UserId);

impl Header for UserHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.trim().parse::<UserId>() else {
            return Err(AxumError::invalid());
        };
        if value <= 0 {
            return Err(AxumError::invalid());
        }

        Ok(UserHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from(self.0)));
    }
}

async fn identify(
    user_header: Option<TypedHeader<UserHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(UserHeader(user_id))) = user_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/budgets", get(budgets::snapshot).post(budgets::create))
        .route("/budgets/all", get(budgets::list_all))
        .route("/budgets/summary", get(budgets::summary))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .put(budgets::update)
                .delete(budgets::delete),
        )
        .route("/alerts/evaluate", post(alerts::evaluate))
        .route("/alerts/refresh", post(alerts::refresh))
        .route_layer(middleware::from_fn(identify))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
