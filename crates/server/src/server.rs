use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use std::{net::SocketAddr, sync::Arc};

use crate::{ServerError, account, products, purchases, tags};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the session token.
///
/// Clients send `Authorization: Basic <base64(token)>`. Unlike regular basic
/// auth there is no `user:password` pair inside, only the bare token.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl Header for SessionToken {
    fn name() -> &'static axum::http::HeaderName {
        &axum::http::header::AUTHORIZATION
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
        let Some((scheme, encoded)) = value.split_once(' ') else {
            return Err(AxumError::invalid());
        };
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AxumError::invalid());
        }
        let Ok(bytes) = STANDARD.decode(encoded.trim()) else {
            return Err(AxumError::invalid());
        };
        let Ok(token) = String::from_utf8(bytes) else {
            return Err(AxumError::invalid());
        };
        if token.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(SessionToken(token))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let encoded = format!("Basic {}", STANDARD.encode(&self.0));
        match axum::http::HeaderValue::from_str(&encoded) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode session token header"),
        }
    }
}

async fn auth(
    token: Option<TypedHeader<SessionToken>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(SessionToken(token))) = token else {
        return Err(EngineError::InvalidSession.into());
    };

    let session = state.engine.validate_session(&token).await?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Build the HTTP API mounted under `root_url` (e.g. `/api`).
pub fn router(state: ServerState, root_url: &str) -> Router {
    let protected = Router::new()
        .route("/logout", post(account::logout))
        .route("/account/password", post(account::change_password))
        .route("/purchases", get(purchases::list).post(purchases::create))
        .route(
            "/purchases/{id}",
            patch(purchases::update).delete(purchases::delete),
        )
        .route("/purchases/{id}/restore", post(purchases::restore))
        .route("/products", get(products::list).post(products::create))
        .route("/tags", get(tags::list).post(tags::create))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    let api = Router::new()
        .route("/login", post(account::login))
        .merge(protected)
        .with_state(state);

    let root_url = root_url.trim_end_matches('/');
    if root_url.is_empty() {
        api
    } else {
        Router::new().nest(root_url, api)
    }
}

pub async fn run(engine: Engine, addr: SocketAddr, root_url: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener, root_url).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    root_url: &str,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}{}", addr, root_url);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state, root_url)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    root_url: String,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener, &root_url).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn decode(raw: &'static str) -> Result<SessionToken, AxumError> {
        let value = HeaderValue::from_static(raw);
        SessionToken::decode(&mut std::iter::once(&value))
    }

    #[test]
    fn decodes_bare_token() {
        // base64("3f2a-token")
        assert_eq!(
            decode("Basic M2YyYS10b2tlbg==").unwrap(),
            SessionToken("3f2a-token".to_string())
        );
        assert_eq!(
            decode("basic M2YyYS10b2tlbg==").unwrap(),
            SessionToken("3f2a-token".to_string())
        );
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(decode("Bearer M2YyYS10b2tlbg==").is_err());
        assert!(decode("Basic").is_err());
        assert!(decode("Basic !!!").is_err());
        assert!(decode("Basic ").is_err());
    }

    #[test]
    fn encode_then_decode() {
        let mut values = Vec::new();
        SessionToken("abc".to_string()).encode(&mut values);
        let decoded = SessionToken::decode(&mut values.iter()).unwrap();
        assert_eq!(decoded, SessionToken("abc".to_string()));
    }
}
