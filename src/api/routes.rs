//! HTTP binding for the request handler

use super::handler::{NegotiateRequest, RequestHandler, ResetRequest};
use crate::error::BrokerError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;

/// Build the API router
pub fn router(handler: RequestHandler) -> Router {
    Router::new()
        .route("/api/negotiate", post(negotiate))
        .route("/api/reset", post(reset))
        .with_state(handler)
}

/// Serve the API on `addr` until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    handler: RequestHandler,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Negotiation API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        let status = match &err {
            e if e.is_input_error() => StatusCode::BAD_REQUEST,
            BrokerError::NegotiationConcluded(_) | BrokerError::SessionReset(_) => {
                StatusCode::CONFLICT
            }
            BrokerError::SessionLimitReached(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Negotiation request failed: {}", err);
        }
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

async fn negotiate(
    State(handler): State<RequestHandler>,
    payload: Result<Json<NegotiateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let response = handler.negotiate(request).await?;
    Ok(Json(response).into_response())
}

async fn reset(
    State(handler): State<RequestHandler>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    Ok(Json(handler.reset(request).await).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::testing::ScriptedOracle;
    use crate::oracle::{OracleDecision, RuleOracle, StrategyOracle};
    use crate::session::{SessionStore, StoreSettings};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(oracle: Arc<dyn StrategyOracle>) -> Router {
        let store = Arc::new(SessionStore::new(oracle, StoreSettings::default()));
        router(RequestHandler::new(store))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_negotiate_round_trip() {
        let (status, body) = post_json(
            app(Arc::new(RuleOracle::new())),
            "/api/negotiate",
            json!({"product": "Vintage Watch", "budget": 25000, "seller_message": "28000"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["session_id"].is_string());
        assert_eq!(body["response"]["action"], "counter");
        let price = body["response"]["offer_price"].as_u64().unwrap();
        assert!(price < 28000 && price <= 25000);
        assert!(body["response"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let router = app(Arc::new(RuleOracle::new()));

        let (status, body) = post_json(
            router.clone(),
            "/api/negotiate",
            json!({"product": "Vintage Watch", "budget": -1, "seller_message": "28000"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Budget must be a positive number.");

        let (status, body) = post_json(
            router,
            "/api/negotiate",
            json!({"product": "Vintage Watch", "budget": 25000, "seller_message": "lots"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Seller offer must be a positive number.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (status, body) = post_json(
            app(Arc::new(RuleOracle::new())),
            "/api/negotiate",
            json!({"product": "Vintage Watch"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_oracle_failure_is_reported_in_body() {
        let (status, body) = post_json(
            app(Arc::new(ScriptedOracle::new(vec![]))),
            "/api/negotiate",
            json!({"product": "Vintage Watch", "budget": 25000, "seller_message": 28000}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["action"], "error");
        assert!(body["response"]["offer_price"].is_null());
    }

    #[tokio::test]
    async fn test_concluded_session_is_409() {
        let router = app(Arc::new(ScriptedOracle::decisions(vec![OracleDecision::new(
            "accept", "Deal", None,
        )])));
        let body = json!({
            "product": "Vintage Watch",
            "budget": 25000,
            "seller_message": 24000,
            "session_id": "done"
        });

        let (status, first) = post_json(router.clone(), "/api/negotiate", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["response"]["action"], "accept");
        assert_eq!(first["response"]["offer_price"], 24000);

        let (status, _) = post_json(router, "/api/negotiate", body).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reset_endpoint() {
        let (status, body) = post_json(
            app(Arc::new(RuleOracle::new())),
            "/api/reset",
            json!({"session_id": "whatever"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "reset"}));
    }
}
