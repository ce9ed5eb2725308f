//! # REST API
//!
//! The axum router exposing key registration, signing, and verification
//! over HTTP. Handlers share state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                              |
//! |--------|------------------------|------------------------------------------|
//! | GET    | `/health`              | Liveness check                           |
//! | POST   | `/keys`                | Register a public key under its address  |
//! | GET    | `/keys`                | List registered addresses                |
//! | GET    | `/keys/:address`       | Public key registered for an address     |
//! | POST   | `/transactions/sign`   | Sign a transfer, return the record       |
//! | POST   | `/transactions/reward` | Issue an unsigned reward record          |
//! | POST   | `/transactions/verify` | Verify a record, return `{valid, hash}`  |
//!
//! ## Status codes
//!
//! Malformed input, missing signatures, and non-positive amounts are 400.
//! A signing key that does not control the sender is 403. An unknown
//! address is 404. A key already bound to another address is 409. Storage
//! failures are 500. A well-formed record whose signature does not check
//! out is still 200, with `"valid": false`. So is a record checked against
//! a `publicKey` that does not control its sender, and one whose signature
//! has the wrong length.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use coinlet_protocol::crypto::{generate_address, Address, CoinletKeypair, CoinletPublicKey};
use coinlet_protocol::registry::{KeyRegistry, KeyStore, RegistryError};
use coinlet_protocol::transaction::{
    Amount, TransactionError, TransactionRecord, TransferRequest,
};

use crate::metrics::{SharedMetrics, OUTCOME_INVALID, OUTCOME_REJECTED, OUTCOME_VALID};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Registry shared by every handler. The backend is picked at startup.
pub type SharedRegistry = Arc<KeyRegistry<Box<dyn KeyStore>>>;

/// Shared application state. Cheap to clone; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Reported by `/health`.
    pub version: String,
    pub registry: SharedRegistry,
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API [`Router`] with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/keys", post(register_key_handler).get(list_keys_handler))
        .route("/keys/:address", get(key_by_address_handler))
        .route("/transactions/sign", post(sign_handler))
        .route("/transactions/reward", post(reward_handler))
        .route("/transactions/verify", post(verify_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /keys`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyRequest {
    pub public_key: String,
}

/// A registry entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResponse {
    pub address: Address,
    pub public_key: String,
}

/// Body of `GET /keys`.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyListResponse {
    pub addresses: Vec<Address>,
}

/// Body of `POST /transactions/sign`.
///
/// `fromAddress` defaults to the address derived from `privateKey`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub private_key: String,
    #[serde(default)]
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: Amount,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Body of `POST /transactions/reward`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRequest {
    pub to_address: String,
    pub amount: Amount,
}

/// Body of `POST /transactions/verify`: a transaction record, plus an
/// optional public key. Without one, the sender's key comes from the
/// registry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(flatten)]
    pub transaction: TransferRequest,
    #[serde(default)]
    pub public_key: Option<String>,
}

/// Response of `POST /transactions/verify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub hash: String,
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn transaction_error_status(err: &TransactionError) -> StatusCode {
    match err {
        TransactionError::UnauthorizedSigner { .. } => StatusCode::FORBIDDEN,
        TransactionError::MissingSignature
        | TransactionError::InvalidAmount { .. }
        | TransactionError::MissingSender
        | TransactionError::MalformedSignature { .. } => StatusCode::BAD_REQUEST,
    }
}

fn registry_error_response(err: RegistryError) -> Response {
    let status = match &err {
        RegistryError::AddressMismatch { .. } => StatusCode::BAD_REQUEST,
        RegistryError::AlreadyRegistered(_) => StatusCode::CONFLICT,
        RegistryError::Storage(_) | RegistryError::Corrupt(_) => {
            tracing::error!(error = %err, "key registry failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is up.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": state.version })),
    )
}

/// `POST /keys`: registers a public key under its derived address.
///
/// 201 on first registration, 200 when the key was already there.
async fn register_key_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterKeyRequest>,
) -> Response {
    let public_key = match CoinletPublicKey::from_hex(&req.public_key) {
        Ok(pk) => pk,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let address = generate_address(&public_key);

    match state.registry.register(&address, &public_key) {
        Ok(inserted) => {
            let status = if inserted {
                state.metrics.keys_registered_total.inc();
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let body = KeyResponse {
                address,
                public_key: public_key.to_hex(),
            };
            (status, Json(body)).into_response()
        }
        Err(e) => registry_error_response(e),
    }
}

/// `GET /keys`: all registered addresses, ascending.
async fn list_keys_handler(State(state): State<AppState>) -> Response {
    match state.registry.list() {
        Ok(addresses) => (StatusCode::OK, Json(KeyListResponse { addresses })).into_response(),
        Err(e) => registry_error_response(e),
    }
}

/// `GET /keys/:address`: the key registered for `address`, or 404.
async fn key_by_address_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let address = match Address::parse(&address) {
        Ok(a) => a,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.registry.lookup(&address) {
        Ok(Some(pk)) => (
            StatusCode::OK,
            Json(KeyResponse {
                address,
                public_key: pk.to_hex(),
            }),
        )
            .into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("no public key registered for {}", address),
        ),
        Err(e) => registry_error_response(e),
    }
}

/// `POST /transactions/sign`: builds a transfer and signs it with the
/// supplied key. The key must control `fromAddress`.
async fn sign_handler(State(state): State<AppState>, Json(req): Json<SignRequest>) -> Response {
    let keypair = match CoinletKeypair::from_hex(&req.private_key) {
        Ok(kp) => kp,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let from_address = req
        .from_address
        .unwrap_or_else(|| generate_address(&keypair.public_key()).to_string());

    let draft = match (TransferRequest {
        from_address: Some(from_address),
        to_address: req.to_address,
        amount: req.amount,
        timestamp: req.timestamp,
        signature: None,
    })
    .into_draft()
    {
        Ok(draft) => draft,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match draft.sign(&keypair) {
        Ok(signed) => {
            state.metrics.transactions_signed_total.inc();
            (StatusCode::OK, Json(signed.to_record())).into_response()
        }
        Err(e) => {
            if matches!(e, TransactionError::UnauthorizedSigner { .. }) {
                state.metrics.unauthorized_signers_total.inc();
            }
            error_response(transaction_error_status(&e), e)
        }
    }
}

/// `POST /transactions/reward`: an unsigned reward paying `toAddress`.
///
/// Rewards are not bounded here. Any caller reaching this endpoint can
/// mint value.
async fn reward_handler(State(state): State<AppState>, Json(req): Json<RewardRequest>) -> Response {
    let draft = match (TransferRequest {
        from_address: None,
        to_address: req.to_address,
        amount: req.amount,
        timestamp: None,
        signature: None,
    })
    .into_draft()
    {
        Ok(draft) => draft,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    state.metrics.rewards_issued_total.inc();
    tracing::info!(to = %draft.to_address(), amount = draft.amount(), "reward issued");
    (StatusCode::OK, Json(TransactionRecord::from(draft))).into_response()
}

/// `POST /transactions/verify`: checks a record's signature.
///
/// Uses `publicKey` when supplied; otherwise looks up the sender in the
/// registry.
async fn verify_handler(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    let record = match req.transaction.into_record() {
        Ok(record) => record,
        Err(e) => {
            state.metrics.observe_verification(OUTCOME_REJECTED);
            return error_response(StatusCode::BAD_REQUEST, e);
        }
    };
    let hash = record.calculate_hash().to_hex();

    let public_key = match (req.public_key, &record.from_address) {
        (Some(hex), _) => match CoinletPublicKey::from_hex(&hex) {
            Ok(pk) => Some(pk),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
        (None, Some(from)) => match state.registry.lookup(from) {
            Ok(Some(pk)) => Some(pk),
            Ok(None) => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    format!("no public key registered for {}", from),
                )
            }
            Err(e) => return registry_error_response(e),
        },
        // A reward never consults a key.
        (None, None) => None,
    };

    let timer = state.metrics.verification_seconds.start_timer();
    let outcome = match &public_key {
        Some(pk) => record.is_valid(pk),
        None => Ok(record.is_reward()),
    };
    timer.observe_duration();

    match outcome {
        Ok(valid) => {
            state.metrics.observe_verification(if valid {
                OUTCOME_VALID
            } else {
                OUTCOME_INVALID
            });
            (StatusCode::OK, Json(VerifyResponse { valid, hash })).into_response()
        }
        Err(e) => {
            state.metrics.observe_verification(OUTCOME_REJECTED);
            error_response(transaction_error_status(&e), e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NodeMetrics;
    use axum::body::Body;
    use axum::http::Request;
    use coinlet_protocol::crypto::sign_digest;
    use coinlet_protocol::registry::{MemoryKeyStore, SledKeyStore};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app_state() -> AppState {
        let store: Box<dyn KeyStore> = Box::new(MemoryKeyStore::new());
        AppState {
            version: "0.1.0-test".into(),
            registry: Arc::new(KeyRegistry::new(store)),
            metrics: Arc::new(NodeMetrics::new().expect("metrics")),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    async fn get(router: &Router, path: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        send(router, req).await
    }

    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        send(router, req).await
    }

    fn bob() -> String {
        "b".repeat(40)
    }

    /// Signs 50 to bob through the API and returns (keypair, record JSON).
    async fn signed_transfer(router: &Router) -> (CoinletKeypair, serde_json::Value) {
        let kp = CoinletKeypair::generate();
        let (status, record) = post_json(
            router,
            "/transactions/sign",
            serde_json::json!({
                "privateKey": kp.secret_key_hex(),
                "toAddress": bob(),
                "amount": 50,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (kp, record)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "0.1.0-test");
    }

    #[tokio::test]
    async fn register_key_then_fetch_it() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let pk = CoinletKeypair::generate().public_key();
        let address = generate_address(&pk).to_string();

        let (status, body) =
            post_json(&router, "/keys", serde_json::json!({ "publicKey": pk.to_hex() })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["address"], address);

        let (status, _) =
            post_json(&router, "/keys", serde_json::json!({ "publicKey": pk.to_hex() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.metrics.keys_registered_total.get(), 1);

        let (status, body) = get(&router, &format!("/keys/{}", address)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["publicKey"], pk.to_hex());

        let (status, body) = get(&router, "/keys").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["addresses"], serde_json::json!([address]));
    }

    #[tokio::test]
    async fn register_rejects_bad_key_hex() {
        let router = create_router(test_app_state());
        let (status, body) =
            post_json(&router, "/keys", serde_json::json!({ "publicKey": "zz" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("public key"));
    }

    #[tokio::test]
    async fn unknown_key_is_404_and_bad_address_is_400() {
        let router = create_router(test_app_state());
        let (status, _) = get(&router, &format!("/keys/{}", "0".repeat(40))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&router, "/keys/addrA").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_then_verify_with_supplied_key() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let (kp, record) = signed_transfer(&router).await;
        assert_eq!(record["fromAddress"], generate_address(&kp.public_key()).to_string());
        assert_eq!(record["signature"].as_str().unwrap().len(), 128);

        let mut req = record.clone();
        req["publicKey"] = serde_json::Value::String(kp.public_key().to_hex());
        let (status, body) = post_json(&router, "/transactions/verify", req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["hash"].as_str().unwrap().len(), 64);
        assert_eq!(state.metrics.transactions_signed_total.get(), 1);
    }

    #[tokio::test]
    async fn verify_uses_registry_when_no_key_given() {
        let router = create_router(test_app_state());
        let (kp, record) = signed_transfer(&router).await;

        let (status, _) = post_json(&router, "/transactions/verify", record.clone()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        post_json(
            &router,
            "/keys",
            serde_json::json!({ "publicKey": kp.public_key().to_hex() }),
        )
        .await;
        let (status, body) = post_json(&router, "/transactions/verify", record).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn tampered_amount_verifies_false() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let (kp, mut record) = signed_transfer(&router).await;

        record["amount"] = serde_json::json!(51);
        record["publicKey"] = serde_json::Value::String(kp.public_key().to_hex());
        let (status, body) = post_json(&router, "/transactions/verify", record).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(
            state
                .metrics
                .transactions_verified_total
                .with_label_values(&[OUTCOME_INVALID])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn foreign_sender_is_forbidden() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let kp = CoinletKeypair::generate();
        let (status, body) = post_json(
            &router,
            "/transactions/sign",
            serde_json::json!({
                "privateKey": kp.secret_key_hex(),
                "fromAddress": "a".repeat(40),
                "toAddress": bob(),
                "amount": 50,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("unauthorized signer"));
        assert_eq!(state.metrics.unauthorized_signers_total.get(), 1);
    }

    #[tokio::test]
    async fn unsigned_transfer_is_bad_request() {
        let router = create_router(test_app_state());
        let kp = CoinletKeypair::generate();
        let (status, body) = post_json(
            &router,
            "/transactions/verify",
            serde_json::json!({
                "fromAddress": generate_address(&kp.public_key()).to_string(),
                "toAddress": bob(),
                "amount": 50,
                "timestamp": 1,
                "publicKey": kp.public_key().to_hex(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "transaction is unsigned");
    }

    #[tokio::test]
    async fn forged_sender_verifies_false() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let alice = CoinletKeypair::generate();
        let mallory = CoinletKeypair::generate();

        let mut record = TransactionRecord {
            from_address: Some(generate_address(&alice.public_key())),
            to_address: Address::parse(&bob()).unwrap(),
            amount: 1000,
            timestamp: 1_700_000_000_000,
            signature: None,
        };
        record.signature = Some(sign_digest(&mallory, &record.calculate_hash()).to_hex());

        let mut req = serde_json::to_value(&record).unwrap();
        req["publicKey"] = serde_json::Value::String(mallory.public_key().to_hex());
        let (status, body) = post_json(&router, "/transactions/verify", req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(
            state
                .metrics
                .transactions_verified_total
                .with_label_values(&[OUTCOME_INVALID])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn unsigned_zero_amount_reports_missing_signature() {
        let router = create_router(test_app_state());
        let kp = CoinletKeypair::generate();
        let (status, body) = post_json(
            &router,
            "/transactions/verify",
            serde_json::json!({
                "fromAddress": generate_address(&kp.public_key()).to_string(),
                "toAddress": bob(),
                "amount": 0,
                "timestamp": 1,
                "publicKey": kp.public_key().to_hex(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "transaction is unsigned");
    }

    #[tokio::test]
    async fn truncated_signature_verifies_false() {
        let router = create_router(test_app_state());
        let (kp, mut record) = signed_transfer(&router).await;

        let signature = record["signature"].as_str().unwrap()[..64].to_string();
        record["signature"] = serde_json::Value::String(signature);
        record["publicKey"] = serde_json::Value::String(kp.public_key().to_hex());
        let (status, body) = post_json(&router, "/transactions/verify", record).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn fractional_amount_is_unprocessable() {
        let router = create_router(test_app_state());
        let (status, _) = post_json(
            &router,
            "/transactions/verify",
            serde_json::json!({ "toAddress": bob(), "amount": 0.5, "timestamp": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn non_positive_amount_cannot_be_signed() {
        let router = create_router(test_app_state());
        let kp = CoinletKeypair::generate();
        let (status, _) = post_json(
            &router,
            "/transactions/sign",
            serde_json::json!({
                "privateKey": kp.secret_key_hex(),
                "toAddress": bob(),
                "amount": 0,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reward_issued_and_verified_without_key() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let (status, record) = post_json(
            &router,
            "/transactions/reward",
            serde_json::json!({ "toAddress": bob(), "amount": 50 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(record["fromAddress"].is_null());
        assert!(record["signature"].is_null());

        let (status, body) = post_json(&router, "/transactions/verify", record).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(state.metrics.rewards_issued_total.get(), 1);
    }

    #[tokio::test]
    async fn sled_backed_registry_serves_requests() {
        let store: Box<dyn KeyStore> =
            Box::new(SledKeyStore::open_temporary().expect("temp store"));
        let state = AppState {
            registry: Arc::new(KeyRegistry::new(store)),
            ..test_app_state()
        };
        let router = create_router(state);
        let pk = CoinletKeypair::generate().public_key();

        let (status, _) =
            post_json(&router, "/keys", serde_json::json!({ "publicKey": pk.to_hex() })).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = get(&router, &format!("/keys/{}", generate_address(&pk))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
