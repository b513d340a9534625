//! # REST API
//!
//! Builds the axum router that exposes one [`Runtime`] and its factory over
//! HTTP. All endpoints share application state through axum's `State`
//! extractor.
//!
//! Every mutating request names its caller explicitly (`caller`, `creator`,
//! `owner`...). Account fields accept either a `0x` address or a plain
//! label such as `"alice"`, which is turned into a deterministic address.
//! Contract and asset paths must be `0x` addresses.
//!
//! ## Endpoints
//!
//! | Method | Path                              | Description                  |
//! |--------|-----------------------------------|------------------------------|
//! | GET    | `/health`                         | Liveness check               |
//! | GET    | `/status`                         | Factory and runtime summary  |
//! | GET    | `/events?since=N&limit=M`         | Event log page               |
//! | GET    | `/accounts/:address`              | Native balance               |
//! | POST   | `/accounts/:address/mint`         | Native faucet                |
//! | POST   | `/tokens`                         | Deploy a fungible token      |
//! | POST   | `/tokens/:token/mint`             | Token faucet                 |
//! | POST   | `/tokens/:token/approve`          | Set an allowance             |
//! | POST   | `/collections`                    | Deploy an NFT collection     |
//! | POST   | `/collections/:c/mint`            | Mint the next NFT            |
//! | POST   | `/collections/:c/safe-transfer`   | Safe transfer (parcel hook)  |
//! | POST   | `/factory/pause`                  | Pause parcel creation        |
//! | POST   | `/factory/unpause`                | Resume parcel creation       |
//! | POST   | `/parcels`                        | Create a parcel              |
//! | GET    | `/parcels/:parcel`                | Parcel summary               |
//! | POST   | `/parcels/:parcel/deposit`        | Native deposit               |
//! | POST   | `/parcels/:parcel/tokens`         | Token deposit                |
//! | POST   | `/parcels/:parcel/lock`           | Seal the parcel              |
//! | POST   | `/parcels/:parcel/communal`       | Open deposits to anyone      |
//! | POST   | `/parcels/:parcel/secret`         | Replace the commitment       |
//! | POST   | `/parcels/:parcel/open`           | Present the secret           |

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parcel_contracts::{
    AssetCustody, ContractError, EventRecord, ParcelState, ParcelSummary, Runtime,
};
use parcel_protocol::config::EVENT_PAGE_LIMIT;
use parcel_protocol::crypto::SecretHash;
use parcel_protocol::identity::Address;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The execution environment hosting all contracts and assets.
    pub runtime: Arc<Runtime>,
    /// The factory served at `/parcels` and `/factory/*`.
    pub factory: Address,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Runs one runtime operation, timing it and counting rejections.
    fn call<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Runtime) -> Result<T, ContractError>,
    ) -> Result<T, ApiError> {
        let _timer = self
            .metrics
            .operation_latency_seconds
            .with_label_values(&[operation])
            .start_timer();
        f(&self.runtime).map_err(|err| {
            self.metrics.requests_rejected_total.inc();
            tracing::debug!(operation, error = %err, "request rejected");
            ApiError::Contract(err)
        })
    }

    /// Recounts parcels still accepting deposits.
    fn refresh_open_gauge(&self) {
        let open = self.runtime.count_parcels_in(ParcelState::Open);
        self.metrics
            .parcels_open
            .set(i64::try_from(open).unwrap_or(i64::MAX));
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `"incorrect_secret"`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Contract(ContractError),
    BadRequest(String),
}

impl From<ContractError> for ApiError {
    fn from(err: ContractError) -> Self {
        ApiError::Contract(err)
    }
}

/// HTTP status for a contract error.
pub fn status_for(err: &ContractError) -> StatusCode {
    match err {
        ContractError::AccessDenied => StatusCode::FORBIDDEN,
        ContractError::InvalidState(_)
        | ContractError::AlreadyInitialized
        | ContractError::FactoryPaused
        | ContractError::AlreadyPaused
        | ContractError::NotPaused => StatusCode::CONFLICT,
        ContractError::IncorrectSecret
        | ContractError::TransferFailed(_)
        | ContractError::AmountOverflow
        | ContractError::ZeroAddress => StatusCode::UNPROCESSABLE_ENTITY,
        ContractError::UnknownContract(_) | ContractError::UnknownAsset(_) => {
            StatusCode::NOT_FOUND
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Contract(err) => (
                status_for(&err),
                ErrorResponse {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "bad_request".to_string(),
                    message,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/accounts/:address/mint", post(mint_native_handler))
        .route("/tokens", post(deploy_token_handler))
        .route("/tokens/:token/mint", post(mint_tokens_handler))
        .route("/tokens/:token/approve", post(approve_tokens_handler))
        .route("/collections", post(deploy_collection_handler))
        .route("/collections/:collection/mint", post(mint_nft_handler))
        .route(
            "/collections/:collection/safe-transfer",
            post(safe_transfer_handler),
        )
        .route("/factory/pause", post(pause_handler))
        .route("/factory/unpause", post(unpause_handler))
        .route("/parcels", post(create_parcel_handler))
        .route("/parcels/:parcel", get(parcel_handler))
        .route("/parcels/:parcel/deposit", post(deposit_handler))
        .route("/parcels/:parcel/tokens", post(add_tokens_handler))
        .route("/parcels/:parcel/lock", post(lock_handler))
        .route("/parcels/:parcel/communal", post(communal_handler))
        .route("/parcels/:parcel/secret", post(update_secret_handler))
        .route("/parcels/:parcel/open", post(open_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub factory: Address,
    pub owner: Address,
    pub paused: bool,
    pub parcel_count: usize,
    pub event_count: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    pub native_balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeployTokenRequest {
    pub name: String,
    pub symbol: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DeployCollectionRequest {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeployedResponse {
    pub address: Address,
}

#[derive(Debug, Deserialize)]
pub struct MintTokensRequest {
    pub to: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApproveTokensRequest {
    pub owner: String,
    pub spender: String,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub holder: Address,
    pub balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct MintNftRequest {
    pub to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MintedNftResponse {
    pub collection: Address,
    pub token_id: u64,
    pub owner: Address,
}

#[derive(Debug, Deserialize)]
pub struct SafeTransferRequest {
    /// Defaults to `from`.
    pub caller: Option<String>,
    pub from: String,
    pub to: String,
    pub token_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

/// A commitment, given either precomputed or as the plaintext secret.
#[derive(Debug, Deserialize)]
pub struct CommitmentFields {
    pub hashed_secret: Option<SecretHash>,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateParcelRequest {
    pub creator: String,
    #[serde(flatten)]
    pub commitment: CommitmentFields,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSecretRequest {
    pub caller: String,
    #[serde(flatten)]
    pub commitment: CommitmentFields,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedParcelResponse {
    pub parcel: Address,
    pub sender: Address,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub caller: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddTokensRequest {
    pub caller: String,
    pub token: Address,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParcelBalanceResponse {
    pub parcel: Address,
    pub balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub caller: String,
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenResponse {
    pub parcel: Address,
    pub recipient: Address,
    pub released: AssetCustody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Accepts a `0x` address or a label.
pub fn resolve_account(raw: &str) -> Address {
    raw.parse::<Address>()
        .unwrap_or_else(|_| Address::from_label(raw))
}

fn parse_contract(raw: &str) -> Result<Address, ApiError> {
    raw.parse::<Address>()
        .map_err(|e| ApiError::BadRequest(format!("invalid address '{raw}': {e}")))
}

impl CommitmentFields {
    /// A supplied plaintext secret is hashed with the factory's scheme.
    fn resolve(&self, state: &AppState) -> Result<SecretHash, ApiError> {
        match (&self.hashed_secret, &self.secret) {
            (Some(hash), None) => Ok(*hash),
            (None, Some(secret)) => {
                let scheme = state.call("template", |rt| {
                    rt.factory(&state.factory, |f| f.template().hash_scheme)
                })?;
                Ok(SecretHash::commit(scheme, secret.as_bytes()))
            }
            _ => Err(ApiError::BadRequest(
                "provide exactly one of 'hashed_secret' or 'secret'".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers: node
// ---------------------------------------------------------------------------

/// `GET /health`. Liveness check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`.
async fn status_handler(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let (owner, paused, parcel_count) = state.call("status", |rt| {
        rt.factory(&state.factory, |f| (f.owner(), f.paused(), f.parcel_count()))
    })?;

    Ok(Json(StatusResponse {
        version: state.version.clone(),
        factory: state.factory,
        owner,
        paused,
        parcel_count,
        event_count: state.runtime.event_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /events`. Pages are capped at the configured event page limit.
async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    let limit = query
        .limit
        .unwrap_or(EVENT_PAGE_LIMIT)
        .min(EVENT_PAGE_LIMIT);
    Json(state.runtime.events_since(query.since, limit))
}

// ---------------------------------------------------------------------------
// Handlers: assets
// ---------------------------------------------------------------------------

async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Json<AccountResponse> {
    let address = resolve_account(&address);
    Json(AccountResponse {
        address,
        native_balance: state.runtime.native_balance(&address),
    })
}

async fn mint_native_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> ApiResult<BalanceResponse> {
    let holder = resolve_account(&address);
    let balance = state.call("mint_native", |rt| rt.mint_native(&holder, req.amount))?;
    Ok(Json(BalanceResponse { holder, balance }))
}

async fn deploy_token_handler(
    State(state): State<AppState>,
    Json(req): Json<DeployTokenRequest>,
) -> ApiResult<DeployedResponse> {
    let address = state.call("deploy_token", |rt| {
        rt.deploy_token(&req.name, &req.symbol, req.decimals)
    })?;
    Ok(Json(DeployedResponse { address }))
}

async fn mint_tokens_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<MintTokensRequest>,
) -> ApiResult<BalanceResponse> {
    let token = parse_contract(&token)?;
    let holder = resolve_account(&req.to);
    let balance = state.call("mint_tokens", |rt| rt.mint_tokens(&token, &holder, req.amount))?;
    Ok(Json(BalanceResponse { holder, balance }))
}

async fn approve_tokens_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<ApproveTokensRequest>,
) -> ApiResult<AckResponse> {
    let token = parse_contract(&token)?;
    let owner = resolve_account(&req.owner);
    let spender = resolve_account(&req.spender);
    state.call("approve_tokens", |rt| {
        rt.approve_tokens(&owner, &token, &spender, req.amount)
    })?;
    Ok(Json(AckResponse { ok: true }))
}

async fn deploy_collection_handler(
    State(state): State<AppState>,
    Json(req): Json<DeployCollectionRequest>,
) -> ApiResult<DeployedResponse> {
    let address = state.call("deploy_collection", |rt| {
        rt.deploy_collection(&req.name, &req.symbol)
    })?;
    Ok(Json(DeployedResponse { address }))
}

async fn mint_nft_handler(
    Path(collection): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<MintNftRequest>,
) -> ApiResult<MintedNftResponse> {
    let collection = parse_contract(&collection)?;
    let owner = resolve_account(&req.to);
    let token_id = state.call("mint_nft", |rt| rt.mint_nft(&collection, &owner))?;
    Ok(Json(MintedNftResponse {
        collection,
        token_id,
        owner,
    }))
}

async fn safe_transfer_handler(
    Path(collection): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SafeTransferRequest>,
) -> ApiResult<AckResponse> {
    let collection = parse_contract(&collection)?;
    let from = resolve_account(&req.from);
    let caller = req.caller.as_deref().map(resolve_account).unwrap_or(from);
    let to = resolve_account(&req.to);

    state.call("safe_transfer_nft", |rt| {
        rt.safe_transfer_nft(&caller, &collection, &from, &to, req.token_id)
    })?;
    if state.runtime.is_parcel(&to) {
        state.metrics.deposits_total.inc();
    }
    Ok(Json(AckResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Handlers: factory
// ---------------------------------------------------------------------------

async fn pause_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<AckResponse> {
    let caller = resolve_account(&req.caller);
    state.call("pause", |rt| rt.pause_factory(&state.factory, &caller))?;
    Ok(Json(AckResponse { ok: true }))
}

async fn unpause_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<AckResponse> {
    let caller = resolve_account(&req.caller);
    state.call("unpause", |rt| rt.unpause_factory(&state.factory, &caller))?;
    Ok(Json(AckResponse { ok: true }))
}

async fn create_parcel_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateParcelRequest>,
) -> ApiResult<CreatedParcelResponse> {
    let creator = resolve_account(&req.creator);
    let hashed_secret = req.commitment.resolve(&state)?;

    let parcel = state.call("create_parcel", |rt| {
        rt.create_parcel(&state.factory, &creator, hashed_secret)
    })?;
    state.metrics.parcels_created_total.inc();
    state.refresh_open_gauge();
    Ok(Json(CreatedParcelResponse {
        parcel,
        sender: creator,
    }))
}

// ---------------------------------------------------------------------------
// Handlers: parcels
// ---------------------------------------------------------------------------

async fn parcel_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<ParcelSummary> {
    let parcel = parse_contract(&parcel)?;
    let summary = state.call("parcel_summary", |rt| rt.parcel_summary(&parcel))?;
    Ok(Json(summary))
}

async fn deposit_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<ParcelBalanceResponse> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);
    let balance = state.call("deposit_native", |rt| {
        rt.deposit_native(&parcel, &caller, req.amount)
    })?;
    state.metrics.deposits_total.inc();
    Ok(Json(ParcelBalanceResponse { parcel, balance }))
}

async fn add_tokens_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<AddTokensRequest>,
) -> ApiResult<ParcelBalanceResponse> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);
    let balance = state.call("add_tokens", |rt| {
        rt.add_tokens(&parcel, &caller, &req.token, req.amount)
    })?;
    state.metrics.deposits_total.inc();
    Ok(Json(ParcelBalanceResponse { parcel, balance }))
}

async fn lock_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<ParcelSummary> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);
    state.call("lock", |rt| rt.lock_parcel(&parcel, &caller))?;
    state.refresh_open_gauge();
    let summary = state.call("parcel_summary", |rt| rt.parcel_summary(&parcel))?;
    Ok(Json(summary))
}

async fn communal_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<AckResponse> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);
    state.call("make_communal", |rt| rt.make_communal(&parcel, &caller))?;
    Ok(Json(AckResponse { ok: true }))
}

async fn update_secret_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateSecretRequest>,
) -> ApiResult<AckResponse> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);
    let new_hash = req.commitment.resolve(&state)?;
    state.call("update_hashed_secret", |rt| {
        rt.update_hashed_secret(&parcel, &caller, new_hash)
    })?;
    Ok(Json(AckResponse { ok: true }))
}

async fn open_handler(
    Path(parcel): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<OpenRequest>,
) -> ApiResult<OpenResponse> {
    let parcel = parse_contract(&parcel)?;
    let caller = resolve_account(&req.caller);

    let released = state
        .call("open", |rt| rt.open_parcel(&parcel, &caller, req.secret.as_bytes()))
        .map_err(|err| {
            if let ApiError::Contract(ContractError::IncorrectSecret) = err {
                state.metrics.open_attempts_failed_total.inc();
            }
            err
        })?;

    state.metrics.parcels_emptied_total.inc();
    Ok(Json(OpenResponse {
        parcel,
        recipient: caller,
        released,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
