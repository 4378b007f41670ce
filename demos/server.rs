//! Simple REST API server example for the marketplace ledger.
//!
//! Run with: `cargo run --example server`
//!
//! The `profile-id` header stands in for the access layer: it names an
//! authenticated profile which the server resolves before any core
//! operation runs.
//!
//! ## Endpoints
//!
//! - `GET /contracts/{id}` - Fetch one of the caller's contracts
//! - `GET /contracts` - List the caller's non-terminated contracts
//! - `GET /jobs/unpaid` - List the caller's unpaid jobs on active contracts
//! - `POST /jobs/{id}/pay` - Pay a job (client only)
//! - `POST /balances/deposit/{user_id}` - Deposit into the caller's own balance
//! - `GET /admin/best-profession?start=&end=` - Top-earning profession
//! - `GET /admin/best-clients?start=&end=&limit=` - Top-paying clients
//!
//! ## Example Usage
//!
//! ```bash
//! # Pay job 2 as client 1
//! curl -X POST http://localhost:3000/jobs/2/pay -H "profile-id: 1"
//!
//! # Deposit
//! curl -X POST http://localhost:3000/balances/deposit/1 \
//!   -H "profile-id: 1" -H "Content-Type: application/json" \
//!   -d '{"amount": "50.00"}'
//!
//! # Reports
//! curl "http://localhost:3000/admin/best-profession?start=2020-08-10&end=2020-08-20"
//! curl "http://localhost:3000/admin/best-clients?start=2020-08-10&end=2020-08-20&limit=3"
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use gigledger_rs::{
    Contract, ContractId, ContractStatus, Engine, Job, JobId, LedgerError, Profile, ProfileId,
    ProfileKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
struct DepositRequest {
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct ReportWindow {
    start: NaiveDate,
    end: NaiveDate,
    limit: Option<usize>,
}

impl ReportWindow {
    /// Inclusive day bounds as UTC timestamps.
    fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = self.end.and_hms_opt(23, 59, 59).unwrap().and_utc();
        (start, end)
    }
}

// === Error Mapping ===

/// Maps each ledger failure kind to a stable HTTP status so callers can
/// react programmatically.
struct ApiError(LedgerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::Unauthorized => StatusCode::UNAUTHORIZED,
            LedgerError::NotFound | LedgerError::NoDataInRange => StatusCode::NOT_FOUND,
            LedgerError::InvalidAmount | LedgerError::NegativeAmount => StatusCode::BAD_REQUEST,
            LedgerError::InvalidJob
            | LedgerError::InsufficientFunds
            | LedgerError::DepositCapExceeded { .. }
            | LedgerError::DuplicateId
            | LedgerError::PartyMismatch
            | LedgerError::InvalidTransition => StatusCode::CONFLICT,
            LedgerError::TransactionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        ApiError(error)
    }
}

/// Resolves the caller profile from the `profile-id` header (the access
/// layer collaborator of this demo).
fn resolve_caller(engine: &Engine, headers: &HeaderMap) -> Result<Arc<Profile>, ApiError> {
    headers
        .get("profile-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u32>().ok())
        .and_then(|id| engine.profile(&ProfileId(id)))
        .ok_or(ApiError(LedgerError::Unauthorized))
}

// === Handlers ===

async fn get_contract(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&engine, &headers)?;
    let contract = engine.get_contract(&caller, ContractId(id))?;
    Ok(Json(contract.as_ref()).into_response())
}

async fn list_contracts(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&engine, &headers)?;
    let contracts = engine.list_contracts(&caller);
    let rows: Vec<&Contract> = contracts.iter().map(|c| c.as_ref()).collect();
    Ok(Json(rows).into_response())
}

async fn list_unpaid_jobs(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&engine, &headers)?;
    let jobs = engine.list_unpaid_jobs(&caller);
    let rows: Vec<&Job> = jobs.iter().map(|j| j.as_ref()).collect();
    Ok(Json(rows).into_response())
}

async fn pay_job(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&engine, &headers)?;
    engine.pay_job(&caller, JobId(id))?;
    Ok(Json(json!({ "status": "paid", "job": id })).into_response())
}

async fn deposit(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Path(user_id): Path<u32>,
    Json(request): Json<DepositRequest>,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(&engine, &headers)?;
    engine.deposit(&caller, ProfileId(user_id), request.amount)?;
    Ok(Json(json!({ "status": "deposited", "balance": caller.balance() })).into_response())
}

async fn best_profession(
    State(engine): State<Arc<Engine>>,
    Query(window): Query<ReportWindow>,
) -> Result<Response, ApiError> {
    let (start, end) = window.bounds();
    let profession = engine.best_profession(start, end)?;
    Ok(Json(json!({ "profession": profession })).into_response())
}

async fn best_clients(
    State(engine): State<Arc<Engine>>,
    Query(window): Query<ReportWindow>,
) -> Result<Response, ApiError> {
    let (start, end) = window.bounds();
    let clients = engine.best_clients(start, end, window.limit)?;
    Ok(Json(clients).into_response())
}

// === Setup ===

/// Seeds a small marketplace so the endpoints have data to serve.
fn seed(engine: &Engine) {
    let rows: Result<(), LedgerError> = (|| {
        engine.add_profile(
            Profile::new(ProfileId(1), ProfileKind::Client, "Harry", "Potter", "wizard")
                .with_balance(dec!(1150.00)),
        )?;
        engine.add_profile(
            Profile::new(ProfileId(2), ProfileKind::Client, "Mr", "Robot", "hacker")
                .with_balance(dec!(231.11)),
        )?;
        engine.add_profile(
            Profile::new(ProfileId(5), ProfileKind::Contractor, "John", "Lenon", "musician")
                .with_balance(dec!(64.00)),
        )?;
        engine.add_profile(
            Profile::new(ProfileId(6), ProfileKind::Contractor, "Linus", "Torvalds", "programmer")
                .with_balance(dec!(1214.00)),
        )?;

        engine.add_contract(Contract::new(
            ContractId(1),
            ProfileId(1),
            ProfileId(5),
            ContractStatus::InProgress,
        ))?;
        engine.add_contract(Contract::new(
            ContractId(2),
            ProfileId(2),
            ProfileId(6),
            ContractStatus::Terminated,
        ))?;

        engine.add_job(Job::new(JobId(1), ContractId(1), dec!(201.00)))?;
        engine.add_job(Job::new(JobId(2), ContractId(1), dec!(200.00)))?;
        engine.add_job(Job::paid(
            JobId(3),
            ContractId(2),
            dec!(121.00),
            "2020-08-15T19:11:26Z".parse().expect("valid timestamp"),
        ))?;
        Ok(())
    })();
    rows.expect("demo seed is consistent");
}

fn app(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/contracts/{id}", get(get_contract))
        .route("/contracts", get(list_contracts))
        .route("/jobs/unpaid", get(list_unpaid_jobs))
        .route("/jobs/{id}/pay", post(pay_job))
        .route("/balances/deposit/{user_id}", post(deposit))
        .route("/admin/best-profession", get(best_profession))
        .route("/admin/best-clients", get(best_clients))
        .with_state(engine)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Arc::new(Engine::new());
    seed(&engine);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await.expect("bind address");
    println!("marketplace ledger listening on http://{addr}");

    axum::serve(listener, app(engine)).await.expect("server run");
}
