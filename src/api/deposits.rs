use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{parse_id, AppState};
use crate::domain::{Decimal, Deposit, DepositId, DepositStatus, PlayerId};
use crate::error::AppError;

/// A money amount as sent by clients: a JSON number or a decimal string.
///
/// Numbers are re-parsed from their shortest decimal text, not converted from a float.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    fn parse(&self) -> Result<Decimal, AppError> {
        let raw = match self {
            AmountInput::Number(n) => n.to_string(),
            AmountInput::Text(s) => s.clone(),
        };
        Decimal::from_str(&raw).map_err(|_| AppError::BadRequest(format!("Invalid amount: {}", raw)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepositRequest {
    pub player_id: String,
    pub amount: AmountInput,
    pub external_ref: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveDepositRequest {
    pub amount: Option<AmountInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDto {
    pub deposit_id: DepositId,
    pub player_id: PlayerId,
    pub amount: Decimal,
    pub external_ref: String,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<Deposit> for DepositDto {
    fn from(d: Deposit) -> Self {
        DepositDto {
            deposit_id: d.id,
            player_id: d.player_id,
            amount: d.amount,
            external_ref: d.external_ref,
            status: d.status,
            created_at: d.created_at,
            approved_at: d.approved_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissResponse {
    pub deposit_id: DepositId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub player_id: PlayerId,
    pub balance: Decimal,
    pub currency: String,
}

pub async fn create_deposit(
    State(state): State<AppState>,
    payload: Result<Json<CreateDepositRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DepositDto>), AppError> {
    let Json(req) = payload?;
    let player_id: PlayerId = parse_id(&req.player_id, "player")?;
    let amount = req.amount.parse()?;
    let deposit = state
        .ledger
        .record_deposit(player_id, amount, &req.external_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(deposit.into())))
}

pub async fn get_pending_deposits(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepositDto>>, AppError> {
    let deposits = state.ledger.pending_deposits().await?;
    Ok(Json(deposits.into_iter().map(DepositDto::from).collect()))
}

/// The body is optional; an `amount` in it corrects the deposit on approval.
pub async fn approve_deposit(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Option<Json<ApproveDepositRequest>>,
) -> Result<Json<DepositDto>, AppError> {
    let deposit_id: DepositId = parse_id(&id, "deposit")?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let override_amount = req.amount.as_ref().map(AmountInput::parse).transpose()?;

    let deposit = state
        .ledger
        .approve_deposit(deposit_id, override_amount)
        .await?;
    Ok(Json(deposit.into()))
}

pub async fn dismiss_deposit(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DismissResponse>, AppError> {
    let deposit_id: DepositId = parse_id(&id, "deposit")?;
    let deposit_id = state.ledger.dismiss_deposit(deposit_id).await?;
    Ok(Json(DismissResponse { deposit_id }))
}

pub async fn get_player_deposits(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DepositDto>>, AppError> {
    let player_id: PlayerId = parse_id(&id, "player")?;
    let deposits = state.ledger.player_deposits(player_id).await?;
    Ok(Json(deposits.into_iter().map(DepositDto::from).collect()))
}

pub async fn get_balance(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, AppError> {
    let player_id: PlayerId = parse_id(&id, "player")?;
    let balance = state.ledger.balance(player_id).await?;
    Ok(Json(BalanceResponse {
        player_id,
        balance,
        currency: state.config.currency.clone(),
    }))
}
