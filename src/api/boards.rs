use crate::api::{parse_id, AppState};
use crate::domain::{Board, BoardId, Decimal, PlayerId, RoundId, PRICE_TABLE};
use crate::error::{AppError, LotteryError};
use crate::orchestration::PurchaseRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBoardRequest {
    pub player_id: String,
    pub round_id: String,
    pub field_count: i32,
    pub numbers: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDto {
    pub board_id: BoardId,
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub field_count: u8,
    pub price: Decimal,
    pub numbers: Vec<u8>,
    pub is_winning: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Board> for BoardDto {
    fn from(b: Board) -> Self {
        BoardDto {
            board_id: b.id,
            player_id: b.player_id,
            round_id: b.round_id,
            field_count: b.field_count.get(),
            price: b.price,
            numbers: b.numbers,
            is_winning: b.is_winning,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub currency: String,
    /// Field count → price.
    pub prices: BTreeMap<u8, Decimal>,
}

pub async fn purchase_board(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseBoardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BoardDto>), AppError> {
    let Json(req) = payload?;
    let request = PurchaseRequest {
        player_id: parse_id(&req.player_id, "player")?,
        round_id: parse_id(&req.round_id, "round")?,
        field_count: req.field_count,
        numbers: req.numbers,
    };
    let board = state.purchaser.purchase(request).await?;
    Ok((StatusCode::CREATED, Json(board.into())))
}

pub async fn get_board(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BoardDto>, AppError> {
    let board_id: BoardId = parse_id(&id, "board")?;
    let board = state
        .repo
        .get_board(board_id)
        .await?
        .ok_or_else(|| LotteryError::not_found("Board", board_id))?;
    Ok(Json(board.into()))
}

pub async fn get_player_boards(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<BoardDto>>, AppError> {
    let player_id: PlayerId = parse_id(&id, "player")?;
    if state.repo.get_player(player_id).await?.is_none() {
        return Err(LotteryError::not_found("Player", player_id).into());
    }
    let boards = state.repo.player_boards(player_id).await?;
    Ok(Json(boards.into_iter().map(BoardDto::from).collect()))
}

pub async fn get_pricing(State(state): State<AppState>) -> Json<PricingResponse> {
    let prices = PRICE_TABLE
        .iter()
        .map(|(fields, units)| (*fields, Decimal::from_units(*units)))
        .collect();
    Json(PricingResponse {
        currency: state.config.currency.clone(),
        prices,
    })
}
