use crate::api::boards::BoardDto;
use crate::api::{parse_id, AppState};
use crate::domain::{RoundId, RoundSummary};
use crate::error::AppError;
use crate::orchestration::{DrawOutcome, RefundOutcome};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub numbers: [i32; 3],
}

pub async fn list_rounds(State(state): State<AppState>) -> Result<Json<Vec<RoundSummary>>, AppError> {
    Ok(Json(state.rounds.list_rounds().await?))
}

pub async fn get_current_round(
    State(state): State<AppState>,
) -> Result<Json<RoundSummary>, AppError> {
    state
        .rounds
        .current_open_round()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No round is currently open".into()))
}

pub async fn get_round(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoundSummary>, AppError> {
    let round_id: RoundId = parse_id(&id, "round")?;
    Ok(Json(state.rounds.get_round(round_id).await?))
}

pub async fn get_round_boards(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<BoardDto>>, AppError> {
    let round_id: RoundId = parse_id(&id, "round")?;
    let boards = state.rounds.round_boards(round_id).await?;
    Ok(Json(boards.into_iter().map(BoardDto::from).collect()))
}

pub async fn get_winning_boards(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<BoardDto>>, AppError> {
    let round_id: RoundId = parse_id(&id, "round")?;
    let boards = state.rounds.winning_boards(round_id).await?;
    Ok(Json(boards.into_iter().map(BoardDto::from).collect()))
}

pub async fn draw_numbers(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<DrawRequest>, JsonRejection>,
) -> Result<Json<DrawOutcome>, AppError> {
    let Json(req) = payload?;
    let round_id: RoundId = parse_id(&id, "round")?;
    Ok(Json(state.rounds.draw_numbers(round_id, req.numbers).await?))
}

pub async fn refund_round(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RefundOutcome>, AppError> {
    let round_id: RoundId = parse_id(&id, "round")?;
    Ok(Json(state.rounds.refund(round_id).await?))
}
