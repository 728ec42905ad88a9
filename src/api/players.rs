use crate::api::{parse_id, AppState};
use crate::domain::{Player, PlayerId};
use crate::error::{AppError, LotteryError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn create_player(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), AppError> {
    let Json(req) = payload?;
    let player = Player::register(
        &req.full_name,
        &req.email,
        &req.phone,
        req.is_active,
        state.clock.now(),
    )?;
    state.repo.insert_player(&player).await?;

    info!(player_id = %player.id, active = player.is_active, "Player registered");
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn list_players(State(state): State<AppState>) -> Result<Json<Vec<Player>>, AppError> {
    Ok(Json(state.repo.list_players().await?))
}

pub async fn get_player(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Player>, AppError> {
    let player_id: PlayerId = parse_id(&id, "player")?;
    let player = state
        .repo
        .get_player(player_id)
        .await?
        .ok_or_else(|| LotteryError::not_found("Player", player_id))?;
    Ok(Json(player))
}

pub async fn set_player_active(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<Player>, AppError> {
    let Json(req) = payload?;
    let player_id: PlayerId = parse_id(&id, "player")?;
    if !state.repo.set_player_active(player_id, req.is_active).await? {
        return Err(LotteryError::not_found("Player", player_id).into());
    }
    let player = state
        .repo
        .get_player(player_id)
        .await?
        .ok_or_else(|| LotteryError::not_found("Player", player_id))?;

    info!(player_id = %player_id, active = req.is_active, "Player activation changed");
    Ok(Json(player))
}
