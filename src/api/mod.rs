pub mod boards;
pub mod deposits;
pub mod health;
pub mod players;
pub mod rounds;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::orchestration::{BoardPurchaser, LedgerService, RoundLifecycle};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub ledger: LedgerService,
    pub purchaser: BoardPurchaser,
    pub rounds: RoundLifecycle,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: LedgerService::new(repo.clone(), clock.clone()),
            purchaser: BoardPurchaser::new(repo.clone(), clock.clone()),
            rounds: RoundLifecycle::new(repo.clone(), clock.clone()),
            repo,
            config,
            clock,
        }
    }
}

/// Parse an id taken from the request path.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    T::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/pricing", get(boards::get_pricing))
        .route(
            "/v1/players",
            post(players::create_player).get(players::list_players),
        )
        .route("/v1/players/:id", get(players::get_player))
        .route("/v1/players/:id/active", put(players::set_player_active))
        .route("/v1/players/:id/balance", get(deposits::get_balance))
        .route("/v1/players/:id/boards", get(boards::get_player_boards))
        .route("/v1/players/:id/deposits", get(deposits::get_player_deposits))
        .route("/v1/deposits", post(deposits::create_deposit))
        .route("/v1/deposits/pending", get(deposits::get_pending_deposits))
        .route("/v1/deposits/:id/approve", post(deposits::approve_deposit))
        .route("/v1/deposits/:id/dismiss", post(deposits::dismiss_deposit))
        .route("/v1/boards", post(boards::purchase_board))
        .route("/v1/boards/:id", get(boards::get_board))
        .route("/v1/rounds", get(rounds::list_rounds))
        .route("/v1/rounds/current", get(rounds::get_current_round))
        .route("/v1/rounds/:id", get(rounds::get_round))
        .route("/v1/rounds/:id/boards", get(rounds::get_round_boards))
        .route("/v1/rounds/:id/winning-boards", get(rounds::get_winning_boards))
        .route("/v1/rounds/:id/draw", post(rounds::draw_numbers))
        .route("/v1/rounds/:id/refund", post(rounds::refund_round))
        .layer(cors)
        .with_state(state)
}
