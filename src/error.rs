use crate::domain::{Decimal, DepositId, PlayerId, RoundId};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure classes callers can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
    InsufficientResource,
    TimingViolation,
    Transient,
}

/// Errors returned by the ledger, purchase and round operations.
#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("Field count must be 5, 6, 7 or 8, got {0}")]
    InvalidFieldCount(i32),
    #[error("Expected {expected} numbers, but got {actual}")]
    NumberCountMismatch { expected: usize, actual: usize },
    #[error("All numbers must be unique, {0} was chosen more than once")]
    DuplicateNumbers(i32),
    #[error("All numbers must be between 1 and 16, got {0}")]
    NumberOutOfRange(i32),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("External reference must be between 1 and 50 characters")]
    InvalidExternalRef,
    #[error("Invalid player: {0}")]
    InvalidPlayer(String),

    #[error("Round {0} is not open for purchases")]
    RoundNotOpen(RoundId),
    #[error("Round {0} must be closed for this action")]
    RoundNotClosed(RoundId),
    #[error("Winning numbers have already been drawn for round {0}")]
    NumbersAlreadyDrawn(RoundId),
    #[error("Round {0} has already been settled and cannot be refunded")]
    AlreadySettled(RoundId),
    #[error("Winning numbers have not been drawn for round {0}")]
    RoundNotSettled(RoundId),
    #[error("Another round is already open")]
    OpenRoundExists,
    #[error("Deposit {0} is already approved")]
    AlreadyApproved(DepositId),
    #[error("Player {0} is not active")]
    PlayerInactive(PlayerId),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("24-hour window to input numbers expired at {expired_at}. Please refund the round.")]
    DrawWindowExpired { expired_at: DateTime<Utc> },
    #[error("Cannot refund yet. {hours_remaining:.1} hours remaining in the 24-hour window.")]
    RefundWindowNotYetOpen {
        hours_remaining: f64,
        opens_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl LotteryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LotteryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotteryError::InvalidFieldCount(_)
            | LotteryError::NumberCountMismatch { .. }
            | LotteryError::DuplicateNumbers(_)
            | LotteryError::NumberOutOfRange(_)
            | LotteryError::InvalidAmount(_)
            | LotteryError::InvalidExternalRef
            | LotteryError::InvalidPlayer(_) => ErrorKind::Validation,
            LotteryError::RoundNotOpen(_)
            | LotteryError::RoundNotClosed(_)
            | LotteryError::NumbersAlreadyDrawn(_)
            | LotteryError::AlreadySettled(_)
            | LotteryError::RoundNotSettled(_)
            | LotteryError::OpenRoundExists
            | LotteryError::AlreadyApproved(_)
            | LotteryError::PlayerInactive(_) => ErrorKind::StateConflict,
            LotteryError::NotFound { .. } => ErrorKind::NotFound,
            LotteryError::InsufficientBalance { .. } => ErrorKind::InsufficientResource,
            LotteryError::DrawWindowExpired { .. } | LotteryError::RefundWindowNotYetOpen { .. } => {
                ErrorKind::TimingViolation
            }
            LotteryError::Store(_) => ErrorKind::Transient,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Lottery(#[from] LotteryError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg, "kind": ErrorKind::Transient }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": msg, "kind": ErrorKind::NotFound }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "kind": ErrorKind::Validation }),
            ),
            AppError::Lottery(err) => lottery_error_body(err),
        };

        (status, Json(body)).into_response()
    }
}

fn lottery_error_body(err: LotteryError) -> (StatusCode, serde_json::Value) {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InsufficientResource | ErrorKind::TimingViolation => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::Transient => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if kind == ErrorKind::Transient {
        tracing::error!(error = %err, "Store failure while handling request");
    }

    let mut body = json!({ "error": err.to_string(), "kind": kind });
    match &err {
        LotteryError::InsufficientBalance {
            required,
            available,
        } => {
            body["required"] = json!(required);
            body["available"] = json!(available);
            body["shortfall"] = json!(*required - *available);
        }
        LotteryError::DrawWindowExpired { expired_at } => {
            body["expiredAt"] = json!(expired_at);
        }
        LotteryError::RefundWindowNotYetOpen {
            hours_remaining,
            opens_at,
        } => {
            body["hoursRemaining"] = json!((hours_remaining * 10.0).round() / 10.0);
            body["opensAt"] = json!(opens_at);
        }
        _ => {}
    }

    (status, body)
}
