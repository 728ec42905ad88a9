//! Weekly rounds, their lifecycle status and drawn numbers.

use crate::domain::RoundId;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How long after the draw deadline an administrator may still enter numbers.
pub fn draw_window() -> Duration {
    Duration::hours(24)
}

/// Lifecycle state of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    /// Accepting purchases.
    Open,
    /// Past the deadline, awaiting drawn numbers.
    Closed,
    /// Numbers drawn and winners marked.
    Settled,
    /// Refunded; all boards removed.
    Voided,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Open => "open",
            RoundStatus::Closed => "closed",
            RoundStatus::Settled => "settled",
            RoundStatus::Voided => "voided",
        }
    }

    /// The only legal edges are Open→Closed, Closed→Settled and Closed→Voided.
    pub fn can_transition_to(&self, next: RoundStatus) -> bool {
        matches!(
            (self, next),
            (RoundStatus::Open, RoundStatus::Closed)
                | (RoundStatus::Closed, RoundStatus::Settled)
                | (RoundStatus::Closed, RoundStatus::Voided)
        )
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoundStatus(pub String);

impl fmt::Display for UnknownRoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown round status: {}", self.0)
    }
}

impl std::error::Error for UnknownRoundStatus {}

impl FromStr for RoundStatus {
    type Err = UnknownRoundStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RoundStatus::Open),
            "closed" => Ok(RoundStatus::Closed),
            "settled" => Ok(RoundStatus::Settled),
            "voided" => Ok(RoundStatus::Voided),
            other => Err(UnknownRoundStatus(other.to_string())),
        }
    }
}

/// Status shown to players and administrators in round listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayStatus {
    Open,
    #[serde(rename = "Closed-PendingNumbers")]
    ClosedPendingNumbers,
    Completed,
    Refunded,
}

/// The three numbers entered by an administrator. Duplicates among them are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinningNumbers {
    pub numbers: [u8; 3],
    pub drawn_at: DateTime<Utc>,
}

/// One weekly lottery instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub week_start: NaiveDate,
    pub draw_deadline: DateTime<Utc>,
    pub status: RoundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_numbers: Option<WinningNumbers>,
    pub created_at: DateTime<Utc>,
}

impl Round {
    pub fn new_open(week_start: NaiveDate, draw_deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Round {
            id: RoundId::new(),
            week_start,
            draw_deadline,
            status: RoundStatus::Open,
            winning_numbers: None,
            created_at: now,
        }
    }

    /// Last instant at which numbers may still be drawn; refunds open right after it.
    pub fn draw_window_closes_at(&self) -> DateTime<Utc> {
        self.draw_deadline + draw_window()
    }

    pub fn display_status(&self) -> DisplayStatus {
        match self.status {
            RoundStatus::Open => DisplayStatus::Open,
            RoundStatus::Closed => DisplayStatus::ClosedPendingNumbers,
            RoundStatus::Settled => DisplayStatus::Completed,
            RoundStatus::Voided => DisplayStatus::Refunded,
        }
    }
}

/// A round with the board counts surfaced in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    #[serde(flatten)]
    pub round: Round,
    pub display_status: DisplayStatus,
    pub board_count: i64,
    pub winning_board_count: i64,
}

impl RoundSummary {
    pub fn new(round: Round, board_count: i64, winning_board_count: i64) -> Self {
        RoundSummary {
            display_status: round.display_status(),
            round,
            board_count,
            winning_board_count,
        }
    }
}
