//! Domain types for the weekly numbers lottery.
//!
//! This module provides:
//! - Lossless currency amounts via a Decimal wrapper
//! - Entity identifiers
//! - Players, rounds, boards and deposits
//! - The static field-count price table and board selection rules

pub mod board;
pub mod decimal;
pub mod deposit;
pub mod player;
pub mod primitives;
pub mod round;

pub use board::{Board, FieldCount, Selection, MAX_NUMBER, MIN_NUMBER, PRICE_TABLE};
pub use decimal::Decimal;
pub use deposit::{Deposit, DepositStatus};
pub use player::Player;
pub use primitives::{BoardId, DepositId, PlayerId, RoundId};
pub use round::{DisplayStatus, Round, RoundStatus, RoundSummary, WinningNumbers};
