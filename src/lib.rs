pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Board, BoardId, Decimal, Deposit, DepositId, DepositStatus, DisplayStatus, Player, PlayerId,
    Round, RoundId, RoundStatus, RoundSummary, WinningNumbers,
};
pub use error::{AppError, ErrorKind, LotteryError};
pub use orchestration::{BoardPurchaser, LedgerService, RoundLifecycle, RoundScheduler};
