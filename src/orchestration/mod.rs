//! Services that combine the pure engine with the store.

pub mod ledger;
pub mod purchase;
pub mod rounds;
pub mod scheduler;

pub use ledger::LedgerService;
pub use purchase::{BoardPurchaser, PurchaseRequest};
pub use rounds::{DrawOutcome, RefundOutcome, RoundLifecycle};
pub use scheduler::{CycleReport, RoundScheduler};
