//! Pure computation for the lottery core: win determination, balance
//! derivation, round transition guards and weekly deadline arithmetic.

pub mod ledger;
pub mod lifecycle;
pub mod schedule;
pub mod win;

pub use ledger::compute_balance;
pub use schedule::WeeklySchedule;
pub use win::is_winning;
