//! Full weekly cycles driven through the services with a manual clock.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc, Weekday};
use dead_pigeons::db::init_db;
use dead_pigeons::engine::WeeklySchedule;
use dead_pigeons::orchestration::{
    BoardPurchaser, LedgerService, PurchaseRequest, RoundLifecycle, RoundScheduler,
};
use dead_pigeons::{
    Clock, Decimal, DepositStatus, LotteryError, ManualClock, Player, PlayerId, Repository,
    RoundStatus,
};
use std::sync::Arc;
use tempfile::TempDir;

struct World {
    repo: Arc<Repository>,
    clock: ManualClock,
    ledger: LedgerService,
    purchaser: BoardPurchaser,
    rounds: RoundLifecycle,
    scheduler: RoundScheduler,
    _temp: TempDir,
}

// Monday 2 March 2026; the first deadline is Saturday 7 March 17:00 Copenhagen (16:00 UTC).
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

fn first_deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 7, 16, 0, 0).unwrap()
}

async fn setup_world() -> World {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let clock = ManualClock::new(start());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let schedule = WeeklySchedule::new(
        Weekday::Sat,
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        chrono_tz::Europe::Copenhagen,
    );

    World {
        ledger: LedgerService::new(repo.clone(), shared.clone()),
        purchaser: BoardPurchaser::new(repo.clone(), shared.clone()),
        rounds: RoundLifecycle::new(repo.clone(), shared.clone()),
        scheduler: RoundScheduler::new(
            repo.clone(),
            shared,
            schedule,
            std::time::Duration::from_millis(10),
        ),
        repo,
        clock,
        _temp: temp_dir,
    }
}

async fn register(w: &World, name: &str, email: &str) -> PlayerId {
    let player = Player::register(name, email, "12345678", true, w.clock.now()).unwrap();
    w.repo.insert_player(&player).await.unwrap();
    player.id
}

#[tokio::test]
async fn test_deposit_buy_close_draw_win() {
    let w = setup_world().await;
    w.scheduler.run_cycle().await.unwrap();
    let round = w.rounds.current_open_round().await.unwrap().unwrap().round;
    assert_eq!(round.draw_deadline, first_deadline());

    let player_id = register(&w, "Kim Winner", "kim@example.com").await;
    assert!(w.ledger.balance(player_id).await.unwrap().is_zero());

    let deposit = w
        .ledger
        .record_deposit(player_id, Decimal::from_units(100), "MP-777")
        .await
        .unwrap();
    assert_eq!(deposit.status, DepositStatus::Pending);
    assert!(w.ledger.balance(player_id).await.unwrap().is_zero());

    w.ledger.approve_deposit(deposit.id, None).await.unwrap();
    assert_eq!(w.ledger.balance(player_id).await.unwrap(), Decimal::from_units(100));

    let board = w
        .purchaser
        .purchase(PurchaseRequest {
            player_id,
            round_id: round.id,
            field_count: 5,
            numbers: vec![8, 2, 7, 1, 5],
        })
        .await
        .unwrap();
    assert_eq!(board.price, Decimal::from_units(20));
    assert_eq!(w.ledger.balance(player_id).await.unwrap(), Decimal::from_units(80));

    w.clock.set(first_deadline());
    let report = w.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.closed, vec![round.id]);
    assert!(report.opened.is_some());

    w.clock.advance(Duration::hours(2));
    let outcome = w.rounds.draw_numbers(round.id, [1, 2, 5]).await.unwrap();
    assert_eq!(outcome.total_boards, 1);
    assert_eq!(outcome.winning_board_count, 1);

    let winners = w.rounds.winning_boards(round.id).await.unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].id, board.id);
    assert!(winners[0].is_winning);
    assert_eq!(w.ledger.balance(player_id).await.unwrap(), Decimal::from_units(80));

    let summary = w.rounds.get_round(round.id).await.unwrap();
    assert_eq!(summary.round.status, RoundStatus::Settled);
}

#[tokio::test]
async fn test_undrawn_round_is_refunded_after_window() {
    let w = setup_world().await;
    w.scheduler.run_cycle().await.unwrap();
    let round = w.rounds.current_open_round().await.unwrap().unwrap().round;

    let player_id = register(&w, "Lee Refund", "lee@example.com").await;
    let deposit = w
        .ledger
        .record_deposit(player_id, Decimal::from_units(50), "MP-1")
        .await
        .unwrap();
    w.ledger.approve_deposit(deposit.id, None).await.unwrap();
    w.purchaser
        .purchase(PurchaseRequest {
            player_id,
            round_id: round.id,
            field_count: 6,
            numbers: vec![1, 2, 3, 4, 5, 6],
        })
        .await
        .unwrap();
    assert_eq!(w.ledger.balance(player_id).await.unwrap(), Decimal::from_units(10));

    w.clock.set(first_deadline());
    w.scheduler.run_cycle().await.unwrap();

    w.clock.set(first_deadline() + Duration::hours(24));
    let err = w.rounds.refund(round.id).await.unwrap_err();
    assert!(matches!(err, LotteryError::RefundWindowNotYetOpen { .. }));

    w.clock.set(first_deadline() + Duration::hours(24) + Duration::seconds(1));
    let outcome = w.rounds.refund(round.id).await.unwrap();
    assert_eq!(outcome.refunded_board_count, 1);

    let stored = w.repo.get_round(round.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RoundStatus::Voided);
    assert!(w.repo.player_boards(player_id).await.unwrap().is_empty());
    assert_eq!(w.ledger.balance(player_id).await.unwrap(), Decimal::from_units(50));

    let err = w.rounds.draw_numbers(round.id, [1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, LotteryError::RoundNotClosed(_)));
}

#[tokio::test]
async fn test_exactly_one_open_round_after_each_cycle() {
    let w = setup_world().await;

    for week in 0..4 {
        w.clock.set(start() + Duration::days(7 * week));
        w.scheduler.run_cycle().await.unwrap();
        let open = w.repo.open_rounds().await.unwrap();
        assert_eq!(open.len(), 1, "week {}", week);
        assert!(open[0].draw_deadline > w.clock.now());
    }

    let rounds = w.rounds.list_rounds().await.unwrap();
    assert_eq!(rounds.len(), 4);
    assert!(rounds
        .windows(2)
        .all(|pair| pair[0].round.week_start >= pair[1].round.week_start));
    assert_eq!(
        rounds
            .iter()
            .filter(|r| r.round.status == RoundStatus::Closed)
            .count(),
        3
    );
}
