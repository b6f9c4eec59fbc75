//! End-to-end match flows driven through [`GameSession`].

use std::cell::RefCell;
use std::rc::Rc;

use td_core::commands::{CommandOutcome, PlayerCommand};
use td_core::components::{Facing, TurretVariant};
use td_core::data::GameConfig;
use td_core::error::GameError;
use td_core::grid::{GridListener, TileChange, TileKind};
use td_core::session::{GamePhase, GameSession};
use td_core::simulation::{DefeatReason, MatchStatus};
use td_test_utils::fixtures::{lane_level, LANE_RUBBLE, LANE_TURRET_SITE};

#[derive(Default, Clone)]
struct TileLog(Rc<RefCell<Vec<TileChange>>>);

impl GridListener for TileLog {
    fn tile_changed(&mut self, change: TileChange) {
        self.0.borrow_mut().push(change);
    }
}

fn step_until(session: &mut GameSession, max_ticks: u32, done: impl Fn(&GameSession) -> bool) {
    for _ in 0..max_ticks {
        if done(session) {
            return;
        }
        session.step();
    }
}

#[test]
fn test_queued_turret_appears_once_built() {
    let log = TileLog::default();
    let mut config = GameConfig::default();
    config.waves.preparation_ms = 120_000;
    let mut session = GameSession::new(lane_level(), config).with_listener(Box::new(log.clone()));
    session.start_match().unwrap();

    let outcome = session
        .execute(&PlayerCommand::BuildTurret {
            x: LANE_TURRET_SITE.x,
            y: LANE_TURRET_SITE.y,
            variant: TurretVariant::Standard,
        })
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Queued { .. }));
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.jobs.len(), 1);
    assert!(snapshot.turret_at(LANE_TURRET_SITE).is_none());
    assert!(log.0.borrow().is_empty());

    step_until(&mut session, 1800, |s| {
        s.snapshot().is_some_and(|snap| snap.turret_at(LANE_TURRET_SITE).is_some())
    });

    let snapshot = session.snapshot().unwrap();
    assert!(snapshot.jobs.is_empty());
    assert_eq!(snapshot.grid.get(LANE_TURRET_SITE), Some(TileKind::Turret));
    assert_eq!(session.grid().get(LANE_TURRET_SITE), Some(TileKind::Turret));
    assert_eq!(
        log.0.borrow().as_slice(),
        &[TileChange {
            pos: LANE_TURRET_SITE,
            kind: TileKind::Turret
        }]
    );
}

#[test]
fn test_holding_extraction_wins() {
    let mut config = GameConfig::default();
    config.extraction.duration_ms = 2000;
    let mut session = GameSession::new(lane_level(), config);
    session.start_match().unwrap();
    session
        .execute(&PlayerCommand::SetHeroHeading {
            heading: Some(Facing::Down),
        })
        .unwrap();

    step_until(&mut session, 600, |s| s.phase() != GamePhase::Playing);

    assert_eq!(session.phase(), GamePhase::Victory);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.status, MatchStatus::Victory);
    assert_eq!(snapshot.extraction.progress_pct, 100);

    let frozen = snapshot.tick;
    assert!(session.step().is_none());
    assert_eq!(session.snapshot().unwrap().tick, frozen);
    assert_eq!(
        session.execute(&PlayerCommand::SkipCountdown),
        Err(GameError::NotPlaying)
    );
}

#[test]
fn test_leaking_enemies_exhaust_lives() {
    let mut config = GameConfig::default().without_hero();
    config.starting_lives = 2;
    let mut session = GameSession::new(lane_level(), config);
    session.start_match().unwrap();
    session.execute(&PlayerCommand::SkipCountdown).unwrap();

    step_until(&mut session, 3000, |s| s.phase() != GamePhase::Playing);

    assert_eq!(session.phase(), GamePhase::GameOver);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.lives, 0);
    assert_eq!(
        snapshot.status,
        MatchStatus::Defeat(DefeatReason::LivesExhausted)
    );
}

#[test]
fn test_stop_returns_to_editor_with_built_tiles() {
    let mut session = GameSession::new(lane_level(), GameConfig::default());
    session.start_match().unwrap();
    session
        .execute(&PlayerCommand::ClearRubble {
            x: LANE_RUBBLE.x,
            y: LANE_RUBBLE.y,
        })
        .unwrap();
    session.step();
    session.stop_match();

    assert_eq!(session.phase(), GamePhase::Editing);
    assert_eq!(session.grid().get(LANE_RUBBLE), Some(TileKind::Empty));

    // A fresh match starts from the edited grid.
    session.start_match().unwrap();
    assert_eq!(session.snapshot().unwrap().tick, 0);
    assert_eq!(
        session.snapshot().unwrap().grid.get(LANE_RUBBLE),
        Some(TileKind::Empty)
    );
}

#[test]
fn test_paused_match_keeps_state() {
    let mut session = GameSession::new(lane_level(), GameConfig::default());
    session.start_match().unwrap();
    for _ in 0..30 {
        session.step();
    }
    let before = session.simulation().unwrap().state_hash();

    assert!(session.pause());
    assert!(session.on_frame(10_000).is_none());
    assert!(session.step().is_none());
    assert_eq!(session.simulation().unwrap().state_hash(), before);

    assert!(session.resume());
    assert!(session.step().is_some());
    assert_eq!(session.simulation().unwrap().tick_count(), 31);
}
