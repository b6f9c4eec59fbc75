//! Match session: the edit/play state machine around a [`Simulation`].
//!
//! The session owns the editor grid and, while a match runs, the
//! simulation. Hosts drive it with [`GameSession::on_frame`] (wall-clock
//! frames) or [`GameSession::step`] (one tick, for headless runs) and read
//! the latest published [`Snapshot`]. Snapshots are published only after a
//! full tick or a successful command, behind an [`Arc`] so readers can keep
//! one while the session moves on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::FrameClock;
use crate::commands::{CommandOutcome, PlayerCommand};
use crate::data::GameConfig;
use crate::error::{GameError, Result};
use crate::feedback::{Notice, NoticeThrottle};
use crate::grid::{Grid, GridListener, GridPos, TileChange, TileKind};
use crate::simulation::{MatchStatus, Simulation, TickEvents, TICK_DURATION_MS};
use crate::snapshot::Snapshot;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Level editor; no match.
    #[default]
    Editing,
    /// Match running.
    Playing,
    /// Match suspended; state kept.
    Paused,
    /// Match lost.
    GameOver,
    /// Match won.
    Victory,
}

/// Edit/play state machine.
pub struct GameSession {
    grid: Grid,
    config: GameConfig,
    phase: GamePhase,
    simulation: Option<Simulation>,
    snapshot: Option<Arc<Snapshot>>,
    clock: FrameClock,
    notices: NoticeThrottle,
    pending_notices: Vec<Notice>,
    listener: Option<Box<dyn GridListener>>,
    now_ms: u64,
}

impl GameSession {
    /// Session in edit mode.
    #[must_use]
    pub fn new(grid: Grid, config: GameConfig) -> Self {
        Self {
            notices: NoticeThrottle::new(config.notice_cooldown_ms),
            grid,
            config,
            phase: GamePhase::Editing,
            simulation: None,
            snapshot: None,
            clock: FrameClock::new(),
            pending_notices: Vec::new(),
            listener: None,
            now_ms: 0,
        }
    }

    /// Builder: forward in-match tile changes to `listener`.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn GridListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Editor grid, including tiles written during the match.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Configuration used for new matches.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The running simulation, if any.
    #[must_use]
    pub const fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    /// Take every notice raised since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending_notices)
    }

    fn raise(&mut self, error: &GameError) {
        if let Some(notice) = self.notices.notice(error, self.now_ms) {
            self.pending_notices.push(notice);
        }
    }

    fn forward(&mut self, change: TileChange) {
        self.grid.apply(change);
        if let Some(listener) = self.listener.as_mut() {
            listener.tile_changed(change);
        }
    }

    fn publish(&mut self) {
        self.snapshot = self.simulation.as_ref().map(|sim| {
            let mut snapshot = sim.snapshot();
            if self.phase == GamePhase::Paused {
                snapshot.phase = GamePhase::Paused;
            }
            Arc::new(snapshot)
        });
    }

    /// Paint a tile in the editor.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] outside edit mode,
    /// [`GameError::OutOfBounds`] off the grid.
    pub fn edit_tile(&mut self, pos: GridPos, kind: TileKind) -> Result<()> {
        if self.phase != GamePhase::Editing {
            return Err(GameError::InvalidState(
                "The level can only be edited between matches".into(),
            ));
        }
        if !self.grid.in_bounds(pos) {
            return Err(GameError::OutOfBounds(pos));
        }
        self.forward(TileChange { pos, kind });
        Ok(())
    }

    /// Start a match on the editor grid.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] if a match is already running or paused;
    /// otherwise whatever [`Simulation::new`] rejects. A failure is also
    /// raised as a notice and leaves the session in edit mode.
    pub fn start_match(&mut self) -> Result<()> {
        if matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            return Err(GameError::InvalidState("A match is already running".into()));
        }
        match Simulation::new(self.grid.clone(), self.config.clone()) {
            Ok(sim) => {
                self.simulation = Some(sim);
                self.phase = GamePhase::Playing;
                self.clock.reset();
                self.publish();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Match could not start");
                self.phase = GamePhase::Editing;
                self.raise(&e);
                Err(e)
            }
        }
    }

    /// End the match and return to the editor, discarding match state.
    pub fn stop_match(&mut self) {
        if self.simulation.take().is_some() {
            tracing::info!("Match stopped");
        }
        self.snapshot = None;
        self.clock.reset();
        self.phase = GamePhase::Editing;
    }

    /// Suspend ticking. Returns false unless a match is playing.
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Paused;
        self.publish();
        true
    }

    /// Resume a paused match. Returns false unless paused.
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.clock.reset();
        self.publish();
        true
    }

    /// Report a host frame. Runs at most one tick.
    pub fn on_frame(&mut self, now_ms: u64) -> Option<TickEvents> {
        self.now_ms = now_ms;
        if self.phase != GamePhase::Playing || !self.clock.poll(now_ms) {
            return None;
        }
        self.advance()
    }

    /// Run exactly one tick, advancing session time by one tick.
    pub fn step(&mut self) -> Option<TickEvents> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.now_ms += u64::from(TICK_DURATION_MS);
        self.advance()
    }

    fn advance(&mut self) -> Option<TickEvents> {
        let events = self.simulation.as_mut()?.tick();
        for change in &events.tile_changes {
            self.forward(*change);
        }
        match events.status {
            Some(MatchStatus::Victory) => self.phase = GamePhase::Victory,
            Some(MatchStatus::Defeat(_)) => self.phase = GamePhase::GameOver,
            Some(MatchStatus::Running) | None => {}
        }
        self.publish();
        Some(events)
    }

    /// Apply a player command to the running match.
    ///
    /// # Errors
    ///
    /// [`GameError::NotPlaying`] unless a match is playing, otherwise the
    /// command's own error. Errors are also raised as throttled notices.
    pub fn execute(&mut self, command: &PlayerCommand) -> Result<CommandOutcome> {
        let result = match self.simulation.as_mut() {
            Some(sim) if matches!(self.phase, GamePhase::Playing) => sim.apply_command(command),
            _ => Err(GameError::NotPlaying),
        };
        match result {
            Ok(outcome) => {
                if let Some(change) = outcome.tile_change() {
                    self.forward(change);
                }
                self.publish();
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(error = %e, ?command, "Command rejected");
                self.raise(&e);
                Err(e)
            }
        }
    }
}
