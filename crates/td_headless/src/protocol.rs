//! JSON protocol for headless match control.
//!
//! **Input (stdin):** requests from the controller
//! **Output (stdout):** responses, one JSON object per line
//!
//! # Protocol Flow
//!
//! 1. Runner starts the match and outputs `{"type":"ready",...}`
//! 2. Controller sends requests as JSON lines
//! 3. Runner answers each request; `tick` also reports notices and the
//!    match end when it happens
//! 4. `quit` (or end of input) outputs `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","level":"lane","tick":0}
//! -> {"cmd":"command","command":{"type":"build_turret","x":9,"y":1,"variant":"standard"}}
//! <- {"type":"outcome","result":{"outcome":"queued","job":7}}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"state","tick":60,"phase":"playing",...}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":60,"hash":1234567}
//! ```

use serde::{Deserialize, Serialize};

use td_core::commands::{CommandOutcome, PlayerCommand};
use td_core::economy::Resources;
use td_core::session::GamePhase;
use td_core::simulation::{DefeatReason, MatchStatus};
use td_core::snapshot::{Snapshot, WaveInfo};

// ============================================================================
// Requests (controller -> runner)
// ============================================================================

/// Requests accepted by the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Advance the match by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Report current state without advancing time.
    Query {
        /// Include the full snapshot instead of a summary.
        #[serde(default)]
        full: bool,
    },

    /// Issue a player command.
    Command {
        /// The command.
        command: PlayerCommand,
    },

    /// Report the state hash (for determinism checks).
    Hash,

    /// Stop the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

impl Request {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Request name for acknowledgments and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query { .. } => "query",
            Self::Command { .. } => "command",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Responses (runner -> controller)
// ============================================================================

/// Responses sent by the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept requests.
    Ready {
        /// Protocol version.
        version: String,
        /// Level identifier.
        level: String,
        /// Current tick.
        tick: u64,
    },

    /// Error processing a request.
    Error {
        /// Human-readable message.
        message: String,
        /// Request that failed, if it parsed.
        cmd: Option<String>,
    },

    /// A player command succeeded.
    Outcome {
        /// What the command did.
        result: CommandOutcome,
    },

    /// Summary of the match.
    State(StateSummary),

    /// Full snapshot.
    Snapshot {
        /// Everything observable.
        snapshot: Box<Snapshot>,
    },

    /// A throttled user notice.
    Notice {
        /// Throttle key.
        key: String,
        /// Message text.
        message: String,
    },

    /// The match ended.
    GameOver {
        /// Outcome.
        result: GameResult,
        /// Ticks played.
        ticks: u64,
        /// Wave reached.
        wave: u32,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash of the full state.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

/// Compact view of a match for `tick` and `query` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    /// Current tick.
    pub tick: u64,
    /// Session phase.
    pub phase: GamePhase,
    /// Resource ledger.
    pub resources: Resources,
    /// Lives left.
    pub lives: u32,
    /// Wave state.
    pub wave: WaveInfo,
    /// Extraction progress, 0 to 100.
    pub extraction_pct: u32,
    /// Hero health, if a hero is fielded.
    pub hero_health: Option<u32>,
    /// Enemies on the field.
    pub enemies: usize,
    /// Turrets standing (including wrecks).
    pub turrets: usize,
    /// Buildings standing.
    pub buildings: usize,
    /// Drones.
    pub drones: usize,
    /// Queued construction jobs.
    pub jobs: usize,
}

impl StateSummary {
    /// Summarize a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            tick: snapshot.tick,
            phase: snapshot.phase,
            resources: snapshot.resources,
            lives: snapshot.lives,
            wave: snapshot.wave.clone(),
            extraction_pct: snapshot.extraction.progress_pct,
            hero_health: snapshot.hero.as_ref().map(|h| h.health.current),
            enemies: snapshot.enemies.len(),
            turrets: snapshot.turrets.len(),
            buildings: snapshot.buildings.len(),
            drones: snapshot.drones.len(),
            jobs: snapshot.jobs.len(),
        }
    }
}

/// Final match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// Extraction completed.
    Victory,
    /// Hero destroyed.
    HeroLost,
    /// Lives ran out.
    Overrun,
    /// Tick limit reached with the match still running.
    Timeout,
}

impl GameResult {
    /// Map a match status; `None` while the match is still running.
    pub fn from_status(status: MatchStatus) -> Option<Self> {
        match status {
            MatchStatus::Running => None,
            MatchStatus::Victory => Some(Self::Victory),
            MatchStatus::Defeat(DefeatReason::HeroDestroyed) => Some(Self::HeroLost),
            MatchStatus::Defeat(DefeatReason::LivesExhausted) => Some(Self::Overrun),
        }
    }
}

impl Response {
    /// Create a ready response.
    pub fn ready(level: &str, tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            level: level.to_string(),
            tick,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to a JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::components::TurretVariant;

    #[test]
    fn test_parse_tick_request() {
        let req = Request::from_json(r#"{"cmd":"tick","count":60}"#).unwrap();
        assert_eq!(req, Request::Tick { count: 60 });
    }

    #[test]
    fn test_default_tick_count() {
        let req = Request::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(req, Request::Tick { count: 1 });
    }

    #[test]
    fn test_parse_nested_player_command() {
        let json = r#"{"cmd":"command",
            "command":{"type":"build_turret","x":9,"y":1,"variant":"sniper"}}"#;
        let req = Request::from_json(json).unwrap();
        assert_eq!(
            req,
            Request::Command {
                command: PlayerCommand::BuildTurret {
                    x: 9,
                    y: 1,
                    variant: TurretVariant::Sniper,
                }
            }
        );
        assert_eq!(req.name(), "command");
    }

    #[test]
    fn test_unknown_request_fails() {
        assert!(Request::from_json(r#"{"cmd":"teleport"}"#).is_err());
    }

    #[test]
    fn test_response_lines() {
        let line = Response::StateHash { tick: 3, hash: 42 }.to_json_line();
        assert_eq!(line, "{\"type\":\"state_hash\",\"tick\":3,\"hash\":42}\n");

        let line = Response::Outcome {
            result: CommandOutcome::CountdownSkipped,
        }
        .to_json_line();
        assert!(line.contains(r#""outcome":"countdown_skipped""#));
    }

    #[test]
    fn test_game_result_mapping() {
        assert_eq!(GameResult::from_status(MatchStatus::Running), None);
        assert_eq!(
            GameResult::from_status(MatchStatus::Defeat(DefeatReason::LivesExhausted)),
            Some(GameResult::Overrun)
        );
    }
}
