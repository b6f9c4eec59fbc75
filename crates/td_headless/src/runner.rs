//! Headless match runner implementation.
//!
//! Wraps a [`GameSession`] and answers [`Request`]s with [`Response`]s.
//! Time only advances on `tick` requests, so a controller fully decides
//! the pace of the match.

use std::io::{self, BufRead, Write};

use td_core::data::GameConfig;
use td_core::error::GameError;
use td_core::grid::Grid;
use td_core::session::GameSession;

use crate::protocol::{GameResult, Request, Response, StateSummary};

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs once per `tick` request).
    pub auto_state_output: bool,
    /// Upper bound on ticks a single `tick` request may run.
    pub max_ticks_per_request: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            auto_state_output: false,
            max_ticks_per_request: 100_000,
        }
    }
}

/// Headless runner for scripted matches.
pub struct HeadlessRunner {
    session: GameSession,
    level: String,
    config: HeadlessConfig,
    reported_end: bool,
}

impl HeadlessRunner {
    /// Start a match on `grid`.
    ///
    /// # Errors
    ///
    /// Whatever the session rejects when starting the match, typically a
    /// level without a spawn, base or route.
    pub fn new(
        level: impl Into<String>,
        grid: Grid,
        game: GameConfig,
        config: HeadlessConfig,
    ) -> Result<Self, GameError> {
        let mut session = GameSession::new(grid, game);
        session.start_match()?;
        let level = level.into();
        tracing::info!(%level, seed = session.config().seed, "Headless match started");
        Ok(Self {
            session,
            level,
            config,
            reported_end: false,
        })
    }

    /// The wrapped session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Ready message for the current state.
    pub fn ready(&self) -> Response {
        let tick = self.session.simulation().map_or(0, |sim| sim.tick_count());
        Response::ready(&self.level, tick)
    }

    /// Answer one request.
    pub fn handle(&mut self, request: Request) -> Vec<Response> {
        let name = request.name();
        let mut responses = Vec::new();

        match request {
            Request::Tick { count } => {
                let count = count.min(self.config.max_ticks_per_request);
                for _ in 0..count {
                    let Some(events) = self.session.step() else {
                        break;
                    };
                    if self.config.auto_state_output {
                        responses.extend(self.state());
                    }
                    if events.status.is_some() {
                        break;
                    }
                }
                self.push_notices(&mut responses);
                if !self.config.auto_state_output {
                    responses.extend(self.state());
                }
                responses.extend(self.game_over());
            }

            Request::Query { full } => match self.session.snapshot() {
                Some(snapshot) if full => responses.push(Response::Snapshot {
                    snapshot: Box::new((*snapshot).clone()),
                }),
                Some(snapshot) => {
                    responses.push(Response::State(StateSummary::from_snapshot(&snapshot)));
                }
                None => responses.push(Response::error("No match running", Some(name))),
            },

            Request::Command { command } => {
                match self.session.execute(&command) {
                    Ok(result) => responses.push(Response::Outcome { result }),
                    Err(e) => responses.push(Response::error(e.to_string(), Some(name))),
                }
                self.push_notices(&mut responses);
            }

            Request::Hash => match self.session.simulation() {
                Some(sim) => responses.push(Response::StateHash {
                    tick: sim.tick_count(),
                    hash: sim.state_hash(),
                }),
                None => responses.push(Response::error("No match running", Some(name))),
            },

            Request::Quit => responses.push(Response::Bye),
        }

        responses
    }

    fn state(&self) -> Option<Response> {
        self.session
            .snapshot()
            .map(|snapshot| Response::State(StateSummary::from_snapshot(&snapshot)))
    }

    fn push_notices(&mut self, responses: &mut Vec<Response>) {
        responses.extend(self.session.drain_notices().into_iter().map(|notice| {
            Response::Notice {
                key: notice.key,
                message: notice.message,
            }
        }));
    }

    /// Match-end report, sent once.
    fn game_over(&mut self) -> Option<Response> {
        if self.reported_end {
            return None;
        }
        let sim = self.session.simulation()?;
        let result = GameResult::from_status(sim.status())?;
        self.reported_end = true;
        tracing::info!(?result, tick = sim.tick_count(), "Match over");
        Some(Response::GameOver {
            result,
            ticks: sim.tick_count(),
            wave: sim.waves().wave(),
        })
    }

    /// Serve JSON-line requests from `input` until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Only I/O errors from reading `input` or writing `output`; malformed
    /// requests are answered with error responses.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(self.ready().to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request = match Request::from_json(line) {
                Ok(request) => request,
                Err(e) => {
                    tracing::debug!(error = %e, "Unparseable request");
                    let error = Response::error(format!("Parse error: {e}"), None);
                    output.write_all(error.to_json_line().as_bytes())?;
                    output.flush()?;
                    continue;
                }
            };

            let quit = request == Request::Quit;
            for response in self.handle(request) {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if quit {
                return Ok(());
            }
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use td_core::commands::{CommandOutcome, PlayerCommand};
    use td_core::components::TurretVariant;
    use td_core::session::GamePhase;
    use td_test_utils::fixtures::{lane_level, LANE_TURRET_SITE};

    fn runner(game: GameConfig) -> HeadlessRunner {
        HeadlessRunner::new("lane", lane_level(), game, HeadlessConfig::default()).unwrap()
    }

    #[test]
    fn test_ready_reports_level() {
        let runner = runner(GameConfig::default());
        assert_eq!(runner.ready(), Response::ready("lane", 0));
    }

    #[test]
    fn test_tick_reports_state_once() {
        let mut runner = runner(GameConfig::default());
        let responses = runner.handle(Request::Tick { count: 60 });
        assert_eq!(responses.len(), 1);
        let Response::State(state) = &responses[0] else {
            panic!("expected state, got {responses:?}");
        };
        assert_eq!(state.tick, 60);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_auto_state_reports_every_tick() {
        let config = HeadlessConfig {
            auto_state_output: true,
            ..HeadlessConfig::default()
        };
        let mut runner =
            HeadlessRunner::new("lane", lane_level(), GameConfig::default(), config).unwrap();
        let responses = runner.handle(Request::Tick { count: 5 });
        assert_eq!(responses.len(), 5);
    }

    #[test]
    fn test_commands_answer_outcome_or_error() {
        let mut runner = runner(GameConfig::default());
        let build = PlayerCommand::BuildTurret {
            x: LANE_TURRET_SITE.x,
            y: LANE_TURRET_SITE.y,
            variant: TurretVariant::Standard,
        };
        let responses = runner.handle(Request::Command { command: build });
        assert!(matches!(
            responses.as_slice(),
            [Response::Outcome {
                result: CommandOutcome::Queued { .. }
            }]
        ));

        let sell = PlayerCommand::SellTurret { x: 3, y: 3 };
        let responses = runner.handle(Request::Command {
            command: sell.clone(),
        });
        assert!(matches!(responses[0], Response::Error { .. }));
        assert!(matches!(responses[1], Response::Notice { .. }));

        // Repeats are throttled: error but no second notice.
        let responses = runner.handle(Request::Command { command: sell });
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut game = GameConfig::default().without_hero();
        game.starting_lives = 2;
        let mut runner = runner(game);
        runner.handle(Request::Command {
            command: PlayerCommand::SkipCountdown,
        });

        let responses = runner.handle(Request::Tick { count: 3000 });
        assert!(responses.iter().any(|r| matches!(
            r,
            Response::GameOver {
                result: GameResult::Overrun,
                ..
            }
        )));

        let responses = runner.handle(Request::Tick { count: 10 });
        assert!(!responses
            .iter()
            .any(|r| matches!(r, Response::GameOver { .. })));
    }

    #[test]
    fn test_run_serves_json_lines() {
        let mut runner = runner(GameConfig::default());
        let input = concat!(
            "{\"cmd\":\"tick\",\"count\":2}\n",
            "\n",
            "not json\n",
            "{\"cmd\":\"hash\"}\n",
            "{\"cmd\":\"quit\"}\n",
            "{\"cmd\":\"tick\"}\n",
        );
        let mut output = Vec::new();
        runner.run(Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("\"type\":\"ready\""));
        assert!(lines[1].contains("\"tick\":2"));
        assert!(lines[2].contains("Parse error"));
        assert!(lines[3].contains("\"type\":\"state_hash\""));
        assert_eq!(lines[4], "{\"type\":\"bye\"}");
    }

    #[test]
    fn test_end_of_input_says_bye() {
        let mut runner = runner(GameConfig::default());
        let mut output = Vec::new();
        runner.run(Cursor::new(""), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with("{\"type\":\"bye\"}\n"));
    }
}
