use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use septica_bot::{Policy, PolicyContext};
use septica_core::game::{Action, PlayOutcome, RoomError, RoomRegistry};
use septica_core::model::player::{PlayerCount, PlayerId};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, ResolvedOutputs, SimConfig};
use crate::summary::{RunReport, SummaryCollector, SummaryError};

/// Plays configured batches of games between policies.
pub struct SimulationRunner {
    config: SimConfig,
    outputs: ResolvedOutputs,
    count: PlayerCount,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub report: RunReport,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let count = config
            .games
            .player_count()
            .ok_or(RunnerError::PlayerCount {
                requested: config.games.players,
            })?;
        if config.agents.is_empty() {
            return Err(RunnerError::NoAgents);
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            count,
        })
    }

    /// Execute every game, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut collector = SummaryCollector::new(&self.config);

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let outcome = self.play_game(game_index, game_seed)?;
            collector.record_game(&outcome)?;
            rows_written += write_game_rows(&mut writer, &self.config, &outcome)?;
        }

        writer.flush()?;

        let report = collector.finalize();
        report.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .logging_enabled
            .then(|| self.outputs.telemetry_path());

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
            report,
        })
    }

    /// Seats agents round-robin, rotating the first seat each game, and plays
    /// the room to completion through the registry.
    pub fn play_game(&self, game_index: usize, game_seed: u64) -> Result<GameOutcome, RunnerError> {
        let registry = RoomRegistry::with_seed(game_seed);
        let room_id = game_id(game_index);
        let mut seats = self.seat_states(game_index, game_seed);

        for seat in &seats {
            registry.join(&room_id, u8::from(self.count), seat.player.clone())?;
        }
        let room = registry
            .room(&room_id)
            .ok_or_else(|| RunnerError::game(format!("room {room_id} vanished after join")))?;
        if !room.lock().is_started() {
            return Err(RunnerError::game(format!(
                "room {room_id} did not start with {} seats",
                seats.len()
            )));
        }

        let expected_cards = self.count.deck_size();
        let max_steps = 2 * expected_cards;
        let mut steps = 0usize;

        loop {
            let (player, action) = {
                let guard = room.lock();
                if guard.is_finished() {
                    break;
                }
                let player = guard
                    .current_player()
                    .cloned()
                    .ok_or_else(|| RunnerError::game(format!("{room_id}: nobody on turn")))?;
                let seat_index = guard
                    .seat_of(&player)
                    .ok_or_else(|| RunnerError::game(format!("{room_id}: {player} not seated")))?;
                let ctx = PolicyContext::new(&player, &guard);
                let seat = &mut seats[seat_index];
                let start = Instant::now();
                let action = seat.policy.choose(&ctx);
                let elapsed_ms = seat.metrics.record(start.elapsed());

                if self.logging_enabled && tracing::enabled!(Level::INFO) {
                    event!(
                        target: "septica_sim::decision",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        game = %room_id,
                        step = steps,
                        player = %player,
                        agent = %seat.agent_name,
                        phase = ?guard.phase(),
                        action = ?action,
                        elapsed_ms
                    );
                }
                (player, action)
            };

            let outcome = match action {
                Action::Play(card) => registry.play(&room_id, &player, card),
                Action::Pass => registry.pass(&room_id, &player),
            }?;
            if let PlayOutcome::TrickWon { winner, .. } = &outcome
                && let Some(seat) = seats.iter_mut().find(|seat| &seat.player == winner)
            {
                seat.tricks_won += 1;
            }

            let found = room.lock().cards_in_play();
            if found != expected_cards {
                return Err(RunnerError::Conservation {
                    game: room_id,
                    step: steps,
                    found,
                    expected: expected_cards,
                });
            }

            steps += 1;
            if steps > max_steps {
                return Err(RunnerError::game(format!(
                    "{room_id} still running after {steps} actions"
                )));
            }
        }

        let (result, board) = {
            let guard = room.lock();
            (guard.result().cloned(), guard.scores())
        };
        let result =
            result.ok_or_else(|| RunnerError::game(format!("{room_id} ended without a result")))?;

        let seating = seats
            .iter()
            .enumerate()
            .map(|(index, seat)| SeatSnapshot {
                seat: index,
                agent: seat.agent_name.clone(),
            })
            .collect();

        let mut seat_results = Vec::with_capacity(seats.len());
        for (index, seat) in seats.into_iter().enumerate() {
            let score = board
                .seats()
                .iter()
                .find(|score| score.player == seat.player)
                .ok_or_else(|| RunnerError::game(format!("{} missing from scores", seat.player)))?;
            let won = result.winner.includes(&seat.player);
            seat_results.push(SeatResult {
                agent_name: seat.agent_name,
                seat: index,
                player_id: seat.player.to_string(),
                points: score.points,
                tens: score.tens,
                aces: score.aces,
                tricks_won: seat.tricks_won,
                won,
                tied: won && result.winner.ids().len() > 1,
                metrics: seat.metrics.finalize(),
            });
            registry.leave(&room_id, &seat.player)?;
        }

        event!(
            target: "septica_sim::game",
            Level::DEBUG,
            game = %room_id,
            seed = game_seed,
            steps,
            points = result.points,
            rooms_left = registry.room_count(),
        );

        Ok(GameOutcome {
            game_index,
            game_seed,
            seating,
            seat_results,
        })
    }

    fn seat_states(&self, game_index: usize, game_seed: u64) -> Vec<SeatState> {
        let agents = &self.config.agents;
        (0..self.count.seats())
            .map(|seat| {
                let agent = &agents[(game_index + seat) % agents.len()];
                SeatState::new(seat, agent, game_seed)
            })
            .collect()
    }
}

fn game_id(game_index: usize) -> String {
    format!("G{game_index:05}")
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &SimConfig,
    outcome: &GameOutcome,
) -> Result<usize, RunnerError> {
    let game_id = game_id(outcome.game_index);

    let mut rows_written = 0usize;
    for seat in &outcome.seat_results {
        let row = GameLogRow {
            run_id: &config.run_id,
            game_id: &game_id,
            game_index: outcome.game_index,
            game_seed: outcome.game_seed,
            players: config.games.players,
            seat: seat.seat,
            player_id: &seat.player_id,
            agent: &seat.agent_name,
            seating: &outcome.seating,
            points: seat.points,
            tens: seat.tens,
            aces: seat.aces,
            tricks_won: seat.tricks_won,
            won: seat.won,
            tied: seat.tied,
            decisions: seat.metrics.decisions,
            speed_ms_turn: seat.metrics.avg_ms_per_decision,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

struct SeatState {
    player: PlayerId,
    agent_name: String,
    policy: Box<dyn Policy>,
    metrics: DecisionMetrics,
    tricks_won: usize,
}

impl SeatState {
    fn new(seat: usize, agent: &AgentConfig, game_seed: u64) -> Self {
        let seed = game_seed ^ agent.seed().unwrap_or(0) ^ seat as u64;
        Self {
            player: PlayerId::new(format!("seat{seat}_{}", agent.name)),
            agent_name: agent.name.clone(),
            policy: agent.kind.policy_kind().build(seed),
            metrics: DecisionMetrics::default(),
            tricks_won: 0,
        }
    }
}

pub struct GameOutcome {
    pub game_index: usize,
    pub game_seed: u64,
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: usize,
    pub agent: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: usize,
    pub player_id: String,
    pub points: u32,
    pub tens: usize,
    pub aces: usize,
    pub tricks_won: usize,
    pub won: bool,
    pub tied: bool,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: &'a str,
    game_index: usize,
    game_seed: u64,
    players: u8,
    seat: usize,
    player_id: &'a str,
    agent: &'a str,
    seating: &'a [SeatSnapshot],
    points: u32,
    tens: usize,
    aces: usize,
    tricks_won: usize,
    won: bool,
    tied: bool,
    decisions: u32,
    speed_ms_turn: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("room error: {0}")]
    Room(#[from] RoomError),
    #[error("summary error: {0}")]
    Summary(#[from] SummaryError),
    #[error("tables seat 2 to 4 players, not {requested}")]
    PlayerCount { requested: u8 },
    #[error("configuration defines no agents")]
    NoAgents,
    #[error("{game}: {found} cards accounted for after action {step}, expected {expected}")]
    Conservation {
        game: String,
        step: usize,
        found: usize,
        expected: usize,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
