use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, SimConfig};
use crate::runner::{DecisionSummary, GameOutcome};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("agent '{0}' played a game but is missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Folds finished games into per-agent totals.
pub struct SummaryCollector {
    run_id: String,
    players: u8,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    games: usize,
}

impl SummaryCollector {
    pub fn new(config: &SimConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(agent.name.clone(), AgentAccumulator::new(agent));
            order.push(agent.name.clone());
        }

        Self {
            run_id: config.run_id.clone(),
            players: config.games.players,
            agents,
            agent_order: order,
            games: 0,
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), SummaryError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| SummaryError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record(
                f64::from(seat.points),
                seat.won && !seat.tied,
                seat.tied,
                seat.tricks_won,
                &seat.metrics,
            );
        }
        self.games += 1;
        Ok(())
    }

    pub fn finalize(mut self) -> RunReport {
        let agents = self
            .agent_order
            .iter()
            .filter_map(|name| self.agents.remove(name))
            .map(AgentAccumulator::into_report)
            .collect();

        RunReport {
            run_id: self.run_id,
            players: self.players,
            games: self.games,
            agents,
        }
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    points: Vec<f64>,
    wins: usize,
    ties: usize,
    tricks: usize,
    decisions: u64,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(config: &AgentConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind: config.kind,
            points: Vec::new(),
            wins: 0,
            ties: 0,
            tricks: 0,
            decisions: 0,
            total_ms: 0.0,
        }
    }

    fn record(
        &mut self,
        points: f64,
        won: bool,
        tied: bool,
        tricks: usize,
        metrics: &DecisionSummary,
    ) {
        self.points.push(points);
        if won {
            self.wins += 1;
        }
        if tied {
            self.ties += 1;
        }
        self.tricks += tricks;
        self.decisions += u64::from(metrics.decisions);
        self.total_ms += metrics.total_ms;
    }

    fn into_report(self) -> AgentReport {
        let seats = self.points.len();
        let avg_points = if seats == 0 {
            0.0
        } else {
            self.points.iter().sum::<f64>() / seats as f64
        };
        let average_ms_per_decision = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };

        AgentReport {
            name: self.name,
            kind: self.kind,
            seats,
            avg_points,
            ci95: confidence_interval(&self.points),
            wins: self.wins,
            ties: self.ties,
            tricks: self.tricks,
            average_ms_per_decision,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub players: u8,
    pub games: usize,
    pub agents: Vec<AgentReport>,
}

impl RunReport {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        let mut rows = String::new();
        rows.push_str("# Simulation Summary\n\n");
        rows.push_str(&format!(
            "Run `{}`: {} games at {} players\n\n",
            self.run_id, self.games, self.players
        ));
        rows.push_str(
            "| Agent | Kind | Seats | Avg points | 95% CI | Win % | Tie % | Tricks | Avg ms/decision |\n",
        );
        rows.push_str(
            "|-------|------|-------|------------|--------|-------|-------|--------|-----------------|\n",
        );

        for agent in &self.agents {
            let (win_rate, tie_rate) = if agent.seats == 0 {
                (0.0, 0.0)
            } else {
                (
                    agent.wins as f64 / agent.seats as f64,
                    agent.ties as f64 / agent.seats as f64,
                )
            };

            rows.push_str(&format!(
                "| {name} | {kind:?} | {seats} | {avg:.3} | [{ci_low:.3}, {ci_high:.3}] | {win:.1}% | {tie:.1}% | {tricks} | {latency:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                seats = agent.seats,
                avg = agent.avg_points,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                win = win_rate * 100.0,
                tie = tie_rate * 100.0,
                tricks = agent.tricks,
                latency = agent.average_ms_per_decision,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|source| SummaryError::Io {
            context: "writing summary markdown",
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    /// Seats occupied across the run; an agent may sit more than once per game.
    pub seats: usize,
    pub avg_points: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub ties: usize,
    pub tricks: usize,
    pub average_ms_per_decision: f64,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
