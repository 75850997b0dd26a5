//! Output formatting utilities for CLI.

// Averages over game counts are display-only
#![allow(clippy::cast_precision_loss)]

use deathgame::game::{LeagueId, World};
use deathgame::sim::{Outcome, SimResult};
use serde::Serialize;
use std::fmt::Write;

/// Board character for a league: `A`, `B`, ... then `#` past `Z`.
pub(super) fn league_marker(id: LeagueId) -> char {
    u8::try_from(id)
        .ok()
        .filter(|&i| i < 26)
        .map_or('#', |i| char::from(b'A' + i))
}

/// Render the board as one line of markers per row, `.` for empty cells.
pub(super) fn render_board(world: &World) -> String {
    let board = world.board();
    let mut output = String::with_capacity(board.area() + usize::from(board.height()));
    for (coord, occupant) in board.iter() {
        let ch = occupant
            .and_then(|id| world.unit(id))
            .map_or('.', |unit| league_marker(unit.league));
        output.push(ch);
        if coord.x + 1 == board.width() {
            output.push('\n');
        }
    }
    output
}

/// Format a finished run as human-readable text.
pub(super) fn format_text(result: &SimResult, world: &World) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result ({})", result.outcome);
    match &result.winner {
        Some(name) => {
            let _ = writeln!(output, "  Winner: {name}");
        }
        None => output.push_str("  Winner: none\n"),
    }
    let _ = writeln!(output, "  Moves: {}\n", result.moves);

    for league in &result.status.leagues {
        let _ = write!(
            output,
            "  [{}] {}: {} units, biomass {}",
            league_marker(league.id),
            league.name,
            league.population,
            league.biomass
        );
        if let Some(order) = result.retired.iter().position(|n| *n == league.name) {
            let _ = write!(output, " [retired #{}]", order + 1);
        }
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&render_board(world));
    output
}

/// Aggregated results over many games of one configuration.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Games with a single surviving league, per league.
    pub(super) wins: Vec<u64>,
    /// Games the league ended with living units, per league.
    pub(super) survivals: Vec<u64>,
    /// Games in which every league died out.
    pub(super) extinctions: u64,
    /// Games stopped by the move ceiling.
    pub(super) move_limits: u64,
    /// Games that failed to set up.
    pub(super) failures: u64,
    /// Final population sum per league.
    population_sums: Vec<u64>,
    /// Final population sum of squares per league.
    population_sq_sums: Vec<f64>,
    /// Total moves across all games.
    total_moves: u64,
}

impl TournamentStats {
    /// Create empty stats for `leagues` leagues.
    pub(super) fn new(leagues: usize) -> Self {
        Self {
            wins: vec![0; leagues],
            survivals: vec![0; leagues],
            population_sums: vec![0; leagues],
            population_sq_sums: vec![0.0; leagues],
            ..Self::default()
        }
    }

    /// Add one finished game. League ids index the per-league tables.
    pub(super) fn add_result(&mut self, result: &SimResult) {
        self.games_played += 1;
        self.total_moves += result.moves;

        match result.outcome {
            Outcome::Extinction => self.extinctions += 1,
            Outcome::MoveLimit => self.move_limits += 1,
            Outcome::LastLeague | Outcome::Interrupted => {}
        }

        for league in &result.status.leagues {
            let i = usize::from(league.id);
            if i >= self.wins.len() {
                continue;
            }
            if result.winner.as_deref() == Some(league.name.as_str()) {
                self.wins[i] += 1;
            }
            if league.population > 0 {
                self.survivals[i] += 1;
            }
            let population = league.population as u64;
            self.population_sums[i] += population;
            self.population_sq_sums[i] += (population as f64) * (population as f64);
        }
    }

    /// Count a game that could not be built.
    pub(super) fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge stats gathered on another thread.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.extinctions += other.extinctions;
        self.move_limits += other.move_limits;
        self.failures += other.failures;
        self.total_moves += other.total_moves;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.survivals.iter_mut().zip(&other.survivals) {
            *a += b;
        }
        for (a, b) in self.population_sums.iter_mut().zip(&other.population_sums) {
            *a += b;
        }
        for (a, b) in self
            .population_sq_sums
            .iter_mut()
            .zip(&other.population_sq_sums)
        {
            *a += b;
        }
    }

    fn rate(&self, count: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        count as f64 / self.games_played as f64
    }

    /// Win rate for a league (0.0-1.0).
    pub(super) fn win_rate(&self, league: usize) -> f64 {
        self.rate(self.wins.get(league).copied().unwrap_or(0))
    }

    /// Survival rate for a league (0.0-1.0).
    pub(super) fn survival_rate(&self, league: usize) -> f64 {
        self.rate(self.survivals.get(league).copied().unwrap_or(0))
    }

    /// Average final population for a league.
    pub(super) fn avg_population(&self, league: usize) -> f64 {
        self.rate(self.population_sums.get(league).copied().unwrap_or(0))
    }

    /// Final population standard deviation for a league.
    pub(super) fn population_std_dev(&self, league: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_population(league);
        let sq_sum = self.population_sq_sums.get(league).copied().unwrap_or(0.0);
        let variance = (sq_sum / n) - (mean * mean);
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }

    /// Average game length in moves.
    pub(super) fn avg_moves(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_moves as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Per-league statistics.
    leagues: Vec<JsonTournamentLeague>,
    /// Games in which every league died out.
    extinctions: u64,
    /// Games stopped by the move ceiling.
    move_limits: u64,
    /// Games that failed to set up.
    failures: u64,
    /// Average game length in moves.
    avg_moves: f64,
}

/// JSON-serializable per-league tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentLeague {
    /// League name.
    league: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Survival rate (0.0-1.0).
    survival_rate: f64,
    /// Average final population.
    avg_population: f64,
    /// Final population standard deviation.
    population_std_dev: f64,
}

impl JsonTournamentResult {
    /// Create from stats and league names.
    pub(super) fn from_stats(stats: &TournamentStats, names: &[String]) -> Self {
        let leagues = names
            .iter()
            .enumerate()
            .map(|(i, name)| JsonTournamentLeague {
                league: name.clone(),
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                survival_rate: stats.survival_rate(i),
                avg_population: stats.avg_population(i),
                population_std_dev: stats.population_std_dev(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            leagues,
            extinctions: stats.extinctions,
            move_limits: stats.move_limits,
            failures: stats.failures,
            avg_moves: stats.avg_moves(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats, names: &[String]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} games)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, name) in names.iter().enumerate() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let _ = writeln!(
            output,
            "  {name}: {:.1}% ({wins} wins), survived {:.1}%",
            stats.win_rate(i) * 100.0,
            stats.survival_rate(i) * 100.0
        );
    }
    let _ = writeln!(
        output,
        "  Extinctions: {} ({:.1}%)",
        stats.extinctions,
        stats.rate(stats.extinctions) * 100.0
    );
    let _ = writeln!(
        output,
        "  Move limit: {} ({:.1}%)\n",
        stats.move_limits,
        stats.rate(stats.move_limits) * 100.0
    );

    output.push_str("Final Population:\n");
    for (i, name) in names.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {name}: {:.1} (+/- {:.1})",
            stats.avg_population(i),
            stats.population_std_dev(i)
        );
    }

    let _ = writeln!(output, "\nAverage Game Length: {:.0} moves", stats.avg_moves());
    if stats.failures > 0 {
        let _ = writeln!(output, "Failed setups: {}", stats.failures);
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats, names: &[String]) -> String {
    let mut output = String::new();

    output.push_str("league,wins,win_rate,survival_rate,avg_population,population_std_dev\n");

    for (i, name) in names.iter().enumerate() {
        let _ = writeln!(
            output,
            "{},{},{:.4},{:.4},{:.2},{:.2}",
            name,
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.survival_rate(i),
            stats.avg_population(i),
            stats.population_std_dev(i)
        );
    }

    output
}
