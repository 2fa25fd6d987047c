//! Batch simulation - many independent duels and their aggregate statistics

use duel_core::{ConfigError, Duel, DuelError, DuelOutcome, DuelReport, RngDice, SideId};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Duel(#[from] DuelError),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Aggregate results of a batch of duels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub runs: u64,
    pub side_a_wins: u64,
    pub side_b_wins: u64,
    pub draws: u64,
    pub total_rounds: u64,
    /// Injuries suffered by Side A and Side B across every run
    pub total_injuries: [u64; 2],
}

impl BatchSummary {
    pub fn record(&mut self, report: &DuelReport) {
        self.runs += 1;
        match report.outcome {
            DuelOutcome::SideAWins => self.side_a_wins += 1,
            DuelOutcome::SideBWins => self.side_b_wins += 1,
            DuelOutcome::Draw => self.draws += 1,
        }
        self.total_rounds += u64::from(report.rounds);
        self.total_injuries[0] += u64::from(report.injuries_for(SideId::A));
        self.total_injuries[1] += u64::from(report.injuries_for(SideId::B));
    }

    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a DuelReport>) -> Self {
        let mut summary = BatchSummary::default();
        for report in reports {
            summary.record(report);
        }
        summary
    }

    /// Share of runs with this outcome, as a percentage
    pub fn rate(&self, outcome: DuelOutcome) -> f64 {
        let count = match outcome {
            DuelOutcome::SideAWins => self.side_a_wins,
            DuelOutcome::SideBWins => self.side_b_wins,
            DuelOutcome::Draw => self.draws,
        };
        self.percent(count)
    }

    pub fn avg_rounds(&self) -> f64 {
        self.average(self.total_rounds)
    }

    pub fn avg_injuries(&self, side: SideId) -> f64 {
        match side {
            SideId::A => self.average(self.total_injuries[0]),
            SideId::B => self.average(self.total_injuries[1]),
        }
    }

    fn percent(&self, count: u64) -> f64 {
        self.average(count) * 100.0
    }

    fn average(&self, total: u64) -> f64 {
        if self.runs > 0 {
            total as f64 / self.runs as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Runs:          {}", self.runs)?;
        writeln!(
            f,
            "Side A wins:   {} ({:.1}%)",
            self.side_a_wins,
            self.rate(DuelOutcome::SideAWins)
        )?;
        writeln!(
            f,
            "Side B wins:   {} ({:.1}%)",
            self.side_b_wins,
            self.rate(DuelOutcome::SideBWins)
        )?;
        writeln!(f, "Draws:         {} ({:.1}%)", self.draws, self.rate(DuelOutcome::Draw))?;
        writeln!(f, "Avg rounds:    {:.2}", self.avg_rounds())?;
        write!(
            f,
            "Avg injuries:  A {:.2}, B {:.2}",
            self.avg_injuries(SideId::A),
            self.avg_injuries(SideId::B)
        )
    }
}

/// Run `runs` copies of a prepared duel in parallel
///
/// Run `i` gets its own dice seeded with `seed + i`, so a batch is
/// reproducible regardless of how rayon schedules the work.
pub fn run_batch(template: &Duel, runs: u64, seed: u64) -> BatchSummary {
    let reports: Vec<DuelReport> = (0..runs)
        .into_par_iter()
        .map(|i| {
            let mut dice = RngDice::seeded(seed.wrapping_add(i));
            template.clone().run(&mut dice)
        })
        .collect();
    BatchSummary::from_reports(&reports)
}
