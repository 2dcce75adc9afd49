//! Points for a single prediction once the game is final.
//!
//! An exact score is worth [`EXACT_SCORE_POINTS`] and overrides everything
//! else. Otherwise a prediction earns [`WINNER_POINTS`] for calling the right
//! outcome (a tie is an outcome) plus [`MARGIN_POINTS`] per side whose score
//! lands within [`MARGIN_TOLERANCE`] of the actual score, for at most
//! [`MAX_NON_EXACT_POINTS`].

use crate::Scoreline;
use std::cmp::Ordering;

pub const EXACT_SCORE_POINTS: u8 = 10;
pub const WINNER_POINTS: u8 = 3;
pub const MARGIN_POINTS: u8 = 1;
pub const MARGIN_TOLERANCE: u16 = 2;
pub const MAX_NON_EXACT_POINTS: u8 = WINNER_POINTS + 2 * MARGIN_POINTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Tie,
}

impl Outcome {
    pub fn of(score: Scoreline) -> Self {
        match score.home.cmp(&score.away) {
            Ordering::Greater => Outcome::HomeWin,
            Ordering::Less => Outcome::AwayWin,
            Ordering::Equal => Outcome::Tie,
        }
    }
}

/// Which parts of the rule a prediction satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub exact: bool,
    pub winner: bool,
    pub home_close: bool,
    pub away_close: bool,
}

impl ScoreBreakdown {
    pub fn evaluate(predicted: Scoreline, actual: Scoreline) -> Self {
        if predicted == actual {
            return Self {
                exact: true,
                winner: true,
                home_close: true,
                away_close: true,
            };
        }
        Self {
            exact: false,
            winner: predicted.outcome() == actual.outcome(),
            home_close: predicted.home.abs_diff(actual.home) <= MARGIN_TOLERANCE,
            away_close: predicted.away.abs_diff(actual.away) <= MARGIN_TOLERANCE,
        }
    }

    pub fn points(&self) -> u8 {
        if self.exact {
            return EXACT_SCORE_POINTS;
        }
        let mut points = 0;
        if self.winner {
            points += WINNER_POINTS;
        }
        if self.home_close {
            points += MARGIN_POINTS;
        }
        if self.away_close {
            points += MARGIN_POINTS;
        }
        points
    }

    /// Short label for a results table, e.g. "Winner + close home".
    pub fn label(&self) -> String {
        if self.exact {
            return "Exact score".to_string();
        }
        let mut parts = Vec::new();
        if self.winner {
            parts.push("Winner");
        }
        match (self.home_close, self.away_close) {
            (true, true) => parts.push("close score"),
            (true, false) => parts.push("close home"),
            (false, true) => parts.push("close away"),
            (false, false) => {}
        }
        if parts.is_empty() {
            return "No points".to_string();
        }
        let mut label = parts.join(" + ");
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        label
    }
}

pub fn score(predicted: Scoreline, actual: Scoreline) -> u8 {
    ScoreBreakdown::evaluate(predicted, actual).points()
}

/// Human-readable rule text shown above the past-predictions table.
pub fn rule_lines() -> [String; 5] {
    [
        format!("{EXACT_SCORE_POINTS} points: both the home and away scores exactly right."),
        format!("{WINNER_POINTS} points: the right winner (or a tie)."),
        format!("+{MARGIN_POINTS} point: home score within {MARGIN_TOLERANCE} of the actual score."),
        format!("+{MARGIN_POINTS} point: away score within {MARGIN_TOLERANCE} of the actual score."),
        format!(
            "Maximum {EXACT_SCORE_POINTS} per prediction; otherwise up to {MAX_NON_EXACT_POINTS}."
        ),
    ]
}
