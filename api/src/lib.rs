pub mod client;
pub mod pager;
pub mod scoring;
pub mod session;
pub mod store;
mod wire;

use crate::client::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use scoring::{Outcome, ScoreBreakdown};

// ---------------------------------------------------------------------------
// Domain types, independent of the backend wire format
// ---------------------------------------------------------------------------

/// The logged-in user. Persisted alongside the access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Result of a successful login: the bearer token plus the user it belongs to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// A final or predicted score, home side first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scoreline {
    pub home: u16,
    pub away: u16,
}

impl Scoreline {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::of(*self)
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub name: String, // "Lakers"
    pub city: String, // "Los Angeles"
    pub abbrev: String,
}

impl Team {
    pub fn full_name(&self) -> String {
        if self.city.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.city, self.name)
        }
    }
}

/// A scheduled game. `match_num` is strictly increasing over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixture {
    pub match_num: u32,
    pub home_team: String,
    pub away_team: String,
    pub start_time: Option<DateTime<Utc>>,
    pub game_date: String,
    pub game_time: String,
    pub final_score: Option<Scoreline>,
    pub completed: bool,
}

impl Fixture {
    /// Predictions may be created or changed only before tip-off of a game
    /// that has not completed. Without a known start time the backend decides.
    pub fn accepts_predictions(&self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.start_time.is_none_or(|start| now < start)
    }

    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// A user's forecast for one fixture within one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    pub id: Option<u64>,
    pub user_id: u64,
    pub group_id: u64,
    pub fixture_id: u32,
    pub predicted: Scoreline,
    pub actual: Option<Scoreline>,
    /// Authoritative points, assigned by the backend once the game is final.
    pub points_earned: Option<i32>,
    pub locked: bool,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Prediction {
    /// Points the scoring rule gives this prediction, once actual scores exist.
    pub fn projected_points(&self) -> Option<u8> {
        self.actual.map(|actual| scoring::score(self.predicted, actual))
    }

    pub fn breakdown(&self) -> Option<ScoreBreakdown> {
        self.actual
            .map(|actual| ScoreBreakdown::evaluate(self.predicted, actual))
    }

    pub fn matchup(&self) -> String {
        let home = self.home_team.as_deref().unwrap_or("-");
        let away = self.away_team.as_deref().unwrap_or("-");
        format!("{away} @ {home}")
    }
}

/// Body for creating or updating a prediction in a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionSubmission {
    pub group_id: u64,
    pub fixture_id: u32,
    pub predicted: Scoreline,
}

/// Whether a fanned-out submission creates a new prediction or replaces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update,
}

/// Optional filters for `GET /predictions/me`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionFilter {
    pub group_id: Option<u64>,
    pub min_match_num: Option<u32>,
    pub max_match_num: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub creator_id: u64,
    pub creator_username: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub member_count: u32,
    pub is_creator: bool,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMember {
    pub user_id: u64,
    pub username: String,
    pub joined_at: Option<DateTime<Utc>>,
    pub is_creator: bool,
    pub total_points: Option<i64>,
    pub total_predictions: Option<u32>,
    pub correct_predictions: Option<u32>,
}

pub const GROUP_CODE_LEN: usize = 6;
pub const GROUP_NAME_MIN: usize = 3;
pub const GROUP_NAME_MAX: usize = 100;

/// A join code: six uppercase ASCII letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupCode(String);

impl GroupCode {
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.chars().count() != GROUP_CODE_LEN {
            return Err(ApiError::Invalid(format!(
                "Group code must be {GROUP_CODE_LEN} characters"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ApiError::Invalid(
                "Group code may only contain letters and digits".into(),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim a proposed group name and check its length.
pub fn validate_group_name(raw: &str) -> ApiResult<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(GROUP_NAME_MIN..=GROUP_NAME_MAX).contains(&len) {
        return Err(ApiError::Invalid(format!(
            "Group name must be {GROUP_NAME_MIN}-{GROUP_NAME_MAX} characters"
        )));
    }
    Ok(name.to_owned())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardEntry {
    pub user_id: u64,
    pub username: String,
    pub total_points: i64,
    pub rank: Option<u32>,
    pub total_predictions: u32,
    pub scored_predictions: u32,
    pub exact_predictions: u32,
    pub avg_points: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    /// Backend rank when present, otherwise the 1-based list position.
    pub fn display_rank(&self, index: usize) -> u32 {
        self.rank.unwrap_or(index as u32 + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_predictions: u32,
    pub correct_predictions: u32,
    pub exact_score_predictions: u32,
}
