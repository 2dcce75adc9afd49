/// Wire types for the league backend (FastAPI, JSON bodies).
/// Field names follow the backend; mapping to domain types lives in client.rs.
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Default, Debug, Clone)]
pub struct WireUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: WireUser,
}

fn default_token_type() -> String {
    "bearer".into()
}

#[derive(Deserialize, Default, Debug)]
pub struct TokenValidationResponse {
    pub valid: bool,
}

/// Error body. `detail` is a string for handled errors and a list of
/// `{loc, msg, type}` objects for request validation failures.
#[derive(Deserialize, Default, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireTeam {
    pub team_id: u32,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub abbreviation: String,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireGroup {
    pub group_id: u64,
    pub group_name: String,
    #[serde(default)]
    pub group_code: String,
    #[serde(default)]
    pub creator_id: u64,
    pub creator_username: Option<String>,
    pub creation_date: Option<String>,
    pub member_count: Option<u32>,
    pub is_creator: Option<bool>,
    pub joined_date: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct GroupCreate<'a> {
    pub group_name: &'a str,
}

#[derive(Serialize, Debug)]
pub struct GroupJoin<'a> {
    pub group_code: &'a str,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireGroupMember {
    pub user_id: u64,
    pub username: String,
    pub joined_date: Option<String>,
    #[serde(default)]
    pub is_creator: bool,
    pub total_points: Option<i64>,
    pub total_predictions: Option<u32>,
    pub correct_predictions: Option<u32>,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireFixture {
    pub match_num: u32,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    #[serde(default)]
    pub completed: bool,
    pub start_time: Option<String>,
    #[serde(default)]
    pub game_date: String,
    #[serde(default)]
    pub game_time: String,
}

/// `/fixtures/lastupdatedfixture` has been seen both as a bare number and as
/// a fixture-shaped object.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum LastCompletedResponse {
    Number(u32),
    Fixture { match_num: u32 },
    Empty(()),
}

#[derive(Deserialize, Default, Debug)]
pub struct WirePrediction {
    #[serde(alias = "pid")]
    pub prediction_id: Option<u64>,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub group_id: u64,
    pub fixture_id: u32,
    pub pred_home_score: u16,
    pub pred_away_score: u16,
    pub points_earned: Option<i32>,
    #[serde(default)]
    pub locked: bool,
    pub actual_home_score: Option<u16>,
    pub actual_away_score: Option<u16>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub start_time: Option<String>,
    #[serde(alias = "prediction_time")]
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct PredictionBody {
    pub group_id: u64,
    pub fixture_id: u32,
    pub pred_home_score: u16,
    pub pred_away_score: u16,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireLeaderboardEntry {
    pub user_id: u64,
    pub username: String,
    #[serde(default)]
    pub total_points: i64,
    pub rank_position: Option<u32>,
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_predictions: u32,
    #[serde(default)]
    pub scored_predictions: u32,
    #[serde(default)]
    pub exact_predictions: u32,
    pub avg_points_per_prediction: Option<f64>,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireProfile {
    pub username: String,
    pub bio: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BioUpdate<'a> {
    pub bio: &'a str,
}

#[derive(Deserialize, Default, Debug)]
pub struct WireStats {
    #[serde(default)]
    pub total_predictions: u32,
    #[serde(default)]
    pub correct_predictions: u32,
    #[serde(default)]
    pub exact_score_predictions: u32,
}
