use crate::pager::{self, PastPredictionsPage};
use crate::session::SessionEvent;
use crate::store::CredentialStore;
use crate::wire::{
    AuthResponse, BioUpdate, ErrorBody, GroupCreate, GroupJoin, LastCompletedResponse,
    PredictionBody, TokenValidationResponse, WireFixture, WireGroup, WireGroupMember,
    WireLeaderboardEntry, WirePrediction, WireProfile, WireStats, WireTeam, WireUser,
};
use crate::{
    AuthSession, Credentials, Fixture, Group, GroupCode, GroupMember, LeaderboardEntry,
    Prediction, PredictionFilter, PredictionSubmission, Registration, Scoreline, SubmitMode,
    Team, User, UserProfile, UserStats, validate_group_name,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::try_join_all;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// League backend client. Attaches the stored bearer token to every request
/// and turns any 401 into a [`SessionEvent::Expired`].
#[derive(Debug, Clone)]
pub struct HoopsApi {
    client: Client,
    base_url: String,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
    expiry: Option<mpsc::Sender<SessionEvent>>,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api {
        status: StatusCode,
        detail: Option<String>,
        url: String,
    },
    Unauthorized {
        detail: Option<String>,
        url: String,
    },
    Parsing(reqwest::Error, String),
    Storage(String),
    /// Rejected on the client before any request was made.
    Invalid(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { status, detail, url } => match detail {
                Some(detail) => write!(f, "API error {status} for {url}: {detail}"),
                None => write!(f, "API error {status} for {url}"),
            },
            ApiError::Unauthorized { url, .. } => write!(f, "Unauthorized: {url}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Storage(msg) => write!(f, "Storage error: {msg}"),
            ApiError::Invalid(msg) => write!(f, "{msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Parsing(e, _) => Some(e),
            _ => None,
        }
    }
}

impl ApiError {
    /// The backend's (or validator's) own message, if there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Api { detail, .. } | ApiError::Unauthorized { detail, .. } => {
                detail.as_deref()
            }
            ApiError::Invalid(msg) => Some(msg),
            _ => None,
        }
    }

    /// Text for an inline error: the detail verbatim, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl HoopsApi {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("hoopstui/0.1 (terminal prediction league)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(10),
            store,
            expiry: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Subscribe the application to session expiry.
    pub fn with_expiry_notifier(mut self, expiry: mpsc::Sender<SessionEvent>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Log in and persist the returned token and user record.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthSession> {
        debug!("logging in as {}", credentials.username);
        let raw: AuthResponse = self.post("/auth/login", credentials).await?;
        let session = AuthSession {
            access_token: raw.access_token,
            token_type: raw.token_type,
            user: map_user(raw.user),
        };
        self.store.save(&session.access_token, &session.user)?;
        Ok(session)
    }

    /// Register, then log straight in with the same credentials.
    pub async fn register(&self, registration: &Registration) -> ApiResult<AuthSession> {
        debug!("registering {}", registration.username);
        let url = self.url("/auth/register");
        let request = self.request(Method::POST, &url).json(registration);
        self.execute(request, &url).await?;
        self.login(&registration.credentials()).await
    }

    /// Ask the backend whether the stored token is still good. No stored token
    /// and a 401 both answer `false`; transport failures are errors.
    pub async fn verify_token(&self) -> ApiResult<bool> {
        if self.store.token().is_none() {
            return Ok(false);
        }
        match self.get::<TokenValidationResponse>("/auth/verify-token").await {
            Ok(raw) => Ok(raw.valid),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        let raw: WireUser = self.get("/users/me").await?;
        Ok(map_user(raw))
    }

    // -----------------------------------------------------------------------
    // Profile
    // -----------------------------------------------------------------------

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let raw: WireProfile = self.get("/user/me/profile").await?;
        Ok(UserProfile {
            username: raw.username,
            bio: raw.bio.filter(|b| !b.is_empty()),
        })
    }

    pub async fn stats(&self) -> ApiResult<UserStats> {
        let raw: WireStats = self.get("/user/me/stats").await?;
        Ok(UserStats {
            total_predictions: raw.total_predictions,
            correct_predictions: raw.correct_predictions,
            exact_score_predictions: raw.exact_score_predictions,
        })
    }

    pub async fn update_bio(&self, bio: &str) -> ApiResult<()> {
        let url = self.url("/user/me/profile");
        let request = self.request(Method::PUT, &url).json(&BioUpdate { bio });
        self.execute(request, &url).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub async fn create_group(&self, name: &str) -> ApiResult<Group> {
        let name = validate_group_name(name)?;
        let raw: WireGroup = self
            .post("/groups", &GroupCreate { group_name: &name })
            .await?;
        Ok(map_group(raw))
    }

    pub async fn join_group(&self, code: &GroupCode) -> ApiResult<Group> {
        let raw: WireGroup = self
            .post("/groups/join", &GroupJoin { group_code: code.as_str() })
            .await?;
        Ok(map_group(raw))
    }

    pub async fn my_groups(&self) -> ApiResult<Vec<Group>> {
        let raw: Vec<WireGroup> = self.get("/groups/me").await?;
        Ok(raw.into_iter().map(map_group).collect())
    }

    pub async fn group_details(&self, group_id: u64) -> ApiResult<Group> {
        let raw: WireGroup = self.get(&format!("/groups/{group_id}")).await?;
        Ok(map_group(raw))
    }

    pub async fn group_by_code(&self, code: &GroupCode) -> ApiResult<Group> {
        let raw: WireGroup = self.get(&format!("/groups/code/{code}")).await?;
        Ok(map_group(raw))
    }

    pub async fn group_members(&self, group_id: u64) -> ApiResult<Vec<GroupMember>> {
        let raw: Vec<WireGroupMember> = self.get(&format!("/groups/{group_id}/members")).await?;
        Ok(raw.into_iter().map(map_member).collect())
    }

    pub async fn leave_group(&self, group_id: u64) -> ApiResult<()> {
        self.delete(&format!("/groups/{group_id}/leave")).await
    }

    pub async fn delete_group(&self, group_id: u64) -> ApiResult<()> {
        self.delete(&format!("/groups/{group_id}")).await
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    pub async fn upcoming_fixtures(&self) -> ApiResult<Vec<Fixture>> {
        let raw: Vec<WireFixture> = self.get("/fixtures/upcoming").await?;
        Ok(raw.into_iter().map(map_fixture).collect())
    }

    pub async fn next_fixtures(&self) -> ApiResult<Vec<Fixture>> {
        let raw: Vec<WireFixture> = self.get("/fixtures/next").await?;
        Ok(raw.into_iter().map(map_fixture).collect())
    }

    pub async fn fixture(&self, match_num: u32) -> ApiResult<Fixture> {
        let raw: WireFixture = self.get(&format!("/fixtures/{match_num}")).await?;
        Ok(map_fixture(raw))
    }

    /// Match number of the most recently completed fixture; `None` before
    /// the first game of the season is final.
    pub async fn last_completed_match_num(&self) -> ApiResult<Option<u32>> {
        let raw: LastCompletedResponse = self.get("/fixtures/lastupdatedfixture").await?;
        Ok(match raw {
            LastCompletedResponse::Number(n) | LastCompletedResponse::Fixture { match_num: n } => {
                Some(n).filter(|n| *n > 0)
            }
            LastCompletedResponse::Empty(_) => None,
        })
    }

    pub async fn all_teams(&self) -> ApiResult<Vec<Team>> {
        let raw: Vec<WireTeam> = self.get("/fixtures/allteams").await?;
        Ok(raw
            .into_iter()
            .map(|t| Team {
                id: t.team_id,
                name: t.team_name,
                city: t.city,
                abbrev: t.abbreviation,
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Predictions
    // -----------------------------------------------------------------------

    pub async fn create_prediction(&self, submission: &PredictionSubmission) -> ApiResult<Prediction> {
        let raw: WirePrediction = self
            .post("/predictions", &prediction_body(submission))
            .await?;
        Ok(map_prediction(raw))
    }

    pub async fn update_prediction(&self, submission: &PredictionSubmission) -> ApiResult<Prediction> {
        let raw: WirePrediction = self
            .put("/predictions", &prediction_body(submission))
            .await?;
        Ok(map_prediction(raw))
    }

    pub async fn my_predictions(&self, filter: &PredictionFilter) -> ApiResult<Vec<Prediction>> {
        let path = format!("/predictions/me{}", predictions_query(filter));
        let raw: Vec<WirePrediction> = self.get(&path).await?;
        Ok(raw.into_iter().map(map_prediction).collect())
    }

    pub async fn predictions_for_fixture(&self, fixture_id: u32) -> ApiResult<Vec<Prediction>> {
        let raw: Vec<WirePrediction> = self
            .get(&format!("/predictions/fixture/{fixture_id}"))
            .await?;
        Ok(raw.into_iter().map(map_prediction).collect())
    }

    /// Apply one scoreline to several groups at once. Requests run
    /// concurrently; the first failure is returned and predictions already
    /// accepted by the backend stay in place.
    pub async fn submit_across_groups(
        &self,
        fixture: &Fixture,
        predicted: Scoreline,
        targets: &[(u64, SubmitMode)],
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<Prediction>> {
        if !fixture.accepts_predictions(now) {
            return Err(ApiError::Invalid(format!(
                "Predictions are closed for {}",
                fixture.matchup()
            )));
        }
        if targets.is_empty() {
            return Err(ApiError::Invalid(
                "Join a group before making predictions".into(),
            ));
        }
        debug!(
            "submitting {predicted} for match {} to {} group(s)",
            fixture.match_num,
            targets.len()
        );
        let requests = targets.iter().map(|&(group_id, mode)| {
            let submission = PredictionSubmission {
                group_id,
                fixture_id: fixture.match_num,
                predicted,
            };
            async move {
                match mode {
                    SubmitMode::Create => self.create_prediction(&submission).await,
                    SubmitMode::Update => self.update_prediction(&submission).await,
                }
            }
        });
        try_join_all(requests).await
    }

    /// One page of past predictions, newest match numbers first.
    pub async fn past_predictions(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<PastPredictionsPage> {
        let Some(last) = self.last_completed_match_num().await? else {
            return Ok(PastPredictionsPage::end_of_data(page_number));
        };
        let Some(window) = pager::page(last, page_number, page_size) else {
            return Ok(PastPredictionsPage::end_of_data(page_number));
        };
        let filter = PredictionFilter {
            group_id: None,
            min_match_num: Some(window.min),
            max_match_num: Some(window.max),
        };
        let predictions = self.my_predictions(&filter).await?;
        Ok(PastPredictionsPage::from_window(
            page_number,
            page_size,
            window,
            predictions,
        ))
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    pub async fn leaderboard(&self, group_id: u64) -> ApiResult<Vec<LeaderboardEntry>> {
        let raw: Vec<WireLeaderboardEntry> = self.get(&format!("/leaderboard/{group_id}")).await?;
        Ok(raw.into_iter().map(map_leaderboard_entry).collect())
    }

    pub async fn my_rank(&self, group_id: u64) -> ApiResult<LeaderboardEntry> {
        let raw: WireLeaderboardEntry = self.get(&format!("/leaderboard/{group_id}/me")).await?;
        Ok(map_leaderboard_entry(raw))
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url).timeout(self.timeout);
        match self.store.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, request: RequestBuilder, url: &str) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .and_then(detail_message);

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session(url);
            return Err(ApiError::Unauthorized {
                detail,
                url: url.to_owned(),
            });
        }
        Err(ApiError::Api {
            status,
            detail,
            url: url.to_owned(),
        })
    }

    fn expire_session(&self, url: &str) {
        warn!("401 from {url}, clearing stored credentials");
        if let Err(e) = self.store.clear() {
            warn!("failed to clear stored credentials: {e}");
        }
        if let Some(expiry) = &self.expiry
            && expiry.try_send(SessionEvent::Expired).is_err()
        {
            debug!("session expiry already pending or nobody listening");
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> ApiResult<T> {
        self.execute(request, url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        self.send(self.request(Method::GET, &url), &url).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path);
        self.send(self.request(Method::POST, &url).json(body), &url)
            .await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path);
        self.send(self.request(Method::PUT, &url).json(body), &url)
            .await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path);
        self.execute(self.request(Method::DELETE, &url), &url).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mapping: backend wire types → clean domain types
// ---------------------------------------------------------------------------

/// FastAPI sends `detail` as a string, or as a list of validation errors
/// each carrying a `msg`.
fn detail_message(detail: serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(s) => Some(s).filter(|s| !s.trim().is_empty()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_owned)
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

fn predictions_query(filter: &PredictionFilter) -> String {
    let mut params = Vec::new();
    if let Some(group_id) = filter.group_id {
        params.push(format!("group_id={group_id}"));
    }
    if let Some(min) = filter.min_match_num {
        params.push(format!("min_match_num={min}"));
    }
    if let Some(max) = filter.max_match_num {
        params.push(format!("max_match_num={max}"));
    }
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

fn prediction_body(submission: &PredictionSubmission) -> PredictionBody {
    PredictionBody {
        group_id: submission.group_id,
        fixture_id: submission.fixture_id,
        pred_home_score: submission.predicted.home,
        pred_away_score: submission.predicted.away,
    }
}

/// Accepts RFC 3339 and the naive ISO timestamps the backend emits for
/// columns without a zone, which are UTC.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn scoreline(home: Option<u16>, away: Option<u16>) -> Option<Scoreline> {
    home.zip(away).map(|(home, away)| Scoreline { home, away })
}

fn map_user(u: WireUser) -> User {
    User {
        id: u.id,
        username: u.username,
        email: u.email,
        created_at: parse_timestamp(u.created_at.as_deref()),
        is_active: u.is_active,
    }
}

fn map_group(g: WireGroup) -> Group {
    Group {
        id: g.group_id,
        name: g.group_name,
        code: g.group_code,
        creator_id: g.creator_id,
        creator_username: g.creator_username,
        created_at: parse_timestamp(g.creation_date.as_deref()),
        member_count: g.member_count.unwrap_or_default(),
        is_creator: g.is_creator.unwrap_or(false),
        joined_at: parse_timestamp(g.joined_date.as_deref()),
    }
}

fn map_member(m: WireGroupMember) -> GroupMember {
    GroupMember {
        user_id: m.user_id,
        username: m.username,
        joined_at: parse_timestamp(m.joined_date.as_deref()),
        is_creator: m.is_creator,
        total_points: m.total_points,
        total_predictions: m.total_predictions,
        correct_predictions: m.correct_predictions,
    }
}

fn map_fixture(f: WireFixture) -> Fixture {
    let final_score = if f.completed {
        scoreline(f.home_score, f.away_score)
    } else {
        None
    };
    Fixture {
        match_num: f.match_num,
        start_time: parse_timestamp(f.start_time.as_deref()),
        home_team: f.home_team,
        away_team: f.away_team,
        game_date: f.game_date,
        game_time: f.game_time,
        final_score,
        completed: f.completed,
    }
}

fn map_prediction(p: WirePrediction) -> Prediction {
    Prediction {
        id: p.prediction_id,
        user_id: p.user_id,
        group_id: p.group_id,
        fixture_id: p.fixture_id,
        predicted: Scoreline {
            home: p.pred_home_score,
            away: p.pred_away_score,
        },
        actual: scoreline(p.actual_home_score, p.actual_away_score),
        points_earned: p.points_earned,
        locked: p.locked,
        home_team: p.home_team,
        away_team: p.away_team,
        start_time: parse_timestamp(p.start_time.as_deref()),
        submitted_at: parse_timestamp(p.updated_at.as_deref().or(p.created_at.as_deref())),
    }
}

fn map_leaderboard_entry(e: WireLeaderboardEntry) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id: e.user_id,
        username: e.username,
        total_points: e.total_points,
        rank: e.rank_position,
        total_predictions: e.total_predictions,
        scored_predictions: e.scored_predictions,
        exact_predictions: e.exact_predictions,
        avg_points: e.avg_points_per_prediction,
        last_updated: parse_timestamp(e.last_updated.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;

    fn kobe() -> User {
        User {
            id: 8,
            username: "kobe".into(),
            email: "kobe@example.com".into(),
            created_at: None,
            is_active: true,
        }
    }

    fn logged_in_store() -> Arc<dyn CredentialStore> {
        let store = Arc::new(MemoryStore::new());
        store.save("tok-8", &kobe()).unwrap();
        store
    }

    fn open_fixture(match_num: u32) -> Fixture {
        Fixture {
            match_num,
            home_team: "Warriors".into(),
            away_team: "Lakers".into(),
            start_time: Some(Utc.with_ymd_and_hms(2030, 1, 1, 3, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    const PREDICTION_JSON: &str = r#"{
        "prediction_id": 41, "user_id": 8, "group_id": 3, "fixture_id": 120,
        "pred_home_score": 110, "pred_away_score": 108, "points_earned": null
    }"#;

    #[test]
    fn detail_message_handles_string_and_validation_list() {
        assert_eq!(
            detail_message(json!("Group not found")).as_deref(),
            Some("Group not found")
        );
        assert_eq!(
            detail_message(json!([
                {"loc": ["body", "group_name"], "msg": "too short"},
                {"loc": ["body", "x"], "msg": "field required"}
            ]))
            .as_deref(),
            Some("too short; field required")
        );
        assert_eq!(detail_message(json!("")), None);
        assert_eq!(detail_message(json!(42)), None);
    }

    #[test]
    fn predictions_query_only_includes_set_filters() {
        assert_eq!(predictions_query(&PredictionFilter::default()), "");
        let filter = PredictionFilter {
            group_id: Some(3),
            min_match_num: Some(51),
            max_match_num: Some(100),
        };
        assert_eq!(
            predictions_query(&filter),
            "?group_id=3&min_match_num=51&max_match_num=100"
        );
    }

    #[test]
    fn timestamps_accept_naive_and_zoned_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 21, 23, 30, 0).unwrap();
        assert_eq!(parse_timestamp(Some("2025-10-21T23:30:00Z")), Some(expected));
        assert_eq!(parse_timestamp(Some("2025-10-21T19:30:00-04:00")), Some(expected));
        assert_eq!(parse_timestamp(Some("2025-10-21T23:30:00")), Some(expected));
        assert_eq!(parse_timestamp(Some("2025-10-21 23:30:00.000")), Some(expected));
        assert_eq!(parse_timestamp(Some("tonight")), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn unfinished_fixture_has_no_final_score() {
        let fixture = map_fixture(WireFixture {
            match_num: 3,
            home_score: Some(50),
            away_score: Some(48),
            completed: false,
            ..Default::default()
        });
        assert_eq!(fixture.final_score, None);
    }

    #[test]
    fn user_message_prefers_detail() {
        let err = ApiError::Api {
            status: StatusCode::BAD_REQUEST,
            detail: Some("Already a member".into()),
            url: "x".into(),
        };
        assert_eq!(err.user_message("Failed to join group"), "Already a member");
        let bare = ApiError::Other("boom".into());
        assert_eq!(bare.user_message("Failed to join group"), "Failed to join group");
    }

    #[tokio::test]
    async fn login_stores_token_and_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"username": "kobe", "password": "mamba"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token": "tok-8", "token_type": "bearer",
                    "user": {"id": 8, "username": "kobe", "email": "kobe@example.com",
                             "created_at": "2025-01-01T00:00:00", "is_active": true}}"#,
            )
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let api = HoopsApi::new(server.url(), store.clone());
        let session = api
            .login(&Credentials {
                username: "kobe".into(),
                password: "mamba".into(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.user.id, 8);
        assert_eq!(store.token().as_deref(), Some("tok-8"));
        assert_eq!(store.user().unwrap().map(|u| u.username), Some("kobe".into()));
    }

    #[tokio::test]
    async fn login_failure_surfaces_backend_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Incorrect username or password"}"#)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), Arc::new(MemoryStore::new()));
        let err = api
            .login(&Credentials {
                username: "kobe".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(
            err.user_message("Login failed. Please check your credentials."),
            "Incorrect username or password"
        );
    }

    #[tokio::test]
    async fn register_then_logs_in() {
        let mut server = mockito::Server::new_async().await;
        let register = server
            .mock("POST", "/auth/register")
            .match_body(Matcher::PartialJson(json!({"username": "kobe", "email": "kobe@example.com"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 8, "username": "kobe"}"#)
            .create_async()
            .await;
        let login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "t", "user": {"id": 8, "username": "kobe"}}"#)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), Arc::new(MemoryStore::new()));
        let session = api
            .register(&Registration {
                username: "kobe".into(),
                email: "kobe@example.com".into(),
                password: "mamba".into(),
            })
            .await
            .unwrap();
        register.assert_async().await;
        login.assert_async().await;
        assert_eq!(session.token_type, "bearer");
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/groups/me")
            .match_header("authorization", "Bearer tok-8")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"group_id": 3, "group_name": "Work Squad", "group_code": "ABC123",
                     "creator_id": 8, "creation_date": "2025-10-01T12:00:00",
                     "member_count": 4, "is_creator": true}]"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let groups = api.my_groups().await.unwrap();
        mock.assert_async().await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].code, "ABC123");
        assert!(groups[0].is_creator);
        assert_eq!(groups[0].member_count, 4);
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fixtures/allteams")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"team_id": 1, "team_name": "Celtics", "city": "Boston", "abbreviation": "BOS"}]"#)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), Arc::new(MemoryStore::new()));
        let teams = api.all_teams().await.unwrap();
        mock.assert_async().await;
        assert_eq!(teams[0].full_name(), "Boston Celtics");
    }

    #[tokio::test]
    async fn unauthorized_clears_store_and_raises_expiry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leaderboard/3")
            .with_status(401)
            .create_async()
            .await;

        let store = logged_in_store();
        let (tx, mut rx) = mpsc::channel(4);
        let api = HoopsApi::new(server.url(), store.clone()).with_expiry_notifier(tx);

        let err = api.leaderboard(3).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(store.token(), None);
        assert_eq!(store.user().unwrap(), None);
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Expired));
    }

    #[tokio::test]
    async fn other_errors_keep_the_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/groups/join")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Group not found"}"#)
            .create_async()
            .await;

        let store = logged_in_store();
        let (tx, mut rx) = mpsc::channel(4);
        let api = HoopsApi::new(server.url(), store.clone()).with_expiry_notifier(tx);

        let code = GroupCode::parse("zzz999").unwrap();
        let err = api.join_group(&code).await.unwrap_err();
        assert_eq!(err.user_message("Failed to join group"), "Group not found");
        assert!(store.token().is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn error_without_detail_uses_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/groups")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let err = api.create_group("Family League").await.unwrap_err();
        assert_eq!(err.user_message("Failed to create group"), "Failed to create group");
    }

    #[tokio::test]
    async fn invalid_group_name_never_hits_the_network() {
        let api = HoopsApi::new("http://127.0.0.1:9", logged_in_store());
        let err = api.create_group(" x ").await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn verify_token_reports_validity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/verify-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"valid": false}"#)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        assert!(!api.verify_token().await.unwrap());
    }

    #[tokio::test]
    async fn verify_token_without_stored_token_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/auth/verify-token")
            .expect(0)
            .create_async()
            .await;
        let api = HoopsApi::new(server.url(), Arc::new(MemoryStore::new()));
        assert!(!api.verify_token().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn verify_token_401_is_invalid_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/verify-token")
            .with_status(401)
            .create_async()
            .await;
        let api = HoopsApi::new(server.url(), logged_in_store());
        assert!(!api.verify_token().await.unwrap());
    }

    #[tokio::test]
    async fn session_gate_validates_against_backend() {
        use crate::session::{SessionGate, SessionState};

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/verify-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"valid": true}"#)
            .create_async()
            .await;

        let store = logged_in_store();
        let api = HoopsApi::new(server.url(), store.clone());
        let mut gate = SessionGate::restore(store);
        assert_eq!(gate.validate(&api).await, &SessionState::Authenticated(kobe()));
    }

    #[tokio::test]
    async fn session_gate_stays_unverified_when_backend_unreachable() {
        use crate::session::{SessionGate, SessionState};

        let store = logged_in_store();
        let api = HoopsApi::new("http://127.0.0.1:9", store.clone())
            .with_timeout(Duration::from_millis(500));
        let mut gate = SessionGate::restore(store);
        assert_eq!(gate.validate(&api).await, &SessionState::Unverified(kobe()));
    }

    #[tokio::test]
    async fn my_predictions_sends_window_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predictions/me")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("group_id".into(), "3".into()),
                Matcher::UrlEncoded("min_match_num".into(), "51".into()),
                Matcher::UrlEncoded("max_match_num".into(), "100".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{PREDICTION_JSON}]"))
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let preds = api
            .my_predictions(&PredictionFilter {
                group_id: Some(3),
                min_match_num: Some(51),
                max_match_num: Some(100),
            })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(preds[0].predicted, Scoreline::new(110, 108));
        assert_eq!(preds[0].id, Some(41));
        assert_eq!(preds[0].points_earned, None);
    }

    #[tokio::test]
    async fn past_predictions_pages_backward_from_last_completed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fixtures/lastupdatedfixture")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"match_num": 100, "home_team": "Heat"}"#)
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/predictions/me")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("min_match_num".into(), "1".into()),
                Matcher::UrlEncoded("max_match_num".into(), "50".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"pid": 7, "user_id": 8, "group_id": 3, "fixture_id": 12,
                     "pred_home_score": 110, "pred_away_score": 108, "points_earned": 4,
                     "locked": true, "actual_home_score": 112, "actual_away_score": 105,
                     "prediction_time": "2025-11-02T01:00:00"}]"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let page = api.past_predictions(2, 50).await.unwrap();
        page_two.assert_async().await;

        assert_eq!(page.window, Some(pager::MatchWindow { min: 1, max: 50 }));
        assert!(!page.has_more);
        let pred = &page.predictions[0];
        assert_eq!(pred.id, Some(7));
        assert_eq!(pred.actual, Some(Scoreline::new(112, 105)));
        assert_eq!(pred.points_earned, Some(4));
        assert_eq!(pred.projected_points(), Some(4));
        assert!(pred.submitted_at.is_some());
    }

    #[tokio::test]
    async fn past_predictions_beyond_first_match_is_end_of_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fixtures/lastupdatedfixture")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("100")
            .create_async()
            .await;
        let preds = server
            .mock("GET", Matcher::Regex("^/predictions".into()))
            .expect(0)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let page = api.past_predictions(3, 50).await.unwrap();
        preds.assert_async().await;
        assert!(page.window.is_none());
        assert!(page.predictions.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn fan_out_creates_and_updates_per_group() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/predictions")
            .match_body(Matcher::Json(json!({
                "group_id": 3, "fixture_id": 120, "pred_home_score": 110, "pred_away_score": 108
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PREDICTION_JSON)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/predictions")
            .match_body(Matcher::PartialJson(json!({"group_id": 5})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PREDICTION_JSON.replace("\"group_id\": 3", "\"group_id\": 5"))
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let now = Utc.with_ymd_and_hms(2029, 12, 31, 0, 0, 0).unwrap();
        let saved = api
            .submit_across_groups(
                &open_fixture(120),
                Scoreline::new(110, 108),
                &[(3, SubmitMode::Create), (5, SubmitMode::Update)],
                now,
            )
            .await
            .unwrap();

        create.assert_async().await;
        update.assert_async().await;
        let mut groups: Vec<u64> = saved.iter().map(|p| p.group_id).collect();
        groups.sort_unstable();
        assert_eq!(groups, vec![3, 5]);
    }

    #[tokio::test]
    async fn fan_out_reports_first_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .match_body(Matcher::PartialJson(json!({"group_id": 3})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PREDICTION_JSON)
            .create_async()
            .await;
        server
            .mock("POST", "/predictions")
            .match_body(Matcher::PartialJson(json!({"group_id": 9})))
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Not a member of this group"}"#)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let now = Utc.with_ymd_and_hms(2029, 12, 31, 0, 0, 0).unwrap();
        let err = api
            .submit_across_groups(
                &open_fixture(120),
                Scoreline::new(110, 108),
                &[(3, SubmitMode::Create), (9, SubmitMode::Create)],
                now,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message("Failed to create prediction"),
            "Not a member of this group"
        );
    }

    #[tokio::test]
    async fn fan_out_refuses_started_fixture() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predictions")
            .expect(0)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let after_tip = Utc.with_ymd_and_hms(2030, 1, 1, 3, 0, 1).unwrap();
        let err = api
            .submit_across_groups(
                &open_fixture(120),
                Scoreline::new(100, 99),
                &[(3, SubmitMode::Create)],
                after_tip,
            )
            .await
            .unwrap_err();
        mock.assert_async().await;
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn leave_group_issues_delete() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/groups/3/leave")
            .with_status(204)
            .create_async()
            .await;
        let api = HoopsApi::new(server.url(), logged_in_store());
        api.leave_group(3).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn leaderboard_maps_entries() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leaderboard/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"user_id": 8, "username": "kobe", "email": "k@example.com",
                     "total_points": 42, "rank_position": 1, "last_updated": "2025-11-02T01:00:00",
                     "total_predictions": 12, "scored_predictions": 10, "exact_predictions": 1,
                     "avg_points_per_prediction": 4.2},
                    {"user_id": 9, "username": "shaq", "email": "s@example.com",
                     "total_points": 30, "last_updated": "2025-11-02T01:00:00",
                     "total_predictions": 12, "scored_predictions": 10, "exact_predictions": 0}]"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let board = api.leaderboard(3).await.unwrap();
        assert_eq!(board[0].display_rank(0), 1);
        assert_eq!(board[1].rank, None);
        assert_eq!(board[1].display_rank(1), 2);
        assert_eq!(board[0].avg_points, Some(4.2));
    }

    #[tokio::test]
    async fn current_user_maps_profile_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer tok-8")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 8, "username": "kobe", "email": "kobe@example.com",
                    "created_at": "2025-01-01T00:00:00", "is_active": false}"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let user = api.current_user().await.unwrap();
        mock.assert_async().await;
        assert_eq!(user.username, "kobe");
        assert_eq!(user.created_at, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert!(!user.is_active);
    }

    const GROUP_JSON: &str = r#"{
        "group_id": 3, "group_name": "Work Squad", "group_code": "AB12CD",
        "creator_id": 8, "creator_username": "kobe", "creation_date": "2025-10-01T12:00:00",
        "member_count": 4, "is_creator": true
    }"#;

    #[tokio::test]
    async fn group_details_by_id_and_by_code() {
        let mut server = mockito::Server::new_async().await;
        let by_id = server
            .mock("GET", "/groups/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(GROUP_JSON)
            .create_async()
            .await;
        let by_code = server
            .mock("GET", "/groups/code/AB12CD")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(GROUP_JSON)
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let group = api.group_details(3).await.unwrap();
        by_id.assert_async().await;
        assert_eq!(group.name, "Work Squad");
        assert_eq!(group.member_count, 4);
        assert!(group.is_creator);
        assert!(group.created_at.is_some());
        assert_eq!(group.joined_at, None);

        let code = GroupCode::parse(" ab12cd").unwrap();
        let same = api.group_by_code(&code).await.unwrap();
        by_code.assert_async().await;
        assert_eq!(same, group);
    }

    #[tokio::test]
    async fn next_fixtures_and_single_fixture() {
        let mut server = mockito::Server::new_async().await;
        let next = server
            .mock("GET", "/fixtures/next")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"match_num": 121, "home_team": "Celtics", "away_team": "Knicks",
                     "start_time": "2030-01-02T00:30:00Z", "completed": false}]"#,
            )
            .create_async()
            .await;
        let single = server
            .mock("GET", "/fixtures/99")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"match_num": 99, "home_team": "Heat", "away_team": "Bulls",
                    "home_score": 101, "away_score": 97, "completed": true,
                    "game_date": "2025-11-01", "game_time": "19:30"}"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let upcoming = api.next_fixtures().await.unwrap();
        next.assert_async().await;
        assert_eq!(upcoming[0].matchup(), "Knicks @ Celtics");
        assert!(upcoming[0].accepts_predictions(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));

        let done = api.fixture(99).await.unwrap();
        single.assert_async().await;
        assert_eq!(done.final_score, Some(Scoreline::new(101, 97)));
        assert_eq!(done.game_time, "19:30");
        assert!(!done.accepts_predictions(Utc::now()));
    }

    #[tokio::test]
    async fn null_last_fixture_means_no_completed_games() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fixtures/lastupdatedfixture")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("null")
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        assert_eq!(api.last_completed_match_num().await.unwrap(), None);
    }

    #[tokio::test]
    async fn predictions_for_fixture_maps_every_entry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predictions/fixture/120")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{PREDICTION_JSON}]"))
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let preds = api.predictions_for_fixture(120).await.unwrap();
        mock.assert_async().await;
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].fixture_id, 120);
        assert_eq!(preds[0].group_id, 3);
        assert_eq!(preds[0].predicted, Scoreline::new(110, 108));
    }

    #[tokio::test]
    async fn my_rank_maps_single_entry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/leaderboard/3/me")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"user_id": 8, "username": "kobe", "total_points": 42,
                    "rank_position": 2, "total_predictions": 12, "scored_predictions": 10,
                    "exact_predictions": 1, "avg_points_per_prediction": 4.2}"#,
            )
            .create_async()
            .await;

        let api = HoopsApi::new(server.url(), logged_in_store());
        let me = api.my_rank(3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(me.rank, Some(2));
        assert_eq!(me.total_points, 42);
        assert_eq!(me.exact_predictions, 1);
    }
}
