use crate::app::MenuItem;
use chrono::{DateTime, Utc};
use hoops_api::pager::PastPredictionsPage;
use hoops_api::{
    Credentials, Fixture, Group, GroupMember, LeaderboardEntry, Prediction, Registration,
    Scoreline, SubmitMode, Team, UserProfile, UserStats,
};

// ---------------------------------------------------------------------------
// Banner animation state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AnimationState {
    /// Current frame index into the banner frames array, wraps at FRAME_COUNT.
    pub frame: usize,
    /// Monotonic tick counter, drives the bouncing ball.
    pub tick: u64,
}

impl AnimationState {
    pub fn advance(&mut self, frame_count: usize) {
        self.tick = self.tick.wrapping_add(1);
        self.frame = (self.frame + 1) % frame_count;
    }
}

// ---------------------------------------------------------------------------
// Text input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    max_len: usize,
}

impl TextInput {
    pub fn new(max_len: usize) -> Self {
        Self { value: String::new(), max_len }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() && self.value.chars().count() < self.max_len {
            self.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.chars().take(self.max_len).collect();
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Masked rendering for password fields.
    pub fn masked(&self) -> String {
        "*".repeat(self.value.chars().count())
    }
}

// ---------------------------------------------------------------------------
// Login / register form
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum AuthField {
    #[default]
    Username,
    Email,
    Password,
}

#[derive(Debug)]
pub struct AuthFormState {
    pub mode: AuthMode,
    pub focus: AuthField,
    pub username: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub loading: bool,
    pub error: Option<String>,
    /// Page to return to once logged in.
    pub return_to: MenuItem,
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: AuthField::Username,
            username: TextInput::new(50),
            email: TextInput::new(100),
            password: TextInput::new(128),
            loading: false,
            error: None,
            return_to: MenuItem::Home,
        }
    }
}

impl AuthFormState {
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Username, AuthField::Password],
            AuthMode::Register => &[AuthField::Username, AuthField::Email, AuthField::Password],
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.focus = AuthField::Username;
        self.error = None;
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn credentials(&self) -> Result<Credentials, String> {
        let username = self.username.as_str().trim();
        if username.is_empty() || self.password.is_empty() {
            return Err("Username and password are required".into());
        }
        Ok(Credentials {
            username: username.to_owned(),
            password: self.password.as_str().to_owned(),
        })
    }

    pub fn registration(&self) -> Result<Registration, String> {
        let credentials = self.credentials()?;
        let email = self.email.as_str().trim();
        if !email.contains('@') {
            return Err("Enter a valid email address".into());
        }
        Ok(Registration {
            username: credentials.username,
            email: email.to_owned(),
            password: credentials.password,
        })
    }

    /// Clears secrets and status but keeps the mode and the return page.
    pub fn reset(&mut self) {
        self.username.clear();
        self.email.clear();
        self.password.clear();
        self.focus = AuthField::Username;
        self.loading = false;
        self.error = None;
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HomeState {
    pub teams: Vec<Team>,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll_offset: u16,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum GroupsInput {
    #[default]
    Browse,
    CreateName,
    JoinCode,
    /// Waiting for y/n before leaving (member) or deleting (creator).
    Confirm,
}

#[derive(Debug)]
pub struct GroupsState {
    pub groups: Vec<Group>,
    pub selected: usize,
    pub members: Vec<GroupMember>,
    pub members_for: Option<u64>,
    pub members_loading: bool,
    pub mode: GroupsInput,
    pub input: TextInput,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Default for GroupsState {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            selected: 0,
            members: Vec::new(),
            members_for: None,
            members_loading: false,
            mode: GroupsInput::Browse,
            input: TextInput::new(hoops_api::GROUP_NAME_MAX),
            loading: false,
            error: None,
            notice: None,
        }
    }
}

impl GroupsState {
    pub fn selected_group(&self) -> Option<&Group> {
        self.groups.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.groups.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
        self.selected = self.selected.min(self.groups.len().saturating_sub(1));
        if self.members_for != self.selected_group().map(|g| g.id) {
            self.members.clear();
            self.members_for = None;
        }
    }

    pub fn remove(&mut self, group_id: u64) -> Option<Group> {
        let idx = self.groups.iter().position(|g| g.id == group_id)?;
        let removed = self.groups.remove(idx);
        self.selected = self.selected.min(self.groups.len().saturating_sub(1));
        if self.members_for == Some(group_id) {
            self.members.clear();
            self.members_for = None;
        }
        Some(removed)
    }
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum ScoreField {
    #[default]
    Home,
    Away,
}

#[derive(Debug)]
pub struct PredictionsState {
    pub fixtures: Vec<Fixture>,
    /// Every prediction the user has made, across groups.
    pub mine: Vec<Prediction>,
    pub selected: usize,
    pub editing: Option<ScoreField>,
    pub home: TextInput,
    pub away: TextInput,
    pub loading: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Default for PredictionsState {
    fn default() -> Self {
        Self {
            fixtures: Vec::new(),
            mine: Vec::new(),
            selected: 0,
            editing: None,
            home: TextInput::new(3),
            away: TextInput::new(3),
            loading: false,
            submitting: false,
            error: None,
            notice: None,
        }
    }
}

impl PredictionsState {
    pub fn selected_fixture(&self) -> Option<&Fixture> {
        self.fixtures.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.fixtures.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn existing_for(&self, fixture_id: u32) -> impl Iterator<Item = &Prediction> {
        self.mine.iter().filter(move |p| p.fixture_id == fixture_id)
    }

    /// One target per group: update where a prediction for the fixture
    /// already exists, create otherwise.
    pub fn targets(&self, fixture_id: u32, groups: &[Group]) -> Vec<(u64, SubmitMode)> {
        groups
            .iter()
            .map(|g| {
                let exists = self.existing_for(fixture_id).any(|p| p.group_id == g.id);
                let mode = if exists { SubmitMode::Update } else { SubmitMode::Create };
                (g.id, mode)
            })
            .collect()
    }

    pub fn begin_edit(&mut self) {
        let current = self
            .selected_fixture()
            .and_then(|f| self.existing_for(f.match_num).next())
            .map(|p| p.predicted);
        match current {
            Some(score) => {
                self.home.set(&score.home.to_string());
                self.away.set(&score.away.to_string());
            }
            None => {
                self.home.clear();
                self.away.clear();
            }
        }
        self.editing = Some(ScoreField::Home);
        self.error = None;
        self.notice = None;
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn switch_field(&mut self) {
        self.editing = self.editing.map(|field| match field {
            ScoreField::Home => ScoreField::Away,
            ScoreField::Away => ScoreField::Home,
        });
    }

    pub fn focused_mut(&mut self) -> Option<&mut TextInput> {
        match self.editing? {
            ScoreField::Home => Some(&mut self.home),
            ScoreField::Away => Some(&mut self.away),
        }
    }

    pub fn entered_score(&self) -> Result<Scoreline, String> {
        let parse = |input: &TextInput, side: &str| {
            input
                .as_str()
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("Enter a {side} score"))
        };
        Ok(Scoreline::new(parse(&self.home, "home")?, parse(&self.away, "away")?))
    }

    /// Replace predictions the backend just stored, keyed by group and fixture.
    pub fn merge_saved(&mut self, saved: Vec<Prediction>) {
        for prediction in saved {
            match self
                .mine
                .iter_mut()
                .find(|p| p.group_id == prediction.group_id && p.fixture_id == prediction.fixture_id)
            {
                Some(existing) => *existing = prediction,
                None => self.mine.push(prediction),
            }
        }
    }

    /// Most recent predictions first, by match number.
    pub fn recent(&self, limit: usize) -> Vec<&Prediction> {
        let mut recent: Vec<&Prediction> = self.mine.iter().collect();
        recent.sort_by(|a, b| b.fixture_id.cmp(&a.fixture_id).then(a.group_id.cmp(&b.group_id)));
        recent.truncate(limit);
        recent
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.selected_fixture().is_some_and(|f| f.accepts_predictions(now))
    }
}

// ---------------------------------------------------------------------------
// Past predictions
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PastState {
    pub predictions: Vec<Prediction>,
    pub next_page: u32,
    pub has_more: bool,
    pub loaded_once: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll_offset: u16,
}

impl Default for PastState {
    fn default() -> Self {
        Self {
            predictions: Vec::new(),
            next_page: 1,
            has_more: false,
            loaded_once: false,
            loading: false,
            error: None,
            scroll_offset: 0,
        }
    }
}

impl PastState {
    pub fn append(&mut self, page: PastPredictionsPage) {
        if page.page_number <= 1 {
            self.predictions.clear();
            self.scroll_offset = 0;
        }
        let mut predictions = page.predictions;
        predictions.sort_by(|a, b| b.fixture_id.cmp(&a.fixture_id).then(a.group_id.cmp(&b.group_id)));
        self.predictions.extend(predictions);
        self.next_page = page.page_number.max(1) + 1;
        self.has_more = page.has_more;
        self.loaded_once = true;
        self.loading = false;
        self.error = None;
    }

    pub fn total_points(&self) -> i64 {
        self.predictions
            .iter()
            .filter_map(|p| p.points_earned)
            .map(i64::from)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub group_id: Option<u64>,
    pub entries: Vec<LeaderboardEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub stats: Option<UserStats>,
    pub editing_bio: bool,
    pub bio: TextInput,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            profile: None,
            stats: None,
            editing_bio: false,
            bio: TextInput::new(500),
            loading: false,
            saving: false,
            error: None,
            notice: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    /// Session-wide message shown in the status row (expiry, logout).
    pub notice: Option<String>,
    pub animation: AnimationState,
    pub auth: AuthFormState,
    pub home: HomeState,
    pub groups: GroupsState,
    pub predictions: PredictionsState,
    pub past: PastState,
    pub leaderboard: LeaderboardState,
    pub profile: ProfileState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything that belongs to the signed-in user.
    pub fn clear_user_data(&mut self) {
        self.groups = GroupsState::default();
        self.predictions = PredictionsState::default();
        self.past = PastState::default();
        self.leaderboard = LeaderboardState::default();
        self.profile = ProfileState::default();
        self.auth.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: u64) -> Group {
        Group { id, name: format!("g{id}"), ..Default::default() }
    }

    fn prediction(group_id: u64, fixture_id: u32, home: u16, away: u16) -> Prediction {
        Prediction {
            group_id,
            fixture_id,
            predicted: Scoreline::new(home, away),
            ..Default::default()
        }
    }

    #[test]
    fn text_input_respects_max_len_and_controls() {
        let mut input = TextInput::new(3);
        for c in ['1', '2', '\n', '3', '4'] {
            input.push(c);
        }
        assert_eq!(input.as_str(), "123");
        input.pop();
        assert_eq!(input.as_str(), "12");
        assert_eq!(input.masked(), "**");
    }

    #[test]
    fn auth_focus_cycles_through_mode_fields() {
        let mut form = AuthFormState::default();
        form.focus_next();
        assert_eq!(form.focus, AuthField::Password);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Username);

        form.toggle_mode();
        form.focus_next();
        assert_eq!(form.focus, AuthField::Email);
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focus, AuthField::Password);
    }

    #[test]
    fn registration_requires_email() {
        let mut form = AuthFormState::default();
        form.toggle_mode();
        "kobe".chars().for_each(|c| form.username.push(c));
        "mamba".chars().for_each(|c| form.password.push(c));
        assert!(form.registration().is_err());
        "kobe@example.com".chars().for_each(|c| form.email.push(c));
        assert_eq!(form.registration().unwrap().email, "kobe@example.com");
    }

    #[test]
    fn targets_update_existing_and_create_missing() {
        let mut state = PredictionsState::default();
        state.mine = vec![prediction(3, 120, 100, 98), prediction(5, 119, 90, 91)];
        let targets = state.targets(120, &[group(3), group(5)]);
        assert_eq!(targets, vec![(3, SubmitMode::Update), (5, SubmitMode::Create)]);
    }

    #[test]
    fn begin_edit_prefills_existing_prediction() {
        let mut state = PredictionsState::default();
        state.fixtures = vec![Fixture { match_num: 120, ..Default::default() }];
        state.mine = vec![prediction(3, 120, 104, 99)];
        state.begin_edit();
        assert_eq!(state.home.as_str(), "104");
        assert_eq!(state.away.as_str(), "99");
        assert_eq!(state.editing, Some(ScoreField::Home));
    }

    #[test]
    fn entered_score_needs_both_sides() {
        let mut state = PredictionsState::default();
        state.home.set("110");
        assert!(state.entered_score().is_err());
        state.away.set("108");
        assert_eq!(state.entered_score(), Ok(Scoreline::new(110, 108)));
    }

    #[test]
    fn merge_saved_replaces_by_group_and_fixture() {
        let mut state = PredictionsState::default();
        state.mine = vec![prediction(3, 120, 100, 98)];
        state.merge_saved(vec![prediction(3, 120, 110, 108), prediction(5, 120, 110, 108)]);
        assert_eq!(state.mine.len(), 2);
        assert_eq!(state.mine[0].predicted, Scoreline::new(110, 108));
    }

    #[test]
    fn past_pages_append_and_first_page_resets() {
        let mut past = PastState::default();
        past.append(PastPredictionsPage {
            page_number: 1,
            window: None,
            predictions: vec![prediction(3, 90, 1, 2), prediction(3, 99, 1, 2)],
            has_more: true,
        });
        assert_eq!(past.next_page, 2);
        assert_eq!(past.predictions[0].fixture_id, 99);

        past.append(PastPredictionsPage {
            page_number: 2,
            predictions: vec![prediction(3, 40, 1, 2)],
            ..Default::default()
        });
        assert_eq!(past.predictions.len(), 3);
        assert!(!past.has_more);

        past.append(PastPredictionsPage { page_number: 1, ..Default::default() });
        assert!(past.predictions.is_empty());
    }

    #[test]
    fn removing_selected_group_clamps_selection() {
        let mut groups = GroupsState::default();
        groups.set_groups(vec![group(1), group(2)]);
        groups.select_next();
        groups.members_for = Some(2);
        groups.remove(2);
        assert_eq!(groups.selected, 0);
        assert_eq!(groups.members_for, None);
    }
}
