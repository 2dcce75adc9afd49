use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, AuthMode, GroupsInput};
use crate::state::messages::{Action, NetworkRequest};
use chrono::Utc;
use hoops_api::pager::PastPredictionsPage;
use hoops_api::session::SessionGate;
use hoops_api::{
    AuthSession, Fixture, Group, GroupCode, GroupMember, LeaderboardEntry, Prediction, Team,
    UserProfile, UserStats, validate_group_name,
};
use log::{info, warn};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Home,
    Predictions,
    Past,
    Groups,
    Leaderboard,
    Profile,
    Login,
    Help,
}

impl MenuItem {
    pub fn requires_auth(self) -> bool {
        matches!(
            self,
            MenuItem::Predictions
                | MenuItem::Past
                | MenuItem::Groups
                | MenuItem::Leaderboard
                | MenuItem::Profile
        )
    }
}

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub session: SessionGate,
}

impl App {
    pub fn new(settings: AppSettings, session: SessionGate) -> Self {
        let app = Self {
            state: AppState::new(),
            settings,
            session,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    /// Requests issued once the UI is up: the remote token check for a
    /// restored session, then whatever the landing page needs.
    pub fn on_started(&mut self) -> Vec<NetworkRequest> {
        let mut requests = Vec::new();
        if self.session.needs_validation() {
            requests.push(NetworkRequest::VerifyToken);
        }
        requests.extend(self.enter_tab(self.state.active_tab));
        requests
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switch pages. Pages behind the login redirect to the login form and
    /// come back after a successful login.
    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if self.state.active_tab == next {
            return Vec::new();
        }
        if next.requires_auth() && !self.session.is_authenticated() {
            self.state.auth.return_to = next;
            return self.switch_to(MenuItem::Login);
        }
        self.switch_to(next)
    }

    fn switch_to(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.enter_tab(next)
    }

    /// Every visit refetches, the way a page mounts.
    fn enter_tab(&mut self, tab: MenuItem) -> Vec<NetworkRequest> {
        if tab.requires_auth() && !self.session.is_authenticated() {
            return Vec::new();
        }
        match tab {
            MenuItem::Home => self.reload_teams(),
            MenuItem::Predictions => {
                let mut requests = self.reload_groups();
                requests.extend(self.reload_predictions());
                requests
            }
            MenuItem::Past => self.reload_past(),
            MenuItem::Groups | MenuItem::Leaderboard => self.reload_groups(),
            MenuItem::Profile => self.reload_profile(),
            MenuItem::Login | MenuItem::Help => Vec::new(),
        }
    }

    /// `r` on the current page.
    pub fn reload(&mut self) -> Vec<NetworkRequest> {
        self.enter_tab(self.state.active_tab)
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn advance_animation(&mut self, frame_count: usize) {
        self.state.animation.advance(frame_count);
    }

    fn reload_teams(&mut self) -> Vec<NetworkRequest> {
        self.state.home.loading = true;
        vec![NetworkRequest::LoadTeams]
    }

    fn reload_groups(&mut self) -> Vec<NetworkRequest> {
        self.state.groups.loading = true;
        vec![NetworkRequest::LoadGroups]
    }

    fn reload_predictions(&mut self) -> Vec<NetworkRequest> {
        self.state.predictions.loading = true;
        vec![NetworkRequest::LoadPredictions]
    }

    fn reload_past(&mut self) -> Vec<NetworkRequest> {
        self.state.past.loading = true;
        vec![NetworkRequest::LoadPastPredictions { page: 1 }]
    }

    fn reload_profile(&mut self) -> Vec<NetworkRequest> {
        self.state.profile.loading = true;
        vec![NetworkRequest::LoadProfile]
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn on_token_checked(&mut self, valid: bool) {
        let was_authenticated = self.session.is_authenticated();
        self.session.apply_validation(valid);
        if was_authenticated && !self.session.is_authenticated() {
            self.signed_out(Some(SESSION_EXPIRED));
        }
    }

    /// The backend could not be reached; keep trusting local credentials.
    pub fn on_token_check_unavailable(&mut self, message: String) {
        warn!("session left unverified: {message}");
    }

    /// A 401 from any request. Credentials are already gone from the store.
    pub fn on_session_expired(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        self.session.expire();
        self.signed_out(Some(SESSION_EXPIRED));
    }

    pub fn logout(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        self.session.logout();
        self.signed_out(Some("Logged out"));
    }

    fn signed_out(&mut self, notice: Option<&str>) {
        self.state.clear_user_data();
        self.state.notice = notice.map(str::to_owned);
        if self.state.active_tab.requires_auth() {
            self.state.auth.return_to = self.state.active_tab;
        }
        self.state.previous_tab = MenuItem::Home;
        self.state.active_tab = MenuItem::Login;
    }

    pub fn on_logged_in(&mut self, session: AuthSession) -> Vec<NetworkRequest> {
        info!("signed in as {}", session.user.username);
        self.session.on_login(session.user);
        self.state.notice = None;
        let target = self.state.auth.return_to;
        self.state.auth.reset();
        self.state.auth.mode = AuthMode::Login;
        self.state.auth.return_to = MenuItem::Home;
        self.switch_to(target)
    }

    // -----------------------------------------------------------------------
    // Login form
    // -----------------------------------------------------------------------

    pub fn auth_input(&mut self, c: char) {
        self.state.auth.focused_mut().push(c);
    }

    pub fn auth_backspace(&mut self) {
        self.state.auth.focused_mut().pop();
    }

    pub fn auth_submit(&mut self) -> Option<NetworkRequest> {
        let auth = &mut self.state.auth;
        if auth.loading {
            return None;
        }
        let request = match auth.mode {
            AuthMode::Login => auth
                .credentials()
                .map(|credentials| NetworkRequest::Login { credentials }),
            AuthMode::Register => auth
                .registration()
                .map(|registration| NetworkRequest::Register { registration }),
        };
        match request {
            Ok(request) => {
                auth.loading = true;
                auth.error = None;
                Some(request)
            }
            Err(message) => {
                auth.error = Some(message);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Home
    // -----------------------------------------------------------------------

    pub fn on_teams_loaded(&mut self, mut teams: Vec<Team>) {
        teams.sort_by_key(|t| t.full_name());
        let home = &mut self.state.home;
        home.teams = teams;
        home.loading = false;
        home.error = None;
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn on_groups_loaded(&mut self, groups: Vec<Group>) -> Vec<NetworkRequest> {
        let state = &mut self.state.groups;
        state.set_groups(groups);
        state.loading = false;
        state.error = None;

        let mut requests = Vec::new();
        match self.state.active_tab {
            MenuItem::Groups => requests.extend(self.load_selected_members()),
            MenuItem::Leaderboard => requests.extend(self.load_leaderboard()),
            _ => {}
        }
        requests
    }

    pub fn groups_select_next(&mut self) -> Option<NetworkRequest> {
        self.state.groups.select_next();
        self.load_selected_members()
    }

    pub fn groups_select_prev(&mut self) -> Option<NetworkRequest> {
        self.state.groups.select_prev();
        self.load_selected_members()
    }

    fn load_selected_members(&mut self) -> Option<NetworkRequest> {
        let group_id = self.state.groups.selected_group()?.id;
        let state = &mut self.state.groups;
        if state.members_for == Some(group_id) && !state.members.is_empty() {
            return None;
        }
        state.members_for = Some(group_id);
        state.members.clear();
        state.members_loading = true;
        Some(NetworkRequest::LoadGroupMembers { group_id })
    }

    pub fn on_group_members_loaded(&mut self, group_id: u64, members: Vec<GroupMember>) {
        let state = &mut self.state.groups;
        if state.members_for != Some(group_id) {
            return;
        }
        state.members = members;
        state.members_loading = false;
    }

    pub fn groups_begin(&mut self, mode: GroupsInput) {
        let state = &mut self.state.groups;
        if mode == GroupsInput::Confirm && state.selected_group().is_none() {
            return;
        }
        state.mode = mode;
        state.input.clear();
        state.error = None;
        state.notice = None;
    }

    pub fn groups_cancel(&mut self) {
        self.state.groups.mode = GroupsInput::Browse;
        self.state.groups.input.clear();
    }

    pub fn groups_input(&mut self, c: char) {
        self.state.groups.input.push(c);
    }

    pub fn groups_backspace(&mut self) {
        self.state.groups.input.pop();
    }

    /// Validate the typed name or code before anything goes out.
    pub fn groups_submit(&mut self) -> Option<NetworkRequest> {
        let state = &mut self.state.groups;
        let request = match state.mode {
            GroupsInput::CreateName => {
                validate_group_name(state.input.as_str()).map(|name| NetworkRequest::CreateGroup { name })
            }
            GroupsInput::JoinCode => {
                GroupCode::parse(state.input.as_str()).map(|code| NetworkRequest::JoinGroup { code })
            }
            GroupsInput::Browse | GroupsInput::Confirm => return None,
        };
        match request {
            Ok(request) => {
                state.mode = GroupsInput::Browse;
                state.input.clear();
                state.loading = true;
                state.error = None;
                Some(request)
            }
            Err(e) => {
                state.error = Some(e.user_message("Invalid input"));
                None
            }
        }
    }

    /// Creators delete the group, members leave it.
    pub fn groups_confirm(&mut self) -> Option<NetworkRequest> {
        let state = &mut self.state.groups;
        if state.mode != GroupsInput::Confirm {
            return None;
        }
        state.mode = GroupsInput::Browse;
        let group = state.selected_group()?;
        let group_id = group.id;
        let request = if group.is_creator {
            NetworkRequest::DeleteGroup { group_id }
        } else {
            NetworkRequest::LeaveGroup { group_id }
        };
        state.loading = true;
        Some(request)
    }

    pub fn on_group_created(&mut self, group: Group) -> Vec<NetworkRequest> {
        self.state.groups.notice = Some(format!(
            "Created {}. Share code {} to invite friends.",
            group.name, group.code
        ));
        self.reload_groups()
    }

    pub fn on_group_joined(&mut self, group: Group) -> Vec<NetworkRequest> {
        self.state.groups.notice = Some(format!("Joined {}", group.name));
        self.reload_groups()
    }

    pub fn on_group_removed(&mut self, group_id: u64, deleted: bool) -> Vec<NetworkRequest> {
        let state = &mut self.state.groups;
        state.loading = false;
        let name = state
            .remove(group_id)
            .map(|g| g.name)
            .unwrap_or_else(|| "group".to_owned());
        state.notice = Some(if deleted {
            format!("Deleted {name}")
        } else {
            format!("Left {name}")
        });
        if self.state.leaderboard.group_id == Some(group_id) {
            self.state.leaderboard = Default::default();
        }
        self.load_selected_members().into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Predictions
    // -----------------------------------------------------------------------

    pub fn on_predictions_loaded(&mut self, mut fixtures: Vec<Fixture>, predictions: Vec<Prediction>) {
        fixtures.sort_by_key(|f| f.match_num);
        let state = &mut self.state.predictions;
        state.fixtures = fixtures;
        state.mine = predictions;
        state.selected = state.selected.min(state.fixtures.len().saturating_sub(1));
        state.loading = false;
        state.error = None;
    }

    pub fn predictions_begin_edit(&mut self) {
        let state = &mut self.state.predictions;
        if state.selected_fixture().is_none() {
            return;
        }
        if !state.is_open(Utc::now()) {
            state.error = Some("Predictions are closed for this game".into());
            return;
        }
        state.begin_edit();
    }

    pub fn predictions_input(&mut self, c: char) {
        if !c.is_ascii_digit() {
            return;
        }
        if let Some(input) = self.state.predictions.focused_mut() {
            input.push(c);
        }
    }

    pub fn predictions_backspace(&mut self) {
        if let Some(input) = self.state.predictions.focused_mut() {
            input.pop();
        }
    }

    /// Apply the entered score to every group the user belongs to.
    pub fn predictions_submit(&mut self) -> Option<NetworkRequest> {
        let groups = &self.state.groups.groups;
        let state = &mut self.state.predictions;
        if state.submitting {
            return None;
        }
        let fixture = state.selected_fixture()?.clone();
        let predicted = match state.entered_score() {
            Ok(score) => score,
            Err(message) => {
                state.error = Some(message);
                return None;
            }
        };
        if !fixture.accepts_predictions(Utc::now()) {
            state.editing = None;
            state.error = Some("Predictions are closed for this game".into());
            return None;
        }
        if groups.is_empty() {
            state.error = Some("Join a group before making predictions".into());
            return None;
        }
        let targets = state.targets(fixture.match_num, groups);
        state.editing = None;
        state.submitting = true;
        state.error = None;
        Some(NetworkRequest::SubmitPrediction { fixture, predicted, targets })
    }

    pub fn on_predictions_submitted(&mut self, saved: Vec<Prediction>) {
        let state = &mut self.state.predictions;
        let count = saved.len();
        state.merge_saved(saved);
        state.submitting = false;
        state.notice = Some(match count {
            1 => "Prediction saved".to_owned(),
            n => format!("Prediction saved to {n} groups"),
        });
    }

    // -----------------------------------------------------------------------
    // Past predictions
    // -----------------------------------------------------------------------

    pub fn on_past_predictions_loaded(&mut self, page: PastPredictionsPage) {
        self.state.past.append(page);
    }

    pub fn past_load_more(&mut self) -> Option<NetworkRequest> {
        let past = &mut self.state.past;
        if past.loading || !past.has_more {
            return None;
        }
        past.loading = true;
        Some(NetworkRequest::LoadPastPredictions { page: past.next_page })
    }

    pub fn past_scroll_down(&mut self) {
        let max = self.state.past.predictions.len().saturating_sub(1) as u16;
        self.state.past.scroll_offset = (self.state.past.scroll_offset + 1).min(max);
    }

    pub fn past_scroll_up(&mut self) {
        self.state.past.scroll_offset = self.state.past.scroll_offset.saturating_sub(1);
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    /// Board for the chosen group, defaulting to the first one.
    fn load_leaderboard(&mut self) -> Option<NetworkRequest> {
        let groups = &self.state.groups.groups;
        let board = &mut self.state.leaderboard;
        let group_id = board
            .group_id
            .filter(|id| groups.iter().any(|g| g.id == *id))
            .or_else(|| groups.first().map(|g| g.id))?;
        board.group_id = Some(group_id);
        board.loading = true;
        Some(NetworkRequest::LoadLeaderboard { group_id })
    }

    pub fn leaderboard_cycle_group(&mut self, forward: bool) -> Option<NetworkRequest> {
        let groups = &self.state.groups.groups;
        if groups.is_empty() {
            return None;
        }
        let current = self
            .state
            .leaderboard
            .group_id
            .and_then(|id| groups.iter().position(|g| g.id == id))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % groups.len()
        } else {
            (current + groups.len() - 1) % groups.len()
        };
        self.state.leaderboard.group_id = Some(groups[next].id);
        self.state.leaderboard.entries.clear();
        self.load_leaderboard()
    }

    pub fn on_leaderboard_loaded(&mut self, group_id: u64, entries: Vec<LeaderboardEntry>) {
        let board = &mut self.state.leaderboard;
        if board.group_id != Some(group_id) {
            return;
        }
        board.entries = entries;
        board.loading = false;
        board.error = None;
    }

    pub fn leaderboard_group(&self) -> Option<&Group> {
        let id = self.state.leaderboard.group_id?;
        self.state.groups.groups.iter().find(|g| g.id == id)
    }

    // -----------------------------------------------------------------------
    // Profile
    // -----------------------------------------------------------------------

    pub fn on_profile_loaded(&mut self, profile: UserProfile, stats: UserStats) {
        let state = &mut self.state.profile;
        state.profile = Some(profile);
        state.stats = Some(stats);
        state.loading = false;
        state.error = None;
    }

    pub fn profile_begin_edit(&mut self) {
        let state = &mut self.state.profile;
        let current = state
            .profile
            .as_ref()
            .and_then(|p| p.bio.clone())
            .unwrap_or_default();
        state.bio.set(&current);
        state.editing_bio = true;
        state.notice = None;
        state.error = None;
    }

    pub fn profile_cancel_edit(&mut self) {
        self.state.profile.editing_bio = false;
    }

    pub fn profile_input(&mut self, c: char) {
        self.state.profile.bio.push(c);
    }

    pub fn profile_backspace(&mut self) {
        self.state.profile.bio.pop();
    }

    pub fn profile_save_bio(&mut self) -> Option<NetworkRequest> {
        let state = &mut self.state.profile;
        if !state.editing_bio || state.saving {
            return None;
        }
        state.editing_bio = false;
        state.saving = true;
        Some(NetworkRequest::UpdateBio { bio: state.bio.as_str().trim().to_owned() })
    }

    pub fn on_bio_updated(&mut self, bio: String) {
        let state = &mut self.state.profile;
        state.saving = false;
        if let Some(profile) = state.profile.as_mut() {
            profile.bio = Some(bio).filter(|b| !b.is_empty());
        }
        state.notice = Some("Bio updated successfully".into());
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    /// Show the failure on the page that issued the request.
    pub fn on_failed(&mut self, action: Action, message: String, unauthorized: bool) {
        // The expiry event reports a 401 on everything but the login form.
        let message = (!unauthorized || action.is_auth()).then_some(message);
        let state = &mut self.state;
        match action {
            Action::VerifyToken => {}
            Action::Login | Action::Register => {
                state.auth.loading = false;
                state.auth.error = message;
            }
            Action::LoadTeams => {
                state.home.loading = false;
                state.home.error = message;
            }
            Action::LoadGroups
            | Action::CreateGroup
            | Action::JoinGroup
            | Action::LeaveGroup
            | Action::DeleteGroup => {
                state.groups.loading = false;
                state.groups.error = message;
            }
            Action::LoadGroupMembers => {
                state.groups.members_loading = false;
                state.groups.error = message;
            }
            Action::LoadPredictions => {
                state.predictions.loading = false;
                state.predictions.error = message;
            }
            Action::SubmitPrediction => {
                state.predictions.submitting = false;
                state.predictions.error = message;
            }
            Action::LoadPastPredictions => {
                state.past.loading = false;
                state.past.error = message;
            }
            Action::LoadLeaderboard => {
                state.leaderboard.loading = false;
                state.leaderboard.error = message;
            }
            Action::LoadProfile => {
                state.profile.loading = false;
                state.profile.error = message;
            }
            Action::UpdateBio => {
                state.profile.saving = false;
                state.profile.error = message;
            }
        }
    }

    /// True when keystrokes should go to a text field instead of bindings.
    pub fn is_typing(&self) -> bool {
        match self.state.active_tab {
            MenuItem::Login => true,
            MenuItem::Groups => matches!(
                self.state.groups.mode,
                GroupsInput::CreateName | GroupsInput::JoinCode
            ),
            MenuItem::Predictions => self.state.predictions.editing.is_some(),
            MenuItem::Profile => self.state.profile.editing_bio,
            _ => false,
        }
    }
}
