use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use hoops_api::pager::PastPredictionsPage;
use hoops_api::{
    AuthSession, Credentials, Fixture, Group, GroupCode, GroupMember, LeaderboardEntry,
    Prediction, Registration, Scoreline, SubmitMode, Team, UserProfile, UserStats,
};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    VerifyToken,
    Login { credentials: Credentials },
    Register { registration: Registration },
    LoadTeams,
    LoadGroups,
    CreateGroup { name: String },
    JoinGroup { code: GroupCode },
    LeaveGroup { group_id: u64 },
    DeleteGroup { group_id: u64 },
    LoadGroupMembers { group_id: u64 },
    /// Upcoming fixtures plus the user's own predictions.
    LoadPredictions,
    SubmitPrediction {
        fixture: Fixture,
        predicted: Scoreline,
        targets: Vec<(u64, SubmitMode)>,
    },
    LoadPastPredictions { page: u32 },
    LoadLeaderboard { group_id: u64 },
    LoadProfile,
    UpdateBio { bio: String },
}

impl NetworkRequest {
    pub fn action(&self) -> Action {
        match self {
            NetworkRequest::VerifyToken => Action::VerifyToken,
            NetworkRequest::Login { .. } => Action::Login,
            NetworkRequest::Register { .. } => Action::Register,
            NetworkRequest::LoadTeams => Action::LoadTeams,
            NetworkRequest::LoadGroups => Action::LoadGroups,
            NetworkRequest::CreateGroup { .. } => Action::CreateGroup,
            NetworkRequest::JoinGroup { .. } => Action::JoinGroup,
            NetworkRequest::LeaveGroup { .. } => Action::LeaveGroup,
            NetworkRequest::DeleteGroup { .. } => Action::DeleteGroup,
            NetworkRequest::LoadGroupMembers { .. } => Action::LoadGroupMembers,
            NetworkRequest::LoadPredictions => Action::LoadPredictions,
            NetworkRequest::SubmitPrediction { .. } => Action::SubmitPrediction,
            NetworkRequest::LoadPastPredictions { .. } => Action::LoadPastPredictions,
            NetworkRequest::LoadLeaderboard { .. } => Action::LoadLeaderboard,
            NetworkRequest::LoadProfile => Action::LoadProfile,
            NetworkRequest::UpdateBio { .. } => Action::UpdateBio,
        }
    }
}

/// Which user-facing action a failure belongs to. Decides the page that shows
/// the error and the message used when the backend sends no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    VerifyToken,
    Login,
    Register,
    LoadTeams,
    LoadGroups,
    CreateGroup,
    JoinGroup,
    LeaveGroup,
    DeleteGroup,
    LoadGroupMembers,
    LoadPredictions,
    SubmitPrediction,
    LoadPastPredictions,
    LoadLeaderboard,
    LoadProfile,
    UpdateBio,
}

impl Action {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Action::VerifyToken => "Could not verify your session",
            Action::Login => "Login failed. Please check your credentials.",
            Action::Register => "Registration failed",
            Action::LoadTeams => "Failed to load teams",
            Action::LoadGroups => "Failed to load groups",
            Action::CreateGroup => "Failed to create group",
            Action::JoinGroup => "Failed to join group",
            Action::LeaveGroup => "Failed to leave group",
            Action::DeleteGroup => "Failed to delete group",
            Action::LoadGroupMembers => "Failed to load group members",
            Action::LoadPredictions => "Failed to load predictions",
            Action::SubmitPrediction => "Failed to save prediction",
            Action::LoadPastPredictions => "Failed to load past predictions",
            Action::LoadLeaderboard => "Failed to load leaderboard",
            Action::LoadProfile => "Failed to load profile",
            Action::UpdateBio => "Failed to update bio",
        }
    }

    /// Login and registration legitimately answer 401 for bad credentials.
    pub fn is_auth(self) -> bool {
        matches!(self, Action::Login | Action::Register)
    }
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    TokenChecked { valid: bool },
    TokenCheckUnavailable { message: String },
    LoggedIn { session: AuthSession },
    TeamsLoaded { teams: Vec<Team> },
    GroupsLoaded { groups: Vec<Group> },
    GroupCreated { group: Group },
    GroupJoined { group: Group },
    GroupLeft { group_id: u64 },
    GroupDeleted { group_id: u64 },
    GroupMembersLoaded { group_id: u64, members: Vec<GroupMember> },
    PredictionsLoaded {
        fixtures: Vec<Fixture>,
        predictions: Vec<Prediction>,
    },
    PredictionsSubmitted { saved: Vec<Prediction> },
    PastPredictionsLoaded { page: PastPredictionsPage },
    LeaderboardLoaded {
        group_id: u64,
        entries: Vec<LeaderboardEntry>,
    },
    ProfileLoaded { profile: UserProfile, stats: UserStats },
    BioUpdated { bio: String },
    Failed {
        action: Action,
        message: String,
        /// A 401; the session expiry event carries the user-facing part.
        unauthorized: bool,
    },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    AnimationTick,
}
