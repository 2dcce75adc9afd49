use crate::state::messages::{Action, NetworkRequest, NetworkResponse};
use chrono::Utc;
use futures_util::future::try_join;
use hoops_api::PredictionFilter;
use hoops_api::client::{ApiResult, HoopsApi};
use hoops_api::pager::DEFAULT_PAGE_SIZE;
use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Runs every request on its own task so a slow call never holds up the
/// others. The spinner turns while at least one request is in flight.
pub struct NetworkWorker {
    api: HoopsApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    in_flight: Arc<AtomicUsize>,
}

impl NetworkWorker {
    pub fn new(
        api: HoopsApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            api,
            requests,
            responses,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
                self.start_loading_animation().await;
            }

            let api = self.api.clone();
            let responses = self.responses.clone();
            let in_flight = self.in_flight.clone();
            tokio::spawn(async move {
                let response = handle_request(&api, request).await;
                let is_ok = !matches!(response, NetworkResponse::Failed { .. });

                if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                    stop_loading_animation(&responses, is_ok).await;
                }
                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }

    async fn start_loading_animation(&self) {
        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let in_flight = self.in_flight.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }
}

async fn stop_loading_animation(responses: &mpsc::Sender<NetworkResponse>, is_ok: bool) {
    tokio::time::sleep(Duration::from_millis(15)).await;

    let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged {
            loading_state: LoadingState { is_loading: false, spinner_char },
        })
        .await;
}

async fn handle_request(api: &HoopsApi, request: NetworkRequest) -> NetworkResponse {
    let action = request.action();
    debug!("network request: {action:?}");

    let result = match request {
        NetworkRequest::VerifyToken => {
            return match api.verify_token().await {
                Ok(valid) => NetworkResponse::TokenChecked { valid },
                Err(e) => {
                    warn!("token check failed: {e}");
                    NetworkResponse::TokenCheckUnavailable { message: e.to_string() }
                }
            };
        }
        NetworkRequest::Login { credentials } => api
            .login(&credentials)
            .await
            .map(|session| NetworkResponse::LoggedIn { session }),
        NetworkRequest::Register { registration } => api
            .register(&registration)
            .await
            .map(|session| NetworkResponse::LoggedIn { session }),
        NetworkRequest::LoadTeams => api
            .all_teams()
            .await
            .map(|teams| NetworkResponse::TeamsLoaded { teams }),
        NetworkRequest::LoadGroups => api
            .my_groups()
            .await
            .map(|groups| NetworkResponse::GroupsLoaded { groups }),
        NetworkRequest::CreateGroup { name } => api
            .create_group(&name)
            .await
            .map(|group| NetworkResponse::GroupCreated { group }),
        NetworkRequest::JoinGroup { code } => api
            .join_group(&code)
            .await
            .map(|group| NetworkResponse::GroupJoined { group }),
        NetworkRequest::LeaveGroup { group_id } => api
            .leave_group(group_id)
            .await
            .map(|()| NetworkResponse::GroupLeft { group_id }),
        NetworkRequest::DeleteGroup { group_id } => api
            .delete_group(group_id)
            .await
            .map(|()| NetworkResponse::GroupDeleted { group_id }),
        NetworkRequest::LoadGroupMembers { group_id } => api
            .group_members(group_id)
            .await
            .map(|members| NetworkResponse::GroupMembersLoaded { group_id, members }),
        NetworkRequest::LoadPredictions => load_predictions(api).await,
        NetworkRequest::SubmitPrediction { fixture, predicted, targets } => api
            .submit_across_groups(&fixture, predicted, &targets, Utc::now())
            .await
            .map(|saved| NetworkResponse::PredictionsSubmitted { saved }),
        NetworkRequest::LoadPastPredictions { page } => api
            .past_predictions(page, DEFAULT_PAGE_SIZE)
            .await
            .map(|page| NetworkResponse::PastPredictionsLoaded { page }),
        NetworkRequest::LoadLeaderboard { group_id } => api
            .leaderboard(group_id)
            .await
            .map(|entries| NetworkResponse::LeaderboardLoaded { group_id, entries }),
        NetworkRequest::LoadProfile => try_join(api.profile(), api.stats())
            .await
            .map(|(profile, stats)| NetworkResponse::ProfileLoaded { profile, stats }),
        NetworkRequest::UpdateBio { bio } => api
            .update_bio(&bio)
            .await
            .map(|()| NetworkResponse::BioUpdated { bio }),
    };

    result.unwrap_or_else(|err| failure(action, &err))
}

async fn load_predictions(api: &HoopsApi) -> ApiResult<NetworkResponse> {
    let (fixtures, predictions) = try_join(
        api.upcoming_fixtures(),
        api.my_predictions(&PredictionFilter::default()),
    )
    .await?;
    Ok(NetworkResponse::PredictionsLoaded { fixtures, predictions })
}

fn failure(action: Action, err: &hoops_api::client::ApiError) -> NetworkResponse {
    warn!("{action:?} failed: {err}");
    NetworkResponse::Failed {
        action,
        message: err.user_message(action.fallback_message()),
        unauthorized: err.is_unauthorized(),
    }
}
