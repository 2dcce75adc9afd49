mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::{API_URL_VAR, AppSettings, LOG_LEVEL_VAR, SESSION_FILE_VAR};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use hoops_api::client::HoopsApi;
use hoops_api::session::{SessionEvent, SessionGate};
use hoops_api::store::{CredentialStore, FileStore};
use log::{LevelFilter, debug, error};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Duration;
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let settings = AppSettings::load();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(settings.log_level.unwrap_or(LevelFilter::Error));

    let store: Arc<dyn CredentialStore> = Arc::new(FileStore::open(&settings.session_file));
    debug!("session file: {}", settings.session_file.display());

    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>(8);
    let api = HoopsApi::new(settings.api_url.clone(), store.clone()).with_expiry_notifier(session_tx);
    let app = Arc::new(Mutex::new(App::new(settings, SessionGate::restore(store))));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Animation tick thread, 80ms ≈ 12.5 FPS
    let anim_tx = ui_event_tx.clone();
    let animation_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(80));
        loop {
            interval.tick().await;
            if anim_tx.send(UiEvent::AnimationTick).await.is_err() {
                break;
            }
        }
    });

    // Token check and first page load
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(
        terminal,
        app,
        ui_event_rx,
        network_req_tx,
        network_resp_rx,
        session_rx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    animation_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("hoopstui {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> String {
    format!(
        "hoopstui - NBA score prediction league in the terminal

Usage:
  hoopstui
  hoopstui --help
  hoopstui --version

Environment:
  {API_URL_VAR:<20} Backend base URL (default http://localhost:8000)
  {LOG_LEVEL_VAR:<20} Log level for the log pane: error, warn, info, debug, trace
  {SESSION_FILE_VAR:<20} Where the login is kept (default <config dir>/hoopstui/session.json)"
    )
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut session_events: mpsc::Receiver<SessionEvent>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(SessionEvent::Expired) = session_events.recv() => {
                let mut app_guard = app.lock().await;
                app_guard.on_session_expired();
                draw::draw(&mut terminal, &mut app_guard, loading);
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let requests = app.lock().await.on_started();
            send_all(network_requests, requests).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
        UiEvent::AnimationTick => {
            let mut guard = app.lock().await;
            guard.advance_animation(crate::components::banner::FRAME_COUNT);
            true
        }
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    if let NetworkResponse::LoadingStateChanged { loading_state } = response {
        *loading = loading_state;
        return true;
    }

    let mut guard = app.lock().await;
    let follow_up = match response {
        NetworkResponse::LoadingStateChanged { .. } => Vec::new(),
        NetworkResponse::TokenChecked { valid } => {
            guard.on_token_checked(valid);
            Vec::new()
        }
        NetworkResponse::TokenCheckUnavailable { message } => {
            guard.on_token_check_unavailable(message);
            Vec::new()
        }
        NetworkResponse::LoggedIn { session } => guard.on_logged_in(session),
        NetworkResponse::TeamsLoaded { teams } => {
            guard.on_teams_loaded(teams);
            Vec::new()
        }
        NetworkResponse::GroupsLoaded { groups } => guard.on_groups_loaded(groups),
        NetworkResponse::GroupCreated { group } => guard.on_group_created(group),
        NetworkResponse::GroupJoined { group } => guard.on_group_joined(group),
        NetworkResponse::GroupLeft { group_id } => guard.on_group_removed(group_id, false),
        NetworkResponse::GroupDeleted { group_id } => guard.on_group_removed(group_id, true),
        NetworkResponse::GroupMembersLoaded { group_id, members } => {
            guard.on_group_members_loaded(group_id, members);
            Vec::new()
        }
        NetworkResponse::PredictionsLoaded { fixtures, predictions } => {
            guard.on_predictions_loaded(fixtures, predictions);
            Vec::new()
        }
        NetworkResponse::PredictionsSubmitted { saved } => {
            guard.on_predictions_submitted(saved);
            Vec::new()
        }
        NetworkResponse::PastPredictionsLoaded { page } => {
            guard.on_past_predictions_loaded(page);
            Vec::new()
        }
        NetworkResponse::LeaderboardLoaded { group_id, entries } => {
            guard.on_leaderboard_loaded(group_id, entries);
            Vec::new()
        }
        NetworkResponse::ProfileLoaded { profile, stats } => {
            guard.on_profile_loaded(profile, stats);
            Vec::new()
        }
        NetworkResponse::BioUpdated { bio } => {
            guard.on_bio_updated(bio);
            Vec::new()
        }
        NetworkResponse::Failed { action, message, unauthorized } => {
            error!("{action:?} failed: {message}");
            guard.on_failed(action, message, unauthorized);
            Vec::new()
        }
    };
    drop(guard);

    send_all(network_requests, follow_up).await;
    true
}

async fn send_all(network_requests: &mpsc::Sender<NetworkRequest>, requests: Vec<NetworkRequest>) {
    for request in requests {
        if let Err(e) = network_requests.send(request).await {
            error!("Failed to queue network request: {e}");
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
