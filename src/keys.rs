use crate::app::{App, MenuItem};
use crate::state::app_state::GroupsInput;
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let requests = route_key(&mut guard, key_event);
    drop(guard);

    for request in requests {
        let _ = network_requests.send(request).await;
    }
}

fn route_key(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        quit();
    }
    if app.is_typing() {
        return handle_text_entry(app, key_event);
    }
    handle_bindings(app, key_event)
}

fn quit() -> ! {
    crate::cleanup_terminal();
    std::process::exit(0);
}

/// Keys while a text field has focus. Esc leaves the field (or the login
/// page), Enter submits.
fn handle_text_entry(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    let code = key_event.code;
    match app.state.active_tab {
        MenuItem::Login => match code {
            KeyCode::Esc => return app.update_tab(MenuItem::Home),
            KeyCode::Tab | KeyCode::Down => app.state.auth.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.state.auth.focus_prev(),
            KeyCode::F(2) => app.state.auth.toggle_mode(),
            KeyCode::Enter => return app.auth_submit().into_iter().collect(),
            KeyCode::Backspace => app.auth_backspace(),
            Char(c) => app.auth_input(c),
            _ => {}
        },
        MenuItem::Groups => match code {
            KeyCode::Esc => app.groups_cancel(),
            KeyCode::Enter => return app.groups_submit().into_iter().collect(),
            KeyCode::Backspace => app.groups_backspace(),
            Char(c) => app.groups_input(c),
            _ => {}
        },
        MenuItem::Predictions => match code {
            KeyCode::Esc => app.state.predictions.cancel_edit(),
            KeyCode::Tab | KeyCode::BackTab => app.state.predictions.switch_field(),
            KeyCode::Enter => return app.predictions_submit().into_iter().collect(),
            KeyCode::Backspace => app.predictions_backspace(),
            Char(c) => app.predictions_input(c),
            _ => {}
        },
        MenuItem::Profile => match code {
            KeyCode::Esc => app.profile_cancel_edit(),
            KeyCode::Enter => return app.profile_save_bio().into_iter().collect(),
            KeyCode::Backspace => app.profile_backspace(),
            Char(c) => app.profile_input(c),
            _ => {}
        },
        _ => {}
    }
    Vec::new()
}

fn handle_bindings(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    let mut requests = Vec::new();

    match (app.state.active_tab, key_event.code) {
        // Leave/delete confirmation swallows everything but y/n
        (MenuItem::Groups, code) if app.state.groups.mode == GroupsInput::Confirm => match code {
            Char('y') | Char('Y') => requests.extend(app.groups_confirm()),
            _ => app.groups_cancel(),
        },

        (_, Char('q')) => quit(),

        // Tab switching
        (_, Char('1')) => requests = app.update_tab(MenuItem::Home),
        (_, Char('2')) => requests = app.update_tab(MenuItem::Predictions),
        (_, Char('3')) => requests = app.update_tab(MenuItem::Past),
        (_, Char('4')) => requests = app.update_tab(MenuItem::Groups),
        (_, Char('5')) => requests = app.update_tab(MenuItem::Leaderboard),
        (_, Char('6')) => requests = app.update_tab(MenuItem::Profile),
        (_, Char('?')) => requests = app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc) => app.exit_help(),

        // Session
        (_, Char('L')) if !app.session.is_authenticated() => {
            requests = app.update_tab(MenuItem::Login)
        }
        (_, Char('x')) => app.logout(),

        // Predictions
        (MenuItem::Predictions, Char('j') | KeyCode::Down) => app.state.predictions.select_next(),
        (MenuItem::Predictions, Char('k') | KeyCode::Up) => app.state.predictions.select_prev(),
        (MenuItem::Predictions, Char('e') | KeyCode::Enter) => app.predictions_begin_edit(),

        // Past predictions
        (MenuItem::Past, Char('j') | KeyCode::Down) => app.past_scroll_down(),
        (MenuItem::Past, Char('k') | KeyCode::Up) => app.past_scroll_up(),
        (MenuItem::Past, Char('m')) => requests.extend(app.past_load_more()),

        // Groups
        (MenuItem::Groups, Char('j') | KeyCode::Down) => requests.extend(app.groups_select_next()),
        (MenuItem::Groups, Char('k') | KeyCode::Up) => requests.extend(app.groups_select_prev()),
        (MenuItem::Groups, Char('c')) => app.groups_begin(GroupsInput::CreateName),
        (MenuItem::Groups, Char('i')) => app.groups_begin(GroupsInput::JoinCode),
        (MenuItem::Groups, Char('d')) => app.groups_begin(GroupsInput::Confirm),

        // Leaderboard
        (MenuItem::Leaderboard, Char('l') | KeyCode::Right | KeyCode::Tab) => {
            requests.extend(app.leaderboard_cycle_group(true))
        }
        (MenuItem::Leaderboard, Char('h') | KeyCode::Left | KeyCode::BackTab) => {
            requests.extend(app.leaderboard_cycle_group(false))
        }

        // Home
        (MenuItem::Home, Char('j') | KeyCode::Down) => {
            app.state.home.scroll_offset = app.state.home.scroll_offset.saturating_add(1)
        }
        (MenuItem::Home, Char('k') | KeyCode::Up) => {
            app.state.home.scroll_offset = app.state.home.scroll_offset.saturating_sub(1)
        }

        // Profile
        (MenuItem::Profile, Char('e')) => app.profile_begin_edit(),

        // Global
        (_, Char('r')) => requests = app.reload(),
        (_, Char('f')) => app.toggle_full_screen(),
        (_, Char('"')) => app.toggle_show_logs(),

        _ => {}
    }

    requests
}
