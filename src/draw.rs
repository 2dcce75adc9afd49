use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::banner::{AnimatedBanner, BANNER_HEIGHT};
use crate::state::app_state::{AuthField, AuthMode, GroupsInput, ScoreField, TextInput};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use chrono::{DateTime, Local, Utc};
use hoops_api::scoring::rule_lines;
use hoops_api::{Fixture, Prediction};
use log::error;

static TABS: &[&str; 6] = &["Home", "Predictions", "Past", "Groups", "Leaderboard", "Profile"];

const GOLD: Color = Color::Rgb(255, 215, 0);
const SILVER: Color = Color::Rgb(192, 192, 192);
const BRONZE: Color = Color::Rgb(205, 127, 50);

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Home => draw_home(f, layout.main, app),
            MenuItem::Predictions => draw_predictions(f, layout.main, app),
            MenuItem::Past => draw_past(f, layout.main, app),
            MenuItem::Groups => draw_groups(f, layout.main, app),
            MenuItem::Leaderboard => draw_leaderboard(f, layout.main, app),
            MenuItem::Profile => draw_profile(f, layout.main, app),
            MenuItem::Login => draw_login(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_status(f, layout.status, app);
        let area = f.area();
        draw_loading_spinner(f, area, app, loading);
    });
    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn error_style() -> Style {
    Style::default().fg(Color::Red)
}

fn notice_style() -> Style {
    Style::default().fg(Color::Green)
}

/// One-line message area: error wins over notice, loading text over both.
fn status_line<'a>(
    loading: bool,
    loading_text: &'a str,
    error: Option<&'a str>,
    notice: Option<&'a str>,
) -> Line<'a> {
    if let Some(err) = error {
        return Line::from(Span::styled(err, error_style()));
    }
    if loading {
        return Line::from(Span::styled(loading_text, dim()));
    }
    match notice {
        Some(notice) => Line::from(Span::styled(notice, notice_style())),
        None => Line::from(""),
    }
}

fn centered_message(f: &mut Frame, area: Rect, msg: &str, style: Style) {
    f.render_widget(
        Paragraph::new(msg.to_owned())
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn kick_off(start: Option<DateTime<Utc>>, game_date: &str, game_time: &str) -> String {
    match start {
        Some(start) => start.with_timezone(&Local).format("%a %b %-d %H:%M").to_string(),
        None => format!("{game_date} {game_time}").trim().to_owned(),
    }
}

fn session_label(app: &App) -> String {
    let state = app.session.state();
    match app.session.user() {
        Some(user) => format!("{} as {}", state.label(), user.username),
        None => state.label().to_owned(),
    }
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Home | MenuItem::Login | MenuItem::Help => 0,
        MenuItem::Predictions => 1,
        MenuItem::Past => 2,
        MenuItem::Groups => 3,
        MenuItem::Leaderboard => 4,
        MenuItem::Profile => 5,
    };

    let titles: Vec<Line> = TABS
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {t}", i + 1)))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn draw_banner(f: &mut Frame, area: Rect, app: &App) {
    let status = session_label(app);
    f.render_widget(
        AnimatedBanner {
            frame: app.state.animation.frame,
            tick: app.state.animation.tick,
            status: &status,
        },
        area,
    );
}

fn draw_home(f: &mut Frame, area: Rect, app: &App) {
    let [banner, intro, teams_area] = Layout::vertical([
        Constraint::Length(BANNER_HEIGHT),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);
    draw_banner(f, banner, app);

    let greeting = match app.session.user() {
        Some(user) => format!(
            "Welcome back, {}. Press 2 to predict tonight's games or 5 for the standings.",
            user.username
        ),
        None => "Predict NBA scores with your friends. Press L to log in or register.".to_owned(),
    };
    f.render_widget(
        Paragraph::new(vec![
            Line::from(greeting),
            Line::from(Span::styled(
                "Exact score 10 pts · right winner 3 · within 2 points +1 per side",
                dim(),
            )),
        ])
        .alignment(Alignment::Center),
        intro,
    );

    let home = &app.state.home;
    let block = default_border(Color::White).title(format!(" Teams ({}) ", home.teams.len()));
    let inner = block.inner(teams_area);
    f.render_widget(block, teams_area);

    if home.teams.is_empty() {
        let msg = match (home.loading, home.error.as_deref()) {
            (_, Some(err)) => format!("Teams failed to load:\n{err}"),
            (true, None) => "Loading teams...".to_owned(),
            (false, None) => "No teams yet".to_owned(),
        };
        centered_message(f, inner, &msg, dim());
        return;
    }

    let rows = home
        .teams
        .iter()
        .skip(home.scroll_offset as usize)
        .map(|team| Row::new(vec![team.abbrev.clone(), team.full_name()]));
    let table = Table::new(rows, [Constraint::Length(5), Constraint::Fill(1)])
        .header(Row::new(vec!["", "Team"]).style(dim()))
        .column_spacing(2);
    f.render_widget(table, inner);
}

// ---------------------------------------------------------------------------
// Login / register
// ---------------------------------------------------------------------------

fn draw_login(f: &mut Frame, area: Rect, app: &App) {
    let auth = &app.state.auth;
    let [banner, _, form_row, _] = Layout::vertical([
        Constraint::Length(BANNER_HEIGHT),
        Constraint::Length(1),
        Constraint::Length(12),
        Constraint::Fill(1),
    ])
    .areas(area);
    draw_banner(f, banner, app);

    let [_, form_area, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(form_row);

    let title = match auth.mode {
        AuthMode::Login => " Log in ",
        AuthMode::Register => " Create an account ",
    };
    let block = default_border(Color::Yellow).title(title);
    let inner = block.inner(form_area);
    f.render_widget(block, form_area);

    let mut lines = Vec::new();
    for field in auth.fields() {
        let (label, value) = match field {
            AuthField::Username => ("Username", auth.username.as_str().to_owned()),
            AuthField::Email => ("Email", auth.email.as_str().to_owned()),
            AuthField::Password => ("Password", auth.password.masked()),
        };
        let focused = *field == auth.focus;
        let marker = if focused { "> " } else { "  " };
        let cursor = if focused { "_" } else { "" };
        let value_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{label:<10}"), dim()),
            Span::styled(format!("{value}{cursor}"), value_style),
        ]));
        lines.push(Line::from(""));
    }

    let pending = match auth.mode {
        AuthMode::Login => "Logging in...",
        AuthMode::Register => "Creating account...",
    };
    lines.push(status_line(auth.loading, pending, auth.error.as_deref(), app.state.notice.as_deref()));
    lines.push(Line::from(""));
    let switch_hint = match auth.mode {
        AuthMode::Login => "F2 register",
        AuthMode::Register => "F2 back to login",
    };
    lines.push(Line::from(Span::styled(
        format!("Tab next field · Enter submit · {switch_hint} · Esc home"),
        dim(),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

fn draw_predictions(f: &mut Frame, area: Rect, app: &App) {
    let state = &app.state.predictions;
    let now = Utc::now();

    let [list_area, side_area] = if area.width >= 100 {
        Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)]).areas(area)
    } else {
        Layout::vertical([Constraint::Fill(1), Constraint::Length(14)]).areas(area)
    };

    let block = default_border(Color::White).title(" Upcoming games ");
    let inner = block.inner(list_area);
    f.render_widget(block, list_area);

    let [message, list] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new(status_line(
            state.loading,
            "Loading fixtures...",
            state.error.as_deref(),
            state.notice.as_deref(),
        )),
        message,
    );

    if state.fixtures.is_empty() {
        if !state.loading {
            centered_message(f, list, "No upcoming games scheduled", dim());
        }
    } else {
        let visible = list.height as usize;
        let skip = state.selected.saturating_sub(visible.saturating_sub(1));
        let rows = state
            .fixtures
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(idx, fixture)| {
                let mine = state.existing_for(fixture.match_num).collect();
                fixture_row(fixture, mine, idx == state.selected, now)
            });
        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Fill(2),
                Constraint::Length(16),
                Constraint::Fill(1),
            ],
        );
        f.render_widget(table, list);
    }

    draw_prediction_panel(f, side_area, app, now);
}

fn fixture_row<'a>(
    fixture: &Fixture,
    mine: Vec<&Prediction>,
    selected: bool,
    now: DateTime<Utc>,
) -> Row<'a> {
    let open = fixture.accepts_predictions(now);
    let pick = match mine.first() {
        Some(p) if mine.len() > 1 => format!("{} ×{}", p.predicted, mine.len()),
        Some(p) => p.predicted.to_string(),
        None if open => "-".to_owned(),
        None => "locked".to_owned(),
    };
    let style = match (selected, open) {
        (true, _) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(Color::White),
        (false, false) => dim(),
    };
    Row::new(vec![
        if selected { ">".to_owned() } else { String::new() },
        format!("#{}", fixture.match_num),
        fixture.matchup(),
        kick_off(fixture.start_time, &fixture.game_date, &fixture.game_time),
        pick,
    ])
    .style(style)
}

fn draw_prediction_panel(f: &mut Frame, area: Rect, app: &App, now: DateTime<Utc>) {
    let state = &app.state.predictions;
    let [entry_area, recent_area] =
        Layout::vertical([Constraint::Length(8), Constraint::Fill(1)]).areas(area);

    let block = default_border(Color::Yellow).title(" Your prediction ");
    let inner = block.inner(entry_area);
    f.render_widget(block, entry_area);

    let Some(fixture) = state.selected_fixture() else {
        centered_message(f, inner, "Select a game with j/k", dim());
        draw_recent_predictions(f, recent_area, app);
        return;
    };

    let score_field = |label: &str, input: &TextInput, field: ScoreField| {
        let focused = state.editing == Some(field);
        let value = if focused {
            format!("[{}_]", input.as_str())
        } else if input.is_empty() {
            "[   ]".to_owned()
        } else {
            format!("[{}]", input.as_str())
        };
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        vec![Span::styled(format!("{label:<12}"), dim()), Span::styled(value, style)]
    };

    let groups = app.state.groups.groups.len();
    let mut lines = vec![Line::from(Span::styled(
        fixture.matchup(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if state.editing.is_some() {
        let mut home = vec![Span::raw(" ")];
        home.extend(score_field(&fixture.home_team, &state.home, ScoreField::Home));
        let mut away = vec![Span::raw(" ")];
        away.extend(score_field(&fixture.away_team, &state.away, ScoreField::Away));
        lines.push(Line::from(home));
        lines.push(Line::from(away));
        lines.push(Line::from(Span::styled(
            format!("Enter saves to {groups} group(s) · Tab switch · Esc cancel"),
            dim(),
        )));
    } else if state.submitting {
        lines.push(Line::from(Span::styled("Saving...", dim())));
    } else if fixture.accepts_predictions(now) {
        let current: Vec<String> = state
            .existing_for(fixture.match_num)
            .map(|p| {
                let group = app
                    .state
                    .groups
                    .groups
                    .iter()
                    .find(|g| g.id == p.group_id)
                    .map(|g| g.name.as_str())
                    .unwrap_or("group");
                format!("{} in {group}", p.predicted)
            })
            .collect();
        if current.is_empty() {
            lines.push(Line::from("No prediction yet"));
        } else {
            lines.push(Line::from(current.join(", ")));
        }
        lines.push(Line::from(Span::styled(
            "Press e or Enter to enter a score",
            dim(),
        )));
    } else {
        lines.push(Line::from(Span::styled("Predictions are closed for this game", dim())));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    draw_recent_predictions(f, recent_area, app);
}

fn draw_recent_predictions(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::DarkGray).title(" Recent predictions ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let recent = app.state.predictions.recent(inner.height as usize);
    if recent.is_empty() {
        centered_message(f, inner, "No predictions yet", dim());
        return;
    }
    let rows = recent.into_iter().map(|p| {
        let outcome = match (p.points_earned, p.projected_points()) {
            (Some(points), _) => format!("{points} pts"),
            (None, Some(projected)) => format!("~{projected} pts"),
            (None, None) => "pending".to_owned(),
        };
        Row::new(vec![
            format!("#{}", p.fixture_id),
            p.predicted.to_string(),
            p.actual.map(|a| a.to_string()).unwrap_or_else(|| "-".to_owned()),
            outcome,
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Fill(1),
        ],
    )
    .header(Row::new(vec!["Game", "Pick", "Final", "Points"]).style(dim()));
    f.render_widget(table, inner);
}

// ---------------------------------------------------------------------------
// Past predictions
// ---------------------------------------------------------------------------

fn draw_past(f: &mut Frame, area: Rect, app: &App) {
    let past = &app.state.past;
    let rules = rule_lines();
    let [guide_area, table_area, footer] = Layout::vertical([
        Constraint::Length(rules.len() as u16 + 2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let guide = Paragraph::new(rules.iter().map(|r| Line::from(r.as_str())).collect::<Vec<_>>())
        .style(dim())
        .block(default_border(Color::DarkGray).title(" Scoring "));
    f.render_widget(guide, guide_area);

    let block = default_border(Color::White).title(format!(
        " Past predictions · {} pts over {} ",
        past.total_points(),
        past.predictions.len()
    ));
    let inner = block.inner(table_area);
    f.render_widget(block, table_area);

    if past.predictions.is_empty() {
        let msg = match (past.loading, past.error.as_deref()) {
            (_, Some(err)) => err.to_owned(),
            (true, None) => "Loading past predictions...".to_owned(),
            (false, None) => "No past predictions yet".to_owned(),
        };
        centered_message(f, inner, &msg, dim());
    } else {
        let rows = past
            .predictions
            .iter()
            .skip(past.scroll_offset as usize)
            .map(|p| {
                let breakdown = p.breakdown();
                let label = breakdown.map(|b| b.label()).unwrap_or_else(|| "Awaiting result".to_owned());
                let points = p
                    .points_earned
                    .map(|pts| pts.to_string())
                    .or_else(|| p.projected_points().map(|pts| format!("~{pts}")))
                    .unwrap_or_else(|| "-".to_owned());
                let style = match breakdown {
                    Some(b) if b.exact => Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
                    Some(b) if b.points() > 0 => Style::default().fg(Color::Green),
                    Some(_) => dim(),
                    None => Style::default(),
                };
                Row::new(vec![
                    format!("#{}", p.fixture_id),
                    p.matchup(),
                    app.state
                        .groups
                        .groups
                        .iter()
                        .find(|g| g.id == p.group_id)
                        .map(|g| g.name.clone())
                        .unwrap_or_else(|| format!("group {}", p.group_id)),
                    p.predicted.to_string(),
                    p.actual.map(|a| a.to_string()).unwrap_or_else(|| "-".to_owned()),
                    points,
                    label,
                ])
                .style(style)
            });
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Fill(2),
            ],
        )
        .header(
            Row::new(vec!["Game", "Matchup", "Group", "Pick", "Final", "Pts", "Result"]).style(dim()),
        );
        f.render_widget(table, inner);
    }

    let more = if past.loading && !past.predictions.is_empty() {
        Span::styled("Loading more...", dim())
    } else if let Some(err) = past.error.as_deref().filter(|_| !past.predictions.is_empty()) {
        Span::styled(err, error_style())
    } else if past.has_more {
        Span::styled("m load more · j/k scroll · r refresh", dim())
    } else if past.loaded_once {
        Span::styled("No more predictions · j/k scroll · r refresh", dim())
    } else {
        Span::raw("")
    };
    f.render_widget(Paragraph::new(Line::from(more)), footer);
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

fn draw_groups(f: &mut Frame, area: Rect, app: &App) {
    let groups = &app.state.groups;
    let [content, prompt] = Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(area);
    let [list_area, members_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(content);

    let block = default_border(Color::White).title(format!(" My groups ({}) ", groups.groups.len()));
    let inner = block.inner(list_area);
    f.render_widget(block, list_area);

    if groups.groups.is_empty() {
        let msg = if groups.loading {
            "Loading groups..."
        } else {
            "You are not in any groups yet. Press c to create one or i to join with a code."
        };
        centered_message(f, inner, msg, dim());
    } else {
        let rows = groups.groups.iter().enumerate().map(|(idx, g)| {
            let selected = idx == groups.selected;
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                if selected { ">".to_owned() } else { String::new() },
                g.name.clone(),
                g.code.clone(),
                g.member_count.to_string(),
                if g.is_creator { "owner".to_owned() } else { String::new() },
            ])
            .style(style)
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(8),
                Constraint::Length(7),
                Constraint::Length(6),
            ],
        )
        .header(Row::new(vec!["", "Name", "Code", "Members", ""]).style(dim()));
        f.render_widget(table, inner);
    }

    draw_members(f, members_area, app);

    let (title, body) = match groups.mode {
        GroupsInput::CreateName => (
            " New group name ",
            Line::from(Span::styled(format!("{}_", groups.input.as_str()), Style::default().fg(Color::Yellow))),
        ),
        GroupsInput::JoinCode => (
            " Group code ",
            Line::from(Span::styled(
                format!("{}_", groups.input.as_str().to_ascii_uppercase()),
                Style::default().fg(Color::Yellow),
            )),
        ),
        GroupsInput::Confirm => {
            let question = match groups.selected_group() {
                Some(g) if g.is_creator => format!("Delete {} for every member? y/n", g.name),
                Some(g) => format!("Leave {}? y/n", g.name),
                None => String::new(),
            };
            (" Confirm ", Line::from(Span::styled(question, Style::default().fg(Color::Red))))
        }
        GroupsInput::Browse => {
            let line = status_line(groups.loading, "Working...", groups.error.as_deref(), groups.notice.as_deref());
            let line = if line.width() == 0 {
                Line::from(Span::styled(
                    "c create · i join by code · d leave/delete · j/k select · r refresh",
                    dim(),
                ))
            } else {
                line
            };
            (" Groups ", line)
        }
    };
    let block = default_border(Color::DarkGray).title(title);
    let inner = block.inner(prompt);
    f.render_widget(block, prompt);
    let body = match groups.error.as_deref() {
        Some(err) if groups.mode != GroupsInput::Browse => {
            let mut spans = body.spans;
            spans.push(Span::raw("  "));
            spans.push(Span::styled(err, error_style()));
            Line::from(spans)
        }
        _ => body,
    };
    f.render_widget(Paragraph::new(body), inner);
}

fn draw_members(f: &mut Frame, area: Rect, app: &App) {
    let groups = &app.state.groups;
    let title = match groups.selected_group() {
        Some(g) => format!(" Members of {} ", g.name),
        None => " Members ".to_owned(),
    };
    let block = default_border(Color::DarkGray).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if groups.members.is_empty() {
        let msg = if groups.members_loading { "Loading members..." } else { "" };
        centered_message(f, inner, msg, dim());
        return;
    }

    let rows = groups.members.iter().map(|m| {
        let name = if m.is_creator {
            format!("{} (owner)", m.username)
        } else {
            m.username.clone()
        };
        Row::new(vec![
            name,
            m.total_points.map(|p| p.to_string()).unwrap_or_else(|| "-".to_owned()),
            match (m.correct_predictions, m.total_predictions) {
                (Some(c), Some(t)) => format!("{c}/{t}"),
                _ => "-".to_owned(),
            },
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Fill(1), Constraint::Length(6), Constraint::Length(8)],
    )
    .header(Row::new(vec!["Player", "Pts", "Correct"]).style(dim()));
    f.render_widget(table, inner);
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

fn draw_leaderboard(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let title = match app.leaderboard_group() {
        Some(g) => format!(" Leaderboard · {} ", g.name),
        None => " Leaderboard ".to_owned(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [header, table_area] = Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(inner);
    let hint = if app.state.groups.groups.len() > 1 {
        "h/l switch group · r refresh"
    } else {
        "r refresh"
    };
    f.render_widget(
        Paragraph::new(vec![
            status_line(board.loading, "Loading leaderboard...", board.error.as_deref(), None),
            Line::from(Span::styled(hint, dim())),
        ]),
        header,
    );

    if board.group_id.is_none() {
        let msg = if app.state.groups.loading {
            "Loading groups..."
        } else {
            "Join a group to see its leaderboard"
        };
        centered_message(f, table_area, msg, dim());
        return;
    }
    if board.entries.is_empty() {
        if !board.loading {
            centered_message(f, table_area, "No scores yet", dim());
        }
        return;
    }

    let me = app.session.user().map(|u| u.id);
    let rows = board.entries.iter().enumerate().map(|(idx, entry)| {
        let rank = entry.display_rank(idx);
        let mut style = match rank {
            1 => Style::default().fg(GOLD),
            2 => Style::default().fg(SILVER),
            3 => Style::default().fg(BRONZE),
            _ => Style::default(),
        };
        if Some(entry.user_id) == me {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        Row::new(vec![
            rank.to_string(),
            entry.username.clone(),
            entry.total_points.to_string(),
            entry.total_predictions.to_string(),
            entry.scored_predictions.to_string(),
            entry.exact_predictions.to_string(),
            entry
                .avg_points
                .map(|avg| format!("{avg:.2}"))
                .unwrap_or_else(|| "-".to_owned()),
        ])
        .style(style)
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(Row::new(vec!["Rank", "Player", "Points", "Preds", "Scored", "Exact", "Avg"]).style(dim()));
    f.render_widget(table, table_area);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

fn draw_profile(f: &mut Frame, area: Rect, app: &App) {
    let profile = &app.state.profile;
    let block = default_border(Color::White).title(" Profile ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let user = app.session.user();
    let username = profile
        .profile
        .as_ref()
        .map(|p| p.username.as_str())
        .or(user.map(|u| u.username.as_str()))
        .unwrap_or("-");

    let label = |text: &'static str| Span::styled(format!("{text:<16}"), dim());
    let mut lines = vec![
        Line::from(vec![label("Username"), Span::raw(username.to_owned())]),
        Line::from(vec![
            label("Email"),
            Span::raw(user.map(|u| u.email.clone()).unwrap_or_default()),
        ]),
        Line::from(vec![
            label("Member since"),
            Span::raw(
                user.and_then(|u| u.created_at)
                    .map(|d| d.with_timezone(&Local).format("%B %-d, %Y").to_string())
                    .unwrap_or_else(|| "-".to_owned()),
            ),
        ]),
        Line::from(""),
    ];

    if profile.editing_bio {
        lines.push(Line::from(vec![
            label("Bio"),
            Span::styled(format!("{}_", profile.bio.as_str()), Style::default().fg(Color::Yellow)),
        ]));
        lines.push(Line::from(Span::styled("Enter save · Esc cancel", dim())));
    } else {
        let bio = profile
            .profile
            .as_ref()
            .and_then(|p| p.bio.clone())
            .unwrap_or_else(|| "No bio yet".to_owned());
        lines.push(Line::from(vec![label("Bio"), Span::raw(bio)]));
        lines.push(Line::from(Span::styled("e edit bio · r refresh", dim())));
    }
    lines.push(Line::from(""));

    if let Some(stats) = profile.stats {
        let accuracy = if stats.total_predictions == 0 {
            "-".to_owned()
        } else {
            format!(
                "{:.0}%",
                f64::from(stats.correct_predictions) * 100.0 / f64::from(stats.total_predictions)
            )
        };
        lines.push(Line::from(Span::styled("Stats", Style::default().add_modifier(Modifier::BOLD))));
        lines.push(Line::from(vec![label("Predictions"), Span::raw(stats.total_predictions.to_string())]));
        lines.push(Line::from(vec![label("Correct"), Span::raw(stats.correct_predictions.to_string())]));
        lines.push(Line::from(vec![label("Exact scores"), Span::raw(stats.exact_score_predictions.to_string())]));
        lines.push(Line::from(vec![label("Accuracy"), Span::raw(accuracy)]));
        lines.push(Line::from(""));
    }

    let pending = if profile.saving { "Saving bio..." } else { "Loading profile..." };
    lines.push(status_line(
        profile.loading || profile.saving,
        pending,
        profile.error.as_deref(),
        profile.notice.as_deref(),
    ));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

// ---------------------------------------------------------------------------
// Help, logs, status
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let keys = [
        ("1-6", "switch page"),
        ("L / x", "log in / log out"),
        ("r", "refresh the current page"),
        ("j/k", "move selection or scroll"),
        ("e, Enter", "edit a prediction or your bio"),
        ("m", "load more past predictions"),
        ("c / i / d", "create, join by code, leave or delete a group"),
        ("h/l", "switch leaderboard group"),
        ("f", "full screen"),
        ("\"", "toggle the log pane"),
        ("Esc", "close help or cancel input"),
        ("q, Ctrl-c", "quit"),
    ];
    let mut lines: Vec<Line> = keys
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>12}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.extend(rule_lines().into_iter().map(|r| Line::from(Span::styled(r, dim()))));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(dim());
    f.render_widget(logs, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let left = match app.state.notice.as_deref() {
        Some(notice) if app.state.active_tab != MenuItem::Login => {
            Span::styled(format!(" {notice}"), Style::default().fg(Color::Yellow))
        }
        _ => Span::styled(format!(" {}", session_label(app)), dim()),
    };
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(40)]).areas(area);
    f.render_widget(Paragraph::new(Line::from(left)), left_area);
    f.render_widget(
        Paragraph::new(app.settings.api_url.clone())
            .style(dim())
            .alignment(Alignment::Right),
        right_area,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
