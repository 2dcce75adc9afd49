use tui::style::{Color, Modifier, Style};

pub const FRAME_COUNT: usize = 4;
pub const TITLE_WIDTH: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BannerColor {
    Primary,
    Secondary,
    Accent,
    Shadow,
}

pub fn resolve(color: BannerColor) -> Style {
    match color {
        BannerColor::Primary => Style::default().fg(Color::Rgb(200, 16, 46)),
        BannerColor::Secondary => Style::default().fg(Color::Rgb(255, 103, 31)),
        BannerColor::Accent => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        BannerColor::Shadow => Style::default().fg(Color::Indexed(240)),
    }
}

/// Row of the ball as it bounces between the top and bottom of `height`.
pub fn ball_row(tick: u64, height: u16) -> u16 {
    let h = u64::from(height.saturating_sub(1));
    if h == 0 {
        return 0;
    }
    let t = tick % (2 * h);
    h.abs_diff(t) as u16
}

pub fn basketball_frame(frame: usize) -> [&'static str; 4] {
    const FRAMES: [[&str; 4]; FRAME_COUNT] = [
        [" .---. ", "/  |  \\", "\\--+--/", " '---' "],
        [" .---. ", "/ / \\ \\", "\\ \\ / /", " '---' "],
        [" .---. ", "/ -+- \\", "\\ -+- /", " '---' "],
        [" .---. ", "/ \\ / \\", "\\ / \\ /", " '---' "],
    ];
    FRAMES[frame % FRAME_COUNT]
}

pub fn title_rows() -> [&'static str; 4] {
    [
        r" _  _   ___    ___   ___  ___ ",
        r"| || | / _ \  / _ \ | _ \/ __|",
        r"| __ || (_) || (_) ||  _/\__ \",
        r"|_||_| \___/  \___/ |_|  |___/",
    ]
}
