use crate::components::banner_frames::{
    BannerColor, TITLE_WIDTH, ball_row, basketball_frame, resolve, title_rows,
};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::Style;
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Widget};

pub use crate::components::banner_frames::FRAME_COUNT;

pub const BANNER_HEIGHT: u16 = 7;

/// Title block for the home and login pages: a spinning ball either side of
/// the logo and a status line underneath.
pub struct AnimatedBanner<'a> {
    pub frame: usize,
    pub tick: u64,
    pub status: &'a str,
}

impl Widget for AnimatedBanner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 3 {
            render_line(Line::from(" HOOPS PREDICTOR "), area.x, area.y, area.width, buf);
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(resolve(BannerColor::Primary));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if inner.width < TITLE_WIDTH + 20 || inner.height < 5 {
            render_compact(&self, inner, buf);
            return;
        }
        render_full(&self, inner, buf);
    }
}

fn render_compact(banner: &AnimatedBanner, inner: Rect, buf: &mut Buffer) {
    render_centered(
        Line::from(Span::styled("HOOPS PREDICTOR", resolve(BannerColor::Accent))),
        inner,
        inner.y,
        buf,
    );
    if inner.height > 1 {
        render_centered(
            Line::from(Span::styled(banner.status, resolve(BannerColor::Secondary))),
            inner,
            inner.y + 1,
            buf,
        );
    }
}

fn render_full(banner: &AnimatedBanner, inner: Rect, buf: &mut Buffer) {
    let title = title_rows();
    let left_ball = basketball_frame(banner.frame);
    let right_ball = basketball_frame((banner.frame + 2) % FRAME_COUNT);
    let ball_y = ball_row(banner.tick, 4);

    for row in 0..4u16 {
        let y = inner.y + row;
        let ball_style = if row == ball_y {
            resolve(BannerColor::Secondary)
        } else {
            resolve(BannerColor::Shadow)
        };
        let line = Line::from(vec![
            Span::styled(left_ball[row as usize], ball_style),
            Span::raw("  "),
            Span::styled(title[row as usize], resolve(BannerColor::Primary)),
            Span::raw("  "),
            Span::styled(right_ball[row as usize], ball_style),
        ]);
        render_centered(line, inner, y, buf);
    }

    let status = format!(" NBA PREDICTION LEAGUE  |  {} ", banner.status);
    render_centered(
        Line::from(Span::styled(status, resolve(BannerColor::Accent))),
        inner,
        inner.y + 4,
        buf,
    );
}

fn render_centered(line: Line, area: Rect, y: u16, buf: &mut Buffer) {
    if y >= area.y + area.height {
        return;
    }
    let w = line.width() as u16;
    let x = area.x + area.width.saturating_sub(w) / 2;
    render_line(line, x, y, area.width, buf);
}

fn render_line(line: Line, x: u16, y: u16, max_width: u16, buf: &mut Buffer) {
    let mut cx = x;
    let limit = x.saturating_add(max_width);
    for span in &line.spans {
        let style: Style = span.style;
        let run: String = span
            .content
            .chars()
            .take(limit.saturating_sub(cx) as usize)
            .collect();
        if run.is_empty() {
            break;
        }
        let width = run.chars().count() as u16;
        buf.set_string(cx, y, run, style);
        cx += width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        AnimatedBanner { frame: 0, tick: 0, status: "signed in as kobe" }.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn wide_banner_shows_logo_and_status() {
        let text = rendered(80, BANNER_HEIGHT);
        assert!(text.contains("|_||_|"));
        assert!(text.contains("signed in as kobe"));
    }

    #[test]
    fn narrow_banner_falls_back_to_text_title() {
        let text = rendered(40, BANNER_HEIGHT);
        assert!(text.contains("HOOPS PREDICTOR"));
        assert!(!text.contains("|_||_|"));
    }
}
