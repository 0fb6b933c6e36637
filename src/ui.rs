use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::time::SystemTime;
use time_humanize::{Accuracy, HumanTime, Tense};
use typometer::history::{Scope, SessionResult};
use typometer::scoring;
use typometer::session::CharStatus;
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;

pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Typing => draw_typing(app, f),
        AppState::Results => draw_results(app, f),
        AppState::History => draw_history(app, f),
    }
}

fn styles() -> (Style, Style, Style, Style, Style) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green_bold = bold.fg(Color::Green);
    let red_bold = bold.fg(Color::Red);
    let dim_bold = bold.add_modifier(Modifier::DIM);
    let cursor = dim_bold.add_modifier(Modifier::UNDERLINED);
    (bold, green_bold, red_bold, dim_bold, cursor)
}

fn draw_typing(app: &App, f: &mut Frame) {
    let (_bold, green_bold, red_bold, dim_bold, cursor_style) = styles();
    let area = f.area();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = app.session.target().width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    ((area.height as f64 - prompt_occupied_lines as f64) / 2.0) as u16,
                ),
                Constraint::Length(2),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(
                    ((area.height as f64 - prompt_occupied_lines as f64) / 2.0) as u16,
                ),
            ]
            .as_ref(),
        )
        .split(area);

    // Display-only clock; scoring derives from the session's own timestamps
    let elapsed = app.session.elapsed_at(SystemTime::now());
    let live_wpm = scoring::wpm(app.session.input().len(), elapsed);
    let timer = Paragraph::new(Span::styled(
        format!("{:.1}s · {} wpm", elapsed, live_wpm),
        dim_bold,
    ))
    .alignment(Alignment::Center);
    f.render_widget(timer, chunks[1]);

    let target_chars: Vec<char> = app.session.target().chars().collect();
    let input = app.session.input();
    let cursor = app.session.cursor();

    let spans = app
        .session
        .statuses()
        .iter()
        .enumerate()
        .map(|(idx, status)| match status {
            CharStatus::Correct => Span::styled(target_chars[idx].to_string(), green_bold),
            CharStatus::Incorrect => Span::styled(
                match input.get(idx).copied() {
                    Some(' ') => String::from("·"),
                    Some(c) => c.to_string(),
                    None => target_chars[idx].to_string(),
                },
                red_bold,
            ),
            CharStatus::Untyped => {
                if cursor == Some(idx) {
                    Span::styled(target_chars[idx].to_string(), cursor_style)
                } else {
                    Span::styled(target_chars[idx].to_string(), dim_bold)
                }
            }
        })
        .collect::<Vec<Span>>();

    let prompt = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            // when the prompt is small enough to fit on one line
            // centering the text gives a nice zen feeling
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, chunks[2]);
}

fn draw_results(app: &App, f: &mut Frame) {
    let (bold, _green, _red, dim_bold, _cursor) = styles();
    let italic = Style::default().add_modifier(Modifier::ITALIC);
    let magenta = Style::default().fg(Color::Magenta);

    let mut lines: Vec<Line> = Vec::new();

    if let Some(result) = app.session.result() {
        lines.push(Line::from(Span::styled(
            format!("{} wpm · {}% accuracy", result.wpm, result.accuracy),
            bold.fg(Color::Green),
        )));
        lines.push(Line::from(Span::styled(
            format!("{} mistakes", app.session.mistakes()),
            dim_bold,
        )));
        lines.push(Line::from(""));
    }

    for line in aggregate_lines(app, magenta) {
        lines.push(line);
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(r)estart (h)istory (esc)ape",
        italic,
    )));

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, centered(f.area()));
}

fn draw_history(app: &App, f: &mut Frame) {
    let (bold, _green, _red, dim_bold, _cursor) = styles();
    let italic = Style::default().add_modifier(Modifier::ITALIC);
    let magenta = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        format!(
            "history · {} results · sorted by {}",
            app.history.len(),
            app.sort_by.to_string().to_lowercase()
        ),
        bold,
    ));
    f.render_widget(title, chunks[0]);

    let rows: Vec<Line> = if app.history.is_empty() {
        vec![Line::from(Span::styled(
            "no results yet",
            dim_bold,
        ))]
    } else {
        app.history
            .list(app.sort_by)
            .iter()
            .take(chunks[1].height as usize)
            .map(|r| {
                Line::from(Span::raw(format!(
                    "{:>4} wpm  {:>3}%  {}",
                    r.wpm,
                    r.accuracy,
                    r.completed_at.format("%Y-%m-%d %H:%M")
                )))
            })
            .collect()
    };
    f.render_widget(Paragraph::new(rows), chunks[1]);

    let mut footer = aggregate_lines(app, magenta);
    footer.push(Line::from(Span::styled(
        "(r)estart (s)ort (d)elete all (esc)ape",
        italic,
    )));
    f.render_widget(Paragraph::new(footer), chunks[2]);
}

fn aggregate_lines(app: &App, style: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let all_wpm = app.history.average_wpm(Scope::All);
    let all_acc = app.history.average_accuracy(Scope::All);
    let recent_wpm = app.history.average_wpm(Scope::Last(app.trailing_window));
    lines.push(Line::from(Span::styled(
        format!(
            "avg {} wpm {}% · last {}: {} wpm",
            fmt_opt(all_wpm),
            fmt_opt(all_acc.map(u32::from)),
            app.trailing_window,
            fmt_opt(recent_wpm),
        ),
        style,
    )));

    if let (Some(fastest), Some(latest)) = (app.history.fastest(), app.history.latest()) {
        lines.push(Line::from(Span::styled(
            format!(
                "fastest {} wpm · latest {} wpm {}",
                fastest.wpm,
                latest.wpm,
                age_of(latest)
            ),
            style,
        )));
    }

    lines
}

fn fmt_opt(v: Option<u32>) -> String {
    v.map_or_else(|| String::from("-"), |x| x.to_string())
}

fn age_of(result: &SessionResult) -> String {
    let completed = SystemTime::from(result.completed_at);
    let age = SystemTime::now().duration_since(completed).unwrap_or_default();
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

fn centered(area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Min(8),
                Constraint::Percentage(35),
            ]
            .as_ref(),
        )
        .split(area);
    chunks[1]
}
