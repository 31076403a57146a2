use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Row, Table, Widget, Wrap},
};
use techarade::game::Verification;
use techarade::store::ResultRecord;
use unicode_width::UnicodeWidthStr;

use crate::{App, SaveStatus, Screen};

const HORIZONTAL_MARGIN: u16 = 4;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Clips a cell to a display width, unicode-aware.
fn clip(s: &str, max: usize) -> String {
    if s.width() <= max {
        s.to_string()
    } else {
        let mut out = String::new();
        for c in s.chars() {
            if out.width() + 1 >= max {
                break;
            }
            out.push(c);
        }
        out.push('…');
        out
    }
}

fn vertical_chunks(area: Rect, heights: &[u16]) -> std::rc::Rc<[Rect]> {
    let mut constraints: Vec<Constraint> = Vec::with_capacity(heights.len() + 2);
    let used: u16 = heights.iter().sum();
    let pad = area.height.saturating_sub(used) / 2;
    constraints.push(Constraint::Length(pad));
    constraints.extend(heights.iter().map(|h| Constraint::Length(*h)));
    constraints.push(Constraint::Min(0));
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(constraints)
        .split(area)
}

fn centered_line(text: String, style: Style, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text, style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Register => render_register(self, area, buf),
            Screen::Idle => render_idle(self, area, buf),
            Screen::Playing => render_playing(self, area, buf),
            Screen::GameOver => render_game_over(self, area, buf),
            Screen::Review => render_review(self, area, buf),
        }
    }
}

fn render_register(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = vertical_chunks(area, &[1, 1, 1, 1, 1, 1, 1]);
    centered_line("PARTICIPANT REGISTRATION".into(), bold().fg(Color::Cyan), chunks[1], buf);

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            bold().add_modifier(Modifier::UNDERLINED)
        } else {
            dim()
        };
        Span::styled(format!("{label}: {value}▏"), style)
    };
    Paragraph::new(Line::from(field("name", &app.reg.name, !app.reg.on_id)))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    Paragraph::new(Line::from(field("id (optional)", &app.reg.student_id, app.reg.on_id)))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    if app.reg.error {
        centered_line("name is required".into(), bold().fg(Color::Red), chunks[5], buf);
    }
    centered_line(
        "tab switch · enter continue · esc quit".into(),
        dim(),
        chunks[6],
        buf,
    );
}

fn render_idle(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(game) = app.game.as_ref() else { return };
    let chunks = vertical_chunks(area, &[1, 1, 1, 1, 1, 1, 1]);

    centered_line("TECHARADE".into(), bold().fg(Color::Cyan), chunks[1], buf);
    centered_line(
        format!("welcome, {}", game.participant.name),
        Style::default(),
        chunks[3],
        buf,
    );
    centered_line(
        format!(
            "{} rounds · {:.0} seconds each",
            game.config.max_rounds, game.config.round_secs
        ),
        dim(),
        chunks[4],
        buf,
    );
    if let Some(high) = app.high_score {
        centered_line(format!("high score {high:.1}"), dim(), chunks[5], buf);
    }
    centered_line("press enter to start".into(), bold(), chunks[6], buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(game) = app.game.as_ref() else { return };
    let chunks = vertical_chunks(area, &[1, 1, 3, 1, 3, 1, 1, 1]);

    let high = app
        .high_score
        .map(|h| format!("{h:.1}"))
        .unwrap_or_else(|| "-".into());
    centered_line(
        format!(
            "score {:.1} · high {high} · round {}/{}",
            game.auto_score, game.round, game.config.max_rounds
        ),
        dim(),
        chunks[1],
        buf,
    );

    centered_line(game.letter.to_string(), bold().fg(Color::Cyan), chunks[2], buf);

    let remaining = game.seconds_remaining();
    let ratio = (remaining / game.config.round_secs).clamp(0.0, 1.0);
    let color = if ratio > 0.5 {
        Color::Cyan
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{remaining:.1}s"))
        .render(chunks[4], buf);

    let input_style = if game.input_error {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    let max = area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 4) as usize;
    centered_line(format!("> {}▏", clip(&game.input, max)), input_style, chunks[6], buf);

    if game.input_error {
        centered_line(
            format!("term must start with '{}'", game.letter),
            Style::default().fg(Color::Red),
            chunks[7],
            buf,
        );
    }
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(game) = app.game.as_ref() else { return };
    let chunks = vertical_chunks(area, &[1, 1, 1, 1, 1, 1, 1]);

    centered_line("GAME FINISHED".into(), bold().fg(Color::Cyan), chunks[1], buf);
    centered_line(
        format!("final score {:.1}", game.auto_score),
        bold(),
        chunks[3],
        buf,
    );
    if let Some(high) = app.high_score {
        centered_line(format!("high score {high:.1}"), dim(), chunks[4], buf);
    }
    let (save_text, save_style) = match app.save_status {
        SaveStatus::Pending => (String::new(), dim()),
        SaveStatus::Saved => ("result saved".into(), dim().fg(Color::Green)),
        SaveStatus::Failed => ("saving the result failed".into(), bold().fg(Color::Red)),
        SaveStatus::Unavailable => ("results database unavailable · not saved".into(), bold().fg(Color::Red)),
    };
    if !save_text.is_empty() {
        centered_line(save_text, save_style, chunks[5], buf);
    }
    centered_line("enter play again · esc quit".into(), dim(), chunks[6], buf);
}

fn render_review(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(reviewer) = app.reviewer.as_ref() else {
        return;
    };

    let record = app
        .review_ui
        .detail
        .and_then(|id| reviewer.results().iter().find(|r| r.id == id));
    if let Some(record) = record {
        render_detail(app, record, area, buf);
    } else {
        render_table(app, reviewer.results(), area, buf);
    }
}

fn render_table(app: &App, results: &[ResultRecord], area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    centered_line("RESULTS REVIEW".into(), bold().fg(Color::Cyan), chunks[0], buf);

    if results.is_empty() {
        centered_line("no results yet".into(), dim(), chunks[1], buf);
    } else {
        let rows: Vec<Row> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let style = if i == app.review_ui.selected {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    clip(&r.name, 22),
                    clip(&r.student_id, 12),
                    format!("{:.1}", r.auto_score),
                    r.verified_score
                        .map(|s| format!("{s:.1}"))
                        .unwrap_or_else(|| "-".into()),
                    r.rounds_completed.to_string(),
                    r.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ])
                .style(style)
            })
            .collect();
        Table::new(
            rows,
            [
                Constraint::Length(22),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Length(16),
            ],
        )
        .header(Row::new(vec!["name", "id", "auto", "verified", "rnds", "played"]).style(bold()))
        .render(chunks[1], buf);
    }

    if let Some(status) = &app.review_ui.status {
        centered_line(status.clone(), dim().fg(Color::Yellow), chunks[2], buf);
    }
    centered_line(
        "↑↓ select · enter detail · f refresh · esc quit".into(),
        dim(),
        chunks[3],
        buf,
    );
}

fn render_detail(app: &App, record: &ResultRecord, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    centered_line(clip(&record.name, 40), bold().fg(Color::Cyan), chunks[0], buf);
    let verified = record
        .verified_score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".into());
    centered_line(
        format!("auto {:.1} · verified {verified}", record.auto_score),
        dim(),
        chunks[1],
        buf,
    );

    let rows: Vec<Row> = record
        .rounds
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut style = match r.verification {
                Verification::Accepted => Style::default().fg(Color::Green),
                Verification::Rejected => Style::default().fg(Color::Red),
                Verification::Unset => dim(),
            };
            if i == app.review_ui.round_sel {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                format!("#{}", r.round),
                r.letter.to_string(),
                if r.term.is_empty() {
                    "(no input)".into()
                } else {
                    clip(&r.term, 28)
                },
                format!("{:.1}s", r.time_left),
                format!("{:.1}", r.points),
                r.verification.to_string(),
            ])
            .style(style)
        })
        .collect();
    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(28),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(9),
        ],
    )
    .header(Row::new(vec!["rnd", "ltr", "term", "time", "pts", "state"]).style(bold()))
    .render(chunks[2], buf);

    if let Some(status) = &app.review_ui.status {
        centered_line(status.clone(), dim().fg(Color::Yellow), chunks[3], buf);
    }
    centered_line(
        "a accept · x reject · ↑↓ round · esc back".into(),
        dim(),
        chunks[4],
        buf,
    );
}
