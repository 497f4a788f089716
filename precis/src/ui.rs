use crate::app::{App, AppMode, ParamField};
use precis::timer::format_clock;
use precis_ipc::{Phase, RequestState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, chunks[0], app);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(chunks[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(3),
        ])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    draw_timer(f, left[0], app);
    draw_params(f, left[1], app);
    draw_notes(f, left[2], app);
    draw_source(f, right[0], app);
    draw_abstractive(f, right[1], app);
    draw_extractive(f, right[2], app);
    draw_request_line(f, right[3], app);
    draw_status_bar(f, chunks[2], app);

    if app.view.focus.banner_visible {
        draw_focus_banner(f, app);
    }
    if app.mode == AppMode::ShowHelp {
        draw_help_overlay(f, app);
    }
}

fn panel<'a>(title: String, app: &App, active: bool) -> Block<'a> {
    let theme = &app.config.theme;
    Block::default()
        .title(Span::styled(title, Style::default().fg(theme.gray)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if active { theme.selection } else { theme.green }))
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let text = Line::from(vec![
        Span::raw(icons.header_left.clone()),
        Span::styled(
            "PRECIS",
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw(icons.header_right.clone()),
    ]);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.black)),
        ),
        area,
    );
}

fn draw_timer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let timer = &app.view.timer;
    let phase_color = match timer.phase {
        Phase::Work => theme.red,
        Phase::Break => theme.cyan,
    };
    let block = panel(
        format!(" {} Pomodoro ({}) ", icons.timer, timer.phase.label()),
        app,
        false,
    );
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner_area);
    let state_icon = if timer.running { &icons.play } else { &icons.pause };
    f.render_widget(
        Paragraph::new(format!("{} {}", state_icon, format_clock(timer.remaining)))
            .style(Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        v_chunks[0],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(phase_color).bg(theme.black))
            .percent((app.view.progress * 100.0) as u16),
        v_chunks[1],
    );
    f.render_widget(
        Paragraph::new(format!(
            "Work: {}m {} Break: {}m",
            app.view.work_secs / 60,
            icons.separator,
            app.view.break_secs / 60
        ))
        .style(Style::default().fg(theme.gray))
        .alignment(Alignment::Center),
        v_chunks[2],
    );
}

fn draw_params(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let editing = match app.mode {
        AppMode::EditingParam(field) => Some(field),
        _ => None,
    };
    let block = panel(" Generation ".to_string(), app, editing.is_some());
    let lines: Vec<Line> = ParamField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let active = editing == Some(*field);
            let mut spans = vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(theme.blue)),
                Span::styled(
                    format!("{:<13}", field.label()),
                    Style::default().fg(theme.gray),
                ),
                Span::styled(
                    app.param(*field).to_string(),
                    if active {
                        Style::default().fg(theme.selection).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(theme.foreground)
                    },
                ),
            ];
            if active {
                spans.push(cursor(app));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_notes(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let editing = app.mode == AppMode::EditingNotes;
    let block = panel(
        format!(" {} Scratch Notes ", app.config.icons.notes),
        app,
        editing,
    );
    let mut text = vec![Line::from(Span::styled(
        app.notes.clone(),
        Style::default().fg(theme.foreground),
    ))];
    if app.notes.is_empty() && !editing {
        text = vec![Line::from(Span::styled(
            "Quick notes (saved locally). Press 'm' to edit.",
            Style::default().fg(theme.gray),
        ))];
    } else if editing {
        text.push(Line::from(cursor(app)));
    }
    f.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_source(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let editing = app.mode == AppMode::EditingText;
    let block = panel(" Input text ".to_string(), app, editing);
    let lines: Vec<Line> = if app.form.text.is_empty() && !editing {
        vec![Line::from(Span::styled(
            "Paste article or long text here... (press 'i')",
            Style::default().fg(theme.gray),
        ))]
    } else {
        let mut lines: Vec<Line> = app
            .form
            .text
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.foreground))))
            .collect();
        if editing {
            if let Some(last) = lines.last_mut() {
                last.spans.push(cursor(app));
            }
        }
        lines
    };
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_abstractive(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let block = panel(
        format!(" {} Abstractive Summary (y) ", app.config.icons.summary),
        app,
        false,
    );
    let (text, style) = if app.view.is_loading() {
        ("Summarizing...".to_string(), Style::default().fg(theme.yellow))
    } else {
        match app.view.summary.as_ref().map(|s| s.abstractive.as_str()) {
            Some(text) if !text.is_empty() => {
                (text.to_string(), Style::default().fg(theme.foreground))
            }
            _ => (
                "(no abstractive summary yet)".to_string(),
                Style::default().fg(theme.gray),
            ),
        }
    };
    f.render_widget(
        Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn draw_extractive(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let block = panel(
        format!(" {} Extractive, original sentences (Y) ", app.config.icons.summary),
        app,
        false,
    );
    let mut lines = vec![];
    match app.view.summary.as_ref() {
        Some(summary) if !summary.extractive.is_empty() => lines.push(Line::from(Span::styled(
            summary.extractive.clone(),
            Style::default().fg(theme.foreground),
        ))),
        _ => lines.push(Line::from(Span::styled(
            "(no extractive summary yet)",
            Style::default().fg(theme.gray),
        ))),
    }
    if let Some(summary) = app.view.summary.as_ref() {
        if let Some(note) = &summary.note {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                note.clone(),
                Style::default().fg(theme.yellow),
            )));
        }
        if let Some(params) = &summary.used_params {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Used generation params: ", Style::default().fg(theme.gray)),
                Span::styled(params.to_string(), Style::default().fg(theme.magenta)),
            ]));
        }
    }
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_request_line(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let (text, color) = match app.view.request_state {
        RequestState::Idle => ("Ready. Ctrl+S or 's' to summarize.".to_string(), theme.gray),
        RequestState::Validating => ("Checking input...".to_string(), theme.yellow),
        RequestState::InFlight => (
            format!("Summarizing (request #{})...", app.view.request_id.unwrap_or_default()),
            theme.yellow,
        ),
        RequestState::Succeeded => ("Done.".to_string(), theme.green),
        RequestState::Failed => (
            app.view
                .error
                .clone()
                .unwrap_or_else(|| "Request failed.".to_string()),
            theme.red,
        ),
    };
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(panel(" Request ".to_string(), app, false)),
        area,
    );
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let (mode_text, mode_color) = match app.mode {
        AppMode::Normal => ("NORMAL", theme.green),
        AppMode::EditingText => ("INSERT", theme.yellow),
        AppMode::EditingParam(_) => ("PARAM", theme.blue),
        AppMode::EditingNotes => ("NOTES", theme.magenta),
        AppMode::ShowHelp => ("HELP", theme.magenta),
    };
    let help = match app.mode {
        AppMode::Normal => concat!(
            "i:edit │ s:summarize │ y:copy │ c:clear │ space:start/pause │ ",
            "r:reset │ n:skip │ m:notes │ ?:help │ q:quit"
        ),
        AppMode::EditingParam(_) => "tab:next │ enter/esc:done",
        _ => "ctrl+s:summarize │ esc:done",
    };
    let focus = &app.view.focus;
    let away = if focus.enabled {
        format!(" {} {} away ", app.config.icons.away, focus.away_count)
    } else {
        " focus off ".to_string()
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(help),
            Span::raw(" "),
            Span::styled(away, Style::default().fg(theme.yellow)),
        ]))
        .block(Block::default().style(Style::default().bg(theme.black).fg(theme.gray))),
        area,
    );
}

fn draw_focus_banner(f: &mut Frame, app: &App) {
    let theme = &app.config.theme;
    let full = f.area();
    let width = 44.min(full.width);
    let area = Rect::new(
        full.right().saturating_sub(width + 1),
        full.y + 1,
        width,
        4.min(full.height),
    );
    f.render_widget(Clear, area);
    let since = app
        .view
        .last_away_at
        .map(|at| format!(" (left at {})", at.format("%H:%M")))
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                format!("You left the page{} - stay focused!", since),
                Style::default().fg(theme.yellow),
            )),
            Line::from(Span::styled("x: dismiss", Style::default().fg(theme.gray))),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.yellow))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn draw_help_overlay(f: &mut Frame, app: &App) {
    let theme = &app.config.theme;
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let shortcuts = [
        (
            "Summarize",
            vec![
                ("i / e", "Edit input text"),
                ("1-4", "Edit generation parameter"),
                ("s, Ctrl+S", "Summarize"),
                ("c", "Clear input and result"),
                ("y / Y", "Copy abstractive / extractive"),
            ],
        ),
        (
            "Timer",
            vec![
                ("Space", "Start / pause"),
                ("r", "Reset phase"),
                ("n", "Skip to next phase"),
            ],
        ),
        (
            "Focus & notes",
            vec![
                ("x", "Dismiss banner"),
                ("f", "Toggle focus monitor"),
                ("m", "Edit notes"),
                ("C", "Clear notes"),
                ("q", "Quit"),
            ],
        ),
    ];
    let mut lines = vec![];
    for (section, keys) in shortcuts {
        lines.push(Line::from(Span::styled(
            section,
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        )));
        for (key, action) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<10}", key), Style::default().fg(theme.selection)),
                Span::styled(action, Style::default().fg(theme.foreground)),
            ]));
        }
        lines.push(Line::from(""));
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.magenta))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn cursor(app: &App) -> Span<'static> {
    Span::styled(
        app.config.icons.input_cursor.clone(),
        Style::default()
            .fg(app.config.theme.foreground)
            .add_modifier(Modifier::SLOW_BLINK),
    )
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
