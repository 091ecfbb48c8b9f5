use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::api::models::{Batch, BatchStatus};
use crate::app::{App, AuthForm, AuthMode, TextInput};
use crate::batches::BatchBoard;
use crate::guard::Route;
use crate::validation::{Field, ValidationErrors};

mod overlays;
mod theme;
use theme::*;

const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 18;

fn cell_width(text: &str) -> u16 {
    UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
}

pub fn render(f: &mut Frame<'_>, app: &App) {
    let size = f.size();
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let block = Paragraph::new(format!(
            "Terminal too small, resize to at least {MIN_WIDTH}x{MIN_HEIGHT}."
        ))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("Distributo")
                .borders(Borders::ALL)
                .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
        )
        .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);

    render_top_bar(f, app, vertical[0]);
    match app.route {
        Route::Login => render_auth(f, &app.login, vertical[1]),
        Route::Register => render_auth(f, &app.register, vertical[1]),
        Route::Dashboard => render_dashboard(f, app, vertical[1]),
        Route::Agents => render_agents(f, app, vertical[1]),
        Route::Lists => render_lists(f, app, vertical[1]),
    }
    render_status_bar(f, app, vertical[2]);

    if app.overlay.is_some() {
        overlays::render_overlay(f, app);
    }
}

fn render_top_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let bar_style = Style::default().fg(BAR_TEXT).bg(BAR_BG);

    let mut spans = vec![Span::styled(
        " Distributo ",
        bar_style.add_modifier(Modifier::BOLD),
    )];
    if app.session.is_authenticated() {
        for (idx, route) in Route::NAVIGATION.iter().enumerate() {
            let label = format!("[F{} {}]", idx + 1, route.title());
            let style = if *route == app.route {
                Style::default()
                    .fg(BAR_HIGHLIGHT_TEXT)
                    .bg(BAR_HIGHLIGHT_BG)
                    .add_modifier(Modifier::BOLD)
            } else {
                bar_style
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::styled(" ", bar_style));
        }
    } else {
        spans.push(Span::styled(app.route.title(), bar_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), area);

    if let Some(user) = app.session.current_user() {
        let text = format!("Signed in as: {} ", user.email);
        let width = cell_width(&text).min(area.width);
        let right = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: 1,
        };
        f.render_widget(Paragraph::new(text).style(bar_style), right);
    }
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let hints = match (app.route, app.overlay.is_some()) {
        (_, true) => "Esc close",
        (Route::Login, _) => "Enter sign in · Ctrl+R register · Ctrl+Q quit",
        (Route::Register, _) => "Enter register · Esc back · Ctrl+Q quit",
        (Route::Dashboard, _) => "r refresh · a agents · l lists · Ctrl+L logout",
        (Route::Agents, _) => "n new · e edit · d delete · r refresh · Ctrl+L logout",
        (Route::Lists, _) => {
            "Enter actions · u upload · f filter · a agent lists · r refresh · Ctrl+L logout"
        }
    };
    let mut spans = Vec::new();
    if app.is_busy() {
        spans.push(Span::styled(
            "[Loading…] ",
            Style::default().fg(BAR_HIGHLIGHT_TEXT).bg(BAR_BG).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        app.status_message.as_str(),
        Style::default().fg(BAR_TEXT).bg(BAR_BG),
    ));
    spans.push(Span::styled(
        format!("  {hints}"),
        Style::default().fg(FG_DIM).bg(BAR_BG),
    ));
    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Splits off a one-line banner for an error or success message, when there
/// is one, and returns the remaining area.
fn render_banner(f: &mut Frame<'_>, area: Rect, error: Option<&str>, notice: Option<&str>) -> Rect {
    let (text, color) = match (error, notice) {
        (Some(error), _) => (format!("✖ {error}  (Esc to dismiss)"), ERROR_FG),
        (None, Some(notice)) => (format!("✔ {notice}"), SUCCESS_FG),
        (None, None) => return area,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(color).bg(BG_PANEL)),
        chunks[0],
    );
    chunks[1]
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .style(Style::default().bg(BG_PANEL).fg(FG_PRIMARY))
}

/// One labelled text field. Returns the cursor position when focused.
pub(crate) fn render_field(
    f: &mut Frame<'_>,
    area: Rect,
    label: &str,
    input: &TextInput,
    focused: bool,
    error: Option<&str>,
) -> Option<(u16, u16)> {
    let label_width = 18u16.min(area.width);
    let label_style = if focused {
        Style::default().fg(BORDER_FOCUS).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(FG_DIM)
    };
    let mut spans = vec![
        Span::styled(format!("{label:<17}"), label_style),
        Span::styled(input.display(), Style::default().fg(Color::White)),
    ];
    if let Some(error) = error {
        spans.push(Span::styled(format!("  {error}"), Style::default().fg(ERROR_FG)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
    focused.then(|| {
        let x = area.x + label_width.saturating_sub(1) + input.cursor_column();
        (x.min(area.x + area.width.saturating_sub(1)), area.y)
    })
}

fn field_error(errors: &ValidationErrors, field: Field) -> Option<&str> {
    errors.for_field(field)
}

fn render_auth(f: &mut Frame<'_>, form: &AuthForm, area: Rect) {
    let box_area = centered_rect(70, 60, area);
    let title = match form.mode {
        AuthMode::Login => "Sign in to Distributo",
        AuthMode::Register => "Create an account",
    };
    let block = panel(title).border_style(Style::default().fg(BORDER_FOCUS));
    let inner = block.inner(box_area);
    f.render_widget(Clear, box_area);
    f.render_widget(block, box_area);

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
    constraints.extend(form.fields().iter().map(|_| Constraint::Length(1)));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    if let Some(notice) = form.notice.as_deref() {
        f.render_widget(
            Paragraph::new(notice).style(Style::default().fg(SUCCESS_FG)),
            rows[0],
        );
    }

    let mut cursor = None;
    for (idx, (field, input)) in form.fields().into_iter().enumerate() {
        let focused = idx == form.focus;
        let at = render_field(
            f,
            rows[idx + 2],
            field.label(),
            input,
            focused,
            field_error(&form.errors, field),
        );
        if at.is_some() {
            cursor = at;
        }
    }

    let footer_row = rows[form.fields().len() + 2];
    let footer = if form.submitting {
        Paragraph::new(match form.mode {
            AuthMode::Login => "Signing in…",
            AuthMode::Register => "Creating account…",
        })
        .style(Style::default().fg(FG_DIM))
    } else if let Some(error) = form.error.as_deref() {
        Paragraph::new(error).style(Style::default().fg(ERROR_FG))
    } else {
        Paragraph::new(match form.mode {
            AuthMode::Login => "Don't have an account? Press Ctrl+R to register.",
            AuthMode::Register => "Already have an account? Press Esc to sign in.",
        })
        .style(Style::default().fg(FG_DIM))
    };
    f.render_widget(footer.wrap(Wrap { trim: true }), footer_row);

    if let Some((x, y)) = cursor
        && !form.submitting
    {
        f.set_cursor(x, y);
    }
}

fn render_dashboard(f: &mut Frame<'_>, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let area = render_banner(f, area, dashboard.error(), None);
    let block = panel("Dashboard");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let count = |value: Option<usize>| match (value, dashboard.is_loading()) {
        (_, true) => String::from("…"),
        (Some(n), false) => n.to_string(),
        (None, false) => String::from("-"),
    };
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total agents    ", Style::default().fg(FG_DIM)),
            Span::styled(
                count(dashboard.agent_count()),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Total batches   ", Style::default().fg(FG_DIM)),
            Span::styled(
                count(dashboard.batch_count()),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Press a to manage agents or l to upload and track contact lists.",
            Style::default().fg(FG_DIM),
        )),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_agents(f: &mut Frame<'_>, app: &App, area: Rect) {
    let registry = &app.registry;
    let area = render_banner(f, area, registry.error(), None);
    let title = format!("Agents ({})", registry.count());
    let block = panel(&title);

    if registry.is_loading() && registry.agents().is_empty() {
        f.render_widget(
            Paragraph::new("Loading agents…").block(block).style(Style::default().fg(FG_DIM)),
            area,
        );
        return;
    }
    if registry.agents().is_empty() {
        f.render_widget(
            Paragraph::new(
                "You haven't added any agents yet. Press n to add your first agent.",
            )
            .wrap(Wrap { trim: true })
            .block(block)
            .style(Style::default().fg(FG_DIM)),
            area,
        );
        return;
    }

    let rows = registry.agents().iter().map(|agent| {
        Row::new(vec![
            Cell::from(agent.name.as_str()),
            Cell::from(agent.email.as_str()),
            Cell::from(agent.mobile.as_str()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ],
    )
    .header(
        Row::new(vec!["Name", "Email", "Mobile"])
            .style(Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .highlight_style(Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black))
    .highlight_symbol("▸ ");
    let mut state = TableState::default().with_selected(Some(registry.selected_index()));
    f.render_stateful_widget(table, area, &mut state);
}

pub(crate) fn status_color(status: BatchStatus) -> Color {
    match status {
        BatchStatus::Pending => STATUS_PENDING,
        BatchStatus::Active => STATUS_ACTIVE,
        BatchStatus::Completed => STATUS_COMPLETED,
        BatchStatus::Archived => STATUS_ARCHIVED,
        BatchStatus::Cancelled => STATUS_CANCELLED,
    }
}

pub(crate) fn format_created(batch: &Batch) -> String {
    batch
        .created_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .or_else(|| batch.created_at.clone())
        .unwrap_or_else(|| String::from("-"))
}

fn render_lists(f: &mut Frame<'_>, app: &App, area: Rect) {
    let board = &app.batches;
    let area = render_banner(f, area, board.error(), board.notice());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    render_lists_header(f, board, chunks[0]);

    let title = format!("Batches ({})", board.count());
    let block = panel(&title);
    if board.batches().is_empty() {
        let text = if board.is_loading() {
            String::from("Loading batches…")
        } else {
            board.empty_message()
        };
        f.render_widget(
            Paragraph::new(text).block(block).style(Style::default().fg(FG_DIM)),
            chunks[1],
        );
        return;
    }

    let rows = board.batches().iter().map(|batch| {
        Row::new(vec![
            Cell::from(batch.filename.clone().unwrap_or_else(|| batch.batch_id.clone())),
            Cell::from(format_created(batch)),
            Cell::from(batch.item_count.to_string()),
            Cell::from(Span::styled(
                batch.status.label(),
                Style::default().fg(status_color(batch.status)),
            )),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(28),
            Constraint::Percentage(12),
            Constraint::Percentage(20),
        ],
    )
    .header(
        Row::new(vec!["File", "Created", "Items", "Status"])
            .style(Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .highlight_style(Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black))
    .highlight_symbol("▸ ");
    let mut state = TableState::default().with_selected(Some(board.selected_index()));
    f.render_stateful_widget(table, chunks[1], &mut state);

    if board.row_menu.open_row.is_some() {
        render_row_menu(f, board, chunks[1]);
    }
}

fn render_lists_header(f: &mut Frame<'_>, board: &BatchBoard, area: Rect) {
    let upload = if board.is_uploading() {
        Span::styled("Uploading…", Style::default().fg(BORDER_FOCUS))
    } else {
        match board.check_upload() {
            Ok(()) => Span::styled("[u] Upload list", Style::default().fg(SUCCESS_FG)),
            Err(err) => Span::styled(format!("Upload disabled: {err}"), Style::default().fg(FG_DIM)),
        }
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(FG_DIM)),
            Span::styled(
                board.filter().label(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Agents: ", Style::default().fg(FG_DIM)),
            Span::styled(board.agents().len().to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(upload),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_row_menu(f: &mut Frame<'_>, board: &BatchBoard, table_area: Rect) {
    let actions = board.open_menu_actions();
    if actions.is_empty() {
        return;
    }
    let width = actions
        .iter()
        .map(|a| cell_width(a.label()))
        .max()
        .unwrap_or(0)
        .saturating_add(6);
    let height = actions.len() as u16 + 2;
    // Header and border take two rows above the first batch.
    let row_y = table_area.y + 2 + board.selected_index() as u16;
    let mut y = row_y.saturating_add(1);
    if y + height > table_area.y + table_area.height {
        y = row_y.saturating_sub(height);
    }
    let area = Rect {
        x: table_area.x + table_area.width.saturating_sub(width + 2),
        y,
        width: width.min(table_area.width),
        height,
    };
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = actions
        .iter()
        .enumerate()
        .map(|(idx, action)| {
            let style = if idx == board.row_menu.cursor {
                Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black)
            } else {
                Style::default().fg(BAR_TEXT)
            };
            ListItem::new(Span::styled(format!(" {} ", action.label()), style))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(MENU_BORDER))
            .style(Style::default().bg(MENU_BG)),
    );
    f.render_widget(list, area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}
