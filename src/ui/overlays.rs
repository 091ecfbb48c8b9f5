use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use super::theme::*;
use super::{centered_rect, format_created, render_field, status_color};
use crate::app::{
    AgentEditorState, AgentPickerState, App, ConfirmDeleteState, DeleteSubject, OverlayState,
    UploadPromptState,
};
use crate::confirm::ConfirmChoice;
use crate::validation::UPLOAD_EXTENSIONS;

pub(super) fn render_overlay(f: &mut Frame<'_>, app: &App) {
    let Some(overlay) = app.overlay.as_ref() else {
        return;
    };
    match overlay {
        OverlayState::AgentEditor(state) => render_agent_editor(f, app, state),
        OverlayState::ConfirmDelete(state) => render_confirm_delete(f, app, state),
        OverlayState::UploadPrompt(state) => render_upload_prompt(f, app, state),
        OverlayState::BatchDetails { scroll } => render_batch_details(f, app, *scroll),
        OverlayState::AgentPicker(state) => render_agent_picker(f, app, state),
        OverlayState::AgentItems { scroll } => render_agent_items(f, app, *scroll),
    }
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG).fg(FG_PRIMARY))
}

fn open_overlay(f: &mut Frame<'_>, percent_x: u16, percent_y: u16, title: &str) -> Rect {
    let area = centered_rect(percent_x, percent_y, f.size());
    f.render_widget(Clear, area);
    let block = overlay_block(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn render_agent_editor(f: &mut Frame<'_>, app: &App, state: &AgentEditorState) {
    let inner = open_overlay(f, 70, 50, state.title());
    let fields = state.fields();
    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(1)).collect();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(2));
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut cursor = None;
    for (idx, (field, input)) in fields.iter().enumerate() {
        let at = render_field(
            f,
            rows[idx],
            field.label(),
            input,
            idx == state.focus,
            state.errors.for_field(*field),
        );
        if at.is_some() {
            cursor = at;
        }
    }

    let footer = if app.registry.is_saving() {
        Paragraph::new("Saving…").style(Style::default().fg(FG_DIM))
    } else if let Some(error) = state.error.as_deref() {
        Paragraph::new(error).style(Style::default().fg(ERROR_FG))
    } else {
        Paragraph::new(if state.is_create() {
            "Enter create agent · Tab next field · Esc cancel"
        } else {
            "Enter update agent · Tab next field · Esc cancel"
        })
        .style(Style::default().fg(FG_DIM))
    };
    f.render_widget(footer.wrap(Wrap { trim: true }), rows[fields.len() + 1]);

    if let Some((x, y)) = cursor {
        f.set_cursor(x, y);
    }
}

fn render_confirm_delete(f: &mut Frame<'_>, app: &App, state: &ConfirmDeleteState) {
    let (title, subject, detail, committing, error) = match &state.subject {
        DeleteSubject::Agent(agent) => (
            "Delete Agent",
            format!("{} <{}>", agent.name, agent.email),
            "Are you sure you want to delete this agent? This action cannot be undone.",
            app.registry.pending_delete().is_committing(),
            app.registry.error(),
        ),
        DeleteSubject::Batch(batch) => (
            "Delete Batch",
            batch
                .filename
                .clone()
                .unwrap_or_else(|| batch.batch_id.clone()),
            "Are you sure you want to delete this batch? This action cannot be undone. \
             This will permanently delete the batch and all its list items.",
            app.batches.pending_delete().is_committing(),
            app.batches.error(),
        ),
    };
    let inner = open_overlay(f, 60, 40, title);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Deleting: ", Style::default().fg(FG_DIM)),
            Span::styled(subject, Style::default().fg(Color::White)),
        ])),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(FG_DIM)),
        chunks[1],
    );

    let button = |label: &'static str, choice: ConfirmChoice| {
        let style = if state.choice == choice {
            Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BAR_TEXT)
        };
        Span::styled(label, style)
    };
    let buttons = if committing {
        Paragraph::new("Deleting…").style(Style::default().fg(FG_DIM))
    } else {
        Paragraph::new(Line::from(vec![
            button(" [Cancel] ", ConfirmChoice::Cancel),
            Span::raw("  "),
            button(" [Delete] ", ConfirmChoice::Confirm),
        ]))
    };
    f.render_widget(buttons.alignment(Alignment::Center), chunks[2]);

    if let Some(error) = error {
        f.render_widget(
            Paragraph::new(error).style(Style::default().fg(ERROR_FG)),
            chunks[3],
        );
    }
}

fn render_upload_prompt(f: &mut Frame<'_>, app: &App, state: &UploadPromptState) {
    let inner = open_overlay(f, 70, 30, "Upload Contact List");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let formats = UPLOAD_EXTENSIONS
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    f.render_widget(
        Paragraph::new(format!("Path to a {formats} file:")).style(Style::default().fg(FG_DIM)),
        chunks[0],
    );
    let cursor = render_field(f, chunks[1], "File", &state.path, true, None);

    let footer = if app.batches.is_uploading() {
        Paragraph::new("Uploading…").style(Style::default().fg(FG_DIM))
    } else if let Some(error) = state.error.as_deref() {
        Paragraph::new(error).style(Style::default().fg(ERROR_FG))
    } else {
        Paragraph::new("Enter upload · Esc cancel").style(Style::default().fg(FG_DIM))
    };
    f.render_widget(footer, chunks[2]);

    if let Some((x, y)) = cursor {
        f.set_cursor(x, y);
    }
}

fn render_batch_details(f: &mut Frame<'_>, app: &App, scroll: u16) {
    let Some(details) = app.batches.details() else {
        return;
    };
    let inner = open_overlay(f, 80, 80, "Batch Details");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    let mut summary = vec![Line::from(vec![
        Span::styled("Batch: ", Style::default().fg(FG_DIM)),
        Span::styled(details.batch_id.as_str(), Style::default().fg(Color::White)),
    ])];
    if let Some(batch) = details.batch.as_ref() {
        summary.push(Line::from(vec![
            Span::styled("File: ", Style::default().fg(FG_DIM)),
            Span::raw(batch.filename.clone().unwrap_or_default()),
            Span::styled("   Created: ", Style::default().fg(FG_DIM)),
            Span::raw(format_created(batch)),
        ]));
        summary.push(Line::from(vec![
            Span::styled("Status: ", Style::default().fg(FG_DIM)),
            Span::styled(batch.status.label(), Style::default().fg(status_color(batch.status))),
        ]));
    }
    summary.push(Line::from(vec![
        Span::styled("Items: ", Style::default().fg(FG_DIM)),
        Span::raw(details.distribution.total().to_string()),
    ]));
    f.render_widget(Paragraph::new(summary), chunks[0]);

    let mut shares = vec![Span::styled("Shares: ", Style::default().fg(FG_DIM))];
    for (slot, share) in details.distribution.shares().iter().enumerate() {
        let style = if share.extra {
            Style::default().fg(EXTRA_SHARE_FG).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(FG_PRIMARY)
        };
        shares.push(Span::styled(format!("#{} {}  ", slot + 1, share.items), style));
    }
    f.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                details.distribution.note(),
                Style::default().fg(Color::White),
            )),
            Line::from(shares),
        ])
        .wrap(Wrap { trim: true }),
        chunks[1],
    );

    let lines: Vec<Line> = details
        .items
        .iter()
        .map(|item| {
            Line::from(vec![
                Span::styled(format!("{:<20}", item.first_name), Style::default().fg(Color::White)),
                Span::raw(format!("{:<16}", item.phone)),
                Span::styled(
                    format!("{:<18}", item.assignee_name()),
                    Style::default().fg(BORDER_FOCUS),
                ),
                Span::styled(
                    item.notes.clone().unwrap_or_default(),
                    Style::default().fg(FG_DIM),
                ),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines)
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::TOP).title("Name / Phone / Agent / Notes")),
        chunks[2],
    );
}

fn render_agent_picker(f: &mut Frame<'_>, app: &App, state: &AgentPickerState) {
    let inner = open_overlay(f, 50, 50, "View Agent Lists");
    let items: Vec<ListItem> = app
        .batches
        .agents()
        .iter()
        .enumerate()
        .map(|(idx, agent)| {
            let style = if idx == state.selected {
                Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black)
            } else {
                Style::default().fg(BAR_TEXT)
            };
            ListItem::new(Span::styled(format!(" {} ({})", agent.name, agent.email), style))
        })
        .collect();
    f.render_widget(List::new(items), inner);
}

fn render_agent_items(f: &mut Frame<'_>, app: &App, scroll: u16) {
    let Some(agent) = app.batches.selected_agent() else {
        return;
    };
    let title = format!("Lists for {}", agent.name);
    let inner = open_overlay(f, 80, 70, &title);
    let items = app.batches.agent_items(&agent.id).unwrap_or_default();
    if items.is_empty() {
        f.render_widget(
            Paragraph::new("No list items assigned to this agent.")
                .style(Style::default().fg(FG_DIM)),
            inner,
        );
        return;
    }
    let lines: Vec<Line> = items
        .iter()
        .map(|item| {
            Line::from(vec![
                Span::styled(format!("{:<20}", item.first_name), Style::default().fg(Color::White)),
                Span::raw(format!("{:<16}", item.phone)),
                Span::styled(
                    item.batch_id.clone().unwrap_or_default(),
                    Style::default().fg(FG_DIM),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}
