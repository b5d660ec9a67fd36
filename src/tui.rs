// tui.rs

use crate::app::{App, DeleteTarget, Focus, InputMode};
use crate::format::{DueUrgency, due_line, due_urgency, format_date};
use crate::todo::Task;
use chrono::Local;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{io, time::Duration};

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()>
where
    std::io::Error: From<<B as Backend>::Error>,
{
    loop {
        app.drain_events();
        app.expire_status();
        terminal.draw(|f| ui(f, app))?;

        if !crossterm::event::poll(Duration::from_millis(200))? {
            continue;
        }
        let CEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(());
        }

        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') => app.begin_add(),
                KeyCode::Char('e') if app.focus == Focus::Tasks => app.begin_edit_selected(),
                KeyCode::Char('d') => match app.focus {
                    Focus::Tasks => app.toggle_selected(),
                    Focus::Reminders => app.complete_selected_reminder(),
                },
                // Delete selected item (Shift+R only)
                KeyCode::Char('R') => app.request_delete(),
                KeyCode::Char('t') => app.begin_reminder(),
                KeyCode::Char('s') => app.input_mode = InputMode::ViewingStats,
                KeyCode::Tab => app.toggle_focus(),
                KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
                _ => {}
            },
            InputMode::ConfirmDelete => {
                app.confirm_delete(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
            }
            InputMode::ViewingStats => app.input_mode = InputMode::Normal,
            mode => match key.code {
                KeyCode::Enter => match mode {
                    InputMode::AddingText => app.submit_add_text(),
                    InputMode::AddingDueDate => app.submit_add(),
                    InputMode::EditingText => app.submit_edit_text(),
                    InputMode::EditingDueDate => app.submit_edit(),
                    InputMode::SettingReminder => app.submit_reminder(),
                    _ => {}
                },
                KeyCode::Esc => match mode {
                    InputMode::EditingDueDate => app.submit_edit_keep_due(),
                    _ => app.cancel_input(),
                },
                KeyCode::Char(c) => {
                    if let Some(input) = app.active_input() {
                        input.push(c);
                    }
                }
                KeyCode::Backspace => {
                    if let Some(input) = app.active_input() {
                        input.pop();
                    }
                }
                _ => {}
            },
        }
    }
}

fn ui(f: &mut ratatui::Frame<'_>, app: &App) {
    let size = f.area();
    let store = app.lock();
    let now = store.clock().now().with_timezone(&Local);
    let view = store.categorized();
    let stats = store.stats();
    let reminders = store.active_reminders();

    let needs_input = matches!(
        app.input_mode,
        InputMode::AddingText
            | InputMode::AddingDueDate
            | InputMode::EditingText
            | InputMode::EditingDueDate
            | InputMode::SettingReminder
    );
    let mut constraints = vec![
        Constraint::Length(1), // title
        Constraint::Length(1), // help
        Constraint::Min(6),    // lists
    ];
    if needs_input {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(1)); // status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(size);

    let title = Paragraph::new(Line::from(vec![
        Span::styled("Daily Todo", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "   {} pending · {} done this month",
            view.overdue.len() + view.pending.len(),
            stats.monthly_completed
        )),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let b = Style::default().add_modifier(Modifier::BOLD);
    let help = Paragraph::new(Line::from(vec![
        Span::styled("a", b), Span::raw(" add, "),
        Span::styled("e", b), Span::raw(" edit, "),
        Span::styled("d", b), Span::raw(" done, "),
        Span::raw("Shift+"), Span::styled("R", b), Span::raw(" delete, "),
        Span::styled("t", b), Span::raw(" reminder, "),
        Span::styled("Tab", b), Span::raw(" switch, "),
        Span::styled("s", b), Span::raw(" stats, "),
        Span::styled("q", b), Span::raw(" quit"),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[2]);

    let weight = |n: usize| Constraint::Fill(n.max(1) as u16);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            weight(view.overdue.len()),
            weight(view.pending.len()),
            weight(view.completed.len()),
        ])
        .split(columns[0]);

    // Selection runs across all three sections in on-screen order.
    let mut offset = 0;
    let groups = [
        ("Overdue", &view.overdue, "No overdue tasks!"),
        ("Pending", &view.pending, "No pending tasks. Add one to get started!"),
        ("Completed", &view.completed, "No completed tasks yet."),
    ];
    for (i, (name, tasks, empty)) in groups.into_iter().enumerate() {
        let selected = (app.focus == Focus::Tasks)
            .then(|| app.selected.checked_sub(offset))
            .flatten()
            .filter(|&s| s < tasks.len());
        render_section(f, sections[i], name, tasks, empty, selected, &now);
        offset += tasks.len();
    }

    let reminder_items: Vec<ListItem> = if reminders.is_empty() {
        vec![ListItem::new(Span::styled(
            "No reminders set",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        reminders
            .iter()
            .map(|r| {
                let (mark, color) = if r.triggered {
                    ("(fired)", Color::Magenta)
                } else {
                    ("", Color::Cyan)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("⏰ {}", r.time), Style::default().fg(color)),
                    Span::raw(format!(" {}", mark)),
                ]))
            })
            .collect()
    };
    let mut reminder_state = ListState::default();
    if app.focus == Focus::Reminders && !reminders.is_empty() {
        reminder_state.select(Some(app.selected_reminder.min(reminders.len() - 1)));
    }
    let reminder_list = List::new(reminder_items)
        .block(focus_block("Reminders", app.focus == Focus::Reminders))
        .highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(reminder_list, columns[1], &mut reminder_state);

    // Optional single-line input (only when editing)
    if needs_input {
        let title = match app.input_mode {
            InputMode::AddingText => "New task",
            InputMode::AddingDueDate => "Due (YYYY-MM-DD, tomorrow, friday, in 3 days; Enter to skip)",
            InputMode::EditingText => "Edit your task",
            InputMode::EditingDueDate => "Edit due date (empty clears, Esc keeps)",
            _ => "Reminder time (HH:MM)",
        };
        let value = match app.input_mode {
            InputMode::AddingDueDate | InputMode::EditingDueDate => &app.input_due_date,
            _ => &app.input_text,
        };
        let widget = Paragraph::new(format!("{}|", value))
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .wrap(Wrap { trim: true });
        f.render_widget(widget, chunks[chunks.len() - 2]);
    }

    if let Some(ref msg) = app.status {
        let color = if msg.is_error { Color::Red } else { Color::Green };
        let status = Paragraph::new(msg.text.as_str())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[chunks.len() - 1]);
    }

    match app.input_mode {
        InputMode::ViewingStats => {
            let lines = vec![
                Line::from(""),
                Line::from(format!("Completed this month: {}", stats.monthly_completed)),
                Line::from(format!("Total tasks: {}", stats.total_tasks)),
                Line::from(format!("Completion rate: {}%", stats.completion_rate)),
                Line::from(""),
                Line::from(Span::styled("any key to close", Style::default().fg(Color::DarkGray))),
            ];
            popup(f, size, " Monthly Statistics ", lines);
        }
        InputMode::ConfirmDelete => {
            let what = match app.pending_delete {
                Some(DeleteTarget::Reminder(_)) => "reminder",
                _ => "task",
            };
            let lines = vec![
                Line::from(""),
                Line::from(format!("Are you sure you want to delete this {}?", what)),
                Line::from(Span::styled("y / n", b)),
            ];
            popup(f, size, " Confirm ", lines);
        }
        _ => {}
    }
}

fn render_section(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    name: &str,
    tasks: &[&Task],
    empty: &str,
    selected: Option<usize>,
    now: &chrono::DateTime<Local>,
) {
    let title = format!("{} ({})", name, tasks.len());
    let block = focus_block(&title, selected.is_some());

    if tasks.is_empty() {
        let p = Paragraph::new(Span::styled(empty, Style::default().fg(Color::DarkGray)))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = tasks.iter().map(|t| task_item(t, now)).collect();
    let mut state = ListState::default();
    state.select(selected);
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn task_item<'a>(t: &Task, now: &chrono::DateTime<Local>) -> ListItem<'a> {
    let urgency = t.due_date.as_ref().map(|due| due_urgency(due, now));
    let desc_color = if t.completed {
        Color::Green
    } else if urgency == Some(DueUrgency::Overdue) {
        Color::Red
    } else {
        Color::White
    };
    let mut text_style = Style::default().fg(desc_color);
    if t.completed {
        text_style = text_style.add_modifier(Modifier::CROSSED_OUT);
    }
    let status = if t.completed { "[x]" } else { "[ ]" };

    let mut lines = vec![Line::from(Span::styled(format!("{} {}", status, t.text), text_style))];
    let mut meta = vec![Span::styled(
        format!("    Created: {}", format_date(&t.created_date, now)),
        Style::default().fg(Color::DarkGray),
    )];
    if let Some(due) = t.due_date.as_ref() {
        let due_color = match urgency {
            Some(DueUrgency::Overdue) if !t.completed => Color::Red,
            Some(DueUrgency::DueSoon) if !t.completed => Color::Yellow,
            _ => Color::Gray,
        };
        meta.push(Span::styled(
            format!("  {}", due_line(due, now)),
            Style::default().fg(due_color),
        ));
    }
    lines.push(Line::from(meta));
    ListItem::new(lines)
}

fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title.to_string())
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn popup(f: &mut ratatui::Frame<'_>, size: Rect, title: &str, lines: Vec<Line<'_>>) {
    let area = centered(size, 50, 9);
    f.render_widget(Clear, area);
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}

fn centered(size: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(size.width);
    let height = height.min(size.height);
    Rect {
        x: size.x + (size.width - width) / 2,
        y: size.y + (size.height - height) / 2,
        width,
        height,
    }
}
