//! Command-line front end. Every subcommand opens the store, runs one
//! operation and exits; without a subcommand the TUI starts instead.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::format::due_line;
use crate::store::{DueDateEdit, TodoStore};
use crate::todo::Task;

#[derive(Parser, Debug)]
#[command(name = "daily-todo")]
#[command(about = "Daily todo list with due dates, reminders and monthly stats")]
#[command(version)]
pub struct Cli {
    /// Directory holding tasks.json and reminders.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Add a task
    Add {
        text: String,
        /// Due date (YYYY-MM-DD, "YYYY-MM-DD HH:MM", tomorrow, friday, in 3 days)
        #[arg(short, long)]
        due: Option<String>,
    },
    /// List tasks grouped as overdue, pending and completed
    List,
    /// Toggle a task between pending and completed
    Done { id: i64 },
    /// Change a task's text or due date
    Edit {
        id: i64,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a task
    Rm {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Set a daily reminder (HH:MM)
    Remind { time: String },
    /// List active reminders
    Reminders,
    /// Acknowledge a reminder
    Ack { id: i64 },
    /// Delete a reminder
    Unremind {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show this month's statistics
    Stats,
    /// Run the reminder loop without a UI, sending desktop notifications
    Daemon,
}

pub fn due_edit(due: Option<String>, clear_due: bool) -> DueDateEdit {
    match (due, clear_due) {
        (_, true) => DueDateEdit::Clear,
        (Some(due), false) => DueDateEdit::SetTo(due),
        (None, false) => DueDateEdit::Unchanged,
    }
}

/// Runs one non-interactive subcommand against an open store.
pub fn run(command: Commands, store: &mut TodoStore) -> Result<()> {
    match command {
        Commands::Add { text, due } => {
            let task = store.add_task(&text, due.as_deref())?;
            println!("✓ Added task {}: {}", task.id, task.text);
        }
        Commands::List => print_tasks(store),
        Commands::Done { id } => match store.toggle_task(id)? {
            Some(task) if task.completed => println!("✓ Completed: {}", task.text),
            Some(task) => println!("Reopened: {}", task.text),
            None => bail!("Task not found: {}", id),
        },
        Commands::Edit {
            id,
            text,
            due,
            clear_due,
        } => {
            if text.is_none() && due.is_none() && !clear_due {
                bail!("Nothing to change: pass --text, --due or --clear-due");
            }
            match store.edit_task(id, text.as_deref(), due_edit(due, clear_due))? {
                Some(task) => println!("✓ Updated task {}: {}", task.id, task.text),
                None => bail!("Task not found: {}", id),
            }
        }
        Commands::Rm { id, yes } => {
            let Some(task) = store.task(id) else {
                bail!("Task not found: {}", id);
            };
            let prompt = format!("Delete task '{}'?", task.text);
            if !yes && !confirm(&prompt)? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_task(id)?;
            println!("✓ Deleted task {}", id);
        }
        Commands::Remind { time } => {
            let reminder = store.set_reminder(&time)?;
            println!("✓ Reminder {} set for {}", reminder.id, reminder.time);
        }
        Commands::Reminders => {
            let reminders = store.active_reminders();
            if reminders.is_empty() {
                println!("No reminders set.");
            }
            for r in reminders {
                let state = if r.triggered { "  (fired)" } else { "" };
                println!("{:>14}  {}{}", r.id, r.time, state);
            }
        }
        Commands::Ack { id } => {
            if !store.complete_reminder(id)? {
                bail!("Reminder not found: {}", id);
            }
            println!("✓ Reminder {} done", id);
        }
        Commands::Unremind { id, yes } => {
            if store.reminder(id).is_none() {
                bail!("Reminder not found: {}", id);
            }
            if !yes && !confirm("Are you sure you want to delete this reminder?")? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_reminder(id)?;
            println!("✓ Deleted reminder {}", id);
        }
        Commands::Stats => {
            let stats = store.stats();
            println!("Completed this month: {}", stats.monthly_completed);
            println!("Total tasks:          {}", stats.total_tasks);
            println!("Completion rate:      {}%", stats.completion_rate);
        }
        Commands::Daemon => bail!("the daemon runs from main, not as a one-shot command"),
    }
    Ok(())
}

fn print_tasks(store: &TodoStore) {
    let now = store.clock().now().with_timezone(&Local);
    let view = store.categorized();
    if view.is_empty() {
        println!("No tasks yet. Add one with: daily-todo add \"...\"");
        return;
    }
    for (name, tasks) in [
        ("OVERDUE", &view.overdue),
        ("PENDING", &view.pending),
        ("COMPLETED", &view.completed),
    ] {
        if tasks.is_empty() {
            continue;
        }
        println!("{} ({})", name, tasks.len());
        for task in tasks {
            println!("{}", task_row(task, &now));
        }
        println!();
    }
}

fn task_row(task: &Task, now: &chrono::DateTime<Local>) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let mut row = format!("{:>14}  {} {}", task.id, mark, task.text);
    if let Some(due) = task.due_date.as_ref() {
        row.push_str("  ");
        row.push_str(&due_line(due, now));
    }
    row
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn store() -> TodoStore {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        TodoStore::open(MemoryStore::new(), clock, ()).unwrap()
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["daily-todo"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.data_dir, None);
    }

    #[test]
    fn test_global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["daily-todo", "list", "--data-dir", "/tmp/todos"]).unwrap();
        assert_eq!(cli.command, Some(Commands::List));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/todos")));
    }

    #[test]
    fn test_parse_add_with_due() {
        let cli = Cli::try_parse_from(["daily-todo", "add", "buy milk", "--due", "tomorrow"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Add {
                text: "buy milk".to_string(),
                due: Some("tomorrow".to_string()),
            })
        );
    }

    #[test]
    fn test_due_and_clear_due_conflict() {
        let result = Cli::try_parse_from(["daily-todo", "edit", "1", "--due", "friday", "--clear-due"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_due_edit_mapping() {
        assert_eq!(due_edit(None, false), DueDateEdit::Unchanged);
        assert_eq!(due_edit(None, true), DueDateEdit::Clear);
        assert_eq!(
            due_edit(Some("2024-07-01".to_string()), false),
            DueDateEdit::SetTo("2024-07-01".to_string())
        );
    }

    #[test]
    fn test_run_add_done_rm() {
        let mut store = store();
        run(
            Commands::Add {
                text: "write report".to_string(),
                due: None,
            },
            &mut store,
        )
        .unwrap();
        let id = store.tasks()[0].id;

        run(Commands::Done { id }, &mut store).unwrap();
        assert!(store.tasks()[0].completed);

        run(Commands::Rm { id, yes: true }, &mut store).unwrap();
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_run_reports_missing_ids() {
        let mut store = store();
        assert!(run(Commands::Done { id: 42 }, &mut store).is_err());
        assert!(run(Commands::Ack { id: 42 }, &mut store).is_err());
        assert!(run(Commands::Rm { id: 42, yes: true }, &mut store).is_err());
    }

    #[test]
    fn test_run_edit_requires_a_change() {
        let mut store = store();
        let task = store.add_task("draft", None).unwrap();
        let err = run(
            Commands::Edit {
                id: task.id,
                text: None,
                due: None,
                clear_due: false,
            },
            &mut store,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_run_rejects_empty_text() {
        let mut store = store();
        let err = run(
            Commands::Add {
                text: "   ".to_string(),
                due: None,
            },
            &mut store,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Please enter a task");
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_task_row_shows_due_line() {
        let mut store = store();
        let task = store.add_task("pay rent", Some("2024-06-16")).unwrap();
        let now = store.clock().now().with_timezone(&Local);
        let row = task_row(&task, &now);
        assert!(row.contains("[ ] pay rent"));
        assert!(row.contains("Due: "));
    }
}
