//! Daily todo list: tasks with optional due dates, daily reminders and
//! monthly completion stats, behind a terminal UI and a small CLI.

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod daemon;
pub mod dates;
pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod reminder;
pub mod stats;
pub mod storage;
pub mod store;
pub mod todo;
pub mod tui;
pub mod view;
