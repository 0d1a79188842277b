//! Line-oriented reference surface: parses typed commands and renders the view.
//!
//! Positions typed by the user are 1-based indexes into the visible list, the
//! same thing a click or a drag targets in a graphical surface.

use crate::events::ViewPayload;
use crate::models::{SortDirection, StatusFilter};

pub const NO_DATE_LABEL: &str = "no date";
pub const EMPTY_NOTE: &str = "No tasks...";

pub const HELP: &str = "\
commands:
  add <title> [@YYYY-MM-DD]       add a task
  edit <n> [title] [@date|@-]     edit task n (blank title keeps it, @- clears the date)
  done <n>                        toggle task n
  rm <n>                          delete task n
  search [text]                   search titles (empty clears)
  filter all|active|done          show a subset
  sort                            flip date sort direction
  move <from> <to>                drag task <from> to position <to>
  list | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    Add { title: String, date: Option<String> },
    Edit { index: usize, title: String, date: DateInput },
    Toggle(usize),
    Remove(usize),
    Search(String),
    Filter(StatusFilter),
    Sort,
    Move { from: usize, to: usize },
    List,
    Help,
    Quit,
}

/// Date part of an edit; the edit form starts out holding the current date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Keep,
    Clear,
    Set(String),
}

impl DateInput {
    /// The date to submit, given the task's current one.
    pub fn resolve(self, current: Option<&str>) -> Option<String> {
        match self {
            DateInput::Keep => current.map(str::to_string),
            DateInput::Clear => None,
            DateInput::Set(date) => Some(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Empty,
    Unknown(String),
    Usage(&'static str),
    BadIndex(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Empty => write!(f, "empty command"),
            SurfaceError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            SurfaceError::Usage(usage) => write!(f, "usage: {usage}"),
            SurfaceError::BadIndex(value) => write!(f, "not a task number: {value}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

pub fn parse_command(line: &str) -> Result<SurfaceCommand, SurfaceError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_lowercase().as_str() {
        "" => Err(SurfaceError::Empty),
        "add" => {
            let (title, date) = split_date(rest);
            if title.is_empty() {
                return Err(SurfaceError::Usage("add <title> [@YYYY-MM-DD]"));
            }
            Ok(SurfaceCommand::Add {
                title,
                date: date.filter(|d| !d.is_empty()),
            })
        }
        "edit" => {
            let (index, rest) = match rest.split_once(char::is_whitespace) {
                Some((index, rest)) => (index, rest.trim()),
                None => (rest, ""),
            };
            if index.is_empty() {
                return Err(SurfaceError::Usage("edit <n> [title] [@date|@-]"));
            }
            let index = parse_index(index)?;
            let (title, date) = split_date(rest);
            let date = match date {
                None => DateInput::Keep,
                Some(date) if date.is_empty() || date == "-" => DateInput::Clear,
                Some(date) => DateInput::Set(date),
            };
            Ok(SurfaceCommand::Edit { index, title, date })
        }
        "done" => single_index(rest, "done <n>").map(SurfaceCommand::Toggle),
        "rm" => single_index(rest, "rm <n>").map(SurfaceCommand::Remove),
        "search" => Ok(SurfaceCommand::Search(rest.to_string())),
        "filter" => rest
            .parse::<StatusFilter>()
            .map(SurfaceCommand::Filter)
            .map_err(|_| SurfaceError::Usage("filter all|active|done")),
        "sort" => Ok(SurfaceCommand::Sort),
        "move" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(from), Some(to), None) => Ok(SurfaceCommand::Move {
                    from: parse_index(from)?,
                    to: parse_index(to)?,
                }),
                _ => Err(SurfaceError::Usage("move <from> <to>")),
            }
        }
        "list" | "ls" => Ok(SurfaceCommand::List),
        "help" | "?" => Ok(SurfaceCommand::Help),
        "quit" | "exit" | "q" => Ok(SurfaceCommand::Quit),
        other => Err(SurfaceError::Unknown(other.to_string())),
    }
}

/// Splits a trailing `@date` token off a title.
///
/// Only a last word that starts with `@` counts, so `bob@example.com` stays
/// part of the title.
fn split_date(rest: &str) -> (String, Option<String>) {
    let rest = rest.trim();
    let (title, last) = rest.rsplit_once(char::is_whitespace).unwrap_or(("", rest));
    match last.strip_prefix('@') {
        Some(date) => (title.trim().to_string(), Some(date.to_string())),
        None => (rest.to_string(), None),
    }
}

fn single_index(rest: &str, usage: &'static str) -> Result<usize, SurfaceError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(SurfaceError::Usage(usage));
    }
    parse_index(rest)
}

fn parse_index(value: &str) -> Result<usize, SurfaceError> {
    match value.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index),
        _ => Err(SurfaceError::BadIndex(value.to_string())),
    }
}

/// The visible order after dragging the task at `from` to position `to`.
///
/// Both positions are 1-based; `to` is clamped to the end of the list.
/// Returns `None` when `from` points past the list.
pub fn move_visible(ids: &[String], from: usize, to: usize) -> Option<Vec<String>> {
    if from == 0 || from > ids.len() {
        return None;
    }
    let mut next = ids.to_vec();
    let moved = next.remove(from - 1);
    let to = to.clamp(1, ids.len());
    next.insert(to - 1, moved);
    Some(next)
}

pub fn render_view(payload: &ViewPayload) -> String {
    let mut out = String::new();
    let arrow = match payload.query.sort {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    out.push_str(&format!(
        "filter={} sort={arrow} shown={}/{}",
        payload.query.filter.as_str(),
        payload.visible.len(),
        payload.total
    ));
    if !payload.query.search.is_empty() {
        out.push_str(&format!(" search={:?}", payload.query.search));
    }
    out.push('\n');

    if payload.empty {
        out.push_str(EMPTY_NOTE);
        out.push('\n');
        return out;
    }
    for (index, task) in payload.visible.iter().enumerate() {
        let mark = if task.done { "x" } else { " " };
        let date = task.date.as_deref().unwrap_or(NO_DATE_LABEL);
        out.push_str(&format!(
            "{:>3}. [{mark}] {}  ({date})\n",
            index + 1,
            task.title
        ));
    }
    out
}
