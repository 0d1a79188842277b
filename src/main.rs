use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use todo_lab_lib::commands::{
    create_task, delete_task, edit_task, load_state, reorder_tasks, set_filter, set_search,
    toggle_sort, toggle_task_done, CommandCtx, CommandResult,
};
use todo_lab_lib::logging::init_logging;
use todo_lab_lib::surface::{move_visible, parse_command, render_view, SurfaceCommand, HELP};
use todo_lab_lib::{AppState, CorruptDataPolicy, FileStore, Storage, ViewPayload};

/// Todo Lab: a small task list kept in a local data directory.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the task slot and log files.
    #[arg(long, default_value = ".todo-lab")]
    data_dir: PathBuf,

    /// Start from an empty list (keeping a copy) when saved tasks can't be read.
    #[arg(long)]
    reset_corrupt: bool,
}

struct TerminalCtx {
    storage: Storage<FileStore>,
}

impl CommandCtx for TerminalCtx {
    type Backend = FileStore;

    fn storage(&self) -> &Storage<FileStore> {
        &self.storage
    }

    fn emit_view_updated(&self, payload: ViewPayload) {
        print!("{}", render_view(&payload));
        let _ = io::stdout().flush();
    }
}

fn report<T>(result: CommandResult<T>) -> Option<T> {
    if let Some(error) = &result.error {
        eprintln!("error: {error}");
    }
    result.data
}

/// Maps a 1-based visible position to a task id.
fn visible_id(state: &AppState, index: usize) -> Option<String> {
    let visible = state.visible();
    let id = index
        .checked_sub(1)
        .and_then(|position| visible.get(position))
        .map(|task| task.id.clone());
    if id.is_none() {
        eprintln!("error: no task #{index} in the current list");
    }
    id
}

fn run_command(ctx: &TerminalCtx, state: &mut AppState, command: SurfaceCommand) {
    match command {
        SurfaceCommand::Add { title, date } => {
            report(create_task(ctx, state, &title, date.as_deref()));
        }
        SurfaceCommand::Edit { index, title, date } => {
            if let Some(id) = visible_id(state, index) {
                let current = state.task(&id).and_then(|task| task.date.clone());
                let date = date.resolve(current.as_deref());
                report(edit_task(ctx, state, &id, &title, date.as_deref()));
            }
        }
        SurfaceCommand::Toggle(index) => {
            if let Some(id) = visible_id(state, index) {
                report(toggle_task_done(ctx, state, &id));
            }
        }
        SurfaceCommand::Remove(index) => {
            if let Some(id) = visible_id(state, index) {
                report(delete_task(ctx, state, &id));
            }
        }
        SurfaceCommand::Search(text) => {
            report(set_search(ctx, state, &text));
        }
        SurfaceCommand::Filter(filter) => {
            report(set_filter(ctx, state, filter));
        }
        SurfaceCommand::Sort => {
            report(toggle_sort(ctx, state));
        }
        SurfaceCommand::Move { from, to } => {
            let visible = ViewPayload::from_state(state).visible_ids();
            match move_visible(&visible, from, to) {
                Some(order) => {
                    report(reorder_tasks(ctx, state, &order));
                }
                None => eprintln!("error: no task #{from} in the current list"),
            }
        }
        SurfaceCommand::List => ctx.emit_view_updated(ViewPayload::from_state(state)),
        SurfaceCommand::Help => println!("{HELP}"),
        SurfaceCommand::Quit => {}
    }
}

fn main() {
    let args = Args::parse();

    let _logger = match init_logging(&args.data_dir) {
        Ok(handle) => Some(handle),
        Err(error) => {
            eprintln!("warning: file logging disabled: {error}");
            None
        }
    };

    let store = FileStore::new(args.data_dir.clone());
    if let Err(error) = store.ensure_dirs() {
        eprintln!("error: cannot use {}: {error}", args.data_dir.display());
        std::process::exit(1);
    }
    let ctx = TerminalCtx {
        storage: Storage::new(store),
    };

    let policy = if args.reset_corrupt {
        CorruptDataPolicy::Reset
    } else {
        CorruptDataPolicy::Fail
    };
    let mut state = AppState::default();
    if report(load_state(&ctx, &mut state, policy)).is_none() {
        eprintln!("hint: rerun with --reset-corrupt to start over (the old data is kept)");
        std::process::exit(1);
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                log::error!("stdin read failed: {error}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(SurfaceCommand::Quit) => break,
            Ok(command) => run_command(&ctx, &mut state, command),
            Err(error) => eprintln!("error: {error}"),
        }
    }
    log::info!("session ended with {} tasks", state.tasks().len());
}
