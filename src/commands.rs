use crate::events::{ViewPayload, EVENT_VIEW_UPDATED};
use crate::models::{CorruptDataPolicy, StatusFilter, Task};
use crate::state::AppState;
use crate::storage::{KeyValueStore, LoadOutcome, Storage, StorageError};

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Everything a command needs from the outside: the slot to write through
/// and somewhere to deliver the recomputed view.
pub trait CommandCtx {
    type Backend: KeyValueStore;

    fn storage(&self) -> &Storage<Self::Backend>;
    fn emit_view_updated(&self, payload: ViewPayload);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn notify(ctx: &impl CommandCtx, state: &AppState) -> ViewPayload {
    let payload = ViewPayload::from_state(state);
    log::debug!(
        "emit {EVENT_VIEW_UPDATED} visible={} total={}",
        payload.visible.len(),
        payload.total
    );
    ctx.emit_view_updated(payload.clone());
    payload
}

fn persist(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    ctx.storage().save_tasks(state.tasks())?;
    notify(ctx, state);
    Ok(())
}

/// Writes the mutated collection; on failure puts `snapshot` back so memory
/// and storage still agree.
fn commit<T>(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    snapshot: Vec<Task>,
    data: T,
) -> CommandResult<T> {
    if let Err(error) = persist(ctx, state) {
        log::error!("persist failed, rolling back: {error}");
        state.restore_tasks(snapshot);
        return err(&format!("storage error: {error}"));
    }
    ok(data)
}

pub fn load_state(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    policy: CorruptDataPolicy,
) -> CommandResult<ViewPayload> {
    let storage = ctx.storage();
    let outcome = match storage.load_tasks() {
        Ok(outcome) => outcome,
        Err(error) => return err(&format!("storage error: {error}")),
    };
    match outcome {
        LoadOutcome::Absent => {
            log::info!("no saved tasks under key={}", storage.key());
            state.replace_tasks(Vec::new());
        }
        LoadOutcome::Loaded(tasks) => {
            log::info!("loaded {} tasks from key={}", tasks.len(), storage.key());
            state.replace_tasks(tasks);
        }
        LoadOutcome::Corrupt { raw, error } => match policy {
            CorruptDataPolicy::Fail => {
                log::error!("saved tasks are corrupt: {error}");
                return err(&format!("corrupt task data: {error}"));
            }
            CorruptDataPolicy::Reset => {
                let backup_key = match storage.preserve_corrupt(&raw) {
                    Ok(key) => key,
                    Err(error) => return err(&format!("storage error: {error}")),
                };
                log::warn!(
                    "saved tasks are corrupt ({error}); copied to {backup_key}, starting empty"
                );
                if let Err(error) = storage.save_tasks(&[]) {
                    log::error!("resetting corrupt tasks failed: {error}");
                    return err(&format!("storage error: {error}"));
                }
                state.replace_tasks(Vec::new());
            }
        },
    }
    ok(notify(ctx, state))
}

pub fn create_task(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    title: &str,
    date: Option<&str>,
) -> CommandResult<Task> {
    let snapshot = state.tasks().to_vec();
    let task = match state.create_task(title, date) {
        Ok(task) => task,
        Err(error) => return err(&error.to_string()),
    };
    log::debug!("created task id={}", task.id);
    commit(ctx, state, snapshot, task)
}

pub fn delete_task(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    task_id: &str,
) -> CommandResult<bool> {
    let snapshot = state.tasks().to_vec();
    let removed = state.remove_task(task_id);
    log::debug!("delete task id={task_id} removed={removed}");
    commit(ctx, state, snapshot, removed)
}

pub fn toggle_task_done(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    task_id: &str,
) -> CommandResult<Option<Task>> {
    let snapshot = state.tasks().to_vec();
    match state.toggle_done(task_id) {
        Some(task) => {
            log::debug!("toggled task id={task_id} done={}", task.done);
            commit(ctx, state, snapshot, Some(task))
        }
        None => ok(None),
    }
}

pub fn edit_task(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    task_id: &str,
    title: &str,
    date: Option<&str>,
) -> CommandResult<Option<Task>> {
    let snapshot = state.tasks().to_vec();
    match state.edit_task(task_id, title, date) {
        Ok(Some(task)) => {
            log::debug!("edited task id={task_id}");
            commit(ctx, state, snapshot, Some(task))
        }
        Ok(None) => ok(None),
        Err(error) => err(&error.to_string()),
    }
}

pub fn reorder_tasks(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    new_order: &[String],
) -> CommandResult<bool> {
    let snapshot = state.tasks().to_vec();
    let changed = state.reorder(new_order);
    log::debug!("reorder ids={} changed={changed}", new_order.len());
    commit(ctx, state, snapshot, changed)
}

pub fn set_search(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    search: &str,
) -> CommandResult<ViewPayload> {
    state.set_search(search);
    ok(notify(ctx, state))
}

pub fn set_filter(
    ctx: &impl CommandCtx,
    state: &mut AppState,
    filter: StatusFilter,
) -> CommandResult<ViewPayload> {
    state.set_filter(filter);
    ok(notify(ctx, state))
}

pub fn toggle_sort(ctx: &impl CommandCtx, state: &mut AppState) -> CommandResult<ViewPayload> {
    state.toggle_sort();
    ok(notify(ctx, state))
}
