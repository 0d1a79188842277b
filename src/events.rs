use crate::models::{Task, ViewQuery};
use crate::state::AppState;

pub const EVENT_VIEW_UPDATED: &str = "view_updated";

/// The recomputed view handed to the surface after every change.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ViewPayload {
    pub visible: Vec<Task>,
    pub total: usize,
    pub query: ViewQuery,
    pub empty: bool,
}

impl ViewPayload {
    pub fn from_state(state: &AppState) -> Self {
        let visible: Vec<Task> = state.visible().into_iter().cloned().collect();
        Self {
            empty: visible.is_empty(),
            total: state.tasks().len(),
            query: state.query().clone(),
            visible,
        }
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.visible.iter().map(|task| task.id.clone()).collect()
    }
}
