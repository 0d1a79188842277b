use std::collections::HashSet;

use crate::models::{
    new_task_id, normalize_date, normalize_title, StatusFilter, Task, TaskError, ViewQuery,
};
use crate::view::compute_view;

/// The task collection plus the current view parameters.
///
/// Owned by a single controller and passed around by `&mut`; nothing else
/// mutates the collection.
#[derive(Debug, Default)]
pub struct AppState {
    tasks: Vec<Task>,
    query: ViewQuery,
}

impl AppState {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut state = Self::default();
        state.replace_tasks(tasks);
        state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn visible(&self) -> Vec<&Task> {
        compute_view(&self.tasks, &self.query)
    }

    /// Installs a loaded collection, dropping later copies of a repeated id.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::new();
        self.tasks = tasks
            .into_iter()
            .filter(|task| {
                let fresh = seen.insert(task.id.clone());
                if !fresh {
                    log::warn!("dropping duplicate task id={}", task.id);
                }
                fresh
            })
            .collect();
    }

    /// Puts back a snapshot taken before a mutation whose write failed.
    pub(crate) fn restore_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn create_task(&mut self, title: &str, date: Option<&str>) -> Result<Task, TaskError> {
        let title = normalize_title(title).ok_or(TaskError::EmptyTitle)?;
        let date = normalize_date(date)?;
        let mut id = new_task_id();
        while self.task(&id).is_some() {
            id = new_task_id();
        }
        let task = Task::new(id, title, date);
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn remove_task(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != task_id);
        self.tasks.len() != before
    }

    pub fn toggle_done(&mut self, task_id: &str) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.done = !task.done;
        Some(task.clone())
    }

    /// A blank title leaves the old one in place; the date is always replaced.
    pub fn edit_task(
        &mut self,
        task_id: &str,
        title: &str,
        date: Option<&str>,
    ) -> Result<Option<Task>, TaskError> {
        let date = normalize_date(date)?;
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(None);
        };
        if let Some(title) = normalize_title(title) {
            task.title = title;
        }
        task.date = date;
        Ok(Some(task.clone()))
    }

    /// Rearranges the named tasks among the slots they already occupy.
    ///
    /// Tasks missing from `new_order` (hidden by the current filter or search)
    /// stay exactly where they are. Unknown and repeated ids are ignored.
    pub fn reorder(&mut self, new_order: &[String]) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered: Vec<&str> = Vec::with_capacity(new_order.len());
        for id in new_order {
            if self.task(id).is_some() && seen.insert(id.as_str()) {
                ordered.push(id.as_str());
            }
        }

        let slots: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| seen.contains(task.id.as_str()))
            .map(|(index, _)| index)
            .collect();

        let mut next = self.tasks.clone();
        for (slot, id) in slots.into_iter().zip(ordered) {
            if let Some(task) = self.task(id) {
                next[slot] = task.clone();
            }
        }
        let changed = next != self.tasks;
        self.tasks = next;
        changed
    }

    pub fn set_search(&mut self, search: &str) {
        self.query.search = search.to_string();
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.query.filter = filter;
    }

    pub fn toggle_sort(&mut self) {
        self.query.sort = self.query.sort.toggled();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use proptest::prelude::*;

    fn make_task(id: &str, date: Option<&str>) -> Task {
        Task::new(id.to_string(), format!("task-{id}"), date.map(str::to_string))
    }

    fn ids(state: &AppState) -> Vec<String> {
        state.tasks().iter().map(|t| t.id.clone()).collect()
    }

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn new_drops_duplicate_ids_keeping_the_first() {
        let mut dup = make_task("a", None);
        dup.title = "second copy".to_string();
        let state = AppState::new(vec![make_task("a", None), make_task("b", None), dup]);
        assert_eq!(ids(&state), vec!["a", "b"]);
        assert_eq!(state.task("a").unwrap().title, "task-a");
    }

    #[test]
    fn create_appends_undone_task_with_fresh_id() {
        let mut state = AppState::new(vec![make_task("a", None)]);
        let task = state.create_task("  Buy milk ", Some("2024-05-01")).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.date.as_deref(), Some("2024-05-01"));
        assert!(!task.done);
        assert_ne!(task.id, "a");
        assert_eq!(state.tasks().len(), 2);
        assert_eq!(state.tasks()[1], task);

        let undated = state.create_task("Call mom", Some("")).unwrap();
        assert_eq!(undated.date, None);
        assert_ne!(undated.id, task.id);
    }

    #[test]
    fn create_rejects_blank_title_and_bad_date() {
        let mut state = AppState::default();
        assert_eq!(state.create_task("   ", None), Err(TaskError::EmptyTitle));
        assert_eq!(
            state.create_task("x", Some("01/05/2024")),
            Err(TaskError::InvalidDate("01/05/2024".to_string()))
        );
        assert!(state.tasks().is_empty());
    }

    #[test]
    fn remove_and_toggle_ignore_unknown_ids() {
        let mut state = AppState::new(vec![make_task("a", None), make_task("b", None)]);
        assert!(state.toggle_done("a").unwrap().done);
        assert!(!state.toggle_done("a").unwrap().done);
        assert!(state.toggle_done("missing").is_none());

        assert!(state.remove_task("a"));
        assert!(!state.remove_task("a"));
        assert_eq!(ids(&state), vec!["b"]);
    }

    #[test]
    fn edit_with_blank_title_still_updates_date() {
        let mut state = AppState::default();
        let first = state.create_task("first", None).unwrap();
        let second = state.create_task("second", None).unwrap();

        let edited = state
            .edit_task(&first.id, "   ", Some("2024-06-01"))
            .unwrap()
            .unwrap();
        assert_eq!(edited.title, "first");
        assert_eq!(edited.date.as_deref(), Some("2024-06-01"));

        let edited = state.edit_task(&first.id, " renamed ", None).unwrap().unwrap();
        assert_eq!(edited.title, "renamed");
        assert_eq!(edited.date, None);

        assert_eq!(state.task(&second.id).unwrap().title, "second");
        assert_eq!(state.edit_task("missing", "x", None), Ok(None));
    }

    #[test]
    fn edit_with_bad_date_changes_nothing() {
        let mut state = AppState::new(vec![make_task("a", Some("2024-01-01"))]);
        assert!(state.edit_task("a", "new title", Some("soon")).is_err());
        let task = state.task("a").unwrap();
        assert_eq!(task.title, "task-a");
        assert_eq!(task.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn reorder_with_full_list_applies_it() {
        let mut state = AppState::new(vec![
            make_task("a", None),
            make_task("b", None),
            make_task("c", None),
        ]);
        assert!(state.reorder(&order(&["c", "a", "b"])));
        assert_eq!(ids(&state), vec!["c", "a", "b"]);
        assert!(!state.reorder(&order(&["c", "a", "b"])));
    }

    #[test]
    fn reorder_under_filter_keeps_hidden_tasks_in_place() {
        let mut hidden = make_task("x", None);
        hidden.done = true;
        let mut state = AppState::new(vec![
            make_task("a", None),
            hidden,
            make_task("b", None),
            make_task("c", None),
        ]);
        state.set_filter(StatusFilter::Active);
        let visible: Vec<String> = state.visible().iter().map(|t| t.id.clone()).collect();
        assert_eq!(visible, vec!["a", "b", "c"]);

        assert!(state.reorder(&order(&["c", "b", "a"])));
        assert_eq!(ids(&state), vec!["c", "x", "b", "a"]);
        assert!(state.task("x").unwrap().done);
    }

    #[test]
    fn reorder_ignores_unknown_and_repeated_ids() {
        let mut state = AppState::new(vec![make_task("a", None), make_task("b", None)]);
        assert!(state.reorder(&order(&["ghost", "b", "b", "a"])));
        assert_eq!(ids(&state), vec!["b", "a"]);
        assert!(!state.reorder(&[]));
        assert_eq!(ids(&state), vec!["b", "a"]);
    }

    #[test]
    fn view_parameters_drive_visible() {
        let mut state = AppState::new(vec![
            make_task("late", Some("2024-03-01")),
            make_task("early", Some("2024-01-01")),
        ]);
        assert_eq!(state.query(), &ViewQuery::default());
        assert_eq!(state.visible()[0].id, "early");
        state.toggle_sort();
        assert_eq!(state.query().sort, SortDirection::Desc);
        assert_eq!(state.visible()[0].id, "late");
        state.set_search("EARLY");
        assert_eq!(state.visible().len(), 1);
        // The collection keeps its manual order.
        assert_eq!(ids(&state), vec!["late", "early"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(String),
        Delete(usize),
        Toggle(usize),
        Edit(usize, String),
        Reorder(Vec<usize>),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z ]{0,8}".prop_map(Op::Create),
            (0usize..8).prop_map(Op::Delete),
            (0usize..8).prop_map(Op::Toggle),
            ((0usize..8), "[a-z ]{0,8}").prop_map(|(i, t)| Op::Edit(i, t)),
            proptest::collection::vec(0usize..8, 0..8).prop_map(Op::Reorder),
        ]
    }

    fn pick(state: &AppState, index: usize) -> String {
        state
            .tasks()
            .get(index)
            .map(|t| t.id.clone())
            .unwrap_or_else(|| "missing".to_string())
    }

    proptest! {
        #[test]
        fn ids_stay_unique_and_only_delete_removes(
            ops in proptest::collection::vec(arb_op(), 0..30),
        ) {
            let mut state = AppState::default();
            let mut expected: HashSet<String> = HashSet::new();
            for op in ops {
                match op {
                    Op::Create(title) => {
                        if let Ok(task) = state.create_task(&title, None) {
                            prop_assert!(expected.insert(task.id));
                        }
                    }
                    Op::Delete(index) => {
                        let id = pick(&state, index);
                        state.remove_task(&id);
                        expected.remove(&id);
                    }
                    Op::Toggle(index) => {
                        let id = pick(&state, index);
                        state.toggle_done(&id);
                    }
                    Op::Edit(index, title) => {
                        let id = pick(&state, index);
                        let _ = state.edit_task(&id, &title, None);
                    }
                    Op::Reorder(indexes) => {
                        let new_order: Vec<String> =
                            indexes.into_iter().map(|i| pick(&state, i)).collect();
                        state.reorder(&new_order);
                    }
                }
                let actual: Vec<String> = ids(&state);
                let unique: HashSet<String> = actual.iter().cloned().collect();
                prop_assert_eq!(unique.len(), actual.len());
                prop_assert_eq!(&unique, &expected);
                prop_assert!(state.tasks().iter().all(|t| !t.title.is_empty()));
            }
        }
    }
}
