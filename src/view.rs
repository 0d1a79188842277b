use std::cmp::Ordering;

use crate::models::{SortDirection, Task, ViewQuery};

/// Derives the visible sequence: search, then status filter, then date sort.
///
/// Never touches the collection itself. Undated tasks go after dated ones and
/// equal keys keep their collection order; `Desc` reverses the whole result.
pub fn compute_view<'a>(tasks: &'a [Task], query: &ViewQuery) -> Vec<&'a Task> {
    let needle = query.search.to_lowercase();
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
        .filter(|task| query.filter.matches(task))
        .collect();

    // `sort_by` is stable, which is what keeps ties in collection order.
    visible.sort_by(|a, b| compare_dates(a.date.as_deref(), b.date.as_deref()));
    if query.sort == SortDirection::Desc {
        visible.reverse();
    }
    visible
}

fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
