//! Canonical task ordering shared by model-derived and fallback rankings.

use std::cmp::Ordering;

use crate::domain::Priority;

use super::types::TaskSummary;

/// Return task indices in rank order.
///
/// Higher `recommended(i)` first, then nearer due date (tasks without one
/// last), then lower input index. The result is a strict total order.
pub fn rank_indices(tasks: &[TaskSummary], recommended: impl Fn(usize) -> Priority) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| {
        recommended(b)
            .cmp(&recommended(a))
            .then_with(|| match (tasks[a].due_date, tasks[b].due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then(a.cmp(&b))
    });
    order
}
