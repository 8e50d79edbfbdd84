//! Provider reply parsing and validation.
//!
//! Replies are untrusted text. [`parse_reply`] pulls the JSON object out
//! (tolerating markdown fences and chatter around it), deserializes the
//! shape expected for the request variant, and checks it. Any
//! [`ParseError`] counts as a failed attempt.
//!
//! Breakdown dependencies are checked as a graph: unknown and self
//! references are rejected, a cycle is rejected, and an acyclic graph is
//! renumbered into topological order so every dependency points at an
//! earlier step.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::Priority;

use super::ranking::rank_indices;
use super::types::{
    AssistanceRequest, AssistanceResult, RankedTask, Subtask, Suggestion, TaskSummary,
};

/// Why a provider reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJson,
    #[error("reply does not match the expected shape: {0}")]
    Shape(String),
    #[error("reply has no {0}")]
    Empty(&'static str),
    #[error("suggestion {0} has an empty title")]
    BlankTitle(usize),
    #[error("ranking mentions unknown task {0}")]
    UnknownTask(i64),
    #[error("ranking lists task {0} more than once")]
    DuplicateTask(i64),
    #[error("ranking omits {0} task(s)")]
    MissingTasks(usize),
    #[error("subtask orders are not 1..={expected} (found {found})")]
    OrderGap { expected: u32, found: u32 },
    #[error("subtask {order} depends on unknown subtask {dependency}")]
    UnknownDependency { order: u32, dependency: u32 },
    #[error("subtask {0} depends on itself")]
    SelfDependency(u32),
    #[error("dependency cycle among {0} subtasks")]
    DependencyCycle(usize),
}

// ── Raw reply shapes ───────────────────────────────────────────────

#[derive(Deserialize)]
struct RawSuggestions {
    suggestions: Vec<Suggestion>,
}

#[derive(Deserialize)]
struct RawRanking {
    ranked_todos: Vec<RawRankedTask>,
}

#[derive(Deserialize)]
struct RawRankedTask {
    #[serde(alias = "task_id", alias = "id")]
    todo_id: i64,
    recommended_priority: Priority,
    #[serde(default)]
    reasoning: String,
}

#[derive(Deserialize)]
struct RawBreakdown {
    subtasks: Vec<RawSubtask>,
}

#[derive(Deserialize)]
struct RawSubtask {
    title: String,
    #[serde(alias = "order")]
    estimated_order: u32,
    #[serde(default)]
    dependencies: Vec<u32>,
}

// ── Entry point ────────────────────────────────────────────────────

/// Parse and validate a reply for `request`.
pub fn parse_reply(request: &AssistanceRequest, reply: &str) -> Result<AssistanceResult, ParseError> {
    match request {
        AssistanceRequest::Suggest { .. } => {
            let raw: RawSuggestions = decode(reply)?;
            check_suggestions(raw.suggestions)
        }
        AssistanceRequest::Prioritize { tasks } => {
            let raw: RawRanking = decode(reply)?;
            check_ranking(tasks, raw.ranked_todos)
        }
        AssistanceRequest::Breakdown { .. } => {
            let raw: RawBreakdown = decode(reply)?;
            check_subtasks(raw.subtasks)
        }
    }
}

/// Locate the outermost JSON object in `reply`.
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    reply.get(start..=end)
}

fn decode<T: DeserializeOwned>(reply: &str) -> Result<T, ParseError> {
    let json = extract_json(reply).ok_or(ParseError::NoJson)?;
    serde_json::from_str(json).map_err(|e| ParseError::Shape(e.to_string()))
}

// ── Checks ─────────────────────────────────────────────────────────

fn check_suggestions(suggestions: Vec<Suggestion>) -> Result<AssistanceResult, ParseError> {
    if suggestions.is_empty() {
        return Err(ParseError::Empty("suggestions"));
    }
    let suggestions = suggestions
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let title = s.title.trim();
            if title.is_empty() {
                return Err(ParseError::BlankTitle(i));
            }
            Ok(Suggestion {
                title: title.to_string(),
                description: s.description.trim().to_string(),
                priority: s.priority,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AssistanceResult::Suggestions { suggestions })
}

/// The ranking must name every input task exactly once. Titles come from
/// the input; the final order is the canonical one over the recommended
/// priorities.
fn check_ranking(
    tasks: &[TaskSummary],
    ranked: Vec<RawRankedTask>,
) -> Result<AssistanceResult, ParseError> {
    if ranked.is_empty() {
        return Err(ParseError::Empty("ranked_todos"));
    }
    let index: HashMap<i64, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    let mut recommended: Vec<Option<(Priority, String)>> = vec![None; tasks.len()];
    for r in ranked {
        let &i = index.get(&r.todo_id).ok_or(ParseError::UnknownTask(r.todo_id))?;
        if recommended[i].is_some() {
            return Err(ParseError::DuplicateTask(r.todo_id));
        }
        recommended[i] = Some((r.recommended_priority, r.reasoning.trim().to_string()));
    }

    let missing = recommended.iter().filter(|r| r.is_none()).count();
    if missing > 0 {
        return Err(ParseError::MissingTasks(missing));
    }
    let recommended: Vec<(Priority, String)> = recommended.into_iter().flatten().collect();

    let ranked_todos = rank_indices(tasks, |i| recommended[i].0)
        .into_iter()
        .map(|i| {
            let (priority, reasoning) = &recommended[i];
            let priority = *priority;
            RankedTask {
                task_id: tasks[i].id,
                title: tasks[i].title.clone(),
                recommended_priority: priority,
                reasoning: if reasoning.is_empty() {
                    format!("Recommended priority: {priority}")
                } else {
                    reasoning.clone()
                },
            }
        })
        .collect();
    Ok(AssistanceResult::RankedTasks { ranked_todos })
}

fn check_subtasks(mut raw: Vec<RawSubtask>) -> Result<AssistanceResult, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::Empty("subtasks"));
    }
    raw.sort_by_key(|s| s.estimated_order);

    for (expected, s) in (1u32..).zip(&raw) {
        if s.estimated_order != expected {
            return Err(ParseError::OrderGap {
                expected: raw.len() as u32,
                found: s.estimated_order,
            });
        }
        if s.title.trim().is_empty() {
            return Err(ParseError::BlankTitle(expected as usize - 1));
        }
    }

    let count = raw.len() as u32;
    for s in &raw {
        for &dep in &s.dependencies {
            if dep == s.estimated_order {
                return Err(ParseError::SelfDependency(dep));
            }
            if dep == 0 || dep > count {
                return Err(ParseError::UnknownDependency {
                    order: s.estimated_order,
                    dependency: dep,
                });
            }
        }
    }

    let topo = topological_order(&raw)?;

    // Renumber so that position in `topo` becomes the new order.
    let renumber: HashMap<u32, u32> = (1u32..)
        .zip(&topo)
        .map(|(new, &old)| (raw[old].estimated_order, new))
        .collect();
    let subtasks = (1u32..)
        .zip(&topo)
        .map(|(order, &old)| {
            let s = &raw[old];
            let mut dependencies: Vec<u32> = s
                .dependencies
                .iter()
                .filter_map(|d| renumber.get(d).copied())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            dependencies.sort_unstable();
            Subtask {
                title: s.title.trim().to_string(),
                order,
                dependencies,
            }
        })
        .collect();
    Ok(AssistanceResult::Subtasks { subtasks })
}

/// Kahn's algorithm over subtask indices. Among ready subtasks the one with
/// the lowest original order goes first, so an already ordered breakdown is
/// returned unchanged.
fn topological_order(raw: &[RawSubtask]) -> Result<Vec<usize>, ParseError> {
    let n = raw.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, s) in raw.iter().enumerate() {
        let deps: HashSet<u32> = s.dependencies.iter().copied().collect();
        for dep in deps {
            // Orders are dense 1..=n and sorted, so order k sits at index k-1.
            let d = dep as usize - 1;
            in_degree[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = pop_lowest(&mut ready) {
        order.push(i);
        for &j in &dependents[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push_back(j);
            }
        }
    }

    if order.len() < n {
        return Err(ParseError::DependencyCycle(n - order.len()));
    }
    Ok(order)
}

fn pop_lowest(ready: &mut VecDeque<usize>) -> Option<usize> {
    let (pos, _) = ready.iter().enumerate().min_by_key(|&(_, &v)| v)?;
    ready.remove(pos)
}
