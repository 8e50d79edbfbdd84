//! Deterministic fallback catalog.
//!
//! [`fallback_for`] is pure and infallible: the same request always maps to
//! the same non-empty, well-formed result. Suggestions are picked by coarse
//! keyword matching against a hand-written theme table.

use crate::domain::Priority;

use super::ranking::rank_indices;
use super::types::{
    AssistanceRequest, AssistanceResult, RankedTask, Subtask, Suggestion, TaskSummary,
};

/// Maximum suggestions returned for one description.
const MAX_SUGGESTIONS: usize = 5;

type Entry = (&'static str, &'static str, Priority);

struct Theme {
    /// Word prefixes that select this theme.
    keywords: &'static [&'static str],
    suggestions: &'static [Entry],
}

const THEMES: &[Theme] = &[
    Theme {
        keywords: &["doc", "writ", "readme", "note"],
        suggestions: &[
            (
                "Outline the documentation",
                "List the sections and audience before writing",
                Priority::High,
            ),
            (
                "Draft and review the docs",
                "Write a first pass, then have someone proofread it",
                Priority::Medium,
            ),
        ],
    },
    Theme {
        keywords: &["organi", "file", "folder", "clean", "tidy", "sort"],
        suggestions: &[
            (
                "Sort items into categories",
                "Group related files or items so each has one home",
                Priority::Medium,
            ),
            (
                "Archive or delete what you no longer need",
                "Clear out clutter before reorganizing the rest",
                Priority::Low,
            ),
        ],
    },
    Theme {
        keywords: &["bug", "fix", "debug", "error", "crash", "broken"],
        suggestions: &[
            (
                "Reproduce the problem",
                "Find reliable steps that trigger the failure",
                Priority::High,
            ),
            (
                "Verify the fix",
                "Confirm the issue is resolved and add a regression check",
                Priority::Medium,
            ),
        ],
    },
    Theme {
        keywords: &["meet", "email", "call", "message", "present"],
        suggestions: &[
            (
                "Prepare talking points",
                "Write down what you need to communicate and ask",
                Priority::Medium,
            ),
            (
                "Send a follow-up",
                "Summarize decisions and next steps for everyone involved",
                Priority::Medium,
            ),
        ],
    },
    Theme {
        keywords: &["learn", "study", "course", "research", "read"],
        suggestions: &[
            (
                "Gather learning material",
                "Collect the sources you will study from",
                Priority::Medium,
            ),
            (
                "Schedule study sessions",
                "Block regular time on your calendar",
                Priority::Low,
            ),
        ],
    },
];

const GENERIC_SUGGESTIONS: &[Entry] = &[
    (
        "Review your task description",
        "Break down what you need to accomplish",
        Priority::High,
    ),
    (
        "Set clear goals",
        "Define specific, measurable objectives",
        Priority::Medium,
    ),
    (
        "Create an action plan",
        "Outline steps needed to complete the task",
        Priority::Medium,
    ),
];

const BREAKDOWN_STEPS: &[&str] = &[
    "Define requirements",
    "Plan implementation",
    "Execute the plan",
    "Review and verify the result",
];

/// Fallback result for any request.
pub fn fallback_for(request: &AssistanceRequest) -> AssistanceResult {
    match request {
        AssistanceRequest::Suggest { description } => AssistanceResult::Suggestions {
            suggestions: suggest(description),
        },
        AssistanceRequest::Prioritize { tasks } => AssistanceResult::RankedTasks {
            ranked_todos: prioritize(tasks),
        },
        AssistanceRequest::Breakdown { .. } => AssistanceResult::Subtasks {
            subtasks: breakdown(),
        },
    }
}

fn matches_theme(words: &[String], theme: &Theme) -> bool {
    words
        .iter()
        .any(|w| theme.keywords.iter().any(|k| w.starts_with(k)))
}

fn suggest(description: &str) -> Vec<Suggestion> {
    let words: Vec<String> = description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut picked: Vec<&Entry> = Vec::new();
    for theme in THEMES.iter().filter(|t| matches_theme(&words, t)) {
        for entry in theme.suggestions {
            if picked.len() < MAX_SUGGESTIONS && !picked.iter().any(|p| p.0 == entry.0) {
                picked.push(entry);
            }
        }
    }
    if picked.is_empty() {
        picked.extend(GENERIC_SUGGESTIONS);
    }

    picked
        .into_iter()
        .map(|&(title, description, priority)| Suggestion {
            title: title.to_string(),
            description: description.to_string(),
            priority,
        })
        .collect()
}

fn prioritize(tasks: &[TaskSummary]) -> Vec<RankedTask> {
    rank_indices(tasks, |i| tasks[i].priority)
        .into_iter()
        .map(|i| {
            let task = &tasks[i];
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "none".to_string());
            RankedTask {
                task_id: task.id,
                title: task.title.clone(),
                recommended_priority: task.priority,
                reasoning: format!("Based on priority ({}) and due date ({due})", task.priority),
            }
        })
        .collect()
}

fn breakdown() -> Vec<Subtask> {
    (1u32..)
        .zip(BREAKDOWN_STEPS)
        .map(|(order, title)| Subtask {
            title: (*title).to_string(),
            order,
            dependencies: if order == 1 { vec![] } else { vec![order - 1] },
        })
        .collect()
}
