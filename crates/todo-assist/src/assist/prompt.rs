//! Fixed per-variant prompt templates.

use serde_json::json;

use super::types::{AssistanceRequest, TaskSummary};

const SYSTEM_PROMPT: &str = "You are a productivity assistant for a todo application. \
Reply with a single JSON object and nothing else. Priorities are one of \
\"low\", \"medium\", \"high\", \"urgent\".";

/// A prompt ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl RenderedPrompt {
    pub fn render(request: &AssistanceRequest) -> Self {
        let user = match request {
            AssistanceRequest::Suggest { description } => suggestion_prompt(description),
            AssistanceRequest::Prioritize { tasks } => prioritization_prompt(tasks),
            AssistanceRequest::Breakdown { task } => breakdown_prompt(task),
        };
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

fn suggestion_prompt(description: &str) -> String {
    format!(
        r#"Given the following task description, suggest 3-5 structured todo items.

Description: {description}

For each suggestion, provide:
- title (concise, action-oriented)
- description (brief explanation)
- priority (low/medium/high/urgent)

Respond in JSON format:
{{
  "suggestions": [
    {{"title": "...", "description": "...", "priority": "..."}}
  ]
}}"#,
        description = description.trim()
    )
}

fn prioritization_prompt(tasks: &[TaskSummary]) -> String {
    let todos: Vec<_> = tasks
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "title": t.title,
                "due_date": t.due_date.map(|d| d.to_rfc3339()),
                "priority": t.priority,
            })
        })
        .collect();
    let todos_json = serde_json::Value::Array(todos).to_string();
    format!(
        r#"Analyze and prioritize these todo items based on due dates, current priorities, and content importance.

Todos: {todos_json}

Provide:
- Ranked list of every todo above, each exactly once
- Recommended priority adjustment if needed
- Brief reasoning for ranking

Respond in JSON format:
{{
  "ranked_todos": [
    {{"todo_id": 1, "title": "...", "recommended_priority": "...", "reasoning": "..."}}
  ]
}}"#
    )
}

fn breakdown_prompt(task: &str) -> String {
    format!(
        r#"Break down the following complex task into manageable subtasks with dependencies.

Task: {task}

Provide:
- Subtasks in logical order
- Dependencies between subtasks (the estimated_order values of earlier subtasks)
- Estimated execution order, starting at 1

Respond in JSON format:
{{
  "subtasks": [
    {{"title": "...", "estimated_order": 1, "dependencies": []}}
  ]
}}"#,
        task = task.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;

    #[test]
    fn suggestion_prompt_embeds_description() {
        let p = RenderedPrompt::render(&AssistanceRequest::suggest("  plan a trip "));
        assert!(p.user.contains("Description: plan a trip\n"));
        assert!(p.user.contains("\"suggestions\""));
        assert!(p.system.contains("JSON"));
    }

    #[test]
    fn prioritization_prompt_lists_tasks() {
        let p = RenderedPrompt::render(&AssistanceRequest::prioritize(vec![TaskSummary {
            id: 42,
            title: "file taxes".into(),
            due_date: None,
            priority: Priority::Urgent,
            tags: vec![],
        }]));
        assert!(p.user.contains(r#""id":42"#));
        assert!(p.user.contains(r#""priority":"urgent""#));
    }

    #[test]
    fn rendering_is_stable() {
        let req = AssistanceRequest::breakdown("migrate the database");
        assert_eq!(RenderedPrompt::render(&req), RenderedPrompt::render(&req));
    }
}
