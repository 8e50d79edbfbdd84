//! End-to-end behavior of the assistance gateway against scripted providers.

use std::sync::Arc;
use std::time::Duration;

use todo_assist::api::{DisabledProvider, ProviderError, RetryConfig, ScriptedProvider};
use todo_assist::assist::{
    Assistance, AssistanceRequest, AssistanceResult, ModelGateway, PreconditionError, Provenance,
    ResponseCache, TaskSummary, fallback_for,
};
use todo_assist::domain::Priority;

const SUGGESTIONS: &str = r#"{"suggestions": [
    {"title": "Book flights", "description": "Compare fares first", "priority": "high"},
    {"title": "Reserve a hotel", "description": "Near the venue", "priority": "medium"}
]}"#;

fn gateway(provider: Arc<ScriptedProvider>) -> ModelGateway {
    gateway_with(provider, RetryConfig::immediate())
}

fn gateway_with(provider: Arc<ScriptedProvider>, retry: RetryConfig) -> ModelGateway {
    ModelGateway::new(provider, Arc::new(ResponseCache::default()), retry)
}

fn task(id: i64, title: &str) -> TaskSummary {
    TaskSummary {
        id,
        title: title.to_string(),
        due_date: None,
        priority: Priority::Medium,
        tags: vec![],
    }
}

// ── Caching ────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    let provider = Arc::new(ScriptedProvider::replying(SUGGESTIONS));
    let gw = gateway(provider.clone());

    let first = gw.suggest("plan a trip").await.unwrap();
    let second = gw.suggest("plan a trip").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.provenance, Provenance::Model);
    assert_eq!(provider.calls(), 1);
    assert_eq!(gw.cache().hits(), 1);
}

#[tokio::test]
async fn whitespace_and_case_variants_share_an_entry() {
    let provider = Arc::new(ScriptedProvider::replying(SUGGESTIONS));
    let gw = gateway(provider.clone());

    gw.suggest("Plan a Trip").await.unwrap();
    gw.suggest("  plan   a trip ").await.unwrap();

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn fallback_answers_are_cached_too() {
    let provider = Arc::new(ScriptedProvider::failing(ProviderError::Unavailable(
        "off".into(),
    )));
    let gw = gateway(provider.clone());

    let first = gw.breakdown("move house").await.unwrap();
    let second = gw.breakdown("move house").await.unwrap();

    assert!(first.is_fallback());
    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
}

// ── Retry and fallback ─────────────────────────────────────────────

#[tokio::test]
async fn transient_failures_exhaust_three_attempts() {
    let provider = Arc::new(ScriptedProvider::failing(ProviderError::Transport(
        "connection reset".into(),
    )));
    let gw = gateway(provider.clone());

    let answer = gw.suggest("write the docs").await.unwrap();

    assert_eq!(provider.calls(), 3);
    assert!(answer.is_fallback());
    assert_eq!(
        answer.result,
        fallback_for(&AssistanceRequest::suggest("write the docs"))
    );
}

/// The three-attempt budget applies to transient errors only. A rejected
/// request (non-retryable 4xx) or an unavailable provider falls back after
/// a single call.
#[tokio::test]
async fn non_transient_failure_falls_back_after_one_call() {
    let provider = Arc::new(ScriptedProvider::failing(ProviderError::Status {
        status: 401,
        body: "invalid api key".into(),
    }));
    let gw = gateway(provider.clone());

    let answer = gw.suggest("write the docs").await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert!(answer.is_fallback());
}

#[tokio::test]
async fn success_on_third_attempt_uses_the_model() {
    let provider = Arc::new(
        ScriptedProvider::replying(SUGGESTIONS)
            .then_fail(ProviderError::Status {
                status: 503,
                body: String::new(),
            })
            .then_fail(ProviderError::EmptyResponse),
    );
    let gw = gateway(provider.clone());

    let answer = gw.suggest("plan a trip").await.unwrap();

    assert_eq!(provider.calls(), 3);
    assert_eq!(answer.provenance, Provenance::Model);
}

#[tokio::test]
async fn malformed_replies_fall_back() {
    let provider = Arc::new(ScriptedProvider::replying("Sure! Here are some ideas:"));
    let gw = gateway(provider.clone());

    let answer = gw.suggest("plan a trip").await.unwrap();

    assert_eq!(provider.calls(), 3);
    assert!(answer.is_fallback());
    assert!(answer.result.is_well_formed());
}

#[tokio::test]
async fn cyclic_breakdown_falls_back() {
    let provider = Arc::new(ScriptedProvider::replying(
        r#"{"subtasks": [
            {"title": "a", "estimated_order": 1, "dependencies": [2]},
            {"title": "b", "estimated_order": 2, "dependencies": [1]}
        ]}"#,
    ));
    let gw = gateway(provider.clone());

    let answer = gw.breakdown("launch the site").await.unwrap();

    assert!(answer.is_fallback());
    let AssistanceResult::Subtasks { subtasks } = &answer.result else {
        panic!("expected subtasks");
    };
    assert_eq!(subtasks.len(), 4);
    assert!(answer.result.is_well_formed());
}

#[tokio::test]
async fn slow_provider_times_out_and_falls_back() {
    let provider = Arc::new(
        ScriptedProvider::replying(SUGGESTIONS).with_delay(Duration::from_millis(500)),
    );
    let retry = RetryConfig::immediate().with_attempt_timeout(Duration::from_millis(20));
    let gw = gateway_with(provider.clone(), retry);

    let answer = gw.suggest("plan a trip").await.unwrap();

    assert!(answer.is_fallback());
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn disabled_provider_still_suggests() {
    let gw = ModelGateway::new(
        Arc::new(DisabledProvider::default()),
        Arc::new(ResponseCache::default()),
        RetryConfig::immediate(),
    );

    let answer = gw.suggest("organize my files and write docs").await.unwrap();

    assert!(answer.is_fallback());
    let AssistanceResult::Suggestions { suggestions } = &answer.result else {
        panic!("expected suggestions");
    };
    assert!(!suggestions.is_empty());
    assert!(suggestions.iter().all(|s| !s.title.is_empty() && !s.description.is_empty()));
}

// ── Concurrency ────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_identical_requests_share_one_call() {
    let provider = Arc::new(
        ScriptedProvider::replying(SUGGESTIONS).with_delay(Duration::from_millis(50)),
    );
    let gw = gateway(provider.clone());

    let answers =
        futures::future::join_all((0..5).map(|_| gw.suggest("plan a trip"))).await;

    assert_eq!(provider.calls(), 1);
    let first = answers[0].as_ref().unwrap();
    for answer in &answers {
        assert_eq!(answer.as_ref().unwrap(), first);
    }
    assert_eq!(gw.in_flight(), 0);
}

#[tokio::test]
async fn abandoned_caller_still_populates_the_cache() {
    let provider = Arc::new(
        ScriptedProvider::replying(SUGGESTIONS).with_delay(Duration::from_millis(50)),
    );
    let gw = gateway(provider.clone());

    let abandoned = tokio::time::timeout(Duration::from_millis(5), gw.suggest("plan a trip")).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(150)).await;
    let answer = gw.suggest("plan a trip").await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(answer.provenance, Provenance::Model);
}

// ── Prioritization ─────────────────────────────────────────────────

#[tokio::test]
async fn model_ranking_is_put_in_canonical_order() {
    let provider = Arc::new(ScriptedProvider::replying(
        r#"{"ranked_todos": [
            {"todo_id": 1, "recommended_priority": "low", "reasoning": "can wait"},
            {"todo_id": 2, "recommended_priority": "urgent", "reasoning": "due today"},
            {"todo_id": 3, "recommended_priority": "medium"}
        ]}"#,
    ));
    let gw = gateway(provider.clone());
    let tasks = vec![task(1, "water plants"), task(2, "pay rent"), task(3, "call mom")];

    let answer = gw.prioritize(tasks).await.unwrap();

    let AssistanceResult::RankedTasks { ranked_todos } = &answer.result else {
        panic!("expected ranking");
    };
    let ids: Vec<i64> = ranked_todos.iter().map(|r| r.task_id).collect();
    assert_eq!(ids, [2, 3, 1]);
    assert_eq!(ranked_todos[0].title, "pay rent");
    assert!(ranked_todos[1].reasoning.contains("medium"));
}

#[tokio::test]
async fn titles_differing_in_case_are_ranked_separately() {
    let provider = Arc::new(ScriptedProvider::replying(
        r#"{"ranked_todos": [
            {"todo_id": 1, "recommended_priority": "high", "reasoning": "soon"}
        ]}"#,
    ));
    let gw = gateway(provider.clone());

    let first = gw.prioritize(vec![task(1, "Write Report")]).await.unwrap();
    let second = gw.prioritize(vec![task(1, "write report")]).await.unwrap();

    let title = |a: &Assistance| match &a.result {
        AssistanceResult::RankedTasks { ranked_todos } => ranked_todos[0].title.clone(),
        other => panic!("expected ranking, got {other:?}"),
    };
    assert_eq!(title(&first), "Write Report");
    assert_eq!(title(&second), "write report");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn fallback_ties_keep_input_order() {
    let provider = Arc::new(ScriptedProvider::failing(ProviderError::Unavailable(
        "off".into(),
    )));
    let gw = gateway(provider);
    let tasks = vec![task(7, "b"), task(3, "a"), task(5, "c")];

    let answer = gw.prioritize(tasks).await.unwrap();

    let AssistanceResult::RankedTasks { ranked_todos } = &answer.result else {
        panic!("expected ranking");
    };
    let ids: Vec<i64> = ranked_todos.iter().map(|r| r.task_id).collect();
    assert_eq!(ids, [7, 3, 5]);
}

// ── Preconditions ──────────────────────────────────────────────────

#[tokio::test]
async fn bad_input_is_reported_without_calling_the_provider() {
    let provider = Arc::new(ScriptedProvider::replying(SUGGESTIONS));
    let gw = gateway(provider.clone());

    assert_eq!(gw.prioritize(vec![]).await, Err(PreconditionError::NoTasks));
    assert_eq!(
        gw.prioritize(vec![task(1, "a"), task(1, "b")]).await,
        Err(PreconditionError::DuplicateTaskId(1))
    );
    assert_eq!(gw.breakdown(" ").await, Err(PreconditionError::EmptyField("task")));
    assert_eq!(provider.calls(), 0);
}
