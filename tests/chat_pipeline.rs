// tests/chat_pipeline.rs
// Drives the HTTP router end-to-end with scripted gateway/catalog mocks:
// input validation, both gates, filter precedence, result projection, the
// no-results path, and the uniform provider-failure policy.

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use eli::api::http::http_router;
use eli::catalog::{CatalogSearch, CourseRecord};
use eli::chat::filters::FilterSpec;
use eli::chat::prompts::{APOLOGY, REFUSAL};
use eli::config::EliConfig;
use eli::llm::{AssistantReply, ChatMessage, ChatModel, Role, ToolInvocation};
use eli::state::build_app_state;

// ============================================================================
// Scripted collaborators
// ============================================================================

struct MockChatModel {
    chat_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    safety_verdict: bool,
    retrieval_verdict: bool,
    filter_args: Option<Value>,
    final_text: String,
    fail_completions: bool,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    fn new() -> Self {
        Self {
            chat_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            safety_verdict: true,
            retrieval_verdict: true,
            filter_args: None,
            final_text: "Here's your response".to_string(),
            fail_completions: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
        tool_choice: Option<Value>,
    ) -> Result<AssistantReply> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.fail_completions {
            anyhow::bail!("provider down");
        }

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        // The gates force the verdict tool; answer by which probe was asked.
        if tool_choice
            .as_ref()
            .is_some_and(|choice| choice["function"]["name"] == "record_verdict")
        {
            let verdict = if last.contains("courses or academics") {
                self.safety_verdict
            } else {
                self.retrieval_verdict
            };
            return Ok(AssistantReply {
                content: None,
                tool_calls: vec![ToolInvocation {
                    name: "record_verdict".to_string(),
                    arguments: json!({ "verdict": verdict }),
                }],
            });
        }

        // Filter extraction offers the course_filter tool on auto choice.
        if tools
            .as_ref()
            .is_some_and(|tools| tools.iter().any(|t| t["function"]["name"] == "course_filter"))
        {
            return Ok(match &self.filter_args {
                Some(args) => AssistantReply {
                    content: None,
                    tool_calls: vec![ToolInvocation {
                        name: "course_filter".to_string(),
                        arguments: args.clone(),
                    }],
                },
                None => AssistantReply {
                    content: Some("No filters apply.".to_string()),
                    tool_calls: vec![],
                },
            });
        }

        // Plain completions: the query rewrite, then the grounded answer.
        if last.contains("standalone search query") {
            return Ok(AssistantReply {
                content: Some("introductory computer science courses".to_string()),
                tool_calls: vec![],
            });
        }

        Ok(AssistantReply {
            content: Some(self.final_text.clone()),
            tool_calls: vec![],
        })
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_completions {
            anyhow::bail!("provider down");
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

struct MockCatalog {
    search_calls: AtomicUsize,
    captured_filter: Mutex<Option<FilterSpec>>,
    captured_limits: Mutex<Option<(usize, usize)>>,
    results: Vec<CourseRecord>,
}

impl MockCatalog {
    fn new(results: Vec<CourseRecord>) -> Self {
        Self {
            search_calls: AtomicUsize::new(0),
            captured_filter: Mutex::new(None),
            captured_limits: Mutex::new(None),
            results,
        }
    }
}

#[async_trait]
impl CatalogSearch for MockCatalog {
    async fn search(
        &self,
        _vector: &[f32],
        filter: Option<&FilterSpec>,
        limit: usize,
        candidates: usize,
    ) -> Result<Vec<CourseRecord>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.captured_filter.lock().unwrap() = filter.cloned();
        *self.captured_limits.lock().unwrap() = Some((limit, candidates));
        Ok(self.results.clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

fn course(code: &str, title: &str, description: &str) -> CourseRecord {
    CourseRecord {
        season_code: "202403".to_string(),
        course_code: code.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        areas: vec!["QR".to_string()],
        sentiment_label: Some("positive".to_string()),
        sentiment_score: Some(0.9),
    }
}

fn harness(
    config: EliConfig,
    model: MockChatModel,
    catalog: MockCatalog,
) -> (Arc<MockChatModel>, Arc<MockCatalog>, Router) {
    let model = Arc::new(model);
    let catalog = Arc::new(catalog);
    let state = build_app_state(Arc::new(config), model.clone(), catalog.clone());
    (model, catalog, http_router(state))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn user_message(content: &str) -> Value {
    json!({ "message": [{ "role": "user", "content": content }] })
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn missing_message_is_rejected_before_any_external_call() {
    let (model, catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![]),
    );

    let (status, body) = post_json(app, "/api/chat", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'message' in request body");
    assert_eq!(model.chat_calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_message_list_is_rejected() {
    let (model, _catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![]),
    );

    let (status, body) = post_json(app, "/api/chat", json!({ "message": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message list is empty");
    assert_eq!(model.chat_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Gates
// ============================================================================

#[tokio::test]
async fn off_topic_request_gets_the_fixed_refusal() {
    let mut model = MockChatModel::new();
    model.safety_verdict = false;
    let (model, catalog, app) = harness(EliConfig::default(), model, MockCatalog::new(vec![]));

    let (status, body) = post_json(app, "/api/chat", user_message("What's the weather?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], REFUSAL);
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);
    assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declined_retrieval_gate_answers_with_a_single_completion() {
    let config = EliConfig {
        enable_safety_gate: false,
        ..EliConfig::default()
    };
    let mut model = MockChatModel::new();
    model.retrieval_verdict = false;
    let (model, catalog, app) = harness(config, model, MockCatalog::new(vec![]));

    let (status, body) = post_json(app, "/api/chat", user_message("what is a credit?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Here's your response");
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);
    // One verdict probe plus exactly one completion; the catalog and the
    // embedding endpoint are never touched.
    assert_eq!(model.chat_calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_gates_skip_the_probes_and_always_retrieve() {
    let config = EliConfig {
        enable_safety_gate: false,
        enable_retrieval_gate: false,
        ..EliConfig::default()
    };
    let (model, catalog, app) = harness(
        config,
        MockChatModel::new(),
        MockCatalog::new(vec![course("CPSC 150", "Intro to CS", "Basics.")]),
    );

    let (status, _body) = post_json(app, "/api/chat", user_message("intro CS courses")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 1);
    // Rewrite, extraction, grounded completion; no verdict probes at all.
    assert_eq!(model.chat_calls.load(Ordering::SeqCst), 3);
    for conversation in model.conversations() {
        let last = conversation.last().unwrap();
        assert!(!last.content.contains("courses or academics"));
    }
}

// ============================================================================
// Filters and retrieval
// ============================================================================

#[tokio::test]
async fn client_subject_overrides_the_extracted_subject() {
    let mut model = MockChatModel::new();
    model.filter_args = Some(json!({
        "subject": "ECON",
        "rating": 3.5,
        "comparison_operator_rating": "$gte"
    }));
    let (_model, catalog, app) = harness(
        EliConfig::default(),
        model,
        MockCatalog::new(vec![course("CPSC 150", "Intro to CS", "Basics.")]),
    );

    let body = json!({
        "message": [{ "role": "user", "content": "good CS courses" }],
        "subject": ["CPSC"]
    });
    let (status, _body) = post_json(app, "/api/chat", body).await;
    assert_eq!(status, StatusCode::OK);

    let filter = catalog.captured_filter.lock().unwrap().clone().unwrap();
    assert_eq!(filter.subject, vec!["CPSC"]);
    // Facets only the model supplied still apply.
    assert!(filter.rating.is_some());
}

#[tokio::test]
async fn catalog_results_project_in_order_with_defaults() {
    let records = vec![
        course("CPSC 150", "Intro to CS", "Basics of programming."),
        course("CPSC 223", "Data Structures", "Lists and trees."),
    ];
    let (_model, catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(records),
    );

    let (status, body) = post_json(app, "/api/chat", user_message("CS courses?")).await;
    assert_eq!(status, StatusCode::OK);

    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["course_code"], "CPSC 150");
    assert_eq!(courses[0]["title"], "Intro to CS");
    assert_eq!(courses[0]["description"], "Basics of programming.");
    assert_eq!(courses[1]["course_code"], "CPSC 223");
    assert_eq!(courses[0]["sentiment_label"], "positive");

    // Result ceiling and the wider candidate pool use the configured defaults.
    let limits = catalog.captured_limits.lock().unwrap().unwrap();
    assert_eq!(limits, (5, 30));
}

#[tokio::test]
async fn empty_search_grounds_with_the_no_results_prompt() {
    let (model, _catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![]),
    );

    let (status, body) = post_json(app, "/api/chat", user_message("underwater basket weaving")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);

    // The final completion was grounded with the no-results instruction.
    let conversations = model.conversations();
    let final_conversation = conversations.last().unwrap();
    let grounding = final_conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::System)
        .unwrap();
    assert!(grounding.content.contains("No courses matching"));
}

#[tokio::test]
async fn end_to_end_recommendation_scenario() {
    let (model, _catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![course(
            "CPSC 150",
            "Intro to CS",
            "Basics of programming.",
        )]),
    );

    let (status, body) = post_json(
        app,
        "/api/chat",
        user_message("Tell me about intro CS courses"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Here's your response");
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["course_code"], "CPSC 150");

    // The grounded completion saw the retrieved course enumerated.
    let conversations = model.conversations();
    let final_conversation = conversations.last().unwrap();
    let grounding = final_conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::System)
        .unwrap();
    assert!(grounding.content.contains("CPSC 150: Intro to CS"));
}

// ============================================================================
// Failure policy and normalization
// ============================================================================

#[tokio::test]
async fn provider_failure_degrades_to_the_fixed_apology() {
    let mut model = MockChatModel::new();
    model.fail_completions = true;
    let (_model, _catalog, app) = harness(EliConfig::default(), model, MockCatalog::new(vec![]));

    let (status, body) = post_json(app, "/api/chat", user_message("CS courses?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], APOLOGY);
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn ai_roles_and_client_ids_are_normalized() {
    let config = EliConfig {
        enable_safety_gate: false,
        enable_retrieval_gate: false,
        ..EliConfig::default()
    };
    let (model, _catalog, app) = harness(config, MockChatModel::new(), MockCatalog::new(vec![]));

    let body = json!({
        "message": [
            { "role": "ai", "content": "Hi, I'm Eli.", "id": 17 },
            { "role": "user", "content": "intro CS courses", "id": 18 }
        ]
    });
    let (status, _body) = post_json(app, "/api/chat", body).await;
    assert_eq!(status, StatusCode::OK);

    let first_conversation = &model.conversations()[0];
    assert!(
        first_conversation
            .iter()
            .any(|m| m.role == Role::Assistant && m.content == "Hi, I'm Eli.")
    );
    // A default system header was prepended.
    assert_eq!(first_conversation[0].role, Role::System);
}

// ============================================================================
// Other endpoints
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (_model, _catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![]),
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn validate_ticket_requires_both_fields() {
    let (_model, _catalog, app) = harness(
        EliConfig::default(),
        MockChatModel::new(),
        MockCatalog::new(vec![]),
    );

    let (status, body) = post_json(app, "/validate_ticket", json!({ "ticket": "t" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'service_url' in request body");
}
