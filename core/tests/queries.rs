//! Query-layer behaviour against scripted in-memory transports: request
//! deduplication, retry policy, invalidation, abort and the checks that must
//! fire before anything reaches the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use linguatech_core::resources::{
    Area, AreaFilter, Course, CourseFilter, CreateArea, CreateLesson, Lesson, UpdateArea,
};
use linguatech_core::{
    AbortController, ApiClient, ApiError, ClientConfig, HttpRequest, HttpResponse, ListParams, MemoryTokenStore,
    QueryClient, QueryKey, QueryOptions, QueryState, ResourceQueries, RetryPolicy, TokenPair, Transport,
};

type Handler = dyn Fn(&HttpRequest, usize) -> Result<HttpResponse, ApiError> + Send + Sync;

/// Answers every request through `handler`, after an optional delay, and
/// records what it was sent.
struct ScriptedTransport {
    calls: AtomicUsize,
    delay: Duration,
    handler: Box<Handler>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(handler: impl Fn(&HttpRequest, usize) -> Result<HttpResponse, ApiError> + Send + Sync + 'static) -> Arc<Self> {
        Self::delayed(Duration::ZERO, handler)
    }

    fn delayed(
        delay: Duration,
        handler: impl Fn(&HttpRequest, usize) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            handler: Box::new(handler),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = (self.handler)(&request, attempt);
        self.seen.lock().unwrap().push(request);
        reply
    }
}

/// One area whose name can be changed. A list read captures the name when it
/// arrives and answers `delay` later, like a slow backend query.
struct RenamingBackend {
    name: Mutex<String>,
    delay: Duration,
    lists: AtomicUsize,
}

#[async_trait]
impl Transport for RenamingBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if request.url.contains("/update/") {
            let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap();
            let name = body["name"].as_str().unwrap().to_string();
            *self.name.lock().unwrap() = name.clone();
            return ok(serde_json::json!({"data": {"id": 1, "name": name}, "message": "Updated"}));
        }
        self.lists.fetch_add(1, Ordering::SeqCst);
        let name = self.name.lock().unwrap().clone();
        tokio::time::sleep(self.delay).await;
        areas_page(&[&name])
    }
}

fn ok(body: serde_json::Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: body.to_string().into_bytes(),
    })
}

fn areas_page(names: &[&str]) -> Result<HttpResponse, ApiError> {
    let data: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({"id": i + 1, "name": name}))
        .collect();
    ok(serde_json::json!({
        "data": data,
        "totalCount": names.len(),
        "pageNumber": 1,
        "pageSize": 10,
    }))
}

fn created_area() -> Result<HttpResponse, ApiError> {
    ok(serde_json::json!({"data": {"id": 1, "name": "North campus"}, "message": "Created"}))
}

fn offline() -> Result<HttpResponse, ApiError> {
    Err(ApiError::Transport("connection refused".to_string()))
}

fn client_over(transport: Arc<dyn Transport>) -> QueryClient {
    let api = ApiClient::new(
        ClientConfig::new("http://lms.test/api"),
        transport,
        Arc::new(MemoryTokenStore::new()),
    );
    QueryClient::new(api)
}

fn first_page() -> ListParams<AreaFilter> {
    ListParams::page(1, 10)
}

fn area(name: &str) -> CreateArea {
    CreateArea {
        name: name.to_string(),
        code: None,
        description: None,
    }
}

#[tokio::test]
async fn identical_concurrent_reads_share_one_request() {
    let transport = ScriptedTransport::delayed(Duration::from_millis(50), |_, _| areas_page(&["North"]));
    let areas = client_over(transport.clone()).resource::<Area>();
    let params = first_page();

    let (a, b) = tokio::join!(
        areas.list(&params, QueryOptions::new()),
        areas.list(&params, QueryOptions::new())
    );

    assert_eq!(transport.calls(), 1);
    assert_eq!(a.data().unwrap().data[0].name, "North");
    assert_eq!(b.data().unwrap().data[0].name, "North");
}

#[tokio::test]
async fn fresh_results_are_served_from_the_cache() {
    let transport = ScriptedTransport::new(|_, _| areas_page(&["North"]));
    let areas = client_over(transport.clone()).resource::<Area>();

    areas.list(&first_page(), QueryOptions::new()).await;
    let second = areas.list(&first_page(), QueryOptions::new()).await;

    assert!(second.is_success());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn reads_retry_transport_failures() {
    let transport = ScriptedTransport::new(|_, attempt| if attempt < 2 { offline() } else { areas_page(&[]) });
    let areas = client_over(transport.clone()).resource::<Area>();

    let state = areas.list(&first_page(), QueryOptions::new()).await;

    assert!(state.is_success());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn reads_give_up_after_the_retry_budget() {
    let transport = ScriptedTransport::new(|_, _| offline());
    let areas = client_over(transport.clone()).resource::<Area>();

    let state = areas.list(&first_page(), QueryOptions::new()).await;

    assert!(matches!(state.error(), Some(ApiError::Transport(_))));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn http_errors_are_not_retried_or_cached() {
    let transport = ScriptedTransport::new(|_, _| {
        Ok(HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: br#"{"message":"database unavailable","succeeded":false}"#.to_vec(),
        })
    });
    let client = client_over(transport.clone());
    let areas = client.resource::<Area>();

    let state = areas.list(&first_page(), QueryOptions::new()).await;

    let err = state.error().unwrap();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "database unavailable");
    assert_eq!(transport.calls(), 1);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn retry_policy_is_configurable() {
    let transport = ScriptedTransport::new(|_, _| offline());
    let api = ApiClient::new(
        ClientConfig::new("http://lms.test/api").with_retry(RetryPolicy { reads: 0, mutations: 0 }),
        transport.clone(),
        Arc::new(MemoryTokenStore::new()),
    );
    let areas = QueryClient::new(api).resource::<Area>();

    areas.get_all(QueryOptions::new()).await;

    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn mutations_are_not_retried() {
    let transport = ScriptedTransport::new(|_, _| offline());
    let areas = client_over(transport.clone()).resource::<Area>();

    let err = areas.create(&area("North campus")).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn invalid_payload_is_rejected_without_a_request() {
    let transport = ScriptedTransport::new(|_, _| created_area());
    let areas = client_over(transport.clone()).resource::<Area>();

    let err = areas.create(&area("")).await.unwrap_err();

    match err {
        ApiError::Validation(errors) => assert!(errors.field_errors().contains_key("name")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn invalid_page_is_rejected_without_a_request() {
    let transport = ScriptedTransport::new(|_, _| areas_page(&[]));
    let areas = client_over(transport.clone()).resource::<Area>();

    let state = areas.list(&ListParams::page(0, 10), QueryOptions::new()).await;

    assert!(matches!(state.error(), Some(ApiError::Validation(_))));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn disabled_reads_stay_idle() {
    let transport = ScriptedTransport::new(|_, _| areas_page(&[]));
    let areas = client_over(transport.clone()).resource::<Area>();

    let state = areas.get_by_id(&1, QueryOptions::new().enabled(false)).await;

    assert!(state.is_idle());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn successful_mutation_invalidates_lists() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.url.ends_with("/create") {
            created_area()
        } else {
            areas_page(&["North campus"])
        }
    });
    let client = client_over(transport.clone());
    let areas = client.resource::<Area>();

    areas.list(&first_page(), QueryOptions::new()).await;
    areas.create(&area("North campus")).await.unwrap();
    assert!(!client
        .cache()
        .contains(&ResourceQueries::<Area>::list_key(&first_page()).unwrap()));
    areas.list(&first_page(), QueryOptions::new()).await;

    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn failed_mutation_invalidates_nothing() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.url.ends_with("/create") {
            offline()
        } else {
            areas_page(&["North campus"])
        }
    });
    let client = client_over(transport.clone());
    let areas = client.resource::<Area>();

    areas.list(&first_page(), QueryOptions::new()).await;
    assert!(areas.create(&area("South campus")).await.is_err());

    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn lesson_mutations_invalidate_course_reads() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.url.ends_with("/create") {
            ok(serde_json::json!({"data": {"id": 9, "courseId": 1, "title": "Intro"}}))
        } else {
            ok(serde_json::json!({"data": [], "totalCount": 0, "pageNumber": 1, "pageSize": 10}))
        }
    });
    let client = client_over(transport.clone());
    let course_params: ListParams<CourseFilter> = ListParams::page(1, 10);

    client.resource::<Course>().list(&course_params, QueryOptions::new()).await;
    let lesson = CreateLesson {
        course_id: 1,
        title: "Intro".to_string(),
        content: None,
        starts_at: None,
        duration_minutes: None,
    };
    client.resource::<Lesson>().create(&lesson).await.unwrap();

    assert!(!client
        .cache()
        .contains(&ResourceQueries::<Course>::list_key(&course_params).unwrap()));
}

#[tokio::test]
async fn aborted_signal_short_circuits() {
    let transport = ScriptedTransport::new(|_, _| areas_page(&[]));
    let areas = client_over(transport.clone()).resource::<Area>();
    let controller = AbortController::new();
    controller.abort();

    let state = areas
        .list(&first_page(), QueryOptions::new().signal(controller.signal()))
        .await;

    assert!(matches!(state.error(), Some(ApiError::Aborted)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn abort_cancels_an_in_flight_request() {
    let transport = ScriptedTransport::delayed(Duration::from_secs(30), |_, _| areas_page(&[]));
    let areas = client_over(transport.clone()).resource::<Area>();
    let controller = AbortController::new();
    let signal = controller.signal();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.abort();
    });
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        areas.list(&first_page(), QueryOptions::new().signal(signal)),
    )
    .await
    .unwrap();

    assert!(matches!(state.error(), Some(ApiError::Aborted)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn peek_reports_loading_while_in_flight() {
    let transport = ScriptedTransport::delayed(Duration::from_millis(100), |_, _| areas_page(&["North"]));
    let client = client_over(transport.clone());
    let reader = client.clone();
    let task = tokio::spawn(async move {
        reader
            .resource::<Area>()
            .list(&ListParams::page(1, 10), QueryOptions::new())
            .await
    });

    let areas = client.resource::<Area>();
    let mut saw_loading = false;
    for _ in 0..50 {
        if areas.peek_list(&first_page()).is_loading() {
            saw_loading = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(saw_loading);

    assert!(task.await.unwrap().is_success());
    let settled = areas.peek_list(&first_page());
    assert_eq!(settled.data().unwrap().data[0].name, "North");
}

#[tokio::test]
async fn requests_carry_the_bearer_token() {
    let transport = ScriptedTransport::new(|_, _| areas_page(&[]));
    let tokens = MemoryTokenStore::with_tokens(TokenPair {
        access_token: "abc".to_string(),
        refresh_token: "def".to_string(),
    });
    let api = ApiClient::new(
        ClientConfig::new("http://lms.test/api"),
        transport.clone(),
        Arc::new(tokens),
    );

    api.resource::<Area>().get_all().await.unwrap();

    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen[0].header("authorization"), Some("Bearer abc"));
    assert_eq!(seen[0].url, "http://lms.test/api/areas/all");
}

#[tokio::test]
async fn invalidating_a_root_clears_every_variant() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.url.ends_with("/all") {
            ok(serde_json::json!({"data": []}))
        } else {
            areas_page(&[])
        }
    });
    let client = client_over(transport);
    let areas = client.resource::<Area>();
    areas.list(&first_page(), QueryOptions::new()).await;
    areas.get_all(QueryOptions::new()).await;
    assert_eq!(client.cache().len(), 2);

    let dropped = client.cache().invalidate(&QueryKey::new("areas"));

    assert_eq!(dropped, 2);
    assert!(matches!(areas.peek_list(&first_page()), QueryState::Idle));
}

#[tokio::test]
async fn reads_after_an_update_do_not_join_the_stale_request() {
    let backend = Arc::new(RenamingBackend {
        name: Mutex::new("Old".to_string()),
        delay: Duration::from_millis(200),
        lists: AtomicUsize::new(0),
    });
    let areas = client_over(backend.clone()).resource::<Area>();
    let params = first_page();

    let slow_read = areas.list(&params, QueryOptions::new());
    let rename_then_read = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let rename = UpdateArea {
            name: Some("New".to_string()),
            ..Default::default()
        };
        areas.update(&1, &rename).await.unwrap();
        areas.list(&params, QueryOptions::new()).await
    };
    let (before, after) = tokio::join!(slow_read, rename_then_read);

    assert_eq!(before.data().unwrap().data[0].name, "Old");
    assert_eq!(after.data().unwrap().data[0].name, "New");
    assert_eq!(backend.lists.load(Ordering::SeqCst), 2);
    assert_eq!(areas.peek_list(&params).data().unwrap().data[0].name, "New");
}

#[tokio::test]
async fn joined_read_survives_the_leader_abort() {
    let transport = ScriptedTransport::delayed(Duration::from_millis(100), |_, _| areas_page(&["North"]));
    let areas = client_over(transport.clone()).resource::<Area>();
    let params = first_page();
    let controller = AbortController::new();

    let leader = areas.list(&params, QueryOptions::new().signal(controller.signal()));
    let follower = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        areas.list(&params, QueryOptions::new()).await
    };
    let aborter = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        controller.abort();
    };
    let (led, followed, ()) = tokio::join!(leader, follower, aborter);

    assert!(matches!(led.error(), Some(ApiError::Aborted)));
    assert_eq!(followed.data().unwrap().data[0].name, "North");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn joined_read_honours_its_own_signal() {
    let transport = ScriptedTransport::delayed(Duration::from_millis(100), |_, _| areas_page(&["North"]));
    let areas = client_over(transport.clone()).resource::<Area>();
    let params = first_page();
    let controller = AbortController::new();

    let leader = areas.list(&params, QueryOptions::new());
    let follower = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        areas
            .list(&params, QueryOptions::new().signal(controller.signal()))
            .await
    };
    let aborter = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        controller.abort();
    };
    let (led, followed, ()) = tokio::join!(leader, follower, aborter);

    assert_eq!(led.data().unwrap().data[0].name, "North");
    assert!(matches!(followed.error(), Some(ApiError::Aborted)));
    assert_eq!(transport.calls(), 1);
}
