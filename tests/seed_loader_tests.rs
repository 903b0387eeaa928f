/// Seed loader tests
///
/// Covers the skip/remote/fallback decision, pagination, cancellation and
/// the real catalog client against a local stand-in server.
/// Run with: cargo test --test seed_loader_tests

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use starship_inventory::core::{Result as StoreResult, Starship, StarshipId, StoreError};
use starship_inventory::seed::{
    FetchError, PageSource, RawStarship, SeedError, SeedLoader, SeedOutcome, StarshipPage,
    SwapiClient, SwapiConfig, fetch_all, fallback_starships,
};
use starship_inventory::storage::{RecordStore, StarshipStore, VersionedRow};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted page source
// ============================================================================

enum Step {
    Page(StarshipPage),
    Fail(&'static str),
}

struct ScriptedSource {
    first: String,
    steps: HashMap<String, Step>,
    requested: Mutex<Vec<String>>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl ScriptedSource {
    fn new(first: &str) -> Self {
        Self {
            first: first.to_string(),
            steps: HashMap::new(),
            requested: Mutex::new(Vec::new()),
            cancel_on: None,
        }
    }

    fn page(mut self, url: &str, results: Vec<RawStarship>, next: Option<&str>) -> Self {
        self.steps.insert(
            url.to_string(),
            Step::Page(StarshipPage {
                results,
                next: next.map(str::to_string),
            }),
        );
        self
    }

    fn fail(mut self, url: &str, message: &'static str) -> Self {
        self.steps.insert(url.to_string(), Step::Fail(message));
        self
    }

    fn cancel_when_fetching(mut self, url: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((url.to_string(), token));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn first_page_url(&self) -> Result<String, FetchError> {
        Ok(self.first.clone())
    }

    async fn fetch_page(&self, url: &str) -> Result<StarshipPage, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some((target, token)) = &self.cancel_on {
            if target == url {
                token.cancel();
            }
        }
        match self.steps.get(url) {
            Some(Step::Page(page)) => Ok(page.clone()),
            Some(Step::Fail(message)) => Err(FetchError::Transport(message.to_string())),
            None => Err(FetchError::UnsupportedResponse {
                url: url.to_string(),
                reason: "HTTP status 404 Not Found".to_string(),
            }),
        }
    }
}

fn raw(name: &str) -> RawStarship {
    serde_json::from_value(json!({
        "name": name,
        "model": format!("{name} model"),
        "manufacturer": "Kuat Drive Yards",
        "starship_class": "Star Destroyer",
        "crew": "47,060",
        "passengers": "n/a",
        "url": format!("https://swapi.dev/api/starships/{name}/")
    }))
    .unwrap()
}

fn assert_fallback_contents(ships: &[Starship]) {
    let expected = fallback_starships();
    assert_eq!(ships.len(), 3);
    for (stored, expected) in ships.iter().zip(expected.iter()) {
        assert_eq!(stored.name, expected.name);
        assert_eq!(stored.model, expected.model);
        assert_eq!(stored.manufacturer, expected.manufacturer);
        assert_eq!(stored.starship_class, expected.starship_class);
        assert_eq!(stored.crew, expected.crew);
        assert_eq!(stored.passengers, expected.passengers);
        assert_eq!(stored.source_url, None);
    }
}

fn loader(store: &Arc<StarshipStore>, source: Arc<dyn PageSource>) -> SeedLoader {
    SeedLoader::new(store.clone()).with_remote(source)
}

// ============================================================================
// Decision logic
// ============================================================================

#[tokio::test]
async fn test_seed_skips_populated_store() {
    let store = Arc::new(StarshipStore::in_memory());
    store
        .insert(Starship::new("Home One", "MC80", "Mon Calamari", "Cruiser", "5,402", "1,200"))
        .await
        .unwrap();
    let before = store.scan().await.unwrap();

    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![raw("A")], None));
    let outcome = loader(&store, source.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::AlreadySeeded { existing: 1 });
    assert!(source.requested().is_empty());
    assert_eq!(store.scan().await.unwrap(), before);
}

#[tokio::test]
async fn test_seed_runs_only_once() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![raw("A"), raw("B")], None));

    let first = loader(&store, source.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();
    let second = loader(&store, source.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first, SeedOutcome::Remote { inserted: 2 });
    assert_eq!(second, SeedOutcome::AlreadySeeded { existing: 2 });
    assert_eq!(source.requested().len(), 1);
}

#[tokio::test]
async fn test_empty_first_page_uses_fallback() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![], None));

    let outcome = loader(&store, source)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert_fallback_contents(&store.scan().await.unwrap());
}

#[tokio::test]
async fn test_transport_failure_uses_fallback() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(ScriptedSource::new("p1").fail("p1", "connection refused"));

    let outcome = loader(&store, source)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert_fallback_contents(&store.scan().await.unwrap());
}

#[tokio::test]
async fn test_failure_on_later_page_discards_earlier_pages() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(
        ScriptedSource::new("p1")
            .page("p1", vec![raw("Devastator")], Some("p2"))
            .fail("p2", "connection reset"),
    );

    loader(&store, source.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.requested(), vec!["p1", "p2"]);
    let ships = store.scan().await.unwrap();
    assert!(ships.iter().all(|s| s.name != "Devastator"));
    assert_fallback_contents(&ships);
}

#[tokio::test]
async fn test_null_crew_is_stored_as_empty_string() {
    let store = Arc::new(StarshipStore::in_memory());
    let death_star: RawStarship = serde_json::from_value(json!({
        "name": "Death Star",
        "model": "DS-1 Orbital Battle Station",
        "manufacturer": "Imperial Department of Military Research, Sienar Fleet Systems",
        "starship_class": "Deep Space Mobile Battlestation",
        "crew": null,
        "passengers": "843,342"
    }))
    .unwrap();
    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![death_star], None));

    let outcome = loader(&store, source)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Remote { inserted: 1 });
    let ships = store.scan().await.unwrap();
    assert_eq!(ships[0].crew, "");
    assert_eq!(ships[0].starship_class, "Deep Space Mobile Battlestation");
}

#[tokio::test]
async fn test_three_chained_pages_accumulate() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(
        ScriptedSource::new("p1")
            .page("p1", vec![raw("A")], Some("p2"))
            .page("p2", vec![raw("B")], Some("p3"))
            .page("p3", vec![raw("C")], None),
    );

    let outcome = loader(&store, source.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Remote { inserted: 3 });
    assert_eq!(source.requested(), vec!["p1", "p2", "p3"]);

    let ships = store.scan().await.unwrap();
    assert_eq!(
        ships.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert_eq!(
        ships.iter().map(|s| s.id).collect::<Vec<StarshipId>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        ships[0].source_url.as_deref(),
        Some("https://swapi.dev/api/starships/A/")
    );
}

#[tokio::test]
async fn test_pagination_cycle_is_rejected() {
    let source = ScriptedSource::new("p1")
        .page("p1", vec![raw("A")], Some("p2"))
        .page("p2", vec![raw("B")], Some("p1"));

    let err = fetch_all(&source, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_cancelled_before_start_uses_fallback() {
    let store = Arc::new(StarshipStore::in_memory());
    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![raw("A")], None));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = loader(&store, source.clone()).run(&cancel).await.unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert!(source.requested().is_empty());
}

#[tokio::test]
async fn test_cancellation_is_checked_at_page_boundary() {
    let store = Arc::new(StarshipStore::in_memory());
    let cancel = CancellationToken::new();
    let source = Arc::new(
        ScriptedSource::new("p1")
            .page("p1", vec![raw("A")], Some("p2"))
            .page("p2", vec![raw("B")], None)
            .cancel_when_fetching("p1", cancel.clone()),
    );

    let outcome = loader(&store, source.clone()).run(&cancel).await.unwrap();

    // The in-flight page completes; the next one is never requested.
    assert_eq!(source.requested(), vec!["p1"]);
    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert_fallback_contents(&store.scan().await.unwrap());
}

#[tokio::test]
async fn test_offline_loader_uses_fallback() {
    let store = Arc::new(StarshipStore::in_memory());
    let outcome = SeedLoader::new(store.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert_fallback_contents(&store.scan().await.unwrap());
}

// ============================================================================
// Store failures
// ============================================================================

/// Store whose batch inserts fail a configurable number of times.
struct FlakyStore {
    inner: StarshipStore,
    batch_failures_left: AtomicUsize,
}

impl FlakyStore {
    fn failing(times: usize) -> Self {
        Self {
            inner: StarshipStore::in_memory(),
            batch_failures_left: AtomicUsize::new(times),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }

    async fn scan(&self) -> StoreResult<Vec<Starship>> {
        self.inner.scan().await
    }

    async fn find(&self, id: StarshipId) -> StoreResult<Option<VersionedRow>> {
        self.inner.find(id).await
    }

    async fn insert(&self, record: Starship) -> StoreResult<Starship> {
        self.inner.insert(record).await
    }

    async fn insert_many(&self, records: Vec<Starship>) -> StoreResult<Vec<Starship>> {
        let left = self.batch_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.batch_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Io("disk full".to_string()));
        }
        self.inner.insert_many(records).await
    }

    async fn update_if_version(
        &self,
        id: StarshipId,
        expected_version: u64,
        record: Starship,
    ) -> StoreResult<u64> {
        self.inner.update_if_version(id, expected_version, record).await
    }

    async fn delete(&self, id: StarshipId) -> StoreResult<bool> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn test_remote_commit_failure_uses_fallback() {
    let store = Arc::new(FlakyStore::failing(1));
    let source = Arc::new(ScriptedSource::new("p1").page("p1", vec![raw("A")], None));

    let outcome = SeedLoader::new(store.clone())
        .with_remote(source)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
    assert_fallback_contents(&store.scan().await.unwrap());
}

#[tokio::test]
async fn test_fallback_commit_failure_is_fatal() {
    let store = Arc::new(FlakyStore::failing(usize::MAX));

    let err = SeedLoader::new(store.clone())
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SeedError::FallbackFailed(StoreError::Io(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

// ============================================================================
// Catalog client against a local stand-in server
// ============================================================================

#[derive(Clone)]
struct MockCatalog {
    base: String,
    user_agents: Arc<Mutex<Vec<String>>>,
}

async fn catalog_root(State(state): State<MockCatalog>, headers: HeaderMap) -> Json<Value> {
    record_agent(&state, &headers);
    Json(json!({
        "people": format!("{}/api/people/", state.base),
        "starships": format!("{}/api/starships/", state.base),
    }))
}

async fn starship_page(
    State(state): State<MockCatalog>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    record_agent(&state, &headers);
    let page = query
        .get("page")
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1);
    let next = (page < 3).then(|| format!("{}/api/starships/?page={}", state.base, page + 1));
    let crew = if page == 2 { Value::Null } else { json!("47,060") };

    Json(json!({
        "count": 3,
        "next": next,
        "previous": null,
        "results": [{
            "name": format!("Ship {page}"),
            "model": "Imperial I-class Star Destroyer",
            "manufacturer": "Kuat Drive Yards",
            "starship_class": "Star Destroyer",
            "crew": crew,
            "passengers": "n/a",
            "url": format!("{}/api/starships/{page}/", state.base)
        }]
    }))
}

fn record_agent(state: &MockCatalog, headers: &HeaderMap) {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.user_agents.lock().unwrap().push(agent);
}

async fn spawn_server(build: impl FnOnce(String) -> Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

fn client_for(base: &str, timeout: Duration) -> SwapiClient {
    SwapiClient::new(SwapiConfig {
        catalog_url: format!("{base}/api/"),
        timeout,
        user_agent: "starship-inventory-tests/1.0".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_client_follows_catalog_pages() {
    let user_agents = Arc::new(Mutex::new(Vec::new()));
    let agents = user_agents.clone();
    let base = spawn_server(move |base| {
        Router::new()
            .route("/api/", get(catalog_root))
            .route("/api/starships/", get(starship_page))
            .with_state(MockCatalog {
                base,
                user_agents: agents,
            })
    })
    .await;

    let store = Arc::new(StarshipStore::in_memory());
    let outcome = SeedLoader::new(store.clone())
        .with_remote(Arc::new(client_for(&base, Duration::from_secs(5))))
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Remote { inserted: 3 });
    let ships = store.scan().await.unwrap();
    assert_eq!(
        ships.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["Ship 1", "Ship 2", "Ship 3"]
    );
    assert_eq!(ships[1].crew, "");
    assert_eq!(ships[0].crew, "47,060");
    assert_eq!(ships[2].source_url, Some(format!("{base}/api/starships/3/")));

    let agents = user_agents.lock().unwrap().clone();
    assert_eq!(agents.len(), 4);
    assert!(agents.iter().all(|a| a == "starship-inventory-tests/1.0"));
}

#[tokio::test]
async fn test_client_times_out() {
    let base = spawn_server(|_| {
        Router::new().route(
            "/api/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "starships": "unused" }))
            }),
        )
    })
    .await;

    let client = client_for(&base, Duration::from_millis(200));
    let err = fetch_all(&client, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_client_rejects_error_status() {
    let base = spawn_server(|_| {
        Router::new().route(
            "/api/",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
    })
    .await;

    let client = client_for(&base, Duration::from_secs(5));
    let err = client.first_page_url().await.unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_client_rejects_non_json_content() {
    let base = spawn_server(|_| {
        Router::new().route(
            "/api/",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>").into_response() }),
        )
    })
    .await;

    let client = client_for(&base, Duration::from_secs(5));
    let err = client.first_page_url().await.unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_client_reports_malformed_json() {
    let base = spawn_server(|_| {
        Router::new().route(
            "/api/",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{\"starships\": ") }),
        )
    })
    .await;

    let client = client_for(&base, Duration::from_secs(5));
    let err = client.first_page_url().await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn test_catalog_without_starships_falls_back() {
    let base = spawn_server(|_| {
        Router::new().route("/api/", get(|| async { Json(json!({ "people": "x" })) }))
    })
    .await;

    let store = Arc::new(StarshipStore::in_memory());
    let outcome = SeedLoader::new(store.clone())
        .with_remote(Arc::new(client_for(&base, Duration::from_secs(5))))
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, SeedOutcome::Fallback { inserted: 3 });
}
