use anyhow::Result as AnyhowResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use concierge::errors::StoreResult;
use concierge::invoker::ToolInvoker;
use concierge::models::directory::{Region, User, UserDraft};
use concierge::models::tool::ToolCall;
use concierge::store::{DirectoryStore, InMemoryStore};
use concierge::tools::default_registry;
use concierge::weather::WeatherService;

/// In-memory store that counts the mutating calls it receives
#[derive(Default)]
struct CountingStore {
    inner: InMemoryStore,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

#[async_trait]
impl DirectoryStore for CountingStore {
    async fn find_regions(&self) -> StoreResult<Vec<Region>> {
        self.inner.find_regions().await
    }

    async fn find_region(&self, id: i64) -> StoreResult<Option<Region>> {
        self.inner.find_region(id).await
    }

    async fn find_region_by_name(&self, name: &str) -> StoreResult<Option<Region>> {
        self.inner.find_region_by_name(name).await
    }

    async fn create_region(&self, name: &str) -> StoreResult<Region> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_region(name).await
    }

    async fn update_region(&self, id: i64, name: &str) -> StoreResult<Option<Region>> {
        self.inner.update_region(id, name).await
    }

    async fn delete_region(&self, id: i64) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_region(id).await
    }

    async fn find_users(&self, name: Option<&str>) -> StoreResult<Vec<User>> {
        self.inner.find_users(name).await
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_users_by_region(&self, region_id: i64) -> StoreResult<Vec<User>> {
        self.inner.find_users_by_region(region_id).await
    }

    async fn create_user(&self, draft: UserDraft) -> StoreResult<User> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_user(draft).await
    }

    async fn update_user(&self, id: i64, draft: UserDraft) -> StoreResult<Option<User>> {
        self.inner.update_user(id, draft).await
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_user(id).await
    }
}

struct SunnyWeather;

#[async_trait]
impl WeatherService for SunnyWeather {
    async fn current_weather(&self, city: &str) -> AnyhowResult<String> {
        Ok(json!({"name": city, "weather": [{"main": "Clear"}]}).to_string())
    }
}

fn setup() -> (Arc<CountingStore>, ToolInvoker) {
    let store = Arc::new(CountingStore::default());
    let registry = default_registry(store.clone(), Arc::new(SunnyWeather)).unwrap();
    (store, ToolInvoker::new(Arc::new(registry)))
}

async fn call(invoker: &ToolInvoker, name: &str, arguments: Value) -> String {
    invoker.invoke(&ToolCall::new(name, arguments)).await
}

#[tokio::test]
async fn test_create_user_then_read_it_back() {
    let (_, invoker) = setup();
    assert_eq!(
        call(&invoker, "createRegion", json!({"regionName": "Seoul"})).await,
        "Region created: Seoul (ID: 1)"
    );

    let created = call(
        &invoker,
        "createUser",
        json!({"name": "Kim Minsu", "email": "kim@example.com", "regionId": 1}),
    )
    .await;
    assert!(created.starts_with("User created:\n- ID: 1"), "{}", created);

    let detail = call(&invoker, "getUserById", json!({"userId": 1})).await;
    assert_eq!(
        detail,
        "User details:\n- ID: 1\n- Name: Kim Minsu\n- Email: kim@example.com\n- Region: Seoul (ID: 1)"
    );
}

#[tokio::test]
async fn test_missing_user_reply_names_only_the_id() {
    let (_, invoker) = setup();
    let output = call(&invoker, "getUserById", json!({"userId": 404})).await;
    assert!(output.contains("404"));
    assert!(!output.contains("Email"));
    assert!(!output.contains("Region"));
}

#[tokio::test]
async fn test_create_user_with_empty_name_never_reaches_store() {
    let (store, invoker) = setup();
    call(&invoker, "createRegion", json!({"regionName": "Busan"})).await;
    let creates_before = store.creates.load(Ordering::SeqCst);

    let output = call(
        &invoker,
        "createUser",
        json!({"name": "", "email": "x@example.com", "regionId": 1}),
    )
    .await;

    assert_eq!(output, "User name is required.");
    assert_eq!(store.creates.load(Ordering::SeqCst), creates_before);
}

#[tokio::test]
async fn test_create_user_with_numeric_name_is_rejected() {
    let (store, invoker) = setup();
    call(&invoker, "createRegion", json!({"regionName": "Incheon"})).await;
    let creates_before = store.creates.load(Ordering::SeqCst);

    let output = call(
        &invoker,
        "createUser",
        json!({"name": 7, "email": "seven@example.com", "regionId": 1}),
    )
    .await;

    assert_eq!(output, "Parameter 'name' must be a string, got 7");
    assert_eq!(store.creates.load(Ordering::SeqCst), creates_before);
}

#[tokio::test]
async fn test_delete_region_with_users_never_reaches_store() {
    let (store, invoker) = setup();
    call(&invoker, "createRegion", json!({"regionName": "Daegu"})).await;
    call(
        &invoker,
        "createUser",
        json!({"name": "Choi", "email": "choi@example.com", "regionId": 1}),
    )
    .await;

    let output = call(&invoker, "deleteRegion", json!({"regionId": 1})).await;
    assert_eq!(
        output,
        "Region Daegu (ID: 1) has 1 registered user(s) and cannot be deleted."
    );
    assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_tool_is_named() {
    let (_, invoker) = setup();
    let output = call(&invoker, "dropDatabase", json!({})).await;
    assert_eq!(output, "Tool not found: dropDatabase");
}

#[tokio::test]
async fn test_every_tool_answers_arbitrary_arguments_with_text() {
    let (_, invoker) = setup();
    call(&invoker, "createRegion", json!({"regionName": "Jeju"})).await;

    let argument_sets = [
        json!(null),
        json!({}),
        json!([1, 2, 3]),
        json!("regionId=1"),
        json!({"regionId": "one", "userId": 1.5, "name": 7, "time": false}),
        json!({"regionId": 1, "userId": 1, "regionName": "", "city": "", "email": "nope"}),
        json!({"regionId": i64::MAX, "userId": -1, "name": {"nested": true}}),
    ];

    let names: Vec<String> = invoker
        .registry()
        .list()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names.len(), 16);

    for name in &names {
        for arguments in &argument_sets {
            let output = call(&invoker, name, arguments.clone()).await;
            assert!(!output.is_empty(), "{} with {} gave no text", name, arguments);
        }
    }
}

#[tokio::test]
async fn test_weather_and_status() {
    let (_, invoker) = setup();

    let weather = call(&invoker, "getCurrentWeather", json!({"city": "Seoul"})).await;
    let parsed: Value = serde_json::from_str(&weather).unwrap();
    assert_eq!(parsed["name"], "Seoul");

    let status = call(&invoker, "getSystemStatus", json!({})).await;
    assert!(status.contains("- Total users: 0"));
    assert!(status.contains("- Server state: OK"));
}
