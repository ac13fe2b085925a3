use restbridge_core::{CollectionDefinition, ConnectionConfig, QueryOptions, RestError};
use restbridge_runtime::{MemoryCache, Registration, RestAdapter};
use restbridge_types::CrudMethod;
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{
    basic_auth, body_json, header, method, path, path_regex, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig::new("api")
        .with_host(server.address().to_string())
        .with_pathname("/api/v1")
}

async fn create_adapter(registration: Registration) -> RestAdapter {
    let adapter = RestAdapter::new();
    adapter.register(registration).await.unwrap();
    adapter
}

#[tokio::test]
async fn test_response_shapes_normalize_to_sequence() {
    let server = MockServer::start().await;
    let shapes = [
        ("alpha", json!([{"id": 1}])),
        ("beta", json!({"objects": [{"id": 1}]})),
        ("gamma", json!({"results": [{"id": 1}]})),
        ("delta", json!({"id": 1})),
    ];
    for (collection, body) in &shapes {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{}s", collection)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    for (collection, _) in &shapes {
        let records = adapter
            .find("api", collection, QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(records, vec![json!({"id": 1}).as_object().cloned().unwrap()]);
    }
}

#[tokio::test]
async fn test_single_id_addressing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    adapter
        .find("api", "widget", QueryOptions::by_id(5))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_bulk_destroy_fans_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets"))
        .and(query_param("status", "archived"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": [{"id": 1}, {"id": 2}, {"id": 3}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/v1/widgets/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    adapter
        .destroy("api", "widget", QueryOptions::new().filter("status", "archived"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ids_are_sent_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets/a%3Fadmin=1"))
        .and(query_param_is_missing("admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a?admin=1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets/a%23b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a#b"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/widgets/x%2F..%2F..%2Fsecret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    let records = adapter
        .find("api", "widget", QueryOptions::by_id("a?admin=1"))
        .await
        .unwrap();
    assert_eq!(records[0]["id"], json!("a?admin=1"));

    let records = adapter
        .find("api", "widget", QueryOptions::by_id("a#b"))
        .await
        .unwrap();
    assert_eq!(records[0]["id"], json!("a#b"));

    assert_ok!(
        adapter
            .destroy("api", "widget", QueryOptions::by_id("x/../../secret"))
            .await
    );
}

#[tokio::test]
async fn test_empty_where_destroys_each_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/widgets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/v1/widgets/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    adapter
        .destroy("api", "widget", QueryOptions::new().with_where(Default::default()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeated_bulk_destroy_looks_up_fresh_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets"))
        .and(query_param("status", "archived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets"))
        .and(query_param("status", "archived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/widgets/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let adapter =
        create_adapter(Registration::new(config_for(&server)).with_cache(cache.clone())).await;

    for _ in 0..2 {
        adapter
            .destroy("api", "widget", QueryOptions::new().filter("status", "archived"))
            .await
            .unwrap();
    }
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_bulk_destroy_find_error_skips_replay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "down"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    let err = adapter
        .destroy("api", "widget", QueryOptions::new().filter("status", "archived"))
        .await
        .unwrap_err();
    assert_eq!(err.upstream_status(), Some(500));
    assert!(err.to_string().contains("down"));
}

#[tokio::test]
async fn test_cache_invalidated_by_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/widgets/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "v": 1})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/widgets/7"))
        .and(body_json(json!({"v": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "v": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let adapter =
        create_adapter(Registration::new(config_for(&server)).with_cache(cache.clone())).await;

    // Second find is served from the cache
    adapter.find("api", "widget", QueryOptions::by_id(7)).await.unwrap();
    adapter.find("api", "widget", QueryOptions::by_id(7)).await.unwrap();
    assert_eq!(cache.len().await, 1);

    adapter
        .update("api", "widget", QueryOptions::by_id(7), json!({"v": 2}))
        .await
        .unwrap();
    assert!(cache.is_empty().await);

    adapter.find("api", "widget", QueryOptions::by_id(7)).await.unwrap();
}

#[tokio::test]
async fn test_create_sends_headers_auth_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/people"))
        .and(header("x-api-key", "secret"))
        .and(basic_auth("ada", "hunter2"))
        .and(body_json(json!({"name": "ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConnectionConfig::from_value(json!({
        "identity": "api",
        "host": server.address().to_string(),
        "pathname": "/api/v1",
        "headers": {"x-api-key": "secret"},
        "basicAuth": {"username": "ada", "password": "hunter2"}
    }))
    .unwrap();
    let adapter = create_adapter(Registration::new(config)).await;

    let record = adapter
        .create("api", "person", json!({"name": "ada"}))
        .await
        .unwrap();
    assert_eq!(record["id"], json!(1));
}

#[tokio::test]
async fn test_configured_verbs() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/widgets/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_method(CrudMethod::Update, "patch");
    let adapter = create_adapter(Registration::new(config)).await;
    adapter
        .update("api", "widget", QueryOptions::by_id(3), json!({"a": 1}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_verb_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server).with_method(CrudMethod::Find, "fetch");
    let adapter = create_adapter(Registration::new(config)).await;
    let err = adapter
        .find("api", "widget", QueryOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RestError::InvalidMethod(_)));
}

#[tokio::test]
async fn test_date_fields_are_cast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "startsAt": "2020-01-01T00:00:00Z"},
            {"id": 2, "startsAt": null}
        ])))
        .mount(&server)
        .await;

    let registration = Registration::new(config_for(&server)).with_collection(
        "event",
        CollectionDefinition::new().with_attribute("startsAt", "date"),
    );
    let adapter = create_adapter(registration).await;

    let events = adapter
        .find("api", "event", QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(events[0]["startsAt"], json!("2020-01-01T00:00:00.000Z"));
    assert_eq!(events[1]["startsAt"], json!("1970-01-01T00:00:00.000Z"));
}

#[tokio::test]
async fn test_find_404_is_empty_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let adapter =
        create_adapter(Registration::new(config_for(&server)).with_cache(cache.clone())).await;

    for _ in 0..2 {
        let records = adapter
            .find("api", "widget", QueryOptions::by_id(1))
            .await
            .unwrap();
        assert!(records.is_empty());
    }
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_non_json_body_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/widgets/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let adapter = create_adapter(Registration::new(config_for(&server))).await;
    assert_ok!(adapter.destroy("api", "widget", QueryOptions::by_id(4)).await);
}

#[tokio::test]
async fn test_network_failure_is_transport_error() {
    // Nothing listens on the discard port
    let config = ConnectionConfig::new("api")
        .with_host("127.0.0.1:1")
        .with_pathname("/api/v1");

    let adapter = create_adapter(Registration::new(config)).await;
    let err = assert_err!(adapter.find("api", "widget", QueryOptions::new()).await);
    assert!(matches!(err, RestError::Transport { status: None, .. }));
    assert_eq!(err.upstream_status(), None);
}
