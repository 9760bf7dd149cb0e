//! Integration tests for RegistryClient.
//!
//! Uses wiremock for HTTP mocking. Tests cover multi-source search and
//! resolve, cache reuse and staleness, offline fallback, schema gating,
//! body size limits and refresh error aggregation.

use std::time::Duration;

use nox_registry::{
    ClientConfig, ErrorKind, PluginFilter, RegistryClient, RegistryError, RiskClass, Source,
    Track,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index(plugins: Value) -> Value {
    json!({
        "schema_version": "1",
        "generated_at": "2026-02-08T00:00:00Z",
        "plugins": plugins,
    })
}

fn version(v: &str, risk: &str) -> Value {
    json!({
        "version": v,
        "api_version": "v1",
        "digest": format!("sha256:{}", "a".repeat(64)),
        "risk_class": risk,
    })
}

async fn serve(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn create_test_client(cache: &TempDir, ttl: Duration) -> RegistryClient {
    let config = ClientConfig::new(cache.path()).with_cache_ttl(ttl);
    RegistryClient::new(config).expect("failed to create client")
}

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_two_sources_search_union_and_resolve() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/a/index.json",
        index(json!([
            {"name": "nox/sast", "description": "Static analysis", "track": "core-analysis",
             "versions": [version("1.0.0", "passive"), version("1.2.0", "passive")]},
        ])),
    )
    .await;
    serve(
        &server,
        "/b/index.json",
        index(json!([
            {"name": "nox/dast", "description": "Web scanner", "track": "dynamic-runtime",
             "versions": [version("1.0.0", "active")]},
        ])),
    )
    .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("a", format!("{}/a/index.json", server.uri())))
        .unwrap();
    client
        .add_source(Source::new("b", format!("{}/b/index.json", server.uri())))
        .unwrap();

    let all = client.search("", &[]).await.unwrap();
    let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["nox/sast", "nox/dast"]);

    let resolved = client.resolve("nox/sast", "^1.0.0", &[]).await.unwrap();
    assert_eq!(resolved.version, "1.2.0");

    let info = client.info("nox/dast").await.unwrap();
    assert_eq!(info.track(), Some(Track::DynamicRuntime));
}

#[tokio::test]
async fn test_resolve_picks_highest_across_sources() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/a/index.json",
        index(json!([{"name": "nox/sast", "description": "from a",
            "versions": [version("1.0.0", "passive"), version("1.4.0", "passive")]}])),
    )
    .await;
    serve(
        &server,
        "/b/index.json",
        index(json!([{"name": "nox/sast", "description": "from b",
            "versions": [version("1.9.0", "runtime"), version("2.0.0", "passive")]}])),
    )
    .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("a", format!("{}/a/index.json", server.uri())))
        .unwrap();
    client
        .add_source(Source::new("b", format!("{}/b/index.json", server.uri())))
        .unwrap();

    let resolved = client.resolve("nox/sast", "^1.0.0", &[]).await.unwrap();
    assert_eq!(resolved.version, "1.9.0");

    let resolved = client
        .resolve(
            "nox/sast",
            "^1.0.0",
            &[PluginFilter::MaxRiskClass(RiskClass::Active)],
        )
        .await
        .unwrap();
    assert_eq!(resolved.version, "1.4.0");

    let err = client.resolve("nox/sast", "^3.0.0", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Duplicate names: the first source's entry wins.
    let found = client.search("sast", &[]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].description, "from a");
}

#[tokio::test]
async fn test_search_filters_compose_with_query() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/index.json",
        index(json!([
            {"name": "nox/secrets", "description": "Secret detection", "track": "core-analysis",
             "tags": ["secrets", "sast"], "versions": [version("1.0.0", "passive")]},
            {"name": "nox/prompt", "description": "Prompt injection checks", "track": "ai-security",
             "tags": ["llm"], "versions": [version("0.3.0", "active")]},
            {"name": "nox/iac", "description": "Infrastructure as code", "track": "core-analysis",
             "tags": ["iac"], "versions": [version("1.1.0", "passive")]},
        ])),
    )
    .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("main", format!("{}/index.json", server.uri())))
        .unwrap();

    let by_track_name = client.search("AI SECURITY", &[]).await.unwrap();
    assert_eq!(by_track_name.len(), 1);
    assert_eq!(by_track_name[0].name, "nox/prompt");

    let core = client
        .search("", &[PluginFilter::Track(Track::CoreAnalysis)])
        .await
        .unwrap();
    assert_eq!(core.len(), 2);

    let tagged = client
        .search("nox", &[PluginFilter::tags(["SAST", "secrets"])])
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].name, "nox/secrets");

    let custom = client
        .search("", &[PluginFilter::custom(|p| p.name.ends_with("iac"))])
        .await
        .unwrap();
    assert_eq!(custom.len(), 1);
}

#[tokio::test]
async fn test_fresh_cache_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .and(header(
            "user-agent",
            concat!("nox-registry/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(index(json!([
            {"name": "nox/sast", "versions": [version("1.0.0", "passive")]}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("main", format!("{}/index.json", server.uri())))
        .unwrap();

    for _ in 0..3 {
        assert_eq!(client.search("", &[]).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_zero_ttl_always_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index(json!([]))))
        .expect(2)
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, Duration::ZERO);
    client
        .add_source(Source::new("main", format!("{}/index.json", server.uri())))
        .unwrap();

    client.search("", &[]).await.unwrap();
    client.search("", &[]).await.unwrap();
}

#[tokio::test]
async fn test_stale_cache_fallback_when_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index(json!([
            {"name": "nox/sast", "versions": [version("1.0.0", "passive")]}
        ]))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, Duration::ZERO);
    client
        .add_source(Source::new("main", format!("{}/index.json", server.uri())))
        .unwrap();

    // Populates the cache.
    client.search("", &[]).await.unwrap();

    // Every later fetch fails; the stale copy is served.
    let resolved = client.resolve("nox/sast", "*", &[]).await.unwrap();
    assert_eq!(resolved.version, "1.0.0");
}

#[tokio::test]
async fn test_corrupt_fresh_cache_triggers_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index(json!([
            {"name": "nox/sast", "versions": [version("1.0.0", "passive")]}
        ]))))
        .expect(2)
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    let source = Source::new("main", format!("{}/index.json", server.uri()));
    client.add_source(source.clone()).unwrap();

    client.search("", &[]).await.unwrap();
    std::fs::write(client.cache().path_for(&source), b"{ truncated").unwrap();

    let found = client.search("sast", &[]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(client.cache().load(&source).await.is_ok());
}

#[tokio::test]
async fn test_unsupported_schema_is_fatal_without_cache() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/index.json",
        json!({"schema_version": "99", "plugins": "not even the right shape"}),
    )
    .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("future", format!("{}/index.json", server.uri())))
        .unwrap();

    let err = client.search("", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("99"), "{}", err);
}

#[tokio::test]
async fn test_http_error_without_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("broken", format!("{}/index.json", server.uri())))
        .unwrap();

    let err = client.resolve("nox/sast", "*", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_retryable());
    assert_eq!(err.source_errors().len(), 1);
    assert_eq!(err.source_errors()[0].source, "broken");
}

#[tokio::test]
async fn test_oversized_index_rejected() {
    let server = MockServer::start().await;
    let big = index(json!([{
        "name": "nox/huge",
        "description": "x".repeat(4096),
        "versions": [version("1.0.0", "passive")],
    }]));
    serve(&server, "/index.json", big).await;

    let cache = TempDir::new().unwrap();
    let config = ClientConfig::new(cache.path()).with_max_index_bytes(1024);
    let mut client = RegistryClient::new(config).unwrap();
    client
        .add_source(Source::new("big", format!("{}/index.json", server.uri())))
        .unwrap();

    let err = client.search("", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("exceeds"), "{}", err);
}

#[tokio::test]
async fn test_partial_source_failure_is_tolerated() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/good.json",
        index(json!([{"name": "nox/sast", "versions": [version("1.0.0", "passive")]}])),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bad.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client
        .add_source(Source::new("bad", format!("{}/bad.json", server.uri())))
        .unwrap();
    client
        .add_source(Source::new("good", format!("{}/good.json", server.uri())))
        .unwrap();

    let found = client.search("", &[]).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_refresh_aggregates_per_source_errors() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/good.json",
        index(json!([{"name": "nox/sast", "versions": [version("1.0.0", "passive")]}])),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bad.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve(
        &server,
        "/future.json",
        json!({"schema_version": "99", "plugins": []}),
    )
    .await;

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    let good = Source::new("good", format!("{}/good.json", server.uri()));
    client.add_source(good.clone()).unwrap();
    client
        .add_source(Source::new("bad", format!("{}/bad.json", server.uri())))
        .unwrap();
    client
        .add_source(Source::new("future", format!("{}/future.json", server.uri())))
        .unwrap();

    let err = client.refresh().await.unwrap_err();
    let RegistryError::Sources { errors } = &err else {
        panic!("expected aggregate, got {:?}", err);
    };
    let failed: Vec<_> = errors.iter().map(|e| (e.source.as_str(), e.kind)).collect();
    assert_eq!(
        failed,
        [("bad", ErrorKind::Transport), ("future", ErrorKind::Schema)]
    );

    // The healthy source was still cached.
    assert_eq!(client.cache().load(&good).await.unwrap().plugins.len(), 1);
}

#[tokio::test]
async fn test_schema_two_needs_opt_in() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/index.json",
        json!({
            "schema_version": "2",
            "plugins": [{
                "name": "nox/sast",
                "track": "core-analysis",
                "versions": [{
                    "version": "1.0.0",
                    "api_version": "v1",
                    "digest": format!("sha256:{}", "b".repeat(64)),
                    "artifacts": [{"os": "linux", "arch": "amd64",
                                   "url": "https://dl.example.com/sast.tar.gz",
                                   "size": 1024, "digest": format!("sha256:{}", "c".repeat(64))}]
                }]
            }]
        }),
    )
    .await;

    let source = Source::new("main", format!("{}/index.json", server.uri()));

    let cache = TempDir::new().unwrap();
    let mut client = create_test_client(&cache, HOUR);
    client.add_source(source.clone()).unwrap();
    let err = client.resolve("nox/sast", "1.0.0", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    let cache = TempDir::new().unwrap();
    let config = ClientConfig::new(cache.path()).with_supported_schemas(["1", "2"]);
    let mut client = RegistryClient::new(config).unwrap();
    client.add_source(source).unwrap();

    let resolved = client.resolve("nox/sast", "1.0.0", &[]).await.unwrap();
    assert_eq!(resolved.artifact_for("linux", "amd64").unwrap().size, 1024);
}
