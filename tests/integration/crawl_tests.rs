//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::time::Duration;
use web_trawl::config::{ExtractionRule, LimitRule, PaginationSpec, RunConfig, ScopeConfig};
use web_trawl::state::PageState;
use web_trawl::{configure_run, crawl, Engine, EngineState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Extracts the host of the mock server (e.g., "127.0.0.1")
fn server_host(server: &MockServer) -> String {
    url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_with_scope() {
    let server = MockServer::start().await;

    // 3 anchors: 2 in scope, 1 out of scope
    mount_page(
        &server,
        "/",
        r#"<a href="/page1">1</a>
           <a href="page2">2</a>
           <a href="https://outside.invalid/page3">3</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/page1", "Content 1", 1).await;
    mount_page(&server, "/page2", "Content 2", 1).await;

    let mut engine = configure_run(
        vec![format!("{}/", server.uri())],
        Vec::new(),
        ScopeConfig::allowed([server_host(&server)]),
        None,
        4,
    )
    .expect("Failed to configure run");

    let summary = engine.wait().await;

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.skipped_out_of_scope, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.complete);
    assert_eq!(engine.state(), EngineState::Done);
}

#[tokio::test]
async fn test_cyclic_links_visit_each_page_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/one", r#"<a href="/two">two</a>"#, 1).await;
    mount_page(
        &server,
        "/two",
        r#"<a href="/one">one</a><a href="/two#again">self</a>"#,
        1,
    )
    .await;

    let summary = configure_run(
        vec![format!("{}/one", server.uri())],
        Vec::new(),
        ScopeConfig::unrestricted(),
        None,
        4,
    )
    .expect("Failed to configure run")
    .run()
    .await;

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.skipped_duplicate, 2);
}

#[tokio::test]
async fn test_pagination_mode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html("no links"))
        .expect(5)
        .mount(&server)
        .await;

    let mut engine = configure_run(
        Vec::new(),
        Vec::new(),
        ScopeConfig::unrestricted(),
        Some(PaginationSpec {
            template: format!("{}/list?p=%d", server.uri()),
            start: 1,
            end: 5,
        }),
        4,
    )
    .expect("Failed to configure run");

    let summary = engine.wait().await;
    assert_eq!(summary.visited, 5);

    let requests = server
        .received_requests()
        .await
        .expect("Request recording disabled");
    let mut pages: Vec<String> = requests
        .iter()
        .filter_map(|r| r.url.query().map(str::to_string))
        .collect();
    pages.sort();
    assert_eq!(pages, vec!["p=1", "p=2", "p=3", "p=4", "p=5"]);
}

#[tokio::test]
async fn test_fetch_failures_are_recorded_not_fatal() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">gone</a><a href="/broken">broken</a><a href="/ok">ok</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/ok", "fine", 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // "/missing" falls through to wiremock's default 404

    let summary = configure_run(
        vec![format!("{}/", server.uri())],
        Vec::new(),
        ScopeConfig::unrestricted(),
        None,
        2,
    )
    .expect("Failed to configure run")
    .run()
    .await;

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.failed, 2);
    assert!(summary.complete);

    let by_state = summary.failures_by_state();
    assert_eq!(by_state.get(&PageState::DeadLink), Some(&1));
    assert_eq!(by_state.get(&PageState::Failed), Some(&1));
}

#[tokio::test]
async fn test_css_rules_select_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<nav><a href="/about">about</a></nav>
           <div class="item"><h2><a href="/item/1">1</a></h2></div>
           <div class="item"><a href="/item/2">2</a></div>
           <div class="item">no link</div>"#,
        1,
    )
    .await;
    mount_page(&server, "/item/1", "", 1).await;
    mount_page(&server, "/item/2", "", 1).await;
    mount_page(&server, "/about", "", 0).await;

    let summary = configure_run(
        vec![format!("{}/", server.uri())],
        vec![ExtractionRule::selector("div.item")],
        ScopeConfig::unrestricted(),
        None,
        4,
    )
    .expect("Failed to configure run")
    .run()
    .await;

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.links_found, 2);
}

#[tokio::test]
async fn test_relative_links_resolve_against_final_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(&server, "/new/", r#"<a href="child">child</a>"#, 1).await;
    mount_page(&server, "/new/child", "", 1).await;

    let summary = configure_run(
        vec![format!("{}/old", server.uri())],
        Vec::new(),
        ScopeConfig::unrestricted(),
        None,
        4,
    )
    .expect("Failed to configure run")
    .run()
    .await;

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_not_followed() {
    let inside = MockServer::start().await;
    let outside = MockServer::start().await;
    let outside_port = outside.address().port();

    // Only "localhost" is allowed, so 127.0.0.1 counts as a foreign host
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "location",
            format!("http://127.0.0.1:{}/secret", outside_port).as_str(),
        ))
        .expect(1)
        .mount(&inside)
        .await;
    mount_page(&outside, "/secret", r#"<a href="/more">more</a>"#, 0).await;

    let summary = configure_run(
        vec![format!("http://localhost:{}/", inside.address().port())],
        Vec::new(),
        ScopeConfig::allowed(["localhost"]),
        None,
        2,
    )
    .expect("Failed to configure run")
    .run()
    .await;

    assert_eq!(summary.visited, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.redirected_out_of_scope, 1);
    assert_eq!(summary.skipped_out_of_scope, 1);
    assert!(summary.complete);
}

#[tokio::test]
async fn test_disk_cache_serves_second_run() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().expect("Failed to create temp dir");

    mount_page(&server, "/", r#"<a href="/child">child</a>"#, 1).await;
    mount_page(&server, "/child", "", 1).await;

    let config = || {
        let mut config = RunConfig {
            seeds: vec![format!("{}/", server.uri())],
            ..RunConfig::default()
        };
        config.fetch.cache_dir = Some(cache_dir.path().to_path_buf());
        config
    };

    let first = crawl(config()).await.expect("First crawl failed");
    let second = crawl(config()).await.expect("Second crawl failed");

    assert_eq!(first.visited, 2);
    assert_eq!(first.from_cache, 0);
    assert_eq!(second.visited, 2);
    assert_eq!(second.from_cache, 2);
}

#[tokio::test]
async fn test_max_depth_limits_crawl() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/d1">d1</a>"#, 1).await;
    mount_page(&server, "/d1", r#"<a href="/d2">d2</a>"#, 1).await;
    mount_page(&server, "/d2", "", 0).await;

    let config = RunConfig {
        seeds: vec![format!("{}/", server.uri())],
        max_depth: Some(1),
        ..RunConfig::default()
    };
    let summary = crawl(config).await.expect("Crawl failed");

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.skipped_depth, 1);
}

#[tokio::test]
async fn test_deadline_stops_run_gracefully() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("").set_delay(Duration::from_millis(700)))
        .mount(&server)
        .await;

    let config = RunConfig {
        pagination: Some(PaginationSpec {
            template: format!("{}/slow?p=%d", server.uri()),
            start: 1,
            end: 5,
        }),
        limits: vec![LimitRule {
            parallelism: 1,
            ..LimitRule::default()
        }],
        deadline_secs: Some(1),
        ..RunConfig::default()
    };
    let summary = Engine::new(config)
        .expect("Failed to build engine")
        .run()
        .await;

    assert!(!summary.complete);
    assert!(summary.visited >= 1);
    assert!(summary.abandoned >= 1);
    assert_eq!(summary.visited + summary.abandoned, 5);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_configuration_errors_are_fatal() {
    let no_work = configure_run(
        Vec::new(),
        Vec::new(),
        ScopeConfig::unrestricted(),
        None,
        4,
    );
    assert!(no_work.is_err());

    let zero_parallelism = configure_run(
        vec!["https://example.com/".to_string()],
        Vec::new(),
        ScopeConfig::unrestricted(),
        None,
        0,
    );
    assert!(zero_parallelism.is_err());

    let bad_selector = configure_run(
        vec!["https://example.com/".to_string()],
        vec![ExtractionRule::selector("div[[")],
        ScopeConfig::unrestricted(),
        None,
        4,
    );
    assert!(bad_selector.is_err());

    let config = RunConfig {
        seeds: vec!["https://example.com/".to_string()],
        limits: vec![LimitRule {
            domain_regex: "(unclosed".to_string(),
            ..LimitRule::default()
        }],
        ..RunConfig::default()
    };
    assert!(crawl(config).await.is_err());
}
