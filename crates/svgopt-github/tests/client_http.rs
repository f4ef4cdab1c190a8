//! HTTP-level tests for GitHubClient against a mock GitHub API.

use serde_json::json;
use svgopt_core::fakes::RecordingEngine;
use svgopt_core::{
    ChangeId, ChangeStatus, Encoding, FileUpdate, OptimizationConfig, Optimizer,
    RepositoryContentService, RepositoryError, RunOptions, RunState, SvgPipeline,
};
use svgopt_github::{EventContext, GitHubClient, GitHubConfig};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use std::sync::Arc;

fn event() -> EventContext {
    EventContext {
        number: 7,
        head_ref: "feature/icons".to_string(),
    }
}

fn client(server: &MockServer) -> GitHubClient {
    let config = GitHubConfig::new(&server.uri(), "octo/site").with_token("tkn");
    GitHubClient::new(config, Some(event())).expect("valid client")
}

fn pull_file(name: &str, status: &str) -> serde_json::Value {
    json!({ "sha": "x", "filename": name, "status": status, "additions": 1, "deletions": 0 })
}

/// Test: listing follows pagination until a short page
#[tokio::test]
async fn test_list_changed_files_paginates() {
    let server = MockServer::start().await;

    let first_page: Vec<_> = (0..100)
        .map(|i| pull_file(&format!("icons/{i}.svg"), "added"))
        .collect();
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/pulls/7/files"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .and(header("authorization", "Bearer tkn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/pulls/7/files"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pull_file("old.svg", "removed"),
            pull_file("docs/readme.md", "modified"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let files = client(&server)
        .list_changed_files(&ChangeId(7))
        .await
        .expect("listing succeeds");

    assert_eq!(files.len(), 102);
    assert_eq!(files[0].path, "icons/0.svg");
    assert_eq!(files[0].status, ChangeStatus::Added);
    assert_eq!(files[100].status, ChangeStatus::Removed);
    assert_eq!(files[101].path, "docs/readme.md");
}

/// Test: contents are fetched at the head branch
#[tokio::test]
async fn test_fetch_file_content_at_head() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/icons/logo.svg"))
        .and(query_param("ref", "feature/icons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "base64",
            "path": "icons/logo.svg",
            "sha": "blob1",
            "content": "PHN2Zz48\nL3N2Zz4=\n",
        })))
        .mount(&server)
        .await;

    let file = client(&server)
        .fetch_file_content("icons/logo.svg")
        .await
        .expect("fetch succeeds");

    assert_eq!(file.path, "icons/logo.svg");
    assert_eq!(file.encoding, "base64");
    assert_eq!(file.sha.as_deref(), Some("blob1"));
    assert_eq!(Encoding::Base64.decode(&file.raw_content).unwrap(), "<svg></svg>");
}

/// Test: 404 maps to NotFound
#[tokio::test]
async fn test_fetch_missing_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/.svgo.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_file_content(".svgo.json")
        .await
        .unwrap_err();
    assert_eq!(err, RepositoryError::NotFound(".svgo.json".to_string()));
}

/// Test: server errors map to Transport with status and body
#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/pulls/7/files"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_changed_files(&ChangeId(7))
        .await
        .unwrap_err();
    match err {
        RepositoryError::Transport(msg) => {
            assert!(msg.contains("502"), "{msg}");
            assert!(msg.contains("bad gateway"), "{msg}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

/// Test: undecodable JSON maps to InvalidResponse
#[tokio::test]
async fn test_unexpected_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/icons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"type": "dir"}])))
        .mount(&server)
        .await;

    let err = client(&server).fetch_file_content("icons").await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidResponse(_)));
}

/// Test: commits go to the head branch with the previous blob sha
#[tokio::test]
async fn test_commit_file() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/site/contents/icons/logo.svg"))
        .and(body_json(json!({
            "message": "Optimize 'icons/logo.svg' with svgopt",
            "content": "PHN2Zy8+",
            "sha": "blob1",
            "branch": "feature/icons",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "path": "icons/logo.svg", "sha": "blob2" },
            "commit": { "sha": "c0ffee", "html_url": "https://github.com/octo/site/commit/c0ffee" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .commit_file(&FileUpdate {
            path: "icons/logo.svg".to_string(),
            content: "PHN2Zy8+".to_string(),
            encoding: Encoding::Base64,
            message: "Optimize 'icons/logo.svg' with svgopt".to_string(),
            sha: Some("blob1".to_string()),
        })
        .await
        .expect("commit succeeds");

    assert_eq!(result.commit_sha, "c0ffee");
    assert_eq!(
        result.url.as_deref(),
        Some("https://github.com/octo/site/commit/c0ffee")
    );
}

/// Test: a full run against the mock API commits only the changed SVG
#[tokio::test]
async fn test_pipeline_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/pulls/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pull_file("a.svg", "added"),
            pull_file("gone.svg", "removed"),
            pull_file("main.rs", "modified"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/contents/a.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "encoding": "base64",
            "path": "a.svg",
            "sha": "blob1",
            // "<svg>  </svg>"
            "content": "PHN2Zz4gIDwvc3ZnPg==",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octo/site/contents/a.svg"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "commit": { "sha": "abc1234", "html_url": null },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = Arc::new(RecordingEngine::new());
    let optimizer = Optimizer::new(engine.clone(), OptimizationConfig::default());
    let report = SvgPipeline::run(&client(&server), &optimizer, &RunOptions::default()).await;

    assert!(report.success, "{:?}", report.outcomes);
    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.total_changes, 3);
    assert_eq!(report.committed_count(), 1);
    assert_eq!(engine.calls(), 1);
}

/// Test: without a pull request in the event the run aborts without any request
#[tokio::test]
async fn test_pipeline_without_pull_request() {
    let server = MockServer::start().await;
    let client = GitHubClient::new(GitHubConfig::new(&server.uri(), "octo/site"), None)
        .expect("valid client");
    let optimizer = Optimizer::new(Arc::new(RecordingEngine::new()), OptimizationConfig::default());

    let report = SvgPipeline::run(&client, &optimizer, &RunOptions::default()).await;

    assert_eq!(report.state, RunState::Failed);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
