//! End-to-end harvest runs against a wiremock server

use std::fs;

use repoharvest_core::{
    AssignmentPolicy, ClientConfig, Credential, HarvestConfig, Harvester, ORGANIZATIONS_FILE,
    REPOSITORIES_FILE, USERS_FILE,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvester_for(server: &MockServer) -> Harvester {
    Harvester::with_config(ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        max_retries: 0,
    })
    .unwrap()
}

#[tokio::test]
async fn test_full_run_writes_three_files() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer token-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "items": [
                {
                    "name": "widget",
                    "full_name": "alice/widget",
                    "owner": {"login": "alice", "type": "User"},
                    "stargazers_count": 12,
                    "topics": ["cli", "rust"],
                    "license": {"name": "MIT License"}
                },
                {
                    "name": "gadget",
                    "full_name": "alice/gadget",
                    "owner": {"login": "alice", "type": "User"}
                },
                {
                    "name": "engine",
                    "full_name": "acme/engine",
                    "owner": {"login": "acme", "type": "Organization"},
                    "description": "Fast, small"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "alice",
            "name": "Alice",
            "followers": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "acme",
            "public_repos": 40
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let config = HarvestConfig {
        queries: vec!["stars:>10".to_string()],
        max_pages: 2,
        concurrency: 4,
        output_dir: output.path().to_path_buf(),
        ..HarvestConfig::default()
    };

    let summary = harvester_for(&server)
        .run(
            &config,
            Credential::new("primary", "token-a"),
            Credential::new("secondary", "token-b"),
        )
        .await
        .unwrap();

    assert_eq!(summary.repositories, 3);
    assert_eq!(summary.users.succeeded, 1);
    assert_eq!(summary.organizations.succeeded, 1);
    assert_eq!(summary.files_written.len(), 3);

    let repositories = fs::read_to_string(output.path().join(REPOSITORIES_FILE)).unwrap();
    let lines: Vec<&str> = repositories.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("name,full_name,owner,owner_type"));
    assert!(lines[1].contains("cli;rust"));
    assert!(lines[1].contains("MIT License"));
    assert!(lines[3].contains("\"Fast, small\""));

    let users = fs::read_to_string(output.path().join(USERS_FILE)).unwrap();
    assert_eq!(users.lines().count(), 2);
    assert!(users.lines().nth(1).unwrap().starts_with("alice,Alice,N/A"));

    let organizations = fs::read_to_string(output.path().join(ORGANIZATIONS_FILE)).unwrap();
    assert_eq!(organizations.lines().count(), 2);
    assert!(organizations.contains("acme"));
}

#[tokio::test]
async fn test_run_without_organizations_writes_header_only_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "solo", "owner": {"login": "bob", "type": "User"}}]
        })))
        .mount(&server)
        .await;

    // Detail lookups fail; the run still completes
    Mock::given(method("GET"))
        .and(path("/users/bob"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let config = HarvestConfig {
        queries: vec!["solo".to_string()],
        max_pages: 1,
        assignment: AssignmentPolicy::RoundRobin,
        output_dir: output.path().to_path_buf(),
        ..HarvestConfig::default()
    };

    let summary = harvester_for(&server)
        .run(
            &config,
            Credential::new("primary", "token-a"),
            Credential::new("secondary", "token-b"),
        )
        .await
        .unwrap();

    assert_eq!(summary.repositories, 1);
    assert_eq!(summary.users.failed, 1);
    assert_eq!(summary.organizations.requested, 0);

    let users = fs::read_to_string(output.path().join(USERS_FILE)).unwrap();
    assert_eq!(users.lines().count(), 1);

    let organizations = fs::read_to_string(output.path().join(ORGANIZATIONS_FILE)).unwrap();
    assert_eq!(
        organizations,
        "login,name,description,blog,location,email,public_repos,followers,created_at\n"
    );
}

#[tokio::test]
async fn test_run_reports_unwritable_output_without_failing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let config = HarvestConfig {
        queries: vec!["nothing".to_string()],
        max_pages: 1,
        output_dir: output.path().join("missing"),
        ..HarvestConfig::default()
    };

    let summary = harvester_for(&server)
        .run(
            &config,
            Credential::new("primary", "token-a"),
            Credential::new("secondary", "token-b"),
        )
        .await
        .unwrap();

    assert_eq!(summary.repositories, 0);
    assert!(summary.files_written.is_empty());
}
