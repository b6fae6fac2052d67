//! The reqwest-backed client against a local mock of the GitHub API.

use gh_housekeeping::config::Config;
use gh_housekeeping::fetch::fetch_activity;
use gh_housekeeping::github::{ApiError, GithubApi, GithubClient};
use gh_housekeeping::policy::{ListScope, PolicySetter, Repository};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GithubClient {
    let config = Config {
        token: "test-token".to_string(),
        username: "octocat".to_string(),
        api_url: format!("{}/", server.uri()),
    };
    GithubClient::new(&config).unwrap()
}

#[tokio::test]
async fn graphql_returns_data_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "query": "query { viewer { login } }",
            "variables": { "x": 1 }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "viewer": { "login": "octocat" } } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = client_for(&server)
        .graphql("query { viewer { login } }", json!({ "x": 1 }))
        .await
        .unwrap();

    assert_eq!(data, json!({ "viewer": { "login": "octocat" } }));
}

#[tokio::test]
async fn graphql_errors_fail_even_with_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Could not resolve to a User with the login of 'ghost'." }]
        })))
        .mount(&server)
        .await;

    let err = fetch_activity(&client_for(&server), "ghost").await.unwrap_err();

    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert!(matches!(api_err, ApiError::GraphQl(msg) if msg.contains("Could not resolve")));
}

#[tokio::test]
async fn graphql_server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).graphql("{ x }", json!({})).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 502, ref body } if body == "Bad Gateway"));
}

#[tokio::test]
async fn rest_requests_carry_api_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "app", "owner": { "login": "octocat" }, "fork": false, "archived": false },
            { "name": "gone", "owner": { "login": "octocat" }, "fork": false, "archived": true }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let repos = PolicySetter::new(&client, "octocat", ListScope::Authenticated)
        .list_repositories()
        .await
        .unwrap();

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].name, "app");
}

#[tokio::test]
async fn rest_non_success_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json("/users/octocat/repos?page=1")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn fork_rename_patches_repository() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/upstream"))
        .and(body_json(json!({ "name": "fork-upstream" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "fork-upstream" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let setter = PolicySetter::new(&client, "octocat", ListScope::Authenticated);

    assert!(
        setter
            .set_fork_name(&Repository::new("octocat", "upstream"))
            .await
            .unwrap()
    );
    assert!(
        !setter
            .set_fork_name(&Repository::new("octocat", "fork-upstream"))
            .await
            .unwrap()
    );
}
