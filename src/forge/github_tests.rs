use super::*;
use crate::{analyzer::commit::CommitType, forge::config::release_branch};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

fn github(server: &MockServer) -> Github {
    Github::new(RemoteConfig {
        host: "github.com".into(),
        api_url: Some(server.uri()),
        owner: "owner".into(),
        repo: "repo".into(),
        ..RemoteConfig::default()
    })
    .unwrap()
}

fn next_link(server: &MockServer, endpoint: &str, page: u32) -> String {
    format!(
        "<{}/repos/owner/repo/{endpoint}?page={page}>; rel=\"next\"",
        server.uri()
    )
}

fn commit_json(sha: &str, message: &str) -> serde_json::Value {
    json!({ "sha": sha, "commit": { "message": message } })
}

fn pr_json(number: u64, merge_sha: &str) -> serde_json::Value {
    json!({
        "number": number,
        "html_url": format!("https://github.com/owner/repo/pull/{number}"),
        "title": format!("PR {number}"),
        "body": null,
        "merge_commit_sha": merge_sha,
        "labels": [],
    })
}

#[tokio::test]
async fn test_urls_and_auth() {
    let server = MockServer::start().await;
    let forge = github(&server);

    assert_eq!(forge.repo_url(), "https://github.com/owner/repo");
    assert_eq!(forge.clone_url(), "https://github.com/owner/repo.git");
    assert_eq!(
        forge.release_url("v1.3.0"),
        "https://github.com/owner/repo/releases/tag/v1.3.0"
    );
    assert_eq!(forge.git_auth().username, "oauth2");
}

#[tokio::test]
async fn test_latest_tag_skips_non_release_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/tags"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link(&server, "tags", 2).as_str())
                .set_body_json(json!([
                    { "name": "nightly", "commit": { "sha": "n1" } },
                    { "name": "v1.2.0", "commit": { "sha": "t1" } },
                    { "name": "v1.1.0", "commit": { "sha": "t0" } },
                ])),
        )
        .mount(&server)
        .await;

    // the first page already holds a release tag
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/tags"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let tag = github(&server)
        .latest_tag(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tag, Some(Tag::new("t1", "v1.2.0")));
}

#[tokio::test]
async fn test_latest_tag_none_when_never_released() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let tag = github(&server)
        .latest_tag(&CancellationToken::new())
        .await
        .unwrap();

    assert!(tag.is_none());
}

#[tokio::test]
async fn test_commits_since_tag_pages_through_comparison() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100)
        .map(|i| commit_json(&format!("c{i}"), "chore: x"))
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/compare/t1...main"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_commits": 101,
            "commits": first,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/compare/t1...main"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_commits": 101,
            "commits": [commit_json("c100", "feat: last")],
        })))
        .mount(&server)
        .await;

    let commits = github(&server)
        .commits_since(
            &CancellationToken::new(),
            Some(Tag::new("t1", "v1.2.0")),
        )
        .await
        .unwrap();

    assert_eq!(commits.len(), 101);
    assert_eq!(commits[0].hash, "c0");
    assert_eq!(commits[100], Commit::new("c100", "feat: last"));
}

#[tokio::test]
async fn test_commits_since_without_tag_returns_full_history() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("sha", "main"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    next_link(&server, "commits", 2).as_str(),
                )
                .set_body_json(json!([
                    commit_json("c3", "feat: newest"),
                    commit_json("c2", "fix: middle"),
                ])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits"))
        .and(query_param("sha", "main"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([commit_json("c1", "chore: initial")])),
        )
        .mount(&server)
        .await;

    let commits = github(&server)
        .commits_since(&CancellationToken::new(), None)
        .await
        .unwrap();

    let hashes: Vec<&str> = commits.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(hashes, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_changesets_match_merge_commit_only() {
    let server = MockServer::start().await;

    // squash merged: merge commit is the commit itself
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits/a1/pulls"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([pr_json(9, "zz"), pr_json(1, "a1")])),
        )
        .mount(&server)
        .await;

    // commit only reachable through a merge commit: no match
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits/b2/pulls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([pr_json(2, "m2")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/commits/c3/pulls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([pr_json(3, "c3")])),
        )
        .mount(&server)
        .await;

    let changesets = github(&server)
        .changesets(
            &CancellationToken::new(),
            vec![
                Commit::new("a1", "feat(api): add retry option"),
                Commit::new("b2", "fix: lost in a merge"),
                Commit::new("c3", "Update README"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(changesets.len(), 1);
    let changeset = &changesets[0];
    assert_eq!(changeset.identifier, "#1");
    assert_eq!(changeset.url, "https://github.com/owner/repo/pull/1");
    assert_eq!(changeset.changelog_entries.len(), 1);
    assert_eq!(changeset.changelog_entries[0].commit_type, CommitType::Feat);
    assert_eq!(changeset.changelog_entries[0].scope.as_deref(), Some("api"));
}

#[tokio::test]
async fn test_pull_request_for_branch() {
    let server = MockServer::start().await;
    let branch = release_branch("main");

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .and(query_param("state", "open"))
        .and(query_param("head", format!("owner:{branch}").as_str()))
        .and(query_param("base", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "number": 12,
            "html_url": "https://github.com/owner/repo/pull/12",
            "title": "chore(main): release v1.3.0",
            "body": "description",
            "merge_commit_sha": null,
            "labels": [{ "name": PENDING_LABEL }],
        }])))
        .mount(&server)
        .await;

    let pr = github(&server)
        .pull_request_for_branch(&CancellationToken::new(), &branch)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        pr,
        ReleasePullRequest {
            id: 12,
            title: "chore(main): release v1.3.0".into(),
            description: "description".into(),
            labels: vec![PENDING_LABEL.into()],
        }
    );
}

#[tokio::test]
async fn test_pull_request_for_branch_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let pr = github(&server)
        .pull_request_for_branch(&CancellationToken::new(), "some-branch")
        .await
        .unwrap();

    assert!(pr.is_none());
}

#[tokio::test]
async fn test_create_pull_request_adds_pending_label() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/pulls"))
        .and(body_partial_json(json!({
            "head": "releaser-pleaser--branches--main",
            "base": "main",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/owner/repo/pull/7",
            "title": "chore(main): release v0.1.0",
            "body": "body",
            "merge_commit_sha": null,
            "labels": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/labels"))
        .and(body_partial_json(json!({ "name": PENDING_LABEL })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "name": PENDING_LABEL })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/issues/7/labels"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "name": PENDING_LABEL }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pr = github(&server)
        .create_pull_request(
            &CancellationToken::new(),
            CreatePrRequest {
                head_branch: "releaser-pleaser--branches--main".into(),
                base_branch: "main".into(),
                title: "chore(main): release v0.1.0".into(),
                body: "body".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(pr.id, 7);
    assert_eq!(pr.labels, vec![PENDING_LABEL.to_string()]);
}

#[tokio::test]
async fn test_update_pull_request_keeps_existing_label() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/repos/owner/repo/pulls/7"))
        .and(body_partial_json(json!({ "title": "chore(main): release v0.2.0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/owner/repo/pull/7",
            "title": "chore(main): release v0.2.0",
            "body": "new body",
            "merge_commit_sha": null,
            "labels": [{ "name": PENDING_LABEL }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/issues/7/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let pr = github(&server)
        .update_pull_request(
            &CancellationToken::new(),
            UpdatePrRequest {
                pr_number: 7,
                title: "chore(main): release v0.2.0".into(),
                body: "new body".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(pr.description, "new body");
}

#[tokio::test]
async fn test_cancelled_before_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = github(&server).latest_tag(&cancel).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ReleaserError>(),
        Some(ReleaserError::Cancelled)
    ));
}

#[test]
fn test_comparison_has_more() {
    assert!(comparison_has_more(1, 101));
    assert!(!comparison_has_more(2, 101));
    assert!(!comparison_has_more(1, 100));
    assert!(!comparison_has_more(1, 0));
}
