//! Integration tests for the patchpr CLI.
//!
//! These tests run the binary end-to-end; publishing talks to a mock GitHub.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODIFY_PATCH: &str = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1,3 +1,3 @@
 context1
-old2
+new2
 context3
";

/// Helper to get patchpr command.
fn patchpr() -> Command {
    Command::new(env!("CARGO_BIN_EXE_patchpr"))
}

/// Write `content` to `name` inside `dir`.
fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Config pointing the client at the mock server.
fn write_config(dir: &TempDir, server: &MockServer) -> PathBuf {
    write(
        dir,
        "patchpr.toml",
        &format!("[github]\napi_url = \"{}\"\ntimeout_secs = 5\n", server.uri()),
    )
}

/// Mount the lookups and object creations every publish of `MODIFY_PATCH`
/// goes through.
async fn mount_pipeline(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ref": "refs/heads/main",
            "object": { "sha": "base123", "type": "commit" }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/git/commits/base123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "base123",
            "tree": { "sha": "tree456" }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents/a.txt"))
        .and(query_param("ref", "base123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "encoding": "base64",
            "content": "Y29udGV4dDEKb2xk\nMgpjb250ZXh0Mw==\n"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/git/blobs"))
        .and(body_json(serde_json::json!({
            "content": "context1\nnew2\ncontext3",
            "encoding": "utf-8"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sha": "blob1" })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/git/trees"))
        .and(body_json(serde_json::json!({
            "base_tree": "tree456",
            "tree": [{ "path": "a.txt", "mode": "100644", "type": "blob", "sha": "blob1" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sha": "tree999" })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/git/commits"))
        .and(body_json(serde_json::json!({
            "message": "Update a.txt\n\nReplaces the second line.",
            "tree": "tree999",
            "parents": ["base123"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sha": "commit111" })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/git/refs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "ref": "refs/heads/agent-patch-20240101-000000",
            "object": { "sha": "commit111" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_version_flag() {
    patchpr()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("patchpr"));
}

#[test]
fn test_help_flag() {
    patchpr()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("branches"));
}

#[test]
fn test_no_subcommand_shows_help() {
    patchpr()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_completions() {
    patchpr()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patchpr"));
}

// ============================================================================
// Parse command tests
// ============================================================================

#[test]
fn test_parse_text_output() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", MODIFY_PATCH);

    patchpr()
        .arg("parse")
        .arg(&patch)
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("M a.txt (1 hunk, +1 -1)"));
}

#[test]
fn test_parse_json_from_stdin() {
    let output = patchpr()
        .args(["parse", "-", "--json"])
        .write_stdin(
            "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,2 @@\n+a\n+b\n@@ bogus @@\n",
        )
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["files"][0]["path"], "new.txt");
    assert_eq!(json["files"][0]["kind"], "new");
    assert_eq!(json["files"][0]["added"], 2);
    assert_eq!(json["diagnostics"].as_array().unwrap().len(), 1);
}

#[test]
fn test_parse_empty_patch_warns() {
    patchpr()
        .args(["parse", "-"])
        .write_stdin("nothing to see here\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("No file changes"));
}

#[test]
fn test_parse_missing_file() {
    patchpr()
        .args(["parse", "/nonexistent/change.diff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// ============================================================================
// Apply command tests
// ============================================================================

#[test]
fn test_apply_prints_reconstructed_content() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", MODIFY_PATCH);
    let original = write(&temp, "a.txt", "context1\nold2\ncontext3");

    patchpr()
        .arg("apply")
        .arg("--patch")
        .arg(&patch)
        .args(["--path", "a.txt", "--original"])
        .arg(&original)
        .assert()
        .success()
        .stdout("context1\nnew2\ncontext3");
}

#[test]
fn test_apply_strict_rejects_drift() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", MODIFY_PATCH);
    let original = write(&temp, "a.txt", "context1\nsomething else\ncontext3");

    patchpr()
        .arg("apply")
        .arg("--patch")
        .arg(&patch)
        .args(["--path", "a.txt", "--strict", "--original"])
        .arg(&original)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Patch does not apply to a.txt"))
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_apply_unknown_path() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", MODIFY_PATCH);

    patchpr()
        .arg("apply")
        .arg("--patch")
        .arg(&patch)
        .args(["--path", "b.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("b.txt is not changed by the patch"));
}

// ============================================================================
// Publish command tests
// ============================================================================

#[test]
fn test_publish_requires_repo_with_patch() {
    patchpr()
        .args(["publish", "--patch", "change.diff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repo"));
}

#[test]
fn test_publish_invalid_repo() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", MODIFY_PATCH);

    patchpr()
        .current_dir(&temp)
        .arg("publish")
        .arg("--patch")
        .arg(&patch)
        .args(["--repo", "not-a-repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid source 'not-a-repo'"));
}

#[test]
fn test_publish_empty_patch() {
    let temp = TempDir::new().unwrap();
    let patch = write(&temp, "change.diff", "no diff here\n");

    patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("publish")
        .arg("--patch")
        .arg(&patch)
        .args(["--repo", "owner/repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no file changes found in patch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publish_opens_pull_request() {
    let server = MockServer::start().await;
    mount_pipeline(&server).await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/pulls"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 7,
            "title": "Update a.txt",
            "body": "Replaces the second line.",
            "draft": false,
            "html_url": "https://github.com/owner/repo/pull/7",
            "head": { "ref": "agent-patch-20240101-000000" },
            "base": { "ref": "main" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server);
    let patch = write(&temp, "change.diff", MODIFY_PATCH);

    patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(&config)
        .arg("publish")
        .arg("--patch")
        .arg(&patch)
        .args([
            "--repo",
            "owner/repo",
            "--message",
            "Update a.txt\n\nReplaces the second line.",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened pull request #7"))
        .stdout(predicate::str::contains("https://github.com/owner/repo/pull/7"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publish_change_set_branch_only_json() {
    let server = MockServer::start().await;
    mount_pipeline(&server).await;

    Mock::given(method("POST"))
        .and(path("/repos/owner/repo/pulls"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server);
    let artifact = serde_json::json!({
        "changeSet": {
            "source": "sources/github/owner/repo",
            "gitPatch": {
                "unidiffPatch": MODIFY_PATCH,
                "suggestedCommitMessage": "Update a.txt\n\nReplaces the second line."
            }
        }
    });
    let change_set = write(&temp, "change-set.json", &artifact.to_string());

    let output = patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(&config)
        .arg("publish")
        .arg("--change-set")
        .arg(&change_set)
        .args(["--branch-only", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["type"], "branch");
    assert_eq!(json["title"], "Update a.txt");
    assert_eq!(json["commit"], "commit111");
    assert_eq!(json["files"][0]["outcome"], "modified");
    assert!(
        json["branch_url"]
            .as_str()
            .unwrap()
            .starts_with("https://github.com/owner/repo/tree/agent-patch-")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publish_from_activity_list() {
    let server = MockServer::start().await;
    mount_pipeline(&server).await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server);
    let activities = serde_json::json!({
        "activities": [
            { "artifacts": [{ "changeSet": {
                "source": "sources/github/owner/repo",
                "gitPatch": { "unidiffPatch": "stale", "suggestedCommitMessage": "Old" }
            }}]},
            { "sessionCompleted": {}, "artifacts": [{ "changeSet": {
                "source": "sources/github/owner/repo",
                "gitPatch": {
                    "unidiffPatch": MODIFY_PATCH,
                    "suggestedCommitMessage": "Update a.txt\n\nReplaces the second line."
                }
            }}]}
        ]
    });
    let activities = write(&temp, "activities.json", &activities.to_string());

    let output = patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(&config)
        .arg("publish")
        .arg("--activities")
        .arg(&activities)
        .args(["--branch-only", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["type"], "branch");
    assert_eq!(json["commit"], "commit111");
}

#[test]
fn test_publish_activity_list_without_change_set() {
    let temp = TempDir::new().unwrap();
    let activities = write(&temp, "activities.json", r#"[{"progressUpdated": {}}]"#);

    patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("publish")
        .arg("--activities")
        .arg(&activities)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No change set found in the activity list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publish_reports_failed_step() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server);
    let patch = write(&temp, "change.diff", MODIFY_PATCH);

    patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(&config)
        .arg("publish")
        .arg("--patch")
        .arg(&patch)
        .args(["--repo", "owner/repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolve_base failed"));
}

// ============================================================================
// Branches command tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_branches_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "main", "protected": true },
            { "name": "agent-patch-20240101-000000", "protected": false }
        ])))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server);

    let output = patchpr()
        .current_dir(&temp)
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(&config)
        .args(["branches", "--repo", "owner/repo", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json[0]["name"], "main");
    assert_eq!(json[0]["protected"], true);
    assert_eq!(json[1]["protected"], false);
}
