//! End-to-end agent runs over real filesystem and git adapters.
//!
//! Text generation is scripted and the remote repository is faked; everything
//! else (file reads and writes, commits) touches a temporary git repository.

use std::fs;
use std::path::Path;

use serde_json::json;

use devmate::agent::{AUTOFIX_COMMIT_MESSAGE, Agent};
use devmate::core::types::ReviewComment;
use devmate::error::DevmateError;
use devmate::executor::{ActionExecutor, Toolbox};
use devmate::io::config::{ContextConfig, GitConfig};
use devmate::io::context::RepoContextBuilder;
use devmate::io::fs::Filesystem;
use devmate::io::git::Git;
use devmate::test_support::{FakeRemoteRepo, RecordingExecutor, ScriptedGenerator, TestRepo};

fn executor_at(root: &Path, remote: FakeRemoteRepo) -> ActionExecutor {
    ActionExecutor::new(Toolbox {
        fs: Filesystem::new(root),
        git: Git::new(root, &GitConfig::default()),
        remote: Box::new(remote),
    })
}

fn context_at(root: &Path) -> RepoContextBuilder {
    RepoContextBuilder::new(root, ContextConfig::default())
}

fn review_comment(id: u64, path: Option<&str>, body: &str) -> ReviewComment {
    ReviewComment {
        id: Some(id),
        path: path.map(str::to_string),
        body: Some(body.to_string()),
        line: Some(1),
    }
}

const REVIEW_PLAN: &str = r#"[{"action": "github_list_review_comments", "payload": {"repo": "owner/repo", "pr_number": 12}}]"#;

#[test]
fn say_hello_runs_both_steps_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let generator = ScriptedGenerator::new([
        "[]",
        r#"[{"action":"noop"},{"action":"print","payload":{"message":"Hello"}}]"#,
    ]);
    let agent = Agent::new(
        &generator,
        executor_at(temp.path(), FakeRemoteRepo::default()),
        context_at(temp.path()),
    );

    let results = agent.run("say hello").expect("run");

    assert_eq!(
        serde_json::to_value(&results).expect("serialize"),
        json!([
            {"action": "noop", "result": {"status": "ok"}},
            {"action": "print", "result": {"printed": "Hello"}},
        ])
    );
    assert_eq!(generator.remaining(), 0);
}

#[test]
fn unstructured_plan_fails_before_any_execution() {
    let temp = tempfile::tempdir().expect("tempdir");
    let generator = ScriptedGenerator::new(["[]", "Sure! First, I would look at the code."]);
    let executor = RecordingExecutor::new();
    let agent = Agent::new(&generator, &executor, context_at(temp.path()));

    let err = agent.run("do something").expect_err("planning fails");

    assert!(matches!(err, DevmateError::PlanningFailed(_)), "{err:?}");
    assert!(executor.actions().is_empty());
}

#[test]
fn written_file_is_read_back_in_the_same_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let generator = ScriptedGenerator::new([
        "[]",
        r#"[
            {"action": "write_file", "payload": {"path": "notes/todo.md", "content": "- ship it\n"}},
            {"action": "read_file", "payload": {"path": "notes/todo.md"}},
            {"action": "list_files", "payload": {"path": "notes"}}
        ]"#,
    ]);
    let agent = Agent::new(
        &generator,
        executor_at(temp.path(), FakeRemoteRepo::default()),
        context_at(temp.path()),
    );

    let results = agent.run("write a todo note").expect("run");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].result, json!({"written": "notes/todo.md"}));
    assert_eq!(results[1].result, json!({"content": "- ship it\n", "exists": true}));
    assert_eq!(results[2].result, json!({"files": ["notes/todo.md"]}));
    assert_eq!(
        fs::read_to_string(temp.path().join("notes/todo.md")).expect("read"),
        "- ship it\n"
    );
}

#[test]
fn review_comments_are_fixed_written_and_committed_once() {
    let repo = TestRepo::new().expect("repo");
    repo.write("file.py", "x=1\n").expect("write");
    repo.commit_all("initial").expect("commit");

    let remote = FakeRemoteRepo::with_review_comments(vec![
        review_comment(1, Some("file.py"), "Use better variable names"),
        review_comment(2, None, "General comment"),
    ]);
    let generator = ScriptedGenerator::new(["[\"file.py\"]", REVIEW_PLAN, "better_name = 1\n"]);
    let agent = Agent::new(
        &generator,
        executor_at(repo.path(), remote),
        context_at(repo.path()),
    );

    let results = agent.run("fix review comments on PR 12 in owner/repo").expect("run");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].action, "github_list_review_comments");
    assert_eq!(results[0].result["comments"].as_array().map(Vec::len), Some(2));

    assert_eq!(
        fs::read_to_string(repo.path().join("file.py")).expect("read"),
        "better_name = 1\n"
    );
    assert_eq!(
        repo.log_subjects().expect("log"),
        vec![AUTOFIX_COMMIT_MESSAGE.to_string(), "initial".to_string()]
    );

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("--- FILE: file.py ---\nx=1"));
    assert!(prompts[2].contains("Use better variable names"));
    assert!(prompts[2].contains("x=1"));
}

#[test]
fn no_review_comments_means_no_commit() {
    let repo = TestRepo::new().expect("repo");
    repo.write("file.py", "x=1\n").expect("write");
    repo.commit_all("initial").expect("commit");

    let generator = ScriptedGenerator::new(["[]", REVIEW_PLAN]);
    let agent = Agent::new(
        &generator,
        executor_at(repo.path(), FakeRemoteRepo::with_review_comments(Vec::new())),
        context_at(repo.path()),
    );

    let results = agent.run("fix review comments on PR 12").expect("run");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].result, json!({"comments": []}));
    assert_eq!(repo.log_subjects().expect("log"), vec!["initial".to_string()]);
    assert_eq!(generator.remaining(), 0);
}
