//! Action executor: the only path from a plan step to a side effect.
//!
//! Actions resolve through an explicit [`ActionRegistry`] built once at
//! startup. Each handler checks its own payload before touching the
//! filesystem, git, or the remote repository.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::core::actions;
use crate::core::types::Payload;
use crate::error::{DevmateError, Result};
use crate::io::config::Settings;
use crate::io::fs::Filesystem;
use crate::io::git::Git;
use crate::io::github::{GithubClient, Listing, RemoteRepo};

/// Executes one named action with an optional payload.
pub trait Executor {
    fn execute(&self, action: &str, payload: Option<&Payload>) -> Result<Value>;
}

impl<T: Executor + ?Sized> Executor for &T {
    fn execute(&self, action: &str, payload: Option<&Payload>) -> Result<Value> {
        (**self).execute(action, payload)
    }
}

/// Collaborators available to handlers.
pub struct Toolbox {
    pub fs: Filesystem,
    pub git: Git,
    pub remote: Box<dyn RemoteRepo>,
}

impl Toolbox {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            fs: Filesystem::new(&settings.workdir),
            git: Git::new(&settings.workdir, &settings.config.git),
            remote: Box::new(GithubClient::new(settings)?),
        })
    }
}

/// Handler signature: collaborators plus the step payload (empty when absent).
pub type Handler = fn(&Toolbox, &Payload) -> Result<Value>;

/// Action name → handler table.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<&'static str, Handler>,
}

impl ActionRegistry {
    /// Registry holding every whitelisted action.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(actions::NOOP, handle_noop);
        registry.register(actions::PRINT, handle_print);
        registry.register(actions::READ_FILE, handle_read_file);
        registry.register(actions::WRITE_FILE, handle_write_file);
        registry.register(actions::LIST_FILES, handle_list_files);
        registry.register(actions::GIT_STATUS, handle_git_status);
        registry.register(actions::GIT_DIFF, handle_git_diff);
        registry.register(actions::GIT_COMMIT, handle_git_commit);
        registry.register(actions::GITHUB_LIST_PRS, handle_github_list_prs);
        registry.register(actions::GITHUB_GET_PR, handle_github_get_pr);
        registry.register(actions::GITHUB_GET_PR_COMMENTS, handle_github_get_pr_comments);
        registry.register(
            actions::GITHUB_LIST_REVIEW_COMMENTS,
            handle_github_list_review_comments,
        );
        registry
    }

    /// Add or replace a handler, returning the previous one.
    pub fn register(&mut self, name: &'static str, handler: Handler) -> Option<Handler> {
        self.handlers.insert(name, handler)
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

/// Registry-backed executor over real collaborators.
pub struct ActionExecutor {
    registry: ActionRegistry,
    tools: Toolbox,
}

impl ActionExecutor {
    pub fn new(tools: Toolbox) -> Self {
        Self::with_registry(tools, ActionRegistry::builtin())
    }

    pub fn with_registry(tools: Toolbox, registry: ActionRegistry) -> Self {
        Self { registry, tools }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(Toolbox::from_settings(settings)?))
    }
}

impl Executor for ActionExecutor {
    #[instrument(skip(self, payload))]
    fn execute(&self, action: &str, payload: Option<&Payload>) -> Result<Value> {
        let handler = self
            .registry
            .get(action)
            .ok_or_else(|| DevmateError::UnknownAction(action.to_string()))?;
        let empty = Payload::new();
        let payload = payload.unwrap_or(&empty);
        debug!(keys = ?payload.keys().collect::<Vec<_>>(), "executing action");
        handler(&self.tools, payload)
    }
}

fn handle_noop(_tools: &Toolbox, _payload: &Payload) -> Result<Value> {
    info!("no-op action executed");
    Ok(json!({"status": "ok"}))
}

fn handle_print(_tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let message = match payload.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    println!("{message}");
    Ok(json!({"printed": message}))
}

fn handle_read_file(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let path = required_str(actions::READ_FILE, payload, "path")?;
    let result = match tools.fs.read_optional(path)? {
        Some(content) => json!({"content": content, "exists": true}),
        None => json!({"content": "", "exists": false}),
    };
    Ok(result)
}

fn handle_write_file(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let path = required_str(actions::WRITE_FILE, payload, "path")?;
    let content = match payload.get("content") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(_) => return Err(DevmateError::invalid_payload(actions::WRITE_FILE, "content")),
    };
    tools.fs.write(path, content)?;
    Ok(json!({"written": path}))
}

fn handle_list_files(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let path = match payload.get("path") {
        None | Some(Value::Null) => ".",
        Some(Value::String(path)) if !path.is_empty() => path.as_str(),
        Some(_) => return Err(DevmateError::invalid_payload(actions::LIST_FILES, "path")),
    };
    Ok(json!({"files": tools.fs.list(path)?}))
}

fn handle_git_status(tools: &Toolbox, _payload: &Payload) -> Result<Value> {
    Ok(json!({"status": tools.git.status()?}))
}

fn handle_git_diff(tools: &Toolbox, _payload: &Payload) -> Result<Value> {
    Ok(json!({"diff": tools.git.diff()?}))
}

fn handle_git_commit(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let message = required_str(actions::GIT_COMMIT, payload, "message")?;
    Ok(json!({"commit": tools.git.commit(message)?}))
}

fn handle_github_list_prs(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let repo = required_repo(actions::GITHUB_LIST_PRS, payload)?;
    Ok(match tools.remote.list_open_prs(repo)? {
        Listing::Items(prs) => json!({"prs": prs}),
        Listing::Error(error) => json!({"error": error}),
    })
}

fn handle_github_get_pr(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let repo = required_repo(actions::GITHUB_GET_PR, payload)?;
    let number = required_number(actions::GITHUB_GET_PR, payload, "pr")?;
    Ok(json!({"pr": tools.remote.get_pr(repo, number)?}))
}

fn handle_github_get_pr_comments(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let repo = required_repo(actions::GITHUB_GET_PR_COMMENTS, payload)?;
    let number = required_number(actions::GITHUB_GET_PR_COMMENTS, payload, "pr")?;
    Ok(json!({"comments": tools.remote.get_pr_comments(repo, number)?}))
}

fn handle_github_list_review_comments(tools: &Toolbox, payload: &Payload) -> Result<Value> {
    let action = actions::GITHUB_LIST_REVIEW_COMMENTS;
    let repo = required_repo(action, payload)?;
    let number = required_number(action, payload, "pr_number")?;
    Ok(match tools.remote.list_review_comments(repo, number)? {
        Listing::Items(comments) => json!({"comments": comments}),
        Listing::Error(error) => json!({"error": error}),
    })
}

/// Non-empty string value for `key`.
fn required_str<'a>(action: &str, payload: &'a Payload, key: &str) -> Result<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DevmateError::invalid_payload(action, key))
}

/// `owner/name` repository slug for the `repo` key. Each segment is a plain
/// GitHub name so the slug cannot reshape the request path.
fn required_repo<'a>(action: &str, payload: &'a Payload) -> Result<&'a str> {
    let repo = required_str(action, payload, "repo")?;
    let mut segments = repo.split('/');
    let valid = match (segments.next(), segments.next(), segments.next()) {
        (Some(owner), Some(name), None) => is_repo_segment(owner) && is_repo_segment(name),
        _ => false,
    };
    if !valid {
        return Err(DevmateError::invalid_payload(action, "repo"));
    }
    Ok(repo)
}

fn is_repo_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Positive integer for `key`, given as a JSON number or a numeric string.
fn required_number(action: &str, payload: &Payload, key: &str) -> Result<u64> {
    let number = match payload.get(key) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    number
        .filter(|n| *n > 0)
        .ok_or_else(|| DevmateError::invalid_payload(action, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::allowed_names;
    use crate::core::types::ReviewComment;
    use crate::io::config::GitConfig;
    use crate::io::github::PullSummary;
    use crate::test_support::{FakeRemoteRepo, TestRepo};
    use std::collections::BTreeSet;
    use std::path::Path;

    fn executor_at(root: &Path, remote: FakeRemoteRepo) -> ActionExecutor {
        ActionExecutor::new(Toolbox {
            fs: Filesystem::new(root),
            git: Git::new(root, &GitConfig::default()),
            remote: Box::new(remote),
        })
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    #[test]
    fn registry_covers_exactly_the_whitelist() {
        let registered: BTreeSet<_> = ActionRegistry::builtin().names().collect();
        let allowed: BTreeSet<_> = allowed_names().collect();
        assert_eq!(registered, allowed);
    }

    #[test]
    fn noop_ignores_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        assert_eq!(exec.execute("noop", None).expect("noop"), json!({"status": "ok"}));
        assert_eq!(
            exec.execute("noop", Some(&payload(json!({"some": "data"}))))
                .expect("noop"),
            json!({"status": "ok"})
        );
    }

    #[test]
    fn print_defaults_to_empty_message() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        assert_eq!(
            exec.execute("print", Some(&payload(json!({"message": "Hello, World!"}))))
                .expect("print"),
            json!({"printed": "Hello, World!"})
        );
        assert_eq!(exec.execute("print", None).expect("print"), json!({"printed": ""}));
    }

    #[test]
    fn unknown_action_names_the_action() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        for name in ["unknown_action", "nonexistent", "", "NOOP"] {
            match exec.execute(name, Some(&payload(json!({"key": "value"})))) {
                Err(DevmateError::UnknownAction(got)) => assert_eq!(got, name),
                other => panic!("expected UnknownAction for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_required_keys_fail_with_invalid_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        let cases = [
            ("read_file", json!({}), "path"),
            ("write_file", json!({"content": "x"}), "path"),
            ("git_commit", json!({"message": ""}), "message"),
            ("github_list_prs", json!({}), "repo"),
            ("github_get_pr", json!({"repo": "o/r"}), "pr"),
            ("github_get_pr_comments", json!({"repo": "o/r", "pr": "abc"}), "pr"),
            ("github_list_review_comments", json!({"repo": "o/r", "pr": 1}), "pr_number"),
        ];
        for (action, body, key) in cases {
            match exec.execute(action, Some(&payload(body))) {
                Err(DevmateError::InvalidPayload {
                    action: got_action,
                    key: got_key,
                }) => {
                    assert_eq!(got_action, action);
                    assert_eq!(got_key, key);
                }
                other => panic!("expected InvalidPayload for {action}, got {other:?}"),
            }
        }
    }

    #[test]
    fn read_missing_file_reports_non_existence() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        let result = exec
            .execute("read_file", Some(&payload(json!({"path": "nope.py"}))))
            .expect("read");
        assert_eq!(result, json!({"content": "", "exists": false}));
    }

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());
        let file = temp.path().join("test.txt");
        let file = file.to_str().expect("utf8");

        let written = exec
            .execute(
                "write_file",
                Some(&payload(json!({"path": file, "content": "hello"}))),
            )
            .expect("write");
        assert_eq!(written, json!({"written": file}));

        let read = exec
            .execute("read_file", Some(&payload(json!({"path": file}))))
            .expect("read");
        assert_eq!(read, json!({"content": "hello", "exists": true}));
    }

    #[test]
    fn list_files_defaults_to_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("a.txt"), "a").expect("write");
        std::fs::write(temp.path().join("b.txt"), "b").expect("write");
        let exec = executor_at(temp.path(), FakeRemoteRepo::default());

        let result = exec.execute("list_files", None).expect("list");
        assert_eq!(result, json!({"files": ["a.txt", "b.txt"]}));
    }

    #[test]
    fn git_actions_report_text() {
        let repo = TestRepo::new().expect("repo");
        std::fs::write(repo.path().join("file.txt"), "hello").expect("write");
        let exec = executor_at(repo.path(), FakeRemoteRepo::default());

        let status = exec.execute("git_status", None).expect("status");
        assert!(status["status"].as_str().expect("text").contains("file.txt"));

        let commit = exec
            .execute("git_commit", Some(&payload(json!({"message": "commit message"}))))
            .expect("commit");
        assert!(commit["commit"].as_str().expect("text").contains("commit message"));

        let diff = exec.execute("git_diff", None).expect("diff");
        assert_eq!(diff, json!({"diff": ""}));
    }

    #[test]
    fn list_prs_wraps_items() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo {
            prs: Listing::Items(vec![PullSummary {
                number: 1,
                title: "Test PR".to_string(),
                author: Some("me".to_string()),
                url: "https://github.com/me/repo/pull/1".to_string(),
            }]),
            ..FakeRemoteRepo::default()
        };
        let requests = remote.request_log();
        let exec = executor_at(temp.path(), remote);
        let result = exec
            .execute("github_list_prs", Some(&payload(json!({"repo": "me/repo"}))))
            .expect("list");
        assert_eq!(result["prs"][0]["number"], 1);
        assert_eq!(result["prs"][0]["author"], "me");
        assert_eq!(*requests.borrow(), ["list_open_prs me/repo"]);
    }

    #[test]
    fn review_comment_listing_error_is_returned_not_raised() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo {
            review_comments: Listing::Error("GitHub error 404: Not Found".to_string()),
            ..FakeRemoteRepo::default()
        };
        let requests = remote.request_log();
        let exec = executor_at(temp.path(), remote);
        let result = exec
            .execute(
                "github_list_review_comments",
                Some(&payload(json!({"repo": "o/r", "pr_number": "12"}))),
            )
            .expect("list");
        assert_eq!(result, json!({"error": "GitHub error 404: Not Found"}));
        assert_eq!(*requests.borrow(), ["list_review_comments o/r#12"]);
    }

    #[test]
    fn review_comments_keep_missing_fields_as_null() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo {
            review_comments: Listing::Items(vec![ReviewComment {
                id: Some(3),
                path: None,
                body: Some("nit".to_string()),
                line: None,
            }]),
            ..FakeRemoteRepo::default()
        };
        let exec = executor_at(temp.path(), remote);
        let result = exec
            .execute(
                "github_list_review_comments",
                Some(&payload(json!({"repo": "o/r", "pr_number": 12}))),
            )
            .expect("list");
        assert_eq!(
            result,
            json!({"comments": [{"id": 3, "path": null, "body": "nit", "line": null}]})
        );
    }

    #[test]
    fn get_pr_comments_passes_number_through() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo::default();
        let requests = remote.request_log();
        let exec = executor_at(temp.path(), remote);
        let result = exec
            .execute(
                "github_get_pr_comments",
                Some(&payload(json!({"repo": "me/repo", "pr": 1}))),
            )
            .expect("comments");
        assert_eq!(result["comments"][0]["path"], "file.py");

        let pr = exec
            .execute("github_get_pr", Some(&payload(json!({"repo": "me/repo", "pr": 7}))))
            .expect("pr");
        assert_eq!(pr["pr"]["number"], 7);
        assert_eq!(
            *requests.borrow(),
            ["get_pr_comments me/repo#1", "get_pr me/repo#7"]
        );
    }

    #[test]
    fn malformed_repo_is_rejected_before_any_request() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo::default();
        let requests = remote.request_log();
        let exec = executor_at(temp.path(), remote);
        let repos = [
            "o",
            "/r",
            "o/",
            "o/..",
            "./r",
            "o/r/../../user",
            "o/r?per_page=1",
            "o/r#frag",
            "o r/x",
        ];
        for action in [
            "github_list_prs",
            "github_get_pr",
            "github_get_pr_comments",
            "github_list_review_comments",
        ] {
            for repo in repos {
                let body = json!({"repo": repo, "pr": 1, "pr_number": 1});
                match exec.execute(action, Some(&payload(body))) {
                    Err(DevmateError::InvalidPayload { action: got, key }) => {
                        assert_eq!(got, action);
                        assert_eq!(key, "repo", "{action} {repo:?}");
                    }
                    other => panic!("expected InvalidPayload for {action} {repo:?}, got {other:?}"),
                }
            }
        }
        assert!(requests.borrow().is_empty(), "{:?}", requests.borrow());
    }

    #[test]
    fn repo_names_with_dots_and_dashes_are_accepted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let remote = FakeRemoteRepo::default();
        let requests = remote.request_log();
        let exec = executor_at(temp.path(), remote);
        exec.execute(
            "github_list_prs",
            Some(&payload(json!({"repo": "my-org/repo.rs_v2"}))),
        )
        .expect("list");
        assert_eq!(*requests.borrow(), ["list_open_prs my-org/repo.rs_v2"]);
    }

    #[test]
    fn custom_registry_extends_the_action_set() {
        fn handle_ping(_tools: &Toolbox, _payload: &Payload) -> Result<Value> {
            Ok(json!({"pong": true}))
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let mut registry = ActionRegistry::builtin();
        assert!(registry.register("ping", handle_ping).is_none());
        let exec = ActionExecutor::with_registry(
            Toolbox {
                fs: Filesystem::new(temp.path()),
                git: Git::new(temp.path(), &GitConfig::default()),
                remote: Box::new(FakeRemoteRepo::default()),
            },
            registry,
        );
        assert_eq!(exec.execute("ping", None).expect("ping"), json!({"pong": true}));
    }
}
