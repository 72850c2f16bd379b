//! Scripted collaborators and fixtures for tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration tests under `tests/`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use anyhow::{Context, anyhow, bail};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::agents::CodeFix;
use crate::core::types::{Payload, ReviewComment};
use crate::error::{DevmateError, Result};
use crate::executor::Executor;
use crate::io::github::{Listing, PullComment, PullDetail, PullSummary, RemoteRepo};
use crate::io::llm::TextGenerator;

/// Returns queued responses in order and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted generator exhausted"))
    }
}

/// Records executed actions. Unscripted actions return `{}`.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    responses: RefCell<HashMap<String, VecDeque<Value>>>,
    failures: HashMap<String, String>,
    calls: RefCell<Vec<(String, Payload)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for `action`; queued results are consumed in order and
    /// the last one repeats.
    pub fn respond(self, action: &str, result: Value) -> Self {
        self.responses
            .borrow_mut()
            .entry(action.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Make every call to `action` fail with `message`.
    pub fn fail(mut self, action: &str, message: &str) -> Self {
        self.failures.insert(action.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Payload)> {
        self.calls.borrow().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(action, _)| action.clone()).collect()
    }
}

impl Executor for RecordingExecutor {
    fn execute(&self, action: &str, payload: Option<&Payload>) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push((action.to_string(), payload.cloned().unwrap_or_default()));
        if let Some(message) = self.failures.get(action) {
            return Err(DevmateError::Collaborator(anyhow!("{message}")));
        }
        let mut responses = self.responses.borrow_mut();
        let result = match responses.get_mut(action) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(result.unwrap_or_else(|| json!({})))
    }
}

/// In-memory remote repository with canned listings.
///
/// Every call is appended to `requests` as `"<operation> <repo>[#<number>]"`.
#[derive(Debug)]
pub struct FakeRemoteRepo {
    pub prs: Listing<PullSummary>,
    pub review_comments: Listing<ReviewComment>,
    pub pr_comments: Vec<PullComment>,
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl Default for FakeRemoteRepo {
    fn default() -> Self {
        Self {
            prs: Listing::Items(Vec::new()),
            review_comments: Listing::Items(Vec::new()),
            pr_comments: vec![PullComment {
                path: Some("file.py".to_string()),
                body: Some("Fix this".to_string()),
                author: Some("reviewer".to_string()),
            }],
            requests: Rc::default(),
        }
    }
}

impl FakeRemoteRepo {
    pub fn with_review_comments(comments: Vec<ReviewComment>) -> Self {
        Self {
            review_comments: Listing::Items(comments),
            ..Self::default()
        }
    }

    /// Handle on the request log that stays readable after the fake is boxed.
    pub fn request_log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.requests)
    }

    fn record(&self, request: String) {
        self.requests.borrow_mut().push(request);
    }
}

impl RemoteRepo for FakeRemoteRepo {
    fn list_open_prs(&self, repo: &str) -> Result<Listing<PullSummary>> {
        self.record(format!("list_open_prs {repo}"));
        Ok(self.prs.clone())
    }

    fn get_pr(&self, repo: &str, number: u64) -> Result<PullDetail> {
        self.record(format!("get_pr {repo}#{number}"));
        Ok(PullDetail {
            number,
            title: format!("PR {number}"),
            body: None,
            author: Some("me".to_string()),
        })
    }

    fn get_pr_comments(&self, repo: &str, number: u64) -> Result<Vec<PullComment>> {
        self.record(format!("get_pr_comments {repo}#{number}"));
        Ok(self.pr_comments.clone())
    }

    fn list_review_comments(&self, repo: &str, number: u64) -> Result<Listing<ReviewComment>> {
        self.record(format!("list_review_comments {repo}#{number}"));
        Ok(self.review_comments.clone())
    }
}

/// Returns fixed content and records `(code, comment)` pairs.
#[derive(Debug, Default)]
pub struct StubFixer {
    output: String,
    calls: RefCell<Vec<(String, String)>>,
}

impl StubFixer {
    pub fn returning(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

impl CodeFix for StubFixer {
    fn fix(&self, code: &str, comment: &str) -> Result<String> {
        self.calls
            .borrow_mut()
            .push((code.to_string(), comment.to_string()));
        Ok(self.output.clone())
    }
}

/// Temporary directory holding an initialised git repository.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo dir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "Devmate Test"])?;
        repo.git(&["config", "user.email", "devmate@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> anyhow::Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Stage everything and commit.
    pub fn commit_all(&self, message: &str) -> anyhow::Result<()> {
        self.git(&["add", "."])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Subject lines, newest first.
    pub fn log_subjects(&self) -> anyhow::Result<Vec<String>> {
        let output = self.git(&["log", "--format=%s"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    pub fn git(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
