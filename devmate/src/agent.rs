//! Orchestration: plan, then execute step by step.
//!
//! [`PlanRunner`] is a plain sequential loop with no knowledge of particular
//! actions. Follow-up work keyed on an action (such as fixing code from PR
//! review comments) lives in [`StepInterceptor`]s that run after the step and
//! issue their own executor calls. Interceptor calls are not recorded in the
//! run result; only planned steps are.

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::agents::{CodeFix, CodeFixer, Planner};
use crate::core::actions;
use crate::core::types::{Payload, Plan, ReviewComment, RunEntry, RunResult, Step};
use crate::error::Result;
use crate::executor::{ActionExecutor, Executor};
use crate::io::config::Settings;
use crate::io::context::RepoContextBuilder;
use crate::io::llm::{OpenAiClient, TextGenerator};
use crate::io::prompt::PromptEngine;

/// Commit message used after review-comment fixes are written.
pub const AUTOFIX_COMMIT_MESSAGE: &str = "Auto-fix PR review comments";

/// Extra work triggered by a completed step.
pub trait StepInterceptor {
    fn applies_to(&self, action: &str) -> bool;

    /// Runs after `step` produced `result`. An error aborts the run.
    fn after_step(&self, executor: &dyn Executor, step: &Step, result: &Value) -> Result<()>;
}

/// Executes a plan strictly in order.
pub struct PlanRunner<'a> {
    executor: &'a dyn Executor,
    interceptors: Vec<&'a dyn StepInterceptor>,
}

impl<'a> PlanRunner<'a> {
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self {
            executor,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: &'a dyn StepInterceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// One entry per planned step, in plan order. The first failure aborts;
    /// side effects of earlier steps stay in place.
    pub fn run(&self, plan: &Plan) -> Result<RunResult> {
        let mut results = Vec::with_capacity(plan.len());
        for (index, step) in plan.iter().enumerate() {
            info!(step = index, action = %step.action, "executing step");
            let result = self.executor.execute(&step.action, Some(&step.payload))?;
            for interceptor in &self.interceptors {
                if interceptor.applies_to(&step.action) {
                    interceptor.after_step(self.executor, step, &result)?;
                }
            }
            results.push(RunEntry {
                action: step.action.clone(),
                result,
            });
        }
        Ok(results)
    }
}

/// Outcome of one autofix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutofixReport {
    pub fixed: Vec<String>,
    pub committed: bool,
}

/// Rewrites files named by PR review comments, then commits once.
pub struct ReviewAutofix<F> {
    fixer: F,
}

impl<F: CodeFix> ReviewAutofix<F> {
    pub fn new(fixer: F) -> Self {
        Self { fixer }
    }

    /// Read, fix and write each comment carrying both a path and a body.
    /// A listing error counts as no comments.
    #[instrument(skip_all)]
    pub fn apply(&self, executor: &dyn Executor, listing: &Value) -> Result<AutofixReport> {
        let mut report = AutofixReport::default();
        for comment in review_comments(listing) {
            let Some((path, body)) = comment.actionable() else {
                debug!(id = ?comment.id, "skipping review comment without path or body");
                continue;
            };
            let read = executor.execute(actions::READ_FILE, Some(&object(json!({"path": path}))))?;
            let code = read.get("content").and_then(Value::as_str).unwrap_or_default();
            let fixed = self.fixer.fix(code, body)?;
            executor.execute(
                actions::WRITE_FILE,
                Some(&object(json!({"path": path, "content": fixed}))),
            )?;
            report.fixed.push(path.to_string());
        }

        if !report.fixed.is_empty() {
            executor.execute(
                actions::GIT_COMMIT,
                Some(&object(json!({"message": AUTOFIX_COMMIT_MESSAGE}))),
            )?;
            report.committed = true;
        }
        Ok(report)
    }
}

impl<F: CodeFix> StepInterceptor for ReviewAutofix<F> {
    fn applies_to(&self, action: &str) -> bool {
        action == actions::GITHUB_LIST_REVIEW_COMMENTS
    }

    fn after_step(&self, executor: &dyn Executor, _step: &Step, result: &Value) -> Result<()> {
        let report = self.apply(executor, result)?;
        info!(fixed = ?report.fixed, committed = report.committed, "review autofix finished");
        Ok(())
    }
}

fn review_comments(listing: &Value) -> Vec<ReviewComment> {
    if let Some(error) = listing.get("error") {
        warn!(%error, "review comment listing failed; nothing to fix");
        return Vec::new();
    }
    let Some(items) = listing.get("comments").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(comment) => Some(comment),
            Err(err) => {
                warn!(%err, "ignoring malformed review comment");
                None
            }
        })
        .collect()
}

fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Planner plus executor with the review autofix installed.
pub struct Agent<G, E> {
    generator: G,
    executor: E,
    prompts: PromptEngine,
    context: RepoContextBuilder,
}

impl Agent<OpenAiClient, ActionExecutor> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let generator = OpenAiClient::new(settings)?;
        let executor = ActionExecutor::from_settings(settings)?;
        let context = RepoContextBuilder::new(&settings.workdir, settings.config.context.clone());
        Ok(Self::new(generator, executor, context))
    }
}

impl<G: TextGenerator, E: Executor> Agent<G, E> {
    pub fn new(generator: G, executor: E, context: RepoContextBuilder) -> Self {
        Self {
            generator,
            executor,
            prompts: PromptEngine::new(),
            context,
        }
    }

    /// Plan without executing anything.
    pub fn plan(&self, intent: &str) -> Result<Plan> {
        Planner::new(&self.generator, &self.prompts, &self.context).create_plan(intent)
    }

    #[instrument(skip_all)]
    pub fn run(&self, intent: &str) -> Result<RunResult> {
        info!(intent, "agent received intent");
        let plan = self.plan(intent)?;
        let autofix = ReviewAutofix::new(CodeFixer::new(&self.generator, &self.prompts));
        let results = PlanRunner::new(&self.executor)
            .with_interceptor(&autofix)
            .run(&plan)?;
        info!(entries = results.len(), "agent run finished");
        Ok(results)
    }
}
