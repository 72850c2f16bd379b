//! Prompt rendering for the planner and the code fixer.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::actions::CATALOGUE;

const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const SELECT_FILES_TEMPLATE: &str = include_str!("prompts/select_files.md");
const FIX_TEMPLATE: &str = include_str!("prompts/fix.md");

/// Template engine wrapper around minijinja.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("plan", PLAN_TEMPLATE)
            .expect("plan template should be valid");
        env.add_template("select_files", SELECT_FILES_TEMPLATE)
            .expect("select_files template should be valid");
        env.add_template("fix", FIX_TEMPLATE)
            .expect("fix template should be valid");
        Self { env }
    }

    /// Planning instructions, the action catalogue, optional repository context, and the intent.
    pub fn render_plan(&self, intent: &str, repo_context: Option<&str>) -> Result<String> {
        let template = self.env.get_template("plan")?;
        template
            .render(context! {
                actions => CATALOGUE,
                context => repo_context.map(str::trim).filter(|s| !s.is_empty()),
                intent => intent.trim(),
            })
            .context("render plan prompt")
    }

    /// Ask for the subset of `files` relevant to `intent`.
    pub fn render_select_files(&self, intent: &str, files: &[String]) -> Result<String> {
        let listing =
            serde_json::to_string_pretty(files).context("serialize candidate file list")?;
        let template = self.env.get_template("select_files")?;
        template
            .render(context! {
                intent => intent.trim(),
                files => listing,
            })
            .context("render file selection prompt")
    }

    /// Ask for the full corrected file given a review comment.
    pub fn render_fix(&self, code: &str, comment: &str) -> Result<String> {
        let template = self.env.get_template("fix")?;
        template
            .render(context! {
                comment => comment,
                code => code,
            })
            .context("render fix prompt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::allowed_names;

    #[test]
    fn plan_prompt_lists_every_allowed_action() {
        let prompt = PromptEngine::new()
            .render_plan("say hello", None)
            .expect("render");
        for name in allowed_names() {
            assert!(prompt.contains(&format!("- {name}\n")), "missing {name}");
        }
        assert!(prompt.contains(r#"git_commit → { "message": "<commit message>" }"#));
        assert!(!prompt.contains("noop →"), "noop has no payload hint");
    }

    #[test]
    fn plan_prompt_places_context_before_intent() {
        let prompt = PromptEngine::new()
            .render_plan("do something", Some("--- FILE: test.py ---\nprint('hello')"))
            .expect("render");
        let context_pos = prompt.find("Repository context:").expect("context");
        let code_pos = prompt.find("print('hello')").expect("file content");
        let intent_pos = prompt.find("User intent:\ndo something").expect("intent");
        assert!(context_pos < code_pos && code_pos < intent_pos);
    }

    #[test]
    fn plan_prompt_omits_empty_context() {
        let prompt = PromptEngine::new()
            .render_plan("do something", Some("  "))
            .expect("render");
        assert!(!prompt.contains("Repository context"));
    }

    #[test]
    fn context_is_not_html_escaped() {
        let prompt = PromptEngine::new()
            .render_plan("x", Some("if a < b && c > d {}"))
            .expect("render");
        assert!(prompt.contains("if a < b && c > d {}"));
    }

    #[test]
    fn select_prompt_embeds_file_list_as_json() {
        let prompt = PromptEngine::new()
            .render_select_files("explain executor", &["src/executor.rs".to_string()])
            .expect("render");
        assert!(prompt.contains("[\n  \"src/executor.rs\"\n]"));
        assert!(prompt.contains("explain executor"));
    }

    #[test]
    fn fix_prompt_contains_comment_then_code() {
        let prompt = PromptEngine::new()
            .render_fix("x=1", "Use better variable names")
            .expect("render");
        let comment_pos = prompt.find("Use better variable names").expect("comment");
        let code_pos = prompt.find("Original code:\nx=1").expect("code");
        assert!(comment_pos < code_pos);
        assert!(prompt.contains("Return ONLY the corrected full file content."));
    }
}
