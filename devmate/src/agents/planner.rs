//! Planner: intent in, validated plan out.
//!
//! Planning makes two generation calls. The first narrows the repository's
//! candidate files to those relevant to the intent; the second turns the
//! intent plus the rendered files into a plan. A malformed file selection
//! degrades to no context, while a malformed plan fails the whole call.

use tracing::{debug, info, instrument, warn};

use crate::core::response::{parse_file_selection, parse_plan_response};
use crate::core::types::Plan;
use crate::core::validator::validate_plan;
use crate::error::Result;
use crate::io::context::RepoContextBuilder;
use crate::io::llm::TextGenerator;
use crate::io::prompt::PromptEngine;

pub struct Planner<'a, G> {
    generator: G,
    prompts: &'a PromptEngine,
    context: &'a RepoContextBuilder,
}

impl<'a, G: TextGenerator> Planner<'a, G> {
    pub fn new(generator: G, prompts: &'a PromptEngine, context: &'a RepoContextBuilder) -> Self {
        Self {
            generator,
            prompts,
            context,
        }
    }

    #[instrument(skip_all, fields(intent_chars = intent.len()))]
    pub fn create_plan(&self, intent: &str) -> Result<Plan> {
        info!("creating plan");
        let selected = self.select_relevant_files(intent)?;
        let repo_context = self.context.render_files(&selected);

        let prompt = self.prompts.render_plan(intent, Some(&repo_context))?;
        debug!(prompt_bytes = prompt.len(), "plan prompt rendered");
        let response = self.generator.generate(&prompt)?;
        debug!(response_bytes = response.len(), "plan response received");

        let raw = parse_plan_response(&response)?;
        let plan = validate_plan(&raw)?;
        info!(steps = plan.len(), "plan created");
        Ok(plan)
    }

    /// Ask which candidate files matter for `intent`. Unusable output selects nothing.
    pub fn select_relevant_files(&self, intent: &str) -> Result<Vec<String>> {
        let candidates = self.context.select_candidates();

        let prompt = self.prompts.render_select_files(intent, &candidates)?;
        let response = self.generator.generate(&prompt)?;

        match parse_file_selection(&response) {
            Some(selected) => {
                debug!(count = selected.len(), "files selected for context");
                Ok(selected)
            }
            None => {
                warn!("file selection response is not a JSON list; continuing without context");
                Ok(Vec::new())
            }
        }
    }
}
