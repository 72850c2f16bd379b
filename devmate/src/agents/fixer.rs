//! Code fixer: original file content plus a review comment in, replacement content out.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::io::llm::TextGenerator;
use crate::io::prompt::PromptEngine;

/// Produces replacement file content for a review comment.
pub trait CodeFix {
    fn fix(&self, code: &str, comment: &str) -> Result<String>;
}

impl<T: CodeFix + ?Sized> CodeFix for &T {
    fn fix(&self, code: &str, comment: &str) -> Result<String> {
        (**self).fix(code, comment)
    }
}

/// One generation request per fix. The response is returned verbatim.
pub struct CodeFixer<'a, G> {
    generator: G,
    prompts: &'a PromptEngine,
}

impl<'a, G: TextGenerator> CodeFixer<'a, G> {
    pub fn new(generator: G, prompts: &'a PromptEngine) -> Self {
        Self { generator, prompts }
    }
}

impl<G: TextGenerator> CodeFix for CodeFixer<'_, G> {
    #[instrument(skip_all, fields(code_bytes = code.len()))]
    fn fix(&self, code: &str, comment: &str) -> Result<String> {
        let prompt = self.prompts.render_fix(code, comment)?;
        let fixed = self.generator.generate(&prompt)?;
        debug!(fixed_bytes = fixed.len(), "fix generated");
        Ok(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn returns_response_verbatim() {
        let generator = ScriptedGenerator::new(["```python\nbetter_name = 1\n```\n"]);
        let prompts = PromptEngine::new();
        let fixer = CodeFixer::new(&generator, &prompts);

        let fixed = fixer.fix("x=1", "Use better variable names").expect("fix");

        assert_eq!(fixed, "```python\nbetter_name = 1\n```\n");
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Use better variable names"));
        assert!(prompts[0].contains("Original code:\nx=1"));
    }

    #[test]
    fn generator_failure_propagates() {
        let generator = ScriptedGenerator::new(Vec::<String>::new());
        let prompts = PromptEngine::new();
        let err = CodeFixer::new(&generator, &prompts)
            .fix("x=1", "rename")
            .expect_err("exhausted");
        assert!(err.to_string().contains("exhausted"));
    }
}
