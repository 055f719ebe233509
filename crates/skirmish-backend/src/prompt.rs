//! Prompt rendering via `minijinja`.
//!
//! Templates are embedded at compile time (`include_str!`) since the
//! prompt surface is small and fixed; the engine renders the decision or
//! reflection context (as a `serde_json::Value`) into the system and user
//! messages sent to the LLM.

use minijinja::Environment;
use skirmish_types::{DecisionContext, ReflectContext};

use crate::error::BackendError;

/// System message template.
const SYSTEM_TEMPLATE: &str = include_str!("../templates/system.j2");

/// Per-tick decision user message template.
const DECIDE_TEMPLATE: &str = include_str!("../templates/decide.j2");

/// Reflection user message template.
const REFLECT_TEMPLATE: &str = include_str!("../templates/reflect.j2");

/// The complete rendered prompt ready to send to the LLM.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the agent's reality.
    pub system: String,
    /// User message with status, surroundings, memory, and instructions.
    pub user: String,
}

impl RenderedPrompt {
    /// The full prompt as one string, for thinking-history storage.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create an engine with all templates parsed.
    pub fn new() -> Result<Self, BackendError> {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .map_err(|e| BackendError::Template(format!("system template: {e}")))?;
        env.add_template("decide", DECIDE_TEMPLATE)
            .map_err(|e| BackendError::Template(format!("decide template: {e}")))?;
        env.add_template("reflect", REFLECT_TEMPLATE)
            .map_err(|e| BackendError::Template(format!("reflect template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the decision prompt for one agent's context.
    pub fn render_decide(&self, ctx: &DecisionContext) -> Result<RenderedPrompt, BackendError> {
        let value = serde_json::to_value(ctx)
            .map_err(|e| BackendError::Template(format!("context serialization: {e}")))?;
        Ok(RenderedPrompt {
            system: self.render("system", &value)?,
            user: self.render("decide", &value)?,
        })
    }

    /// Render the reflection prompt for one agent's context.
    pub fn render_reflect(&self, ctx: &ReflectContext) -> Result<RenderedPrompt, BackendError> {
        let value = serde_json::to_value(ctx)
            .map_err(|e| BackendError::Template(format!("context serialization: {e}")))?;
        Ok(RenderedPrompt {
            system: self.render("system", &value)?,
            user: self.render("reflect", &value)?,
        })
    }

    /// Render one named template against a JSON context.
    fn render(&self, name: &str, value: &serde_json::Value) -> Result<String, BackendError> {
        self.env
            .get_template(name)
            .map_err(|e| BackendError::Template(format!("missing {name} template: {e}")))?
            .render(value)
            .map_err(|e| BackendError::Template(format!("{name} render failed: {e}")))
    }
}
