//! Template engine for manifest rendering
//!
//! Uses minijinja with:
//! - Strict undefined behavior, so a placeholder without a value is an error
//! - Trailing newlines preserved, so concatenated manifests keep their separators
//! - Auto-escaping disabled; manifests are YAML, not HTML
//! - A `yaml_quote` filter for values that may contain YAML syntax

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::context::DeploymentConfig;
use super::error::TemplateError;
use super::filters;

/// Template engine for manifest placeholder resolution
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        // Register filters
        env.add_filter("yaml_quote", filters::yaml_quote);

        Self { env }
    }

    /// Render a named template body with the given deployment config
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the template syntax is invalid or a
    /// referenced placeholder has no value in `config`.
    pub fn render(
        &self,
        name: &str,
        template: &str,
        config: &DeploymentConfig,
    ) -> Result<String, TemplateError> {
        self.env
            .render_named_str(name, template, config.to_value())
            .map_err(TemplateError::from)
    }

    /// Check that a template body parses without rendering it
    pub fn validate_syntax(name: &str, template: &str) -> Result<(), TemplateError> {
        let env = Environment::new();
        let parsed = env.template_from_named_str(name, template).map(|_| ());
        parsed.map_err(TemplateError::from)
    }
}
