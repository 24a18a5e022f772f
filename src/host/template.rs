//! Template rendering with minijinja.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::Environment;

use super::TemplateEngine;

/// Renders template files with minijinja and writes them to the host.
///
/// The destination's parent directory must already exist; creating it is a
/// provisioning action that belongs to an earlier script step.
#[derive(Debug, Default)]
pub struct MinijinjaEngine;

impl MinijinjaEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for MinijinjaEngine {
    fn render(
        &self,
        source: &Path,
        dest: &Path,
        bindings: &HashMap<String, String>,
    ) -> Result<()> {
        let content = fs::read_to_string(source)
            .with_context(|| format!("Could not read template: {}", source.display()))?;

        let mut env = Environment::new();
        env.add_template("step", &content)
            .with_context(|| format!("Could not parse template: {}", source.display()))?;
        let template = env.get_template("step")?;
        let rendered = template
            .render(bindings)
            .with_context(|| format!("Could not render template: {}", source.display()))?;

        fs::write(dest, rendered)
            .with_context(|| format!("Could not write rendered template: {}", dest.display()))?;

        tracing::debug!(source = %source.display(), dest = %dest.display(), "Rendered template");
        Ok(())
    }
}
