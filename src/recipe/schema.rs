//! Recipe schema definitions.
//!
//! Defines the YAML structure for cookbook recipe files and the resolved
//! in-memory form the runner executes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A recipe file as written on disk.
///
/// This is the raw YAML layer: step entries may still be `include:`
/// directives pointing at other cookbooks. Loading resolves it into a
/// [`Recipe`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeFile {
    /// Name of the recipe
    pub name: String,

    /// Description of what this recipe provisions
    pub description: Option<String>,

    /// Default variable bindings (lowest precedence)
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Step entries in declaration order
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

/// One entry in a recipe file's step list.
///
/// Each variant is keyed by its YAML field name:
///
/// ```yaml
/// steps:
///   - package: curl
///   - script:
///       name: fix_permissions
///       body: chown -Rf {{ owner }}:{{ group }} cassandra
///   - template:
///       name: cassandra.in.sh
///       source: cassandra.in.sh.tmpl
///       path: "{{ install_dir }}/cassandra/bin/cassandra.in.sh"
///   - include: cassandra
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepDef {
    /// Install a package through the system package manager
    Package { package: String },

    /// Run a script through a shell interpreter
    Script { script: ScriptStep },

    /// Render a template to a destination path
    Template { template: TemplateStep },

    /// Splice another cookbook's recipe in at this position
    Include { include: String },
}

/// A script step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Name of the step
    pub name: String,

    /// Interpreter the body is handed to
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Working directory for the interpreter
    pub cwd: Option<String>,

    /// User to run as (delegated to sudo when it is not the current user)
    pub user: Option<String>,

    /// Script body, passed verbatim to the interpreter after variable
    /// interpolation
    pub body: String,
}

fn default_interpreter() -> String {
    "bash".to_string()
}

/// A template step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStep {
    /// Name of the step
    pub name: String,

    /// Template source, relative to the cookbook's `templates/` directory
    pub source: String,

    /// Destination path the rendered output is written to
    pub path: String,

    /// Extra bindings for this render (highest precedence)
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// A resolved recipe: what the runner executes.
///
/// Created at load time. Includes have been spliced away and template
/// sources point into their owning cookbook, so only the three concrete
/// step kinds remain. Immutable after load.
#[derive(Debug, Clone)]
pub struct Recipe {
    /// Name of the recipe
    pub name: String,

    /// Description of what this recipe provisions
    pub description: Option<String>,

    /// Default variable bindings (lowest precedence), merged across
    /// includes with the including recipe winning
    pub defaults: HashMap<String, String>,

    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Get the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// One resolved provisioning step.
#[derive(Debug, Clone)]
pub enum Step {
    /// Install a package through the system package manager
    Package { name: String },

    /// Run a script through a shell interpreter
    Script(ScriptStep),

    /// Render a template to a destination path
    Template(TemplateStep),
}

impl Step {
    /// Get the step's name. Package steps are named by their package.
    pub fn name(&self) -> &str {
        match self {
            Self::Package { name } => name,
            Self::Script(script) => &script.name,
            Self::Template(template) => &template.name,
        }
    }

    /// Get the step kind as a string (for display).
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Package { .. } => "package",
            Self::Script(_) => "script",
            Self::Template(_) => "template",
        }
    }
}
