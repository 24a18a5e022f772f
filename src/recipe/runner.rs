//! Recipe execution engine.
//!
//! Runs a resolved recipe's steps strictly in order, stopping at the first
//! failure. The host collaborators (package manager, shell, template
//! engine) are trait objects so tests can substitute recording doubles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use regex::Regex;
use thiserror::Error;

use crate::host::{
    AptPackageManager, MinijinjaEngine, PackageManager, ScriptJob, ShellInterpreter,
    SystemShell, TemplateEngine,
};

use super::schema::{Recipe, Step};

/// Errors a step can fail with.
#[derive(Debug, Error)]
pub enum StepError {
    /// The package manager could not install a package
    #[error("package '{package}' failed to install: {reason}")]
    PackageInstall { package: String, reason: String },

    /// A script could not be launched or exited unsuccessfully
    #[error("script '{script}' failed: {reason}")]
    ScriptExecution {
        script: String,
        /// Exit code when the script ran and exited nonzero; `None` when it
        /// never launched or was killed by a signal
        exit_code: Option<i32>,
        reason: String,
    },

    /// A template could not be read, rendered, or written
    #[error("template '{template}' failed to render: {reason}")]
    TemplateRender { template: String, reason: String },
}

/// Execution state of a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    /// Not started
    Ready,
    /// Currently executing steps
    Running,
    /// All steps completed successfully
    Completed,
    /// Execution stopped at a failed step
    Failed(String),
}

/// Outcome of one executed step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name
    pub name: String,
    /// Step kind ("package", "script", or "template")
    pub kind: &'static str,
    /// Whether the step succeeded
    pub success: bool,
    /// Exit code, for script steps that ran to completion
    pub exit_code: Option<i32>,
    /// Error message when the step failed
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Executes recipes against the host.
pub struct Runner {
    packages: Box<dyn PackageManager>,
    shell: Box<dyn ShellInterpreter>,
    templates: Box<dyn TemplateEngine>,
    variables: HashMap<String, String>,
    state: RunnerState,
    results: Vec<StepResult>,
}

impl Runner {
    /// Create a runner wired to the real host: apt, the system shell, and
    /// the minijinja template engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(
            Box::new(AptPackageManager::new()),
            Box::new(SystemShell::new()),
            Box::new(MinijinjaEngine::new()),
        )
    }

    /// Create a runner with explicit collaborators.
    #[must_use]
    pub fn with_collaborators(
        packages: Box<dyn PackageManager>,
        shell: Box<dyn ShellInterpreter>,
        templates: Box<dyn TemplateEngine>,
    ) -> Self {
        Self {
            packages,
            shell,
            templates,
            variables: HashMap::new(),
            state: RunnerState::Ready,
            results: Vec::new(),
        }
    }

    /// Set a variable binding. Overrides recipe defaults of the same name.
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Set multiple variable bindings at once.
    pub fn set_variables(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        self.variables.extend(vars);
    }

    /// Get the current execution state.
    #[must_use]
    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    /// Get the per-step results of the last run.
    #[must_use]
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    /// Run a recipe to completion.
    ///
    /// Steps execute strictly in declaration order. The first failure stops
    /// the run; steps after it are not attempted. A recipe with no steps
    /// completes immediately.
    pub fn run(&mut self, recipe: &Recipe) -> Result<(), StepError> {
        self.state = RunnerState::Running;
        self.results.clear();

        let mut bindings = recipe.defaults.clone();
        bindings.extend(self.variables.clone());

        tracing::info!(recipe = %recipe.name, steps = recipe.step_count(), "Running recipe");

        for (index, step) in recipe.steps.iter().enumerate() {
            tracing::info!(
                step = %step.name(),
                kind = step.kind(),
                position = index + 1,
                "Executing step"
            );

            let started = Instant::now();
            let outcome = self.execute_step(step, &bindings);
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                Ok(exit_code) => {
                    self.results.push(StepResult {
                        name: step.name().to_string(),
                        kind: step.kind(),
                        success: true,
                        exit_code,
                        error: None,
                        duration_ms,
                    });
                }
                Err(e) => {
                    let exit_code = match &e {
                        StepError::ScriptExecution { exit_code, .. } => *exit_code,
                        _ => None,
                    };
                    self.results.push(StepResult {
                        name: step.name().to_string(),
                        kind: step.kind(),
                        success: false,
                        exit_code,
                        error: Some(e.to_string()),
                        duration_ms,
                    });
                    self.state = RunnerState::Failed(e.to_string());
                    tracing::error!(step = %step.name(), error = %e, "Step failed, stopping");
                    return Err(e);
                }
            }
        }

        self.state = RunnerState::Completed;
        Ok(())
    }

    /// Execute a single step against the collaborators.
    ///
    /// Returns the script's exit code for script steps, `None` otherwise.
    fn execute_step(
        &self,
        step: &Step,
        bindings: &HashMap<String, String>,
    ) -> Result<Option<i32>, StepError> {
        match step {
            Step::Package { name } => {
                let package = interpolate(name, bindings);
                self.packages
                    .install(&package)
                    .map_err(|e| StepError::PackageInstall {
                        package: package.clone(),
                        reason: format!("{e:#}"),
                    })?;
                Ok(None)
            }
            Step::Script(script) => {
                let job = ScriptJob {
                    interpreter: script.interpreter.clone(),
                    cwd: script
                        .cwd
                        .as_ref()
                        .map(|c| PathBuf::from(interpolate(c, bindings))),
                    user: script.user.as_ref().map(|u| interpolate(u, bindings)),
                    body: interpolate(&script.body, bindings),
                };

                let status =
                    self.shell
                        .run_script(&job)
                        .map_err(|e| StepError::ScriptExecution {
                            script: script.name.clone(),
                            exit_code: None,
                            reason: format!("{e:#}"),
                        })?;

                if status.success() {
                    Ok(status.code())
                } else {
                    let reason = status.code().map_or_else(
                        || "terminated by signal".to_string(),
                        |code| format!("exited with code {code}"),
                    );
                    Err(StepError::ScriptExecution {
                        script: script.name.clone(),
                        exit_code: status.code(),
                        reason,
                    })
                }
            }
            Step::Template(template) => {
                let dest = interpolate(&template.path, bindings);

                // Step-level vars are the highest-precedence binding layer;
                // their values may themselves reference recipe variables.
                let mut vars = bindings.clone();
                for (key, value) in &template.vars {
                    vars.insert(key.clone(), interpolate(value, bindings));
                }

                self.templates
                    .render(Path::new(&template.source), Path::new(&dest), &vars)
                    .map_err(|e| StepError::TemplateRender {
                        template: template.name.clone(),
                        reason: format!("{e:#}"),
                    })?;
                Ok(None)
            }
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `{{ variable }}` placeholders in a string.
///
/// Unknown variables are left in place literally and logged, so a typo is
/// visible in the output it produces rather than silently erased.
fn interpolate(template: &str, vars: &HashMap<String, String>) -> String {
    let re = Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap();
    let result = re.replace_all(template, |caps: &regex::Captures| {
        let name = &caps[1];
        vars.get(name).cloned().unwrap_or_else(|| caps[0].to_string())
    });

    if result.contains("{{") {
        tracing::warn!(text = %result, "Unresolved variable placeholder");
    }

    result.into_owned()
}
