//! Host collaborators: the system surfaces recipes provision through.
//!
//! Each concern is behind a trait so the runner can be driven against the
//! real host or against test doubles.

mod package;
mod shell;
mod template;

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitStatus;

pub use package::AptPackageManager;
pub use shell::{ScriptJob, SystemShell};
pub use template::MinijinjaEngine;

/// Installs packages on the host.
pub trait PackageManager {
    /// Install a package, returning once it is present.
    fn install(&self, package: &str) -> anyhow::Result<()>;
}

/// Runs script bodies through an interpreter.
pub trait ShellInterpreter {
    /// Run a script job and report how the interpreter exited.
    ///
    /// An `Err` means the interpreter could not be launched at all; a
    /// nonzero [`ExitStatus`] means it ran and failed.
    fn run_script(&self, job: &ScriptJob) -> anyhow::Result<ExitStatus>;
}

/// Renders template files with variable bindings.
pub trait TemplateEngine {
    /// Render `source` with `bindings` and write the result to `dest`.
    fn render(
        &self,
        source: &Path,
        dest: &Path,
        bindings: &HashMap<String, String>,
    ) -> anyhow::Result<()>;
}
