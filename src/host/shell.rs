//! Script execution through the system shell.

use std::env;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

use super::ShellInterpreter;

/// A script ready to hand to an interpreter.
#[derive(Debug, Clone)]
pub struct ScriptJob {
    /// Interpreter binary, e.g. `bash`
    pub interpreter: String,
    /// Working directory, when the script should not run where the runner
    /// was started
    pub cwd: Option<PathBuf>,
    /// User to run as
    pub user: Option<String>,
    /// Script body, passed to the interpreter with `-c`
    pub body: String,
}

/// Runs scripts through the host's interpreters, switching users with
/// `sudo` when asked to.
#[derive(Debug, Default)]
pub struct SystemShell;

impl SystemShell {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the command for a job.
    ///
    /// When the job names a user other than the current one, the
    /// interpreter is wrapped in `sudo -u <user>`.
    fn command_for(job: &ScriptJob) -> Command {
        let mut cmd = match &job.user {
            Some(user) if !is_current_user(user) => {
                let mut cmd = Command::new("sudo");
                cmd.arg("-u").arg(user).arg(&job.interpreter);
                cmd
            }
            _ => Command::new(&job.interpreter),
        };

        cmd.arg("-c").arg(&job.body);
        if let Some(cwd) = &job.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl ShellInterpreter for SystemShell {
    fn run_script(&self, job: &ScriptJob) -> Result<ExitStatus> {
        let mut cmd = Self::command_for(job);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        tracing::debug!(interpreter = %job.interpreter, user = ?job.user, "Launching script");

        cmd.status()
            .with_context(|| format!("Could not launch interpreter '{}'", job.interpreter))
    }
}

fn is_current_user(user: &str) -> bool {
    env::var("USER").is_ok_and(|current| current == user)
}
