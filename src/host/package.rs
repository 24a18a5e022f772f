//! Package installation through apt.

use std::process::Command;

use anyhow::{bail, Context, Result};

use super::PackageManager;

/// Installs packages with `apt-get`, non-interactively.
#[derive(Debug)]
pub struct AptPackageManager {
    program: String,
}

impl AptPackageManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different program in place of `apt-get`. For tests.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for AptPackageManager {
    fn default() -> Self {
        Self { program: "apt-get".to_string() }
    }
}

impl PackageManager for AptPackageManager {
    fn install(&self, package: &str) -> Result<()> {
        tracing::debug!(package = %package, "Installing package");

        let output = Command::new(&self.program)
            .arg("-y")
            .arg("install")
            .arg(package)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .with_context(|| format!("Could not launch {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} reported {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        Ok(())
    }
}
