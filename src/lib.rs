//! # Cookrun
//!
//! Minimal cookbook runner - provision a host with packages, scripts, and
//! config templates.
//!
//! Cookrun executes recipes: YAML files that declare, in order, the
//! packages to install, the scripts to run, and the configuration
//! templates to render onto the host. Steps run strictly in declaration
//! order and the first failure stops the run.
//!
//! ## Features
//!
//! - **Ordered Steps**: Packages, scripts, and templates execute exactly as declared
//! - **Cookbook Includes**: A recipe can splice in other cookbooks, each applied once
//! - **Variables**: `{{ name }}` placeholders resolved from defaults, config, and overrides
//! - **Fail Fast**: The first failing step stops provisioning with a typed error
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install cookrun
//!
//! # Provision a host from a cookbook
//! cookrun run vagrant
//!
//! # Or use the short alias
//! cook run vagrant
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod host;
pub mod recipe;

// Re-export commonly used types
pub use config::Config;
pub use host::{
    AptPackageManager, MinijinjaEngine, PackageManager, ScriptJob, ShellInterpreter, SystemShell,
    TemplateEngine,
};
pub use recipe::{
    discover_recipes, load_recipe, parse_recipe_str, Recipe, Runner, RunnerState, Step, StepError,
    StepResult, RECIPE_FILE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "cookrun";

/// Short alias
pub const APP_ALIAS: &str = "cook";
