//! Recipe system for host provisioning.
//!
//! Recipes are YAML files that define an ordered list of provisioning
//! steps: packages to install, scripts to run, and templates to render.

mod parser;
mod runner;
mod schema;

pub use parser::{discover_recipes, load_recipe, parse_recipe, parse_recipe_str, RECIPE_FILE};
pub use runner::{Runner, RunnerState, StepError, StepResult};
pub use schema::{Recipe, RecipeFile, ScriptStep, Step, StepDef, TemplateStep};
