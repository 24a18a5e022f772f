//! Recipe loading and validation.
//!
//! Parses recipe YAML, validates it, and resolves `include:` directives by
//! splicing the included cookbook's steps in at the include position. Each
//! cookbook is included at most once per load, so diamond layouts and cycles
//! resolve without duplicating work.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::schema::{Recipe, RecipeFile, Step, StepDef};

/// File name every cookbook stores its recipe under.
pub const RECIPE_FILE: &str = "recipe.yaml";

/// Directory templates live in, next to the recipe file.
const TEMPLATES_DIR: &str = "templates";

/// Parse a recipe file from YAML content.
pub fn parse_recipe_str(content: &str) -> Result<RecipeFile> {
    let file: RecipeFile =
        serde_yaml::from_str(content).context("Failed to parse recipe YAML")?;
    validate_recipe(&file)?;
    Ok(file)
}

/// Parse a recipe file from disk.
pub fn parse_recipe(path: &Path) -> Result<RecipeFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file: {}", path.display()))?;
    parse_recipe_str(&content)
        .with_context(|| format!("Failed to parse recipe file: {}", path.display()))
}

/// Validate a parsed recipe file.
///
/// A recipe with zero steps is valid: running it completes without doing
/// anything.
fn validate_recipe(file: &RecipeFile) -> Result<()> {
    if file.name.trim().is_empty() {
        bail!("Recipe name cannot be empty");
    }

    for (index, step) in file.steps.iter().enumerate() {
        match step {
            StepDef::Package { package } => {
                if package.trim().is_empty() {
                    bail!("Step {}: package name cannot be empty", index + 1);
                }
            }
            StepDef::Script { script } => {
                if script.name.trim().is_empty() {
                    bail!("Step {}: script name cannot be empty", index + 1);
                }
                if script.body.trim().is_empty() {
                    bail!("Step {}: script '{}' has an empty body", index + 1, script.name);
                }
            }
            StepDef::Template { template } => {
                if template.name.trim().is_empty() {
                    bail!("Step {}: template name cannot be empty", index + 1);
                }
                if template.source.trim().is_empty() {
                    bail!(
                        "Step {}: template '{}' has no source",
                        index + 1,
                        template.name
                    );
                }
                if template.path.trim().is_empty() {
                    bail!(
                        "Step {}: template '{}' has no destination path",
                        index + 1,
                        template.name
                    );
                }
            }
            StepDef::Include { include } => {
                if include.trim().is_empty() {
                    bail!("Step {}: include target cannot be empty", index + 1);
                }
            }
        }
    }

    Ok(())
}

/// Load and resolve a recipe from a recipe file path.
///
/// `cookbooks` is the directory sibling cookbooks are found under when the
/// recipe includes other cookbooks. Pass `None` when the recipe stands
/// alone; includes then fail with a clear error.
pub fn load_recipe(path: &Path, cookbooks: Option<&Path>) -> Result<Recipe> {
    let file = parse_recipe(path)?;
    let base = path
        .parent()
        .map_or_else(|| Path::new(".").to_path_buf(), Path::to_owned);

    // A cookbook never includes itself: seed with both the recipe's declared
    // name and its directory name (includes are addressed by directory).
    let mut seen = HashSet::new();
    seen.insert(file.name.clone());
    if let Some(dir_name) = base.file_name().and_then(|n| n.to_str()) {
        seen.insert(dir_name.to_string());
    }

    let mut steps = Vec::new();
    let mut defaults = HashMap::new();
    splice_steps(&file, &base, cookbooks, &mut seen, &mut steps, &mut defaults)?;

    Ok(Recipe {
        name: file.name,
        description: file.description,
        defaults,
        steps,
    })
}

/// Resolve one recipe file's steps into `steps`, recursing into includes.
///
/// Defaults merge as they are encountered and earlier entries win, so the
/// including recipe's defaults shadow the included one's.
fn splice_steps(
    file: &RecipeFile,
    base: &Path,
    cookbooks: Option<&Path>,
    seen: &mut HashSet<String>,
    steps: &mut Vec<Step>,
    defaults: &mut HashMap<String, String>,
) -> Result<()> {
    for (key, value) in &file.defaults {
        defaults
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    for step in &file.steps {
        match step {
            StepDef::Package { package } => {
                steps.push(Step::Package { name: package.clone() });
            }
            StepDef::Script { script } => {
                steps.push(Step::Script(script.clone()));
            }
            StepDef::Template { template } => {
                let mut resolved = template.clone();
                // Relative sources live in the owning cookbook's templates/
                // directory; resolve them here so splicing keeps each step
                // pointing at its own cookbook's files.
                if !Path::new(&resolved.source).is_absolute() {
                    resolved.source = base
                        .join(TEMPLATES_DIR)
                        .join(&resolved.source)
                        .display()
                        .to_string();
                }
                steps.push(Step::Template(resolved));
            }
            StepDef::Include { include } => {
                if !seen.insert(include.clone()) {
                    tracing::debug!(cookbook = %include, "Already included, skipping");
                    continue;
                }

                let Some(dir) = cookbooks else {
                    bail!(
                        "Recipe '{}' includes '{}' but no cookbooks directory is available",
                        file.name,
                        include
                    );
                };

                let included_base = dir.join(include);
                let included_path = included_base.join(RECIPE_FILE);
                let included = parse_recipe(&included_path).with_context(|| {
                    format!("Failed to load included cookbook '{include}'")
                })?;
                seen.insert(included.name.clone());

                splice_steps(&included, &included_base, cookbooks, seen, steps, defaults)?;
            }
        }
    }

    Ok(())
}

/// Discover all loadable recipes under a cookbooks directory.
///
/// Returns `(cookbook directory name, resolved recipe)` pairs sorted by
/// name. Cookbooks that fail to load are skipped with a warning so one
/// broken recipe does not hide the rest.
pub fn discover_recipes(dir: &Path) -> Result<Vec<(String, Recipe)>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read cookbooks directory: {}", dir.display()))?;

    let mut recipes = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let recipe_path = path.join(RECIPE_FILE);
        if !recipe_path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match load_recipe(&recipe_path, Some(dir)) {
            Ok(recipe) => recipes.push((name.to_string(), recipe)),
            Err(e) => {
                tracing::warn!(path = %recipe_path.display(), error = %e, "Failed to load recipe");
            }
        }
    }

    recipes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(recipes)
}
