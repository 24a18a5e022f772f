//! Cookrun - provision a host from cookbook recipes.
//!
//! Cookrun loads a recipe from a cookbook and executes its steps in order:
//! installing packages, running scripts, and rendering config templates.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cookrun::{discover_recipes, load_recipe, Config, Runner, RECIPE_FILE};

/// Provision a host with packages, scripts, and config templates
#[derive(Parser)]
#[command(name = "cookrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recipe against this host
    Run {
        /// Recipe name (cookbook directory) or path to a recipe file
        recipe: String,

        /// Directory cookbooks live under
        #[arg(short = 'C', long)]
        cookbooks: Option<PathBuf>,

        /// Config file to use instead of the default locations
        #[arg(long, env = "COOKRUN_CONFIG")]
        config: Option<PathBuf>,

        /// Variable assignments (key=value)
        #[arg(long)]
        var: Vec<String>,

        /// Dry run (show the steps without executing)
        #[arg(short, long)]
        dry_run: bool,
    },

    /// List recipes in the cookbooks directory
    List {
        /// Directory cookbooks live under
        #[arg(short = 'C', long)]
        cookbooks: Option<PathBuf>,

        /// Config file to use instead of the default locations
        #[arg(long, env = "COOKRUN_CONFIG")]
        config: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    // Handle commands
    match cli.command {
        None => {
            cmd_list(None, None, "text")?;
        }
        Some(Commands::Run { recipe, cookbooks, config, var, dry_run }) => {
            cmd_run(&recipe, cookbooks.as_deref(), config.as_deref(), &var, dry_run)?;
        }
        Some(Commands::List { cookbooks, config, format }) => {
            cmd_list(cookbooks.as_deref(), config.as_deref(), &format)?;
        }
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Run a recipe.
fn cmd_run(
    recipe: &str,
    cookbooks: Option<&Path>,
    config_path: Option<&Path>,
    vars: &[String],
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cookbooks_dir = cookbooks.map_or_else(|| config.cookbooks_dir(), Path::to_path_buf);

    let recipe_path = resolve_recipe(recipe, &cookbooks_dir)?;
    let recipe = load_recipe(&recipe_path, Some(&cookbooks_dir))?;

    println!("Recipe: {}", recipe.name);
    if let Some(ref desc) = recipe.description {
        println!("Description: {desc}");
    }
    println!("Steps: {}\n", recipe.step_count());

    if dry_run {
        println!("DRY RUN - Steps that would be executed:");
        for (i, step) in recipe.steps.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, step.kind(), step.name());
        }
        return Ok(());
    }

    let mut runner = Runner::new();
    runner.set_variables(config.bindings());

    // Set variables from command line
    for var_str in vars {
        if let Some((key, value)) = var_str.split_once('=') {
            runner.set_variable(key, value);
        }
    }

    let outcome = runner.run(&recipe);

    for result in runner.results() {
        let mark = if result.success { "ok" } else { "FAILED" };
        println!("  {mark} [{}] {} ({} ms)", result.kind, result.name, result.duration_ms);
    }

    outcome?;

    println!("\nRecipe completed successfully!");
    Ok(())
}

/// List recipes available under the cookbooks directory.
fn cmd_list(cookbooks: Option<&Path>, config_path: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let cookbooks_dir = cookbooks.map_or_else(|| config.cookbooks_dir(), Path::to_path_buf);

    let recipes = discover_recipes(&cookbooks_dir)?;

    match format {
        "json" => {
            let entries: Vec<_> = recipes
                .iter()
                .map(|(name, recipe)| {
                    serde_json::json!({
                        "name": name,
                        "description": recipe.description,
                        "steps": recipe.step_count(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            for (name, recipe) in &recipes {
                println!(
                    "{} ({} steps) - {}",
                    name,
                    recipe.step_count(),
                    recipe.description.as_deref().unwrap_or("")
                );
            }
            println!("\nTotal: {} recipes", recipes.len());
        }
    }

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cookrun", &mut io::stdout());
}

/// Load configuration, preferring an explicit file.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    }
}

/// Resolve a recipe argument to the recipe file to load.
///
/// Accepts either a cookbook name under the cookbooks directory or a direct
/// path to a recipe file.
fn resolve_recipe(recipe: &str, cookbooks_dir: &Path) -> Result<PathBuf> {
    let direct = Path::new(recipe);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let in_cookbooks = cookbooks_dir.join(recipe).join(RECIPE_FILE);
    if in_cookbooks.is_file() {
        return Ok(in_cookbooks);
    }

    anyhow::bail!(
        "Recipe '{}' not found (looked for {} and {})",
        recipe,
        direct.display(),
        in_cookbooks.display()
    )
}
