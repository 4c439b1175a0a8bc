//! Command dispatch

use std::io;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let container = build_container(cli)?;
    match command {
        Commands::Tree { format, compact } => _tree(&container, *format, *compact),
        Commands::Check { strict } => _check(&container, *strict),
        Commands::Leaves => _leaves(&container),
        Commands::Path { id } => _path(&container, *id),
        Commands::Info => _info(&container),
        Commands::Config => _config(&container),
        Commands::Completion { .. } => Ok(()),
    }
}

/// Load layered settings and apply command-line overrides.
pub fn resolve_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("resolve working directory", e))?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(catalog) = &cli.catalog {
        settings.catalog = Some(catalog.clone());
    }
    if let Some(encoding) = cli.encoding {
        settings.encoding = encoding;
    }
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(resolve_settings(cli)?))
}

#[instrument(skip(container))]
fn _tree(
    container: &ServiceContainer,
    format: Option<crate::application::OutputFormat>,
    compact: bool,
) -> CliResult<()> {
    let service = &container.feature_tree;
    let built = service.load_and_build(None)?;
    for diagnostic in built.fallbacks() {
        output::warning(diagnostic);
    }
    let rendered = service.render(&built.tree, format, compact)?;
    output::info(rendered.trim_end());
    Ok(())
}

#[instrument(skip(container))]
fn _check(container: &ServiceContainer, strict: bool) -> CliResult<()> {
    let service = &container.feature_tree;
    let built = service.load_and_build(None)?;
    let summary = service.summarize(&built);

    if !built.diagnostics.is_empty() {
        output::header("Diagnostics");
        for diagnostic in &built.diagnostics {
            if diagnostic.is_fallback() {
                output::failure(diagnostic);
            } else {
                output::detail(diagnostic);
            }
        }
    }
    output::success(&format!(
        "{} features, {} fallback(s), {} data-quality note(s)",
        summary.features, summary.fallbacks, summary.data_quality
    ));

    if strict && summary.fallbacks > 0 {
        return Err(CliError::Fallbacks(summary.fallbacks));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _leaves(container: &ServiceContainer) -> CliResult<()> {
    let built = container.feature_tree.load_and_build(None)?;
    for leaf in built.tree.leaf_nodes() {
        output::info(leaf);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _path(container: &ServiceContainer, id: u32) -> CliResult<()> {
    if id == 0 {
        return Err(CliError::InvalidArgs("feature id must be positive".to_string()));
    }
    let service = &container.feature_tree;
    let built = service.load_and_build(None)?;
    let path = service.ancestry(&built.tree, id)?;
    output::info(&path.iter().join(" > "));
    Ok(())
}

#[instrument(skip(container))]
fn _info(container: &ServiceContainer) -> CliResult<()> {
    let service = &container.feature_tree;
    let built = service.load_and_build(None)?;
    let summary = service.summarize(&built);

    let source = container
        .settings
        .catalog
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());

    output::header(built.tree.root_node().label());
    output::detail(&format!("catalog: {}", source));
    output::detail(&format!("features: {}", summary.features));
    output::detail(&format!("depth: {}", summary.depth));
    output::detail(&format!("leaves: {}", summary.leaves));
    output::detail(&format!(
        "diagnostics: {} fallback(s), {} data-quality note(s)",
        summary.fallbacks, summary.data_quality
    ));
    output::detail(&format!("root children: {}", summary.root_children.len()));
    for child in &summary.root_children {
        output::detail(&format!("  {}", child));
    }
    Ok(())
}

fn _config(container: &ServiceContainer) -> CliResult<()> {
    output::info(container.settings.to_toml()?.trim_end());
    Ok(())
}
