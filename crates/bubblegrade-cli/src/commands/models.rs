//! Models command - manage ML models.

use anyhow::Result;
use bubblegrade_adapters::models::{
    all_models_installed, ensure_models, list_models as adapter_list_models, MODELS,
};
use bubblegrade_adapters::models_dir;
use clap::{Args, Subcommand};

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download required models
    Fetch,
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs) -> Result<()> {
    match args.command {
        ModelsCommand::Fetch => fetch_models(),
        ModelsCommand::List => list_models(),
        ModelsCommand::Path => print_path(),
    }
}

fn fetch_models() -> Result<()> {
    if all_models_installed() {
        println!("All models already installed");
        return Ok(());
    }
    ensure_models()?;
    println!("All models downloaded");
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn list_models() -> Result<()> {
    let models = adapter_list_models();
    let dir = models_dir();

    println!("Models directory: {}", dir.display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let info = MODELS.iter().find(|m| m.name == name);
        let filename = info.map_or("unknown", |m| m.filename);
        println!("  {status} {name} ({filename})");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());

    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn print_path() -> Result<()> {
    let path = models_dir();
    println!("{}", path.display());
    Ok(())
}
